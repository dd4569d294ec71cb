//! Consistency check between the CO2 forcing base year and the restart year.

use crate::io::{calendar::RestartCalendar, namelist::Namelist, Verbosity};
use std::{env, io, path::Path};

pub const CLIMATE_FORCING_GROUP: &str = "clmchfcg";
pub const CLIMATE_FORCING_YEARS_VARIABLE: &str = "clim_fcg_years";

/// Whether the run counter in the given environment variable marks the
/// first run of the experiment.
pub fn is_first_run(run_counter_var: &str) -> io::Result<bool> {
    let counter = env::var(run_counter_var).map_err(|err| {
        io::Error::new(
            io::ErrorKind::NotFound,
            format!("Could not read run counter {}: {}", run_counter_var, err),
        )
    })?;
    let counter: i64 = counter.trim().parse().map_err(|err| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "Invalid run counter {}={}: {}",
                run_counter_var, counter, err
            ),
        )
    })?;
    Ok(counter == 0)
}

/// Checks that the configured CO2 base year is the year before the restart year.
pub fn verify_co2_year(
    configured_year: i64,
    restart_year: i32,
    namelist_description: &str,
) -> io::Result<()> {
    let expected_year = i64::from(restart_year) - 1;
    if configured_year == expected_year {
        Ok(())
    } else {
        Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "{} in {} is {}. For consistency with restart year use {}",
                CLIMATE_FORCING_YEARS_VARIABLE, namelist_description, configured_year, expected_year
            ),
        ))
    }
}

/// Reads the CO2 base year from the given namelist.
pub fn configured_co2_year(namelist: &Namelist) -> io::Result<i64> {
    let value = namelist.get(
        CLIMATE_FORCING_GROUP,
        CLIMATE_FORCING_YEARS_VARIABLE,
        &[1, 1],
    )?;
    value.as_integer().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "{}(1,1) is not an integer: {}",
                CLIMATE_FORCING_YEARS_VARIABLE, value
            ),
        )
    })
}

/// Checks the CO2 base year in the given namelist file against the restart
/// year in the given calendar file.
pub fn check_co2_year<P: AsRef<Path>, Q: AsRef<Path>>(
    namelist_path: P,
    calendar_path: Q,
    verbosity: Verbosity,
) -> io::Result<()> {
    let namelist_path = namelist_path.as_ref();
    let namelist = Namelist::from_file(namelist_path)?;
    let configured_year = configured_co2_year(&namelist)?;
    let calendar = RestartCalendar::from_file(calendar_path)?;
    let restart_year = calendar.restart_year();
    if verbosity.print_messages() {
        println!("Restart year {} (run ended {})", restart_year, calendar.end_date());
    }
    verify_co2_year(
        configured_year,
        restart_year,
        &namelist_path.display().to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_the_preceding_year_is_accepted() {
        assert!(verify_co2_year(1849, 1850, "namelists").is_ok());
        let message = verify_co2_year(1850, 1850, "namelists")
            .unwrap_err()
            .to_string();
        assert!(message.contains("is 1850"));
        assert!(message.contains("use 1849"));
        assert!(verify_co2_year(1848, 1850, "namelists").is_err());
    }

    #[test]
    fn base_year_is_read_from_first_element() {
        let namelist = Namelist::parse(
            "&clmchfcg\n l_clmchfcg = .true.\n clim_fcg_years(1,1) = 1849, 1850\n/\n".to_string(),
        )
        .unwrap();
        assert_eq!(configured_co2_year(&namelist).unwrap(), 1849);
    }

    #[test]
    fn run_counter_is_parsed() {
        env::set_var("UMKIT_TEST_RUN_COUNTER_ZERO", "0");
        env::set_var("UMKIT_TEST_RUN_COUNTER_THREE", " 3 ");
        env::set_var("UMKIT_TEST_RUN_COUNTER_BAD", "x");
        assert!(is_first_run("UMKIT_TEST_RUN_COUNTER_ZERO").unwrap());
        assert!(!is_first_run("UMKIT_TEST_RUN_COUNTER_THREE").unwrap());
        assert!(is_first_run("UMKIT_TEST_RUN_COUNTER_BAD").is_err());
        assert!(is_first_run("UMKIT_TEST_RUN_COUNTER_UNSET").is_err());
    }
}
