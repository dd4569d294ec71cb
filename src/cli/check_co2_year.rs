//! Command line interface for checking the CO2 base year against the restart year.

use super::utils as cli_utils;
use crate::{
    exit_on_error,
    run::{self, co2},
};
use clap::{Arg, ArgMatches, Command};

/// Builds a representation of the `check-co2-year` command line subcommand.
pub fn create_check_co2_year_subcommand() -> Command {
    let command = Command::new("check-co2-year")
        .about("Check that the CO2 base year is consistent with the restart year on the first run")
        .arg(
            Arg::new("namelists")
                .long("namelists")
                .value_name("PATH")
                .default_value(run::DEFAULT_NAMELIST_PATH)
                .help("Atmosphere namelist file"),
        )
        .arg(
            Arg::new("calendar-file")
                .long("calendar-file")
                .value_name("PATH")
                .default_value(run::DEFAULT_CALENDAR_PATH)
                .help("Restart calendar file"),
        )
        .arg(
            Arg::new("run-counter-var")
                .long("run-counter-var")
                .value_name("NAME")
                .default_value(run::DEFAULT_RUN_COUNTER_VAR)
                .help("Environment variable holding the zero-based run counter"),
        );
    cli_utils::add_verbose_argument(command, "Print status messages related to the check")
}

/// Runs the actions for the `check-co2-year` subcommand using the given arguments.
pub fn run_check_co2_year_subcommand(arguments: &ArgMatches) {
    let run_counter_var = cli_utils::get_required_string(arguments, "run-counter-var");
    let verbosity = cli_utils::verbosity_from_arguments(arguments);

    let first_run = exit_on_error!(
        co2::is_first_run(run_counter_var),
        "Error: Could not determine whether this is the first run: {}"
    );
    if !first_run {
        if verbosity.print_messages() {
            println!("Not the first run, skipping CO2 year check");
        }
        return;
    }

    exit_on_error!(
        co2::check_co2_year(
            cli_utils::get_required_string(arguments, "namelists"),
            cli_utils::get_required_string(arguments, "calendar-file"),
            verbosity,
        ),
        "Error: {}"
    );
}
