//! Update of the radiation namelist with the trace gas concentrations of a year.

use crate::io::{
    namelist::{Namelist, NamelistValue},
    trace_gas::{self, TraceGasConcentrations},
    Verbosity,
};
use std::{io, path::Path};

pub const DEFAULT_RADIATION_GROUP: &str = "run_radiation";

/// Sets the trace gas mixing ratios in the given namelist group.
pub fn set_trace_gases(
    namelist: &mut Namelist,
    group_name: &str,
    concentrations: &TraceGasConcentrations,
) -> io::Result<()> {
    for (key, value) in concentrations.namelist_entries() {
        namelist.set(group_name, key, &[NamelistValue::Real(value)])?;
    }
    Ok(())
}

/// Reads the concentrations for the given year from the table file and writes
/// them into the given group of the namelist file, replacing the file.
pub fn update_trace_gases<P: AsRef<Path>, Q: AsRef<Path>>(
    table_path: P,
    namelist_path: Q,
    year: i32,
    group_name: &str,
    verbosity: Verbosity,
) -> io::Result<TraceGasConcentrations> {
    let namelist_path = namelist_path.as_ref();
    let concentrations = trace_gas::read_trace_gas_concentrations(table_path, year)?;
    if verbosity.print_messages() {
        println!(
            "Trace gas mixing ratios for {}: {}",
            year,
            concentrations
                .values()
                .iter()
                .map(|value| format!("{:e}", value))
                .collect::<Vec<_>>()
                .join(" ")
        );
    }

    let mut namelist = Namelist::from_file(namelist_path)?;
    set_trace_gases(&mut namelist, group_name, &concentrations)?;

    if verbosity.print_messages() {
        println!("Writing {}", namelist_path.display());
    }
    namelist.write_to_file(namelist_path)?;
    Ok(concentrations)
}
