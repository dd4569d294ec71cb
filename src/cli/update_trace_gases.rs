//! Command line interface for updating the trace gas concentrations in a namelist.

use super::utils as cli_utils;
use crate::{
    exit_on_error,
    io::calendar::RestartCalendar,
    run::trace_gas,
};
use clap::{Arg, ArgGroup, ArgMatches, Command};

/// Builds a representation of the `update-trace-gases` command line subcommand.
pub fn create_update_trace_gases_subcommand() -> Command {
    let command = Command::new("update-trace-gases")
        .about("Set the trace gas mixing ratios in the radiation namelist for a given year")
        .arg(
            Arg::new("table")
                .long("table")
                .value_name("PATH")
                .required(true)
                .help("Whitespace-separated table with a year and nine mixing ratios per row"),
        )
        .arg(
            Arg::new("namelists")
                .long("namelists")
                .value_name("PATH")
                .required(true)
                .help("Namelist file to update in place"),
        )
        .arg(
            Arg::new("year")
                .long("year")
                .value_name("YEAR")
                .help("Year to take the mixing ratios for"),
        )
        .arg(
            Arg::new("calendar-file")
                .long("calendar-file")
                .value_name("PATH")
                .help("Restart calendar file whose restart year is used"),
        )
        .group(
            ArgGroup::new("year-source")
                .args(["year", "calendar-file"])
                .required(true),
        )
        .arg(
            Arg::new("group")
                .long("group")
                .value_name("NAME")
                .default_value(trace_gas::DEFAULT_RADIATION_GROUP)
                .help("Namelist group receiving the mixing ratios"),
        );
    cli_utils::add_verbose_argument(command, "Print status messages related to the update")
}

/// Runs the actions for the `update-trace-gases` subcommand using the given arguments.
pub fn run_update_trace_gases_subcommand(arguments: &ArgMatches) {
    let year: i32 = match cli_utils::get_value_from_parseable_argument(arguments, "year") {
        Some(year) => year,
        None => {
            let calendar_path = cli_utils::get_required_string(arguments, "calendar-file");
            exit_on_error!(
                RestartCalendar::from_file(calendar_path),
                "Error: Could not read restart calendar: {}"
            )
            .restart_year()
        }
    };
    let verbosity = cli_utils::verbosity_from_arguments(arguments);

    exit_on_error!(
        trace_gas::update_trace_gases(
            cli_utils::get_required_string(arguments, "table"),
            cli_utils::get_required_string(arguments, "namelists"),
            year,
            cli_utils::get_required_string(arguments, "group"),
            verbosity,
        ),
        "Error: Could not update trace gases for {}: {}",
        year
    );
}
