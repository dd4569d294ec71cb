//! Command line interface for updating the wood thinning field of a restart file.

use super::utils as cli_utils;
use crate::{
    exit_on_error,
    run::thinning::{self, ThinningUpdate},
};
use clap::{Arg, ArgMatches, Command};

/// Builds a representation of the `update-thinning` command line subcommand.
pub fn create_update_thinning_subcommand() -> Command {
    let command = Command::new("update-thinning")
        .about("Update the wood thinning field of a restart file for the current year")
        .long_about(
            "Update the wood thinning field of a restart file for the current year.\n\
             The original restart file is kept with the suffix _orig.",
        )
        .arg(
            Arg::new("restart-file")
                .long("restart-file")
                .value_name("RESTART_FILE")
                .required(true)
                .help("End of year restart file to modify"),
        )
        .arg(
            Arg::new("thinning-file")
                .long("thinning-file")
                .value_name("NC_FILE")
                .required(true)
                .help("Wood thinning file to use as source"),
        )
        .arg(
            Arg::new("stash")
                .long("stash")
                .value_name("PATHS")
                .default_value(thinning::DEFAULT_STASHMASTER_PATH)
                .help("STASHmaster files to use (comma-separated)"),
        )
        .arg(
            Arg::new("field")
                .long("field")
                .value_name("NAME")
                .default_value(thinning::DEFAULT_FIELD_NAME)
                .help("Name of the field to replace"),
        )
        .arg(
            Arg::new("nc-var")
                .long("nc-var")
                .value_name("NAME")
                .default_value(thinning::DEFAULT_VARIABLE_NAME)
                .help("Name of the NetCDF variable holding the thinning fractions"),
        )
        .arg(
            Arg::new("base-year")
                .long("base-year")
                .value_name("YEAR")
                .default_value("1850")
                .help("Year of the first time index of the thinning data"),
        );
    cli_utils::add_verbose_argument(command, "Print status messages related to the update")
}

/// Runs the actions for the `update-thinning` subcommand using the given arguments.
pub fn run_update_thinning_subcommand(arguments: &ArgMatches) {
    let mut update = ThinningUpdate::new(
        cli_utils::get_required_string(arguments, "restart-file"),
        cli_utils::get_required_string(arguments, "thinning-file"),
    );
    update.stash_paths = cli_utils::get_required_string(arguments, "stash").to_string();
    update.field_name = cli_utils::get_required_string(arguments, "field").to_string();
    update.variable_name = cli_utils::get_required_string(arguments, "nc-var").to_string();
    update.base_year = cli_utils::get_value_from_required_parseable_argument(arguments, "base-year");
    let verbosity = cli_utils::verbosity_from_arguments(arguments);

    exit_on_error!(
        thinning::update_thinning(&update, verbosity),
        "Error: Could not update thinning in {}: {}",
        update.restart_file.display()
    );
}
