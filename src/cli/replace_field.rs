//! Command line interface for replacing a field in a UM file with a NetCDF variable.

use super::utils as cli_utils;
use crate::{
    exit_on_error,
    field::replace::{self, NetCDFReplacement},
};
use clap::{Arg, ArgMatches, Command};
use std::path::Path;

/// Builds a representation of the `replace-field` command line subcommand.
pub fn create_replace_field_subcommand() -> Command {
    let command = Command::new("replace-field")
        .about("Replace a field in a UM file with a variable from a NetCDF file")
        .arg(
            Arg::new("um-file")
                .long("um-file")
                .value_name("UM_FILE")
                .required(true)
                .help("UM file containing the field to replace"),
        )
        .arg(
            Arg::new("field")
                .long("field")
                .value_name("NAME")
                .required(true)
                .help("Name of the field to replace (regular expression matched against STASHmaster names)"),
        )
        .arg(
            Arg::new("nc-file")
                .long("nc-file")
                .value_name("NC_FILE")
                .required(true)
                .help("NetCDF file to take the new field from"),
        )
        .arg(
            Arg::new("nc-var")
                .long("nc-var")
                .value_name("NAME")
                .required(true)
                .help("Name of the NetCDF variable holding the new field"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("OUTPUT_FILE")
                .required(true)
                .help("Path to write the new UM file to"),
        )
        .arg(
            Arg::new("time-index")
                .short('t')
                .long("time-index")
                .value_name("INDEX")
                .help("Index along the time dimension of the NetCDF variable to take"),
        )
        .arg(
            Arg::new("stash")
                .long("stash")
                .value_name("PATHS")
                .help(
                    "STASHmaster files to use (comma-separated)\n\
                     [default: STASHmaster of the installed UM version under $UMDIR]",
                ),
        )
        .arg(
            Arg::new("stash-section")
                .long("stash-section")
                .value_name("SECTION")
                .default_value("0")
                .help("STASH section to select"),
        );
    cli_utils::add_verbose_argument(
        cli_utils::add_overwrite_arguments(command),
        "Print status messages related to the replacement",
    )
}

/// Runs the actions for the `replace-field` subcommand using the given arguments.
pub fn run_replace_field_subcommand(arguments: &ArgMatches) {
    let output_file_path = Path::new(cli_utils::get_required_string(arguments, "output"));
    let overwrite_mode = cli_utils::overwrite_mode_from_arguments(arguments);
    cli_utils::verify_output_allowed_or_exit(output_file_path, overwrite_mode);

    let replacement = NetCDFReplacement {
        um_file: Path::new(cli_utils::get_required_string(arguments, "um-file")),
        field_name: cli_utils::get_required_string(arguments, "field"),
        nc_file: Path::new(cli_utils::get_required_string(arguments, "nc-file")),
        nc_var: cli_utils::get_required_string(arguments, "nc-var"),
        time_index: cli_utils::get_value_from_parseable_argument(arguments, "time-index"),
        stash_paths: cli_utils::get_optional_string(arguments, "stash"),
        stash_section: cli_utils::get_value_from_required_parseable_argument(
            arguments,
            "stash-section",
        ),
    };
    let verbosity = cli_utils::verbosity_from_arguments(arguments);

    exit_on_error!(
        replace::replace_field_from_netcdf(&replacement, output_file_path, verbosity),
        "Error: Could not replace field {}: {}",
        replacement.field_name
    );
}
