//! Command line interface for serving a segment of a built site from the site root.

use super::utils as cli_utils;
use crate::{exit_on_error, site};
use clap::{Arg, ArgMatches, Command};

/// Builds a representation of the `hide-url-segment` command line subcommand.
pub fn create_hide_url_segment_subcommand() -> Command {
    let command = Command::new("hide-url-segment")
        .about("Move the pages under a path segment of a built site to the site root")
        .arg(
            Arg::new("site-dir")
                .long("site-dir")
                .value_name("DIR")
                .default_value("site")
                .help("Root directory of the built site"),
        )
        .arg(
            Arg::new("segment")
                .long("segment")
                .value_name("SEGMENT")
                .default_value(site::DEFAULT_HIDDEN_SEGMENT)
                .help("Leading path segment to remove"),
        );
    cli_utils::add_verbose_argument(command, "Print the moved files")
}

/// Runs the actions for the `hide-url-segment` subcommand using the given arguments.
pub fn run_hide_url_segment_subcommand(arguments: &ArgMatches) {
    let site_dir = cli_utils::get_required_string(arguments, "site-dir");
    let segment = cli_utils::get_required_string(arguments, "segment");
    let verbosity = cli_utils::verbosity_from_arguments(arguments);

    let num_moved = exit_on_error!(
        site::hide_url_segment(site_dir, segment, verbosity),
        "Error: Could not hide {} in {}: {}",
        segment,
        site_dir
    );
    if verbosity.print_messages() {
        println!("Moved {} files", num_moved);
    }
}
