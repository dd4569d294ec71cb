//! Function for running the command line program.

use super::{
    build, check_co2_year::run_check_co2_year_subcommand,
    completions::run_completions_subcommand, hide_url_segment::run_hide_url_segment_subcommand,
    inspect::run_inspect_subcommand, update_trace_gases::run_update_trace_gases_subcommand,
};
use clap::ArgMatches;
use std::time::Instant;

#[cfg(feature = "netcdf")]
use super::{
    replace_field::run_replace_field_subcommand, update_thinning::run_update_thinning_subcommand,
};

/// Runs the `umkit` command line program.
pub fn run() {
    run_with_args(build::build().get_matches());
}

/// Runs the `umkit` command line program with the given parsed arguments.
pub fn run_with_args(arguments: ArgMatches) {
    let start_instant = Instant::now();

    match arguments.subcommand() {
        #[cfg(feature = "netcdf")]
        Some(("replace-field", replace_field_arguments)) => {
            run_replace_field_subcommand(replace_field_arguments)
        }
        #[cfg(feature = "netcdf")]
        Some(("update-thinning", update_thinning_arguments)) => {
            run_update_thinning_subcommand(update_thinning_arguments)
        }
        Some(("check-co2-year", check_co2_year_arguments)) => {
            run_check_co2_year_subcommand(check_co2_year_arguments)
        }
        Some(("update-trace-gases", update_trace_gases_arguments)) => {
            run_update_trace_gases_subcommand(update_trace_gases_arguments)
        }
        Some(("inspect", inspect_arguments)) => run_inspect_subcommand(inspect_arguments),
        Some(("hide-url-segment", hide_url_segment_arguments)) => {
            run_hide_url_segment_subcommand(hide_url_segment_arguments)
        }
        Some(("completions", completions_arguments)) => {
            run_completions_subcommand(completions_arguments)
        }
        _ => {}
    }

    if arguments.get_flag("timing") {
        println!("Elapsed time: {} s", start_instant.elapsed().as_secs_f64());
    }
}
