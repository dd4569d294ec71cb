//! Function for building the command line hierarchy.

use super::{
    check_co2_year::create_check_co2_year_subcommand,
    completions::create_completions_subcommand,
    hide_url_segment::create_hide_url_segment_subcommand, inspect::create_inspect_subcommand,
    update_trace_gases::create_update_trace_gases_subcommand,
};
use clap::{self, Arg, ArgAction, Command};

#[cfg(feature = "netcdf")]
use super::{
    replace_field::create_replace_field_subcommand,
    update_thinning::create_update_thinning_subcommand,
};

/// Build the `umkit` command line hierarchy.
#[allow(clippy::let_and_return)]
pub fn build() -> Command {
    let command = Command::new(clap::crate_name!())
        .version(clap::crate_version!())
        .about(clap::crate_description!())
        .subcommand_required(true)
        .arg_required_else_help(true)
        .disable_help_subcommand(true)
        .arg(
            Arg::new("timing")
                .short('t')
                .long("timing")
                .action(ArgAction::SetTrue)
                .help("Display elapsed time when done"),
        );

    #[cfg(feature = "netcdf")]
    let command = command
        .subcommand(create_replace_field_subcommand())
        .subcommand(create_update_thinning_subcommand());

    let command = command
        .subcommand(create_check_co2_year_subcommand())
        .subcommand(create_update_trace_gases_subcommand())
        .subcommand(create_inspect_subcommand())
        .subcommand(create_hide_url_segment_subcommand())
        .subcommand(create_completions_subcommand());

    command
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_hierarchy_is_consistent() {
        build().debug_assert();
    }
}
