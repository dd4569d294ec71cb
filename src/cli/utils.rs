//! Utilities for creating the command line interface.

use crate::{
    exit_on_error, exit_with_error,
    io::{utils as io_utils, OverwriteMode, Verbosity},
};
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::{path::Path, process, str::FromStr};

/// Adds the `--overwrite` and `--no-overwrite` flags to the given command.
pub fn add_overwrite_arguments(command: Command) -> Command {
    command
        .arg(
            Arg::new("overwrite")
                .long("overwrite")
                .action(ArgAction::SetTrue)
                .help("Automatically overwrite any existing files")
                .conflicts_with("no-overwrite"),
        )
        .arg(
            Arg::new("no-overwrite")
                .long("no-overwrite")
                .action(ArgAction::SetTrue)
                .help("Do not overwrite any existing files")
                .conflicts_with("overwrite"),
        )
}

/// Adds the `-v/--verbose` flag to the given command.
pub fn add_verbose_argument(command: Command, help: &'static str) -> Command {
    command.arg(
        Arg::new("verbose")
            .short('v')
            .long("verbose")
            .action(ArgAction::SetTrue)
            .help(help),
    )
}

pub fn overwrite_mode_from_arguments(arguments: &ArgMatches) -> OverwriteMode {
    if arguments.get_flag("overwrite") {
        OverwriteMode::Always
    } else if arguments.get_flag("no-overwrite") {
        OverwriteMode::Never
    } else {
        OverwriteMode::Ask
    }
}

pub fn verbosity_from_arguments(arguments: &ArgMatches) -> Verbosity {
    Verbosity::from(arguments.get_flag("verbose"))
}

pub fn parse_value_string<T>(argument_name: &str, value_string: &str) -> T
where
    T: FromStr,
    <T as FromStr>::Err: std::fmt::Display,
{
    exit_on_error!(
        value_string.trim().parse(),
        "Error: Could not parse value for {0}: {1}",
        argument_name
    )
}

pub fn get_required_string<'a>(arguments: &'a ArgMatches, argument_name: &str) -> &'a str {
    match arguments.get_one::<String>(argument_name) {
        Some(value) => value.as_str(),
        None => exit_with_error!("Error: No value for required argument {}", argument_name),
    }
}

pub fn get_optional_string<'a>(arguments: &'a ArgMatches, argument_name: &str) -> Option<&'a str> {
    arguments
        .get_one::<String>(argument_name)
        .map(String::as_str)
}

pub fn get_value_from_required_parseable_argument<T>(arguments: &ArgMatches, argument_name: &str) -> T
where
    T: FromStr,
    <T as FromStr>::Err: std::fmt::Display,
{
    parse_value_string(argument_name, get_required_string(arguments, argument_name))
}

pub fn get_value_from_parseable_argument<T>(arguments: &ArgMatches, argument_name: &str) -> Option<T>
where
    T: FromStr,
    <T as FromStr>::Err: std::fmt::Display,
{
    get_optional_string(arguments, argument_name)
        .map(|value_string| parse_value_string(argument_name, value_string))
}

/// Checks whether the output file may be written, asking the user if required.
/// Exits without error if writing is not allowed.
pub fn verify_output_allowed_or_exit<P: AsRef<Path>>(output_file_path: P, overwrite_mode: OverwriteMode) {
    if !io_utils::write_allowed(&output_file_path, overwrite_mode) {
        println!(
            "Not writing {}",
            output_file_path.as_ref().display()
        );
        process::exit(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches(args: &[&str]) -> ArgMatches {
        add_verbose_argument(
            add_overwrite_arguments(Command::new("test").arg(Arg::new("count").long("count"))),
            "Print status messages",
        )
        .get_matches_from(args)
    }

    #[test]
    fn overwrite_mode_follows_flags() {
        assert_eq!(
            overwrite_mode_from_arguments(&matches(&["test", "--overwrite"])),
            OverwriteMode::Always
        );
        assert_eq!(
            overwrite_mode_from_arguments(&matches(&["test", "--no-overwrite"])),
            OverwriteMode::Never
        );
        assert_eq!(overwrite_mode_from_arguments(&matches(&["test"])), OverwriteMode::Ask);
    }

    #[test]
    fn values_are_parsed() {
        let arguments = matches(&["test", "--count", "12", "-v"]);
        assert_eq!(
            get_value_from_parseable_argument::<usize>(&arguments, "count"),
            Some(12)
        );
        assert_eq!(verbosity_from_arguments(&arguments), Verbosity::Messages);
    }
}
