//! Command line interface for inspecting the contents of a UM file.

use super::utils as cli_utils;
use crate::{
    exit_on_error,
    io::{
        fieldsfile::{header::HeaderComponentKind, FieldsFile},
        stashmaster::StashMaster,
        Endianness, Verbosity,
    },
};
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::collections::HashSet;

/// Builds a representation of the `inspect` command line subcommand.
pub fn create_inspect_subcommand() -> Command {
    let command = Command::new("inspect")
        .about("Print the header and record overview of a UM file")
        .arg(
            Arg::new("input-file")
                .value_name("UM_FILE")
                .required(true)
                .help("UM file to inspect"),
        )
        .arg(
            Arg::new("stash")
                .long("stash")
                .value_name("PATHS")
                .help("STASHmaster files to take field names from (comma-separated)"),
        )
        .arg(
            Arg::new("field")
                .long("field")
                .value_name("NAME")
                .requires("stash")
                .help("Only list records of fields whose name matches this regular expression"),
        )
        .arg(
            Arg::new("validate")
                .long("validate")
                .action(ArgAction::SetTrue)
                .help("Also check the file for internal consistency"),
        );
    cli_utils::add_verbose_argument(command, "Print status messages related to reading")
}

/// Runs the actions for the `inspect` subcommand using the given arguments.
pub fn run_inspect_subcommand(arguments: &ArgMatches) {
    let input_file_path = cli_utils::get_required_string(arguments, "input-file");
    let verbosity = cli_utils::verbosity_from_arguments(arguments);

    let file = exit_on_error!(
        FieldsFile::open(input_file_path, Endianness::Big, verbosity),
        "Error: Could not read UM file: {}"
    );
    let stashmaster = cli_utils::get_optional_string(arguments, "stash").map(|paths| {
        let paths: Vec<&str> = paths.split(',').map(str::trim).collect();
        exit_on_error!(
            StashMaster::from_files(&paths, verbosity),
            "Error: Could not read STASHmaster: {}"
        )
    });
    let selected_codes: Option<HashSet<i64>> =
        match (cli_utils::get_optional_string(arguments, "field"), &stashmaster) {
            (Some(pattern), Some(stashmaster)) => Some(
                exit_on_error!(
                    stashmaster.by_regex(pattern),
                    "Error: Could not select fields: {}"
                )
                .into_iter()
                .map(|entry| entry.code())
                .collect(),
            ),
            _ => None,
        };

    print_header_summary(&file);
    if let Some(stashmaster) = &stashmaster {
        println!(
            "STASHmaster: {} entries (UM version {})",
            stashmaster.len(),
            stashmaster.header("UM_VERSION").unwrap_or("unknown")
        );
    }
    print_records(&file, stashmaster.as_ref(), selected_codes.as_ref());

    if arguments.get_flag("validate") {
        let problems = file.validate();
        if problems.is_empty() {
            println!("No consistency problems found");
        } else {
            for problem in problems {
                println!("Problem: {}", problem);
            }
        }
    }
    if verbosity == Verbosity::Messages {
        println!("Inspected {}", input_file_path);
    }
}

fn print_header_summary(file: &FieldsFile) {
    let header = file.fixed_length_header();
    println!("Dataset type: {}", header.dataset_type());
    println!(
        "Model version: {}",
        header
            .model_version_string()
            .unwrap_or_else(|| "unknown".to_string())
    );
    println!(
        "Validity time: {:04}-{:02}-{:02} {:02}:{:02}:{:02}",
        header.t2_year(),
        header.t2_month(),
        header.t2_day(),
        header.t2_hour(),
        header.t2_minute(),
        header.t2_second()
    );
    match (file.num_rows(), file.num_cols()) {
        (Ok(rows), Ok(cols)) => println!("Grid: {} rows x {} columns", rows, cols),
        _ => println!("Grid: unknown"),
    }
    if let Ok(num_land_points) = file.num_land_points() {
        println!("Land points: {}", num_land_points);
    }
    for kind in HeaderComponentKind::ALL {
        if let Some(component) = file.component(kind) {
            let (dim1, dim2) = component.dims();
            match dim2 {
                Some(dim2) => println!("{}: {} x {}", kind.name(), dim1, dim2),
                None => println!("{}: {}", kind.name(), dim1),
            }
        }
    }
    println!(
        "Lookup: {} used of {} entries",
        file.used_fields().count(),
        file.fields().len()
    );
}

fn print_records(
    file: &FieldsFile,
    stashmaster: Option<&StashMaster>,
    selected_codes: Option<&HashSet<i64>>,
) {
    println!(
        "{:>6} {:>6} {:>6} {:>6} {:>9} {:>6}  name",
        "record", "stash", "pseudo", "time", "grid", "lbpack"
    );
    for (index, field) in file.fields().iter().enumerate() {
        if field.is_unused() {
            continue;
        }
        let code = field.stash_code();
        if selected_codes.map_or(false, |codes| !codes.contains(&code)) {
            continue;
        }
        let lookup = field.lookup();
        let name = stashmaster
            .and_then(|stashmaster| stashmaster.get(code))
            .map_or("", |entry| entry.name.as_str());
        println!(
            "{:>6} {:>6} {:>6} {:>6} {:>9} {:>6}  {}",
            index,
            code,
            lookup.lbuser5(),
            lookup.lbuser6(),
            format!("{}x{}", lookup.lbrow(), lookup.lbnpt()),
            lookup.lbpack(),
            name
        );
    }
}
