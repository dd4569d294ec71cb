//! Substitution of record data in UM files with slices of external arrays.

use super::{
    labeled::LabeledArray,
    reconcile,
    shape::{self, PSEUDO, TIME},
};
use crate::io::{
    fieldsfile::FieldsFile,
    stashmaster::{self, StashMaster},
    Endianness, Verbosity,
};
use ndarray::{Array2, Ix2};
use std::{io, path::Path};

#[cfg(feature = "netcdf")]
use crate::io::netcdf;

/// Value written in place of missing (NaN) source values.
pub const MISSING_DATA_SENTINEL: f64 = 1e20;

/// Opens the UM file at the given path and attaches the given STASHmaster
/// tables, restricted to the given section.
///
/// `stash_paths` is a comma separated list of STASHmaster files. When it is
/// not given, the installed STASHmaster of the file's UM version is used.
pub fn open_fields_file<P: AsRef<Path>>(
    file_path: P,
    stash_paths: Option<&str>,
    section: i64,
    endianness: Endianness,
    verbosity: Verbosity,
) -> io::Result<FieldsFile> {
    let mut file = FieldsFile::open(file_path, endianness, verbosity)?;

    let stash_paths: Vec<String> = match stash_paths {
        Some(paths) => paths
            .split(',')
            .map(str::trim)
            .filter(|path| !path.is_empty())
            .map(String::from)
            .collect(),
        None => {
            let model_version = file
                .fixed_length_header()
                .model_version_string()
                .ok_or_else(|| {
                    io::Error::new(
                        io::ErrorKind::InvalidData,
                        "No STASHmaster specified and the UM file has no model version",
                    )
                })?;
            let path = stashmaster::stashmaster_path_from_env(&model_version)?;
            eprintln!(
                "Warning: No STASHmaster specified, using {}",
                path.display()
            );
            vec![path.to_string_lossy().into_owned()]
        }
    };
    if stash_paths.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "Empty list of STASHmaster files",
        ));
    }

    let stashmaster = StashMaster::from_files(&stash_paths, verbosity)?;
    file.attach_stashmaster(stashmaster.by_section(section));
    Ok(file)
}

/// Replaces the data of every record of the named field with the matching
/// slice of the given reconciled array.
///
/// The array may have any subset of the axes `time`, `pseudo`, `lat` and
/// `lon`, and must be two-dimensional once the record's time and pseudo-level
/// have been selected. All slices are extracted before any record is
/// modified, so the file is left unchanged if any slice fails. Returns the
/// number of replaced records.
pub fn swap_field(
    file: &mut FieldsFile,
    field_name: &str,
    source: &LabeledArray,
    verbosity: Verbosity,
) -> io::Result<usize> {
    let stash_code = shape::get_code(file, field_name)?;

    let mut replacements: Vec<(usize, Array2<f64>)> = Vec::new();
    for (index, field) in file.fields().iter().enumerate() {
        if field.is_unused() || field.stash_code() != stash_code {
            continue;
        }
        let pseudo_index = shape::record_pseudo_level(field.lookup()) - 1;
        let time_index = shape::record_time_level(field.lookup()) - 1;
        let slice = extract_slice(source, pseudo_index, time_index)?;
        replacements.push((index, slice));
    }

    if replacements.is_empty() {
        eprintln!(
            "Warning: No records with STASH code {} found for {}",
            stash_code, field_name
        );
    }
    let num_replaced = replacements.len();
    for (index, slice) in replacements {
        if verbosity.print_messages() {
            println!(
                "Replacing field {} (STASH code {}) in record {}",
                field_name, stash_code, index
            );
        }
        file.fields_mut()[index].set_data(slice);
    }
    Ok(num_replaced)
}

fn extract_slice(
    source: &LabeledArray,
    pseudo_index: usize,
    time_index: usize,
) -> io::Result<Array2<f64>> {
    let selected = source
        .clone()
        .select(PSEUDO, pseudo_index)?
        .select(TIME, time_index)?;
    let dims = selected.dims().join(", ");
    let slice = selected
        .into_values()
        .into_dimensionality::<Ix2>()
        .map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "Source slice for pseudo-level {} and time {} is not two-dimensional: ({})",
                    pseudo_index + 1,
                    time_index + 1,
                    dims
                ),
            )
        })?;
    Ok(slice.mapv(|value| {
        if value.is_nan() {
            MISSING_DATA_SENTINEL
        } else {
            value
        }
    }))
}

/// Replaces the named field with the given source array.
///
/// If `time_index` is given, the source dimension named `time` is first
/// reduced to that index. The source is then reconciled with the shape of the
/// field in the file before the records are substituted.
pub fn replace_field(
    file: &mut FieldsFile,
    field_name: &str,
    source: LabeledArray,
    time_index: Option<usize>,
    verbosity: Verbosity,
) -> io::Result<usize> {
    let source = match time_index {
        Some(time_index) => source.select(TIME, time_index)?,
        None => source,
    };
    let expected_shape = shape::determine_shape(file, field_name)?;
    if verbosity.print_messages() {
        println!(
            "Expected shape of {} is {}",
            field_name, expected_shape
        );
    }
    let source = reconcile::make_consistent(source, &expected_shape)?;
    swap_field(file, field_name, &source, verbosity)
}

/// Inputs of a field replacement from a NetCDF variable.
#[cfg(feature = "netcdf")]
#[derive(Clone, Debug)]
pub struct NetCDFReplacement<'a> {
    pub um_file: &'a Path,
    pub field_name: &'a str,
    pub nc_file: &'a Path,
    pub nc_var: &'a str,
    pub time_index: Option<usize>,
    pub stash_paths: Option<&'a str>,
    pub stash_section: i64,
}

/// Runs the full replacement workflow: the UM file is opened, the named
/// field is replaced with the NetCDF variable and the result is written to
/// the given output path.
#[cfg(feature = "netcdf")]
pub fn replace_field_from_netcdf<P: AsRef<Path>>(
    replacement: &NetCDFReplacement,
    output_file_path: P,
    verbosity: Verbosity,
) -> io::Result<()> {
    let mut file = open_fields_file(
        replacement.um_file,
        replacement.stash_paths,
        replacement.stash_section,
        Endianness::Big,
        verbosity,
    )?;
    let source = netcdf::read_variable(replacement.nc_file, replacement.nc_var, verbosity)?;
    replace_field(
        &mut file,
        replacement.field_name,
        source,
        replacement.time_index,
        verbosity,
    )?;
    file.write_to_file(output_file_path, verbosity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{
        fieldsfile::{
            header::{DATASET_TYPE_DUMP, MODEL_VERSION},
            lookup::{Field, Lookup, LBUSER5, LBUSER6},
        },
        stashmaster::{tests::STASHMASTER_TEXT, UMDIR_ENV_VAR},
        utils::write_text_file,
    };
    use ndarray::array;
    use std::env;

    const USER_STASHMASTER_TEXT: &str = "\
1|    1 |    0 |  896 |USER WOOD THINNING                  |
2|    2 |    0 |    1 |    1 |    5 |   -1 |   -1 |    0 |    0 |    0 |    0 |
3| 000000000000000000000000000000 | 00000000000000000001 |    0 |
4|    1 |    2 | -3  -3  -3  -3  -2  -2  -2  -2  -2  -2 |
5|    0 | 1693 |    0 |  129 |    0 |    0 |    0 |    0 |    0 |
";

    fn write_thinning_file(path: &Path) {
        let mut file = FieldsFile::new(DATASET_TYPE_DUMP, 2, 3, Endianness::Big);
        file.fixed_length_header_mut().set(MODEL_VERSION, 703);
        let mut field = Field::new(Lookup::new_grid_field(896, 2, 3), None);
        field.set_data(Array2::zeros((2, 3)));
        file.push_field(field);
        file.write_to_file(path, Verbosity::Quiet).unwrap();
    }

    fn thinning_file(records: &[(i64, i64)]) -> FieldsFile {
        let mut file = FieldsFile::new(DATASET_TYPE_DUMP, 2, 3, Endianness::Big);
        for &(pseudo, time) in records {
            let mut lookup = Lookup::new_grid_field(896, 2, 3);
            lookup.set_int(LBUSER5, pseudo);
            lookup.set_int(LBUSER6, time);
            file.push_field(Field::new(lookup, None));
        }
        file.attach_stashmaster(StashMaster::parse(STASHMASTER_TEXT).unwrap().by_section(0));
        file
    }

    fn new_values(file: &FieldsFile, index: usize) -> Array2<f64> {
        file.read_field_values(index).unwrap()
    }

    #[test]
    fn records_receive_slices_by_pseudo_level() {
        let mut file = thinning_file(&[(1, 1), (2, 1)]);
        let source = LabeledArray::from_shape_vec(
            &["pseudo", "lat", "lon"],
            &[2, 2, 3],
            (0..12).map(f64::from).collect(),
        )
        .unwrap();
        assert_eq!(
            swap_field(&mut file, "WOOD", &source, Verbosity::Quiet).unwrap(),
            2
        );
        assert_eq!(new_values(&file, 0), array![[0.0, 1.0, 2.0], [3.0, 4.0, 5.0]]);
        assert_eq!(new_values(&file, 1), array![[6.0, 7.0, 8.0], [9.0, 10.0, 11.0]]);
    }

    #[test]
    fn missing_values_become_sentinel() {
        let mut file = thinning_file(&[(1, 1)]);
        let source = LabeledArray::from_shape_vec(
            &["lat", "lon"],
            &[2, 3],
            vec![f64::NAN, 1.0, f64::NAN, 2.0, 3.0, f64::NAN],
        )
        .unwrap();
        swap_field(&mut file, "WOOD", &source, Verbosity::Quiet).unwrap();
        let values = new_values(&file, 0);
        assert!(values.iter().all(|value| !value.is_nan()));
        assert_eq!(values[[0, 0]], MISSING_DATA_SENTINEL);
        assert_eq!(values[[1, 0]], 2.0);
    }

    #[test]
    fn failed_slice_leaves_all_records_untouched() {
        let mut file = thinning_file(&[(1, 1), (3, 1)]);
        let source = LabeledArray::from_shape_vec(
            &["pseudo", "lat", "lon"],
            &[2, 2, 3],
            vec![0.0; 12],
        )
        .unwrap();
        assert!(swap_field(&mut file, "WOOD", &source, Verbosity::Quiet).is_err());
        assert!(file.fields().iter().all(|field| !field.has_new_data()));
    }

    #[test]
    fn source_in_any_axis_order_is_reconciled() {
        let mut file = thinning_file(&[(1, 1), (2, 1), (1, 2), (2, 2)]);
        // Axes (lon, time, pseudo, lat), value encodes (time, pseudo).
        let mut values = Vec::new();
        for _lon in 0..3 {
            for time in 0..2 {
                for pseudo in 0..2 {
                    for _lat in 0..2 {
                        values.push((10 * time + pseudo) as f64);
                    }
                }
            }
        }
        let source =
            LabeledArray::from_shape_vec(&["x", "t", "p", "y"], &[3, 2, 2, 2], values).unwrap();
        // Lengths of time and pseudo coincide, so they are assigned in native order.
        assert_eq!(
            replace_field(&mut file, "WOOD", source, None, Verbosity::Quiet).unwrap(),
            4
        );
        assert_eq!(new_values(&file, 1)[[0, 0]], 1.0);
        assert_eq!(new_values(&file, 2)[[1, 2]], 10.0);
        assert_eq!(new_values(&file, 3)[[1, 1]], 11.0);
    }

    #[test]
    fn time_index_selects_source_time() {
        let mut file = thinning_file(&[(1, 0)]);
        let source = LabeledArray::from_shape_vec(
            &["time", "lat", "lon"],
            &[3, 2, 3],
            (0..18).map(f64::from).collect(),
        )
        .unwrap();
        replace_field(&mut file, "WOOD", source, Some(2), Verbosity::Quiet).unwrap();
        assert_eq!(new_values(&file, 0)[[0, 0]], 12.0);
    }

    #[test]
    fn comma_separated_stashmasters_are_merged_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let um_path = dir.path().join("dump.um");
        write_thinning_file(&um_path);
        write_text_file(STASHMASTER_TEXT, dir.path().join("a.txt")).unwrap();
        write_text_file(USER_STASHMASTER_TEXT, dir.path().join("b.txt")).unwrap();

        let paths = format!(
            "{} , {},",
            dir.path().join("a.txt").display(),
            dir.path().join("b.txt").display()
        );
        let file = open_fields_file(
            &um_path,
            Some(paths.as_str()),
            0,
            Endianness::Big,
            Verbosity::Quiet,
        )
        .unwrap();
        assert_eq!(shape::get_code(&file, "USER WOOD").unwrap(), 896);
        assert_eq!(shape::get_code(&file, "^U COMPNT").unwrap(), 2);
        // Section 3 entries are filtered out
        assert!(shape::get_code(&file, "TEMPERATURE").is_err());
    }

    #[test]
    fn empty_stashmaster_list_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let um_path = dir.path().join("dump.um");
        write_thinning_file(&um_path);
        let err = open_fields_file(&um_path, Some(" , "), 0, Endianness::Big, Verbosity::Quiet)
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn installed_stashmaster_is_used_when_none_is_given() {
        let dir = tempfile::tempdir().unwrap();
        let um_path = dir.path().join("dump.um");
        write_thinning_file(&um_path);
        write_text_file(
            STASHMASTER_TEXT,
            stashmaster::installed_stashmaster_path(dir.path(), "7.3"),
        )
        .unwrap();

        env::set_var(UMDIR_ENV_VAR, dir.path());
        let file = open_fields_file(&um_path, None, 0, Endianness::Big, Verbosity::Quiet);
        env::remove_var(UMDIR_ENV_VAR);
        assert_eq!(shape::get_code(&file.unwrap(), "WOOD THINNING").unwrap(), 896);
    }
}
