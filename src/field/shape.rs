//! Resolution of field codes and of the shape a field is expected to have.

use crate::io::fieldsfile::{lookup::Lookup, FieldsFile};
use std::{fmt, io};

/// Canonical dimension names, in the order of the axes of a reconciled array.
pub const TIME: &str = "time";
pub const PSEUDO: &str = "pseudo";
pub const LAT: &str = "lat";
pub const LON: &str = "lon";

/// Lengths of the canonical dimensions of a field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExpectedShape {
    pub time: usize,
    pub pseudo: usize,
    pub lat: usize,
    pub lon: usize,
}

impl ExpectedShape {
    /// Returns the dimension names and lengths in canonical order.
    pub fn dims(&self) -> [(&'static str, usize); 4] {
        [
            (TIME, self.time),
            (PSEUDO, self.pseudo),
            (LAT, self.lat),
            (LON, self.lon),
        ]
    }
}

impl fmt::Display for ExpectedShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "(time={}, pseudo={}, lat={}, lon={})",
            self.time, self.pseudo, self.lat, self.lon
        )
    }
}

/// Returns the 1-based pseudo-level index of the given record.
pub fn record_pseudo_level(lookup: &Lookup) -> usize {
    lookup.lbuser5().max(1) as usize
}

/// Returns the 1-based time index of the given record.
pub fn record_time_level(lookup: &Lookup) -> usize {
    lookup.lbuser6().max(1) as usize
}

/// Finds the STASH code of the single STASHmaster entry whose name matches
/// the given pattern.
pub fn get_code(file: &FieldsFile, field_name: &str) -> io::Result<i64> {
    let stashmaster = file.stashmaster().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            "No STASHmaster is attached to the UM file",
        )
    })?;
    let matches = stashmaster.by_regex(field_name)?;
    match matches.as_slice() {
        [entry] => Ok(entry.code()),
        [] => Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!(
                "Field name {} is ambiguous or missing: no STASHmaster entry matches",
                field_name
            ),
        )),
        entries => Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!(
                "Field name {} is ambiguous or missing: it matches {}",
                field_name,
                entries
                    .iter()
                    .map(|entry| format!("{} ({})", entry.name, entry.code()))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        )),
    }
}

/// Determines the shape of the named field from the grid of the file and the
/// largest pseudo-level and time indices among its records.
pub fn determine_shape(file: &FieldsFile, field_name: &str) -> io::Result<ExpectedShape> {
    let stash_code = get_code(file, field_name)?;
    let mut shape = ExpectedShape {
        time: 1,
        pseudo: 1,
        lat: file.num_rows()?,
        lon: file.num_cols()?,
    };
    for field in file.used_fields() {
        if field.stash_code() == stash_code {
            shape.pseudo = shape.pseudo.max(record_pseudo_level(field.lookup()));
            shape.time = shape.time.max(record_time_level(field.lookup()));
        }
    }
    Ok(shape)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{
        fieldsfile::{
            header::DATASET_TYPE_DUMP,
            lookup::{Field, LBUSER5, LBUSER6},
        },
        stashmaster::{tests::STASHMASTER_TEXT, StashMaster},
        Endianness,
    };

    fn file_with_records(records: &[(i64, i64, i64)]) -> FieldsFile {
        let mut file = FieldsFile::new(DATASET_TYPE_DUMP, 3, 4, Endianness::Big);
        for &(code, pseudo, time) in records {
            let mut lookup = Lookup::new_grid_field(code, 3, 4);
            lookup.set_int(LBUSER5, pseudo);
            lookup.set_int(LBUSER6, time);
            file.push_field(Field::new(lookup, None));
        }
        file.attach_stashmaster(StashMaster::parse(STASHMASTER_TEXT).unwrap().by_section(0));
        file
    }

    #[test]
    fn shape_uses_maximum_indices_of_matching_records() {
        let file = file_with_records(&[(896, 1, 0), (896, 5, 2), (896, 3, 1), (2, 9, 7)]);
        assert_eq!(
            determine_shape(&file, "WOOD THINNING").unwrap(),
            ExpectedShape {
                time: 2,
                pseudo: 5,
                lat: 3,
                lon: 4
            }
        );
    }

    #[test]
    fn shape_defaults_to_single_slice_without_records() {
        let file = file_with_records(&[(2, 4, 4)]);
        let shape = determine_shape(&file, "WOOD THINNING").unwrap();
        assert_eq!((shape.time, shape.pseudo), (1, 1));
    }

    #[test]
    fn ambiguous_and_missing_names_fail() {
        let file = file_with_records(&[]);
        let ambiguous = get_code(&file, "O").unwrap_err();
        assert!(ambiguous.to_string().contains("ambiguous or missing"));
        let missing = get_code(&file, "TEMPERATURE").unwrap_err();
        assert!(missing.to_string().contains("ambiguous or missing"));
        assert_eq!(get_code(&file, "WOOD").unwrap(), 896);
    }
}
