//! Consistency checks for UM files.

use super::{
    data::{packing_is_supported, DataProvider, PACKING_32_BIT},
    header::{HeaderComponentKind, DATASET_TYPE_BOUNDARY, DATASET_TYPE_DUMP},
    lookup::LOOKUP_ENTRY_LENGTH,
    FieldsFile, NUM_ROWS,
};

/// Returns a description of every consistency problem found in the given file.
pub fn validate(file: &FieldsFile) -> Vec<String> {
    let mut problems = Vec::new();
    let header = file.fixed_length_header();

    let dataset_type = header.dataset_type();
    if !(DATASET_TYPE_DUMP..=DATASET_TYPE_BOUNDARY).contains(&dataset_type) {
        problems.push(format!("Unknown dataset type {}", dataset_type));
    }

    let lookup_dim1 = header.lookup_dim1();
    if lookup_dim1 > 0 && lookup_dim1 != LOOKUP_ENTRY_LENGTH as i64 {
        problems.push(format!(
            "Lookup entries have {} words, expected {}",
            lookup_dim1, LOOKUP_ENTRY_LENGTH
        ));
    }
    let num_used = file.used_fields().count();
    if header.lookup_dim2() > 0 && num_used as i64 > header.lookup_dim2() {
        problems.push(format!(
            "{} records do not fit in a lookup table of {} entries",
            num_used,
            header.lookup_dim2()
        ));
    }

    match file.component(HeaderComponentKind::IntegerConstants) {
        None => problems.push("Integer constants are missing".to_string()),
        Some(constants) if constants.len() < NUM_ROWS => problems.push(format!(
            "Integer constants have only {} words",
            constants.len()
        )),
        _ => {}
    }
    if file.component(HeaderComponentKind::RealConstants).is_none() {
        problems.push("Real constants are missing".to_string());
    }
    if dataset_type == DATASET_TYPE_DUMP {
        if let (Ok(num_p_levels), Some(level_constants)) = (
            file.num_p_levels(),
            file.component(HeaderComponentKind::LevelDependentConstants),
        ) {
            let (dim1, _) = level_constants.dims();
            if dim1 != num_p_levels + 1 {
                problems.push(format!(
                    "Level dependent constants have {} levels, expected {}",
                    dim1,
                    num_p_levels + 1
                ));
            }
        }
    }

    let grid_shape = file.num_rows().and_then(|rows| Ok((rows, file.num_cols()?)));

    for (index, field) in file.fields().iter().enumerate() {
        if field.is_unused() {
            continue;
        }
        let lookup = field.lookup();
        match field.data() {
            Some(DataProvider::Source(range)) => {
                let (rows, cols) = (lookup.lbrow(), lookup.lbnpt());
                if rows <= 0 || cols <= 0 || !packing_is_supported(lookup) {
                    continue;
                }
                let num_values = (rows * cols + lookup.lbext().max(0)) as usize;
                let expected_words = if lookup.packing_digits().0 == PACKING_32_BIT {
                    (num_values + 1) / 2
                } else {
                    num_values
                };
                if range.num_words() != expected_words {
                    problems.push(format!(
                        "Record {} (STASH code {}) has {} data words, expected {} for a {}x{} grid",
                        index,
                        lookup.lbuser4(),
                        range.num_words(),
                        expected_words,
                        rows,
                        cols
                    ));
                }
            }
            Some(DataProvider::Array(values)) => {
                if let Ok((rows, cols)) = grid_shape {
                    if values.dim() != (rows, cols) {
                        problems.push(format!(
                            "Replacement data for record {} (STASH code {}) has shape {}x{}, but the file grid is {}x{}",
                            index,
                            lookup.lbuser4(),
                            values.nrows(),
                            values.ncols(),
                            rows,
                            cols
                        ));
                    }
                }
            }
            None => {}
        }
    }
    problems
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{
        fieldsfile::{
            header::{DATASET_TYPE, DATASET_TYPE_ANCILLARY},
            lookup::{Field, Lookup},
        },
        Endianness,
    };
    use ndarray::Array2;

    #[test]
    fn consistent_file_has_no_problems() {
        let mut file = FieldsFile::new(DATASET_TYPE_ANCILLARY, 2, 2, Endianness::Big);
        let mut field = Field::new(Lookup::new_grid_field(33, 2, 2), None);
        field.set_data(Array2::zeros((2, 2)));
        file.push_field(field);
        assert!(validate(&file).is_empty());
    }

    #[test]
    fn mismatched_replacement_and_unknown_type_are_reported() {
        let mut file = FieldsFile::new(DATASET_TYPE_ANCILLARY, 2, 2, Endianness::Big);
        file.fixed_length_header_mut().set(DATASET_TYPE, 42);
        let mut field = Field::new(Lookup::new_grid_field(33, 2, 2), None);
        field.set_data(Array2::zeros((3, 2)));
        file.push_field(field);

        let problems = validate(&file);
        assert_eq!(problems.len(), 2);
        assert!(problems[0].contains("dataset type 42"));
        assert!(problems[1].contains("3x2"));
    }
}
