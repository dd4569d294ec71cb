//! Reading of source variables from NetCDF files.

use crate::{field::labeled::LabeledArray, io::Verbosity, io_result};
use netcdf_rs::{self as nc, AttributeValue};
use std::{io, path::Path};

/// Reads the given variable from the NetCDF file at the given path.
///
/// Values equal to the `_FillValue` or `missing_value` attribute are replaced
/// with NaN, and `scale_factor` and `add_offset` are applied.
pub fn read_variable<P: AsRef<Path>>(
    file_path: P,
    variable_name: &str,
    verbosity: Verbosity,
) -> io::Result<LabeledArray> {
    let file_path = file_path.as_ref();
    if verbosity.print_messages() {
        println!(
            "Reading {} from {}",
            variable_name,
            file_path.display()
        );
    }
    let file = nc::open(file_path).map_err(|err| {
        io::Error::new(
            io::ErrorKind::NotFound,
            format!("Could not open {}: {}", file_path.display(), err),
        )
    })?;
    let variable = file.variable(variable_name).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::NotFound,
            format!(
                "Variable {} not found in {}",
                variable_name,
                file_path.display()
            ),
        )
    })?;

    let dims: Vec<String> = variable
        .dimensions()
        .iter()
        .map(|dim| dim.name().to_string())
        .collect();
    let shape: Vec<usize> = variable.dimensions().iter().map(|dim| dim.len()).collect();
    let values: Vec<f64> = io_result!(variable.get_values::<f64, _>(..))?;

    let fill_values: Vec<f64> = ["_FillValue", "missing_value"]
        .iter()
        .filter_map(|name| numeric_attribute(&variable, name))
        .collect();
    let scale_factor = numeric_attribute(&variable, "scale_factor").unwrap_or(1.0);
    let add_offset = numeric_attribute(&variable, "add_offset").unwrap_or(0.0);

    let values = values
        .into_iter()
        .map(|value| {
            if fill_values.iter().any(|&fill_value| value == fill_value) {
                f64::NAN
            } else {
                value * scale_factor + add_offset
            }
        })
        .collect();

    let dim_refs: Vec<&str> = dims.iter().map(String::as_str).collect();
    LabeledArray::from_shape_vec(&dim_refs, &shape, values)
}

fn numeric_attribute(variable: &nc::Variable, name: &str) -> Option<f64> {
    match variable.attribute_value(name)?.ok()? {
        AttributeValue::Double(value) => Some(value),
        AttributeValue::Float(value) => Some(f64::from(value)),
        AttributeValue::Int(value) => Some(f64::from(value)),
        AttributeValue::Short(value) => Some(f64::from(value)),
        AttributeValue::Schar(value) => Some(f64::from(value)),
        AttributeValue::Uchar(value) => Some(f64::from(value)),
        AttributeValue::Ushort(value) => Some(f64::from(value)),
        AttributeValue::Uint(value) => Some(f64::from(value)),
        AttributeValue::Longlong(value) => Some(value as f64),
        AttributeValue::Doubles(values) => values.first().copied(),
        AttributeValue::Floats(values) => values.first().map(|&value| f64::from(value)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_values_are_masked_and_scaled() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("source.nc");
        {
            let mut file = nc::create(&path).unwrap();
            file.add_dimension("time", 2).unwrap();
            file.add_dimension("lat", 1).unwrap();
            file.add_dimension("lon", 2).unwrap();
            let mut variable = file
                .add_variable::<f64>("fractions", &["time", "lat", "lon"])
                .unwrap();
            variable.set_fill_value(-999.0).unwrap();
            variable.put_attribute("scale_factor", 2.0).unwrap();
            variable
                .put_values(&[1.0, -999.0, 3.0, 4.0], ..)
                .unwrap();
        }

        let array = read_variable(&path, "fractions", Verbosity::Quiet).unwrap();
        assert_eq!(array.dims(), &["time", "lat", "lon"]);
        assert_eq!(array.shape(), &[2, 1, 2]);
        assert_eq!(array.values()[[0, 0, 0]], 2.0);
        assert!(array.values()[[0, 0, 1]].is_nan());
        assert_eq!(array.values()[[1, 0, 1]], 8.0);

        assert!(read_variable(&path, "missing", Verbosity::Quiet).is_err());
    }
}
