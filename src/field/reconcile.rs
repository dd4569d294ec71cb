//! Alignment of source array axes with the canonical field dimensions.

use super::{labeled::LabeledArray, shape::ExpectedShape};
use std::io;

/// Reorders and renames the axes of the given array to match the expected shape.
///
/// Expected dimensions are visited in canonical order, and each is assigned the
/// first not yet assigned axis of the array with the same length. The result
/// has the assigned axes in canonical order, named by their canonical names.
/// Expected dimensions without a matching axis are left out. An axis that is
/// not assigned to any dimension is an error.
pub fn make_consistent(array: LabeledArray, shape: &ExpectedShape) -> io::Result<LabeledArray> {
    let lengths = array.shape().to_vec();
    let mut order: Vec<usize> = Vec::with_capacity(lengths.len());
    let mut names: Vec<String> = Vec::with_capacity(lengths.len());

    for (name, expected_length) in shape.dims() {
        if let Some(axis) =
            (0..lengths.len()).find(|axis| lengths[*axis] == expected_length && !order.contains(axis))
        {
            order.push(axis);
            names.push(name.to_string());
        }
    }

    if order.len() != lengths.len() {
        let unmatched: Vec<String> = (0..lengths.len())
            .filter(|axis| !order.contains(axis))
            .map(|axis| format!("{} ({})", array.dims()[axis], lengths[axis]))
            .collect();
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "Source dimensions {} do not match any dimension of the expected shape {}",
                unmatched.join(", "),
                shape
            ),
        ));
    }
    array.permuted_and_renamed(&order, names)
}
