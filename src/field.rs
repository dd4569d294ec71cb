//! Replacement of fields in UM files with data from external arrays.
//!
//! The replacement runs in a fixed sequence: the UM file is opened with its
//! STASHmaster attached, the expected shape of the target field is resolved
//! from the file, the source array is reconciled with that shape, the matching
//! records receive their slices of the source array, and the file is written.

pub mod labeled;
pub mod reconcile;
pub mod replace;
pub mod shape;

pub use labeled::LabeledArray;
pub use reconcile::make_consistent;
pub use replace::{open_fields_file, replace_field, swap_field};
pub use shape::{determine_shape, get_code, ExpectedShape};
