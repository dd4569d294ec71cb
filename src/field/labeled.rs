//! N-dimensional arrays with named axes.

use ndarray::{ArrayD, Axis, IxDyn};
use std::io;

/// An array whose axes are identified by dimension names.
#[derive(Clone, Debug, PartialEq)]
pub struct LabeledArray {
    dims: Vec<String>,
    values: ArrayD<f64>,
}

impl LabeledArray {
    pub fn new(dims: Vec<String>, values: ArrayD<f64>) -> io::Result<Self> {
        if dims.len() != values.ndim() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "Got {} dimension names for an array with {} axes",
                    dims.len(),
                    values.ndim()
                ),
            ));
        }
        Ok(Self { dims, values })
    }

    /// Creates an array from dimension names, their lengths and row-major values.
    pub fn from_shape_vec(dims: &[&str], shape: &[usize], values: Vec<f64>) -> io::Result<Self> {
        let values = ArrayD::from_shape_vec(IxDyn(shape), values)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err.to_string()))?;
        Self::new(dims.iter().map(|dim| dim.to_string()).collect(), values)
    }

    pub fn dims(&self) -> &[String] {
        &self.dims
    }

    pub fn shape(&self) -> &[usize] {
        self.values.shape()
    }

    pub fn values(&self) -> &ArrayD<f64> {
        &self.values
    }

    pub fn into_values(self) -> ArrayD<f64> {
        self.values
    }

    /// Returns the axis with the given name.
    pub fn axis_of(&self, dim: &str) -> Option<usize> {
        self.dims.iter().position(|name| name == dim)
    }

    /// Returns the length of the axis with the given name.
    pub fn len_of(&self, dim: &str) -> Option<usize> {
        self.axis_of(dim).map(|axis| self.values.len_of(Axis(axis)))
    }

    /// Returns the array with the named dimension removed by selecting the
    /// given index along it. The array is returned unchanged if it has no
    /// such dimension.
    pub fn select(self, dim: &str, index: usize) -> io::Result<Self> {
        let axis = match self.axis_of(dim) {
            Some(axis) => axis,
            None => return Ok(self),
        };
        let length = self.values.len_of(Axis(axis));
        if index >= length {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "Index {} is out of bounds for dimension {} of length {}",
                    index, dim, length
                ),
            ));
        }
        let Self { mut dims, values } = self;
        dims.remove(axis);
        Ok(Self {
            dims,
            values: values.index_axis_move(Axis(axis), index),
        })
    }

    /// Returns the array with its axes reordered so that new axis `i` is old
    /// axis `order[i]`, and renamed to the given names.
    pub fn permuted_and_renamed(self, order: &[usize], names: Vec<String>) -> io::Result<Self> {
        if order.len() != self.values.ndim() || names.len() != order.len() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "Cannot reorder {} axes with an order of {} axes",
                    self.values.ndim(),
                    order.len()
                ),
            ));
        }
        Self::new(names, self.values.permuted_axes(IxDyn(order)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selecting_removes_the_dimension() {
        let array =
            LabeledArray::from_shape_vec(&["time", "y"], &[2, 3], (0..6).map(f64::from).collect())
                .unwrap();
        let selected = array.clone().select("time", 1).unwrap();
        assert_eq!(selected.dims(), &["y".to_string()]);
        assert_eq!(selected.values().as_slice().unwrap(), &[3.0, 4.0, 5.0]);

        assert_eq!(array.clone().select("pseudo", 4).unwrap(), array);
        assert!(array.select("time", 2).is_err());
    }

    #[test]
    fn permutation_moves_axes() {
        let array =
            LabeledArray::from_shape_vec(&["a", "b"], &[2, 3], (0..6).map(f64::from).collect())
                .unwrap();
        let permuted = array
            .permuted_and_renamed(&[1, 0], vec!["lat".to_string(), "lon".to_string()])
            .unwrap();
        assert_eq!(permuted.shape(), &[3, 2]);
        assert_eq!(permuted.values()[[2, 1]], 5.0);
        assert_eq!(permuted.len_of("lon"), Some(2));
    }
}
