//! Multi-dimensional arrays with per-dimension lower bounds.

use std::any::Any;

use super::{Array, Iterable, Reflect};
use crate::error::{FlattenError, Result};

/// A rectangular array stored in row-major order.
///
/// Every dimension has a length and an inclusive lower bound (zero unless set with
/// [`NdArray::with_lower_bounds`]). A dimension of length zero makes the array empty.
#[derive(Debug, Clone, PartialEq)]
pub struct NdArray<T> {
    shape: Vec<usize>,
    lower_bounds: Vec<isize>,
    data: Vec<T>,
}

impl<T> NdArray<T> {
    pub fn new(shape: Vec<usize>, data: Vec<T>) -> Result<Self> {
        if shape.is_empty() {
            return Err(FlattenError::configuration(
                "an array needs at least one dimension",
            ));
        }
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(FlattenError::configuration(format!(
                "shape {:?} needs {} elements but {} were supplied",
                shape,
                expected,
                data.len()
            )));
        }
        if let Some(&length) = shape.iter().find(|&&length| upper_bound(0, length).is_none()) {
            return Err(FlattenError::configuration(format!(
                "dimension length {} is out of range",
                length
            )));
        }
        let lower_bounds = vec![0; shape.len()];
        Ok(NdArray {
            shape,
            lower_bounds,
            data,
        })
    }

    /// Builds a two-dimensional array from equal-length rows.
    pub fn from_rows(rows: Vec<Vec<T>>) -> Result<Self> {
        let columns = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|row| row.len() != columns) {
            return Err(FlattenError::configuration("rows have different lengths"));
        }
        let shape = vec![rows.len(), columns];
        NdArray::new(shape, rows.into_iter().flatten().collect())
    }

    pub fn with_lower_bounds(mut self, lower_bounds: Vec<isize>) -> Result<Self> {
        if lower_bounds.len() != self.shape.len() {
            return Err(FlattenError::configuration(format!(
                "{} lower bounds given for a rank {} array",
                lower_bounds.len(),
                self.shape.len()
            )));
        }
        for (&lower, &length) in lower_bounds.iter().zip(&self.shape) {
            if upper_bound(lower, length).is_none() {
                return Err(FlattenError::configuration(format!(
                    "lower bound {} leaves no room for {} elements",
                    lower, length
                )));
            }
        }
        self.lower_bounds = lower_bounds;
        Ok(self)
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn lower_bounds(&self) -> &[isize] {
        &self.lower_bounds
    }

    pub fn get(&self, indices: &[isize]) -> Option<&T> {
        self.offset(indices).and_then(|offset| self.data.get(offset))
    }

    /// Elements in row-major order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.data.iter()
    }

    fn offset(&self, indices: &[isize]) -> Option<usize> {
        if indices.len() != self.shape.len() {
            return None;
        }
        let mut offset = 0usize;
        for ((&index, &lower), &length) in indices
            .iter()
            .zip(&self.lower_bounds)
            .zip(&self.shape)
        {
            let relative = usize::try_from(index.checked_sub(lower)?).ok()?;
            if relative >= length {
                return None;
            }
            offset = offset * length + relative;
        }
        Some(offset)
    }
}

/// Inclusive upper bound of a dimension, `lower - 1` when it is empty.
fn upper_bound(lower: isize, length: usize) -> Option<isize> {
    match length.checked_sub(1) {
        Some(last) => lower.checked_add(isize::try_from(last).ok()?),
        None => lower.checked_sub(1),
    }
}

impl<T: Reflect> Reflect for NdArray<T> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_array(&self) -> Option<&dyn Array> {
        Some(self)
    }

    fn as_iterable(&self) -> Option<&dyn Iterable> {
        Some(self)
    }
}

impl<T: Reflect> Array for NdArray<T> {
    fn rank(&self) -> usize {
        self.shape.len()
    }

    fn bounds(&self, dimension: usize) -> (isize, isize) {
        match (self.lower_bounds.get(dimension), self.shape.get(dimension)) {
            (Some(&lower), Some(&length)) => match upper_bound(lower, length) {
                Some(upper) => (lower, upper),
                None => (0, -1),
            },
            _ => (0, -1),
        }
    }

    fn element(&self, indices: &[isize]) -> Option<&dyn Reflect> {
        self.get(indices).map(|v| v as &dyn Reflect)
    }
}

impl<T: Reflect> Iterable for NdArray<T> {
    fn elements(&self) -> Box<dyn Iterator<Item = &dyn Reflect> + '_> {
        Box::new(self.data.iter().map(|v| v as &dyn Reflect))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_major_lookup() {
        let array = NdArray::from_rows(vec![vec![1, 2, 3], vec![4, 5, 6]]).unwrap();
        assert_eq!(array.shape(), &[2, 3]);
        assert_eq!(array.get(&[0, 2]), Some(&3));
        assert_eq!(array.get(&[1, 0]), Some(&4));
        assert_eq!(array.get(&[2, 0]), None);
        assert_eq!(array.get(&[0]), None);
    }

    #[test]
    fn test_lower_bounds_shift_indices() {
        let array = NdArray::new(vec![3], vec!['a', 'b', 'c'])
            .unwrap()
            .with_lower_bounds(vec![5])
            .unwrap();
        assert_eq!(array.bounds(0), (5, 7));
        assert_eq!(array.get(&[5]), Some(&'a'));
        assert_eq!(array.get(&[7]), Some(&'c'));
        assert_eq!(array.get(&[4]), None);
    }

    #[test]
    fn test_negative_lower_bounds() {
        let array = NdArray::new(vec![2, 2], vec![1u8, 2, 3, 4])
            .unwrap()
            .with_lower_bounds(vec![-1, 0])
            .unwrap();
        assert_eq!(array.bounds(0), (-1, 0));
        assert_eq!(array.get(&[-1, 1]), Some(&2));
        assert_eq!(array.get(&[0, 0]), Some(&3));
    }

    #[test]
    fn test_shape_mismatch_is_rejected() {
        assert!(NdArray::new(vec![2, 2], vec![1, 2, 3]).is_err());
        assert!(NdArray::<u8>::new(vec![], vec![]).is_err());
        assert!(NdArray::from_rows(vec![vec![1], vec![2, 3]]).is_err());
    }

    #[test]
    fn test_lower_bounds_must_leave_room_for_every_element() {
        let array = NdArray::new(vec![2], vec![1u8, 2]).unwrap();
        assert!(matches!(
            array.clone().with_lower_bounds(vec![isize::MAX]),
            Err(FlattenError::Configuration(_))
        ));

        let array = array.with_lower_bounds(vec![isize::MAX - 1]).unwrap();
        assert_eq!(array.bounds(0), (isize::MAX - 1, isize::MAX));
        assert_eq!(array.get(&[isize::MAX]), Some(&2));

        let empty = NdArray::<u8>::new(vec![0], vec![]).unwrap();
        assert!(empty.with_lower_bounds(vec![isize::MIN]).is_err());
    }

    #[test]
    fn test_empty_dimension_inverts_bounds() {
        let array = NdArray::<i32>::new(vec![2, 0], vec![]).unwrap();
        assert_eq!(array.bounds(1), (0, -1));
        assert_eq!(array.bounds(0), (0, 1));
    }
}
