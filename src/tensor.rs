use crate::error::{LookupError, Result};

/// Owned dense tensor: a shape plus a contiguous row-major buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor<T> {
    shape: Vec<usize>,
    data: Vec<T>,
}

impl<T> Tensor<T> {
    pub fn new(shape: Vec<usize>, data: Vec<T>) -> Result<Self> {
        let expected = shape.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d));
        let Some(expected) = expected.filter(|&n| n == data.len()) else {
            let expected = expected.unwrap_or(usize::MAX);
            return Err(LookupError::ShapeMismatch { shape, expected, actual: data.len() });
        };
        Ok(Self { shape, data })
    }

    /// Rank-1 tensor over `data`.
    pub fn vector(data: Vec<T>) -> Self {
        Self { shape: vec![data.len()], data }
    }

    pub fn shape(&self) -> &[usize] { &self.shape }
    pub fn dim(&self) -> usize { self.shape.len() }
    pub fn numel(&self) -> usize { self.data.len() }

    /// Extent of axis `i`, 0 when the axis does not exist.
    pub fn size(&self, i: usize) -> usize { self.shape.get(i).copied().unwrap_or(0) }

    pub fn data(&self) -> &[T] { &self.data }
    pub fn data_mut(&mut self) -> &mut [T] { &mut self.data }

    /// Row `r` of a rank-2 tensor.
    pub fn row(&self, r: usize) -> &[T] {
        let w = self.size(1);
        &self.data[r * w..(r + 1) * w]
    }
}

impl<T: Copy + Default> Tensor<T> {
    pub fn zeros(shape: Vec<usize>) -> Self {
        let n = shape.iter().product();
        Self { shape, data: vec![T::default(); n] }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_mismatched_buffer() {
        let err = Tensor::new(vec![2, 3], vec![0u8; 5]).unwrap_err();
        assert_eq!(err, LookupError::ShapeMismatch { shape: vec![2, 3], expected: 6, actual: 5 });
    }

    #[test]
    fn overflowing_shape_is_an_error() {
        let err = Tensor::new(vec![usize::MAX, 2], vec![0u8; 4]).unwrap_err();
        assert_eq!(err, LookupError::ShapeMismatch { shape: vec![usize::MAX, 2], expected: usize::MAX, actual: 4 });
    }

    #[test]
    fn size_of_missing_axis_is_zero() {
        let t = Tensor::vector(vec![1i32, 2, 3]);
        assert_eq!(t.dim(), 1);
        assert_eq!(t.size(0), 3);
        assert_eq!(t.size(1), 0);
    }

    #[test]
    fn row_slices_matrix() {
        let t = Tensor::new(vec![2, 2], vec![1.0f32, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(t.row(1), &[3.0, 4.0]);
    }
}
