use crate::tensor::Tensor;
use std::fmt;

/// Integer element kind usable as a row id.
pub trait SegmentIndex: Copy + Send + Sync + fmt::Display + 'static {
    const KIND: IndexKind;

    fn as_i64(self) -> i64;

    /// Row offset when `self` lies in `[0, data_size)`.
    #[inline]
    fn to_row(self, data_size: usize) -> Option<usize> {
        let v = self.as_i64();
        if v >= 0 && (v as u64) < data_size as u64 { Some(v as usize) } else { None }
    }
}

impl SegmentIndex for i32 {
    const KIND: IndexKind = IndexKind::I32;
    #[inline]
    fn as_i64(self) -> i64 { self as i64 }
}

impl SegmentIndex for i64 {
    const KIND: IndexKind = IndexKind::I64;
    #[inline]
    fn as_i64(self) -> i64 { self }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    I32,
    I64,
}

impl IndexKind {
    pub fn name(self) -> &'static str {
        match self {
            IndexKind::I32 => "int32",
            IndexKind::I64 => "int64",
        }
    }
}

/// INDICES with its element kind resolved at runtime.
#[derive(Debug, Clone, Copy)]
pub enum Indices<'a> {
    I32(&'a Tensor<i32>),
    I64(&'a Tensor<i64>),
}

impl<'a> Indices<'a> {
    pub fn kind(&self) -> IndexKind {
        match self {
            Indices::I32(_) => IndexKind::I32,
            Indices::I64(_) => IndexKind::I64,
        }
    }

    pub fn dim(&self) -> usize {
        match self {
            Indices::I32(t) => t.dim(),
            Indices::I64(t) => t.dim(),
        }
    }

    pub fn numel(&self) -> usize {
        match self {
            Indices::I32(t) => t.numel(),
            Indices::I64(t) => t.numel(),
        }
    }
}

impl<'a> From<&'a Tensor<i32>> for Indices<'a> {
    fn from(t: &'a Tensor<i32>) -> Self { Indices::I32(t) }
}

impl<'a> From<&'a Tensor<i64>> for Indices<'a> {
    fn from(t: &'a Tensor<i64>) -> Self { Indices::I64(t) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_row_rejects_negative_and_past_end() {
        assert_eq!(2i32.to_row(3), Some(2));
        assert_eq!(3i32.to_row(3), None);
        assert_eq!((-1i64).to_row(3), None);
        assert_eq!(i64::MAX.to_row(usize::MAX), Some(i64::MAX as usize));
    }

    #[test]
    fn kind_follows_tensor_element_type() {
        let a = Tensor::vector(vec![0i32, 1]);
        let b = Tensor::vector(vec![0i64]);
        assert_eq!(Indices::from(&a).kind(), IndexKind::I32);
        assert_eq!(Indices::from(&b).kind(), IndexKind::I64);
        assert_eq!(Indices::from(&a).numel(), 2);
        assert_eq!(<i64 as SegmentIndex>::KIND.name(), "int64");
    }
}
