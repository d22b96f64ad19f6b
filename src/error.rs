use thiserror::Error;

/// Enforcement failures raised by the lookup operator.
///
/// Every variant is fatal to the invocation that produced it; nothing is
/// recovered internally and no partial output is returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LookupError {
    #[error("INDICES must be a vector, got rank {rank}")]
    IndicesRank { rank: usize },

    #[error("LENGTHS must be a vector, got rank {rank}")]
    LengthsRank { rank: usize },

    #[error("WEIGHTS must be a vector, got rank {rank}")]
    WeightsRank { rank: usize },

    #[error("WEIGHTS should have the same length as INDICES: {weights} vs {indices}")]
    WeightsLength { weights: usize, indices: usize },

    #[error("DATA must be a matrix, got rank {rank}")]
    DataRank { rank: usize },

    #[error("DATA must have more than 8 columns, got {columns}")]
    DataWidth { columns: usize },

    #[error("tensor shape {shape:?} holds {expected} elements but buffer has {actual}")]
    ShapeMismatch { shape: Vec<usize>, expected: usize, actual: usize },

    #[error("missing input {name} at slot {slot}")]
    MissingInput { slot: usize, name: &'static str },

    #[error("input {name} at slot {slot} must be {expected}, got {found}")]
    InputType { slot: usize, name: &'static str, expected: &'static str, found: &'static str },

    #[error("LENGTHS[{segment}] is negative: {length}")]
    NegativeLength { segment: usize, length: i32 },

    #[error("segment {segment} runs past the end of INDICES at position {position} (index size {index_size})")]
    SegmentOverrun { segment: usize, position: usize, index_size: usize },

    #[error("Index {position} is out of bounds: {index}, range 0 to {data_size}")]
    IndexOutOfBounds { position: usize, index: i64, data_size: usize },

    #[error(
        "Your input seems to be incorrect: the sum of lengths values should be the size of the \
         indices tensor, but it appears not ({consumed} consumed of {index_size})"
    )]
    SegmentUnderrun { consumed: usize, index_size: usize },

    #[error("Cannot have with_weights and is_mean at the same time")]
    ConflictingModes,

    #[error("kernel {kernel} declined inputs that pass validation")]
    KernelInconsistency { kernel: &'static str },
}

impl LookupError {
    /// True for the errors that are only detectable by walking INDICES/LENGTHS.
    pub fn is_segment_error(&self) -> bool {
        matches!(
            self,
            LookupError::NegativeLength { .. }
                | LookupError::SegmentOverrun { .. }
                | LookupError::IndexOutOfBounds { .. }
                | LookupError::SegmentUnderrun { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, LookupError>;
