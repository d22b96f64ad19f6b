use crate::error::{LookupError, Result};
use crate::index::SegmentIndex;

/// Re-walks LENGTHS/INDICES to name the first violated invariant.
///
/// Runs only after a kernel declined. It never touches the output; `Ok(())`
/// means the inputs are well formed and the kernel had no reason to decline.
pub fn validate_segments<I: SegmentIndex>(indices: &[I], lengths: &[i32], data_size: usize) -> Result<()> {
    let index_size = indices.len();
    let mut current = 0usize;
    for (segment, &len) in lengths.iter().enumerate() {
        if len < 0 {
            return Err(LookupError::NegativeLength { segment, length: len });
        }
        for _ in 0..len {
            if current >= index_size {
                return Err(LookupError::SegmentOverrun { segment, position: current, index_size });
            }
            let idx = indices[current];
            if idx.to_row(data_size).is_none() {
                return Err(LookupError::IndexOutOfBounds { position: current, index: idx.as_i64(), data_size });
            }
            current += 1;
        }
    }
    if current != index_size {
        return Err(LookupError::SegmentUnderrun { consumed: current, index_size });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_walk_is_ok() {
        assert_eq!(validate_segments(&[0i32, 2, 1], &[0, 2, 1, 0], 3), Ok(()));
        assert_eq!(validate_segments::<i64>(&[], &[0, 0], 0), Ok(()));
    }

    #[test]
    fn overrun_reports_segment_and_position() {
        assert_eq!(
            validate_segments(&[0i32, 1], &[1, 2], 3),
            Err(LookupError::SegmentOverrun { segment: 1, position: 2, index_size: 2 })
        );
    }

    #[test]
    fn first_bad_index_wins() {
        assert_eq!(
            validate_segments(&[0i64, -1, 9], &[3], 4),
            Err(LookupError::IndexOutOfBounds { position: 1, index: -1, data_size: 4 })
        );
    }

    #[test]
    fn underrun_and_negative_length() {
        assert_eq!(
            validate_segments(&[0i32, 1, 2], &[1, 1], 3),
            Err(LookupError::SegmentUnderrun { consumed: 2, index_size: 3 })
        );
        assert_eq!(
            validate_segments(&[0i32, 1], &[2, -1], 3),
            Err(LookupError::NegativeLength { segment: 1, length: -1 })
        );
    }
}
