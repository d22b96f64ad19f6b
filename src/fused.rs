//! Fused 8-bit rowwise layout: `[q0 .. q(n-1)][scale: f32 LE][bias: f32 LE]`.

/// Trailing bytes per row reserved for scale + bias.
pub const FUSED_OVERHEAD: usize = 8;

const EPSILON: f32 = 1e-8;

/// Number of quantized values in a fused row of `row_width` bytes.
#[inline]
pub fn block_size(row_width: usize) -> usize { row_width.saturating_sub(FUSED_OVERHEAD) }

/// Reads the per-row `(scale, bias)` pair. `row` must be a whole fused row.
#[inline]
pub fn scale_bias(row: &[u8]) -> (f32, f32) {
    let n = row.len() - FUSED_OVERHEAD;
    let mut b4 = [0u8; 4];
    b4.copy_from_slice(&row[n..n + 4]);
    let scale = f32::from_le_bytes(b4);
    b4.copy_from_slice(&row[n + 4..n + 8]);
    let bias = f32::from_le_bytes(b4);
    (scale, bias)
}

/// `value = scale * raw + bias` for every code in the row.
pub fn dequantize_row(row: &[u8]) -> Vec<f32> {
    let (scale, bias) = scale_bias(row);
    row[..row.len() - FUSED_OVERHEAD].iter().map(|&q| scale * q as f32 + bias).collect()
}

/// Reference min/max rowwise quantizer, used to build fixtures and synthetic tables.
pub fn quantize_row(values: &[f32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(values.len() + FUSED_OVERHEAD);
    let (min, max) = values.iter().fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let (min, max) = if values.is_empty() { (0.0, 0.0) } else { (min, max) };
    let range = max - min;
    let scale = range / 255.0;
    let inverse_scale = 255.0 / (range + EPSILON);
    for &v in values {
        let q = ((v - min) * inverse_scale).round().clamp(0.0, 255.0);
        out.push(q as u8);
    }
    out.extend_from_slice(&scale.to_le_bytes());
    out.extend_from_slice(&min.to_le_bytes());
    out
}

/// Builds a fused row from explicit codes and scale/bias.
pub fn pack_row(codes: &[u8], scale: f32, bias: f32) -> Vec<u8> {
    let mut out = Vec::with_capacity(codes.len() + FUSED_OVERHEAD);
    out.extend_from_slice(codes);
    out.extend_from_slice(&scale.to_le_bytes());
    out.extend_from_slice(&bias.to_le_bytes());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_then_read_scale_bias() {
        let row = pack_row(&[0, 1, 2, 255], 0.5, -1.0);
        assert_eq!(row.len(), 12);
        assert_eq!(scale_bias(&row), (0.5, -1.0));
        assert_eq!(dequantize_row(&row), vec![-1.0, -0.5, 0.0, 126.5]);
    }

    #[test]
    fn quantizer_reproduces_values_within_half_step() {
        let vals = [-1.25f32, 0.0, 0.3, 2.75, 1.1];
        let row = quantize_row(&vals);
        let (scale, _) = scale_bias(&row);
        for (a, b) in vals.iter().zip(dequantize_row(&row)) {
            assert!((a - b).abs() <= scale * 0.5 + 1e-5, "{} vs {}", a, b);
        }
    }

    #[test]
    fn constant_row_dequantizes_exactly() {
        let row = quantize_row(&[3.5, 3.5, 3.5]);
        assert_eq!(dequantize_row(&row), vec![3.5, 3.5, 3.5]);
    }

    #[test]
    fn block_size_strips_overhead() {
        assert_eq!(block_size(9), 1);
        assert_eq!(block_size(4), 0);
    }
}
