//! AVX2+FMA kernel for x86_64.
//!
//! Compiled in with the `simd-avx2` feature and only constructed when the CPU
//! reports both `avx2` and `fma`.

use super::{reduce_segments, FastKernel, LookupArgs};
use crate::index::SegmentIndex;

#[cfg(all(target_arch = "x86_64", feature = "simd-avx2"))]
use std::arch::x86_64::*;

pub const NAME: &str = "avx2";

pub fn is_available() -> bool {
    #[cfg(all(target_arch = "x86_64", feature = "simd-avx2"))]
    {
        std::arch::is_x86_feature_detected!("avx2") && std::arch::is_x86_feature_detected!("fma")
    }
    #[cfg(not(all(target_arch = "x86_64", feature = "simd-avx2")))]
    {
        false
    }
}

/// Adds `scale * codes[i] + bias` into `out[i]`, 8 lanes at a time.
///
/// # Safety
/// Requires AVX2+FMA CPU support.
#[cfg(all(target_arch = "x86_64", feature = "simd-avx2"))]
#[target_feature(enable = "avx2,fma")]
pub unsafe fn accumulate_row(out: &mut [f32], codes: &[u8], scale: f32, bias: f32) {
    let n = out.len().min(codes.len());
    let vs = _mm256_set1_ps(scale);
    let vb = _mm256_set1_ps(bias);
    let mut i = 0usize;
    while i + 8 <= n {
        let q8 = _mm_loadl_epi64(codes.as_ptr().add(i) as *const __m128i);
        let qf = _mm256_cvtepi32_ps(_mm256_cvtepu8_epi32(q8));
        let acc = _mm256_add_ps(_mm256_loadu_ps(out.as_ptr().add(i)), vb);
        _mm256_storeu_ps(out.as_mut_ptr().add(i), _mm256_fmadd_ps(vs, qf, acc));
        i += 8;
    }
    while i < n {
        out[i] += scale * codes[i] as f32 + bias;
        i += 1;
    }
}

/// Handle proving AVX2+FMA were detected.
#[derive(Debug, Clone, Copy)]
pub struct Avx2Kernel {
    _detected: (),
}

impl Avx2Kernel {
    pub fn new() -> Option<Self> {
        if is_available() { Some(Self { _detected: () }) } else { None }
    }
}

impl FastKernel for Avx2Kernel {
    fn name(&self) -> &'static str { NAME }

    fn attempt_fused_lookup<I: SegmentIndex>(&self, args: &LookupArgs<'_, I>, out: &mut [f32]) -> bool {
        run(args, out)
    }
}

#[cfg(all(target_arch = "x86_64", feature = "simd-avx2"))]
fn run<I: SegmentIndex>(args: &LookupArgs<'_, I>, out: &mut [f32]) -> bool {
    // Safety: an Avx2Kernel only exists after feature detection succeeded.
    reduce_segments(args, out, |o, q, s, b| unsafe { accumulate_row(o, q, s, b) })
}

#[cfg(not(all(target_arch = "x86_64", feature = "simd-avx2")))]
fn run<I: SegmentIndex>(args: &LookupArgs<'_, I>, out: &mut [f32]) -> bool {
    reduce_segments(args, out, super::scalar::accumulate_row)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(all(target_arch = "x86_64", feature = "simd-avx2"))]
    #[test]
    fn simd_row_matches_scalar_including_tail() {
        if !is_available() { return; }
        let codes: Vec<u8> = (0..19u8).map(|i| i.wrapping_mul(37)).collect();
        let mut a = vec![0.25f32; 19];
        let mut b = a.clone();
        unsafe { accumulate_row(&mut a, &codes, 0.125, -2.0) };
        crate::kernel::scalar::accumulate_row(&mut b, &codes, 0.125, -2.0);
        for (x, y) in a.iter().zip(&b) {
            assert!((x - y).abs() <= 1e-5, "{} vs {}", x, y);
        }
    }

    #[test]
    fn constructor_tracks_detection() {
        assert_eq!(Avx2Kernel::new().is_some(), is_available());
    }
}
