//! Fast gather + dequantize + reduce kernels.
//!
//! A kernel walks LENGTHS/INDICES once and writes one reduced row per
//! segment. It reports `false` only for malformed input (negative length,
//! segment overrun, index out of range, or lengths not covering INDICES);
//! the front-end then hands over to the fallback validator for a precise
//! diagnostic.

pub mod avx2;
pub mod scalar;

use crate::config::KernelPreference;
use crate::fused::{scale_bias, FUSED_OVERHEAD};
use crate::index::SegmentIndex;
use log::{info, warn};
use std::sync::OnceLock;

/// Default number of indices to look ahead when prefetching rows.
pub const DEFAULT_PREFETCH_DISTANCE: usize = 16;

/// Everything a kernel needs for one invocation.
#[derive(Debug, Clone, Copy)]
pub struct LookupArgs<'a, I> {
    /// Quantized values per row (= output row width).
    pub block_size: usize,
    /// Number of segments (= output rows).
    pub output_size: usize,
    /// Number of entries in `indices`.
    pub index_size: usize,
    /// Number of rows in the fused table.
    pub data_size: usize,
    pub input: &'a [u8],
    pub indices: &'a [I],
    pub lengths: &'a [i32],
    pub weights: Option<&'a [f32]>,
    pub normalize_by_lengths: bool,
    pub prefetch_distance: usize,
}

/// Capability interface of a fused lookup kernel.
pub trait FastKernel: Send + Sync {
    fn name(&self) -> &'static str;

    /// Computes the whole reduction into `out`, or returns `false` when the
    /// inputs are malformed. `out` has `output_size * block_size` elements.
    fn attempt_fused_lookup<I: SegmentIndex>(&self, args: &LookupArgs<'_, I>, out: &mut [f32]) -> bool;
}

impl<K: FastKernel + ?Sized> FastKernel for &K {
    fn name(&self) -> &'static str { (**self).name() }

    fn attempt_fused_lookup<I: SegmentIndex>(&self, args: &LookupArgs<'_, I>, out: &mut [f32]) -> bool {
        (**self).attempt_fused_lookup(args, out)
    }
}

/// Shared segment walk. `accumulate(out_row, codes, scale, bias)` adds one
/// dequantized row (scale/bias already multiplied by the weight) into `out_row`.
#[inline(always)]
pub(crate) fn reduce_segments<I, F>(args: &LookupArgs<'_, I>, out: &mut [f32], mut accumulate: F) -> bool
where
    I: SegmentIndex,
    F: FnMut(&mut [f32], &[u8], f32, f32),
{
    let block = args.block_size;
    let row_width = block + FUSED_OVERHEAD;
    if block == 0
        || out.len() < args.output_size * block
        || args.lengths.len() < args.output_size
        || args.indices.len() < args.index_size
        || args.input.len() < args.data_size * row_width
    {
        return false;
    }
    if let Some(w) = args.weights {
        if w.len() < args.index_size { return false; }
    }

    let mut current = 0usize;
    for (m, out_row) in out.chunks_exact_mut(block).take(args.output_size).enumerate() {
        out_row.fill(0.0);
        let len = args.lengths[m];
        if len < 0 { return false; }
        let len = len as usize;
        if current + len > args.index_size { return false; }
        for pos in current..current + len {
            let Some(row) = args.indices[pos].to_row(args.data_size) else { return false };
            if args.prefetch_distance > 0 {
                if let Some(ahead) = args.indices.get(pos + args.prefetch_distance).and_then(|i| i.to_row(args.data_size)) {
                    prefetch(&args.input[ahead * row_width..]);
                }
            }
            let fused = &args.input[row * row_width..(row + 1) * row_width];
            let (mut scale, mut bias) = scale_bias(fused);
            if let Some(w) = args.weights {
                scale *= w[pos];
                bias *= w[pos];
            }
            accumulate(out_row, &fused[..block], scale, bias);
        }
        if args.normalize_by_lengths && len > 0 {
            let inv = 1.0 / len as f32;
            for v in out_row.iter_mut() { *v *= inv; }
        }
        current += len;
    }
    current == args.index_size
}

#[inline(always)]
fn prefetch(row: &[u8]) {
    #[cfg(target_arch = "x86_64")]
    unsafe {
        use std::arch::x86_64::{_mm_prefetch, _MM_HINT_T0};
        _mm_prefetch::<_MM_HINT_T0>(row.as_ptr() as *const i8);
    }
    #[cfg(not(target_arch = "x86_64"))]
    let _ = row;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelTier {
    /// x86_64 AVX2 + FMA.
    Avx2,
    /// Portable scalar loop; always available.
    Scalar,
}

impl std::fmt::Display for KernelTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KernelTier::Avx2 => write!(f, "AVX2+FMA"),
            KernelTier::Scalar => write!(f, "Scalar"),
        }
    }
}

static DETECTED_TIER: OnceLock<KernelTier> = OnceLock::new();

/// Best tier for this CPU/build, probed once.
pub fn detected_tier() -> KernelTier {
    *DETECTED_TIER.get_or_init(|| {
        let tier = if avx2::is_available() { KernelTier::Avx2 } else { KernelTier::Scalar };
        info!("fused8 kernel tier: {}", tier);
        tier
    })
}

/// Runtime-dispatched kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Kernel {
    tier: KernelTier,
}

impl Default for Kernel {
    fn default() -> Self { Self::detect() }
}

impl Kernel {
    pub fn detect() -> Self { Self { tier: detected_tier() } }

    pub fn scalar() -> Self { Self { tier: KernelTier::Scalar } }

    pub fn from_preference(pref: KernelPreference) -> Self {
        match pref {
            KernelPreference::Auto => Self::detect(),
            KernelPreference::Scalar => Self::scalar(),
            KernelPreference::Avx2 => {
                if avx2::is_available() {
                    Self { tier: KernelTier::Avx2 }
                } else {
                    warn!("AVX2 kernel requested but unavailable; using scalar");
                    Self::scalar()
                }
            }
        }
    }

    pub fn tier(&self) -> KernelTier { self.tier }
}

impl FastKernel for Kernel {
    fn name(&self) -> &'static str {
        match self.tier {
            KernelTier::Avx2 => avx2::NAME,
            KernelTier::Scalar => scalar::NAME,
        }
    }

    fn attempt_fused_lookup<I: SegmentIndex>(&self, args: &LookupArgs<'_, I>, out: &mut [f32]) -> bool {
        match self.tier {
            KernelTier::Avx2 => match avx2::Avx2Kernel::new() {
                Some(k) => k.attempt_fused_lookup(args, out),
                None => scalar::ScalarKernel.attempt_fused_lookup(args, out),
            },
            KernelTier::Scalar => scalar::ScalarKernel.attempt_fused_lookup(args, out),
        }
    }
}
