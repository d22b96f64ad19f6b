//! Portable scalar kernel; the reference the SIMD tier is checked against.
use super::{reduce_segments, FastKernel, LookupArgs};
use crate::index::SegmentIndex;

pub const NAME: &str = "scalar";

#[inline(always)]
pub(crate) fn accumulate_row(out: &mut [f32], codes: &[u8], scale: f32, bias: f32) {
    for (o, &q) in out.iter_mut().zip(codes) {
        *o += scale * q as f32 + bias;
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ScalarKernel;

impl FastKernel for ScalarKernel {
    fn name(&self) -> &'static str { NAME }

    fn attempt_fused_lookup<I: SegmentIndex>(&self, args: &LookupArgs<'_, I>, out: &mut [f32]) -> bool {
        reduce_segments(args, out, accumulate_row)
    }
}
