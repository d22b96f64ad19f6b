//! SparseLengths{Sum,Mean,WeightedSum}Fused8BitRowwise front-end.
//!
//! Validates shapes, derives `(segments, row_width - 8)`, runs the fast
//! kernel and, if it declines, runs the fallback validator so the caller
//! gets a localized diagnostic instead of an opaque failure.

use crate::config::{FallbackPolicy, LookupConfig};
use crate::error::{LookupError, Result};
use crate::fallback::validate_segments;
use crate::fused::{block_size, FUSED_OVERHEAD};
use crate::index::{Indices, SegmentIndex};
use crate::kernel::scalar::ScalarKernel;
use crate::kernel::{FastKernel, Kernel, LookupArgs};
use crate::tensor::Tensor;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReductionMode {
    Sum,
    /// Sum divided by the segment length; empty segments give zero rows.
    Mean,
    /// Each row scaled by the WEIGHTS entry aligned with its index.
    WeightedSum,
}

impl ReductionMode {
    pub fn from_flags(with_weights: bool, is_mean: bool) -> Result<Self> {
        match (with_weights, is_mean) {
            (true, true) => Err(LookupError::ConflictingModes),
            (true, false) => Ok(ReductionMode::WeightedSum),
            (false, true) => Ok(ReductionMode::Mean),
            (false, false) => Ok(ReductionMode::Sum),
        }
    }

    pub fn with_weights(self) -> bool { self == ReductionMode::WeightedSum }
    pub fn is_mean(self) -> bool { self == ReductionMode::Mean }

    pub fn operator_name(self) -> &'static str {
        match self {
            ReductionMode::Sum => "SparseLengthsSumFused8BitRowwise",
            ReductionMode::Mean => "SparseLengthsMeanFused8BitRowwise",
            ReductionMode::WeightedSum => "SparseLengthsWeightedSumFused8BitRowwise",
        }
    }

    pub fn slots(self) -> InputSlots {
        let w = self.with_weights() as usize;
        InputSlots {
            data: 0,
            weights: if self.with_weights() { Some(1) } else { None },
            indices: 1 + w,
            lengths: 2 + w,
        }
    }
}

impl FromStr for ReductionMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sum" => Ok(ReductionMode::Sum),
            "mean" => Ok(ReductionMode::Mean),
            "weighted-sum" | "weighted" => Ok(ReductionMode::WeightedSum),
            other => Err(format!("unknown reduction mode '{}': use sum, mean or weighted-sum", other)),
        }
    }
}

/// Positional slot layout: DATA, [WEIGHTS], INDICES, LENGTHS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputSlots {
    pub data: usize,
    pub weights: Option<usize>,
    pub indices: usize,
    pub lengths: usize,
}

/// Runtime-typed tensor handed over by a graph executor.
#[derive(Debug, Clone)]
pub enum Blob {
    U8(Tensor<u8>),
    F32(Tensor<f32>),
    I32(Tensor<i32>),
    I64(Tensor<i64>),
}

impl Blob {
    pub fn type_name(&self) -> &'static str {
        match self {
            Blob::U8(_) => "uint8",
            Blob::F32(_) => "float",
            Blob::I32(_) => "int32",
            Blob::I64(_) => "int64",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LookupInputs<'a> {
    pub data: &'a Tensor<u8>,
    pub indices: Indices<'a>,
    pub lengths: &'a Tensor<i32>,
    pub weights: Option<&'a Tensor<f32>>,
}

impl<'a> LookupInputs<'a> {
    pub fn new(data: &'a Tensor<u8>, indices: impl Into<Indices<'a>>, lengths: &'a Tensor<i32>) -> Self {
        Self { data, indices: indices.into(), lengths, weights: None }
    }

    pub fn with_weights(mut self, weights: &'a Tensor<f32>) -> Self {
        self.weights = Some(weights);
        self
    }
}

pub struct SparseLengthsFused8BitRowwise<K: FastKernel = Kernel> {
    mode: ReductionMode,
    config: LookupConfig,
    kernel: K,
}

impl SparseLengthsFused8BitRowwise<Kernel> {
    pub fn new(mode: ReductionMode) -> Self { Self::with_config(mode, LookupConfig::default()) }

    pub fn from_flags(with_weights: bool, is_mean: bool) -> Result<Self> {
        Ok(Self::new(ReductionMode::from_flags(with_weights, is_mean)?))
    }

    pub fn with_config(mode: ReductionMode, config: LookupConfig) -> Self {
        let kernel = Kernel::from_preference(config.kernel);
        Self { mode, config, kernel }
    }
}

impl<K: FastKernel> SparseLengthsFused8BitRowwise<K> {
    pub fn with_kernel(mode: ReductionMode, config: LookupConfig, kernel: K) -> Self {
        Self { mode, config, kernel }
    }

    pub fn mode(&self) -> ReductionMode { self.mode }
    pub fn config(&self) -> &LookupConfig { &self.config }
    pub fn kernel(&self) -> &K { &self.kernel }

    /// Validates ranks and widths and returns the output shape `[segments, block]`.
    pub fn output_shape(&self, inputs: &LookupInputs<'_>) -> Result<[usize; 2]> {
        if inputs.indices.dim() != 1 {
            return Err(LookupError::IndicesRank { rank: inputs.indices.dim() });
        }
        if inputs.lengths.dim() != 1 {
            return Err(LookupError::LengthsRank { rank: inputs.lengths.dim() });
        }
        if self.mode.with_weights() {
            let slot = self.mode.slots().weights.unwrap_or(1);
            let w = inputs.weights.ok_or(LookupError::MissingInput { slot, name: "WEIGHTS" })?;
            if w.dim() != 1 {
                return Err(LookupError::WeightsRank { rank: w.dim() });
            }
            if w.numel() != inputs.indices.numel() {
                return Err(LookupError::WeightsLength { weights: w.numel(), indices: inputs.indices.numel() });
            }
        }
        if inputs.data.dim() != 2 {
            return Err(LookupError::DataRank { rank: inputs.data.dim() });
        }
        if inputs.data.size(1) <= FUSED_OVERHEAD {
            return Err(LookupError::DataWidth { columns: inputs.data.size(1) });
        }
        Ok([inputs.lengths.size(0), block_size(inputs.data.size(1))])
    }

    pub fn run(&self, inputs: &LookupInputs<'_>) -> Result<Tensor<f32>> {
        let shape = self.output_shape(inputs)?;
        let weights = if self.mode.with_weights() { inputs.weights.map(|w| w.data()) } else { None };
        match inputs.indices {
            Indices::I32(t) => self.run_typed(inputs.data, t.data(), inputs.lengths.data(), weights, shape),
            Indices::I64(t) => self.run_typed(inputs.data, t.data(), inputs.lengths.data(), weights, shape),
        }
    }

    /// Runs against inputs laid out by `ReductionMode::slots`.
    pub fn run_positional(&self, blobs: &[Blob]) -> Result<Tensor<f32>> {
        let slots = self.mode.slots();
        let get = |slot: usize, name: &'static str| blobs.get(slot).ok_or(LookupError::MissingInput { slot, name });
        let wrong = |slot: usize, name: &'static str, expected: &'static str, found: &Blob| LookupError::InputType {
            slot,
            name,
            expected,
            found: found.type_name(),
        };

        let data = match get(slots.data, "DATA")? {
            Blob::U8(t) => t,
            other => return Err(wrong(slots.data, "DATA", "uint8", other)),
        };
        let indices = match get(slots.indices, "INDICES")? {
            Blob::I32(t) => Indices::I32(t),
            Blob::I64(t) => Indices::I64(t),
            other => return Err(wrong(slots.indices, "INDICES", "int32 or int64", other)),
        };
        let lengths = match get(slots.lengths, "LENGTHS")? {
            Blob::I32(t) => t,
            other => return Err(wrong(slots.lengths, "LENGTHS", "int32", other)),
        };
        let weights = match slots.weights {
            Some(slot) => match get(slot, "WEIGHTS")? {
                Blob::F32(t) => Some(t),
                other => return Err(wrong(slot, "WEIGHTS", "float", other)),
            },
            None => None,
        };
        self.run(&LookupInputs { data, indices, lengths, weights })
    }

    fn run_typed<I: SegmentIndex>(
        &self,
        data: &Tensor<u8>,
        indices: &[I],
        lengths: &[i32],
        weights: Option<&[f32]>,
        [output_size, block]: [usize; 2],
    ) -> Result<Tensor<f32>> {
        let mut output = Tensor::zeros(vec![output_size, block]);
        let args = LookupArgs {
            block_size: block,
            output_size,
            index_size: indices.len(),
            data_size: data.size(0),
            input: data.data(),
            indices,
            lengths,
            weights,
            normalize_by_lengths: self.mode.is_mean(),
            prefetch_distance: self.config.prefetch_distance,
        };
        debug!(
            "{}<{}>: {} segments, {} indices, {} rows x {} cols via {}",
            self.mode.operator_name(),
            I::KIND.name(),
            output_size,
            args.index_size,
            args.data_size,
            block,
            self.kernel.name()
        );
        if self.kernel.attempt_fused_lookup(&args, output.data_mut()) {
            return Ok(output);
        }

        warn!("{} kernel declined {} lookup; validating inputs", self.kernel.name(), self.mode.operator_name());
        validate_segments(indices, lengths, args.data_size)?;

        match self.config.fallback {
            FallbackPolicy::ValidateOnly => {
                warn!("fallback found no violation; output left as written by {}", self.kernel.name());
                Ok(output)
            }
            FallbackPolicy::Recompute => {
                if ScalarKernel.attempt_fused_lookup(&args, output.data_mut()) {
                    Ok(output)
                } else {
                    Err(LookupError::KernelInconsistency { kernel: self.kernel.name() })
                }
            }
        }
    }
}
