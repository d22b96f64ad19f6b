use crate::kernel::DEFAULT_PREFETCH_DISTANCE;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// What the operator does after the fast kernel declines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FallbackPolicy {
    /// Validate; if nothing is wrong, recompute with the scalar kernel.
    #[default]
    Recompute,
    /// Validate only; a clean scan leaves the output as the kernel wrote it.
    ValidateOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KernelPreference {
    #[default]
    Auto,
    Scalar,
    Avx2,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupConfig {
    /// Indices to look ahead when prefetching table rows (0 disables).
    pub prefetch_distance: usize,
    pub fallback: FallbackPolicy,
    pub kernel: KernelPreference,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            prefetch_distance: DEFAULT_PREFETCH_DISTANCE,
            fallback: FallbackPolicy::default(),
            kernel: KernelPreference::default(),
        }
    }
}

impl LookupConfig {
    pub fn from_json_str(s: &str) -> Result<Self> {
        serde_json::from_str(s).context("parse lookup config")
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("read lookup config: {}", path.as_ref().display()))?;
        Self::from_json_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let c = LookupConfig::from_json_str(r#"{"fallback": "validate-only"}"#).unwrap();
        assert_eq!(c.fallback, FallbackPolicy::ValidateOnly);
        assert_eq!(c.prefetch_distance, 16);
        assert_eq!(c.kernel, KernelPreference::Auto);
    }

    #[test]
    fn unknown_policy_is_rejected() {
        assert!(LookupConfig::from_json_str(r#"{"fallback": "retry"}"#).is_err());
    }
}
