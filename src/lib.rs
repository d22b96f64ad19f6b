// Fused 8-bit rowwise sparse embedding lookup + reduce
pub mod config;
pub mod error;
pub mod fallback;
pub mod fused;
pub mod index;
pub mod kernel;
pub mod op;
pub mod table;
pub mod tensor;

// Re-exports for the common call path
pub use config::{FallbackPolicy, KernelPreference, LookupConfig};
pub use error::LookupError;
pub use index::{IndexKind, Indices};
pub use op::{Blob, LookupInputs, ReductionMode, SparseLengthsFused8BitRowwise};
pub use tensor::Tensor;
