//! Memory selection and context compression
//!
//! [`RelevanceScorer`] picks the records that matter for a file;
//! [`ContextCompressor`] renders them into a bounded context bundle.

pub mod compressor;
pub mod scorer;

pub use compressor::{
    contains_context, estimate_tokens, strip_context, ContextBundle, ContextCompressor,
    CONTEXT_FOOTER, CONTEXT_HEADER,
};
pub use scorer::{RelevanceScorer, ScoredMemory, Signal, SignalKind};
