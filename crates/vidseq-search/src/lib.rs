//! # vidseq-search
//!
//! Query-side core of vidseq: the gap-tolerant sequence assembler and the
//! pipeline that turns a free-text query into ranked, timestamped
//! sequences.

pub mod assembler;
pub mod pipeline;

pub use assembler::assemble_sequences;
pub use pipeline::SearchPipeline;
