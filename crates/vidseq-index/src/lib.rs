//! # vidseq-index
//!
//! Vector index backends for vidseq, both implementing the
//! `vidseq_core::VectorIndex` capability trait:
//!
//! - [`RemoteVectorIndex`]: a hosted similarity index behind a JSON API.
//! - [`LocalVectorIndex`]: an in-process flat exact-L2 index persisted as
//!   an `index.bin` + `metadata.json` file pair.

pub mod local;
pub mod remote;

pub use local::LocalVectorIndex;
pub use remote::RemoteVectorIndex;
