//! annex — labeled ANN index facade over a pluggable external engine.
//!
//! Modules:
//! - `error`: IndexError + Result alias.
//! - `types`: Hit, deterministic nearest-first ordering.
//! - `engine`: AnnEngine capability trait, Metric, EngineConfig.
//! - `header`: snapshot header persisted with every index file.
//! - `hnsw`: HnswEngine, the hnsw_rs-backed engine.
//! - `labeled`: LabeledIndex (construct / build / save / load / query).

pub mod error;
pub mod types;
pub mod engine;
pub mod header;
pub mod hnsw;
pub mod labeled;

pub use error::{IndexError, Result};
pub use types::Hit;
pub use engine::{AnnEngine, EngineConfig, Metric};
pub use header::IndexHeader;
pub use hnsw::HnswEngine;
pub use labeled::{LabeledIndex, DEFAULT_K, DEFAULT_SEARCH_BREADTH, DEFAULT_TREES};
