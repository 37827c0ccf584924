use std::path::Path;

use serde::{Serialize, Deserialize};

use crate::error::Result;
use crate::types::Hit;

/// Distance metric the engine is configured with. The facade always uses
/// `Angular` (cosine-derived); the others exist for engine reuse.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Metric { Angular, L2, Dot }

/// Engine configuration fixed at construction time.
///
/// `search_breadth` is the knob trading recall for speed on every query;
/// it is not overridable per query.
#[derive(Clone, Copy, Debug)]
pub struct EngineConfig {
    pub dim: usize,
    pub metric: Metric,
    pub search_breadth: usize,
}

/// Capability interface of an external ANN engine.
///
/// Items are keyed by positional id (0..N-1). `insert` only stages rows;
/// `build` performs the actual construction. `load` must either return a
/// fully valid engine or an error, never a partial one.
pub trait AnnEngine: Sized {
    fn create(config: EngineConfig) -> Result<Self>;
    fn insert(&mut self, id: usize, vector: &[f32]) -> Result<()>;
    fn build(&mut self, num_trees: usize) -> Result<()>;
    fn save(&self, path: &Path) -> Result<()>;
    fn load(config: EngineConfig, path: &Path) -> Result<Self>;
    /// Up to `k` nearest items, nearest first.
    fn query(&self, vector: &[f32], k: usize) -> Result<Vec<Hit>>;
    fn len(&self) -> usize;
}
