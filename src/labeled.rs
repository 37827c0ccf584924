//! LabeledIndex: one external ANN engine bound to a fixed vector/label set.

use std::path::Path;

use tracing::{debug, warn};

use crate::engine::{AnnEngine, EngineConfig, Metric};
use crate::error::{IndexError, Result};
use crate::hnsw::HnswEngine;

pub const DEFAULT_TREES: usize = 5;
pub const DEFAULT_K: usize = 10;
pub const DEFAULT_SEARCH_BREADTH: usize = 8;

/// Facade over an external ANN engine. Vectors and labels are copied at
/// construction and immutable afterwards; the engine handle is created by
/// `build` or `load` and replaced wholesale on rebuild/reload.
///
/// Not thread-safe by contract: callers serialize access externally.
pub struct LabeledIndex<L, E: AnnEngine = HnswEngine> {
    dim: usize,
    vecs: Vec<f32>, // concatenated rows of length `dim`
    labels: Vec<L>,
    search_breadth: usize,
    engine: Option<E>,
}

impl<L, E: AnnEngine> LabeledIndex<L, E> {
    /// Copies `vectors` (as f32 rows) and `labels`. Fails with
    /// `InvalidInput` on an empty set, a length mismatch, or ragged rows.
    pub fn new(vectors: Vec<Vec<f32>>, labels: Vec<L>) -> Result<Self> {
        if vectors.is_empty() {
            return Err(IndexError::InvalidInput("vector set is empty".into()));
        }
        if vectors.len() != labels.len() {
            return Err(IndexError::InvalidInput(format!(
                "{} vectors but {} labels", vectors.len(), labels.len()
            )));
        }
        let dim = vectors[0].len();
        if dim == 0 {
            return Err(IndexError::InvalidInput("vectors have zero dimension".into()));
        }
        let mut vecs = Vec::with_capacity(vectors.len() * dim);
        for (i, v) in vectors.iter().enumerate() {
            if v.len() != dim {
                return Err(IndexError::InvalidInput(format!(
                    "row {} has dim {}, expected {}", i, v.len(), dim
                )));
            }
            vecs.extend_from_slice(v);
        }
        Ok(Self { dim, vecs, labels, search_breadth: DEFAULT_SEARCH_BREADTH, engine: None })
    }

    /// Override the recall/speed knob before the first `build`/`load`.
    /// It stays fixed for the life of the handle; there is no per-query
    /// override.
    pub fn with_search_breadth(mut self, search_breadth: usize) -> Self {
        self.search_breadth = search_breadth;
        self
    }

    pub fn len(&self) -> usize { self.labels.len() }
    pub fn is_empty(&self) -> bool { self.labels.is_empty() }
    pub fn dim(&self) -> usize { self.dim }
    pub fn is_built(&self) -> bool { self.engine.is_some() }

    #[inline]
    fn row(&self, i: usize) -> &[f32] {
        let start = i * self.dim;
        &self.vecs[start..start + self.dim]
    }

    fn config(&self) -> EngineConfig {
        EngineConfig { dim: self.dim, metric: Metric::Angular, search_breadth: self.search_breadth }
    }

    /// Index every row (keyed 0..N-1) into a fresh engine and build it with
    /// `num_trees` trees. The new handle is installed only on success, so a
    /// failed build leaves any previous handle working.
    pub fn build(&mut self, num_trees: usize) -> Result<()> {
        let mut engine = E::create(self.config())?;
        for i in 0..self.labels.len() {
            engine.insert(i, self.row(i))?;
        }
        engine.build(num_trees)?;
        debug!(n = self.labels.len(), dim = self.dim, num_trees, "index built");
        self.engine = Some(engine);
        Ok(())
    }

    /// Serialize the engine's index to `path`. `NotBuilt` without a handle.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let engine = self.engine.as_ref().ok_or(IndexError::NotBuilt)?;
        engine.save(path.as_ref())
    }

    /// Open a previously saved index for this facade's dimension and label
    /// count. The handle is only installed once fully validated; on error
    /// any previous handle stays in place.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let engine = E::load(self.config(), path.as_ref())?;
        if engine.len() != self.labels.len() {
            return Err(IndexError::Format(format!(
                "index holds {} items but facade has {} labels",
                engine.len(), self.labels.len()
            )));
        }
        debug!(n = self.labels.len(), dim = self.dim, "index loaded");
        self.engine = Some(engine);
        Ok(())
    }

    /// Approximately the `k` nearest labels to `vector`, nearest first.
    /// Returns `min(k, N)` labels; `NotBuilt` without a handle,
    /// `DimensionMismatch` when `vector.len() != dim`.
    pub fn query(&self, vector: &[f32], k: usize) -> Result<Vec<L>>
    where
        L: Clone,
    {
        let engine = self.engine.as_ref().ok_or(IndexError::NotBuilt)?;
        if vector.len() != self.dim {
            return Err(IndexError::DimensionMismatch { expected: self.dim, actual: vector.len() });
        }
        let hits = engine.query(vector, k.min(self.labels.len()))?;
        Ok(hits
            .into_iter()
            .filter_map(|h| {
                let label = self.labels.get(h.id).cloned();
                if label.is_none() {
                    warn!(id = h.id, "engine returned an id with no label, skipping");
                }
                label
            })
            .collect())
    }
}
