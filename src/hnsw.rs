//! HnswEngine: AnnEngine backend over the external `hnsw_rs` library.
//!
//! Rows are staged on `insert` and handed to hnsw_rs at `build`. Snapshots
//! store the header plus raw rows; the graph is rebuilt on load, so the
//! on-disk format stays independent of hnsw_rs internals.

use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Read, Write, self};
use std::path::Path;

use hnsw_rs::prelude::*;
use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::engine::{AnnEngine, EngineConfig, Metric};
use crate::error::{IndexError, Result};
use crate::header::{IndexHeader, FORMAT_VERSION};
use crate::types::{Hit, stable_top_k};

const MAGIC: [u8; 8] = *b"annex01\n";

/// Graph connectivity (M) and layer cap, per hnsw_rs conventions.
const MAX_NB_CONNECTION: usize = 16;
const MAX_LAYER: usize = 16;

#[derive(Serialize, Deserialize)]
struct Snapshot {
    header: IndexHeader,
    rows: Vec<Vec<f32>>,
}

enum Graph {
    Angular(Hnsw<'static, f32, DistCosine>),
    L2(Hnsw<'static, f32, DistL2>),
    Dot(Hnsw<'static, f32, DistDot>),
}

pub struct HnswEngine {
    config: EngineConfig,
    rows: Vec<Vec<f32>>, // row i is item id i
    num_trees: usize,
    graph: Option<Graph>,
}

impl HnswEngine {
    /// Tree count maps onto construction effort: more trees, wider
    /// candidate lists while wiring the graph.
    fn ef_construction(num_trees: usize) -> usize {
        (num_trees * 48).clamp(48, 800)
    }

    fn check_built(&self) -> Result<&Graph> {
        self.graph.as_ref().ok_or(IndexError::NotBuilt)
    }
}

impl AnnEngine for HnswEngine {
    fn create(config: EngineConfig) -> Result<Self> {
        if config.dim == 0 {
            return Err(IndexError::Build("dimension must be positive".into()));
        }
        Ok(Self { config, rows: Vec::new(), num_trees: 0, graph: None })
    }

    fn insert(&mut self, id: usize, vector: &[f32]) -> Result<()> {
        if id != self.rows.len() {
            return Err(IndexError::Build(format!(
                "non-contiguous item id {} (expected {})", id, self.rows.len()
            )));
        }
        if vector.len() != self.config.dim {
            return Err(IndexError::Build(format!(
                "item {}: expected dim {}, got {}", id, self.config.dim, vector.len()
            )));
        }
        let norm_sq: f32 = vector.iter().map(|x| x * x).sum();
        if norm_sq <= 0.0 {
            return Err(IndexError::Build(format!("item {}: zero-norm vector", id)));
        }
        self.rows.push(vector.to_vec());
        Ok(())
    }

    fn build(&mut self, num_trees: usize) -> Result<()> {
        if num_trees == 0 {
            return Err(IndexError::Build("num_trees must be >= 1".into()));
        }
        if self.rows.is_empty() {
            return Err(IndexError::Build("no items staged".into()));
        }
        let ef_c = Self::ef_construction(num_trees);
        let n = self.rows.len();

        let graph = match self.config.metric {
            Metric::Angular => {
                let g = Hnsw::<f32, DistCosine>::new(MAX_NB_CONNECTION, n, MAX_LAYER, ef_c, DistCosine {});
                for (i, row) in self.rows.iter().enumerate() { g.insert_slice((row.as_slice(), i)); }
                Graph::Angular(g)
            }
            Metric::L2 => {
                let g = Hnsw::<f32, DistL2>::new(MAX_NB_CONNECTION, n, MAX_LAYER, ef_c, DistL2 {});
                for (i, row) in self.rows.iter().enumerate() { g.insert_slice((row.as_slice(), i)); }
                Graph::L2(g)
            }
            Metric::Dot => {
                let g = Hnsw::<f32, DistDot>::new(MAX_NB_CONNECTION, n, MAX_LAYER, ef_c, DistDot {});
                for (i, row) in self.rows.iter().enumerate() { g.insert_slice((row.as_slice(), i)); }
                Graph::Dot(g)
            }
        };

        self.num_trees = num_trees;
        self.graph = Some(graph);
        debug!(n, dim = self.config.dim, num_trees, ef_c, "hnsw graph built");
        Ok(())
    }

    fn save(&self, path: &Path) -> Result<()> {
        self.check_built()?;
        let snap = Snapshot {
            header: IndexHeader::new(self.config.dim, self.config.metric, self.num_trees, self.rows.len()),
            rows: self.rows.clone(),
        };
        let mut w = BufWriter::new(File::create(path)?);
        w.write_all(&MAGIC)?;
        bincode::serialize_into(&mut w, &snap)
            .map_err(|e| IndexError::Io(io::Error::new(ErrorKind::Other, e)))?;
        w.flush()?;
        debug!(path = %path.display(), n = snap.header.count, "snapshot written");
        Ok(())
    }

    fn load(config: EngineConfig, path: &Path) -> Result<Self> {
        let mut r = BufReader::new(File::open(path)?);

        let mut magic = [0u8; 8];
        r.read_exact(&mut magic).map_err(|e| match e.kind() {
            ErrorKind::UnexpectedEof => IndexError::Format("file too short for a snapshot".into()),
            _ => IndexError::Io(e),
        })?;
        if magic != MAGIC {
            return Err(IndexError::Format("bad magic, not an annex snapshot".into()));
        }

        let snap: Snapshot = bincode::deserialize_from(&mut r)
            .map_err(|e| IndexError::Format(format!("snapshot decode failed: {}", e)))?;

        if snap.header.version != FORMAT_VERSION {
            return Err(IndexError::Format(format!(
                "unsupported snapshot version {}", snap.header.version
            )));
        }
        if snap.header.dim != config.dim {
            return Err(IndexError::Format(format!(
                "snapshot dim {} does not match configured dim {}", snap.header.dim, config.dim
            )));
        }
        if snap.header.metric != config.metric {
            return Err(IndexError::Format(format!(
                "snapshot metric {:?} does not match configured {:?}", snap.header.metric, config.metric
            )));
        }
        if snap.header.count != snap.rows.len() {
            return Err(IndexError::Format(format!(
                "snapshot claims {} items but carries {}", snap.header.count, snap.rows.len()
            )));
        }

        let mut engine = Self::create(config)?;
        for (i, row) in snap.rows.iter().enumerate() {
            engine.insert(i, row)
                .map_err(|e| IndexError::Format(format!("snapshot row {}: {}", i, e)))?;
        }
        engine.build(snap.header.num_trees)
            .map_err(|e| IndexError::Format(format!("rebuilding loaded snapshot: {}", e)))?;
        debug!(path = %path.display(), n = engine.rows.len(), "snapshot loaded");
        Ok(engine)
    }

    fn query(&self, vector: &[f32], k: usize) -> Result<Vec<Hit>> {
        let graph = self.check_built()?;
        if vector.len() != self.config.dim {
            return Err(IndexError::DimensionMismatch {
                expected: self.config.dim,
                actual: vector.len(),
            });
        }
        if k == 0 {
            return Ok(Vec::new());
        }

        let ef = self.config.search_breadth.max(k);
        let neighbours: Vec<Neighbour> = match graph {
            Graph::Angular(g) => g.search(vector, k, ef),
            Graph::L2(g) => g.search(vector, k, ef),
            Graph::Dot(g) => g.search(vector, k, ef),
        };

        let hits = neighbours
            .into_iter()
            .map(|n| Hit { id: n.d_id, distance: n.distance })
            .collect();
        Ok(stable_top_k(hits, k))
    }

    fn len(&self) -> usize {
        self.rows.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn angular_config(dim: usize) -> EngineConfig {
        EngineConfig { dim, metric: Metric::Angular, search_breadth: 8 }
    }

    fn staged(dim: usize, rows: &[Vec<f32>]) -> HnswEngine {
        let mut e = HnswEngine::create(angular_config(dim)).unwrap();
        for (i, r) in rows.iter().enumerate() { e.insert(i, r).unwrap(); }
        e
    }

    #[test]
    fn insert_rejects_wrong_dimension() {
        let mut e = HnswEngine::create(angular_config(2)).unwrap();
        assert!(matches!(e.insert(0, &[1.0, 0.0, 0.0]), Err(IndexError::Build(_))));
    }

    #[test]
    fn insert_rejects_zero_norm() {
        let mut e = HnswEngine::create(angular_config(2)).unwrap();
        assert!(matches!(e.insert(0, &[0.0, 0.0]), Err(IndexError::Build(_))));
    }

    #[test]
    fn insert_rejects_non_contiguous_ids() {
        let mut e = HnswEngine::create(angular_config(2)).unwrap();
        e.insert(0, &[1.0, 0.0]).unwrap();
        assert!(matches!(e.insert(5, &[0.0, 1.0]), Err(IndexError::Build(_))));
    }

    #[test]
    fn build_requires_trees_and_items() {
        let mut empty = HnswEngine::create(angular_config(2)).unwrap();
        assert!(matches!(empty.build(5), Err(IndexError::Build(_))));

        let mut e = staged(2, &[vec![1.0, 0.0]]);
        assert!(matches!(e.build(0), Err(IndexError::Build(_))));
        e.build(1).unwrap();
    }

    #[test]
    fn save_and_query_need_a_graph() {
        let e = staged(2, &[vec![1.0, 0.0]]);
        assert!(matches!(e.save(Path::new("/tmp/never.ann")), Err(IndexError::NotBuilt)));
        assert!(matches!(e.query(&[1.0, 0.0], 1), Err(IndexError::NotBuilt)));
    }

    #[test]
    fn query_finds_the_nearest_row() {
        let mut e = staged(2, &[vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 1.0]]);
        e.build(5).unwrap();
        let hits = e.query(&[1.0, 0.1], 1).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, 0);
    }

    #[test]
    fn load_rejects_garbage_and_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("garbage.ann");
        std::fs::write(&bad, b"not an index at all").unwrap();
        assert!(matches!(
            HnswEngine::load(angular_config(2), &bad),
            Err(IndexError::Format(_))
        ));
        assert!(matches!(
            HnswEngine::load(angular_config(2), &dir.path().join("missing.ann")),
            Err(IndexError::Io(_))
        ));
    }

    #[test]
    fn load_rejects_mismatched_dimension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dim2.ann");
        let mut e = staged(2, &[vec![1.0, 0.0], vec![0.0, 1.0]]);
        e.build(5).unwrap();
        e.save(&path).unwrap();

        assert!(matches!(
            HnswEngine::load(angular_config(3), &path),
            Err(IndexError::Format(_))
        ));
    }

    #[test]
    fn snapshot_round_trip_preserves_results() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rt.ann");
        let rows = vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![0.7, 0.7], vec![-1.0, 0.2]];
        let mut e = staged(2, &rows);
        e.build(5).unwrap();
        e.save(&path).unwrap();

        let reloaded = HnswEngine::load(angular_config(2), &path).unwrap();
        assert_eq!(reloaded.len(), rows.len());
        for q in &rows {
            let a: Vec<usize> = e.query(q, 2).unwrap().iter().map(|h| h.id).collect();
            let b: Vec<usize> = reloaded.query(q, 2).unwrap().iter().map(|h| h.id).collect();
            assert_eq!(a, b);
        }
    }
}
