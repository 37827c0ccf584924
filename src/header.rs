use serde::{Serialize, Deserialize};

use crate::engine::Metric;

pub const FORMAT_VERSION: u32 = 1;

/// Header written ahead of the row data in every snapshot. Checked on load
/// before any engine state is constructed.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct IndexHeader {
    pub version: u32,
    pub dim: usize,
    pub metric: Metric,
    pub num_trees: usize,
    pub count: usize,
}

impl IndexHeader {
    pub fn new(dim: usize, metric: Metric, num_trees: usize, count: usize) -> Self {
        Self { version: FORMAT_VERSION, dim, metric, num_trees, count }
    }
}
