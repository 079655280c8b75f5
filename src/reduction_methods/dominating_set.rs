//! 支配集压缩
//!
//! Frames are vertices, two frames are adjacent when the IoU of their voxel
//! sets exceeds a threshold. The reduced database is a dominating set of
//! that graph.

use std::collections::HashMap;
use std::sync::Arc;

use super::ReductionMethod;
use crate::cache::CoverageMatrixCache;
use crate::config::{DEFAULT_VOXEL_SIZE, DOMINATING_SET_THRESHOLD};
use crate::coverage_matrix::CoverageMatrix;
use crate::database::Database;
use crate::error::{Result, VprError};
use crate::frame_graph::FrameGraph;
use crate::voxel_grid::VoxelGrid;

#[derive(Debug, Clone)]
pub struct DominatingSet {
    threshold: f64,
    voxel_size: f64,
    cache: Option<Arc<CoverageMatrixCache>>,
}

impl DominatingSet {
    /// A threshold of 0 or below connects every pair of frames, a threshold
    /// of 1 or more leaves the graph without edges.
    pub fn new(threshold: f64, voxel_size: f64) -> Result<Self> {
        Ok(Self {
            threshold: VprError::check_finite("threshold", threshold)?,
            voxel_size: VprError::check_positive("voxel size", voxel_size)?,
            cache: None,
        })
    }

    pub fn with_cache(mut self, cache: Arc<CoverageMatrixCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// 构建帧图
    ///
    /// Pairwise intersections are counted from the voxel columns, so only
    /// pairs sharing at least one voxel are ever visited.
    pub fn build_frame_graph(matrix: &CoverageMatrix, threshold: f64) -> FrameGraph {
        let n = matrix.num_frames();
        let mut graph = FrameGraph::new(n);
        if threshold <= 0.0 {
            for a in 0..n {
                for b in a + 1..n {
                    graph.add_edge(a, b);
                }
            }
            return graph;
        }

        let mut intersections: HashMap<(usize, usize), usize> = HashMap::new();
        for frames in matrix.columns() {
            for (i, &a) in frames.iter().enumerate() {
                for &b in &frames[i + 1..] {
                    *intersections.entry((a, b)).or_insert(0) += 1;
                }
            }
        }
        for ((a, b), inter) in intersections {
            let union = matrix.row(a).len() + matrix.row(b).len() - inter;
            let iou = inter as f64 / union as f64;
            if iou > threshold {
                graph.add_edge(a, b);
            }
        }
        log::debug!(
            "frame graph: {} vertices, {} edges (iou > {})",
            n,
            graph.num_edges(),
            threshold
        );
        graph
    }
}

impl Default for DominatingSet {
    fn default() -> Self {
        Self {
            threshold: DOMINATING_SET_THRESHOLD,
            voxel_size: DEFAULT_VOXEL_SIZE,
            cache: None,
        }
    }
}

impl ReductionMethod for DominatingSet {
    fn reduce(&self, db: &Database) -> Result<Database> {
        if db.is_empty() {
            return Ok(db.clone());
        }
        let grid = VoxelGrid::from_bounds(&db.bounds()?, self.voxel_size)?;
        let matrix = match &self.cache {
            Some(cache) => cache.get_or_build(&grid, db.point_clouds(), db.trajectory())?,
            None => Arc::new(CoverageMatrix::build(
                &grid,
                db.point_clouds(),
                db.trajectory(),
            )?),
        };
        let graph = Self::build_frame_graph(&matrix, self.threshold);
        let selected = graph.greedy_dominating_set();
        log::info!(
            "dominating set (threshold {}, voxel size {}): {} -> {} frames",
            self.threshold,
            self.voxel_size,
            db.len(),
            selected.len()
        );
        db.select(&selected)
    }
}
