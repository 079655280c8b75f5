//! 贪心集合覆盖
//!
//! Frames are sets of voxels; the greedy heuristic repeatedly takes the frame
//! covering the most still uncovered voxels. The result is within a
//! logarithmic factor of the minimum cover.

use std::cmp::Reverse;
use std::sync::Arc;

use ndarray::Array1;
use rayon::prelude::*;

use super::ReductionMethod;
use crate::cache::CoverageMatrixCache;
use crate::config::SET_COVER_VOXEL_SIZE;
use crate::coverage_matrix::CoverageMatrix;
use crate::database::Database;
use crate::error::{Result, VprError};
use crate::voxel_grid::VoxelGrid;

#[derive(Debug, Clone)]
pub struct SetCover {
    /// 目标帧数, `None` 表示直到全部覆盖
    resulting_amount_of_frames: Option<usize>,
    voxel_size: f64,
    cache: Option<Arc<CoverageMatrixCache>>,
}

/// Outcome of the greedy loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GreedyCover {
    /// Frame indices in the order they were picked.
    pub selected: Vec<usize>,
    /// Uncovered voxel count after each pick, non-increasing.
    pub uncovered_history: Vec<usize>,
}

impl SetCover {
    pub fn new(voxel_size: f64, resulting_amount_of_frames: Option<usize>) -> Result<Self> {
        let voxel_size = VprError::check_positive("voxel size", voxel_size)?;
        if resulting_amount_of_frames == Some(0) {
            return Err(VprError::invalid_config(
                "resulting amount of frames must be at least 1",
            ));
        }
        Ok(Self {
            resulting_amount_of_frames,
            voxel_size,
            cache: None,
        })
    }

    pub fn with_cache(mut self, cache: Arc<CoverageMatrixCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn voxel_size(&self) -> f64 {
        self.voxel_size
    }

    /// Runs at most `budget` greedy iterations over `matrix`.
    ///
    /// Ties go to the smallest frame index. Stops early once every voxel is
    /// covered.
    pub fn select_frames(matrix: &CoverageMatrix, budget: usize) -> GreedyCover {
        let columns = matrix.columns();
        let mut not_covered = Array1::from_elem(matrix.num_voxels(), true);
        let mut uncovered = matrix.num_voxels();
        // gains[f] = 帧 f 还能新覆盖的体素数
        let mut gains: Vec<usize> = matrix.rows().iter().map(Vec::len).collect();
        let mut taken = vec![false; matrix.num_frames()];
        let mut cover = GreedyCover {
            selected: Vec::new(),
            uncovered_history: Vec::new(),
        };

        for _ in 0..budget {
            if uncovered == 0 {
                break;
            }
            let best = gains
                .par_iter()
                .enumerate()
                .filter(|(frame, _)| !taken[*frame])
                .map(|(frame, &gain)| (gain, Reverse(frame)))
                .max();
            let Some((gain, Reverse(frame))) = best else {
                break;
            };
            if gain == 0 {
                break;
            }
            taken[frame] = true;
            for &voxel in matrix.row(frame) {
                if !not_covered[voxel] {
                    continue;
                }
                not_covered[voxel] = false;
                uncovered -= 1;
                for &other in &columns[voxel] {
                    gains[other] -= 1;
                }
            }
            log::debug!("set cover: frame {frame} covers {gain} voxels, {uncovered} left");
            cover.selected.push(frame);
            cover.uncovered_history.push(uncovered);
        }
        cover
    }
}

impl ReductionMethod for SetCover {
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
        let budget = self
            .resulting_amount_of_frames
            .map_or(db.len(), |n| n.min(db.len()));
        let mut selected = Self::select_frames(&matrix, budget).selected;
        selected.sort_unstable();
        log::info!(
            "set cover (voxel size {}, budget {}): {} -> {} frames",
            self.voxel_size,
            budget,
            db.len(),
            selected.len()
        );
        db.select(&selected)
    }
}

impl Default for SetCover {
    fn default() -> Self {
        Self {
            resulting_amount_of_frames: None,
            voxel_size: SET_COVER_VOXEL_SIZE,
            cache: None,
        }
    }
}
