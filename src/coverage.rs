//! 点云覆盖率
//!
//! Overlap ratios between point clouds measured on voxel sets. Sizes of the
//! intersections come from inclusion-exclusion over three down samplings
//! (query, reference, their union) instead of an explicit set intersection.

use rayon::prelude::*;

use crate::database::Database;
use crate::error::{Result, VprError};
use crate::point_cloud::PointCloud;
use crate::voxel_grid::VoxelGrid;

/// Voxel counts of two down sampled clouds and of their union.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct VoxelCounts {
    first: usize,
    second: usize,
    union: usize,
}

impl VoxelCounts {
    fn of(first: &PointCloud, second: &PointCloud, grid: &VoxelGrid) -> Self {
        let first = grid.down_sample(first);
        let second = grid.down_sample(second);
        let union = grid.down_sample(&first.merge(&second));
        VoxelCounts {
            first: first.len(),
            second: second.len(),
            union: union.len(),
        }
    }

    #[inline]
    fn intersection(&self) -> usize {
        self.first + self.second - self.union
    }
}

/// Fraction of the voxels of `query` that are also occupied by `db`.
///
/// Returns a value in `[0, 1]`, or [VprError::EmptyQuery] when `query` has
/// no point inside the grid.
pub fn point_cloud_coverage(query: &PointCloud, db: &PointCloud, grid: &VoxelGrid) -> Result<f64> {
    let counts = VoxelCounts::of(query, db, grid);
    if counts.first == 0 {
        return Err(VprError::EmptyQuery);
    }
    Ok(counts.intersection() as f64 / counts.first as f64)
}

/// Intersection over union of the voxel sets of `a` and `b`.
pub fn point_cloud_iou(a: &PointCloud, b: &PointCloud, grid: &VoxelGrid) -> Result<f64> {
    let counts = VoxelCounts::of(a, b, grid);
    if counts.union == 0 {
        return Err(VprError::EmptyUnion);
    }
    Ok(counts.intersection() as f64 / counts.union as f64)
}

/// For every frame of `source`, index of the `target` frame that covers it
/// best. The first maximum wins.
pub fn match_two_databases(
    source: &Database,
    target: &Database,
    grid: &VoxelGrid,
) -> Result<Vec<usize>> {
    if target.is_empty() {
        return Err(VprError::EmptyDatabase);
    }
    let targets = load_down_sampled(target, grid)?;
    (0..source.len())
        .into_par_iter()
        .map(|i| {
            let query = grid.down_sample(&source.transformed_point_cloud(i)?);
            let mut best = (0, f64::NEG_INFINITY);
            for (j, candidate) in targets.iter().enumerate() {
                let coverage = point_cloud_coverage(&query, candidate, grid)?;
                if coverage > best.1 {
                    best = (j, coverage);
                }
            }
            Ok(best.0)
        })
        .collect()
}

/// Loads every frame of `db` in scene coordinates, down sampled once so the
/// hot loops of the metrics do not decode or resample them again.
pub(crate) fn load_down_sampled(db: &Database, grid: &VoxelGrid) -> Result<Vec<PointCloud>> {
    (0..db.len())
        .into_par_iter()
        .map(|i| Ok(grid.down_sample(&db.transformed_point_cloud(i)?)))
        .collect()
}
