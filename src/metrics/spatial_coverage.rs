use super::ReductionMetric;
use crate::config::{DEFAULT_VOXEL_SIZE, DOWN_SAMPLE_STEP};
use crate::database::Database;
use crate::error::{Result, VprError};
use crate::voxel_grid::VoxelGrid;

/// Share of the original scene map still present in the reduced map.
///
/// Both maps are built on `grid`, which must come from the bounds of
/// `original` so the voxels line up.
pub fn spatial_coverage(
    original: &Database,
    reduced: &Database,
    grid: &VoxelGrid,
    down_sample_step: usize,
) -> Result<f64> {
    let original_map = original.build_sparse_map(grid, down_sample_step)?;
    if original_map.is_empty() {
        return Err(VprError::EmptyScene);
    }
    let reduced_map = reduced.build_sparse_map(grid, down_sample_step)?;
    log::debug!(
        "spatial coverage: {} of {} map points",
        reduced_map.len(),
        original_map.len()
    );
    Ok(reduced_map.len() as f64 / original_map.len() as f64)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialCoverage {
    voxel_size: f64,
    down_sample_step: usize,
}

impl SpatialCoverage {
    pub fn new(voxel_size: f64, down_sample_step: usize) -> Result<Self> {
        if down_sample_step == 0 {
            return Err(VprError::invalid_config("down sample step must be at least 1"));
        }
        Ok(Self {
            voxel_size: VprError::check_positive("voxel size", voxel_size)?,
            down_sample_step,
        })
    }
}

impl Default for SpatialCoverage {
    fn default() -> Self {
        Self {
            voxel_size: DEFAULT_VOXEL_SIZE,
            down_sample_step: DOWN_SAMPLE_STEP,
        }
    }
}

impl ReductionMetric for SpatialCoverage {
    type Output = f64;

    fn evaluate(&self, original: &Database, reduced: &Database) -> Result<f64> {
        let grid = VoxelGrid::from_bounds(&original.bounds()?, self.voxel_size)?;
        spatial_coverage(original, reduced, &grid, self.down_sample_step)
    }
}
