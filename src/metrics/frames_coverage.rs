use rayon::prelude::*;

use super::ReductionMetric;
use crate::config::DEFAULT_VOXEL_SIZE;
use crate::coverage::{load_down_sampled, point_cloud_coverage};
use crate::database::Database;
use crate::error::{Result, VprError};
use crate::voxel_grid::VoxelGrid;

/// 每个原始帧被压缩数据库覆盖的最好程度
///
/// Entry `i` is the largest coverage of original frame `i` by any single
/// reduced frame. Frames are evaluated in parallel; the output keeps the
/// original order.
pub fn frames_coverage(original: &Database, reduced: &Database, grid: &VoxelGrid) -> Result<Vec<f64>> {
    if reduced.is_empty() {
        return Err(VprError::EmptyDatabase);
    }
    let reduced_clouds = load_down_sampled(reduced, grid)?;
    (0..original.len())
        .into_par_iter()
        .map(|i| {
            let query = grid.down_sample(&original.transformed_point_cloud(i)?);
            let mut best = 0.0_f64;
            for candidate in &reduced_clouds {
                best = best.max(point_cloud_coverage(&query, candidate, grid)?);
            }
            Ok(best)
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FramesCoverage {
    voxel_size: f64,
}

impl FramesCoverage {
    pub fn new(voxel_size: f64) -> Result<Self> {
        Ok(Self {
            voxel_size: VprError::check_positive("voxel size", voxel_size)?,
        })
    }
}

impl Default for FramesCoverage {
    fn default() -> Self {
        Self {
            voxel_size: DEFAULT_VOXEL_SIZE,
        }
    }
}

impl ReductionMetric for FramesCoverage {
    type Output = Vec<f64>;

    fn evaluate(&self, original: &Database, reduced: &Database) -> Result<Vec<f64>> {
        let grid = VoxelGrid::from_bounds(&original.bounds()?, self.voxel_size)?;
        frames_coverage(original, reduced, &grid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_data;

    #[test]
    fn test_self_coverage() {
        let db = test_data::overlap_scene();
        let values = FramesCoverage::new(1.0).unwrap().evaluate(&db, &db).unwrap();
        assert_eq!(values, vec![1.0; db.len()]);
    }

    #[test]
    fn test_reduced_coverage() {
        let db = test_data::overlap_scene();
        let reduced = db.select(&[0, 2, 4]).unwrap();
        let values = FramesCoverage::new(1.0).unwrap().evaluate(&db, &reduced).unwrap();
        let expected = [1.0, 0.8, 1.0, 0.3, 1.0];
        assert_eq!(values.len(), expected.len());
        for (v, e) in values.iter().zip(expected) {
            assert!((v - e).abs() < 1e-12, "{values:?}");
        }
    }

    #[test]
    fn test_empty_reduced() {
        let db = test_data::overlap_scene();
        let empty = db.select(&[]).unwrap();
        assert!(matches!(
            FramesCoverage::default().evaluate(&db, &empty),
            Err(VprError::EmptyDatabase)
        ));
    }
}
