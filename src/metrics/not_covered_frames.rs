use rayon::prelude::*;

use super::ReductionMetric;
use crate::config::DOWN_SAMPLE_STEP;
use crate::coverage::point_cloud_coverage;
use crate::database::Database;
use crate::error::{Result, VprError};
use crate::voxel_grid::VoxelGrid;

/// 未被覆盖的帧数
///
/// Counts the original frames that were dropped by the reduction and whose
/// coverage by the reduced scene map is below `threshold`.
pub fn not_covered_frames(
    original: &Database,
    reduced: &Database,
    grid: &VoxelGrid,
    threshold: f64,
) -> Result<usize> {
    let reduced_map = reduced.build_sparse_map(grid, DOWN_SAMPLE_STEP)?;
    let flags: Vec<bool> = (0..original.len())
        .into_par_iter()
        .map(|i| {
            if reduced.contains_point_cloud(&original.point_clouds()[i]) {
                return Ok(false);
            }
            let query = original.transformed_point_cloud(i)?;
            Ok(point_cloud_coverage(&query, &reduced_map, grid)? < threshold)
        })
        .collect::<Result<_>>()?;
    Ok(flags.into_iter().filter(|&flag| flag).count())
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NotCoveredFrames {
    threshold: f64,
    voxel_size: f64,
}

impl NotCoveredFrames {
    pub fn new(threshold: f64, voxel_size: f64) -> Result<Self> {
        Ok(Self {
            threshold: VprError::check_finite("threshold", threshold)?,
            voxel_size: VprError::check_positive("voxel size", voxel_size)?,
        })
    }
}

impl ReductionMetric for NotCoveredFrames {
    type Output = usize;

    fn evaluate(&self, original: &Database, reduced: &Database) -> Result<usize> {
        let grid = VoxelGrid::from_bounds(&original.bounds()?, self.voxel_size)?;
        not_covered_frames(original, reduced, &grid, self.threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reduction_methods::{ReductionMethod, SetCover};
    use crate::test_data;

    #[test]
    fn test_not_covered_frames() {
        let db = test_data::overlap_scene();
        let reduced = db.select(&[0, 2, 4]).unwrap();
        let count = |t: f64| NotCoveredFrames::new(t, 1.0).unwrap().evaluate(&db, &reduced).unwrap();
        assert_eq!(count(0.0), 0);
        assert_eq!(count(0.5), 1);
        assert_eq!(count(0.9), 2);
    }

    #[test]
    fn test_ordering_with_set_cover() {
        let db = test_data::segment_database(&[(0.0, 10), (3.0, 10), (8.0, 10), (12.0, 6), (15.0, 10)]);
        let reduced: Vec<Database> = (1..=db.len())
            .map(|n| SetCover::new(1.0, Some(n)).unwrap().reduce(&db).unwrap())
            .collect();
        for t in [0.1, 0.3, 0.5, 0.7, 0.9] {
            let metric = NotCoveredFrames::new(t, 1.0).unwrap();
            let counts: Vec<usize> = reduced
                .iter()
                .map(|r| metric.evaluate(&db, r).unwrap())
                .collect();
            // 帧越多, 未覆盖的越少
            assert!(counts.windows(2).all(|w| w[0] >= w[1]), "{t}: {counts:?}");
            assert_eq!(*counts.last().unwrap(), 0);
        }
        for r in &reduced {
            assert_eq!(NotCoveredFrames::new(0.0, 1.0).unwrap().evaluate(&db, r).unwrap(), 0);
        }
    }
}
