//! 场景地图构建
//!
//! Folds every frame, moved into scene coordinates, into one running map
//! and voxel down samples the map periodically to bound memory.

use crate::error::{Result, VprError};
use crate::global_types::Pose;
use crate::point_cloud::PointCloud;
use crate::providers::PointCloudProvider;
use crate::voxel_grid::VoxelGrid;

/// Builds the down sampled map of a trajectory.
///
/// The running map is down sampled after every frame whose index is a
/// multiple of `down_sample_step`, and once more at the end, so the result
/// holds exactly one point per voxel occupied by the scene.
pub fn build_sparse_map(
    trajectory: &[Pose],
    point_clouds: &[PointCloudProvider],
    grid: &VoxelGrid,
    down_sample_step: usize,
) -> Result<PointCloud> {
    if down_sample_step == 0 {
        return Err(VprError::invalid_config("down_sample_step must be positive"));
    }
    if trajectory.len() != point_clouds.len() {
        return Err(VprError::ShapeMismatch {
            what: "point clouds",
            expected: trajectory.len(),
            actual: point_clouds.len(),
        });
    }
    let mut map = PointCloud::new();
    for (i, (pose, provider)) in trajectory.iter().zip(point_clouds).enumerate() {
        let mut cloud = provider.load()?;
        cloud.transform_mut(pose);
        map.extend_from(&cloud);
        if i % down_sample_step == 0 {
            map = grid.down_sample(&map);
        }
    }
    log::debug!(
        "sparse map of {} frames: {} points before final down sampling",
        trajectory.len(),
        map.len()
    );
    Ok(grid.down_sample(&map))
}
