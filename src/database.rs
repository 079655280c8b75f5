//! 数据库
//!
//! An immutable, index-aligned triple of trajectory, colour images and point
//! clouds. Reductions always produce a new [Database].

use std::sync::OnceLock;

use crate::error::{Result, VprError};
use crate::global_types::{Bounds, Pose};
use crate::map_builder;
use crate::point_cloud::PointCloud;
use crate::providers::{ColorImageProvider, PointCloudProvider};
use crate::voxel_grid::VoxelGrid;

/// One observation of the trajectory.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub pose: Pose,
    pub color_image: ColorImageProvider,
    pub point_cloud: PointCloudProvider,
}

#[derive(Debug, Clone)]
pub struct Database {
    color_images: Vec<ColorImageProvider>,
    point_clouds: Vec<PointCloudProvider>,
    trajectory: Vec<Pose>,
    /// 场景边界, computed on first use
    bounds: OnceLock<Bounds>,
}

impl Database {
    pub fn new(
        color_images: Vec<ColorImageProvider>,
        point_clouds: Vec<PointCloudProvider>,
        trajectory: Vec<Pose>,
    ) -> Result<Self> {
        let len = trajectory.len();
        if color_images.len() != len {
            return Err(VprError::ShapeMismatch {
                what: "color images",
                expected: len,
                actual: color_images.len(),
            });
        }
        if point_clouds.len() != len {
            return Err(VprError::ShapeMismatch {
                what: "point clouds",
                expected: len,
                actual: point_clouds.len(),
            });
        }
        Ok(Self {
            color_images,
            point_clouds,
            trajectory,
            bounds: OnceLock::new(),
        })
    }

    pub fn len(&self) -> usize {
        self.trajectory.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trajectory.is_empty()
    }

    pub fn trajectory(&self) -> &[Pose] {
        &self.trajectory
    }

    pub fn color_images(&self) -> &[ColorImageProvider] {
        &self.color_images
    }

    pub fn point_clouds(&self) -> &[PointCloudProvider] {
        &self.point_clouds
    }

    pub fn frame(&self, index: usize) -> Result<Frame> {
        self.check_index(index)?;
        Ok(Frame {
            pose: self.trajectory[index],
            color_image: self.color_images[index].clone(),
            point_cloud: self.point_clouds[index].clone(),
        })
    }

    /// Loads frame `index` and moves it into scene coordinates.
    pub fn transformed_point_cloud(&self, index: usize) -> Result<PointCloud> {
        self.check_index(index)?;
        let mut cloud = self.point_clouds[index].load()?;
        cloud.transform_mut(&self.trajectory[index]);
        Ok(cloud)
    }

    /// Membership test by point cloud identity.
    pub fn contains_point_cloud(&self, provider: &PointCloudProvider) -> bool {
        self.point_clouds.contains(provider)
    }

    /// Bounds of the whole scene, i.e. of every transformed point cloud.
    pub fn bounds(&self) -> Result<Bounds> {
        if let Some(bounds) = self.bounds.get() {
            return Ok(*bounds);
        }
        let mut scene: Option<Bounds> = None;
        for i in 0..self.len() {
            if let Some(b) = self.transformed_point_cloud(i)?.bounds() {
                scene = Some(match scene {
                    Some(acc) => acc.union(&b),
                    None => b,
                });
            }
        }
        let bounds = scene.ok_or(VprError::EmptyScene)?;
        Ok(*self.bounds.get_or_init(|| bounds))
    }

    /// New database with the frames at `indices`, in the given order.
    pub fn select(&self, indices: &[usize]) -> Result<Database> {
        for &index in indices {
            self.check_index(index)?;
        }
        Database::new(
            indices.iter().map(|&i| self.color_images[i].clone()).collect(),
            indices.iter().map(|&i| self.point_clouds[i].clone()).collect(),
            indices.iter().map(|&i| self.trajectory[i]).collect(),
        )
    }

    /// 构建场景稀疏地图, see [map_builder::build_sparse_map].
    pub fn build_sparse_map(&self, grid: &VoxelGrid, down_sample_step: usize) -> Result<PointCloud> {
        map_builder::build_sparse_map(&self.trajectory, &self.point_clouds, grid, down_sample_step)
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index < self.len() {
            Ok(())
        } else {
            Err(VprError::FrameIndexOutOfRange {
                index,
                len: self.len(),
            })
        }
    }
}

/// Union of the scene bounds of several databases.
pub fn find_bounds_for_multiple_databases(databases: &[&Database]) -> Result<Bounds> {
    let mut result: Option<Bounds> = None;
    for db in databases {
        let b = db.bounds()?;
        result = Some(result.map_or(b, |acc| acc.union(&b)));
    }
    result.ok_or(VprError::EmptyDatabase)
}
