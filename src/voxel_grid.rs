//! 体素网格
//!
//! Regular 3-D grid over an axis-aligned box. The voxel index of a point is
//! `floor((p - min_bound) / voxel_size)` componentwise; indices of points
//! outside the box fall outside the nominal range but stay hashable.

use std::collections::{HashMap, HashSet};

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::{Result, VprError};
use crate::global_types::Bounds;
use crate::point_cloud::PointCloud;

pub type VoxelIndex = (i64, i64, i64);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoxelGrid {
    min_bound: Point3<f64>,
    max_bound: Point3<f64>,
    voxel_size: f64,
}

impl VoxelGrid {
    pub fn new(min_bound: Point3<f64>, max_bound: Point3<f64>, voxel_size: f64) -> Result<Self> {
        VprError::check_positive("voxel_size", voxel_size)?;
        for i in 0..3 {
            if !(min_bound[i].is_finite() && max_bound[i].is_finite()) {
                return Err(VprError::invalid_config(format!(
                    "voxel grid bounds must be finite, got {min_bound} .. {max_bound}"
                )));
            }
            if min_bound[i] > max_bound[i] {
                return Err(VprError::invalid_config(format!(
                    "min bound {min_bound} exceeds max bound {max_bound}"
                )));
            }
        }
        Ok(Self {
            min_bound,
            max_bound,
            voxel_size,
        })
    }

    pub fn from_bounds(bounds: &Bounds, voxel_size: f64) -> Result<Self> {
        Self::new(bounds.min, bounds.max, voxel_size)
    }

    pub fn min_bound(&self) -> &Point3<f64> {
        &self.min_bound
    }

    pub fn max_bound(&self) -> &Point3<f64> {
        &self.max_bound
    }

    pub fn voxel_size(&self) -> f64 {
        self.voxel_size
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.min_bound, self.max_bound)
    }

    #[inline]
    pub fn voxel_index(&self, point: &Point3<f64>) -> VoxelIndex {
        let reference = (point - self.min_bound) / self.voxel_size;
        (
            reference.x.floor() as i64,
            reference.y.floor() as i64,
            reference.z.floor() as i64,
        )
    }

    /// Minimum corner of the voxel that contains `point`.
    pub fn voxel_coordinates(&self, point: &Point3<f64>) -> Point3<f64> {
        self.index_to_corner(self.voxel_index(point))
    }

    #[inline]
    pub fn contains(&self, point: &Point3<f64>) -> bool {
        (0..3).all(|i| point[i] >= self.min_bound[i] && point[i] <= self.max_bound[i])
    }

    /// 体素下采样
    ///
    /// Keeps exactly one point per occupied voxel: the input point closest to
    /// the voxel centre (first one wins on ties). Points outside the grid
    /// bounds are dropped. The output is ordered by voxel index, so the
    /// operation is a fixed point: down sampling twice changes nothing.
    pub fn down_sample(&self, cloud: &PointCloud) -> PointCloud {
        let mut best: HashMap<VoxelIndex, (f64, Point3<f64>)> = HashMap::new();
        let half = Vector3::repeat(self.voxel_size / 2.0);
        for p in cloud.points().iter().filter(|p| self.contains(p)) {
            let index = self.voxel_index(p);
            let center = self.index_to_corner(index) + half;
            let dist = (p - center).norm_squared();
            best.entry(index)
                .and_modify(|(d, q)| {
                    if dist < *d {
                        *d = dist;
                        *q = *p;
                    }
                })
                .or_insert((dist, *p));
        }
        let mut voxels: Vec<_> = best.into_iter().collect();
        voxels.sort_unstable_by_key(|(index, _)| *index);
        voxels.into_iter().map(|(_, (_, p))| p).collect()
    }

    /// Set of voxels occupied by the in-bound points of `cloud`.
    pub fn occupied_voxels(&self, cloud: &PointCloud) -> HashSet<VoxelIndex> {
        cloud
            .points()
            .iter()
            .filter(|p| self.contains(p))
            .map(|p| self.voxel_index(p))
            .collect()
    }

    #[inline]
    fn index_to_corner(&self, (i, j, k): VoxelIndex) -> Point3<f64> {
        self.min_bound + Vector3::new(i as f64, j as f64, k as f64) * self.voxel_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_grid() -> VoxelGrid {
        VoxelGrid::new(Point3::origin(), Point3::new(10.0, 10.0, 10.0), 1.0).unwrap()
    }

    #[test]
    fn test_invalid_configuration() {
        let min = Point3::origin();
        let max = Point3::new(1.0, 1.0, 1.0);
        assert!(matches!(
            VoxelGrid::new(min, max, 0.0),
            Err(VprError::InvalidConfiguration(_))
        ));
        assert!(VoxelGrid::new(min, max, -0.1).is_err());
        assert!(VoxelGrid::new(max, min, 0.1).is_err());
        // 退化的网格是合法的
        assert!(VoxelGrid::new(min, min, 0.1).is_ok());
    }

    #[test]
    fn test_voxel_index() {
        let grid = VoxelGrid::new(Point3::new(-1.0, -1.0, -1.0), Point3::new(1.0, 1.0, 1.0), 0.5)
            .unwrap();
        assert_eq!(grid.voxel_index(&Point3::new(-1.0, -1.0, -1.0)), (0, 0, 0));
        assert_eq!(grid.voxel_index(&Point3::new(0.0, 0.2, 0.9)), (2, 2, 3));
        // 越界点仍然可以哈希
        assert_eq!(grid.voxel_index(&Point3::new(-1.6, 3.0, 0.0)), (-2, 8, 2));
        let p = Point3::new(0.123456, -0.654321, 0.999);
        assert_eq!(grid.voxel_index(&p), grid.voxel_index(&p.clone()));
    }

    #[test]
    fn test_voxel_coordinates() {
        let grid = VoxelGrid::new(Point3::new(1.0, 2.0, 3.0), Point3::new(5.0, 5.0, 5.0), 0.5)
            .unwrap();
        let corner = grid.voxel_coordinates(&Point3::new(1.7, 2.2, 4.9));
        assert_eq!(corner, Point3::new(1.5, 2.0, 4.5));
    }

    #[test]
    fn test_down_sample_one_point_per_voxel() {
        let grid = unit_grid();
        let cloud = PointCloud::from_points(vec![
            Point3::new(0.1, 0.1, 0.1),
            Point3::new(0.5, 0.5, 0.5),
            Point3::new(0.9, 0.2, 0.7),
            Point3::new(3.5, 0.5, 0.5),
            // 越界点被丢弃
            Point3::new(-0.5, 0.5, 0.5),
            Point3::new(10.5, 0.5, 0.5),
        ]);
        let down = grid.down_sample(&cloud);
        assert_eq!(down.len(), 2);
        assert_eq!(down.points()[0], Point3::new(0.5, 0.5, 0.5));
        assert_eq!(down.points()[1], Point3::new(3.5, 0.5, 0.5));
        assert_eq!(grid.occupied_voxels(&cloud).len(), 2);
    }

    #[test]
    fn test_down_sample_keeps_max_bound() {
        let grid = unit_grid();
        let cloud = PointCloud::from_points(vec![Point3::new(10.0, 10.0, 10.0)]);
        assert_eq!(grid.down_sample(&cloud).len(), 1);
    }

    #[test]
    fn test_down_sample_idempotent() {
        let grid = VoxelGrid::new(Point3::origin(), Point3::new(3.0, 3.0, 3.0), 0.3).unwrap();
        let mut cloud = PointCloud::new();
        for i in 0..30 {
            for j in 0..7 {
                let t = i as f64 * 0.097 + j as f64 * 0.013;
                let p = Point3::new(t % 3.0, (t * 1.7) % 3.0, (t * 0.3) % 3.0);
                cloud.push(p);
                cloud.push(p);
            }
        }
        let once = grid.down_sample(&cloud);
        let twice = grid.down_sample(&once);
        assert!(once.len() < cloud.len());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_down_sample_empty() {
        let grid = unit_grid();
        assert!(grid.down_sample(&PointCloud::new()).is_empty());
    }
}
