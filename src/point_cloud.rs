//! 点云
use nalgebra::Point3;
use serde::{Deserialize, Serialize};

use crate::global_types::{Bounds, Pose};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PointCloud {
    points: Vec<Point3<f64>>,
}

impl PointCloud {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            points: Vec::with_capacity(capacity),
        }
    }

    pub fn from_points(points: Vec<Point3<f64>>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[Point3<f64>] {
        &self.points
    }

    pub fn into_points(self) -> Vec<Point3<f64>> {
        self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn push(&mut self, point: Point3<f64>) {
        self.points.push(point);
    }

    /// 变换到场景坐标系
    pub fn transform(&self, pose: &Pose) -> PointCloud {
        PointCloud {
            points: self.points.iter().map(|p| pose * p).collect(),
        }
    }

    /// In-place variant of [PointCloud::transform].
    pub fn transform_mut(&mut self, pose: &Pose) {
        self.points.iter_mut().for_each(|p| *p = pose * *p);
    }

    pub fn extend_from(&mut self, other: &PointCloud) {
        self.points.extend_from_slice(&other.points);
    }

    /// Concatenation of both clouds, duplicates kept.
    pub fn merge(&self, other: &PointCloud) -> PointCloud {
        let mut points = Vec::with_capacity(self.len() + other.len());
        points.extend_from_slice(&self.points);
        points.extend_from_slice(&other.points);
        PointCloud { points }
    }

    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::from_points(self.points.iter())
    }
}

impl FromIterator<Point3<f64>> for PointCloud {
    fn from_iter<I: IntoIterator<Item = Point3<f64>>>(iter: I) -> Self {
        Self {
            points: iter.into_iter().collect(),
        }
    }
}
