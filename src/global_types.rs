//! 全局类型
//!
//! Poses and axis-aligned bounds shared by every module.

use nalgebra::{
    Isometry3, Matrix3, Matrix4, Point3, Quaternion, Rotation3, Translation3, UnitQuaternion,
};
use serde::{Deserialize, Serialize};

use crate::error::{Result, VprError};

/// 相机位姿: maps a frame's local point cloud into scene coordinates.
pub type Pose = Isometry3<f64>;

const ROTATION_TOLERANCE: f64 = 1e-6;

/// Builds a [Pose] from a homogeneous 4x4 matrix.
///
/// The rotation block must be orthonormal with determinant +1 and the last
/// row must be `[0 0 0 1]`, otherwise [VprError::InvalidPose] is returned.
pub fn pose_from_matrix(matrix: &Matrix4<f64>) -> Result<Pose> {
    let last_row = matrix.fixed_view::<1, 4>(3, 0);
    if (last_row - nalgebra::RowVector4::new(0.0, 0.0, 0.0, 1.0)).amax() > ROTATION_TOLERANCE {
        return Err(VprError::InvalidPose(format!(
            "last row must be [0 0 0 1], got {}",
            last_row
        )));
    }
    let rot: Matrix3<f64> = matrix.fixed_view::<3, 3>(0, 0).into_owned();
    let orthogonality = (rot.transpose() * rot - Matrix3::identity()).amax();
    if orthogonality > ROTATION_TOLERANCE {
        return Err(VprError::InvalidPose(format!(
            "rotation block is not orthonormal (error {orthogonality:e})"
        )));
    }
    if rot.determinant() < 0.0 {
        return Err(VprError::InvalidPose(
            "rotation block is a reflection".to_string(),
        ));
    }
    let rotation =
        UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(rot));
    let translation = Translation3::new(matrix[(0, 3)], matrix[(1, 3)], matrix[(2, 3)]);
    Ok(Isometry3::from_parts(translation, rotation))
}

/// TUM 格式: translation `(tx, ty, tz)` and quaternion `(qx, qy, qz, qw)`.
pub fn pose_from_tum(translation: [f64; 3], quat: [f64; 4]) -> Result<Pose> {
    let [qx, qy, qz, qw] = quat;
    let q = Quaternion::new(qw, qx, qy, qz);
    let norm = q.norm();
    if !norm.is_finite() || norm < ROTATION_TOLERANCE {
        return Err(VprError::InvalidPose(format!(
            "quaternion {quat:?} cannot be normalized"
        )));
    }
    let [tx, ty, tz] = translation;
    Ok(Isometry3::from_parts(
        Translation3::new(tx, ty, tz),
        UnitQuaternion::from_quaternion(q),
    ))
}

/// Axis-aligned box, `min <= max` componentwise.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Point3<f64>,
    pub max: Point3<f64>,
}

impl Bounds {
    pub fn new(min: Point3<f64>, max: Point3<f64>) -> Self {
        Self { min, max }
    }

    /// Tight bounds of a set of points, `None` when there are no points.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3<f64>>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let init = Bounds::new(*first, *first);
        Some(iter.fold(init, |acc, p| Bounds {
            min: acc.min.inf(p),
            max: acc.max.sup(p),
        }))
    }

    pub fn union(&self, other: &Bounds) -> Bounds {
        Bounds {
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        }
    }

    /// Inclusive on both ends.
    pub fn contains(&self, p: &Point3<f64>) -> bool {
        (0..3).all(|i| p[i] >= self.min[i] && p[i] <= self.max[i])
    }
}
