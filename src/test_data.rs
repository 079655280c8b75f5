//! 测试数据
//!
//! Synthetic databases made of unit-spaced points at voxel centres, so that
//! with a voxel size of 1.0 every point lands in its own voxel and overlaps
//! between frames are known exactly.

use nalgebra::Point3;

use crate::database::Database;
use crate::global_types::Pose;
use crate::point_cloud::PointCloud;
use crate::providers::{ColorImageProvider, PointCloudProvider};

/// `len` points along the x axis at `x = 0.5, 1.5, ...`.
pub fn lattice_cloud(len: usize) -> PointCloud {
    (0..len)
        .map(|i| Point3::new(i as f64 + 0.5, 0.5, 0.5))
        .collect()
}

/// Translation-only trajectory.
pub fn generate_trajectory_from_positions(positions: &[[f64; 3]]) -> Vec<Pose> {
    positions
        .iter()
        .map(|&[x, y, z]| Pose::translation(x, y, z))
        .collect()
}

/// One frame per `(x offset, length)`: a lattice line of `length` points
/// moved `offset` along x by its pose.
pub fn segment_database(segments: &[(f64, usize)]) -> Database {
    let positions: Vec<[f64; 3]> = segments.iter().map(|&(x, _)| [x, 0.0, 0.0]).collect();
    let point_clouds = segments
        .iter()
        .enumerate()
        .map(|(i, &(_, len))| {
            PointCloudProvider::in_memory(format!("pcd/{i:05}.xyz"), lattice_cloud(len))
        })
        .collect();
    let color_images = (0..segments.len())
        .map(|i| ColorImageProvider::new(format!("color/{i:05}.png")))
        .collect();
    Database::new(
        color_images,
        point_clouds,
        generate_trajectory_from_positions(&positions),
    )
    .expect("aligned synthetic database")
}

/// Frames of 10 points each, shifted by `offsets`.
pub fn line_database(offsets: &[f64]) -> Database {
    let segments: Vec<(f64, usize)> = offsets.iter().map(|&x| (x, 10)).collect();
    segment_database(&segments)
}

/// Two strongly overlapping frames (IoU 2/3), two weakly overlapping ones
/// (IoU 3/17) and one isolated frame.
pub fn overlap_scene() -> Database {
    segment_database(&[(0.0, 10), (2.0, 10), (20.0, 10), (27.0, 10), (50.0, 10)])
}

/// Five frames of which frames 0, 2 and 3 cover the whole scene; frame 1
/// lies inside 0 ∪ 2 and frame 4 inside 0.
pub fn set_cover_scene() -> Database {
    segment_database(&[(0.0, 10), (5.0, 10), (10.0, 10), (20.0, 10), (2.0, 6)])
}

/// One small lattice cloud per pose of a translation-only trajectory.
pub fn trajectory_database(positions: &[[f64; 3]]) -> Database {
    let point_clouds = (0..positions.len())
        .map(|i| PointCloudProvider::in_memory(format!("pcd/{i:05}.xyz"), lattice_cloud(4)))
        .collect();
    let color_images = (0..positions.len())
        .map(|i| ColorImageProvider::new(format!("color/{i:05}.png")))
        .collect();
    Database::new(
        color_images,
        point_clouds,
        generate_trajectory_from_positions(positions),
    )
    .expect("aligned synthetic database")
}

pub fn artificial_db_1() -> Database {
    trajectory_database(&[
        [0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [1.0, 1.0, 0.0],
        [3.0, 1.0, 1.0],
        [4.0, 1.0, 1.0],
    ])
}

pub fn artificial_db_2() -> Database {
    trajectory_database(&[
        [0.0, 0.0, 0.0],
        [10.0, 0.0, 0.0],
        [15.0, 15.0, 0.0],
        [30.0, 10.0, 10.0],
        [40.0, 10.0, 10.0],
    ])
}

/// Positions of the poses kept by a reduction, for comparing against
/// expected frame indices.
pub fn kept_indices(original: &Database, reduced: &Database) -> Vec<usize> {
    reduced
        .point_clouds()
        .iter()
        .filter_map(|p| original.point_clouds().iter().position(|q| q == p))
        .collect()
}
