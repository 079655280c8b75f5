//! 立方体划分
//!
//! The box around the trajectory positions is cut into cubes; in every
//! occupied cube the pose closest to the cube centre is kept.

use std::collections::HashMap;

use nalgebra::{Point3, Vector3};

use super::ReductionMethod;
use crate::database::Database;
use crate::error::{Result, VprError};
use crate::global_types::Bounds;
use crate::voxel_grid::{VoxelGrid, VoxelIndex};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubeDivision {
    cube_size: f64,
}

impl CubeDivision {
    pub fn new(cube_size: f64) -> Result<Self> {
        Ok(Self {
            cube_size: VprError::check_positive("cube size", cube_size)?,
        })
    }
}

impl ReductionMethod for CubeDivision {
    fn reduce(&self, db: &Database) -> Result<Database> {
        let positions: Vec<Point3<f64>> = db
            .trajectory()
            .iter()
            .map(|pose| Point3::from(pose.translation.vector))
            .collect();
        let Some(bounds) = Bounds::from_points(&positions) else {
            return Ok(db.clone());
        };
        let grid = VoxelGrid::from_bounds(&bounds, self.cube_size)?;
        let half = Vector3::repeat(self.cube_size / 2.0);

        // cube -> (frame, distance to centre)
        let mut cubes: HashMap<VoxelIndex, (usize, f64)> = HashMap::new();
        for (i, position) in positions.iter().enumerate() {
            let center = grid.voxel_coordinates(position) + half;
            let distance = (position - center).norm();
            cubes
                .entry(grid.voxel_index(position))
                .and_modify(|best| {
                    if distance < best.1 {
                        *best = (i, distance);
                    }
                })
                .or_insert((i, distance));
        }
        let mut indices: Vec<usize> = cubes.into_values().map(|(i, _)| i).collect();
        indices.sort_unstable();
        log::info!(
            "cube division (cube size {}): {} -> {} frames",
            self.cube_size,
            db.len(),
            indices.len()
        );
        db.select(&indices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_data::{artificial_db_1, artificial_db_2, kept_indices};

    #[test]
    fn test_cube_division() {
        let cases = [
            (artificial_db_1(), 2.0, vec![2, 3, 4]),
            (artificial_db_1(), 4.0, vec![3, 4]),
            (artificial_db_2(), 2.0, vec![0, 1, 2, 3, 4]),
            (artificial_db_2(), 16.0, vec![1, 3, 4]),
        ];
        for (db, cube_size, expected) in cases {
            let reduced = CubeDivision::new(cube_size).unwrap().reduce(&db).unwrap();
            assert_eq!(kept_indices(&db, &reduced), expected, "cube size {cube_size}");
        }
    }

    #[test]
    fn test_single_pose() {
        let db = artificial_db_1().select(&[3]).unwrap();
        let reduced = CubeDivision::new(1.0).unwrap().reduce(&db).unwrap();
        assert_eq!(reduced.len(), 1);
        assert!(CubeDivision::new(0.0).is_err());
    }
}
