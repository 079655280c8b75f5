//! 帧-体素覆盖矩阵
//!
//! Sparse boolean matrix, one row per frame and one column per scene voxel
//! seen by at least one frame. Entry `(f, v)` is set when the down sampled
//! cloud of frame `f` occupies voxel `v`.

use std::collections::HashMap;

use ndarray::Array2;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{Result, VprError};
use crate::global_types::Pose;
use crate::providers::PointCloudProvider;
use crate::voxel_grid::{VoxelGrid, VoxelIndex};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageMatrix {
    /// Column ids of every row, ascending.
    rows: Vec<Vec<usize>>,
    num_voxels: usize,
}

impl CoverageMatrix {
    /// Builds the matrix for a trajectory.
    ///
    /// Loading, transforming and down sampling run in parallel per frame.
    /// Column ids are then registered sequentially in frame order, so the
    /// numbering is stable for identical inputs.
    pub fn build(
        grid: &VoxelGrid,
        point_clouds: &[PointCloudProvider],
        poses: &[Pose],
    ) -> Result<Self> {
        if point_clouds.len() != poses.len() {
            return Err(VprError::ShapeMismatch {
                what: "point clouds",
                expected: poses.len(),
                actual: point_clouds.len(),
            });
        }
        let frames_voxels: Vec<Vec<VoxelIndex>> = point_clouds
            .par_iter()
            .zip(poses.par_iter())
            .map(|(provider, pose)| {
                let mut cloud = provider.load()?;
                cloud.transform_mut(pose);
                let down_sampled = grid.down_sample(&cloud);
                Ok(down_sampled
                    .points()
                    .iter()
                    .map(|p| grid.voxel_index(p))
                    .collect())
            })
            .collect::<Result<_>>()?;
        Ok(Self::from_frames_voxels(&frames_voxels))
    }

    /// Registers voxel columns in first-seen order.
    pub fn from_frames_voxels(frames_voxels: &[Vec<VoxelIndex>]) -> Self {
        let mut voxels_enum: HashMap<VoxelIndex, usize> = HashMap::new();
        let mut rows = Vec::with_capacity(frames_voxels.len());
        for voxels in frames_voxels {
            let mut row: Vec<usize> = voxels
                .iter()
                .map(|voxel| {
                    let next = voxels_enum.len();
                    *voxels_enum.entry(*voxel).or_insert(next)
                })
                .collect();
            row.sort_unstable();
            row.dedup();
            rows.push(row);
        }
        let num_voxels = voxels_enum.len();
        log::debug!(
            "coverage matrix: {} frames x {} voxels",
            rows.len(),
            num_voxels
        );
        Self { rows, num_voxels }
    }

    pub fn num_frames(&self) -> usize {
        self.rows.len()
    }

    pub fn num_voxels(&self) -> usize {
        self.num_voxels
    }

    /// Voxel columns occupied by `frame`.
    pub fn row(&self, frame: usize) -> &[usize] {
        &self.rows[frame]
    }

    pub fn rows(&self) -> &[Vec<usize>] {
        &self.rows
    }

    /// Number of set entries.
    pub fn nnz(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }

    /// Frames occupying each voxel column, ascending.
    pub fn columns(&self) -> Vec<Vec<usize>> {
        let mut columns = vec![Vec::new(); self.num_voxels];
        for (frame, row) in self.rows.iter().enumerate() {
            for &voxel in row {
                columns[voxel].push(frame);
            }
        }
        columns
    }

    /// 稠密矩阵, 0/1 entries.
    pub fn to_dense(&self) -> Array2<u8> {
        let mut dense = Array2::<u8>::zeros((self.num_frames(), self.num_voxels));
        for (frame, row) in self.rows.iter().enumerate() {
            for &voxel in row {
                dense[[frame, voxel]] = 1;
            }
        }
        dense
    }
}
