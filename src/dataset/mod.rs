//! 数据集处理
//!
//! TUM RGB-D style layout: a colour directory, a point cloud directory and a
//! trajectory file with one `[timestamp] tx ty tz qx qy qz qw` pose per line.
//! Frames are matched by line order and by the sorted file names.
mod tum;

pub use tum::{read_sorted_dir, read_trajectory, VprDataset};

use crate::database::Database;
use crate::error::Result;
use crate::global_types::Pose;

pub type DefaultDataset = tum::VprDataset;

pub trait DatasetTrait {
    /// 轨迹, 每帧一个位姿
    fn trajectory(&self) -> &[Pose];

    /// 构建数据库, 点云按需读取
    fn to_database(&self) -> Result<Database>;
}
