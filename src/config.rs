//! 默认参数与运行配置

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// 度量使用的默认体素大小
pub const DEFAULT_VOXEL_SIZE: f64 = 0.3;
/// 集合覆盖使用更细的体素
pub const SET_COVER_VOXEL_SIZE: f64 = 0.1;
/// 构建稀疏地图时每隔多少帧降采样一次
pub const DOWN_SAMPLE_STEP: usize = 100;
/// 支配集连边的 IoU 阈值
pub const DOMINATING_SET_THRESHOLD: f64 = 0.3;
pub const COVERAGE_THRESHOLD: f64 = 0.3;

/// 数据集目录结构
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetLayout {
    pub color_dir: String,
    pub point_clouds_dir: String,
    pub trajectory_file_name: String,
    /// 轨迹文件每行开头是否带时间戳
    pub with_timestamps: bool,
}

impl Default for DatasetLayout {
    fn default() -> Self {
        Self {
            color_dir: "color".to_string(),
            point_clouds_dir: "pcd".to_string(),
            trajectory_file_name: "CameraTrajectory.txt".to_string(),
            with_timestamps: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub layout: DatasetLayout,
    /// 工作线程数, `None` 使用 rayon 默认值
    pub num_threads: Option<usize>,
    /// 覆盖矩阵缓存快照
    pub cache_snapshot: Option<PathBuf>,
}

impl RunConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let file = std::io::BufReader::new(std::fs::File::open(path)?);
        let config = serde_json::from_reader(file)?;
        log::debug!("loaded run config from {:?}: {:?}", path, config);
        Ok(config)
    }
}
