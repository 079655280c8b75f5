//! 导出数据库
//!
//! Writes a database in the same layout [crate::dataset::VprDataset] reads:
//! copied colour images and point clouds, a trajectory whose leading
//! timestamp column (the frame index) is present when the layout expects
//! one, plus a `database.json` manifest listing the source of every frame.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::DatasetLayout;
use crate::database::Database;
use crate::error::{Result, VprError};

pub const MANIFEST_FILE_NAME: &str = "database.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameSave {
    pub color_image: PathBuf,
    pub point_cloud: PathBuf,
    /// tx ty tz qx qy qz qw
    pub pose: [f64; 7],
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSave {
    pub frames: Vec<FrameSave>,
}

impl From<&Database> for DatabaseSave {
    fn from(db: &Database) -> Self {
        let frames = db
            .color_images()
            .iter()
            .zip(db.point_clouds())
            .zip(db.trajectory())
            .map(|((color, cloud), pose)| {
                let t = pose.translation.vector;
                let q = pose.rotation;
                FrameSave {
                    color_image: color.path().to_path_buf(),
                    point_cloud: cloud.path().to_path_buf(),
                    pose: [t.x, t.y, t.z, q.i, q.j, q.k, q.w],
                }
            })
            .collect();
        Self { frames }
    }
}

/// Exports `db` into `dir`, which must not contain the layout directories yet.
pub fn export_database(db: &Database, dir: &Path, layout: &DatasetLayout) -> Result<()> {
    let color_dir = dir.join(&layout.color_dir);
    let point_clouds_dir = dir.join(&layout.point_clouds_dir);
    std::fs::create_dir_all(dir)?;
    std::fs::create_dir(&color_dir)?;
    std::fs::create_dir(&point_clouds_dir)?;

    let manifest = DatabaseSave::from(db);
    for frame in &manifest.frames {
        copy_into(&frame.color_image, &color_dir)?;
        copy_into(&frame.point_cloud, &point_clouds_dir)?;
    }

    let mut writer = csv::WriterBuilder::new()
        .delimiter(b' ')
        .has_headers(false)
        .from_path(dir.join(&layout.trajectory_file_name))?;
    for (i, frame) in manifest.frames.iter().enumerate() {
        // 没有原始时间戳, 用帧序号代替
        let timestamp = layout.with_timestamps.then(|| i.to_string());
        writer.write_record(
            timestamp
                .into_iter()
                .chain(frame.pose.iter().map(|v| v.to_string())),
        )?;
    }
    writer.flush()?;

    let file = std::io::BufWriter::new(std::fs::File::create(dir.join(MANIFEST_FILE_NAME))?);
    serde_json::to_writer_pretty(file, &manifest)?;
    log::info!("exported {} frames to {:?}", db.len(), dir);
    Ok(())
}

fn copy_into(source: &Path, dir: &Path) -> Result<()> {
    let name = source.file_name().ok_or_else(|| {
        VprError::invalid_config(format!("{source:?} does not name a file"))
    })?;
    std::fs::copy(source, dir.join(name))?;
    Ok(())
}
