use std::path::{Path, PathBuf};

use super::DatasetTrait;
use crate::config::DatasetLayout;
use crate::database::Database;
use crate::error::{Result, VprError};
use crate::global_types::{pose_from_tum, Pose};
use crate::providers::{ColorImageProvider, PointCloudProvider};

#[derive(Debug, Default)]
pub struct VprDataset {
    pub root: PathBuf,
    pub color_images: Vec<PathBuf>,
    pub point_clouds: Vec<PathBuf>,
    pub trajectory: Vec<Pose>,
}

impl VprDataset {
    pub fn new(root: &Path, layout: &DatasetLayout) -> Result<Self> {
        let color_images = read_sorted_dir(&root.join(&layout.color_dir))?;
        let point_clouds = read_sorted_dir(&root.join(&layout.point_clouds_dir))?;
        let trajectory = read_trajectory(
            &root.join(&layout.trajectory_file_name),
            layout.with_timestamps,
        )?;
        if color_images.len() != trajectory.len() {
            return Err(VprError::ShapeMismatch {
                what: "color images",
                expected: trajectory.len(),
                actual: color_images.len(),
            });
        }
        if point_clouds.len() != trajectory.len() {
            return Err(VprError::ShapeMismatch {
                what: "point clouds",
                expected: trajectory.len(),
                actual: point_clouds.len(),
            });
        }
        log::info!("dataset {:?}: {} frames", root, trajectory.len());
        Ok(Self {
            root: root.to_path_buf(),
            color_images,
            point_clouds,
            trajectory,
        })
    }
}

impl DatasetTrait for VprDataset {
    fn trajectory(&self) -> &[Pose] {
        &self.trajectory
    }

    fn to_database(&self) -> Result<Database> {
        Database::new(
            self.color_images
                .iter()
                .map(ColorImageProvider::new)
                .collect(),
            self.point_clouds
                .iter()
                .map(PointCloudProvider::from_xyz_file)
                .collect(),
            self.trajectory.clone(),
        )
    }
}

/// Regular files of `dir`, sorted by name.
pub fn read_sorted_dir(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

/// 读取 TUM 轨迹
pub fn read_trajectory(path: &Path, with_timestamps: bool) -> Result<Vec<Pose>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b' ')
        .has_headers(false)
        .flexible(true)
        .comment(Some(b'#'))
        .trim(csv::Trim::All)
        .from_path(path)?;
    let skip = usize::from(with_timestamps);
    let mut trajectory = Vec::new();
    for record in reader.records() {
        let record = record?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        let parse_error = |message: String| VprError::Parse {
            path: path.to_path_buf(),
            line,
            message,
        };
        let values = record
            .iter()
            .filter(|field| !field.is_empty())
            .skip(skip)
            .map(|field| {
                field
                    .parse::<f64>()
                    .map_err(|e| parse_error(format!("{field:?}: {e}")))
            })
            .collect::<Result<Vec<f64>>>()?;
        if values.len() != 7 {
            return Err(parse_error(format!(
                "expected tx ty tz qx qy qz qw, got {} values",
                values.len()
            )));
        }
        trajectory.push(pose_from_tum(
            [values[0], values[1], values[2]],
            [values[3], values[4], values[5], values[6]],
        )?);
    }
    Ok(trajectory)
}

#[cfg(test)]
mod tests {
    use nalgebra::Vector3;

    use super::*;

    fn write_dataset(root: &Path, poses: &str, frames: usize) {
        std::fs::create_dir(root.join("color")).unwrap();
        std::fs::create_dir(root.join("pcd")).unwrap();
        for i in 0..frames {
            std::fs::write(root.join(format!("color/{i:03}.png")), b"").unwrap();
            std::fs::write(
                root.join(format!("pcd/{i:03}.xyz")),
                "0.5 0.5 0.5\n1.5 0.5 0.5\n",
            )
            .unwrap();
        }
        std::fs::write(root.join("CameraTrajectory.txt"), poses).unwrap();
    }

    #[test]
    fn test_read_trajectory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("traj.txt");
        std::fs::write(&path, "# t tx ty tz qx qy qz qw\n1.0 1 2 3 0 0 0 1\n2.0 4 5 6 0 0 1 0\n")
            .unwrap();
        let trajectory = read_trajectory(&path, true).unwrap();
        assert_eq!(trajectory.len(), 2);
        assert_eq!(trajectory[0].translation.vector, Vector3::new(1.0, 2.0, 3.0));
        // 绕 z 轴转 180 度
        let p = trajectory[1] * nalgebra::Point3::new(1.0, 0.0, 0.0);
        assert!((p - nalgebra::Point3::new(3.0, 5.0, 6.0)).norm() < 1e-12);

        std::fs::write(&path, "1 2 3 0 0 0 1\n").unwrap();
        assert_eq!(read_trajectory(&path, false).unwrap().len(), 1);
        assert!(matches!(
            read_trajectory(&path, true),
            Err(VprError::Parse { line: 1, .. })
        ));
    }

    #[test]
    fn test_read_dataset() {
        let dir = tempfile::tempdir().unwrap();
        write_dataset(dir.path(), "0 0 0 0 0 0 0 1\n1 3 0 0 0 0 0 1\n", 2);
        let dataset = VprDataset::new(dir.path(), &DatasetLayout::default()).unwrap();
        assert_eq!(dataset.trajectory().len(), 2);
        assert!(dataset.point_clouds[0].ends_with("pcd/000.xyz"));

        let db = dataset.to_database().unwrap();
        assert_eq!(db.len(), 2);
        let bounds = db.bounds().unwrap();
        assert_eq!(bounds.max.x, 4.5);
    }

    #[test]
    fn test_count_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        write_dataset(dir.path(), "0 0 0 0 0 0 0 1\n", 2);
        assert!(matches!(
            VprDataset::new(dir.path(), &DatasetLayout::default()),
            Err(VprError::ShapeMismatch { .. })
        ));
    }
}
