use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use nalgebra::Point3;

use super::PointCloudLoader;
use crate::error::{Result, VprError};
use crate::point_cloud::PointCloud;

/// Point cloud handle. Equality and hashing use the path only.
#[derive(Clone)]
pub struct PointCloudProvider {
    path: PathBuf,
    loader: Arc<dyn PointCloudLoader>,
}

impl PointCloudProvider {
    pub fn new(path: impl Into<PathBuf>, loader: Arc<dyn PointCloudLoader>) -> Self {
        Self {
            path: path.into(),
            loader,
        }
    }

    /// 读取 xyz 文本格式的点云文件
    pub fn from_xyz_file(path: impl Into<PathBuf>) -> Self {
        Self::new(path, Arc::new(XyzLoader))
    }

    /// Wraps an already materialised cloud; `name` becomes its identity.
    pub fn in_memory(name: impl Into<PathBuf>, cloud: PointCloud) -> Self {
        Self::new(name, Arc::new(InMemoryLoader::new(cloud)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<PointCloud> {
        self.loader.load(&self.path)
    }
}

impl fmt::Debug for PointCloudProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PointCloudProvider")
            .field("path", &self.path)
            .finish()
    }
}

impl PartialEq for PointCloudProvider {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for PointCloudProvider {}

impl Hash for PointCloudProvider {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.path.hash(state);
    }
}

/// Whitespace separated text, one point per line. The first three columns
/// are `x y z`, extra columns (colour, normals) are ignored, `#` starts a
/// comment line.
#[derive(Debug, Default, Clone, Copy)]
pub struct XyzLoader;

impl PointCloudLoader for XyzLoader {
    fn load(&self, path: &Path) -> Result<PointCloud> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b' ')
            .has_headers(false)
            .flexible(true)
            .comment(Some(b'#'))
            .trim(csv::Trim::All)
            .from_path(path)?;
        let mut cloud = PointCloud::new();
        for record in reader.records() {
            let record = record?;
            let line = record.position().map(|p| p.line()).unwrap_or_default();
            // 多个空格会产生空字段
            let mut fields = record.iter().filter(|field| !field.is_empty());
            let mut xyz = [0.0; 3];
            for value in xyz.iter_mut() {
                let field = fields.next().ok_or_else(|| VprError::Parse {
                    path: path.to_path_buf(),
                    line,
                    message: "expected at least 3 columns".to_string(),
                })?;
                *value = field.parse::<f64>().map_err(|e| VprError::Parse {
                    path: path.to_path_buf(),
                    line,
                    message: format!("{field:?}: {e}"),
                })?;
            }
            cloud.push(Point3::from(xyz));
        }
        Ok(cloud)
    }
}

/// Serves a shared cloud regardless of the requested path.
#[derive(Debug, Clone)]
pub struct InMemoryLoader {
    cloud: Arc<PointCloud>,
}

impl InMemoryLoader {
    pub fn new(cloud: PointCloud) -> Self {
        Self {
            cloud: Arc::new(cloud),
        }
    }
}

impl PointCloudLoader for InMemoryLoader {
    fn load(&self, _path: &Path) -> Result<PointCloud> {
        Ok(self.cloud.as_ref().clone())
    }
}
