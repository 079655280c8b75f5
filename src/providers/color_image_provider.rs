use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// 彩色图像句柄, never decoded by this crate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColorImageProvider {
    path: PathBuf,
}

impl ColorImageProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
