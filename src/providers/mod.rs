//! 数据提供者
//!
//! Handles to frame payloads. A handle is identified by its path only; the
//! payload is produced on demand by [PointCloudProvider::load], never held
//! by the handle itself.

mod color_image_provider;
mod point_cloud_provider;

pub use color_image_provider::ColorImageProvider;
pub use point_cloud_provider::{InMemoryLoader, PointCloudProvider, XyzLoader};

use std::path::Path;

use crate::error::Result;
use crate::point_cloud::PointCloud;

/// 点云读取器的trait
pub trait PointCloudLoader: Send + Sync {
    fn load(&self, path: &Path) -> Result<PointCloud>;
}
