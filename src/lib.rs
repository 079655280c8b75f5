//! 视觉重定位数据库的压缩与评价
//!
//! nalgebra
//! https://docs.rs/nalgebra/latest/nalgebra/
//!
//! ndarray
//! https://docs.rs/ndarray/latest/ndarray/all.html
//!
//! rayon
//! https://docs.rs/rayon/latest/rayon/

pub mod cache;
pub mod config;
pub mod coverage;
pub mod coverage_matrix;
pub mod database;
pub mod dataset;
pub mod error;
pub mod frame_graph;
pub mod global_types;
pub mod map_builder;
pub mod metrics;
pub mod point_cloud;
pub mod providers;
pub mod reduction_methods;
pub mod save;
pub mod voxel_grid;

#[cfg(test)]
mod test_data;

pub use database::{Database, Frame};
pub use error::{Result, VprError};
pub use global_types::{Bounds, Pose};
pub use point_cloud::PointCloud;
pub use voxel_grid::VoxelGrid;
