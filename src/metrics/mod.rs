//! 数据库评价指标

mod frames_coverage;
mod not_covered_frames;
mod recall;
mod spatial_coverage;

pub use frames_coverage::{frames_coverage, FramesCoverage};
pub use not_covered_frames::{not_covered_frames, NotCoveredFrames};
pub use recall::recall;
pub use spatial_coverage::{spatial_coverage, SpatialCoverage};

use crate::database::Database;
use crate::error::Result;

/// 压缩结果的评价
pub trait ReductionMetric {
    type Output;

    fn evaluate(&self, original: &Database, reduced: &Database) -> Result<Self::Output>;
}
