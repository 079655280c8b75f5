//! 数据库压缩方法
//!
//! Every method turns a [Database] into a new, smaller one whose frames are
//! a strictly increasing subsequence of the input.

mod cube_division;
mod distance_vector;
mod dominating_set;
mod every_nth;
mod set_cover;

pub use cube_division::CubeDivision;
pub use distance_vector::DistanceVector;
pub use dominating_set::DominatingSet;
pub use every_nth::EveryNth;
pub use set_cover::{GreedyCover, SetCover};

use crate::database::Database;
use crate::error::Result;

/// 压缩方法的trait
pub trait ReductionMethod {
    fn reduce(&self, db: &Database) -> Result<Database>;
}
