use super::ReductionMethod;
use crate::database::Database;
use crate::error::{Result, VprError};

/// 每隔 n 帧取一帧
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EveryNth {
    n: usize,
}

impl EveryNth {
    pub fn new(n: usize) -> Result<Self> {
        if n == 0 {
            return Err(VprError::invalid_config("step of every-nth must be at least 1"));
        }
        Ok(Self { n })
    }
}

impl ReductionMethod for EveryNth {
    fn reduce(&self, db: &Database) -> Result<Database> {
        let indices: Vec<usize> = (0..db.len()).step_by(self.n).collect();
        log::info!("every {}th: {} -> {} frames", self.n, db.len(), indices.len());
        db.select(&indices)
    }
}
