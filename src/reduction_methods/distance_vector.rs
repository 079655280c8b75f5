use super::ReductionMethod;
use crate::database::Database;
use crate::error::{Result, VprError};

/// 按累计行驶距离取帧
///
/// Keeps the first frame, then sums the distances between consecutive poses
/// and keeps a frame whenever the sum exceeds the threshold, starting the
/// sum over afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceVector {
    distance_threshold: f64,
}

impl DistanceVector {
    pub fn new(distance_threshold: f64) -> Result<Self> {
        Ok(Self {
            distance_threshold: VprError::check_finite("distance threshold", distance_threshold)?,
        })
    }
}

impl ReductionMethod for DistanceVector {
    fn reduce(&self, db: &Database) -> Result<Database> {
        if db.is_empty() {
            return Ok(db.clone());
        }
        let trajectory = db.trajectory();
        let mut indices = vec![0];
        let mut partial_distance = 0.0;
        for (i, pair) in trajectory.windows(2).enumerate() {
            partial_distance += (pair[1].translation.vector - pair[0].translation.vector).norm();
            if partial_distance > self.distance_threshold {
                indices.push(i + 1);
                partial_distance = 0.0;
            }
        }
        log::info!(
            "distance vector (threshold {}): {} -> {} frames",
            self.distance_threshold,
            db.len(),
            indices.len()
        );
        db.select(&indices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_data::{artificial_db_1, artificial_db_2, kept_indices};

    #[test]
    fn test_distance_vector() {
        let cases = [
            (artificial_db_1(), 1.5, vec![0, 2, 3]),
            (artificial_db_1(), 3.0, vec![0, 3]),
            (artificial_db_2(), 1.5, vec![0, 1, 2, 3, 4]),
            (artificial_db_2(), 16.0, vec![0, 2, 3]),
        ];
        for (db, threshold, expected) in cases {
            let reduced = DistanceVector::new(threshold).unwrap().reduce(&db).unwrap();
            assert_eq!(kept_indices(&db, &reduced), expected, "threshold {threshold}");
        }
    }
}
