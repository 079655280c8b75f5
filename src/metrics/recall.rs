use rayon::prelude::*;

use crate::coverage::point_cloud_coverage;
use crate::database::{find_bounds_for_multiple_databases, Database};
use crate::error::{Result, VprError};
use crate::voxel_grid::VoxelGrid;

/// 召回率
///
/// Fraction of `test` frames whose matched `source` frame, `matches[i]`,
/// covers them by more than `threshold`. The grid spans both databases.
pub fn recall(
    source: &Database,
    test: &Database,
    matches: &[usize],
    voxel_size: f64,
    threshold: f64,
) -> Result<f64> {
    if matches.len() != test.len() {
        return Err(VprError::ShapeMismatch {
            what: "matches",
            expected: test.len(),
            actual: matches.len(),
        });
    }
    if test.is_empty() {
        return Err(VprError::EmptyDatabase);
    }
    let threshold = VprError::check_finite("threshold", threshold)?;
    let bounds = find_bounds_for_multiple_databases(&[source, test])?;
    let grid = VoxelGrid::from_bounds(&bounds, voxel_size)?;

    let hits: Vec<bool> = matches
        .par_iter()
        .enumerate()
        .map(|(i, &matched)| {
            let query = test.transformed_point_cloud(i)?;
            let candidate = source.transformed_point_cloud(matched)?;
            Ok(point_cloud_coverage(&query, &candidate, &grid)? > threshold)
        })
        .collect::<Result<_>>()?;
    let correct = hits.into_iter().filter(|&hit| hit).count();
    log::debug!("recall: {correct} of {} matches are correct", matches.len());
    Ok(correct as f64 / matches.len() as f64)
}
