//! Matrix fixtures shared by the scheduling tests

use std::sync::Arc;

use super::{DistanceTimeMatrices, MatrixDatabase};
use crate::types::{Coordinates, StopRecord};

/// Stops `s0..sN` spread along a meridian; coordinates only matter for
/// resolution tests.
pub fn catalogue(n: usize) -> Vec<StopRecord> {
    (0..n)
        .map(|i| StopRecord {
            id: format!("s{i}"),
            name: None,
            coordinates: Coordinates::new(39.0 + i as f64 * 0.01, -0.37),
        })
        .collect()
}

/// Symmetric NxN database. `entries` are `(from, to, distance_m,
/// duration_minutes)`, mirrored to `(to, from)`. Unlisted pairs are unknown.
pub fn symmetric_db(n: usize, entries: &[(usize, usize, u64, u64)]) -> Arc<MatrixDatabase> {
    let mut matrices = DistanceTimeMatrices::unknown(n);
    for &(i, j, d, minutes) in entries {
        matrices.set(i, j, d, minutes * 60);
        matrices.set(j, i, d, minutes * 60);
    }
    Arc::new(MatrixDatabase::from_matrices(catalogue(n), matrices, 5.0).expect("valid fixture"))
}

/// Every pair of distinct stops `minutes` apart (1 km per minute).
pub fn uniform_db(n: usize, minutes: u64) -> Arc<MatrixDatabase> {
    let mut entries = Vec::new();
    for i in 0..n {
        for j in (i + 1)..n {
            entries.push((i, j, minutes * 1000, minutes));
        }
    }
    symmetric_db(n, &entries)
}
