//! Per-grid fetch results.
//!
//! Successful tiles are kept decoded, keyed by their index; failures keep
//! enough detail for diagnostics. The compositor fills failed positions with
//! a placeholder.

use crate::coord::TileIndex;
use image::DynamicImage;
use std::collections::HashMap;

/// Why a tile ended up without an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Every attempt hit a transient error (timeout, 5xx, connection)
    Exhausted,
    /// The provider answered with a non-retryable error
    Rejected,
    /// The response body was not a decodable image
    Decode,
    /// The fetch task did not report back
    Aborted,
}

/// A tile that failed permanently.
#[derive(Debug, Clone, PartialEq)]
pub struct TileFailure {
    pub index: TileIndex,
    /// Number of attempts made
    pub attempts: u32,
    pub kind: FailureKind,
    /// Last error message
    pub error: String,
}

/// Outcome of fetching every tile of a grid.
#[derive(Debug, Clone, Default)]
pub struct TileResults {
    tiles: HashMap<TileIndex, DynamicImage>,
    failures: Vec<TileFailure>,
}

impl TileResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a decoded tile.
    pub fn add_success(&mut self, index: TileIndex, image: DynamicImage) {
        self.tiles.insert(index, image);
    }

    /// Records a permanent failure.
    pub fn add_failure(&mut self, failure: TileFailure) {
        self.failures.push(failure);
    }

    /// Returns the decoded image for `index`, if it was fetched.
    pub fn get(&self, index: &TileIndex) -> Option<&DynamicImage> {
        self.tiles.get(index)
    }

    /// Returns true if `index` was recorded as a success or a failure.
    pub fn contains(&self, index: &TileIndex) -> bool {
        self.tiles.contains_key(index) || self.failures.iter().any(|f| f.index == *index)
    }

    pub fn failures(&self) -> &[TileFailure] {
        &self.failures
    }

    #[inline]
    pub fn success_count(&self) -> usize {
        self.tiles.len()
    }

    #[inline]
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    #[inline]
    pub fn total_count(&self) -> usize {
        self.tiles.len() + self.failures.len()
    }

    /// Returns true if at least one tile was attempted and none succeeded.
    pub fn all_failed(&self) -> bool {
        self.total_count() > 0 && self.tiles.is_empty()
    }

    /// Success rate as a percentage (0.0 - 100.0).
    pub fn success_rate(&self) -> f64 {
        let total = self.total_count();
        if total == 0 {
            return 0.0;
        }
        (self.tiles.len() as f64 / total as f64) * 100.0
    }
}
