//! Per-render diagnostics.

use crate::fetch::{TileFailure, TileResults};
use crate::overlay::SkippedFeature;
use std::fmt;

/// Fetch outcome of one layer.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerDiagnostics {
    /// Position in the layer stack
    pub index: usize,
    pub provider: String,
    /// Zoom the layer was fetched at
    pub zoom: u8,
    pub requested: usize,
    pub succeeded: usize,
    pub failures: Vec<TileFailure>,
}

impl LayerDiagnostics {
    pub(crate) fn new(index: usize, provider: &str, zoom: u8, requested: usize, results: &TileResults) -> Self {
        Self {
            index,
            provider: provider.to_string(),
            zoom,
            requested,
            succeeded: results.success_count(),
            failures: results.failures().to_vec(),
        }
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// True when the layer had tiles and none of them arrived.
    pub fn all_failed(&self) -> bool {
        self.requested > 0 && self.succeeded == 0
    }
}

/// Everything a caller needs to judge a finished render.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderDiagnostics {
    pub grid_columns: u32,
    pub grid_rows: u32,
    /// Final canvas size, after any resize
    pub width: u32,
    pub height: u32,
    pub layers: Vec<LayerDiagnostics>,
    /// Overlay features not drawn, ordered by feature index
    pub skipped_features: Vec<SkippedFeature>,
}

/// Totals across a [`RenderDiagnostics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiagnosticsSummary {
    pub tiles_requested: usize,
    pub tiles_succeeded: usize,
    pub tiles_failed: usize,
    pub features_skipped: usize,
}

impl RenderDiagnostics {
    pub fn summary(&self) -> DiagnosticsSummary {
        let mut summary = DiagnosticsSummary {
            features_skipped: self.skipped_features.len(),
            ..Default::default()
        };
        for layer in &self.layers {
            summary.tiles_requested += layer.requested;
            summary.tiles_succeeded += layer.succeeded;
            summary.tiles_failed += layer.failed();
        }
        summary
    }

    /// True when any tile or feature is missing from the output.
    pub fn is_degraded(&self) -> bool {
        let summary = self.summary();
        summary.tiles_failed > 0 || summary.features_skipped > 0
    }
}

impl fmt::Display for DiagnosticsSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} tiles fetched, {} failed, {} features skipped",
            self.tiles_succeeded, self.tiles_requested, self.tiles_failed, self.features_skipped
        )
    }
}
