use thiserror::Error;

/// Per-feature overlay errors.
///
/// A feature that raises one of these is skipped and recorded; the rest of
/// the overlay still draws. `InvalidPayload` is the exception: it means the
/// collection itself could not be read.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("invalid overlay payload: {0}")]
    InvalidPayload(String),

    #[error("malformed coordinates: {0}")]
    MalformedCoordinates(String),

    #[error("unsupported geometry type '{0}'")]
    UnsupportedGeometry(String),

    #[error("invalid value {value} for style key '{key}'")]
    InvalidStyle { key: String, value: String },

    #[error("point feature has no marker image")]
    NoMarkerImage,

    #[error("marker '{reference}' unavailable: {reason}")]
    MissingMarker { reference: String, reason: String },
}

impl GeometryError {
    pub(crate) fn style(key: &str, value: &serde_json::Value) -> Self {
        Self::InvalidStyle {
            key: key.to_string(),
            value: value.to_string(),
        }
    }
}

/// A feature that was not drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedFeature {
    /// Position of the feature in the input collection
    pub index: usize,
    pub error: GeometryError,
}
