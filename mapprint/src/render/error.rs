use crate::compositor::ResamplingError;
use crate::coord::CoordError;
use crate::overlay::GeometryError;
use crate::provider::ProviderError;
use std::path::PathBuf;
use thiserror::Error;

/// A map definition that cannot be rendered.
///
/// Raised while validating the definition, before any tile is requested.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("failed to read map definition {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed map definition: {0}")]
    Parse(String),

    #[error("invalid coordinates: {0}")]
    Coordinates(#[from] CoordError),

    #[error("invalid zoom level {0} (must be between 0 and 19)")]
    InvalidZoom(i64),

    #[error("layer level {level} moves base zoom {base} out of range")]
    InvalidLayerZoom { base: u8, level: i8 },

    #[error("invalid layer opacity {0} (must be between 0 and 1)")]
    InvalidOpacity(f32),

    #[error("map definition has no layers")]
    NoLayers,

    #[error("layer {layer}: {source}")]
    Provider {
        layer: usize,
        #[source]
        source: ProviderError,
    },

    #[error("invalid output size {width:?}x{height:?}")]
    InvalidSize {
        width: Option<u32>,
        height: Option<u32>,
    },

    #[error("unreadable overlay: {0}")]
    Overlay(#[source] GeometryError),
}

/// Fatal render failure.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("layer {layer} ({provider}): all {failed} tiles failed to fetch")]
    LayerFailed {
        layer: usize,
        provider: String,
        failed: usize,
    },

    #[error("resampling failed: {0}")]
    Resampling(#[from] ResamplingError),

    #[error("compositing task failed: {0}")]
    Task(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_stage() {
        let err = RenderError::LayerFailed {
            layer: 0,
            provider: "osm".to_string(),
            failed: 90,
        };
        assert_eq!(err.to_string(), "layer 0 (osm): all 90 tiles failed to fetch");

        let err: RenderError = ConfigurationError::Provider {
            layer: 2,
            source: ProviderError::UnknownProvider("carto".to_string()),
        }
        .into();
        assert!(err.to_string().starts_with("layer 2: "));
        assert!(err.to_string().contains("carto"));
    }
}
