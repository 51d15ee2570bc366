//! Provider adapters: tile index → fetchable URLs.
//!
//! Providers form a small closed set of addressing schemes, selected by the
//! identifier string a layer declares. Adding a provider means adding a
//! [`ProviderKind`] variant, its identifiers and its default template.

use super::template::{Placeholder, UrlTemplate};
use super::types::ProviderError;
use crate::coord::TileIndex;

/// Addressing scheme used by a tile provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// Slippy-map servers addressed by literal `z`/`x`/`y` substitution
    /// (OpenStreetMap, Thunderforest, CartoDB, ...).
    Xyz,

    /// Servers addressed by a single quadkey path segment (Bing Maps).
    Quadkey,
}

impl ProviderKind {
    /// Resolves a layer's provider identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::UnknownProvider`] for unrecognised identifiers.
    pub fn from_id(id: &str) -> Result<Self, ProviderError> {
        match id.trim().to_ascii_lowercase().as_str() {
            "osm" | "xyz" | "openstreetmap" => Ok(ProviderKind::Xyz),
            "bing" | "quadkey" => Ok(ProviderKind::Quadkey),
            _ => Err(ProviderError::UnknownProvider(id.to_string())),
        }
    }

    /// Template used when a layer declares no URLs of its own.
    pub fn default_template(&self) -> &'static str {
        match self {
            ProviderKind::Xyz => "https://tile.openstreetmap.org/${z}/${x}/${y}.png",
            ProviderKind::Quadkey => {
                "https://ecn.t0.tiles.virtualearth.net/tiles/a${quadkey}.jpeg?g=1"
            }
        }
    }

    /// Human readable name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            ProviderKind::Xyz => "XYZ tiles",
            ProviderKind::Quadkey => "Quadkey tiles",
        }
    }

    fn validate(&self, template: &UrlTemplate) -> Result<(), ProviderError> {
        let required: &[(Placeholder, &str)] = match self {
            ProviderKind::Xyz => &[
                (Placeholder::Zoom, "z"),
                (Placeholder::X, "x"),
                (Placeholder::Y, "y"),
            ],
            ProviderKind::Quadkey => &[(Placeholder::Quadkey, "quadkey")],
        };

        for (placeholder, name) in required {
            if !template.contains(*placeholder) {
                return Err(ProviderError::MalformedTemplate {
                    template: template.as_str().to_string(),
                    reason: format!("missing '${{{}}}' placeholder", name),
                });
            }
        }
        Ok(())
    }
}

/// Turns tile indices into URLs for one layer.
///
/// A layer may declare several candidate templates. Tiles are spread across
/// them round-robin, and retries of the same tile move on to the next
/// template so a failing mirror is skipped.
#[derive(Debug, Clone)]
pub struct ProviderAdapter {
    id: String,
    kind: ProviderKind,
    templates: Vec<UrlTemplate>,
}

impl ProviderAdapter {
    /// Builds an adapter from a provider identifier and its URL templates.
    ///
    /// An empty `urls` list selects the provider's default template. All
    /// validation happens here, so a constructed adapter cannot fail later.
    pub fn new<S: AsRef<str>>(id: &str, urls: &[S]) -> Result<Self, ProviderError> {
        let kind = ProviderKind::from_id(id)?;

        let templates = if urls.is_empty() {
            vec![UrlTemplate::parse(kind.default_template())?]
        } else {
            urls.iter()
                .map(|url| UrlTemplate::parse(url.as_ref()))
                .collect::<Result<Vec<_>, _>>()?
        };

        for template in &templates {
            kind.validate(template)?;
        }

        Ok(Self {
            id: id.to_string(),
            kind,
            templates,
        })
    }

    /// The identifier the layer was declared with.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> ProviderKind {
        self.kind
    }

    /// Number of candidate templates.
    pub fn template_count(&self) -> usize {
        self.templates.len()
    }

    /// URL for `tile` on the given attempt (0-based).
    pub fn url_for(&self, tile: &TileIndex, attempt: u32) -> String {
        let count = self.templates.len();
        let primary = (tile.x as usize + tile.y as usize) % count;
        let slot = (primary + attempt as usize) % count;
        self.templates[slot].render(tile)
    }

    /// All candidate URLs for `tile`, primary first.
    pub fn urls_for(&self, tile: &TileIndex) -> Vec<String> {
        (0..self.templates.len() as u32)
            .map(|attempt| self.url_for(tile, attempt))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_provider_ids() {
        assert_eq!(ProviderKind::from_id("osm").unwrap(), ProviderKind::Xyz);
        assert_eq!(ProviderKind::from_id("XYZ").unwrap(), ProviderKind::Xyz);
        assert_eq!(ProviderKind::from_id("bing").unwrap(), ProviderKind::Quadkey);
        assert_eq!(
            ProviderKind::from_id("quadkey").unwrap(),
            ProviderKind::Quadkey
        );
    }

    #[test]
    fn test_unknown_provider_id() {
        let result = ProviderAdapter::new::<&str>("mapquest", &[]);
        assert!(matches!(result, Err(ProviderError::UnknownProvider(_))));
    }

    #[test]
    fn test_default_templates() {
        let osm = ProviderAdapter::new::<&str>("osm", &[]).unwrap();
        assert_eq!(
            osm.url_for(&TileIndex::new(172, 300, 9), 0),
            "https://tile.openstreetmap.org/9/172/300.png"
        );

        let bing = ProviderAdapter::new::<&str>("bing", &[]).unwrap();
        assert_eq!(
            bing.url_for(&TileIndex::new(3, 5, 3), 0),
            "https://ecn.t0.tiles.virtualearth.net/tiles/a213.jpeg?g=1"
        );
    }

    #[test]
    fn test_xyz_template_must_have_all_placeholders() {
        let result = ProviderAdapter::new("osm", &["https://x/${z}/${x}.png"]);
        assert!(matches!(
            result,
            Err(ProviderError::MalformedTemplate { .. })
        ));
    }

    #[test]
    fn test_quadkey_template_must_have_quadkey() {
        let result = ProviderAdapter::new("bing", &["https://x/${z}/${x}/${y}.png"]);
        assert!(matches!(
            result,
            Err(ProviderError::MalformedTemplate { .. })
        ));
    }

    #[test]
    fn test_round_robin_and_fallback() {
        let adapter = ProviderAdapter::new(
            "osm",
            &["https://a/${z}/${x}/${y}.png", "https://b/${z}/${x}/${y}.png"],
        )
        .unwrap();

        let even = TileIndex::new(2, 2, 3);
        let odd = TileIndex::new(3, 2, 3);
        assert!(adapter.url_for(&even, 0).starts_with("https://a/"));
        assert!(adapter.url_for(&odd, 0).starts_with("https://b/"));

        // Retries move to the other mirror
        assert!(adapter.url_for(&even, 1).starts_with("https://b/"));
        assert!(adapter.url_for(&even, 2).starts_with("https://a/"));

        let candidates = adapter.urls_for(&odd);
        assert_eq!(candidates.len(), 2);
        assert!(candidates[0].starts_with("https://b/"));
        assert!(candidates[1].starts_with("https://a/"));
    }
}
