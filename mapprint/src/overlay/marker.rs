//! Marker image lookup for point features.

use super::GeometryError;
use image::RgbaImage;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Resolves a marker reference to a decoded image.
pub trait MarkerResolver: Send + Sync {
    fn resolve(&self, reference: &str) -> Result<RgbaImage, GeometryError>;
}

/// Returns true for marker references that name an http(s) URL.
pub fn is_remote(reference: &str) -> bool {
    reference.starts_with("http://") || reference.starts_with("https://")
}

/// Loads markers from the local filesystem.
///
/// Relative references are resolved against the base directory. Remote
/// references are downloaded by the renderer before drawing and never reach
/// this resolver.
#[derive(Debug, Clone)]
pub struct FileMarkerResolver {
    base_dir: PathBuf,
}

impl FileMarkerResolver {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn path_for(&self, reference: &str) -> PathBuf {
        let reference = reference.strip_prefix("file://").unwrap_or(reference);
        let path = Path::new(reference);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }
}

impl Default for FileMarkerResolver {
    fn default() -> Self {
        Self::new(".")
    }
}

impl MarkerResolver for FileMarkerResolver {
    fn resolve(&self, reference: &str) -> Result<RgbaImage, GeometryError> {
        let missing = |reason: String| GeometryError::MissingMarker {
            reference: reference.to_string(),
            reason,
        };

        if is_remote(reference) {
            return Err(missing("remote marker was not downloaded".to_string()));
        }

        let path = self.path_for(reference);
        debug!(path = %path.display(), "Loading marker image");
        let img = image::open(&path).map_err(|e| missing(e.to_string()))?;
        Ok(img.to_rgba8())
    }
}

/// Serves pre-decoded markers by name.
#[derive(Debug, Clone, Default)]
pub struct MemoryMarkerResolver {
    markers: HashMap<String, RgbaImage>,
}

impl MemoryMarkerResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_marker(mut self, reference: impl Into<String>, image: RgbaImage) -> Self {
        self.markers.insert(reference.into(), image);
        self
    }

    pub fn insert(&mut self, reference: impl Into<String>, image: RgbaImage) {
        self.markers.insert(reference.into(), image);
    }
}

impl MarkerResolver for MemoryMarkerResolver {
    fn resolve(&self, reference: &str) -> Result<RgbaImage, GeometryError> {
        self.markers
            .get(reference)
            .cloned()
            .ok_or_else(|| GeometryError::MissingMarker {
                reference: reference.to_string(),
                reason: "not registered".to_string(),
            })
    }
}

/// Serves downloaded marker bytes, deferring other references to a fallback.
///
/// Bytes are decoded on lookup so decoding stays off the async runtime.
pub struct PrefetchedMarkers {
    downloads: HashMap<String, Result<Vec<u8>, String>>,
    fallback: Arc<dyn MarkerResolver>,
}

impl PrefetchedMarkers {
    pub fn new(fallback: Arc<dyn MarkerResolver>) -> Self {
        Self {
            downloads: HashMap::new(),
            fallback,
        }
    }

    /// Records the download outcome for `reference`.
    pub fn insert(&mut self, reference: impl Into<String>, download: Result<Vec<u8>, String>) {
        self.downloads.insert(reference.into(), download);
    }

    pub fn len(&self) -> usize {
        self.downloads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.downloads.is_empty()
    }
}

impl MarkerResolver for PrefetchedMarkers {
    fn resolve(&self, reference: &str) -> Result<RgbaImage, GeometryError> {
        let Some(download) = self.downloads.get(reference) else {
            return self.fallback.resolve(reference);
        };
        let missing = |reason: String| GeometryError::MissingMarker {
            reference: reference.to_string(),
            reason,
        };
        let bytes = download.as_ref().map_err(|e| missing(e.clone()))?;
        let img = image::load_from_memory(bytes).map_err(|e| missing(e.to_string()))?;
        Ok(img.to_rgba8())
    }
}

/// Memoizes resolved markers, including failures, for one render.
pub(crate) struct MarkerCache<'a> {
    resolver: &'a dyn MarkerResolver,
    entries: HashMap<String, Result<RgbaImage, GeometryError>>,
}

impl<'a> MarkerCache<'a> {
    pub(crate) fn new(resolver: &'a dyn MarkerResolver) -> Self {
        Self {
            resolver,
            entries: HashMap::new(),
        }
    }

    pub(crate) fn get(&mut self, reference: &str) -> Result<&RgbaImage, GeometryError> {
        let resolver = self.resolver;
        self.entries
            .entry(reference.to_string())
            .or_insert_with(|| resolver.resolve(reference))
            .as_ref()
            .map_err(Clone::clone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_file_resolver_relative_to_base() {
        let dir = tempfile::tempdir().unwrap();
        let marker = RgbaImage::from_pixel(4, 6, Rgba([1, 2, 3, 255]));
        marker.save(dir.path().join("pin.png")).unwrap();

        let resolver = FileMarkerResolver::new(dir.path());

        let loaded = resolver.resolve("pin.png").unwrap();
        assert_eq!(loaded.dimensions(), (4, 6));
        assert_eq!(loaded.get_pixel(0, 0), &Rgba([1, 2, 3, 255]));

        let absolute = dir.path().join("pin.png");
        assert!(resolver.resolve(absolute.to_str().unwrap()).is_ok());
    }

    #[test]
    fn test_file_resolver_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = FileMarkerResolver::new(dir.path());

        assert!(matches!(
            resolver.resolve("nope.png"),
            Err(GeometryError::MissingMarker { .. })
        ));
        assert!(resolver.resolve("https://example.com/pin.png").is_err());
    }

    #[test]
    fn test_memory_resolver() {
        let resolver = MemoryMarkerResolver::new().with_marker("pin", RgbaImage::new(2, 2));
        assert!(resolver.resolve("pin").is_ok());
        assert!(resolver.resolve("flag").is_err());
    }

    #[test]
    fn test_prefetched_markers_decode_and_fall_back() {
        let mut png = std::io::Cursor::new(Vec::new());
        RgbaImage::from_pixel(2, 3, Rgba([9, 9, 9, 255]))
            .write_to(&mut png, image::ImageFormat::Png)
            .unwrap();

        let fallback = MemoryMarkerResolver::new().with_marker("local", RgbaImage::new(1, 1));
        let mut markers = PrefetchedMarkers::new(Arc::new(fallback));
        markers.insert("https://cdn.test/pin.png", Ok(png.into_inner()));
        markers.insert("https://cdn.test/bad.png", Ok(b"not an image".to_vec()));
        markers.insert("https://cdn.test/gone.png", Err("HTTP 404".to_string()));

        assert_eq!(markers.resolve("https://cdn.test/pin.png").unwrap().dimensions(), (2, 3));
        assert!(markers.resolve("local").is_ok());
        assert!(matches!(
            markers.resolve("https://cdn.test/bad.png"),
            Err(GeometryError::MissingMarker { .. })
        ));
        match markers.resolve("https://cdn.test/gone.png") {
            Err(GeometryError::MissingMarker { reason, .. }) => assert_eq!(reason, "HTTP 404"),
            other => panic!("expected MissingMarker, got {:?}", other),
        }
    }

    #[test]
    fn test_is_remote() {
        assert!(is_remote("https://cdn.test/pin.png"));
        assert!(is_remote("http://cdn.test/pin.png"));
        assert!(!is_remote("file:///tmp/pin.png"));
        assert!(!is_remote("icons/pin.png"));
    }

    #[test]
    fn test_cache_resolves_once() {
        struct Counting(AtomicUsize);
        impl MarkerResolver for Counting {
            fn resolve(&self, reference: &str) -> Result<RgbaImage, GeometryError> {
                self.0.fetch_add(1, Ordering::SeqCst);
                if reference == "bad" {
                    return Err(GeometryError::NoMarkerImage);
                }
                Ok(RgbaImage::new(1, 1))
            }
        }

        let resolver = Counting(AtomicUsize::new(0));
        let mut cache = MarkerCache::new(&resolver);
        for _ in 0..3 {
            assert!(cache.get("pin").is_ok());
            assert!(cache.get("bad").is_err());
        }
        assert_eq!(resolver.0.load(Ordering::SeqCst), 2);
    }
}
