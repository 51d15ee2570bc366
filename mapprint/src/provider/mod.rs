//! Web map tile provider abstraction
//!
//! This module turns tile indices into fetchable URLs and provides the HTTP
//! client used to download them.
//!
//! ```
//! use mapprint::coord::TileIndex;
//! use mapprint::provider::ProviderAdapter;
//!
//! let adapter = ProviderAdapter::new("osm", &["https://tile.osm.org/${z}/${x}/${y}.png"]).unwrap();
//! let url = adapter.url_for(&TileIndex::new(172, 300, 9), 0);
//! assert_eq!(url, "https://tile.osm.org/9/172/300.png");
//! ```

mod factory;
mod http;
mod template;
mod types;

pub use factory::{ProviderAdapter, ProviderKind};
pub use http::{AsyncHttpClient, AsyncReqwestClient, DEFAULT_USER_AGENT};
pub use template::UrlTemplate;
pub use types::ProviderError;

#[cfg(test)]
pub use http::tests::{MockAsyncHttpClient, ScriptedHttpClient};
