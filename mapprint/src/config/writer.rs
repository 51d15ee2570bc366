//! INI serialization logic for converting `ConfigFile` → INI string.

use std::path::Path;

use super::settings::ConfigFile;
use crate::compositor::ResampleFilter;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let [r, g, b, a] = config.render.placeholder.0;
    let resample = match config.render.resample {
        ResampleFilter::Bilinear => "bilinear",
        ResampleFilter::Nearest => "nearest",
    };

    format!(
        r#"[fetch]
; Maximum tile requests in flight, shared by all layers of a map
concurrency = {}
; Attempts per tile before it is drawn as a placeholder
max_attempts = {}
; Timeout for a single tile request (seconds)
timeout_secs = {}
; Base delay between attempts, doubled after each failure (milliseconds)
backoff_ms = {}
; User-Agent sent to tile servers
user_agent = {}

[render]
; Fill color for tiles that could not be fetched (#rrggbb or #rrggbbaa)
placeholder = #{:02x}{:02x}{:02x}{:02x}
; Filter used when a layer is drawn at a different zoom than the map:
;   bilinear - smooth interpolation
;   nearest  - blocky, keeps hard edges
resample = {}

[logging]
; Log directory (relative paths resolve against the working directory)
directory = {}
; Log file name, truncated on every run
file = {}
"#,
        config.fetch.concurrency,
        config.fetch.max_attempts,
        config.fetch.timeout_secs,
        config.fetch.backoff_ms,
        config.fetch.user_agent,
        r,
        g,
        b,
        a,
        resample,
        path_to_string(&config.logging.directory),
        config.logging.file,
    )
}

/// Convert path to string, collapsing home dir to ~.
fn path_to_string(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(stripped) = path.strip_prefix(&home) {
            return format!("~/{}", stripped.display());
        }
    }
    path.display().to_string()
}
