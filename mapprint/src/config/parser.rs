//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This is the single place where INI key names are mapped to struct fields.

use ini::Ini;
use image::Rgba;
use std::path::PathBuf;
use std::str::FromStr;

use super::file::ConfigFileError;
use super::settings::ConfigFile;
use crate::compositor::ResampleFilter;
use crate::overlay::Rgba8;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [fetch] section
    if let Some(section) = ini.section(Some("fetch")) {
        if let Some(v) = section.get("concurrency") {
            config.fetch.concurrency = parse_positive("fetch", "concurrency", v)?;
        }
        if let Some(v) = section.get("max_attempts") {
            config.fetch.max_attempts = parse_positive("fetch", "max_attempts", v)?;
        }
        if let Some(v) = section.get("timeout_secs") {
            config.fetch.timeout_secs = parse_positive("fetch", "timeout_secs", v)?;
        }
        if let Some(v) = section.get("backoff_ms") {
            config.fetch.backoff_ms = v.trim().parse().map_err(|_| invalid(
                "fetch",
                "backoff_ms",
                v,
                "must be a non-negative integer (milliseconds)",
            ))?;
        }
        if let Some(v) = section.get("user_agent") {
            let v = v.trim();
            if !v.is_empty() {
                config.fetch.user_agent = v.to_string();
            }
        }
    }

    // [render] section
    if let Some(section) = ini.section(Some("render")) {
        if let Some(v) = section.get("placeholder") {
            config.render.placeholder = parse_color(v)
                .ok_or_else(|| invalid("render", "placeholder", v, "expected '#rrggbb' or '#rrggbbaa'"))?;
        }
        if let Some(v) = section.get("resample") {
            config.render.resample = ResampleFilter::from_name(v)
                .ok_or_else(|| invalid("render", "resample", v, "must be 'bilinear' or 'nearest'"))?;
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("directory") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.directory = expand_tilde(v);
            }
        }
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.file = v.to_string();
            }
        }
    }

    Ok(config)
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_positive<T>(section: &str, key: &str, value: &str) -> Result<T, ConfigFileError>
where
    T: FromStr + PartialOrd + Default,
{
    match value.trim().parse::<T>() {
        Ok(n) if n > T::default() => Ok(n),
        _ => Err(invalid(section, key, value, "must be a positive integer")),
    }
}

fn parse_color(value: &str) -> Option<Rgba<u8>> {
    let value = value.trim();
    if !value.starts_with('#') {
        return None;
    }
    Rgba8::parse(value).map(|c| Rgba([c.r, c.g, c.b, c.a]))
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::DEFAULT_MAX_ATTEMPTS;

    fn parse(text: &str) -> Result<ConfigFile, ConfigFileError> {
        let ini = Ini::load_from_str(text).unwrap();
        parse_ini(&ini)
    }

    #[test]
    fn test_empty_ini_gives_defaults() {
        assert_eq!(parse("").unwrap(), ConfigFile::default());
    }

    #[test]
    fn test_all_sections() {
        let config = parse(
            "[fetch]\nconcurrency = 4\nmax_attempts = 5\ntimeout_secs = 20\nbackoff_ms = 0\nuser_agent = my-maps/1.0\n\
             [render]\nplaceholder = #ff00ff\nresample = nearest\n\
             [logging]\ndirectory = /var/log/mapprint\nfile = render.log\n",
        )
        .unwrap();

        assert_eq!(config.fetch.concurrency, 4);
        assert_eq!(config.fetch.max_attempts, 5);
        assert_eq!(config.fetch.timeout_secs, 20);
        assert_eq!(config.fetch.backoff_ms, 0);
        assert_eq!(config.fetch.user_agent, "my-maps/1.0");
        assert_eq!(config.render.placeholder, Rgba([255, 0, 255, 255]));
        assert_eq!(config.render.resample, ResampleFilter::Nearest);
        assert_eq!(config.logging.directory, PathBuf::from("/var/log/mapprint"));
        assert_eq!(config.logging.file, "render.log");
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config = parse("[fetch]\nconcurrency = 2\n").unwrap();
        assert_eq!(config.fetch.concurrency, 2);
        assert_eq!(config.fetch.max_attempts, DEFAULT_MAX_ATTEMPTS);
    }

    #[test]
    fn test_translucent_placeholder() {
        let config = parse("[render]\nplaceholder = #00000080\n").unwrap();
        assert_eq!(config.render.placeholder, Rgba([0, 0, 0, 0x80]));
    }

    #[test]
    fn test_invalid_values() {
        for (text, key) in [
            ("[fetch]\nconcurrency = 0\n", "concurrency"),
            ("[fetch]\nmax_attempts = many\n", "max_attempts"),
            ("[fetch]\nbackoff_ms = -5\n", "backoff_ms"),
            ("[render]\nplaceholder = magenta\n", "placeholder"),
            ("[render]\nresample = bicubic\n", "resample"),
        ] {
            match parse(text) {
                Err(ConfigFileError::InvalidValue { key: k, .. }) => assert_eq!(k, key),
                other => panic!("{}: expected InvalidValue, got {:?}", key, other),
            }
        }
    }

    #[test]
    fn test_expand_tilde() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_tilde("~/logs"), home.join("logs"));
        }
        assert_eq!(expand_tilde("/tmp/logs"), PathBuf::from("/tmp/logs"));
    }
}
