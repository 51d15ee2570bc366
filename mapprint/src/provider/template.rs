//! Tile URL templates.
//!
//! Templates carry placeholders written either as `${name}` or `{name}`:
//!
//! | Placeholder | Substituted with                          |
//! |-------------|-------------------------------------------|
//! | `z`         | zoom level                                |
//! | `x`, `y`    | tile column / row                         |
//! | `quadkey`   | base-4 quadkey of the tile                |
//! | `s`         | round-robin subdomain (`a`, `b` or `c`)   |
//!
//! A bare `{` that does not start a known placeholder is kept literally; an
//! unknown or unterminated `${...}` is a template error.

use super::types::ProviderError;
use crate::coord::{tile_to_quadkey, TileIndex};

const SUBDOMAINS: [&str; 3] = ["a", "b", "c"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Placeholder {
    Zoom,
    X,
    Y,
    Quadkey,
    Subdomain,
}

impl Placeholder {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "z" => Some(Placeholder::Zoom),
            "x" => Some(Placeholder::X),
            "y" => Some(Placeholder::Y),
            "quadkey" => Some(Placeholder::Quadkey),
            "s" => Some(Placeholder::Subdomain),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Token(Placeholder),
}

/// A parsed tile URL template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlTemplate {
    raw: String,
    segments: Vec<Segment>,
}

impl UrlTemplate {
    /// Parses a template string.
    pub fn parse(raw: &str) -> Result<Self, ProviderError> {
        let malformed = |reason: String| ProviderError::MalformedTemplate {
            template: raw.to_string(),
            reason,
        };

        if raw.trim().is_empty() {
            return Err(malformed("template is empty".to_string()));
        }

        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = raw;

        while let Some(pos) = rest.find('{') {
            let dollar = pos > 0 && rest.as_bytes()[pos - 1] == b'$';
            let after = &rest[pos + 1..];

            let parsed = after.find('}').and_then(|end| {
                Placeholder::from_name(&after[..end]).map(|token| (token, end))
            });

            match parsed {
                Some((token, end)) => {
                    let keep = if dollar { pos - 1 } else { pos };
                    literal.push_str(&rest[..keep]);
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Token(token));
                    rest = &after[end + 1..];
                }
                None if dollar => {
                    let reason = match after.find('}') {
                        Some(end) => format!("unknown placeholder '${{{}}}'", &after[..end]),
                        None => "unterminated '${' placeholder".to_string(),
                    };
                    return Err(malformed(reason));
                }
                None => {
                    literal.push_str(&rest[..=pos]);
                    rest = after;
                }
            }
        }

        literal.push_str(rest);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    /// The template as written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub(crate) fn contains(&self, placeholder: Placeholder) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s, Segment::Token(t) if *t == placeholder))
    }

    /// Substitutes every placeholder for `tile`.
    pub fn render(&self, tile: &TileIndex) -> String {
        let mut url = String::with_capacity(self.raw.len() + 16);
        let mut quadkey: Option<String> = None;

        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => url.push_str(text),
                Segment::Token(Placeholder::Zoom) => url.push_str(&tile.zoom.to_string()),
                Segment::Token(Placeholder::X) => url.push_str(&tile.x.to_string()),
                Segment::Token(Placeholder::Y) => url.push_str(&tile.y.to_string()),
                Segment::Token(Placeholder::Quadkey) => {
                    url.push_str(quadkey.get_or_insert_with(|| tile_to_quadkey(tile)))
                }
                Segment::Token(Placeholder::Subdomain) => {
                    let slot = (tile.x as usize + tile.y as usize) % SUBDOMAINS.len();
                    url.push_str(SUBDOMAINS[slot]);
                }
            }
        }

        url
    }
}
