//! Feature styling.
//!
//! Styles are read from a feature's `properties` using the Leaflet path
//! option names (`color`, `weight`, `fillOpacity`, ...). Missing keys take
//! Leaflet's defaults.

use super::GeometryError;
use serde_json::{Map, Value};

/// Default stroke and fill color (`#3388ff`).
pub const DEFAULT_COLOR: Rgba8 = Rgba8 {
    r: 0x33,
    g: 0x88,
    b: 0xff,
    a: 0xff,
};
pub const DEFAULT_WEIGHT: f32 = 3.0;
pub const DEFAULT_FILL_OPACITY: f32 = 0.2;

/// Straight-alpha 8-bit color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parses `#rgb`, `#rrggbb`, `#rrggbbaa` or a basic CSS color name.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if let Some(hex) = text.strip_prefix('#') {
            return Self::parse_hex(hex);
        }
        let named = match text.to_ascii_lowercase().as_str() {
            "black" => Self::new(0, 0, 0, 255),
            "white" => Self::new(255, 255, 255, 255),
            "red" => Self::new(255, 0, 0, 255),
            "green" => Self::new(0, 128, 0, 255),
            "blue" => Self::new(0, 0, 255, 255),
            "yellow" => Self::new(255, 255, 0, 255),
            "orange" => Self::new(255, 165, 0, 255),
            "purple" => Self::new(128, 0, 128, 255),
            "gray" | "grey" => Self::new(128, 128, 128, 255),
            "transparent" => Self::new(0, 0, 0, 0),
            _ => return None,
        };
        Some(named)
    }

    fn parse_hex(hex: &str) -> Option<Self> {
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        match hex.len() {
            3 => {
                let nibble = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|v| v * 17);
                Some(Self::new(nibble(0)?, nibble(1)?, nibble(2)?, 255))
            }
            6 => Some(Self::new(byte(0)?, byte(2)?, byte(4)?, 255)),
            8 => Some(Self::new(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
            _ => None,
        }
    }

    /// This color with its alpha multiplied by `opacity`.
    pub fn with_opacity(self, opacity: f32) -> Self {
        let a = (self.a as f32 * opacity.clamp(0.0, 1.0)).round() as u8;
        Self { a, ..self }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FillRule {
    #[default]
    EvenOdd,
    NonZero,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineCap {
    Butt,
    #[default]
    Round,
    Square,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineJoin {
    Miter,
    #[default]
    Round,
    Bevel,
}

/// Drawing style of one feature.
#[derive(Debug, Clone, PartialEq)]
pub struct Style {
    pub stroke: bool,
    pub color: Rgba8,
    /// Stroke width in output pixels
    pub weight: f32,
    pub opacity: f32,
    pub fill: bool,
    pub fill_color: Rgba8,
    pub fill_opacity: f32,
    pub fill_rule: FillRule,
    /// On/off lengths, always even in count
    pub dash_array: Option<Vec<f32>>,
    pub line_cap: LineCap,
    pub line_join: LineJoin,
    /// Marker image reference, for points
    pub image: Option<String>,
    /// Marker pixel placed on the point; marker center when unset
    pub icon_anchor: Option<(f32, f32)>,
}

impl Style {
    /// Defaults for a line (`fill` off).
    pub fn line() -> Self {
        Self {
            stroke: true,
            color: DEFAULT_COLOR,
            weight: DEFAULT_WEIGHT,
            opacity: 1.0,
            fill: false,
            fill_color: DEFAULT_COLOR,
            fill_opacity: DEFAULT_FILL_OPACITY,
            fill_rule: FillRule::default(),
            dash_array: None,
            line_cap: LineCap::default(),
            line_join: LineJoin::default(),
            image: None,
            icon_anchor: None,
        }
    }

    /// Defaults for a polygon (`fill` on).
    pub fn polygon() -> Self {
        Self {
            fill: true,
            ..Self::line()
        }
    }

    /// Reads a style from feature properties over `defaults`.
    pub fn from_properties(
        properties: Option<&Map<String, Value>>,
        defaults: Style,
    ) -> Result<Self, GeometryError> {
        let mut style = defaults;
        let Some(props) = properties else {
            return Ok(style);
        };

        if let Some(v) = props.get("stroke") {
            style.stroke = read_bool("stroke", v)?;
        }
        if let Some(v) = props.get("color") {
            style.color = read_color("color", v)?;
        }
        if let Some(v) = props.get("weight") {
            style.weight = read_number("weight", v)?;
        }
        if let Some(v) = props.get("opacity") {
            style.opacity = read_unit("opacity", v)?;
        }
        if let Some(v) = props.get("fill") {
            style.fill = read_bool("fill", v)?;
        }
        style.fill_color = match props.get("fillColor") {
            Some(v) => read_color("fillColor", v)?,
            None => style.color,
        };
        if let Some(v) = props.get("fillOpacity") {
            style.fill_opacity = read_unit("fillOpacity", v)?;
        }
        if let Some(v) = props.get("fillRule") {
            style.fill_rule = match read_str("fillRule", v)?.to_ascii_lowercase().as_str() {
                "evenodd" => FillRule::EvenOdd,
                "nonzero" => FillRule::NonZero,
                _ => return Err(GeometryError::style("fillRule", v)),
            };
        }
        if let Some(v) = props.get("dashArray") {
            style.dash_array = read_dash_array(v)?;
        }
        if let Some(v) = props.get("lineCap") {
            style.line_cap = match read_str("lineCap", v)? {
                "butt" => LineCap::Butt,
                "round" => LineCap::Round,
                "square" => LineCap::Square,
                _ => return Err(GeometryError::style("lineCap", v)),
            };
        }
        if let Some(v) = props.get("lineJoin") {
            style.line_join = match read_str("lineJoin", v)? {
                "miter" => LineJoin::Miter,
                "round" => LineJoin::Round,
                "bevel" => LineJoin::Bevel,
                _ => return Err(GeometryError::style("lineJoin", v)),
            };
        }
        if let Some(v) = props.get("image") {
            style.image = Some(read_str("image", v)?.to_string());
        }
        if let Some(v) = props.get("iconAnchor") {
            style.icon_anchor = Some(read_anchor(v)?);
        }

        Ok(style)
    }

    /// Effective stroke color, with `opacity` applied.
    pub fn stroke_color(&self) -> Rgba8 {
        self.color.with_opacity(self.opacity)
    }

    /// Effective fill color, with `fillOpacity` applied.
    pub fn effective_fill_color(&self) -> Rgba8 {
        self.fill_color.with_opacity(self.fill_opacity)
    }
}

fn read_bool(key: &str, v: &Value) -> Result<bool, GeometryError> {
    match v {
        Value::Bool(b) => Ok(*b),
        Value::String(s) if s == "true" => Ok(true),
        Value::String(s) if s == "false" => Ok(false),
        _ => Err(GeometryError::style(key, v)),
    }
}

fn read_str<'a>(key: &str, v: &'a Value) -> Result<&'a str, GeometryError> {
    v.as_str().ok_or_else(|| GeometryError::style(key, v))
}

/// Non-negative number, given as a JSON number or numeric string.
fn read_number(key: &str, v: &Value) -> Result<f32, GeometryError> {
    let n = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match n {
        Some(n) if n.is_finite() && n >= 0.0 => Ok(n as f32),
        _ => Err(GeometryError::style(key, v)),
    }
}

fn read_unit(key: &str, v: &Value) -> Result<f32, GeometryError> {
    let n = read_number(key, v)?;
    if n > 1.0 {
        return Err(GeometryError::style(key, v));
    }
    Ok(n)
}

fn read_color(key: &str, v: &Value) -> Result<Rgba8, GeometryError> {
    read_str(key, v)
        .ok()
        .and_then(Rgba8::parse)
        .ok_or_else(|| GeometryError::style(key, v))
}

/// Dash lengths from `"5, 10"`, `"5 10"` or `[5, 10]`.
///
/// Odd-length lists are repeated, as SVG does. `null`, an empty list or all
/// zeros mean a solid line.
fn read_dash_array(v: &Value) -> Result<Option<Vec<f32>>, GeometryError> {
    let mut dashes: Vec<f32> = match v {
        Value::Null => return Ok(None),
        Value::String(s) => s
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|part| !part.is_empty())
            .map(|part| part.parse::<f32>().map_err(|_| GeometryError::style("dashArray", v)))
            .collect::<Result<_, _>>()?,
        Value::Array(items) => items
            .iter()
            .map(|item| read_number("dashArray", item))
            .collect::<Result<_, _>>()?,
        _ => return Err(GeometryError::style("dashArray", v)),
    };

    if dashes.iter().any(|d| !d.is_finite() || *d < 0.0) {
        return Err(GeometryError::style("dashArray", v));
    }
    if dashes.iter().all(|d| *d == 0.0) {
        return Ok(None);
    }
    if dashes.len() % 2 == 1 {
        dashes.extend_from_within(..);
    }
    Ok(Some(dashes))
}

fn read_anchor(v: &Value) -> Result<(f32, f32), GeometryError> {
    let err = || GeometryError::style("iconAnchor", v);
    let items = v.as_array().ok_or_else(err)?;
    if items.len() != 2 {
        return Err(err());
    }
    let x = items[0].as_f64().ok_or_else(err)?;
    let y = items[1].as_f64().ok_or_else(err)?;
    Ok((x as f32, y as f32))
}
