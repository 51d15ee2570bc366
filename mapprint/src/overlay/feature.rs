//! Vector features parsed from a GeoJSON-style payload.
//!
//! The payload may be a `FeatureCollection`, a single `Feature`, or a bare
//! array of features. Multi-geometries and geometry collections are expanded
//! into simple parts sharing the parent feature's style. A feature that
//! cannot be parsed is recorded as skipped; only an unreadable collection is
//! an error.

use super::style::Style;
use super::{GeometryError, SkippedFeature};
use crate::coord::GeoPoint;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::warn;

/// Axis order of positions in the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoordinateOrder {
    /// `[longitude, latitude]`, as GeoJSON specifies
    #[default]
    LonLat,
    /// `[latitude, longitude]`
    LatLon,
}

/// A drawable feature.
#[derive(Debug, Clone, PartialEq)]
pub enum GeoFeature {
    Point {
        position: GeoPoint,
        style: Style,
    },
    LineString {
        points: Vec<GeoPoint>,
        style: Style,
    },
    /// Outer ring first, then holes
    Polygon {
        rings: Vec<Vec<GeoPoint>>,
        style: Style,
    },
}

impl GeoFeature {
    pub fn style(&self) -> &Style {
        match self {
            GeoFeature::Point { style, .. }
            | GeoFeature::LineString { style, .. }
            | GeoFeature::Polygon { style, .. } => style,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            GeoFeature::Point { .. } => "Point",
            GeoFeature::LineString { .. } => "LineString",
            GeoFeature::Polygon { .. } => "Polygon",
        }
    }
}

/// Features ready to draw, plus those rejected while parsing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureCollection {
    /// Parts in declaration order, each with the index of its input feature
    pub features: Vec<(usize, GeoFeature)>,
    pub skipped: Vec<SkippedFeature>,
}

impl FeatureCollection {
    /// Parses a payload given as JSON text.
    pub fn parse_str(text: &str, order: CoordinateOrder) -> Result<Self, GeometryError> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| GeometryError::InvalidPayload(e.to_string()))?;
        Self::parse(&value, order)
    }

    /// Parses a payload already decoded as JSON.
    ///
    /// A JSON string is treated as embedded JSON text.
    pub fn parse(value: &Value, order: CoordinateOrder) -> Result<Self, GeometryError> {
        let features: Vec<&Value> = match value {
            Value::Null => Vec::new(),
            Value::String(text) => return Self::parse_str(text, order),
            Value::Array(items) => items.iter().collect(),
            Value::Object(obj) => match obj.get("type").and_then(Value::as_str) {
                Some("FeatureCollection") => match obj.get("features") {
                    Some(Value::Array(items)) => items.iter().collect(),
                    _ => {
                        return Err(GeometryError::InvalidPayload(
                            "FeatureCollection without a features array".to_string(),
                        ))
                    }
                },
                Some("Feature") => vec![value],
                other => {
                    return Err(GeometryError::InvalidPayload(format!(
                        "expected FeatureCollection or Feature, found {}",
                        other.unwrap_or("untyped object")
                    )))
                }
            },
            _ => {
                return Err(GeometryError::InvalidPayload(
                    "overlay must be a JSON object, array or string".to_string(),
                ))
            }
        };

        let mut collection = FeatureCollection::default();
        for (index, feature) in features.into_iter().enumerate() {
            match parse_feature(feature, order) {
                Ok(parts) => collection
                    .features
                    .extend(parts.into_iter().map(|part| (index, part))),
                Err(error) => {
                    warn!(feature = index, error = %error, "Skipping overlay feature");
                    collection.skipped.push(SkippedFeature { index, error });
                }
            }
        }
        Ok(collection)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

fn parse_feature(feature: &Value, order: CoordinateOrder) -> Result<Vec<GeoFeature>, GeometryError> {
    let obj = feature
        .as_object()
        .ok_or_else(|| GeometryError::MalformedCoordinates("feature is not an object".to_string()))?;
    let properties = obj.get("properties").and_then(Value::as_object);
    let geometry = match obj.get("geometry") {
        Some(Value::Object(geometry)) => geometry,
        Some(Value::Null) | None => return Ok(Vec::new()),
        Some(_) => {
            return Err(GeometryError::MalformedCoordinates(
                "geometry is not an object".to_string(),
            ))
        }
    };

    let mut parts = Vec::new();
    parse_geometry(geometry, properties, order, &mut parts)?;
    Ok(parts)
}

fn parse_geometry(
    geometry: &Map<String, Value>,
    properties: Option<&Map<String, Value>>,
    order: CoordinateOrder,
    parts: &mut Vec<GeoFeature>,
) -> Result<(), GeometryError> {
    let kind = geometry
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| GeometryError::UnsupportedGeometry("<missing>".to_string()))?;

    if kind == "GeometryCollection" {
        let members = geometry
            .get("geometries")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                GeometryError::MalformedCoordinates("GeometryCollection without geometries".to_string())
            })?;
        for member in members {
            let member = member.as_object().ok_or_else(|| {
                GeometryError::MalformedCoordinates("geometry is not an object".to_string())
            })?;
            parse_geometry(member, properties, order, parts)?;
        }
        return Ok(());
    }

    let coords = geometry
        .get("coordinates")
        .ok_or_else(|| GeometryError::MalformedCoordinates(format!("{} without coordinates", kind)))?;

    match kind {
        "Point" => {
            let style = Style::from_properties(properties, Style::line())?;
            parts.push(GeoFeature::Point {
                position: position(coords, order)?,
                style,
            });
        }
        "MultiPoint" => {
            let style = Style::from_properties(properties, Style::line())?;
            for p in positions(coords, order)? {
                parts.push(GeoFeature::Point {
                    position: p,
                    style: style.clone(),
                });
            }
        }
        "LineString" => {
            let style = Style::from_properties(properties, Style::line())?;
            parts.push(GeoFeature::LineString {
                points: positions(coords, order)?,
                style,
            });
        }
        "MultiLineString" => {
            let style = Style::from_properties(properties, Style::line())?;
            for line in array(coords)? {
                parts.push(GeoFeature::LineString {
                    points: positions(line, order)?,
                    style: style.clone(),
                });
            }
        }
        "Polygon" => {
            let style = Style::from_properties(properties, Style::polygon())?;
            parts.push(GeoFeature::Polygon {
                rings: rings(coords, order)?,
                style,
            });
        }
        "MultiPolygon" => {
            let style = Style::from_properties(properties, Style::polygon())?;
            for polygon in array(coords)? {
                parts.push(GeoFeature::Polygon {
                    rings: rings(polygon, order)?,
                    style: style.clone(),
                });
            }
        }
        other => return Err(GeometryError::UnsupportedGeometry(other.to_string())),
    }
    Ok(())
}

fn array(v: &Value) -> Result<&Vec<Value>, GeometryError> {
    v.as_array()
        .ok_or_else(|| GeometryError::MalformedCoordinates(format!("expected an array, found {}", v)))
}

fn position(v: &Value, order: CoordinateOrder) -> Result<GeoPoint, GeometryError> {
    let items = array(v)?;
    let malformed = || GeometryError::MalformedCoordinates(format!("invalid position {}", v));
    if items.len() < 2 {
        return Err(malformed());
    }
    let a = items[0].as_f64().ok_or_else(malformed)?;
    let b = items[1].as_f64().ok_or_else(malformed)?;
    let (lat, lon) = match order {
        CoordinateOrder::LonLat => (b, a),
        CoordinateOrder::LatLon => (a, b),
    };
    GeoPoint::new(lat, lon).map_err(|e| GeometryError::MalformedCoordinates(e.to_string()))
}

fn positions(v: &Value, order: CoordinateOrder) -> Result<Vec<GeoPoint>, GeometryError> {
    array(v)?.iter().map(|p| position(p, order)).collect()
}

/// Polygon rings, accepting nested rings or a single bare ring.
fn rings(v: &Value, order: CoordinateOrder) -> Result<Vec<Vec<GeoPoint>>, GeometryError> {
    let items = array(v)?;
    let nested = items
        .first()
        .and_then(Value::as_array)
        .and_then(|first| first.first())
        .is_some_and(Value::is_array);

    if nested {
        items.iter().map(|ring| positions(ring, order)).collect()
    } else {
        Ok(vec![positions(v, order)?])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pt(lat: f64, lon: f64) -> GeoPoint {
        GeoPoint::new(lat, lon).unwrap()
    }

    #[test]
    fn test_feature_collection_in_declaration_order() {
        let payload = json!({
            "type": "FeatureCollection",
            "features": [
                { "type": "Feature", "properties": { "image": "pin.png" },
                  "geometry": { "type": "Point", "coordinates": [-55.43, -32.03] } },
                { "type": "Feature", "properties": {},
                  "geometry": { "type": "LineString", "coordinates": [[0, 0], [10, 5]] } },
                { "type": "Feature",
                  "geometry": { "type": "Polygon", "coordinates": [[[0, 0], [1, 0], [1, 1], [0, 0]]] } }
            ]
        });

        let parsed = FeatureCollection::parse(&payload, CoordinateOrder::LonLat).unwrap();

        assert_eq!(parsed.len(), 3);
        assert!(parsed.skipped.is_empty());
        match &parsed.features[0].1 {
            GeoFeature::Point { position, style } => {
                assert_eq!(*position, pt(-32.03, -55.43));
                assert_eq!(style.image.as_deref(), Some("pin.png"));
            }
            other => panic!("expected point, got {:?}", other),
        }
        assert_eq!(parsed.features[1].1.kind(), "LineString");
        assert!(!parsed.features[1].1.style().fill);
        assert_eq!(parsed.features[2].1.kind(), "Polygon");
        assert!(parsed.features[2].1.style().fill);
    }

    #[test]
    fn test_latlon_order() {
        let payload = json!({ "type": "Feature",
            "geometry": { "type": "Point", "coordinates": [-32.03, -55.43] } });

        let parsed = FeatureCollection::parse(&payload, CoordinateOrder::LatLon).unwrap();

        match &parsed.features[0].1 {
            GeoFeature::Point { position, .. } => assert_eq!(*position, pt(-32.03, -55.43)),
            other => panic!("expected point, got {:?}", other),
        }
    }

    #[test]
    fn test_string_payload() {
        let payload = Value::String(
            r#"{"type":"FeatureCollection","features":[{"type":"Feature","geometry":{"type":"Point","coordinates":[1,2]}}]}"#
                .to_string(),
        );
        let parsed = FeatureCollection::parse(&payload, CoordinateOrder::LonLat).unwrap();
        assert_eq!(parsed.len(), 1);
    }

    #[test]
    fn test_multi_geometries_expand() {
        let payload = json!([
            { "type": "Feature", "properties": { "color": "#ff0000" },
              "geometry": { "type": "MultiLineString", "coordinates": [[[0, 0], [1, 1]], [[2, 2], [3, 3]]] } },
            { "type": "Feature",
              "geometry": { "type": "MultiPolygon", "coordinates": [
                  [[[0, 0], [1, 0], [1, 1], [0, 0]]],
                  [[[5, 5], [6, 5], [6, 6], [5, 5]], [[5.2, 5.2], [5.8, 5.2], [5.8, 5.8], [5.2, 5.2]]]
              ] } },
            { "type": "Feature",
              "geometry": { "type": "GeometryCollection", "geometries": [
                  { "type": "Point", "coordinates": [0, 0] },
                  { "type": "MultiPoint", "coordinates": [[1, 1], [2, 2]] }
              ] } }
        ]);

        let parsed = FeatureCollection::parse(&payload, CoordinateOrder::LonLat).unwrap();

        let sources: Vec<usize> = parsed.features.iter().map(|(i, _)| *i).collect();
        assert_eq!(sources, vec![0, 0, 1, 1, 2, 2, 2]);
        assert_eq!(parsed.features[1].1.style().color.r, 255);
        match &parsed.features[3].1 {
            GeoFeature::Polygon { rings, .. } => assert_eq!(rings.len(), 2),
            other => panic!("expected polygon, got {:?}", other),
        }
    }

    #[test]
    fn test_bare_ring_polygon() {
        let payload = json!({ "type": "Feature",
            "geometry": { "type": "Polygon", "coordinates": [[0, 0], [1, 0], [1, 1]] } });

        let parsed = FeatureCollection::parse(&payload, CoordinateOrder::LonLat).unwrap();

        match &parsed.features[0].1 {
            GeoFeature::Polygon { rings, .. } => {
                assert_eq!(rings.len(), 1);
                assert_eq!(rings[0].len(), 3);
            }
            other => panic!("expected polygon, got {:?}", other),
        }
    }

    #[test]
    fn test_bad_features_are_skipped_not_fatal() {
        let payload = json!({
            "type": "FeatureCollection",
            "features": [
                { "type": "Feature", "geometry": { "type": "Point", "coordinates": [0] } },
                { "type": "Feature", "geometry": { "type": "Point", "coordinates": [0, 95] } },
                { "type": "Feature", "geometry": { "type": "Circle", "coordinates": [0, 0] } },
                { "type": "Feature", "properties": { "weight": "heavy" },
                  "geometry": { "type": "LineString", "coordinates": [[0, 0], [1, 1]] } },
                { "type": "Feature", "geometry": { "type": "LineString", "coordinates": [[0, 0], [1, 1]] } }
            ]
        });

        let parsed = FeatureCollection::parse(&payload, CoordinateOrder::LonLat).unwrap();

        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed.features[0].0, 4);
        let indices: Vec<usize> = parsed.skipped.iter().map(|s| s.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
        assert!(matches!(parsed.skipped[2].error, GeometryError::UnsupportedGeometry(_)));
        assert!(matches!(parsed.skipped[3].error, GeometryError::InvalidStyle { .. }));
    }

    #[test]
    fn test_unreadable_payload_is_an_error() {
        assert!(matches!(
            FeatureCollection::parse(&json!(42), CoordinateOrder::LonLat),
            Err(GeometryError::InvalidPayload(_))
        ));
        assert!(matches!(
            FeatureCollection::parse_str("{not json", CoordinateOrder::LonLat),
            Err(GeometryError::InvalidPayload(_))
        ));
        assert!(matches!(
            FeatureCollection::parse(&json!({ "type": "FeatureCollection" }), CoordinateOrder::LonLat),
            Err(GeometryError::InvalidPayload(_))
        ));
        assert!(FeatureCollection::parse(&Value::Null, CoordinateOrder::LonLat)
            .unwrap()
            .is_empty());
    }
}
