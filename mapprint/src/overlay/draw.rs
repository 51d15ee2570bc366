//! Drawing projected features onto the canvas with tiny-skia.

use super::marker::MarkerCache;
use super::style::{FillRule, LineCap, LineJoin, Rgba8, Style};
use super::{FeatureCollection, GeoFeature, GeometryError, MarkerResolver, SkippedFeature};
use crate::coord::GeoPoint;
use crate::grid::TileGrid;
use image::{Rgba, RgbaImage};
use tiny_skia::{
    Color, ColorU8, Paint, PathBuilder, Pixmap, PixmapPaint, Shader, Stroke, StrokeDash, Transform,
};
use tracing::{debug, trace, warn};

/// Maps geographic points to pixels of the (possibly resized) canvas.
#[derive(Debug, Clone, Copy)]
pub struct Projector<'a> {
    grid: &'a TileGrid,
    scale_x: f64,
    scale_y: f64,
}

impl<'a> Projector<'a> {
    /// A projector for a canvas covering `grid` at its native size.
    pub fn new(grid: &'a TileGrid) -> Self {
        Self::scaled(grid, 1.0, 1.0)
    }

    /// A projector for a canvas resized by the given factors.
    pub fn scaled(grid: &'a TileGrid, scale_x: f64, scale_y: f64) -> Self {
        Self {
            grid,
            scale_x,
            scale_y,
        }
    }

    pub fn project(&self, point: GeoPoint) -> (f32, f32) {
        let (x, y) = self.grid.project(point);
        ((x * self.scale_x) as f32, (y * self.scale_y) as f32)
    }
}

/// Draws vector features over a raster canvas.
pub struct OverlayRenderer<'a> {
    markers: MarkerCache<'a>,
}

impl<'a> OverlayRenderer<'a> {
    pub fn new(resolver: &'a dyn MarkerResolver) -> Self {
        Self {
            markers: MarkerCache::new(resolver),
        }
    }

    /// Draws `features` onto `canvas` in declaration order.
    ///
    /// Returns the finished canvas and the features that could not be drawn.
    pub fn draw(
        &mut self,
        canvas: RgbaImage,
        features: &FeatureCollection,
        projector: &Projector<'_>,
    ) -> (RgbaImage, Vec<SkippedFeature>) {
        let mut skipped = Vec::new();
        if features.is_empty() {
            return (canvas, skipped);
        }

        let Some(mut pixmap) = to_pixmap(&canvas) else {
            warn!(
                width = canvas.width(),
                height = canvas.height(),
                "Canvas cannot host an overlay"
            );
            return (canvas, skipped);
        };

        for (index, feature) in &features.features {
            if let Err(error) = self.draw_feature(&mut pixmap, feature, projector) {
                warn!(feature = index, kind = feature.kind(), error = %error, "Skipping overlay feature");
                skipped.push(SkippedFeature {
                    index: *index,
                    error,
                });
            }
        }

        debug!(
            drawn = features.len() - skipped.len(),
            skipped = skipped.len(),
            "Overlay drawn"
        );

        (from_pixmap(&pixmap), skipped)
    }

    fn draw_feature(
        &mut self,
        pixmap: &mut Pixmap,
        feature: &GeoFeature,
        projector: &Projector<'_>,
    ) -> Result<(), GeometryError> {
        match feature {
            GeoFeature::Point { position, style } => {
                let reference = style.image.as_deref().ok_or(GeometryError::NoMarkerImage)?;
                let marker = self.markers.get(reference)?;
                let (x, y) = projector.project(*position);
                draw_marker(pixmap, marker, (x, y), style.icon_anchor);
            }
            GeoFeature::LineString { points, style } => {
                if points.len() < 2 {
                    trace!(vertices = points.len(), "Degenerate line, nothing to draw");
                    return Ok(());
                }
                let mut pb = PathBuilder::new();
                trace_line(&mut pb, points, projector);
                if let Some(path) = pb.finish() {
                    if style.stroke {
                        stroke(pixmap, &path, style);
                    }
                }
            }
            GeoFeature::Polygon { rings, style } => {
                let mut pb = PathBuilder::new();
                for ring in rings.iter().filter(|r| r.len() >= 2) {
                    trace_line(&mut pb, ring, projector);
                    pb.close();
                }
                let Some(path) = pb.finish() else {
                    return Ok(());
                };
                if style.fill {
                    let paint = solid(style.effective_fill_color());
                    pixmap.fill_path(
                        &path,
                        &paint,
                        fill_rule(style.fill_rule),
                        Transform::identity(),
                        None,
                    );
                }
                if style.stroke {
                    stroke(pixmap, &path, style);
                }
            }
        }
        Ok(())
    }
}

fn trace_line(pb: &mut PathBuilder, points: &[GeoPoint], projector: &Projector<'_>) {
    for (i, point) in points.iter().enumerate() {
        let (x, y) = projector.project(*point);
        if i == 0 {
            pb.move_to(x, y);
        } else {
            pb.line_to(x, y);
        }
    }
}

fn stroke(pixmap: &mut Pixmap, path: &tiny_skia::Path, style: &Style) {
    if style.weight <= 0.0 {
        return;
    }
    let stroke = Stroke {
        width: style.weight,
        line_cap: match style.line_cap {
            LineCap::Butt => tiny_skia::LineCap::Butt,
            LineCap::Round => tiny_skia::LineCap::Round,
            LineCap::Square => tiny_skia::LineCap::Square,
        },
        line_join: match style.line_join {
            LineJoin::Miter => tiny_skia::LineJoin::Miter,
            LineJoin::Round => tiny_skia::LineJoin::Round,
            LineJoin::Bevel => tiny_skia::LineJoin::Bevel,
        },
        dash: style
            .dash_array
            .as_ref()
            .and_then(|dashes| StrokeDash::new(dashes.clone(), 0.0)),
        ..Default::default()
    };
    pixmap.stroke_path(
        path,
        &solid(style.stroke_color()),
        &stroke,
        Transform::identity(),
        None,
    );
}

fn fill_rule(rule: FillRule) -> tiny_skia::FillRule {
    match rule {
        FillRule::EvenOdd => tiny_skia::FillRule::EvenOdd,
        FillRule::NonZero => tiny_skia::FillRule::Winding,
    }
}

fn solid(color: Rgba8) -> Paint<'static> {
    Paint {
        shader: Shader::SolidColor(Color::from_rgba8(color.r, color.g, color.b, color.a)),
        anti_alias: true,
        ..Default::default()
    }
}

/// Draws `marker` with its anchor pixel on `at`.
fn draw_marker(pixmap: &mut Pixmap, marker: &RgbaImage, at: (f32, f32), anchor: Option<(f32, f32)>) {
    let Some(sprite) = to_pixmap(marker) else {
        return;
    };
    let (ax, ay) = anchor.unwrap_or((marker.width() as f32 / 2.0, marker.height() as f32 / 2.0));
    let left = (at.0 - ax).round() as i32;
    let top = (at.1 - ay).round() as i32;
    pixmap.draw_pixmap(
        left,
        top,
        sprite.as_ref(),
        &PixmapPaint::default(),
        Transform::identity(),
        None,
    );
}

/// Copies a straight-alpha image into a premultiplied pixmap.
fn to_pixmap(image: &RgbaImage) -> Option<Pixmap> {
    let mut pixmap = Pixmap::new(image.width(), image.height())?;
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(image.pixels()) {
        let [r, g, b, a] = src.0;
        *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
    }
    Some(pixmap)
}

fn from_pixmap(pixmap: &Pixmap) -> RgbaImage {
    let mut image = RgbaImage::new(pixmap.width(), pixmap.height());
    for (dst, src) in image.pixels_mut().zip(pixmap.pixels()) {
        let c = src.demultiply();
        *dst = Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
    }
    image
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::BoundingBox;
    use crate::grid::build_grid;
    use crate::overlay::{CoordinateOrder, MemoryMarkerResolver};
    use serde_json::json;

    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

    /// One tile at zoom 1: the northwest quadrant of the world
    fn grid() -> TileGrid {
        let bbox = BoundingBox::new(
            GeoPoint::new(10.0, -170.0).unwrap(),
            GeoPoint::new(80.0, -10.0).unwrap(),
        )
        .unwrap();
        let grid = build_grid(&bbox, 1).unwrap();
        assert_eq!(grid.len(), 1);
        grid
    }

    fn canvas() -> RgbaImage {
        RgbaImage::from_pixel(256, 256, WHITE)
    }

    fn features(payload: serde_json::Value) -> FeatureCollection {
        FeatureCollection::parse(&payload, CoordinateOrder::LonLat).unwrap()
    }

    fn red_marker() -> MemoryMarkerResolver {
        MemoryMarkerResolver::new().with_marker("pin", RgbaImage::from_pixel(5, 5, Rgba([255, 0, 0, 255])))
    }

    #[test]
    fn test_marker_is_centered_on_point() {
        let grid = grid();
        let projector = Projector::new(&grid);
        let resolver = red_marker();
        let point = GeoPoint::new(40.0, -90.0).unwrap();
        let (px, py) = projector.project(point);

        let collection = features(json!({ "type": "Feature", "properties": { "image": "pin" },
            "geometry": { "type": "Point", "coordinates": [-90.0, 40.0] } }));
        let (out, skipped) = OverlayRenderer::new(&resolver).draw(canvas(), &collection, &projector);

        assert!(skipped.is_empty());
        assert_eq!(out.get_pixel(px as u32, py as u32), &Rgba([255, 0, 0, 255]));
        assert_eq!(out.get_pixel(px as u32 + 10, py as u32), &WHITE);
    }

    #[test]
    fn test_marker_anchor() {
        let grid = grid();
        let projector = Projector::new(&grid);
        let resolver = red_marker();
        let (px, py) = projector.project(GeoPoint::new(40.0, -90.0).unwrap());

        // Anchor at the marker's top-left: the marker extends right and down
        let collection = features(json!({ "type": "Feature",
            "properties": { "image": "pin", "iconAnchor": [0, 0] },
            "geometry": { "type": "Point", "coordinates": [-90.0, 40.0] } }));
        let (out, _) = OverlayRenderer::new(&resolver).draw(canvas(), &collection, &projector);

        let (x, y) = (px.round() as u32, py.round() as u32);
        assert_eq!(out.get_pixel(x + 3, y + 3), &Rgba([255, 0, 0, 255]));
        assert_eq!(out.get_pixel(x - 2, y - 2), &WHITE);
    }

    #[test]
    fn test_missing_marker_is_skipped() {
        let grid = grid();
        let resolver = MemoryMarkerResolver::new();
        let collection = features(json!([
            { "type": "Feature", "properties": { "image": "unknown" },
              "geometry": { "type": "Point", "coordinates": [-90.0, 40.0] } },
            { "type": "Feature",
              "geometry": { "type": "Point", "coordinates": [-90.0, 40.0] } }
        ]));

        let (out, skipped) =
            OverlayRenderer::new(&resolver).draw(canvas(), &collection, &Projector::new(&grid));

        assert_eq!(skipped.len(), 2);
        assert!(matches!(skipped[0].error, GeometryError::MissingMarker { .. }));
        assert_eq!(skipped[1].error, GeometryError::NoMarkerImage);
        assert!(out.pixels().all(|p| *p == WHITE));
    }

    #[test]
    fn test_degenerate_lines_draw_nothing() {
        let grid = grid();
        let resolver = MemoryMarkerResolver::new();
        let collection = features(json!([
            { "type": "Feature", "geometry": { "type": "LineString", "coordinates": [] } },
            { "type": "Feature", "geometry": { "type": "LineString", "coordinates": [[-90.0, 40.0]] } }
        ]));

        let (out, skipped) =
            OverlayRenderer::new(&resolver).draw(canvas(), &collection, &Projector::new(&grid));

        assert!(skipped.is_empty());
        assert!(out.pixels().all(|p| *p == WHITE));
    }

    #[test]
    fn test_line_is_stroked() {
        let grid = grid();
        let projector = Projector::new(&grid);
        let resolver = MemoryMarkerResolver::new();
        let collection = features(json!({ "type": "Feature",
            "properties": { "color": "#000000", "weight": 6 },
            "geometry": { "type": "LineString", "coordinates": [[-150.0, 40.0], [-30.0, 40.0]] } }));

        let (out, _) = OverlayRenderer::new(&resolver).draw(canvas(), &collection, &projector);

        let (x, y) = projector.project(GeoPoint::new(40.0, -90.0).unwrap());
        assert_eq!(out.get_pixel(x as u32, y.round() as u32), &Rgba([0, 0, 0, 255]));
        assert_eq!(out.get_pixel(x as u32, y as u32 + 20), &WHITE);
    }

    #[test]
    fn test_polygon_fill_rule_and_holes() {
        let grid = grid();
        let projector = Projector::new(&grid);
        let resolver = MemoryMarkerResolver::new();
        let outer = json!([[-160.0, 70.0], [-20.0, 70.0], [-20.0, 15.0], [-160.0, 15.0], [-160.0, 70.0]]);
        let hole = json!([[-110.0, 55.0], [-70.0, 55.0], [-70.0, 35.0], [-110.0, 35.0], [-110.0, 55.0]]);
        let props = json!({ "stroke": false, "fillColor": "#0000ff", "fillOpacity": 1.0 });

        let even_odd = features(json!({ "type": "Feature", "properties": props,
            "geometry": { "type": "Polygon", "coordinates": [outer, hole] } }));
        let (out, _) = OverlayRenderer::new(&resolver).draw(canvas(), &even_odd, &projector);

        let (cx, cy) = projector.project(GeoPoint::new(45.0, -90.0).unwrap());
        let (ix, iy) = projector.project(GeoPoint::new(62.0, -140.0).unwrap());
        assert_eq!(out.get_pixel(cx as u32, cy as u32), &WHITE);
        assert_eq!(out.get_pixel(ix as u32, iy as u32), &Rgba([0, 0, 255, 255]));

        // Same winding direction for both rings: nonzero fills the hole
        let mut nonzero_props = props.clone();
        nonzero_props["fillRule"] = json!("nonzero");
        let nonzero = features(json!({ "type": "Feature", "properties": nonzero_props,
            "geometry": { "type": "Polygon", "coordinates": [outer, hole] } }));
        let (out, _) = OverlayRenderer::new(&resolver).draw(canvas(), &nonzero, &projector);
        assert_eq!(out.get_pixel(cx as u32, cy as u32), &Rgba([0, 0, 255, 255]));
    }

    /// `[lon, lat]` of a canvas pixel position.
    fn at(grid: &TileGrid, x: f64, y: f64) -> serde_json::Value {
        let point = grid.geo_point_at(x, y);
        json!([point.longitude, point.latitude])
    }

    fn draw_line(grid: &TileGrid, coordinates: serde_json::Value, props: serde_json::Value) -> RgbaImage {
        let resolver = MemoryMarkerResolver::new();
        let collection = features(json!({ "type": "Feature", "properties": props,
            "geometry": { "type": "LineString", "coordinates": coordinates } }));
        let (out, _) = OverlayRenderer::new(&resolver).draw(canvas(), &collection, &Projector::new(grid));
        out
    }

    const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

    #[test]
    fn test_dashed_line_leaves_gaps() {
        let grid = grid();
        let line = json!([at(&grid, 20.0, 128.0), at(&grid, 220.0, 128.0)]);
        let out = draw_line(
            &grid,
            line,
            json!({ "color": "#000000", "weight": 4, "dashArray": "20,20", "lineCap": "butt" }),
        );

        // Dashes cover 20..40, 60..80, ...; gaps 40..60, 80..100, ...
        assert_eq!(out.get_pixel(30, 128), &BLACK);
        assert_eq!(out.get_pixel(50, 128), &WHITE);
        assert_eq!(out.get_pixel(70, 128), &BLACK);
        assert_eq!(out.get_pixel(90, 128), &WHITE);
    }

    #[test]
    fn test_line_cap_extends_past_end() {
        let grid = grid();
        let line = json!([at(&grid, 50.0, 128.0), at(&grid, 150.0, 128.0)]);

        let butt = draw_line(
            &grid,
            line.clone(),
            json!({ "color": "#000000", "weight": 10, "lineCap": "butt" }),
        );
        assert_eq!(butt.get_pixel(145, 128), &BLACK);
        assert_eq!(butt.get_pixel(153, 128), &WHITE);

        let square = draw_line(
            &grid,
            line,
            json!({ "color": "#000000", "weight": 10, "lineCap": "square" }),
        );
        assert_eq!(square.get_pixel(153, 128), &BLACK);
        assert_eq!(square.get_pixel(158, 128), &WHITE);
    }

    #[test]
    fn test_line_join_miter_reaches_past_bevel() {
        let grid = grid();
        let vee = json!([
            at(&grid, 50.0, 50.0),
            at(&grid, 128.0, 200.0),
            at(&grid, 206.0, 50.0)
        ]);

        // The miter tip sits about 10.8px below the vertex, the bevel about 2.3px
        let miter = draw_line(
            &grid,
            vee.clone(),
            json!({ "color": "#000000", "weight": 10, "lineJoin": "miter" }),
        );
        assert_eq!(miter.get_pixel(128, 206), &BLACK);

        let bevel = draw_line(
            &grid,
            vee,
            json!({ "color": "#000000", "weight": 10, "lineJoin": "bevel" }),
        );
        assert_eq!(bevel.get_pixel(128, 206), &WHITE);
        assert_eq!(bevel.get_pixel(128, 198), &BLACK);
    }

    #[test]
    fn test_self_intersecting_ring_fill_rules() {
        let grid = grid();
        let projector = Projector::new(&grid);
        let resolver = MemoryMarkerResolver::new();

        // Pentagram: the inner pentagon has winding number 2
        let mut star: Vec<serde_json::Value> = (0..5)
            .map(|k| {
                let angle = (-90.0 + 144.0 * k as f64).to_radians();
                at(&grid, 128.0 + 100.0 * angle.cos(), 128.0 + 100.0 * angle.sin())
            })
            .collect();
        star.push(star[0].clone());

        let draw = |rule: &str| {
            let collection = features(json!({ "type": "Feature",
                "properties": { "stroke": false, "fillColor": "#0000ff", "fillOpacity": 1.0, "fillRule": rule },
                "geometry": { "type": "Polygon", "coordinates": [star.clone()] } }));
            let (out, _) = OverlayRenderer::new(&resolver).draw(canvas(), &collection, &projector);
            out
        };
        let blue = Rgba([0, 0, 255, 255]);

        let even_odd = draw("evenodd");
        assert_eq!(even_odd.get_pixel(128, 128), &WHITE);
        assert_eq!(even_odd.get_pixel(128, 45), &blue);

        let nonzero = draw("nonzero");
        assert_eq!(nonzero.get_pixel(128, 128), &blue);
        assert_eq!(nonzero.get_pixel(128, 45), &blue);
    }

    #[test]
    fn test_line_west_of_wrapping_grid_stays_off_canvas() {
        // Columns 7 and 0 at zoom 3; 120E lies west of the canvas
        let bbox = BoundingBox::new(
            GeoPoint::new(-10.0, 170.0).unwrap(),
            GeoPoint::new(10.0, -170.0).unwrap(),
        )
        .unwrap();
        let grid = build_grid(&bbox, 3).unwrap();
        assert_eq!((grid.width(), grid.height()), (512, 512));

        let resolver = MemoryMarkerResolver::new();
        let collection = features(json!({ "type": "Feature", "properties": { "color": "#000000" },
            "geometry": { "type": "LineString", "coordinates": [[120.0, 0.0], [175.0, 0.0]] } }));
        let blank = RgbaImage::from_pixel(512, 512, WHITE);
        let (out, _) = OverlayRenderer::new(&resolver).draw(blank, &collection, &Projector::new(&grid));

        assert_eq!(out.get_pixel(100, 256), &BLACK);
        assert_eq!(out.get_pixel(400, 256), &WHITE);
    }

    #[test]
    fn test_translucent_fill_blends() {
        let grid = grid();
        let projector = Projector::new(&grid);
        let resolver = MemoryMarkerResolver::new();
        let collection = features(json!({ "type": "Feature",
            "properties": { "stroke": false, "fillColor": "#000000", "fillOpacity": 0.5 },
            "geometry": { "type": "Polygon", "coordinates": [[-160.0, 70.0], [-20.0, 70.0], [-20.0, 15.0], [-160.0, 15.0]] } }));

        let (out, _) = OverlayRenderer::new(&resolver).draw(canvas(), &collection, &projector);

        let (x, y) = projector.project(GeoPoint::new(45.0, -90.0).unwrap());
        let p = out.get_pixel(x as u32, y as u32).0;
        assert!((p[0] as i32 - 127).abs() <= 1, "{:?}", p);
        assert_eq!(p[3], 255);
    }

    #[test]
    fn test_scaled_projector() {
        let grid = grid();
        let full = Projector::new(&grid);
        let half = Projector::scaled(&grid, 0.5, 0.25);
        let point = GeoPoint::new(40.0, -90.0).unwrap();

        let (fx, fy) = full.project(point);
        let (hx, hy) = half.project(point);
        assert!((hx - fx * 0.5).abs() < 1e-3);
        assert!((hy - fy * 0.25).abs() < 1e-3);
    }

    #[test]
    fn test_pixmap_round_trip_preserves_opaque_pixels() {
        let image = RgbaImage::from_fn(3, 2, |x, y| Rgba([x as u8 * 40, y as u8 * 90, 7, 255]));
        let pixmap = to_pixmap(&image).unwrap();
        assert_eq!(from_pixmap(&pixmap), image);
    }
}
