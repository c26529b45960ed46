use anyhow::{Context, Result};
use geo::{Contains, Geometry, LineString, Point, Polygon};
use image::{Rgb, RgbImage};
use imageproc::drawing::{
    draw_filled_circle_mut, draw_filled_rect_mut, draw_hollow_rect_mut, draw_line_segment_mut,
    draw_text_mut,
};
use imageproc::rect::Rect;
use rusttype::{Font, Scale};
use std::path::Path;

use crate::geo_core::BoundingBox;

/// Embedded font for figure text (DejaVu Sans Mono).
const FONT_DATA: &[u8] = include_bytes!("../../assets/DejaVuSansMono.ttf");

pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
pub const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

/// Blend `color` over `base` with the given opacity, the flat-alpha fill used
/// for boundary polygons.
pub fn blend(color: Rgb<u8>, base: Rgb<u8>, alpha: f64) -> Rgb<u8> {
    let mix = |c: u8, b: u8| (c as f64 * alpha + b as f64 * (1.0 - alpha)).round() as u8;
    Rgb([
        mix(color.0[0], base.0[0]),
        mix(color.0[1], base.0[1]),
        mix(color.0[2], base.0[2]),
    ])
}

/// An RGB drawing surface with the embedded font.
pub struct Canvas {
    img: RgbImage,
    font: Font<'static>,
}

impl Canvas {
    pub fn new(width: u32, height: u32, background: Rgb<u8>) -> Result<Self> {
        let font =
            Font::try_from_bytes(FONT_DATA).context("Failed to load embedded figure font")?;
        Ok(Canvas {
            img: RgbImage::from_pixel(width, height, background),
            font,
        })
    }

    pub fn width(&self) -> u32 {
        self.img.width()
    }

    pub fn height(&self) -> u32 {
        self.img.height()
    }

    pub fn put_pixel(&mut self, x: u32, y: u32, color: Rgb<u8>) {
        if x < self.img.width() && y < self.img.height() {
            self.img.put_pixel(x, y, color);
        }
    }

    /// Advance width of `text` at the given font size, in pixels.
    pub fn text_width(&self, size: f32, text: &str) -> f32 {
        let scale = Scale::uniform(size);
        text.chars()
            .map(|c| self.font.glyph(c).scaled(scale).h_metrics().advance_width)
            .sum()
    }

    pub fn text(&mut self, x: i32, y: i32, size: f32, color: Rgb<u8>, text: &str) {
        draw_text_mut(&mut self.img, color, x, y, Scale::uniform(size), &self.font, text);
    }

    /// Draw text horizontally centered on `cx`.
    pub fn text_centered(&mut self, cx: i32, y: i32, size: f32, color: Rgb<u8>, text: &str) {
        let w = self.text_width(size, text);
        self.text(cx - (w / 2.0) as i32, y, size, color, text);
    }

    pub fn fill_rect(&mut self, x: i32, y: i32, w: u32, h: u32, color: Rgb<u8>) {
        if w == 0 || h == 0 {
            return;
        }
        draw_filled_rect_mut(&mut self.img, Rect::at(x, y).of_size(w, h), color);
    }

    pub fn hollow_rect(&mut self, x: i32, y: i32, w: u32, h: u32, color: Rgb<u8>) {
        if w == 0 || h == 0 {
            return;
        }
        draw_hollow_rect_mut(&mut self.img, Rect::at(x, y).of_size(w, h), color);
    }

    pub fn line(&mut self, from: (f32, f32), to: (f32, f32), color: Rgb<u8>) {
        draw_line_segment_mut(&mut self.img, from, to, color);
    }

    pub fn filled_circle(&mut self, center: (i32, i32), radius: i32, color: Rgb<u8>) {
        draw_filled_circle_mut(&mut self.img, center, radius, color);
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .context(format!("Failed to create output directory: {:?}", parent))?;
        }
        self.img
            .save(path)
            .context(format!("Failed to save figure: {:?}", path))
    }
}

/// World-to-pixel mapping for one figure panel.
///
/// Fits the world bounds into the panel rectangle preserving aspect ratio
/// (letterboxed), with the y axis flipped so north is up.
#[derive(Debug, Clone, Copy)]
pub struct PanelTransform {
    bounds: BoundingBox,
    px_x0: f64,
    px_y0: f64,
    scale: f64,
}

impl PanelTransform {
    pub fn fit(bounds: &BoundingBox, x0: i32, y0: i32, width: u32, height: u32) -> Self {
        let w = bounds.width().max(f64::MIN_POSITIVE);
        let h = bounds.height().max(f64::MIN_POSITIVE);
        let scale = (width as f64 / w).min(height as f64 / h);
        // center the letterboxed content
        let px_x0 = x0 as f64 + (width as f64 - w * scale) / 2.0;
        let px_y0 = y0 as f64 + (height as f64 - h * scale) / 2.0;
        PanelTransform {
            bounds: *bounds,
            px_x0,
            px_y0,
            scale,
        }
    }

    pub fn to_px(&self, x: f64, y: f64) -> (f32, f32) {
        let px = self.px_x0 + (x - self.bounds.min_x) * self.scale;
        let py = self.px_y0 + (self.bounds.max_y - y) * self.scale;
        (px as f32, py as f32)
    }

    pub fn from_px(&self, px: f64, py: f64) -> (f64, f64) {
        let x = self.bounds.min_x + (px - self.px_x0) / self.scale;
        let y = self.bounds.max_y - (py - self.px_y0) / self.scale;
        (x, y)
    }
}

/// Fill and outline a geometry onto the canvas through a panel transform.
///
/// Fill is by pixel-center containment, outline follows the rings. Geometry
/// kinds other than (multi)polygons only get their outline.
pub fn draw_geometry(
    canvas: &mut Canvas,
    transform: &PanelTransform,
    geometry: &Geometry<f64>,
    fill: Rgb<u8>,
    edge: Rgb<u8>,
) {
    match geometry {
        Geometry::Polygon(polygon) => draw_polygon(canvas, transform, polygon, fill, edge),
        Geometry::MultiPolygon(mp) => {
            for polygon in &mp.0 {
                draw_polygon(canvas, transform, polygon, fill, edge);
            }
        }
        Geometry::GeometryCollection(gc) => {
            for inner in &gc.0 {
                draw_geometry(canvas, transform, inner, fill, edge);
            }
        }
        Geometry::LineString(ls) => draw_ring(canvas, transform, ls, edge),
        _ => {}
    }
}

fn draw_polygon(
    canvas: &mut Canvas,
    transform: &PanelTransform,
    polygon: &Polygon<f64>,
    fill: Rgb<u8>,
    edge: Rgb<u8>,
) {
    // fill pass, restricted to the polygon's own pixel envelope
    if let Some(rect) = geo::BoundingRect::bounding_rect(polygon) {
        let (min_px, max_py) = transform.to_px(rect.min().x, rect.min().y);
        let (max_px, min_py) = transform.to_px(rect.max().x, rect.max().y);
        let x_start = min_px.floor().max(0.0) as u32;
        let x_end = (max_px.ceil().max(0.0) as u32).min(canvas.width());
        let y_start = min_py.floor().max(0.0) as u32;
        let y_end = (max_py.ceil().max(0.0) as u32).min(canvas.height());

        for py in y_start..y_end {
            for px in x_start..x_end {
                let (x, y) = transform.from_px(px as f64 + 0.5, py as f64 + 0.5);
                if polygon.contains(&Point::new(x, y)) {
                    canvas.put_pixel(px, py, fill);
                }
            }
        }
    }

    // outline pass
    draw_ring(canvas, transform, polygon.exterior(), edge);
    for interior in polygon.interiors() {
        draw_ring(canvas, transform, interior, edge);
    }
}

fn draw_ring(canvas: &mut Canvas, transform: &PanelTransform, ring: &LineString<f64>, edge: Rgb<u8>) {
    for segment in ring.0.windows(2) {
        let from = transform.to_px(segment[0].x, segment[0].y);
        let to = transform.to_px(segment[1].x, segment[1].y);
        canvas.line(from, to, edge);
    }
}
