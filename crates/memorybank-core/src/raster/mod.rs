//! Page-local raster surface with canvas-style path stroking.
//!
//! The surface keeps straight-alpha RGBA8 pixels at `logical size * scale`.
//! Drawing coordinates are logical (page) units; the context is pre-scaled so
//! line widths are the same in page units at any raster resolution.

pub mod codec;

use crate::color::InkColor;
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use codec::{PNG_DATA_URL_PREFIX, decode_data_url, encode_data_url};

/// Filter used whenever a raster is shown or restored at another pixel size.
pub const RESAMPLE_FILTER: FilterType = FilterType::Triangle;

const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Raster errors.
#[derive(Debug, Error)]
pub enum RasterError {
    #[error("Invalid data URL")]
    InvalidDataUrl,
    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

/// Result type for raster operations.
pub type RasterResult<T> = Result<T, RasterError>;

/// Rule for combining new ink with existing pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CompositeMode {
    /// Draw over existing content.
    #[default]
    SourceOver,
    /// Remove existing content where the stroke covers it.
    DestinationOut,
}

/// Opaque encoded bitmap of a surface (a PNG data URL).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RasterSnapshot(String);

impl RasterSnapshot {
    pub fn from_data_url(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn decode(&self) -> RasterResult<RgbaImage> {
        decode_data_url(&self.0)
    }
}

/// A fixed-size drawing surface.
#[derive(Debug, Clone)]
pub struct Surface {
    width: f64,
    height: f64,
    scale: f64,
    image: RgbaImage,
    /// Points of the current subpath, in logical coordinates.
    path: Vec<Point>,
    line_width: f64,
    composite: CompositeMode,
    stroke_color: InkColor,
}

impl Surface {
    /// Create a blank surface for a page of `width` x `height` logical units.
    pub fn new(width: f64, height: f64, scale: f64) -> Self {
        let scale = if scale > 0.0 { scale } else { 1.0 };
        let width = width.max(0.0);
        let height = height.max(0.0);
        let pixel_width = (width * scale).round() as u32;
        let pixel_height = (height * scale).round() as u32;
        Self {
            width,
            height,
            scale,
            image: RgbaImage::new(pixel_width, pixel_height),
            path: Vec::new(),
            line_width: 1.0,
            composite: CompositeMode::SourceOver,
            stroke_color: InkColor::black(),
        }
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn pixel_size(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Raw straight-alpha RGBA8 pixels.
    pub fn pixels(&self) -> &[u8] {
        self.image.as_raw()
    }

    /// Pixel at device coordinates, if in bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<InkColor> {
        self.image
            .get_pixel_checked(x, y)
            .map(|&Rgba([r, g, b, a])| InkColor::new(r, g, b, a))
    }

    /// Pixel under a logical (page) point.
    pub fn pixel_at(&self, point: Point) -> Option<InkColor> {
        if point.x < 0.0 || point.y < 0.0 {
            return None;
        }
        self.pixel(
            (point.x * self.scale).floor() as u32,
            (point.y * self.scale).floor() as u32,
        )
    }

    pub fn set_line_width(&mut self, width: f64) {
        if width > 0.0 && width.is_finite() {
            self.line_width = width;
        }
    }

    pub fn line_width(&self) -> f64 {
        self.line_width
    }

    pub fn set_composite(&mut self, mode: CompositeMode) {
        self.composite = mode;
    }

    pub fn composite(&self) -> CompositeMode {
        self.composite
    }

    pub fn set_stroke_color(&mut self, color: InkColor) {
        self.stroke_color = color;
    }

    /// Discard the current path.
    pub fn begin_path(&mut self) {
        self.path.clear();
    }

    /// Start a new subpath at `point`.
    pub fn move_to(&mut self, point: Point) {
        self.path.clear();
        self.path.push(point);
    }

    /// Extend the current subpath. Acts as `move_to` on an empty path.
    pub fn line_to(&mut self, point: Point) {
        self.path.push(point);
    }

    /// Stroke the current path with round caps and joins.
    ///
    /// Coverage is computed for the whole path first and composited once, so
    /// overlapping segments of the same path do not darken each other.
    pub fn stroke(&mut self) {
        let (pixel_width, pixel_height) = self.image.dimensions();
        if self.path.len() < 2 || pixel_width == 0 || pixel_height == 0 {
            return;
        }

        let half = self.line_width * self.scale / 2.0;
        let device: Vec<Point> = self
            .path
            .iter()
            .map(|p| Point::new(p.x * self.scale, p.y * self.scale))
            .collect();

        let mut bounds = Rect::from_points(device[0], device[0]);
        for p in &device[1..] {
            bounds = bounds.union_pt(*p);
        }
        let bounds = bounds.inflate(half + 1.0, half + 1.0);
        let x0 = bounds.x0.floor().max(0.0) as u32;
        let y0 = bounds.y0.floor().max(0.0) as u32;
        let x1 = (bounds.x1.ceil().max(0.0) as u32).min(pixel_width);
        let y1 = (bounds.y1.ceil().max(0.0) as u32).min(pixel_height);
        if x0 >= x1 || y0 >= y1 {
            return;
        }

        for y in y0..y1 {
            for x in x0..x1 {
                let center = Point::new(x as f64 + 0.5, y as f64 + 0.5);
                let distance = device
                    .windows(2)
                    .map(|seg| segment_distance(center, seg[0], seg[1]))
                    .fold(f64::INFINITY, f64::min);
                let coverage = (half + 0.5 - distance).clamp(0.0, 1.0);
                if coverage > 0.0 {
                    self.composite_pixel(x, y, coverage);
                }
            }
        }
    }

    fn composite_pixel(&mut self, x: u32, y: u32, coverage: f64) {
        let color = self.stroke_color;
        let mode = self.composite;
        let dst = self.image.get_pixel_mut(x, y);
        let src_alpha = color.a as f64 / 255.0 * coverage;
        let dst_alpha = dst[3] as f64 / 255.0;

        match mode {
            CompositeMode::SourceOver => {
                let out_alpha = src_alpha + dst_alpha * (1.0 - src_alpha);
                if out_alpha <= 0.0 {
                    return;
                }
                for (c, s) in [color.r, color.g, color.b].into_iter().enumerate() {
                    let d = dst[c] as f64;
                    let value =
                        (s as f64 * src_alpha + d * dst_alpha * (1.0 - src_alpha)) / out_alpha;
                    dst[c] = value.round().clamp(0.0, 255.0) as u8;
                }
                dst[3] = (out_alpha * 255.0).round() as u8;
            }
            CompositeMode::DestinationOut => {
                let out_alpha = ((dst_alpha * (1.0 - src_alpha)) * 255.0).round() as u8;
                if out_alpha == 0 {
                    *dst = TRANSPARENT;
                } else {
                    dst[3] = out_alpha;
                }
            }
        }
    }

    /// Blank the whole surface.
    pub fn clear(&mut self) {
        for pixel in self.image.pixels_mut() {
            *pixel = TRANSPARENT;
        }
    }

    /// True when no pixel carries any alpha.
    pub fn is_blank(&self) -> bool {
        self.image.pixels().all(|p| p[3] == 0)
    }

    /// Serialize the visible content to an opaque snapshot.
    pub fn snapshot(&self) -> RasterResult<RasterSnapshot> {
        Ok(RasterSnapshot(encode_data_url(&self.image)?))
    }

    /// Draw a snapshot at the origin, replacing the surface content.
    ///
    /// Snapshots of another pixel size are resampled to the surface.
    pub fn draw_snapshot(&mut self, snapshot: &RasterSnapshot) -> RasterResult<()> {
        let decoded = snapshot.decode()?;
        if decoded.width() == 0 || decoded.height() == 0 {
            return Ok(());
        }
        let (width, height) = self.image.dimensions();
        self.image = if decoded.dimensions() == (width, height) {
            decoded
        } else {
            imageops::resize(&decoded, width, height, RESAMPLE_FILTER)
        };
        Ok(())
    }

    /// The content resampled for display at another scale.
    ///
    /// The surface itself is left untouched.
    pub fn resampled(&self, scale: f64) -> RgbaImage {
        let width = ((self.width * scale).round() as u32).max(1);
        let height = ((self.height * scale).round() as u32).max(1);
        if (width, height) == self.image.dimensions() {
            return self.image.clone();
        }
        imageops::resize(&self.image, width, height, RESAMPLE_FILTER)
    }
}

/// Distance from `p` to the segment `a`-`b`.
fn segment_distance(p: Point, a: Point, b: Point) -> f64 {
    let ab = b - a;
    let ap = p - a;
    let len_sq = ab.hypot2();
    if len_sq < f64::EPSILON {
        return ap.hypot();
    }
    let t = (ap.dot(ab) / len_sq).clamp(0.0, 1.0);
    (p - (a + ab * t)).hypot()
}
