use std::path::Path;
use std::time::Duration;

use image::{GrayImage, RgbaImage};
use resvg::tiny_skia::{self, Pixmap, Transform};
use resvg::usvg;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::model::FailureKind;
use crate::services::validator::ParsedSvg;

/// Default edge length of the square render target.
///
/// Large enough that a version 10 symbol still gets several pixels per module.
pub const DEFAULT_RASTER_SIZE: u32 = 512;

/// Default white border kept around the rendered document, in pixels.
pub const DEFAULT_MARGIN: u32 = 16;

/// Target pixel dimensions for rasterization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RasterSize {
    pub width: u32,
    pub height: u32,
}

impl RasterSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn square(side: u32) -> Self {
        Self::new(side, side)
    }

    pub fn is_positive(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

impl Default for RasterSize {
    fn default() -> Self {
        Self::square(DEFAULT_RASTER_SIZE)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// 8-bit straight-alpha RGBA.
    Rgba8,
}

/// Rendered pixel buffer handed to the QR decoder.
#[derive(Debug, Clone)]
pub struct RasterImage {
    pixels: RgbaImage,
}

impl RasterImage {
    pub fn from_rgba(pixels: RgbaImage) -> Self {
        Self { pixels }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn format(&self) -> PixelFormat {
        PixelFormat::Rgba8
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Luminance view used for finder-pattern detection.
    pub fn to_luma(&self) -> GrayImage {
        image::imageops::grayscale(&self.pixels)
    }

    /// Write the buffer as PNG, mainly for inspecting failed items.
    pub fn save_png(&self, path: &Path) -> Result<(), image::ImageError> {
        self.pixels.save_with_format(path, image::ImageFormat::Png)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RasterError {
    #[error("unsupported SVG feature: {0}")]
    UnsupportedSvgFeature(String),
    #[error("rasterization failed: {0}")]
    Rasterization(String),
    #[error("rasterization timed out after {0:?}")]
    Timeout(Duration),
}

impl RasterError {
    pub fn kind(&self) -> FailureKind {
        match self {
            RasterError::UnsupportedSvgFeature(_) => FailureKind::UnsupportedSvgFeature,
            RasterError::Rasterization(_) => FailureKind::RasterizationError,
            RasterError::Timeout(_) => FailureKind::RasterizationTimeout,
        }
    }
}

/// Trait implemented by SVG renderers.
pub trait Rasterizer: Send + Sync {
    fn rasterize(&self, doc: &ParsedSvg, size: RasterSize) -> Result<RasterImage, RasterError>;
    fn name(&self) -> &'static str;
}

/// resvg-backed renderer.
///
/// Holds only configuration; every call builds and drops its own tree and
/// pixmap, so one instance can be shared across worker threads.
#[derive(Debug, Clone, Copy)]
pub struct ResvgRasterizer {
    margin: u32,
}

impl Default for ResvgRasterizer {
    fn default() -> Self {
        Self { margin: DEFAULT_MARGIN }
    }
}

impl ResvgRasterizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_margin(mut self, margin: u32) -> Self {
        self.margin = margin;
        self
    }

    pub fn margin(&self) -> u32 {
        self.margin
    }

    /// Margin actually applied for `size`: never more than a quarter of the
    /// shorter edge so the document keeps at least half the canvas.
    fn effective_margin(&self, size: RasterSize) -> u32 {
        self.margin.min(size.width.min(size.height) / 4)
    }
}

impl Rasterizer for ResvgRasterizer {
    fn rasterize(&self, doc: &ParsedSvg, size: RasterSize) -> Result<RasterImage, RasterError> {
        if !size.is_positive() {
            return Err(RasterError::Rasterization(format!(
                "target size must be positive, got {}x{}",
                size.width, size.height
            )));
        }
        if let Some(feature) = doc.unsupported_features().first() {
            return Err(RasterError::UnsupportedSvgFeature(feature.to_string()));
        }

        let source = doc.render_source();
        let options = usvg::Options::default();
        let tree = usvg::Tree::from_str(&source, &options)
            .map_err(|e| RasterError::Rasterization(format!("renderer rejected document: {e}")))?;

        let doc_width = tree.size().width();
        let doc_height = tree.size().height();
        if !(doc_width > 0.0 && doc_height > 0.0) {
            return Err(RasterError::Rasterization("document has zero size".into()));
        }

        let margin = self.effective_margin(size);
        let avail_width = (size.width - 2 * margin) as f32;
        let avail_height = (size.height - 2 * margin) as f32;
        let scale = (avail_width / doc_width).min(avail_height / doc_height);
        let offset_x = (size.width as f32 - doc_width * scale) / 2.0;
        let offset_y = (size.height as f32 - doc_height * scale) / 2.0;

        let mut pixmap = Pixmap::new(size.width, size.height).ok_or_else(|| {
            RasterError::Rasterization(format!(
                "failed to allocate {}x{} pixmap",
                size.width, size.height
            ))
        })?;
        // Decoders need light/dark contrast; transparent areas become white.
        pixmap.fill(tiny_skia::Color::WHITE);
        let transform = Transform::from_row(scale, 0.0, 0.0, scale, offset_x, offset_y);
        resvg::render(&tree, transform, &mut pixmap.as_mut());

        debug!(
            width = size.width,
            height = size.height,
            doc_width,
            doc_height,
            scale,
            "rasterized SVG"
        );
        pixmap_to_image(&pixmap)
    }

    fn name(&self) -> &'static str {
        "resvg"
    }
}

fn pixmap_to_image(pixmap: &Pixmap) -> Result<RasterImage, RasterError> {
    let mut data = Vec::with_capacity(pixmap.data().len());
    for pixel in pixmap.pixels() {
        let color = pixel.demultiply();
        data.extend_from_slice(&[color.red(), color.green(), color.blue(), color.alpha()]);
    }
    RgbaImage::from_raw(pixmap.width(), pixmap.height(), data)
        .map(RasterImage::from_rgba)
        .ok_or_else(|| RasterError::Rasterization("pixel buffer size mismatch".into()))
}
