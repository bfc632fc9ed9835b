//! Shared test utilities for the media-ingest test suite.
//!
//! Fixtures are synthesized in memory with the `image` encoders so tests
//! never depend on files checked into the repo.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let (_tmp, config) = temp_static_root();
//! let bytes = jpeg_bytes(2000, 1000);
//! let raster = jpeg_raster(400, 100);
//! ```

use image::codecs::gif::GifEncoder;
use image::{ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use std::io::Cursor;
use tempfile::TempDir;

use crate::config::IngestConfig;
use crate::imaging::{Raster, decode};

// =========================================================================
// Pixel sources
// =========================================================================

fn gradient_rgb(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            128,
        ])
    })
}

fn gradient_rgba(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        Rgba([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            64,
            if (x + y) % 2 == 0 { 255 } else { 96 },
        ])
    })
}

fn encode_as(image: image::DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, format).unwrap();
    out.into_inner()
}

// =========================================================================
// Encoded fixtures
// =========================================================================

pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    encode_as(gradient_rgb(width, height).into(), ImageFormat::Jpeg)
}

/// Opaque PNG (RGB8).
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    encode_as(gradient_rgb(width, height).into(), ImageFormat::Png)
}

/// PNG with an alpha channel (RGBA8).
pub fn png_rgba_bytes(width: u32, height: u32) -> Vec<u8> {
    encode_as(gradient_rgba(width, height).into(), ImageFormat::Png)
}

/// Single-frame GIF.
pub fn gif_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut out = Vec::new();
    GifEncoder::new(&mut out)
        .encode_frame(image::Frame::new(gradient_rgba(width, height)))
        .unwrap();
    out
}

/// BMP: decodable, but outside the storage allow-list.
pub fn bmp_bytes(width: u32, height: u32) -> Vec<u8> {
    encode_as(gradient_rgb(width, height).into(), ImageFormat::Bmp)
}

// =========================================================================
// Rasters
// =========================================================================

fn raster_from(bytes: &[u8]) -> Raster {
    let decoded = decode(bytes).unwrap();
    Raster::from_decoded(decoded.image, &decoded.tag).unwrap()
}

pub fn jpeg_raster(width: u32, height: u32) -> Raster {
    raster_from(&jpeg_bytes(width, height))
}

pub fn png_raster(width: u32, height: u32) -> Raster {
    raster_from(&png_bytes(width, height))
}

// =========================================================================
// Static roots
// =========================================================================

/// Temp directory holding a `static/` root, plus a config pointing at it.
///
/// Keep the `TempDir` alive for the duration of the test.
pub fn temp_static_root() -> (TempDir, IngestConfig) {
    let tmp = TempDir::new().unwrap();
    let static_dir = tmp.path().join("static");
    std::fs::create_dir_all(&static_dir).unwrap();
    let config = IngestConfig {
        static_dir: static_dir.to_string_lossy().into_owned(),
        ..IngestConfig::default()
    };
    (tmp, config)
}
