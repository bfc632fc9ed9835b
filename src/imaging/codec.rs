//! Codec adapter: bytes in, pixels, bytes out.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Sniff + decode | `image::ImageReader::with_guessed_format` + `decode` |
//! | Resize | `image::imageops::resize` with `Lanczos3` filter |
//! | Crop | `image::imageops::crop_imm` |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` (quality honoured) |
//! | Encode → PNG | `image::codecs::png::PngEncoder` |
//! | Encode → GIF | `image::codecs::gif::GifEncoder` (single frame) |
//!
//! A decoded upload is held as a [`Raster`], a tagged union over the concrete
//! pixel buffers each stored format needs. JPEG has no alpha channel, so it
//! is kept as RGB; PNG keeps alpha only when the source had it; GIF frames
//! are RGBA. Every operation matches on the variant and returns the same
//! variant, so the stored format of an upload never changes once decoded.

use super::params::{CropRect, Quality};
use image::codecs::gif::GifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::imageops::{self, FilterType};
use image::{DynamicImage, ExtendedColorType, ImageEncoder, ImageFormat, ImageReader};
use image::{RgbImage, RgbaImage};
use std::io::Cursor;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Failed to decode image: {0}")]
    Decode(#[source] image::ImageError),
    #[error("Failed to encode {format} image: {source}")]
    Encode {
        format: &'static str,
        #[source]
        source: image::ImageError,
    },
    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Image formats the pipeline can store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
    Gif,
}

impl ImageKind {
    /// Parse a detected format tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "gif" => Some(Self::Gif),
            _ => None,
        }
    }

    /// Format tag, also used as the stored file extension.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::Gif => "gif",
        }
    }
}

/// A freshly decoded upload before it is bound to a storable [`Raster`].
#[derive(Debug)]
pub struct Decoded {
    pub image: DynamicImage,
    /// Lowercase format tag as sniffed from the stream (`"jpeg"`, `"png"`,
    /// `"gif"`, `"bmp"`, ...).
    pub tag: String,
}

/// Sniff the format of `bytes` and decode them.
///
/// The tag is reported for every format the decoder understands, including
/// ones the pipeline will refuse to store; rejecting them is the validation
/// gate's job.
pub fn decode(bytes: &[u8]) -> Result<Decoded, CodecError> {
    let reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
    let tag = reader
        .format()
        .map(format_tag)
        .ok_or_else(|| CodecError::Decode(unknown_format()))?;
    let image = reader.decode().map_err(CodecError::Decode)?;
    Ok(Decoded { image, tag })
}

fn unknown_format() -> image::ImageError {
    image::ImageError::Unsupported(image::error::UnsupportedError::from_format_and_kind(
        image::error::ImageFormatHint::Unknown,
        image::error::UnsupportedErrorKind::Format(image::error::ImageFormatHint::Unknown),
    ))
}

fn format_tag(format: ImageFormat) -> String {
    match format {
        ImageFormat::Jpeg => "jpeg".to_string(),
        ImageFormat::Png => "png".to_string(),
        ImageFormat::Gif => "gif".to_string(),
        other => format!("{other:?}").to_lowercase(),
    }
}

/// Decoded pixels in the concrete representation their format requires.
#[derive(Debug, Clone, PartialEq)]
pub enum Raster {
    Jpeg(RgbImage),
    /// PNG whose source carried an alpha channel (or a palette with
    /// transparency).
    PngRgba(RgbaImage),
    /// Opaque PNG.
    PngRgb(RgbImage),
    Gif(RgbaImage),
}

impl Raster {
    /// Bind a decoded image to the buffer type of `tag`.
    ///
    /// Fails closed on any tag outside [`ImageKind`].
    pub fn from_decoded(image: DynamicImage, tag: &str) -> Result<Self, CodecError> {
        let kind =
            ImageKind::from_tag(tag).ok_or_else(|| CodecError::UnsupportedFormat(tag.into()))?;
        Ok(match kind {
            ImageKind::Jpeg => Self::Jpeg(image.to_rgb8()),
            ImageKind::Png if image.color().has_alpha() => Self::PngRgba(image.to_rgba8()),
            ImageKind::Png => Self::PngRgb(image.to_rgb8()),
            ImageKind::Gif => Self::Gif(image.to_rgba8()),
        })
    }

    /// Decode a stored artifact from disk, keeping the expected kind.
    pub fn open(path: &Path, kind: ImageKind) -> Result<Self, CodecError> {
        let bytes = std::fs::read(path)?;
        let decoded = decode(&bytes)?;
        Self::from_decoded(decoded.image, kind.tag())
    }

    pub fn kind(&self) -> ImageKind {
        match self {
            Self::Jpeg(_) => ImageKind::Jpeg,
            Self::PngRgba(_) | Self::PngRgb(_) => ImageKind::Png,
            Self::Gif(_) => ImageKind::Gif,
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            Self::Jpeg(img) | Self::PngRgb(img) => img.dimensions(),
            Self::PngRgba(img) | Self::Gif(img) => img.dimensions(),
        }
    }

    /// Lanczos3 resample to exactly `width` x `height`.
    pub fn resize(&self, width: u32, height: u32) -> Self {
        let filter = FilterType::Lanczos3;
        match self {
            Self::Jpeg(img) => Self::Jpeg(imageops::resize(img, width, height, filter)),
            Self::PngRgba(img) => Self::PngRgba(imageops::resize(img, width, height, filter)),
            Self::PngRgb(img) => Self::PngRgb(imageops::resize(img, width, height, filter)),
            Self::Gif(img) => Self::Gif(imageops::resize(img, width, height, filter)),
        }
    }

    /// Copy out the sub-image inside `rect`. The window is clamped to the
    /// image bounds.
    pub fn crop(&self, rect: CropRect) -> Self {
        let CropRect {
            x,
            y,
            width,
            height,
        } = rect;
        match self {
            Self::Jpeg(img) => Self::Jpeg(imageops::crop_imm(img, x, y, width, height).to_image()),
            Self::PngRgba(img) => {
                Self::PngRgba(imageops::crop_imm(img, x, y, width, height).to_image())
            }
            Self::PngRgb(img) => {
                Self::PngRgb(imageops::crop_imm(img, x, y, width, height).to_image())
            }
            Self::Gif(img) => Self::Gif(imageops::crop_imm(img, x, y, width, height).to_image()),
        }
    }

    /// Encode back to the format the raster was decoded from.
    pub fn encode(&self, quality: Quality) -> Result<Vec<u8>, CodecError> {
        let mut out = Vec::new();
        let format = self.kind().tag();
        let encode_err = |source| CodecError::Encode { format, source };
        match self {
            Self::Jpeg(img) => JpegEncoder::new_with_quality(&mut out, quality.value())
                .write_image(img.as_raw(), img.width(), img.height(), ExtendedColorType::Rgb8)
                .map_err(encode_err)?,
            Self::PngRgba(img) => PngEncoder::new(&mut out)
                .write_image(img.as_raw(), img.width(), img.height(), ExtendedColorType::Rgba8)
                .map_err(encode_err)?,
            Self::PngRgb(img) => PngEncoder::new(&mut out)
                .write_image(img.as_raw(), img.width(), img.height(), ExtendedColorType::Rgb8)
                .map_err(encode_err)?,
            Self::Gif(img) => {
                let mut encoder = GifEncoder::new(&mut out);
                encoder
                    .encode_frame(image::Frame::new(img.clone()))
                    .map_err(encode_err)?;
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{bmp_bytes, gif_bytes, jpeg_bytes, png_bytes, png_rgba_bytes};

    #[test]
    fn decode_reports_format_tags() {
        assert_eq!(decode(&jpeg_bytes(40, 30)).unwrap().tag, "jpeg");
        assert_eq!(decode(&png_bytes(40, 30)).unwrap().tag, "png");
        assert_eq!(decode(&gif_bytes(40, 30)).unwrap().tag, "gif");
        assert_eq!(decode(&bmp_bytes(40, 30)).unwrap().tag, "bmp");
    }

    #[test]
    fn decode_garbage_errors() {
        let result = decode(b"definitely not an image");
        assert!(matches!(result, Err(CodecError::Decode(_))));
    }

    #[test]
    fn png_variant_follows_alpha() {
        let opaque = decode(&png_bytes(10, 10)).unwrap();
        let raster = Raster::from_decoded(opaque.image, &opaque.tag).unwrap();
        assert!(matches!(raster, Raster::PngRgb(_)));

        let alpha = decode(&png_rgba_bytes(10, 10)).unwrap();
        let raster = Raster::from_decoded(alpha.image, &alpha.tag).unwrap();
        assert!(matches!(raster, Raster::PngRgba(_)));
    }

    #[test]
    fn unknown_tag_fails_closed() {
        let decoded = decode(&bmp_bytes(10, 10)).unwrap();
        let result = Raster::from_decoded(decoded.image, &decoded.tag);
        assert!(matches!(result, Err(CodecError::UnsupportedFormat(tag)) if tag == "bmp"));
    }

    #[test]
    fn resize_and_crop_keep_variant() {
        let decoded = decode(&gif_bytes(80, 60)).unwrap();
        let raster = Raster::from_decoded(decoded.image, &decoded.tag).unwrap();

        let resized = raster.resize(40, 30);
        assert!(matches!(resized, Raster::Gif(_)));
        assert_eq!(resized.dimensions(), (40, 30));

        let cropped = resized.crop(CropRect {
            x: 10,
            y: 5,
            width: 20,
            height: 20,
        });
        assert!(matches!(cropped, Raster::Gif(_)));
        assert_eq!(cropped.dimensions(), (20, 20));
    }

    #[test]
    fn crop_is_clamped_to_bounds() {
        let decoded = decode(&jpeg_bytes(50, 50)).unwrap();
        let raster = Raster::from_decoded(decoded.image, &decoded.tag).unwrap();
        let cropped = raster.crop(CropRect {
            x: 40,
            y: 0,
            width: 30,
            height: 50,
        });
        assert_eq!(cropped.dimensions(), (10, 50));
    }

    #[test]
    fn encode_roundtrips_each_kind() {
        for (bytes, tag) in [
            (jpeg_bytes(32, 24), "jpeg"),
            (png_bytes(32, 24), "png"),
            (png_rgba_bytes(32, 24), "png"),
            (gif_bytes(32, 24), "gif"),
        ] {
            let decoded = decode(&bytes).unwrap();
            let raster = Raster::from_decoded(decoded.image, &decoded.tag).unwrap();
            let encoded = raster.encode(Quality::default()).unwrap();

            let again = decode(&encoded).unwrap();
            assert_eq!(again.tag, tag);
            assert_eq!((again.image.width(), again.image.height()), (32, 24));
        }
    }

    #[test]
    fn jpeg_quality_changes_output_size() {
        let decoded = decode(&jpeg_bytes(128, 128)).unwrap();
        let raster = Raster::from_decoded(decoded.image, &decoded.tag).unwrap();
        let low = raster.encode(Quality::new(10)).unwrap();
        let high = raster.encode(Quality::new(95)).unwrap();
        assert!(low.len() < high.len());
    }

    #[test]
    fn open_reads_from_disk() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("x.png");
        std::fs::write(&path, png_bytes(12, 8)).unwrap();

        let raster = Raster::open(&path, ImageKind::Png).unwrap();
        assert_eq!(raster.kind(), ImageKind::Png);
        assert_eq!(raster.dimensions(), (12, 8));
    }

    #[test]
    fn open_missing_file_is_io_error() {
        let result = Raster::open(Path::new("/nonexistent/x.png"), ImageKind::Png);
        assert!(matches!(result, Err(CodecError::Io(_))));
    }
}
