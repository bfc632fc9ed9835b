//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. The
//! [`calculations`](super::calculations) module produces them from source
//! dimensions, and the [`codec`](super::codec) consumes them when it touches
//! pixels.
//!
//! ## Types
//!
//! - [`Quality`]: JPEG encoding quality (1–100, default 88). Clamped on construction.
//! - [`CropRect`]: Sub-image window in pixel coordinates of the resized image.
//! - [`ClipPlan`]: Resize-then-crop recipe for clipping to a fixed box.

/// Quality setting for lossy image encoding (1-100).
///
/// Only JPEG honours it; PNG is lossless and GIF uses its own palette encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u8);

impl Quality {
    pub fn new(value: u8) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(88)
    }
}

/// A rectangular window inside an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// How to clip a source to a fixed output box.
///
/// The source is first resized to `resize` (one axis matches the box), then
/// `crop` is cut out of the resized image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClipPlan {
    pub resize: (u32, u32),
    pub crop: CropRect,
}
