//! Image processing in pure Rust.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Sniff + decode** | `image::ImageReader` |
//! | **Scale to cap** | floor-truncated aspect math + Lanczos3 |
//! | **Clip to box** | resize on one axis + `crop_imm` on the other |
//! | **Encode** | JPEG (quality), PNG, GIF encoders from `image` |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Codec**: [`Raster`] tagged union and decode/encode
//! - **Operations**: High-level functions combining calculations + codec

mod calculations;
pub mod codec;
pub mod operations;
mod params;

pub use calculations::{
    CLIP_RESIZE_EDGE_LIMIT, CLIP_VERTICAL_THRESHOLD, plan_clip, scale_to_cap, source_window,
};
pub use codec::{CodecError, Decoded, ImageKind, Raster, decode};
pub use params::{ClipPlan, CropRect, Quality};
