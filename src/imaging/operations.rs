//! High-level image operations.
//!
//! These functions combine calculations with codec execution: they take a
//! raster and sizing inputs, compute the target geometry, and return a new
//! raster. The input is never modified.

use super::calculations::{CLIP_RESIZE_EDGE_LIMIT, plan_clip, scale_to_cap, source_window};
use super::codec::Raster;
use tracing::debug;

/// Scale `raster` so its longer edge fits under `cap`.
///
/// A raster that already fits is returned as an untouched copy, without
/// resampling.
pub fn scale(raster: &Raster, cap: u32) -> Raster {
    let source = raster.dimensions();
    let (width, height) = scale_to_cap(source, cap);
    if (width, height) == source {
        return raster.clone();
    }
    debug!(?source, width, height, cap, "scale to cap");
    raster.resize(width, height)
}

/// Resize to exactly `width` x `height`, ignoring the source aspect ratio.
pub fn resize_exact(raster: &Raster, width: u32, height: u32) -> Raster {
    if raster.dimensions() == (width, height) {
        return raster.clone();
    }
    debug!(source = ?raster.dimensions(), width, height, "exact resize");
    raster.resize(width, height)
}

/// Clip `raster` to a `width` x `height` box: resize so one axis matches,
/// then cut the box out of the other axis.
///
/// Extreme aspect ratios would need an oversized intermediate; those crop
/// the matching window from the source and resize only that.
pub fn clip(raster: &Raster, width: u32, height: u32) -> Raster {
    let source = raster.dimensions();
    let plan = plan_clip(source, (width, height));
    debug!(?source, ?plan, "clip to box");
    let (resize_w, resize_h) = plan.resize;
    if resize_w.max(resize_h) <= CLIP_RESIZE_EDGE_LIMIT {
        return raster.resize(resize_w, resize_h).crop(plan.crop);
    }
    let window = source_window(source, &plan);
    debug!(?window, "clip from source window");
    raster
        .crop(window)
        .resize(plan.crop.width, plan.crop.height)
}
