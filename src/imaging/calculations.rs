//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.
//! Arithmetic is integer-only and truncates, so the same source always
//! yields the same output size on every platform.

use super::params::{ClipPlan, CropRect};

/// Resized height at which [`plan_clip`] switches from a horizontal crop to a
/// vertical one.
pub const CLIP_VERTICAL_THRESHOLD: u32 = 135;

/// Fit `source` under `cap` on its longer edge, preserving aspect ratio.
///
/// Sources that already fit are returned unchanged. Otherwise the longer
/// edge becomes `cap` and the shorter edge is scaled proportionally with
/// floor division. The shorter edge never drops below one pixel.
///
/// # Examples
/// ```
/// # use media_ingest::imaging::scale_to_cap;
/// assert_eq!(scale_to_cap((2000, 1000), 1280), (1280, 640));
/// assert_eq!(scale_to_cap((1000, 3000), 720), (240, 720));
/// assert_eq!(scale_to_cap((640, 480), 1280), (640, 480));
/// ```
pub fn scale_to_cap(source: (u32, u32), cap: u32) -> (u32, u32) {
    let (w, h) = source;
    if w < h && h > cap {
        (floor_scale(w, cap, h), cap)
    } else if w >= h && w > cap {
        (cap, floor_scale(h, cap, w))
    } else {
        (w, h)
    }
}

/// Plan a clip of `source` to exactly `target` (width, height).
///
/// The axis rule:
/// - Scale to the target width. If the resulting height exceeds
///   [`CLIP_VERTICAL_THRESHOLD`], resize to `(target_w, scaled_h)` and crop
///   vertically with the top edge at a quarter of the overflow, which keeps
///   more of the upper part of the frame.
/// - Otherwise resize to `(scaled_w, target_h)` and crop horizontally,
///   centered (half the overflow on each side).
///
/// When the resized image is smaller than the box on the cropped axis the
/// window is clamped to the image, so the result may be smaller than
/// `target` on that axis.
pub fn plan_clip(source: (u32, u32), target: (u32, u32)) -> ClipPlan {
    let (src_w, src_h) = source;
    let (tgt_w, tgt_h) = target;

    let scaled_h = floor_scale(src_h, tgt_w, src_w);
    let scaled_w = floor_scale(src_w, tgt_h, src_h);

    if scaled_h > CLIP_VERTICAL_THRESHOLD {
        let y = (i64::from(scaled_h) - i64::from(tgt_h)) / 4;
        let (y, height) = clamp_span(y, tgt_h, scaled_h);
        ClipPlan {
            resize: (tgt_w, scaled_h),
            crop: CropRect {
                x: 0,
                y,
                width: tgt_w,
                height,
            },
        }
    } else {
        let x = (i64::from(scaled_w) - i64::from(tgt_w)) / 2;
        let (x, width) = clamp_span(x, tgt_w, scaled_w);
        ClipPlan {
            resize: (scaled_w, tgt_h),
            crop: CropRect {
                x,
                y: 0,
                width,
                height: tgt_h,
            },
        }
    }
}

/// Longest intermediate edge [`plan_clip`]'s resize may produce before the
/// clip is executed crop-first on the source instead.
pub const CLIP_RESIZE_EDGE_LIMIT: u32 = 8192;

/// Map `plan`'s crop window back onto the unresized `source`.
///
/// Cropping this window and resizing it to the crop size gives the same
/// framing as resizing first, without materializing the full resize. The
/// window is at least one pixel on each axis and lies inside the source.
pub fn source_window(source: (u32, u32), plan: &ClipPlan) -> CropRect {
    let (src_w, src_h) = source;
    let (resized_w, resized_h) = plan.resize;
    let (x, width) = map_span(plan.crop.x, plan.crop.width, src_w, resized_w);
    let (y, height) = map_span(plan.crop.y, plan.crop.height, src_h, resized_h);
    CropRect {
        x,
        y,
        width,
        height,
    }
}

fn map_span(offset: u32, len: u32, source: u32, resized: u32) -> (u32, u32) {
    let last = source.saturating_sub(1);
    let start = u64::from(offset) * u64::from(source) / u64::from(resized.max(1));
    let start = u32::try_from(start).unwrap_or(last).min(last);
    let len = floor_scale(len, source, resized).min(source - start);
    (start, len)
}

/// `value * numerator / denominator` with floor division, at least 1.
fn floor_scale(value: u32, numerator: u32, denominator: u32) -> u32 {
    let scaled = u64::from(value) * u64::from(numerator) / u64::from(denominator.max(1));
    u32::try_from(scaled).unwrap_or(u32::MAX).max(1)
}

/// Intersect the span `[start, start + len)` with `[0, bound)`.
fn clamp_span(start: i64, len: u32, bound: u32) -> (u32, u32) {
    let lo = start.max(0);
    let hi = (start + i64::from(len)).min(i64::from(bound));
    let width = (hi - lo).max(0);
    // Both values are within [0, bound] after clamping.
    (lo as u32, width as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // scale_to_cap tests
    // =========================================================================

    #[test]
    fn scale_landscape_over_cap() {
        assert_eq!(scale_to_cap((2000, 1000), 1280), (1280, 640));
    }

    #[test]
    fn scale_portrait_over_cap() {
        assert_eq!(scale_to_cap((1000, 2000), 1280), (640, 1280));
    }

    #[test]
    fn scale_square_over_cap() {
        assert_eq!(scale_to_cap((3000, 3000), 720), (720, 720));
    }

    #[test]
    fn scale_under_cap_passes_through() {
        assert_eq!(scale_to_cap((800, 600), 1280), (800, 600));
        assert_eq!(scale_to_cap((1280, 1280), 1280), (1280, 1280));
    }

    #[test]
    fn scale_truncates_instead_of_rounding() {
        // 999 * 720 / 1000 = 719.28 → 719
        assert_eq!(scale_to_cap((1000, 999), 720), (720, 719));
        // 1001 * 720 / 1300 = 554.4 → 554
        assert_eq!(scale_to_cap((1001, 1300), 720), (554, 720));
    }

    #[test]
    fn scale_never_produces_zero_edge() {
        assert_eq!(scale_to_cap((1, 5000), 720), (1, 720));
    }

    #[test]
    fn scale_output_fits_cap_for_many_shapes() {
        for w in (1..4000).step_by(97) {
            for h in (1..4000).step_by(89) {
                let (ow, oh) = scale_to_cap((w, h), 1280);
                if w.max(h) > 1280 {
                    assert!(ow.max(oh) <= 1280, "{w}x{h} → {ow}x{oh}");
                    assert_eq!(ow.max(oh), 1280);
                } else {
                    assert_eq!((ow, oh), (w, h));
                }
            }
        }
    }

    // =========================================================================
    // plan_clip tests
    // =========================================================================

    #[test]
    fn clip_wide_source_crops_horizontally_centered() {
        // 400x100 → 200x200: scaled height 50 ≤ 135, so width scales to 800
        let plan = plan_clip((400, 100), (200, 200));
        assert_eq!(plan.resize, (800, 200));
        assert_eq!(
            plan.crop,
            CropRect {
                x: 300,
                y: 0,
                width: 200,
                height: 200
            }
        );
    }

    #[test]
    fn clip_tall_source_crops_vertically_at_quarter() {
        // 300x600 → 200x200: scaled height 400 > 135
        let plan = plan_clip((300, 600), (200, 200));
        assert_eq!(plan.resize, (200, 400));
        // overflow 200, a quarter of it → 50
        assert_eq!(
            plan.crop,
            CropRect {
                x: 0,
                y: 50,
                width: 200,
                height: 200
            }
        );
    }

    #[test]
    fn clip_threshold_is_exclusive() {
        // scaled height exactly 135 takes the horizontal branch
        let plan = plan_clip((200, 270), (100, 200));
        assert_eq!(plan.resize, (148, 200));
        assert_eq!(
            plan.crop,
            CropRect {
                x: 24,
                y: 0,
                width: 100,
                height: 200
            }
        );

        // 136 takes the vertical branch
        let plan = plan_clip((200, 272), (100, 200));
        assert_eq!(plan.resize, (100, 136));
        assert_eq!(plan.crop.y, 0);
        assert_eq!(plan.crop.height, 136);
    }

    #[test]
    fn clip_vertical_branch_clamps_short_image() {
        // scaled height 150 is above the threshold but below the box height
        let plan = plan_clip((200, 150), (200, 300));
        assert_eq!(plan.resize, (200, 150));
        assert_eq!(
            plan.crop,
            CropRect {
                x: 0,
                y: 0,
                width: 200,
                height: 150
            }
        );
    }

    #[test]
    fn source_window_for_extreme_aspect() {
        // 1000x1 → 200x200 would resize to 200000x200 first
        let plan = plan_clip((1000, 1), (200, 200));
        assert_eq!(plan.resize, (200_000, 200));
        assert!(plan.resize.0 > CLIP_RESIZE_EDGE_LIMIT);
        assert_eq!(
            source_window((1000, 1), &plan),
            CropRect {
                x: 499,
                y: 0,
                width: 1,
                height: 1
            }
        );
    }

    #[test]
    fn source_window_matches_plan_framing() {
        // 400x100 → 200x200: crop x 300..500 of 800 is 150..250 of 400
        let plan = plan_clip((400, 100), (200, 200));
        assert_eq!(
            source_window((400, 100), &plan),
            CropRect {
                x: 150,
                y: 0,
                width: 100,
                height: 100
            }
        );
    }

    #[test]
    fn clip_same_aspect_is_full_frame() {
        let plan = plan_clip((100, 100), (120, 120));
        assert_eq!(plan.resize, (120, 120));
        assert_eq!(
            plan.crop,
            CropRect {
                x: 0,
                y: 0,
                width: 120,
                height: 120
            }
        );
    }
}
