// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rectangle and transform helpers.
//!
//! Cached rectangles are plain [`kurbo::Rect`] values (`x0` = left, `y0` = top,
//! `x1` = right, `y1` = bottom). They are adjusted in place when something
//! scrolls or moves, instead of being measured again, because measuring forces
//! a synchronous layout in most hosts.
//!
//! ```
//! use kurbo::Rect;
//! use understory_drag_drop::geometry::{adjust_rect, is_inside_rect};
//!
//! let mut rect = Rect::new(0.0, 0.0, 100.0, 50.0);
//! adjust_rect(&mut rect, -20.0, 10.0);
//! assert_eq!(rect, Rect::new(10.0, -20.0, 110.0, 30.0));
//! assert!(is_inside_rect(&rect, 10.0, 30.0));
//! ```

use alloc::format;
use alloc::string::String;

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;
use kurbo::Rect;

/// Whether the point lies inside the rectangle, edges included.
pub fn is_inside_rect(rect: &Rect, x: f64, y: f64) -> bool {
    y >= rect.y0 && y <= rect.y1 && x >= rect.x0 && x <= rect.x1
}

/// Whether the point lies within the rectangle grown by `threshold` times its size on each side.
///
/// The comparison is strict, so a point exactly on the grown edge is not near.
pub fn is_pointer_near_rect(rect: &Rect, threshold: f64, x: f64, y: f64) -> bool {
    let x_threshold = rect.width() * threshold;
    let y_threshold = rect.height() * threshold;
    y > rect.y0 - y_threshold
        && y < rect.y1 + y_threshold
        && x > rect.x0 - x_threshold
        && x < rect.x1 + x_threshold
}

/// Shift a cached rectangle by `top` and `left`, keeping its size.
pub fn adjust_rect(rect: &mut Rect, top: f64, left: f64) {
    let width = rect.width();
    let height = rect.height();
    rect.y0 += top;
    rect.y1 = rect.y0 + height;
    rect.x0 += left;
    rect.x1 = rect.x0 + width;
}

/// Clamp `value` into `[min, max]`.
///
/// Unlike [`f64::clamp`] this never panics; when `min > max`, `min` wins.
pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
    min.max(max.min(value))
}

/// Round half up, matching how style engines round pixel offsets.
pub fn round_px(value: f64) -> f64 {
    (value + 0.5).floor()
}

/// A `translate3d` transform with both components rounded to whole pixels.
///
/// Sub-pixel translations blur text in most renderers.
pub fn translate3d(x: f64, y: f64) -> String {
    format!("translate3d({}px, {}px, 0)", round_px(x), round_px(y))
}

/// Prepend `transform` to an element's pre-existing transform.
///
/// Our translation goes first so that rotations or scales in `initial` do not change which way
/// the element moves.
pub fn combine_transforms(transform: &str, initial: Option<&str>) -> String {
    match initial {
        Some(initial) if !initial.is_empty() && initial != "none" => {
            format!("{transform} {initial}")
        }
        _ => String::from(transform),
    }
}
