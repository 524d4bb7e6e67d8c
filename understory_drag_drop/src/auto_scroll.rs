// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Edge detection for scrolling while dragging.

use kurbo::{Rect, Vec2};

use crate::host::{ScrollMetrics, ScrollTarget};
use crate::types::Direction;

/// Fraction of a node's size, measured from each edge, that triggers scrolling.
pub const SCROLL_PROXIMITY_THRESHOLD: f64 = 0.05;

/// Vertical scroll direction.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum VerticalScroll {
    /// Not scrolling.
    #[default]
    None,
    /// Towards the top.
    Up,
    /// Towards the bottom.
    Down,
}

/// Horizontal scroll direction.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum HorizontalScroll {
    /// Not scrolling.
    #[default]
    None,
    /// Towards the left.
    Left,
    /// Towards the right.
    Right,
}

/// Which edge band of `rect`, if any, `y` is in.
pub fn vertical_scroll_direction(rect: &Rect, y: f64) -> VerticalScroll {
    let threshold = rect.height() * SCROLL_PROXIMITY_THRESHOLD;
    if y >= rect.y0 - threshold && y <= rect.y0 + threshold {
        VerticalScroll::Up
    } else if y >= rect.y1 - threshold && y <= rect.y1 + threshold {
        VerticalScroll::Down
    } else {
        VerticalScroll::None
    }
}

/// Which edge band of `rect`, if any, `x` is in.
pub fn horizontal_scroll_direction(rect: &Rect, x: f64) -> HorizontalScroll {
    let threshold = rect.width() * SCROLL_PROXIMITY_THRESHOLD;
    if x >= rect.x0 - threshold && x <= rect.x0 + threshold {
        HorizontalScroll::Left
    } else if x >= rect.x1 - threshold && x <= rect.x1 + threshold {
        HorizontalScroll::Right
    } else {
        HorizontalScroll::None
    }
}

/// Directions an element can still scroll in, given where the pointer is.
///
/// A direction is dropped when the element is already at that end. In RTL,
/// `scroll_left` runs from zero down to negative values.
pub fn element_scroll_directions(
    metrics: &ScrollMetrics,
    rect: &Rect,
    direction: Direction,
    x: f64,
    y: f64,
) -> (VerticalScroll, HorizontalScroll) {
    let vertical = match vertical_scroll_direction(rect, y) {
        VerticalScroll::Up if metrics.scroll_top > 0.0 => VerticalScroll::Up,
        VerticalScroll::Down
            if metrics.scroll_height - metrics.scroll_top > metrics.client_height =>
        {
            VerticalScroll::Down
        }
        _ => VerticalScroll::None,
    };

    let left = metrics.scroll_left;
    let horizontal = match (horizontal_scroll_direction(rect, x), direction) {
        (HorizontalScroll::Right, Direction::Rtl) if left < 0.0 => HorizontalScroll::Right,
        (HorizontalScroll::Left, Direction::Rtl)
            if metrics.scroll_width + left > metrics.client_width =>
        {
            HorizontalScroll::Left
        }
        (HorizontalScroll::Left, Direction::Ltr) if left > 0.0 => HorizontalScroll::Left,
        (HorizontalScroll::Right, Direction::Ltr)
            if metrics.scroll_width - left > metrics.client_width =>
        {
            HorizontalScroll::Right
        }
        _ => HorizontalScroll::None,
    };

    (vertical, horizontal)
}

/// Auto-scroll target and direction of one list.
#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) struct AutoScroll<E> {
    pub(crate) node: Option<ScrollTarget<E>>,
    pub(crate) vertical: VerticalScroll,
    pub(crate) horizontal: HorizontalScroll,
    /// The per-frame interval is running.
    pub(crate) running: bool,
}

impl<E> Default for AutoScroll<E> {
    fn default() -> Self {
        Self {
            node: None,
            vertical: VerticalScroll::None,
            horizontal: HorizontalScroll::None,
            running: false,
        }
    }
}

impl<E: Copy + PartialEq> AutoScroll<E> {
    /// Record a new target. Returns whether anything changed.
    pub(crate) fn retarget(
        &mut self,
        node: ScrollTarget<E>,
        vertical: VerticalScroll,
        horizontal: HorizontalScroll,
    ) -> bool {
        if self.node == Some(node) && self.vertical == vertical && self.horizontal == horizontal {
            return false;
        }
        self.node = Some(node);
        self.vertical = vertical;
        self.horizontal = horizontal;
        true
    }

    pub(crate) fn is_active(&self) -> bool {
        self.vertical != VerticalScroll::None || self.horizontal != HorizontalScroll::None
    }

    pub(crate) fn stop(&mut self) {
        *self = Self::default();
    }

    /// The scroll calls one frame makes, vertical first.
    pub(crate) fn frame_steps(&self, step: f64) -> [Option<Vec2>; 2] {
        let vertical = match self.vertical {
            VerticalScroll::Up => Some(Vec2::new(0.0, -step)),
            VerticalScroll::Down => Some(Vec2::new(0.0, step)),
            VerticalScroll::None => None,
        };
        let horizontal = match self.horizontal {
            HorizontalScroll::Left => Some(Vec2::new(-step, 0.0)),
            HorizontalScroll::Right => Some(Vec2::new(step, 0.0)),
            HorizontalScroll::None => None,
        };
        [vertical, horizontal]
    }
}
