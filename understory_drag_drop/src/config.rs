// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Engine-wide, per-item, and per-list options.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use kurbo::{Point, Rect};

use crate::types::{Axis, Direction, DragId, DropListId, Orientation};

/// Preview stacking order used when [`DragDropConfig::z_index`] is unset.
pub const DEFAULT_PREVIEW_Z_INDEX: i32 = 1000;

/// Options shared by every item of a [`DragDrop`](crate::DragDrop).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DragDropConfig {
    /// Manhattan distance in pixels the pointer must travel before a drag starts.
    pub drag_start_threshold: f64,
    /// Distance in pixels the pointer must travel against the current direction
    /// before the recorded direction flips.
    pub pointer_direction_change_threshold: f64,
    /// Stacking order of previews; [`DEFAULT_PREVIEW_Z_INDEX`] when `None`.
    pub z_index: Option<i32>,
}

impl Default for DragDropConfig {
    fn default() -> Self {
        Self {
            drag_start_threshold: 5.0,
            pointer_direction_change_threshold: 5.0,
            z_index: None,
        }
    }
}

impl DragDropConfig {
    /// Stacking order previews are created with.
    pub fn preview_z_index(&self) -> i32 {
        self.z_index.unwrap_or(DEFAULT_PREVIEW_Z_INDEX)
    }
}

/// Time in milliseconds a pointer must be held before a drag may start.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DragStartDelay {
    /// Same delay for every pointer type.
    Uniform(u64),
    /// Separate delays for touch and mouse.
    PerPointer {
        /// Delay for touch sequences.
        touch: u64,
        /// Delay for mouse sequences.
        mouse: u64,
    },
}

impl Default for DragStartDelay {
    fn default() -> Self {
        Self::Uniform(0)
    }
}

impl DragStartDelay {
    /// Delay for a sequence started by a touch (`true`) or a mouse.
    pub fn for_pointer(self, is_touch: bool) -> u64 {
        match self {
            Self::Uniform(delay) => delay,
            Self::PerPointer { touch, mouse } => {
                if is_touch {
                    touch
                } else {
                    mouse
                }
            }
        }
    }
}

/// Where the preview of a list item is attached.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum PreviewContainer<E> {
    /// The enclosing shadow root, else the fullscreen element, else the body.
    #[default]
    Global,
    /// The original parent of the item.
    Parent,
    /// A specific element.
    Element(E),
}

/// Maps `(pointer, item, initial_rect, pickup_in_element)` to the position to use.
pub type ConstrainPosition = Box<dyn Fn(Point, DragId, Rect, Point) -> Point>;

/// Options of one draggable item.
pub struct DragOptions<E> {
    /// The item ignores pointers.
    pub disabled: bool,
    /// Restrict movement to one axis.
    pub lock_axis: Option<Axis>,
    /// Hold time before the drag may start.
    pub drag_start_delay: DragStartDelay,
    /// Extra classes for the preview.
    pub preview_class: Vec<String>,
    /// Where the preview is attached.
    pub preview_container: PreviewContainer<E>,
    /// Custom position constraint, applied before axis lock and boundary.
    pub constrain_position: Option<ConstrainPosition>,
    /// Element the dragged item may not leave.
    pub boundary_element: Option<E>,
    /// Zoom factor of the item's container; transforms are divided by it.
    pub scale: f64,
}

impl<E> Default for DragOptions<E> {
    fn default() -> Self {
        Self {
            disabled: false,
            lock_axis: None,
            drag_start_delay: DragStartDelay::default(),
            preview_class: Vec::new(),
            preview_container: PreviewContainer::Global,
            constrain_position: None,
            boundary_element: None,
            scale: 1.0,
        }
    }
}

impl<E: fmt::Debug> fmt::Debug for DragOptions<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DragOptions")
            .field("disabled", &self.disabled)
            .field("lock_axis", &self.lock_axis)
            .field("drag_start_delay", &self.drag_start_delay)
            .field("preview_class", &self.preview_class)
            .field("preview_container", &self.preview_container)
            .field("constrain_position", &self.constrain_position.is_some())
            .field("boundary_element", &self.boundary_element)
            .field("scale", &self.scale)
            .finish()
    }
}

/// Decides whether an item may enter a list.
pub type EnterPredicate = Box<dyn Fn(DragId, DropListId) -> bool>;

/// Decides whether an item may be sorted to an index of a list.
pub type SortPredicate = Box<dyn Fn(usize, DragId, DropListId) -> bool>;

/// Options of one drop list.
pub struct DropListOptions {
    /// Items of this list cannot be dragged.
    pub disabled: bool,
    /// Items keep their order; re-entering restores the original index.
    pub sorting_disabled: bool,
    /// Never scroll while dragging near edges.
    pub auto_scroll_disabled: bool,
    /// Pixels scrolled per animation frame.
    pub auto_scroll_step: f64,
    /// Layout direction of the items.
    pub orientation: Orientation,
    /// Restrict movement of items inside this list to one axis.
    pub lock_axis: Option<Axis>,
    /// Text direction, used by horizontal lists.
    pub direction: Direction,
    /// Accepts everything by default.
    pub enter_predicate: EnterPredicate,
    /// Accepts every index by default.
    pub sort_predicate: SortPredicate,
}

impl Default for DropListOptions {
    fn default() -> Self {
        Self {
            disabled: false,
            sorting_disabled: false,
            auto_scroll_disabled: false,
            auto_scroll_step: 2.0,
            orientation: Orientation::Vertical,
            lock_axis: None,
            direction: Direction::Ltr,
            enter_predicate: Box::new(|_, _| true),
            sort_predicate: Box::new(|_, _, _| true),
        }
    }
}

impl fmt::Debug for DropListOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DropListOptions")
            .field("disabled", &self.disabled)
            .field("sorting_disabled", &self.sorting_disabled)
            .field("auto_scroll_disabled", &self.auto_scroll_disabled)
            .field("auto_scroll_step", &self.auto_scroll_step)
            .field("orientation", &self.orientation)
            .field("lock_axis", &self.lock_axis)
            .field("direction", &self.direction)
            .finish_non_exhaustive()
    }
}
