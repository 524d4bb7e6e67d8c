// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public handle and enum types shared across the engine.

use crate::arena::ArenaId;

/// Handle of a draggable item (generational).
///
/// Handles become stale when the item is disposed; every operation taking a
/// stale handle is a no-op.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct DragId(pub(crate) u32, pub(crate) u32);

/// Handle of a drop list (generational).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct DropListId(pub(crate) u32, pub(crate) u32);

impl ArenaId for DragId {
    fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    fn idx(self) -> usize {
        self.0 as usize
    }

    fn generation(self) -> u32 {
        self.1
    }
}

impl ArenaId for DropListId {
    fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    fn idx(self) -> usize {
        self.0 as usize
    }

    fn generation(self) -> u32 {
        self.1
    }
}

/// Axis to which dragging can be locked.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Only horizontal movement is allowed.
    X,
    /// Only vertical movement is allowed.
    Y,
}

/// Direction in which the items of a drop list flow.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Orientation {
    /// Items are laid out left to right (or right to left in RTL).
    Horizontal,
    /// Items are laid out top to bottom.
    #[default]
    Vertical,
}

/// Text direction of a drop list, as resolved by the host.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Left to right.
    #[default]
    Ltr,
    /// Right to left.
    Rtl,
}

/// Debounced direction of pointer travel on each axis.
///
/// Each component is `-1`, `0`, or `1`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct PointerDelta {
    /// Horizontal direction: `-1` left, `1` right.
    pub x: i8,
    /// Vertical direction: `-1` up, `1` down.
    pub y: i8,
}

impl PointerDelta {
    /// No recorded direction.
    pub const ZERO: Self = Self { x: 0, y: 0 };

    /// Component along the given list orientation.
    pub const fn along(self, orientation: Orientation) -> i8 {
        match orientation {
            Orientation::Horizontal => self.x,
            Orientation::Vertical => self.y,
        }
    }
}

/// Lifecycle phase of a draggable item.
///
/// An item is routed pointer events from [`DragPhase::PendingThreshold`] on, but it is
/// only considered *started* (visible events, sorting) in [`DragPhase::Dragging`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum DragPhase {
    /// Nothing is happening.
    #[default]
    Idle,
    /// Pointer is down; waiting for the movement threshold and start delay.
    PendingThreshold,
    /// The drag sequence has started.
    Dragging,
    /// Pointer was released; the preview is animating back to the placeholder.
    Ending,
}
