// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Events fed into the engine and events it emits.
//!
//! Input events are plain data copied out of the host's native events. The
//! engine writes back into them only through `default_prevented`, which the
//! host should forward to the native event.

use alloc::vec::Vec;

use kurbo::{Point, Vec2};

use crate::host::ScrollTarget;
use crate::types::{DragId, DropListId, PointerDelta};

/// Kind of a pointer event.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PointerKind {
    /// `mousedown`.
    MouseDown,
    /// `mousemove`.
    MouseMove,
    /// `mouseup`.
    MouseUp,
    /// `touchstart`.
    TouchStart,
    /// `touchmove`.
    TouchMove,
    /// `touchend`.
    TouchEnd,
    /// `touchcancel`.
    TouchCancel,
}

impl PointerKind {
    /// Whether this is a touch event.
    pub const fn is_touch(self) -> bool {
        matches!(
            self,
            Self::TouchStart | Self::TouchMove | Self::TouchEnd | Self::TouchCancel
        )
    }
}

/// The touch point a touch event is about.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TouchPoint {
    /// Touch identifier.
    pub identifier: i64,
    /// Contact ellipse radii, if the platform reports them.
    pub radius: Option<Vec2>,
}

/// A mouse or touch event.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PointerEvent<E> {
    /// Event kind.
    pub kind: PointerKind,
    /// Page position of the mouse, or of the first (changed) touch.
    pub page: Point,
    /// Event target.
    pub target: Option<E>,
    /// Mouse button that changed (`0` is primary).
    pub button: u8,
    /// Mouse buttons currently held, as a bit mask.
    pub buttons: u16,
    /// Number of touches on the target.
    pub touch_count: u8,
    /// First touch, for touch events.
    pub touch: Option<TouchPoint>,
    /// Event time in milliseconds.
    pub timestamp: u64,
    /// Whether the native event is cancelable.
    pub cancelable: bool,
    /// Whether the target is natively draggable (`draggable="true"`).
    pub target_is_draggable: bool,
    /// Set by the engine when the native default action should be prevented.
    pub default_prevented: bool,
}

impl<E> PointerEvent<E> {
    /// A primary-button mouse event at `page`.
    pub fn mouse(kind: PointerKind, page: Point, timestamp: u64) -> Self {
        Self {
            kind,
            page,
            target: None,
            button: 0,
            buttons: 1,
            touch_count: 0,
            touch: None,
            timestamp,
            cancelable: true,
            target_is_draggable: false,
            default_prevented: false,
        }
    }

    /// A single-finger touch event at `page`.
    pub fn touch(kind: PointerKind, page: Point, timestamp: u64) -> Self {
        Self {
            kind,
            page,
            target: None,
            button: 0,
            buttons: 0,
            touch_count: 1,
            touch: Some(TouchPoint {
                identifier: 0,
                radius: Some(Vec2::new(11.5, 11.5)),
            }),
            timestamp,
            cancelable: true,
            target_is_draggable: false,
            default_prevented: false,
        }
    }

    /// Set the event target.
    #[must_use]
    pub fn with_target(mut self, target: E) -> Self {
        self.target = Some(target);
        self
    }

    /// Set the mouse button and held buttons.
    #[must_use]
    pub fn with_buttons(mut self, button: u8, buttons: u16) -> Self {
        self.button = button;
        self.buttons = buttons;
        self
    }

    /// Set the touch point and the number of touches.
    #[must_use]
    pub fn with_touch(mut self, touch: TouchPoint, touch_count: u8) -> Self {
        self.touch = Some(touch);
        self.touch_count = touch_count;
        self
    }

    /// Whether a screen reader synthesized this `mousedown`.
    pub fn is_fake_mousedown(&self) -> bool {
        self.buttons == 0
    }

    /// Whether a screen reader synthesized this `touchstart`.
    ///
    /// Such touches carry identifier `-1` and unit (or missing) radii.
    pub fn is_fake_touchstart(&self) -> bool {
        self.touch.is_some_and(|touch| {
            touch.identifier == -1
                && touch
                    .radius
                    .is_none_or(|radius| radius.x == 1.0 && radius.y == 1.0)
        })
    }

    pub(crate) fn prevent_default(&mut self) {
        if self.cancelable {
            self.default_prevented = true;
        }
    }
}

/// A `scroll` event.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ScrollEvent<E> {
    /// What scrolled.
    pub target: ScrollTarget<E>,
}

/// A `transitionend` event.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TransitionEndEvent<'a, E> {
    /// Element whose transition ended.
    pub target: E,
    /// The transitioned CSS property.
    pub property_name: &'a str,
}

/// A cancelable event with only a target: `selectstart` or `dragstart`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TargetEvent<E> {
    /// Event target.
    pub target: Option<E>,
    /// Set by the engine when the native default action should be prevented.
    pub default_prevented: bool,
}

impl<E> TargetEvent<E> {
    /// An event on `target`.
    pub fn new(target: Option<E>) -> Self {
        Self {
            target,
            default_prevented: false,
        }
    }
}

/// Emitted when an item is dropped.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DropEvent<E> {
    /// The dropped item.
    pub item: DragId,
    /// Index in `container` the item was dropped at.
    pub current_index: usize,
    /// Index in `previous_container` the item was picked up from.
    pub previous_index: usize,
    /// List the item was dropped into.
    pub container: DropListId,
    /// List the item was picked up from.
    pub previous_container: DropListId,
    /// Whether the pointer was over `container` on release.
    pub is_pointer_over_container: bool,
    /// Pointer travel since pickup.
    pub distance: Vec2,
    /// Client position of the pointer on release.
    pub drop_point: Point,
    /// The releasing event.
    pub event: PointerEvent<E>,
}

/// Lifecycle events of one draggable item.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum DragEvent<E> {
    /// A pointer went down on the item, before any checks.
    BeforeStarted,
    /// The drag started.
    Started {
        /// The move that crossed the threshold.
        event: PointerEvent<E>,
    },
    /// The pointer was released; the item may still animate.
    Released {
        /// The releasing event.
        event: PointerEvent<E>,
    },
    /// The drag sequence is over.
    Ended {
        /// Pointer travel since pickup.
        distance: Vec2,
        /// Client position of the pointer on release.
        drop_point: Point,
        /// The releasing event.
        event: PointerEvent<E>,
    },
    /// The item moved into a list.
    Entered {
        /// The list.
        container: DropListId,
        /// Index of the item in the list.
        current_index: usize,
    },
    /// The item left a list.
    Exited {
        /// The list.
        container: DropListId,
    },
    /// The item was dropped into a list.
    Dropped(DropEvent<E>),
}

/// High-frequency move notification, only produced while someone listens.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DragMoved<E> {
    /// Constrained client position of the pointer.
    pub pointer_position: Point,
    /// The move event.
    pub event: PointerEvent<E>,
    /// Pointer travel since pickup.
    pub distance: Vec2,
    /// Debounced travel direction.
    pub delta: PointerDelta,
}

/// Lifecycle events of one drop list.
#[derive(Clone, Debug, PartialEq)]
pub enum DropListEvent<E> {
    /// The list is about to start a drag.
    BeforeStarted,
    /// An item entered the list.
    Entered {
        /// The item.
        item: DragId,
        /// Index the item was placed at.
        current_index: usize,
    },
    /// An item left the list.
    Exited {
        /// The item.
        item: DragId,
    },
    /// An item was dropped into the list.
    Dropped(DropEvent<E>),
    /// The dragged item changed position within the list.
    Sorted {
        /// The item.
        item: DragId,
        /// Index before the move.
        previous_index: usize,
        /// Index after the move.
        current_index: usize,
    },
    /// A connected list started a drag whose items this list accepts.
    ReceivingStarted {
        /// The list the drag started in.
        initiator: DropListId,
        /// Items being dragged.
        items: Vec<DragId>,
    },
    /// The connected list's drag finished.
    ReceivingStopped {
        /// The list the drag started in.
        initiator: DropListId,
    },
}
