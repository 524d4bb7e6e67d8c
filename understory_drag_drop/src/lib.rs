// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_drag_drop --heading-base-level=0

//! Understory Drag Drop: a headless drag-and-drop engine.
//!
//! The engine owns the state machine of pointer-driven dragging: arming on press, starting once the
//! pointer has travelled far enough, following the pointer with a preview while a placeholder keeps
//! the item's slot, re-sorting sibling items, auto-scrolling near edges, transferring items between
//! connected lists, and animating the preview back on release.
//!
//! It never touches a document directly. Everything it reads (rectangles, scroll offsets, the element
//! under a point) and everything it writes (transforms, nodes, listeners) goes through a [`DragHost`].
//!
//! ## Where this fits
//!
//! - The host owns the document and the real order of items.
//! - [`DragDrop`] owns drag state and translates pointer input into transforms and events.
//! - Application code listens to [`DropListEvent::Dropped`] and reorders its data, then calls
//!   [`DragDrop::with_items`] with the new order.
//!
//! Nothing is reordered in the document by the engine. During a drag, sorting only writes transforms;
//! after a drop every transform is reset and the host is expected to move the nodes.
//!
//! ## API overview
//!
//! - [`DragDrop`]: the engine. Items and lists are created on it and addressed by handle.
//! - [`DragId`] / [`DropListId`]: generational handles. Stale handles are ignored.
//! - [`DragHost`]: the document seam; implement it once per host.
//! - [`DragOptions`] / [`DropListOptions`] / [`DragDropConfig`]: per-item, per-list, and engine options.
//! - [`DragEvent`] / [`DragMoved`] / [`DropListEvent`]: what the engine reports, through [`Emitter`]s.
//! - [`PointerRouter`]: the shared registry deciding which global listeners are bound.
//!
//! Input flows in through these entry points:
//! - [`DragDrop::pointer_down`] and [`DragDrop::native_drag_start`] from listeners on each item root.
//! - [`DragDrop::global_pointer_move`], [`DragDrop::global_pointer_up`], [`DragDrop::global_scroll`],
//!   [`DragDrop::shadow_root_scroll`], and [`DragDrop::select_start`] from the listeners the engine asks
//!   the host to bind (see [`GlobalListener`]).
//! - [`DragDrop::transition_end`] and [`DragDrop::tick`] to complete drop animations.
//! - [`DragDrop::animation_frame`] while [`DragDrop::wants_animation_frame`] is true.
//!
//! ## Lifecycle
//!
//! An item is [`DragPhase::Idle`] until a press arms it ([`DragPhase::PendingThreshold`]). Once the
//! pointer travels [`DragDropConfig::drag_start_threshold`] pixels (Manhattan distance) after the start
//! delay, it becomes [`DragPhase::Dragging`]. Releasing a list item moves it to
//! [`DragPhase::Ending`] until the preview's transition finishes; free items return to idle directly.
//!
//! ## Features
//!
//! - `std` (default): use the standard library for float math.
//! - `libm`: float math for `no_std` targets.
//! - `tracing`: structured diagnostics for drag sequences through the `tracing` crate.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

#[cfg(test)]
extern crate std;

pub mod geometry;

mod arena;
mod auto_scroll;
mod config;
mod drag_drop;
mod drag_ref;
mod drop_list;
mod emitter;
mod event;
mod host;
mod registry;
mod scroll_cache;
mod sort;
mod style;
mod types;

#[cfg(test)]
mod testing;

pub use auto_scroll::{
    HorizontalScroll, SCROLL_PROXIMITY_THRESHOLD, VerticalScroll, element_scroll_directions,
    horizontal_scroll_direction, vertical_scroll_direction,
};
pub use config::{
    ConstrainPosition, DEFAULT_PREVIEW_Z_INDEX, DragDropConfig, DragOptions, DragStartDelay,
    DropListOptions, EnterPredicate, PreviewContainer, SortPredicate,
};
pub use drag_drop::DragDrop;
pub use drag_ref::MOUSE_EVENT_IGNORE_TIME;
pub use drop_list::DROP_PROXIMITY_THRESHOLD;
pub use emitter::{Emitter, ListenerId};
pub use event::{
    DragEvent, DragMoved, DropEvent, DropListEvent, PointerEvent, PointerKind, ScrollEvent,
    TargetEvent, TouchPoint, TransitionEndEvent,
};
pub use host::{
    ANIMATING_CLASS, DragHost, GlobalListener, ListenerOptions, ListenerTarget, PLACEHOLDER_CLASS,
    PREVIEW_CLASS, PreviewSpec, ScrollMetrics, ScrollTarget,
};
pub use registry::{BoundListeners, PointerRouter};
pub use scroll_cache::{ScrollEntry, ScrollPositionCache, ScrollSlot};
pub use style::StyleBatch;
pub use types::{Axis, Direction, DragId, DragPhase, DropListId, Orientation, PointerDelta};
