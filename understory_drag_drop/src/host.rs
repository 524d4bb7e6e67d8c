// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The boundary between the engine and the document it manipulates.
//!
//! The engine never holds a document itself. It asks a [`DragHost`] for
//! geometry, and asks it to create, move, and restyle nodes. A browser
//! embedding implements the trait over `web-sys`; tests implement it over an
//! in-memory tree.
//!
//! All coordinates are client (viewport) coordinates unless noted.

use alloc::string::String;
use core::fmt::Debug;
use core::hash::Hash;

use kurbo::{Affine, Point, Rect, Size, Vec2};

/// Class added to the floating preview.
pub const PREVIEW_CLASS: &str = "drag-preview";
/// Class added to the placeholder left behind in the list.
pub const PLACEHOLDER_CLASS: &str = "drag-placeholder";
/// Class added to the preview while it animates back into the placeholder.
pub const ANIMATING_CLASS: &str = "drag-animating";

/// Something that can be scrolled: the document (viewport) or one element.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ScrollTarget<E> {
    /// The document scrolling element.
    Document,
    /// A scrollable element.
    Element(E),
}

/// Scroll offsets and extents of an element, as read from layout.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct ScrollMetrics {
    /// Vertical scroll offset.
    pub scroll_top: f64,
    /// Horizontal scroll offset; zero or negative in RTL containers.
    pub scroll_left: f64,
    /// Total scrollable width.
    pub scroll_width: f64,
    /// Total scrollable height.
    pub scroll_height: f64,
    /// Visible width.
    pub client_width: f64,
    /// Visible height.
    pub client_height: f64,
}

impl ScrollMetrics {
    /// The scroll offset as a vector (`x` = left, `y` = top).
    pub fn offset(&self) -> Vec2 {
        Vec2::new(self.scroll_left, self.scroll_top)
    }
}

/// What the host needs to build a preview.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PreviewSpec {
    /// Size and client position of the dragged root when the drag started.
    ///
    /// The preview should be fixed-positioned at the origin with this size; the
    /// engine positions it with transforms.
    pub rect: Rect,
    /// Stacking order the preview should be rendered at.
    pub z_index: i32,
}

/// Where a global listener is bound.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ListenerTarget<E> {
    /// The root document.
    Document,
    /// A shadow root; events inside a shadow tree do not reach the document.
    ShadowRoot(E),
}

/// The global events the engine listens to while pointers are being routed.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum GlobalListener {
    /// `touchmove`; deliver to [`DragDrop::global_pointer_move`](crate::DragDrop::global_pointer_move).
    TouchMove,
    /// `mousemove`; deliver to [`DragDrop::global_pointer_move`](crate::DragDrop::global_pointer_move).
    MouseMove,
    /// `mouseup`; deliver to [`DragDrop::global_pointer_up`](crate::DragDrop::global_pointer_up).
    MouseUp,
    /// `touchend`; deliver to [`DragDrop::global_pointer_up`](crate::DragDrop::global_pointer_up).
    TouchEnd,
    /// `touchcancel`; deliver to [`DragDrop::global_pointer_up`](crate::DragDrop::global_pointer_up).
    TouchCancel,
    /// `scroll`; deliver to [`DragDrop::global_scroll`](crate::DragDrop::global_scroll), or
    /// [`DragDrop::shadow_root_scroll`](crate::DragDrop::shadow_root_scroll) for shadow roots.
    Scroll,
    /// `selectstart`; deliver to [`DragDrop::select_start`](crate::DragDrop::select_start).
    SelectStart,
}

/// Listener registration flags.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ListenerOptions {
    /// Listen in the capture phase.
    pub capture: bool,
    /// The listener never cancels the event.
    pub passive: bool,
}

impl ListenerOptions {
    /// Capturing and allowed to cancel the event.
    pub const ACTIVE_CAPTURE: Self = Self {
        capture: true,
        passive: false,
    };
    /// Capturing only.
    pub const CAPTURE: Self = Self {
        capture: true,
        passive: true,
    };
}

/// Document access for the drag-and-drop engine.
///
/// Queries take `&self`; anything that changes the document takes `&mut self`.
/// Inline transforms are read and written through the engine's style batch,
/// so [`DragHost::transform`] only ever sees flushed values.
pub trait DragHost {
    /// Handle of a node in the host document. Comments (anchors) are nodes too.
    type Element: Copy + Eq + Hash + Debug;

    /// Border-box rectangle of `element` in client coordinates.
    ///
    /// This forces layout in most hosts; the engine caches the result.
    fn client_rect(&self, element: Self::Element) -> Rect;

    /// Scroll state of `element`.
    fn scroll_metrics(&self, element: Self::Element) -> ScrollMetrics;

    /// Current scroll offset of the viewport (`x` = left, `y` = top).
    fn viewport_scroll_position(&self) -> Vec2;

    /// Size of the viewport.
    fn viewport_size(&self) -> Size;

    /// Whether `node` is `ancestor` or one of its descendants.
    fn contains(&self, ancestor: Self::Element, node: Self::Element) -> bool;

    /// Parent node, if attached.
    fn parent(&self, node: Self::Element) -> Option<Self::Element>;

    /// Topmost hit-testable element at a client position.
    ///
    /// `scope` is a shadow root to resolve inside, or `None` for the document.
    /// Previews must not be hit-testable.
    fn element_from_point(&self, scope: Option<Self::Element>, point: Point)
    -> Option<Self::Element>;

    /// Shadow root that `element` lives in, if any.
    fn shadow_root(&self, element: Self::Element) -> Option<Self::Element>;

    /// Nearest `<svg>` root owning `element`, if it is SVG content.
    fn owner_svg_element(&self, element: Self::Element) -> Option<Self::Element>;

    /// Screen transformation matrix of an `<svg>` root.
    fn screen_ctm(&self, svg: Self::Element) -> Option<Affine>;

    /// Element currently shown fullscreen, if any.
    fn fullscreen_element(&self) -> Option<Self::Element>;

    /// The document body.
    fn body(&self) -> Self::Element;

    /// Inline `transform` of `element`, or an empty string.
    fn transform(&self, element: Self::Element) -> String;

    /// Inline `scroll-snap-type` of `element`, or an empty string.
    fn scroll_snap_type(&self, element: Self::Element) -> String;

    /// Duration plus delay of the `transform` transition on `element`, in milliseconds.
    fn transition_duration(&self, element: Self::Element) -> u64;

    /// Scroll `target` by `delta` (`x` = left, `y` = top).
    fn scroll_by(&mut self, target: ScrollTarget<Self::Element>, delta: Vec2);

    /// Create a detached placeholder standing in for `source` inside its list.
    fn create_placeholder(&mut self, source: Self::Element) -> Self::Element;

    /// Create a detached preview of `source` that follows the pointer.
    fn create_preview(&mut self, source: Self::Element, spec: &PreviewSpec) -> Self::Element;

    /// Create a detached, invisible anchor node (a comment in DOM hosts).
    fn create_anchor(&mut self) -> Self::Element;

    /// Insert `node` into `parent` before `reference`, or append it when `reference` is `None`.
    ///
    /// A node that is already attached is moved.
    fn insert_before(
        &mut self,
        parent: Self::Element,
        node: Self::Element,
        reference: Option<Self::Element>,
    );

    /// Put `new` where `old` is and detach `old`.
    fn replace_child(&mut self, new: Self::Element, old: Self::Element);

    /// Detach `node` from the document and release it.
    fn remove(&mut self, node: Self::Element);

    /// Show or hide `element` without affecting its inline styles.
    fn set_visible(&mut self, element: Self::Element, visible: bool);

    /// Write the inline `transform` of `element`.
    fn set_transform(&mut self, element: Self::Element, transform: &str);

    /// Write the inline `scroll-snap-type` of `element`.
    fn set_scroll_snap_type(&mut self, element: Self::Element, value: &str);

    /// Enable or disable native drag, text selection, and touch callouts on `element`.
    fn set_native_drag_interactions(&mut self, element: Self::Element, enabled: bool);

    /// Add a class to `element`.
    fn add_class(&mut self, element: Self::Element, class: &str);

    /// Bind a global listener.
    ///
    /// The listener must be bound outside any reactive scheduler of the host
    /// framework: pointer moves arrive for every pixel and must not trigger
    /// re-rendering on their own.
    fn add_listener(
        &mut self,
        target: ListenerTarget<Self::Element>,
        listener: GlobalListener,
        options: ListenerOptions,
    );

    /// Unbind a listener bound with [`DragHost::add_listener`].
    fn remove_listener(
        &mut self,
        target: ListenerTarget<Self::Element>,
        listener: GlobalListener,
        options: ListenerOptions,
    );
}
