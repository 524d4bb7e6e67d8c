// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Draggable items.
//!
//! Each item walks `Idle → PendingThreshold → Dragging → (Ending) → Idle`.
//! The pending phase covers the time between the press and the pointer
//! travelling far enough to count as a drag. `Ending` only exists for list
//! items whose preview is animating back to the placeholder.
//!
//! Items inside a list are dragged through a preview attached to the
//! document while a placeholder keeps their slot in the list. Items without
//! a list move themselves through their inline transform.

use alloc::string::String;
use alloc::vec::Vec;

use kurbo::{Point, Rect, Vec2};
use smallvec::SmallVec;

use crate::config::{DragOptions, PreviewContainer};
use crate::drag_drop::DragDrop;
use crate::emitter::Emitter;
use crate::event::{DragEvent, DragMoved, DropEvent, PointerEvent, PointerKind, TargetEvent};
use crate::geometry::{adjust_rect, clamp, combine_transforms, translate3d};
use crate::host::{
    ANIMATING_CLASS, DragHost, PLACEHOLDER_CLASS, PREVIEW_CLASS, PreviewSpec, ScrollTarget,
};
use crate::scroll_cache::ScrollPositionCache;
use crate::types::{Axis, DragId, DragPhase, DropListId, PointerDelta};

/// Mouse events this long after a touch are assumed to be emulated from it.
pub const MOUSE_EVENT_IGNORE_TIME: u64 = 800;

/// A drop waiting for the preview to finish animating.
#[derive(Copy, Clone, Debug)]
pub(crate) struct PendingDrop<E> {
    pub(crate) deadline: u64,
    pub(crate) event: PointerEvent<E>,
}

/// State of one draggable item.
#[derive(Debug)]
pub(crate) struct DragRef<E> {
    pub(crate) root: E,
    pub(crate) options: DragOptions<E>,
    pub(crate) handles: SmallVec<[E; 2]>,
    pub(crate) disabled_handles: SmallVec<[E; 2]>,
    pub(crate) drop_container: Option<DropListId>,
    pub(crate) initial_container: Option<DropListId>,
    pub(crate) initial_index: usize,
    pub(crate) phase: DragPhase,
    pub(crate) has_moved: bool,
    pub(crate) native_interactions_enabled: bool,
    pub(crate) initial_rect: Option<Rect>,
    pub(crate) boundary_rect: Option<Rect>,
    pub(crate) preview_rect: Option<Rect>,
    pub(crate) pickup_in_element: Point,
    pub(crate) pickup_on_page: Point,
    pub(crate) last_pointer: Option<Point>,
    /// Offset of the current drag of a free item.
    pub(crate) active_transform: Vec2,
    /// Offset accumulated by previous drags of a free item.
    pub(crate) passive_transform: Vec2,
    pub(crate) initial_transform: Option<String>,
    pub(crate) delta: PointerDelta,
    pub(crate) last_direction_change: Point,
    pub(crate) start_time: u64,
    pub(crate) last_touch_time: Option<u64>,
    pub(crate) owner_svg: Option<E>,
    pub(crate) preview: Option<E>,
    pub(crate) placeholder: Option<E>,
    pub(crate) anchor: Option<E>,
    pub(crate) scroll_cache: ScrollPositionCache<E>,
    pub(crate) scroll_root: Option<E>,
    pub(crate) select_start_root: Option<E>,
    pub(crate) pending_drop: Option<PendingDrop<E>>,
    pub(crate) events: Emitter<DragEvent<E>>,
    pub(crate) moved: Emitter<DragMoved<E>>,
}

impl<E> DragRef<E> {
    pub(crate) fn new(root: E, owner_svg: Option<E>) -> Self {
        Self {
            root,
            options: DragOptions::default(),
            handles: SmallVec::new(),
            disabled_handles: SmallVec::new(),
            drop_container: None,
            initial_container: None,
            initial_index: 0,
            phase: DragPhase::Idle,
            has_moved: false,
            native_interactions_enabled: true,
            initial_rect: None,
            boundary_rect: None,
            preview_rect: None,
            pickup_in_element: Point::ZERO,
            pickup_on_page: Point::ZERO,
            last_pointer: None,
            active_transform: Vec2::ZERO,
            passive_transform: Vec2::ZERO,
            initial_transform: None,
            delta: PointerDelta::ZERO,
            last_direction_change: Point::ZERO,
            start_time: 0,
            last_touch_time: None,
            owner_svg,
            preview: None,
            placeholder: None,
            anchor: None,
            scroll_cache: ScrollPositionCache::default(),
            scroll_root: None,
            select_start_root: None,
            pending_drop: None,
            events: Emitter::default(),
            moved: Emitter::default(),
        }
    }
}

impl<H: DragHost> DragDrop<H> {
    /// Make `root` draggable.
    pub fn create_drag(&mut self, root: H::Element) -> DragId {
        let owner_svg = self.host.owner_svg_element(root);
        let id = self.items.insert(DragRef::new(root, owner_svg));
        self.router.register_item(&mut self.host, id);
        id
    }

    /// Tear down an item, including any drag in progress.
    ///
    /// Disposing twice, or disposing a stale handle, does nothing.
    pub fn dispose_drag(&mut self, id: DragId) {
        let Some(item) = self.items.get(id) else {
            return;
        };
        let was_active = item.phase != DragPhase::Idle;
        let moved_out = was_active && item.placeholder.is_some();
        let root = item.root;
        let artifacts = [item.anchor, item.preview, item.placeholder];
        let container = item.drop_container;
        let initial_container = item.initial_container;

        if moved_out {
            self.host.remove(root);
        }
        for node in artifacts.into_iter().flatten() {
            self.styles.forget(node);
            self.host.remove(node);
        }
        self.remove_drag_listeners(id);
        self.router.unregister_item(&mut self.host, id);

        if let Some(list) = initial_container.or(container) {
            let remaining = self
                .lists
                .get(list)
                .filter(|l| l.items.contains(&id))
                .map(|l| l.items.iter().copied().filter(|i| *i != id).collect::<Vec<_>>());
            if let Some(remaining) = remaining {
                self.with_items(list, &remaining);
            }
        }
        if let Some(list) = container.filter(|c| was_active && Some(*c) != initial_container) {
            if self.lists.get(list).is_some_and(|l| l.is_dragging) {
                self.reset_list(list);
            }
        }

        if let Some(mut item) = self.items.remove(id) {
            item.events.complete();
            item.moved.complete();
        }
        self.styles.flush(&mut self.host);
        #[cfg(feature = "tracing")]
        tracing::debug!(?id, "drag item disposed");
    }

    /// Options of an item.
    pub fn drag_options(&self, id: DragId) -> Option<&DragOptions<H::Element>> {
        self.items.get(id).map(|item| &item.options)
    }

    /// Mutable options of an item.
    pub fn drag_options_mut(&mut self, id: DragId) -> Option<&mut DragOptions<H::Element>> {
        self.items.get_mut(id).map(|item| &mut item.options)
    }

    /// The element the item was created for.
    pub fn root_element(&self, id: DragId) -> Option<H::Element> {
        self.items.get(id).map(|item| item.root)
    }

    /// The placeholder while a list item is being dragged.
    pub fn placeholder_element(&self, id: DragId) -> Option<H::Element> {
        self.items.get(id).and_then(|item| item.placeholder)
    }

    /// The preview while a list item is being dragged.
    pub fn preview_element(&self, id: DragId) -> Option<H::Element> {
        self.items.get(id).and_then(|item| item.preview)
    }

    /// The element that occupies the item's slot in the layout.
    pub fn visible_element(&self, id: DragId) -> Option<H::Element> {
        let item = self.items.get(id)?;
        if item.phase == DragPhase::Dragging {
            Some(item.placeholder.unwrap_or(item.root))
        } else {
            Some(item.root)
        }
    }

    /// Current phase of an item.
    pub fn drag_phase(&self, id: DragId) -> Option<DragPhase> {
        self.items.get(id).map(|item| item.phase)
    }

    /// Whether the item's drag has visibly started and is still routed.
    pub fn is_dragging(&self, id: DragId) -> bool {
        self.items
            .get(id)
            .is_some_and(|item| item.phase == DragPhase::Dragging)
            && self.router.is_dragging(id)
    }

    /// The list the item currently belongs to.
    pub fn drop_container(&self, id: DragId) -> Option<DropListId> {
        self.items.get(id).and_then(|item| item.drop_container)
    }

    /// Offset of a free item: the live one while dragging, else the accumulated one.
    pub fn free_drag_position(&self, id: DragId) -> Option<Vec2> {
        let item = self.items.get(id)?;
        Some(if self.router.is_dragging(id) {
            item.active_transform
        } else {
            item.passive_transform
        })
    }

    /// Move a free item to `position` as if it had been dragged there.
    pub fn set_free_drag_position(&mut self, id: DragId, position: Vec2) {
        let free = self.live_container(id).is_none();
        let Some(item) = self.items.get_mut(id) else {
            return;
        };
        item.active_transform = Vec2::ZERO;
        item.passive_transform = position;
        if free {
            self.apply_root_transform(id, position.x, position.y);
        }
        self.styles.flush(&mut self.host);
    }

    /// Undo every free-drag offset and restore the original transform.
    pub fn reset_drag(&mut self, id: DragId) {
        let Some(item) = self.items.get_mut(id) else {
            return;
        };
        item.active_transform = Vec2::ZERO;
        item.passive_transform = Vec2::ZERO;
        let root = item.root;
        let initial = item.initial_transform.clone().unwrap_or_default();
        self.styles.set(root, initial);
        self.styles.flush(&mut self.host);
    }

    /// Restrict pointer-down to the given handles. An empty slice lifts the restriction.
    pub fn with_handles(&mut self, id: DragId, handles: &[H::Element]) {
        let disabled = self.is_drag_disabled(id);
        let Some(item) = self.items.get_mut(id) else {
            return;
        };
        item.handles = handles.iter().copied().collect();
        item.disabled_handles.retain(|h| handles.contains(h));
        for handle in handles {
            self.host.set_native_drag_interactions(*handle, disabled);
        }
        self.toggle_native_drag_interactions(id);
    }

    /// Stop a handle from starting drags.
    pub fn disable_handle(&mut self, id: DragId, handle: H::Element) {
        let Some(item) = self.items.get_mut(id) else {
            return;
        };
        if !item.disabled_handles.contains(&handle) && item.handles.contains(&handle) {
            item.disabled_handles.push(handle);
            self.host.set_native_drag_interactions(handle, true);
        }
    }

    /// Let a disabled handle start drags again.
    pub fn enable_handle(&mut self, id: DragId, handle: H::Element) {
        let disabled = self.is_drag_disabled(id);
        let Some(item) = self.items.get_mut(id) else {
            return;
        };
        if let Some(index) = item.disabled_handles.iter().position(|h| *h == handle) {
            item.disabled_handles.remove(index);
            self.host.set_native_drag_interactions(handle, disabled);
        }
    }

    /// The item's list, if it is still alive.
    pub(crate) fn live_container(&self, id: DragId) -> Option<DropListId> {
        self.items
            .get(id)
            .and_then(|item| item.drop_container)
            .filter(|list| self.lists.is_alive(*list))
    }

    pub(crate) fn is_drag_disabled(&self, id: DragId) -> bool {
        let Some(item) = self.items.get(id) else {
            return true;
        };
        item.options.disabled
            || item
                .drop_container
                .and_then(|list| self.lists.get(list))
                .is_some_and(|list| list.options.disabled)
    }

    fn emit_drag(&mut self, id: DragId, event: DragEvent<H::Element>) {
        if let Some(item) = self.items.get_mut(id) {
            item.events.emit(&event);
        }
    }

    /// The handle containing `target`, if any.
    fn target_handle(&self, id: DragId, target: Option<H::Element>) -> Option<H::Element> {
        let target = target?;
        self.items
            .get(id)?
            .handles
            .iter()
            .copied()
            .find(|handle| *handle == target || self.host.contains(*handle, target))
    }

    /// Whether a press on `target` may start this item.
    fn accepts_target(&self, id: DragId, target: Option<H::Element>) -> bool {
        let Some(item) = self.items.get(id) else {
            return false;
        };
        if self.is_drag_disabled(id) {
            return false;
        }
        if item.handles.is_empty() {
            return true;
        }
        self.target_handle(id, target)
            .is_some_and(|handle| !item.disabled_handles.contains(&handle))
    }

    pub(crate) fn drag_pointer_down(&mut self, id: DragId, event: &mut PointerEvent<H::Element>) {
        if !self.items.is_alive(id) {
            return;
        }
        self.emit_drag(id, DragEvent::BeforeStarted);
        if self.accepts_target(id, event.target) {
            self.initialize_drag_sequence(id, event);
        }
    }

    pub(crate) fn drag_native_drag_start(&mut self, id: DragId, event: &mut TargetEvent<H::Element>) {
        if self.accepts_target(id, event.target) {
            event.default_prevented = true;
        }
    }

    /// Page position of the pointer, in the item's SVG space when it has one.
    pub(crate) fn pointer_position_on_page(
        &self,
        id: DragId,
        event: &PointerEvent<H::Element>,
    ) -> Point {
        let Some(item) = self.items.get(id) else {
            return event.page;
        };
        let scroll = item
            .scroll_cache
            .viewport_scroll_position()
            .unwrap_or_else(|| self.host.viewport_scroll_position());
        let point = event.page - scroll;
        match item.owner_svg.and_then(|svg| self.host.screen_ctm(svg)) {
            Some(ctm) => ctm.inverse() * point,
            None => point,
        }
    }

    fn initialize_drag_sequence(&mut self, id: DragId, event: &mut PointerEvent<H::Element>) {
        let Some(item) = self.items.get(id) else {
            return;
        };
        let is_touch = event.kind.is_touch();
        let is_auxiliary_button = !is_touch && event.button != 0;
        let is_emulated = !is_touch
            && item
                .last_touch_time
                .is_some_and(|t| t.saturating_add(MOUSE_EVENT_IGNORE_TIME) > event.timestamp);
        let is_fake = if is_touch {
            event.is_fake_touchstart()
        } else {
            event.is_fake_mousedown()
        };
        let is_multi_touch = is_touch && event.touch_count > 1;

        // Native drag of the target would take over the sequence.
        if event.target_is_draggable && event.kind == PointerKind::MouseDown {
            event.prevent_default();
        }

        if self.router.is_dragging(id)
            || item.phase != DragPhase::Idle
            || is_auxiliary_button
            || is_emulated
            || is_fake
            || is_multi_touch
        {
            #[cfg(feature = "tracing")]
            tracing::trace!(?id, "pointer down rejected");
            return;
        }

        let root = item.root;
        let boundary = item.options.boundary_element;
        self.styles.flush(&mut self.host);
        let initial_rect = self.host.client_rect(root);
        let boundary_rect = boundary.map(|b| self.host.client_rect(b));
        let client = event.page - self.host.viewport_scroll_position();
        let pointer = self.pointer_position_on_page(id, event);
        let scroll_root = self.host.shadow_root(root);

        let Some(item) = self.items.get_mut(id) else {
            return;
        };
        item.has_moved = false;
        item.initial_rect = Some(initial_rect);
        item.boundary_rect = boundary_rect;
        item.preview_rect = None;
        item.pickup_in_element = Point::new(client.x - initial_rect.x0, client.y - initial_rect.y0);
        item.pickup_on_page = pointer;
        item.last_pointer = Some(pointer);
        item.delta = PointerDelta::ZERO;
        item.last_direction_change = pointer;
        item.start_time = event.timestamp;
        item.scroll_root = scroll_root;
        item.phase = DragPhase::PendingThreshold;
        if let Some(root) = scroll_root {
            self.router.watch_shadow_root(&mut self.host, root);
        }
        self.router.start_dragging(&mut self.host, id, event);
        #[cfg(feature = "tracing")]
        tracing::debug!(?id, x = pointer.x, y = pointer.y, "drag sequence armed");
    }

    pub(crate) fn drag_pointer_move(&mut self, id: DragId, event: &mut PointerEvent<H::Element>) {
        let pointer = self.pointer_position_on_page(id, event);
        let Some(item) = self.items.get(id) else {
            return;
        };
        match item.phase {
            DragPhase::PendingThreshold => {
                let distance = (pointer.x - item.pickup_on_page.x).abs()
                    + (pointer.y - item.pickup_on_page.y).abs();
                if distance < self.config.drag_start_threshold {
                    return;
                }
                let delay = item.options.drag_start_delay.for_pointer(event.kind.is_touch());
                if event.timestamp < item.start_time.saturating_add(delay) {
                    // Moving before the delay elapsed means the user wants to scroll.
                    self.end_drag_sequence(id, event);
                    return;
                }
                let container_busy = item
                    .drop_container
                    .and_then(|list| self.lists.get(list))
                    .is_some_and(|list| list.is_dragging || list.is_receiving());
                if !container_busy {
                    event.prevent_default();
                    self.start_drag_sequence(id, event);
                }
                return;
            }
            DragPhase::Dragging => {}
            DragPhase::Idle | DragPhase::Ending => return,
        }

        event.prevent_default();
        let constrained = self.constrained_pointer_position(id, pointer);
        let container = self.live_container(id);
        let Some(item) = self.items.get_mut(id) else {
            return;
        };
        item.has_moved = true;
        item.last_pointer = Some(pointer);
        self.update_pointer_direction_delta(id, constrained);

        if container.is_some() {
            self.update_active_drop_container(id, constrained, pointer);
        } else if let Some(item) = self.items.get_mut(id) {
            let offset = if item.options.constrain_position.is_some() {
                item.initial_rect.map_or(Point::ZERO, |r| r.origin())
            } else {
                item.pickup_on_page
            };
            let active = Vec2::new(
                constrained.x - offset.x + item.passive_transform.x,
                constrained.y - offset.y + item.passive_transform.y,
            );
            item.active_transform = active;
            self.apply_root_transform(id, active.x, active.y);
        }

        let Some(item) = self.items.get_mut(id) else {
            return;
        };
        if !item.moved.is_empty() {
            let moved = DragMoved {
                pointer_position: constrained,
                event: *event,
                distance: constrained - item.pickup_on_page,
                delta: item.delta,
            };
            item.moved.emit(&moved);
        }
        #[cfg(feature = "tracing")]
        tracing::trace!(?id, x = constrained.x, y = constrained.y, "drag moved");
    }

    fn start_drag_sequence(&mut self, id: DragId, event: &PointerEvent<H::Element>) {
        let Some(item) = self.items.get_mut(id) else {
            return;
        };
        item.phase = DragPhase::Dragging;
        if event.kind.is_touch() {
            item.last_touch_time = Some(event.timestamp);
        }
        let root = item.root;
        self.toggle_native_drag_interactions(id);

        let shadow_root = self.host.shadow_root(root);
        if let Some(shadow_root) = shadow_root {
            self.router.bind_shadow_select_start(&mut self.host, shadow_root);
            if let Some(item) = self.items.get_mut(id) {
                item.select_start_root = Some(shadow_root);
            }
        }

        let container = self.live_container(id);
        if let Some(list) = container {
            self.attach_preview(id, shadow_root);
            self.emit_drag(id, DragEvent::Started { event: *event });
            self.start_list(list);
            let index = self.item_index(list, id).unwrap_or(0);
            if let Some(item) = self.items.get_mut(id) {
                item.initial_container = Some(list);
                item.initial_index = index;
            }
        } else {
            self.emit_drag(id, DragEvent::Started { event: *event });
            if let Some(item) = self.items.get_mut(id) {
                item.initial_container = None;
                item.initial_index = 0;
            }
        }

        let parents = container
            .and_then(|list| self.lists.get(list))
            .map(|list| list.scrollable_parents.clone())
            .unwrap_or_default();
        self.styles.flush(&mut self.host);
        if let Some(item) = self.items.get_mut(id) {
            item.scroll_cache.cache(&self.host, &parents);
        }
        #[cfg(feature = "tracing")]
        tracing::debug!(?id, ?container, "drag started");
    }

    /// Swap the root for a placeholder and float a preview above the page.
    fn attach_preview(&mut self, id: DragId, shadow_root: Option<H::Element>) {
        self.styles.flush(&mut self.host);
        let Some(item) = self.items.get(id) else {
            return;
        };
        let root = item.root;
        let parent = self.host.parent(root);
        let rect = item
            .initial_rect
            .unwrap_or_else(|| self.host.client_rect(root));
        let existing_anchor = item.anchor;
        let preview_container = item.options.preview_container;
        let preview_class = item.options.preview_class.clone();

        let placeholder = self.host.create_placeholder(root);
        self.host.add_class(placeholder, PLACEHOLDER_CLASS);
        let anchor = match existing_anchor {
            Some(anchor) => anchor,
            None => self.host.create_anchor(),
        };
        if let Some(parent) = parent {
            self.host.insert_before(parent, anchor, Some(root));
        }
        let initial_transform = self.styles.read(&self.host, root);

        let spec = PreviewSpec {
            rect,
            z_index: self.config.preview_z_index(),
        };
        let preview = self.host.create_preview(root, &spec);
        self.host.add_class(preview, PREVIEW_CLASS);
        for class in &preview_class {
            self.host.add_class(preview, class);
        }
        let body = self.host.body();
        let insertion_point = match preview_container {
            PreviewContainer::Parent => parent.unwrap_or(body),
            PreviewContainer::Element(element) => element,
            PreviewContainer::Global => shadow_root
                .or_else(|| self.host.fullscreen_element())
                .unwrap_or(body),
        };
        self.host.insert_before(insertion_point, preview, None);
        self.styles.set(preview, translate3d(rect.x0, rect.y0));

        // The root leaves the list so the list only sees the placeholder.
        self.host.set_visible(root, false);
        if parent.is_some() {
            self.host.replace_child(placeholder, root);
        }
        self.host.insert_before(body, root, None);

        if let Some(item) = self.items.get_mut(id) {
            item.placeholder = Some(placeholder);
            item.preview = Some(preview);
            item.anchor = Some(anchor);
            item.initial_transform = Some(initial_transform);
        }
    }

    /// Stop routing pointer events to the item and release its shadow root listeners.
    fn remove_drag_listeners(&mut self, id: DragId) {
        self.router.stop_dragging(&mut self.host, id);
        let Some(item) = self.items.get_mut(id) else {
            return;
        };
        if let Some(root) = item.scroll_root.take() {
            self.router.unwatch_shadow_root(&mut self.host, root);
        }
        if let Some(root) = item.select_start_root.take() {
            self.router.unbind_shadow_select_start(&mut self.host, root);
        }
    }

    pub(crate) fn end_drag_sequence(&mut self, id: DragId, event: &PointerEvent<H::Element>) {
        if !self.router.is_dragging(id) {
            return;
        }
        self.remove_drag_listeners(id);
        self.toggle_native_drag_interactions(id);
        let container = self.live_container(id);
        let Some(item) = self.items.get_mut(id) else {
            return;
        };
        if item.phase != DragPhase::Dragging {
            item.phase = DragPhase::Idle;
            return;
        }
        self.emit_drag(id, DragEvent::Released { event: *event });
        #[cfg(feature = "tracing")]
        tracing::debug!(?id, "drag released");

        if let Some(list) = container {
            self.stop_scrolling(list);
            if let Some(item) = self.items.get_mut(id) {
                item.phase = DragPhase::Ending;
            }
            self.animate_preview_to_placeholder(id, *event);
            return;
        }

        let pointer = self.pointer_position_on_page(id, event);
        let has_artifacts = self
            .items
            .get(id)
            .is_some_and(|item| item.preview.is_some() || item.placeholder.is_some());
        if has_artifacts {
            // The list went away mid-drag; put the root back where the anchor holds its slot.
            self.cleanup_drag_artifacts(id, event);
            self.styles.flush(&mut self.host);
        }
        let Some(item) = self.items.get_mut(id) else {
            return;
        };
        if !has_artifacts {
            item.passive_transform = item.active_transform;
        }
        item.active_transform = Vec2::ZERO;
        let ended = DragEvent::Ended {
            distance: pointer - item.pickup_on_page,
            drop_point: pointer,
            event: *event,
        };
        self.emit_drag(id, ended);
        self.cleanup_cached_dimensions(id);
        if let Some(item) = self.items.get_mut(id) {
            item.phase = DragPhase::Idle;
        }
    }

    fn animate_preview_to_placeholder(&mut self, id: DragId, event: PointerEvent<H::Element>) {
        let Some(item) = self.items.get(id) else {
            return;
        };
        let (true, Some(preview), Some(placeholder)) =
            (item.has_moved, item.preview, item.placeholder)
        else {
            self.finish_drop(id, event);
            return;
        };
        self.styles.flush(&mut self.host);
        let rect = self.host.client_rect(placeholder);
        self.host.add_class(preview, ANIMATING_CLASS);
        self.apply_preview_transform(id, rect.x0, rect.y0);
        let duration = self.host.transition_duration(preview);
        if duration == 0 {
            self.finish_drop(id, event);
            return;
        }
        if let Some(item) = self.items.get_mut(id) {
            // Transition events are unreliable, so the drop also completes after a grace period.
            item.pending_drop = Some(PendingDrop {
                deadline: event.timestamp.saturating_add(duration.saturating_add(duration / 2)),
                event,
            });
        }
    }

    /// Complete a list drop once the preview is where the placeholder is.
    pub(crate) fn finish_drop(&mut self, id: DragId, event: PointerEvent<H::Element>) {
        self.cleanup_drag_artifacts(id, &event);
        self.cleanup_cached_dimensions(id);
        self.router.stop_dragging(&mut self.host, id);
        if let Some(item) = self.items.get_mut(id) {
            item.phase = DragPhase::Idle;
            item.pending_drop = None;
        }
        #[cfg(feature = "tracing")]
        tracing::debug!(?id, "drop finished");
    }

    fn cleanup_drag_artifacts(&mut self, id: DragId, event: &PointerEvent<H::Element>) {
        let Some(item) = self.items.get_mut(id) else {
            return;
        };
        let root = item.root;
        let anchor = item.anchor;
        let preview = item.preview.take();
        let placeholder = item.placeholder.take();
        item.initial_rect = None;
        item.boundary_rect = None;
        item.preview_rect = None;
        item.initial_transform = None;

        self.host.set_visible(root, true);
        if let Some(anchor) = anchor {
            if self.host.parent(anchor).is_some() {
                self.host.replace_child(root, anchor);
            }
        }
        for node in [preview, placeholder].into_iter().flatten() {
            self.styles.forget(node);
            self.host.remove(node);
        }

        let Some(container) = self.live_container(id) else {
            return;
        };
        let current_index = self.item_index(container, id).unwrap_or(0);
        let pointer = self.pointer_position_on_page(id, event);
        let is_pointer_over_container = self.is_over_container(container, pointer.x, pointer.y);
        let Some(item) = self.items.get(id) else {
            return;
        };
        let distance = pointer - item.pickup_on_page;
        let drop = DropEvent {
            item: id,
            current_index,
            previous_index: item.initial_index,
            container,
            previous_container: item.initial_container.unwrap_or(container),
            is_pointer_over_container,
            distance,
            drop_point: pointer,
            event: *event,
        };
        let initial_container = item.initial_container;

        self.emit_drag(
            id,
            DragEvent::Ended {
                distance,
                drop_point: pointer,
                event: *event,
            },
        );
        self.emit_drag(id, DragEvent::Dropped(drop));
        self.drop_into(container, drop);
        if let Some(item) = self.items.get_mut(id) {
            item.drop_container = initial_container.or(Some(container));
        }
    }

    fn cleanup_cached_dimensions(&mut self, id: DragId) {
        if let Some(item) = self.items.get_mut(id) {
            item.boundary_rect = None;
            item.preview_rect = None;
            item.scroll_cache.clear();
        }
    }

    /// Apply the custom constraint, the axis lock, and the boundary to a page point.
    fn constrained_pointer_position(&mut self, id: DragId, point: Point) -> Point {
        let needs_preview = self
            .items
            .get(id)
            .is_some_and(|item| item.boundary_rect.is_some());
        let preview_rect = if needs_preview {
            self.preview_rect(id)
        } else {
            Rect::ZERO
        };
        let Some(item) = self.items.get(id) else {
            return point;
        };
        let list_lock = item
            .drop_container
            .and_then(|list| self.lists.get(list))
            .and_then(|list| list.options.lock_axis);
        let constrained = item.options.constrain_position.is_some();
        let mut p = match &item.options.constrain_position {
            Some(constrain) => constrain(
                point,
                id,
                item.initial_rect.unwrap_or(Rect::ZERO),
                item.pickup_in_element,
            ),
            None => point,
        };

        let lock = item.options.lock_axis.or(list_lock);
        if lock == Some(Axis::X) {
            p.y = item.pickup_on_page.y
                - if constrained {
                    item.pickup_in_element.y
                } else {
                    0.0
                };
        } else if lock == Some(Axis::Y) {
            p.x = item.pickup_on_page.x
                - if constrained {
                    item.pickup_in_element.x
                } else {
                    0.0
                };
        }

        if let Some(boundary) = item.boundary_rect {
            let pickup = if constrained {
                Point::ZERO
            } else {
                item.pickup_in_element
            };
            let min_x = boundary.x0 + pickup.x;
            let max_x = boundary.x1 - (preview_rect.width() - pickup.x);
            let min_y = boundary.y0 + pickup.y;
            let max_y = boundary.y1 - (preview_rect.height() - pickup.y);
            p.x = clamp(p.x, min_x, max_x);
            p.y = clamp(p.y, min_y, max_y);
        }
        p
    }

    /// Size of the dragged thing, measured once per drag.
    fn preview_rect(&mut self, id: DragId) -> Rect {
        let Some(item) = self.items.get(id) else {
            return Rect::ZERO;
        };
        if let Some(rect) = item.preview_rect.filter(|r| r.width() != 0.0 || r.height() != 0.0) {
            return rect;
        }
        let rect = match item.preview {
            Some(preview) => {
                self.styles.flush(&mut self.host);
                self.host.client_rect(preview)
            }
            None => item.initial_rect.unwrap_or(Rect::ZERO),
        };
        if let Some(item) = self.items.get_mut(id) {
            item.preview_rect = Some(rect);
        }
        rect
    }

    fn update_pointer_direction_delta(&mut self, id: DragId, point: Point) {
        let threshold = self.config.pointer_direction_change_threshold;
        let Some(item) = self.items.get_mut(id) else {
            return;
        };
        let last = item.last_direction_change;
        let change_x = point.x - last.x;
        let change_y = point.y - last.y;
        if change_x.abs() > threshold {
            item.delta.x = if change_x > 0.0 { 1 } else { -1 };
            item.last_direction_change.x = point.x;
        }
        if change_y.abs() > threshold {
            item.delta.y = if change_y > 0.0 { 1 } else { -1 };
            item.last_direction_change.y = point.y;
        }
    }

    /// Move the item between lists and keep its preview under the pointer.
    pub(crate) fn update_active_drop_container(
        &mut self,
        id: DragId,
        constrained: Point,
        raw: Point,
    ) {
        let Some(item) = self.items.get(id) else {
            return;
        };
        let (Some(current), Some(initial)) = (item.drop_container, item.initial_container) else {
            return;
        };
        let (x, y) = (constrained.x, constrained.y);
        let mut new_container = self.sibling_from_position(initial, id, x, y);

        // Dragging back over the original list always returns the item to it.
        if new_container.is_none()
            && current != initial
            && self.is_over_container(initial, x, y)
        {
            new_container = Some(initial);
        }

        if let Some(new_container) = new_container.filter(|c| *c != current) {
            self.emit_drag(id, DragEvent::Exited { container: current });
            self.exit(current, id);
            if let Some(item) = self.items.get_mut(id) {
                item.drop_container = Some(new_container);
            }
            let initial_index = self.items.get(id).map(|item| item.initial_index);
            let keep_index = new_container == initial
                && self
                    .lists
                    .get(new_container)
                    .is_some_and(|list| list.options.sorting_disabled);
            let index = if keep_index { initial_index } else { None };
            self.enter(new_container, id, x, y, index);
            let current_index = self.item_index(new_container, id).unwrap_or(0);
            self.emit_drag(
                id,
                DragEvent::Entered {
                    container: new_container,
                    current_index,
                },
            );
            #[cfg(feature = "tracing")]
            tracing::debug!(?id, from = ?current, to = ?new_container, "item transferred");
        }

        if !self.router.is_dragging(id) {
            return;
        }
        let Some(container) = self.live_container(id) else {
            return;
        };
        let delta = self.items.get(id).map_or(PointerDelta::ZERO, |i| i.delta);
        self.start_scrolling_if_necessary(container, raw.x, raw.y);
        self.sort_item(container, id, x, y, delta);

        let Some(item) = self.items.get(id) else {
            return;
        };
        if item.options.constrain_position.is_some() {
            self.apply_preview_transform(id, x, y);
        } else {
            let pickup = item.pickup_in_element;
            self.apply_preview_transform(id, x - pickup.x, y - pickup.y);
        }
    }

    /// Write a free item's offset, scaled and composed with its original transform.
    fn apply_root_transform(&mut self, id: DragId, x: f64, y: f64) {
        let Some(item) = self.items.get(id) else {
            return;
        };
        let root = item.root;
        let scale = 1.0 / item.options.scale;
        let initial = match &item.initial_transform {
            Some(initial) => initial.clone(),
            None => {
                let current = self.styles.read(&self.host, root);
                let initial = if current == "none" {
                    String::new()
                } else {
                    current
                };
                if let Some(item) = self.items.get_mut(id) {
                    item.initial_transform = Some(initial.clone());
                }
                initial
            }
        };
        let transform = combine_transforms(&translate3d(x * scale, y * scale), Some(&initial));
        self.styles.set(root, transform);
    }

    fn apply_preview_transform(&mut self, id: DragId, x: f64, y: f64) {
        let Some(item) = self.items.get(id) else {
            return;
        };
        let Some(preview) = item.preview else {
            return;
        };
        let transform = combine_transforms(&translate3d(x, y), item.initial_transform.as_deref());
        self.styles.set(preview, transform);
    }

    /// Native drag interactions stay enabled except while a handle-less item is dragged.
    fn toggle_native_drag_interactions(&mut self, id: DragId) {
        let dragging = self.is_dragging(id);
        let Some(item) = self.items.get_mut(id) else {
            return;
        };
        let enable = !item.handles.is_empty() || !dragging;
        if enable != item.native_interactions_enabled {
            item.native_interactions_enabled = enable;
            self.host.set_native_drag_interactions(item.root, enable);
        }
    }

    pub(crate) fn drag_on_scroll(&mut self, id: DragId, target: ScrollTarget<H::Element>) {
        let free = self.live_container(id).is_none();
        let Some(item) = self.items.get_mut(id) else {
            return;
        };
        let Some(difference) = item.scroll_cache.handle_scroll(&self.host, target) else {
            return;
        };
        if let (Some(rect), Some(boundary)) =
            (item.boundary_rect.as_mut(), item.options.boundary_element)
        {
            let encloses_boundary = match target {
                ScrollTarget::Document => true,
                ScrollTarget::Element(scrolled) => {
                    scrolled != boundary && self.host.contains(scrolled, boundary)
                }
            };
            if encloses_boundary {
                adjust_rect(rect, difference.y, difference.x);
            }
        }
        item.pickup_on_page += difference;
        if free {
            item.active_transform -= difference;
            let active = item.active_transform;
            self.apply_root_transform(id, active.x, active.y);
        }
    }

    /// Re-run transfer and sorting at the last pointer position, after a scroll moved things.
    pub(crate) fn sort_from_last_pointer_position(&mut self, id: DragId) {
        let Some(pointer) = self.items.get(id).and_then(|item| item.last_pointer) else {
            return;
        };
        if self.live_container(id).is_none() {
            return;
        }
        let constrained = self.constrained_pointer_position(id, pointer);
        self.update_active_drop_container(id, constrained, pointer);
    }
}
