// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Drop lists: sortable containers that items can be dragged between.
//!
//! A list snapshots the rectangles of its items when a drag starts and
//! re-sorts that snapshot as the pointer moves, writing transforms that
//! shift the affected items. The real order only changes when the host
//! reacts to the `Dropped` event.

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use kurbo::{Point, Rect};
use smallvec::SmallVec;

use crate::auto_scroll::{
    AutoScroll, HorizontalScroll, SCROLL_PROXIMITY_THRESHOLD, VerticalScroll,
    element_scroll_directions, horizontal_scroll_direction, vertical_scroll_direction,
};
use crate::config::DropListOptions;
use crate::drag_drop::DragDrop;
use crate::emitter::Emitter;
use crate::event::{DropEvent, DropListEvent};
use crate::geometry::{combine_transforms, is_inside_rect, is_pointer_near_rect, round_px};
use crate::host::{DragHost, ScrollTarget};
use crate::scroll_cache::ScrollPositionCache;
use crate::sort::{ItemPosition, SingleAxisSortStrategy};
use crate::types::{DragId, DragPhase, DropListId, Orientation, PointerDelta};

/// Fraction of a list's size around it in which the pointer still sorts.
pub const DROP_PROXIMITY_THRESHOLD: f64 = 0.05;

/// State of one drop list.
#[derive(Debug)]
pub(crate) struct DropListRef<E> {
    pub(crate) element: E,
    pub(crate) options: DropListOptions,
    pub(crate) items: Vec<DragId>,
    pub(crate) siblings: Vec<DropListId>,
    /// Always starts with `element`.
    pub(crate) scrollable_parents: Vec<E>,
    pub(crate) is_dragging: bool,
    /// Lists whose drag this list can receive.
    pub(crate) active_siblings: SmallVec<[DropListId; 2]>,
    pub(crate) initial_scroll_snap: String,
    pub(crate) strategy: SingleAxisSortStrategy,
    pub(crate) scroll_cache: ScrollPositionCache<E>,
    pub(crate) dom_rect: Option<Rect>,
    pub(crate) auto_scroll: AutoScroll<E>,
    pub(crate) listening: bool,
    pub(crate) scroll_root: Option<E>,
    pub(crate) events: Emitter<DropListEvent<E>>,
}

impl<E: Copy> DropListRef<E> {
    pub(crate) fn new(element: E) -> Self {
        Self {
            element,
            options: DropListOptions::default(),
            items: Vec::new(),
            siblings: Vec::new(),
            scrollable_parents: alloc::vec![element],
            is_dragging: false,
            active_siblings: SmallVec::new(),
            initial_scroll_snap: String::new(),
            strategy: SingleAxisSortStrategy::default(),
            scroll_cache: ScrollPositionCache::default(),
            dom_rect: None,
            auto_scroll: AutoScroll::default(),
            listening: false,
            scroll_root: None,
            events: Emitter::default(),
        }
    }

    pub(crate) fn is_receiving(&self) -> bool {
        !self.active_siblings.is_empty()
    }
}

impl<H: DragHost> DragDrop<H> {
    /// Make `element` a drop list.
    pub fn create_drop_list(&mut self, element: H::Element) -> DropListId {
        let id = self.lists.insert(DropListRef::new(element));
        self.router.register_drop_list(id);
        id
    }

    /// Tear down a list. Disposing twice, or disposing a stale handle, does nothing.
    pub fn dispose_drop_list(&mut self, list: DropListId) {
        if !self.lists.is_alive(list) {
            return;
        }
        self.stop_scrolling(list);
        self.stop_listening(list);
        self.router.unregister_drop_list(list);
        for other in self.lists.ids::<DropListId>() {
            if let Some(other) = self.lists.get_mut(other) {
                other.siblings.retain(|s| *s != list);
                other.active_siblings.retain(|s| *s != list);
            }
        }
        if let Some(mut removed) = self.lists.remove(list) {
            removed.events.complete();
        }
        #[cfg(feature = "tracing")]
        tracing::debug!(?list, "drop list disposed");
    }

    /// Options of a list.
    pub fn drop_list_options(&self, list: DropListId) -> Option<&DropListOptions> {
        self.lists.get(list).map(|l| &l.options)
    }

    /// Mutable options of a list.
    pub fn drop_list_options_mut(&mut self, list: DropListId) -> Option<&mut DropListOptions> {
        self.lists.get_mut(list).map(|l| &mut l.options)
    }

    /// The element the list was created for.
    pub fn drop_list_element(&self, list: DropListId) -> Option<H::Element> {
        self.lists.get(list).map(|l| l.element)
    }

    /// Items of the list in their data order.
    pub fn drop_list_items(&self, list: DropListId) -> &[DragId] {
        self.lists.get(list).map_or(&[][..], |l| l.items.as_slice())
    }

    /// Whether an item of this list is being dragged, or one entered it.
    pub fn is_list_dragging(&self, list: DropListId) -> bool {
        self.lists.get(list).is_some_and(|l| l.is_dragging)
    }

    /// Whether a connected list's drag could be dropped here.
    pub fn is_receiving(&self, list: DropListId) -> bool {
        self.lists.get(list).is_some_and(DropListRef::is_receiving)
    }

    /// Replace the items of the list.
    ///
    /// When a drag is in progress and every dragged item is gone, the drag of
    /// the list is abandoned.
    pub fn with_items(&mut self, list: DropListId, items: &[DragId]) {
        let Some(l) = self.lists.get_mut(list) else {
            return;
        };
        let previous = core::mem::replace(&mut l.items, items.to_vec());
        let was_dragging = l.is_dragging;
        for item in items {
            if let Some(item) = self.items.get_mut(*item) {
                item.drop_container = Some(list);
            }
        }
        if !was_dragging {
            return;
        }
        let all_dragged_removed = previous
            .iter()
            .filter(|i| self.router.is_dragging(**i))
            .all(|i| !items.contains(i));
        if all_dragged_removed {
            self.reset_list(list);
        } else if let Some(l) = self.lists.get_mut(list) {
            l.strategy.with_items(items);
            self.cache_item_positions(list);
        }
        self.styles.flush(&mut self.host);
    }

    /// Lists items of this list can be moved into.
    pub fn connected_to(&mut self, list: DropListId, siblings: &[DropListId]) {
        if let Some(l) = self.lists.get_mut(list) {
            l.siblings = siblings.iter().copied().filter(|s| *s != list).collect();
        }
    }

    /// Scrollable ancestors to account for while dragging.
    pub fn with_scrollable_parents(&mut self, list: DropListId, elements: &[H::Element]) {
        let Some(l) = self.lists.get_mut(list) else {
            return;
        };
        let element = l.element;
        let mut parents = alloc::vec![element];
        for e in elements {
            if !parents.contains(e) {
                parents.push(*e);
            }
        }
        l.scrollable_parents = parents;
    }

    /// Visual index of `item` in the list.
    pub fn item_index(&self, list: DropListId, item: DragId) -> Option<usize> {
        let l = self.lists.get(list)?;
        if l.is_dragging {
            l.strategy.item_index(item)
        } else {
            l.items.iter().position(|i| *i == item)
        }
    }

    /// Whether the point is inside the list's cached rectangle.
    pub fn is_over_container(&self, list: DropListId, x: f64, y: f64) -> bool {
        self.lists
            .get(list)
            .and_then(|l| l.dom_rect)
            .is_some_and(|rect| is_inside_rect(&rect, x, y))
    }

    /// Whether `item` dropped at the point would land in this list.
    pub fn can_receive(&self, list: DropListId, item: DragId, x: f64, y: f64) -> bool {
        let Some(l) = self.lists.get(list) else {
            return false;
        };
        let Some(rect) = l.dom_rect else {
            return false;
        };
        if !is_inside_rect(&rect, x, y) || !(l.options.enter_predicate)(item, list) {
            return false;
        }
        // Another element may be stacked over the list at this point.
        let scope = self.host.shadow_root(l.element);
        self.host
            .element_from_point(scope, Point::new(x, y))
            .is_some_and(|hit| self.host.contains(l.element, hit))
    }

    /// First connected list that would receive `item` at the point.
    pub fn sibling_from_position(
        &self,
        list: DropListId,
        item: DragId,
        x: f64,
        y: f64,
    ) -> Option<DropListId> {
        self.lists
            .get(list)?
            .siblings
            .iter()
            .copied()
            .find(|sibling| self.can_receive(*sibling, item, x, y))
    }

    /// Stop auto-scrolling.
    pub fn stop_scrolling(&mut self, list: DropListId) {
        if let Some(l) = self.lists.get_mut(list) {
            l.auto_scroll.stop();
        }
    }

    /// Start a drag of one of this list's items and tell connected lists.
    pub(crate) fn start_list(&mut self, list: DropListId) {
        self.list_dragging_started(list);
        self.notify_receiving_siblings(list);
    }

    fn list_dragging_started(&mut self, list: DropListId) {
        self.emit_list(list, DropListEvent::BeforeStarted);
        let Some(l) = self.lists.get_mut(list) else {
            return;
        };
        l.is_dragging = true;
        l.strategy.orientation = l.options.orientation;
        l.strategy.direction = l.options.direction;
        let element = l.element;
        let items = l.items.clone();

        for id in &items {
            let Some(item) = self.items.get(*id) else {
                continue;
            };
            if item.phase == DragPhase::Idle && !self.router.is_dragging(*id) {
                debug_assert!(
                    self.host.parent(item.root).is_none_or(|p| p == element),
                    "drop list items must be direct children of the list element"
                );
            }
        }

        let snap = self.host.scroll_snap_type(element);
        self.host.set_scroll_snap_type(element, "none");
        if let Some(l) = self.lists.get_mut(list) {
            l.initial_scroll_snap = snap;
            l.strategy.start(&items);
        }
        self.cache_item_positions(list);
        self.cache_parent_positions(list);
        self.listen_to_scroll(list);
    }

    fn notify_receiving_siblings(&mut self, list: DropListId) {
        let Some(l) = self.lists.get(list) else {
            return;
        };
        let dragged: Vec<DragId> = l
            .items
            .iter()
            .copied()
            .filter(|i| self.router.is_dragging(*i))
            .collect();
        let siblings = l.siblings.clone();
        for sibling in siblings {
            self.start_receiving(sibling, list, &dragged);
        }
    }

    fn start_receiving(&mut self, list: DropListId, initiator: DropListId, items: &[DragId]) {
        let Some(l) = self.lists.get_mut(list) else {
            return;
        };
        if l.active_siblings.contains(&initiator) {
            return;
        }
        let accepts = items
            .iter()
            .all(|i| (l.options.enter_predicate)(*i, list) || l.items.contains(i));
        if !accepts {
            return;
        }
        l.active_siblings.push(initiator);
        self.cache_parent_positions(list);
        self.listen_to_scroll(list);
        self.emit_list(
            list,
            DropListEvent::ReceivingStarted {
                initiator,
                items: items.to_vec(),
            },
        );
    }

    fn stop_receiving(&mut self, list: DropListId, initiator: DropListId) {
        let Some(l) = self.lists.get_mut(list) else {
            return;
        };
        let Some(index) = l.active_siblings.iter().position(|s| *s == initiator) else {
            return;
        };
        l.active_siblings.remove(index);
        if !l.is_dragging && l.active_siblings.is_empty() {
            self.stop_listening(list);
        }
        self.emit_list(list, DropListEvent::ReceivingStopped { initiator });
    }

    /// Snapshot the rectangles of the active items.
    fn cache_item_positions(&mut self, list: DropListId) {
        self.styles.flush(&mut self.host);
        let Some(l) = self.lists.get(list) else {
            return;
        };
        let positions: Vec<ItemPosition> = l
            .strategy
            .active()
            .iter()
            .filter_map(|&drag| {
                let element = self.visible_element(drag)?;
                Some(ItemPosition {
                    drag,
                    rect: self.host.client_rect(element),
                    offset: 0.0,
                    initial_transform: self.styles.read(&self.host, element),
                })
            })
            .collect();
        if let Some(l) = self.lists.get_mut(list) {
            l.strategy.set_positions(positions);
        }
    }

    fn cache_parent_positions(&mut self, list: DropListId) {
        self.styles.flush(&mut self.host);
        let Some(l) = self.lists.get_mut(list) else {
            return;
        };
        l.scroll_cache.cache(&self.host, &l.scrollable_parents);
        l.dom_rect = l.scroll_cache.rect_of(l.element);
    }

    fn listen_to_scroll(&mut self, list: DropListId) {
        let Some(l) = self.lists.get_mut(list) else {
            return;
        };
        if l.listening {
            return;
        }
        l.listening = true;
        let root = self.host.shadow_root(l.element);
        l.scroll_root = root;
        if let Some(root) = root {
            self.router.watch_shadow_root(&mut self.host, root);
        }
    }

    fn stop_listening(&mut self, list: DropListId) {
        let Some(l) = self.lists.get_mut(list) else {
            return;
        };
        if !l.listening {
            return;
        }
        l.listening = false;
        if let Some(root) = l.scroll_root.take() {
            self.router.unwatch_shadow_root(&mut self.host, root);
        }
    }

    /// End the list's part of a drag and put every item back.
    pub(crate) fn reset_list(&mut self, list: DropListId) {
        let Some(l) = self.lists.get_mut(list) else {
            return;
        };
        l.is_dragging = false;
        let element = l.element;
        let snap = core::mem::take(&mut l.initial_scroll_snap);
        let siblings = l.siblings.clone();
        let restore = l.strategy.reset();
        self.host.set_scroll_snap_type(element, &snap);

        for sibling in siblings {
            self.stop_receiving(sibling, list);
        }
        for (drag, transform) in restore {
            if let Some(item) = self.items.get(drag) {
                self.styles.set(item.root, transform);
            }
        }
        self.stop_scrolling(list);
        if !self.is_receiving(list) {
            self.stop_listening(list);
        }
        if let Some(l) = self.lists.get_mut(list) {
            l.scroll_cache.clear();
        }
    }

    /// Place `item`, dragged in from another list, at the pointer or at `index`.
    pub(crate) fn enter(
        &mut self,
        list: DropListId,
        item: DragId,
        x: f64,
        y: f64,
        index: Option<usize>,
    ) {
        let Some(l) = self.lists.get(list) else {
            return;
        };
        if !l.is_dragging {
            self.list_dragging_started(list);
        }
        let Some(placeholder) = self.items.get(item).and_then(|i| i.placeholder) else {
            return;
        };
        let router = &self.router;
        let Some(l) = self.lists.get_mut(list) else {
            return;
        };
        let index = index.or_else(|| {
            l.options
                .sorting_disabled
                .then(|| l.items.iter().position(|i| *i == item))
                .flatten()
        });
        let DropListRef {
            strategy,
            options,
            element,
            ..
        } = l;
        let reference = strategy.enter(
            item,
            Point::new(x, y),
            index,
            &|drag| router.is_dragging(drag),
            &|i| (options.sort_predicate)(i, item, list),
        );
        let element = *element;

        match reference.and_then(|r| self.items.get(r)).map(|r| r.root) {
            Some(root) => {
                let parent = self.host.parent(root).unwrap_or(element);
                self.host.insert_before(parent, placeholder, Some(root));
            }
            None => self.host.insert_before(element, placeholder, None),
        }
        self.styles.set(placeholder, String::new());
        self.cache_item_positions(list);
        self.cache_parent_positions(list);
        self.notify_receiving_siblings(list);

        let current_index = self.item_index(list, item).unwrap_or(0);
        self.emit_list(list, DropListEvent::Entered { item, current_index });
        #[cfg(feature = "tracing")]
        tracing::debug!(?list, ?item, current_index, "item entered list");
    }

    /// `item` left the list for another one.
    pub(crate) fn exit(&mut self, list: DropListId, item: DragId) {
        self.reset_list(list);
        self.emit_list(list, DropListEvent::Exited { item });
        #[cfg(feature = "tracing")]
        tracing::debug!(?list, ?item, "item exited list");
    }

    /// `item` was dropped into the list.
    pub(crate) fn drop_into(&mut self, list: DropListId, drop: DropEvent<H::Element>) {
        self.reset_list(list);
        self.emit_list(list, DropListEvent::Dropped(drop));
    }

    /// Re-sort the snapshot for the pointer and shift the items that moved.
    pub(crate) fn sort_item(
        &mut self,
        list: DropListId,
        item: DragId,
        x: f64,
        y: f64,
        delta: PointerDelta,
    ) {
        let Some(l) = self.lists.get_mut(list) else {
            return;
        };
        if l.options.sorting_disabled {
            return;
        }
        let Some(rect) = l.dom_rect else {
            return;
        };
        if !is_pointer_near_rect(&rect, DROP_PROXIMITY_THRESHOLD, x, y) {
            return;
        }
        let DropListRef {
            strategy, options, ..
        } = l;
        let horizontal = strategy.orientation == Orientation::Horizontal;
        let Some(outcome) = strategy.sort(item, Point::new(x, y), delta, &|i| {
            (options.sort_predicate)(i, item, list)
        }) else {
            return;
        };

        for displaced in &outcome.displaced {
            let Some(drag) = self.items.get(displaced.drag) else {
                continue;
            };
            let element = if displaced.drag == item {
                drag.placeholder.unwrap_or(drag.root)
            } else {
                drag.root
            };
            let amount = round_px(displaced.offset * (1.0 / drag.options.scale));
            let translate = if horizontal {
                format!("translate3d({amount}px, 0, 0)")
            } else {
                format!("translate3d(0, {amount}px, 0)")
            };
            let transform = combine_transforms(&translate, Some(&displaced.initial_transform));
            self.styles.set(element, transform);
        }

        self.emit_list(
            list,
            DropListEvent::Sorted {
                item,
                previous_index: outcome.previous_index,
                current_index: outcome.current_index,
            },
        );
        #[cfg(feature = "tracing")]
        tracing::debug!(
            ?list,
            ?item,
            previous_index = outcome.previous_index,
            current_index = outcome.current_index,
            "item sorted"
        );
    }

    /// Pick the node to auto-scroll for a pointer at `(x, y)`.
    pub(crate) fn start_scrolling_if_necessary(&mut self, list: DropListId, x: f64, y: f64) {
        let Some(l) = self.lists.get(list) else {
            return;
        };
        if l.options.auto_scroll_disabled {
            return;
        }
        let direction = l.options.direction;
        let mut node = None;
        let mut vertical = VerticalScroll::None;
        let mut horizontal = HorizontalScroll::None;

        for entry in l.scroll_cache.entries() {
            if node.is_some() {
                break;
            }
            let (ScrollTarget::Element(element), Some(rect)) = (entry.node, entry.rect) else {
                continue;
            };
            if is_pointer_near_rect(&rect, SCROLL_PROXIMITY_THRESHOLD, x, y) {
                (vertical, horizontal) = element_scroll_directions(
                    &self.host.scroll_metrics(element),
                    &rect,
                    direction,
                    x,
                    y,
                );
                if vertical != VerticalScroll::None || horizontal != HorizontalScroll::None {
                    node = Some(ScrollTarget::Element(element));
                }
            }
        }

        if vertical == VerticalScroll::None && horizontal == HorizontalScroll::None {
            let size = self.host.viewport_size();
            let viewport = Rect::new(0.0, 0.0, size.width, size.height);
            vertical = vertical_scroll_direction(&viewport, y);
            horizontal = horizontal_scroll_direction(&viewport, x);
            node = Some(ScrollTarget::Document);
        }

        let Some(node) = node else {
            return;
        };
        let Some(l) = self.lists.get_mut(list) else {
            return;
        };
        if l.auto_scroll.retarget(node, vertical, horizontal) {
            if l.auto_scroll.is_active() {
                l.auto_scroll.running = true;
                #[cfg(feature = "tracing")]
                tracing::debug!(?list, ?node, ?vertical, ?horizontal, "auto-scroll retargeted");
            } else {
                l.auto_scroll.stop();
            }
        }
    }

    /// Run one frame of every running auto-scroll.
    pub(crate) fn auto_scroll_frame(&mut self) {
        for list in self.lists.ids::<DropListId>() {
            let Some(l) = self.lists.get(list) else {
                continue;
            };
            if !l.auto_scroll.running {
                continue;
            }
            let Some(node) = l.auto_scroll.node else {
                continue;
            };
            for delta in l.auto_scroll.frame_steps(l.options.auto_scroll_step).into_iter().flatten() {
                self.host.scroll_by(node, delta);
            }
        }
    }

    pub(crate) fn list_on_scroll(&mut self, list: DropListId, target: ScrollTarget<H::Element>) {
        let Some(l) = self.lists.get_mut(list) else {
            return;
        };
        if l.is_dragging {
            let Some(difference) = l.scroll_cache.handle_scroll(&self.host, target) else {
                return;
            };
            l.dom_rect = l.scroll_cache.rect_of(l.element).or(l.dom_rect);
            l.strategy.update_on_scroll(difference.y, difference.x);
            let dragged: Vec<DragId> = l
                .strategy
                .positions()
                .iter()
                .map(|p| p.drag)
                .filter(|d| self.router.is_dragging(*d))
                .collect();
            for drag in dragged {
                self.sort_from_last_pointer_position(drag);
            }
        } else if l.is_receiving() {
            self.cache_parent_positions(list);
        }
    }

    fn emit_list(&mut self, list: DropListId, event: DropListEvent<H::Element>) {
        if let Some(l) = self.lists.get_mut(list) {
            l.events.emit(&event);
        }
    }
}
