// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The engine: items, lists, and the host they live in.

use core::fmt;

use crate::arena::Arena;
use crate::config::DragDropConfig;
use crate::drag_ref::DragRef;
use crate::drop_list::DropListRef;
use crate::emitter::ListenerId;
use crate::event::{
    DragEvent, DragMoved, DropListEvent, PointerEvent, PointerKind, ScrollEvent, TargetEvent,
    TransitionEndEvent,
};
use crate::host::DragHost;
use crate::registry::PointerRouter;
use crate::style::StyleBatch;
use crate::types::{DragId, DragPhase, DropListId};

/// Drag-and-drop engine over a [`DragHost`].
///
/// Items and lists are addressed by generational handles. Handles outlive
/// what they point to: operations on a disposed item or list do nothing, and
/// queries on one return `None` or `false`.
///
/// The host forwards native events to the entry points below. Each entry
/// point writes its style changes to the host once, just before returning.
pub struct DragDrop<H: DragHost> {
    pub(crate) host: H,
    pub(crate) config: DragDropConfig,
    pub(crate) router: PointerRouter<H::Element>,
    pub(crate) items: Arena<DragRef<H::Element>>,
    pub(crate) lists: Arena<DropListRef<H::Element>>,
    pub(crate) styles: StyleBatch<H::Element>,
}

impl<H: DragHost> fmt::Debug for DragDrop<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DragDrop")
            .field("config", &self.config)
            .field("router", &self.router)
            .field("items", &self.items.ids::<DragId>())
            .field("lists", &self.lists.ids::<DropListId>())
            .field("pending_styles", &self.styles.len())
            .finish_non_exhaustive()
    }
}

impl<H: DragHost> DragDrop<H> {
    /// Create an engine with no items or lists.
    pub fn new(host: H, config: DragDropConfig) -> Self {
        Self {
            host,
            config,
            router: PointerRouter::default(),
            items: Arena::default(),
            lists: Arena::default(),
            styles: StyleBatch::default(),
        }
    }

    /// The host.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Mutable access to the host.
    ///
    /// Transforms the engine has queued are written before this returns, so
    /// the host sees the engine's latest styles.
    pub fn host_mut(&mut self) -> &mut H {
        self.styles.flush(&mut self.host);
        &mut self.host
    }

    /// Engine-wide options.
    pub fn config(&self) -> &DragDropConfig {
        &self.config
    }

    /// Mutable engine-wide options.
    pub fn config_mut(&mut self) -> &mut DragDropConfig {
        &mut self.config
    }

    /// The shared pointer router.
    pub fn router(&self) -> &PointerRouter<H::Element> {
        &self.router
    }

    /// The shared pointer router, for subscribing to its broadcasts.
    pub fn router_mut(&mut self) -> &mut PointerRouter<H::Element> {
        &mut self.router
    }

    /// Listen to an item's lifecycle events. `None` if the item is gone.
    pub fn subscribe_drag(
        &mut self,
        id: DragId,
        listener: impl FnMut(&DragEvent<H::Element>) + 'static,
    ) -> Option<ListenerId> {
        self.items.get_mut(id)?.events.subscribe(listener)
    }

    /// Remove a listener added with [`DragDrop::subscribe_drag`].
    pub fn unsubscribe_drag(&mut self, id: DragId, listener: ListenerId) -> bool {
        self.items
            .get_mut(id)
            .is_some_and(|item| item.events.unsubscribe(listener))
    }

    /// Listen to every pointer move of an item's drag.
    ///
    /// Move events are only built while someone listens.
    pub fn subscribe_drag_moved(
        &mut self,
        id: DragId,
        listener: impl FnMut(&DragMoved<H::Element>) + 'static,
    ) -> Option<ListenerId> {
        self.items.get_mut(id)?.moved.subscribe(listener)
    }

    /// Remove a listener added with [`DragDrop::subscribe_drag_moved`].
    pub fn unsubscribe_drag_moved(&mut self, id: DragId, listener: ListenerId) -> bool {
        self.items
            .get_mut(id)
            .is_some_and(|item| item.moved.unsubscribe(listener))
    }

    /// Listen to a list's events. `None` if the list is gone.
    pub fn subscribe_drop_list(
        &mut self,
        list: DropListId,
        listener: impl FnMut(&DropListEvent<H::Element>) + 'static,
    ) -> Option<ListenerId> {
        self.lists.get_mut(list)?.events.subscribe(listener)
    }

    /// Remove a listener added with [`DragDrop::subscribe_drop_list`].
    pub fn unsubscribe_drop_list(&mut self, list: DropListId, listener: ListenerId) -> bool {
        self.lists
            .get_mut(list)
            .is_some_and(|l| l.events.unsubscribe(listener))
    }

    /// `mousedown` or `touchstart` on an item's root.
    pub fn pointer_down(&mut self, id: DragId, event: &mut PointerEvent<H::Element>) {
        self.drag_pointer_down(id, event);
        self.styles.flush(&mut self.host);
    }

    /// `dragstart` on an item's root. Native dragging is prevented when the
    /// engine would handle a press on the target itself.
    pub fn native_drag_start(&mut self, id: DragId, event: &mut TargetEvent<H::Element>) {
        self.drag_native_drag_start(id, event);
    }

    /// `mousemove` or `touchmove` from a global listener.
    pub fn global_pointer_move(&mut self, event: &mut PointerEvent<H::Element>) {
        let active = self.router.active_items().to_vec();
        if active.is_empty() {
            return;
        }
        if event.kind == PointerKind::TouchMove
            && active
                .iter()
                .any(|id| self.drag_phase(*id) == Some(DragPhase::Dragging))
        {
            // Keeps the page from scrolling under a started touch drag.
            event.prevent_default();
        }
        self.router.pointer_move.emit(event);
        for id in active {
            self.drag_pointer_move(id, event);
        }
        self.styles.flush(&mut self.host);
    }

    /// `mouseup`, `touchend`, or `touchcancel` from a global listener.
    pub fn global_pointer_up(&mut self, event: &mut PointerEvent<H::Element>) {
        let active = self.router.active_items().to_vec();
        if active.is_empty() {
            return;
        }
        self.router.pointer_up.emit(event);
        for id in active {
            self.end_drag_sequence(id, event);
        }
        self.styles.flush(&mut self.host);
    }

    /// Capturing `scroll` from the document listener.
    pub fn global_scroll(&mut self, event: &ScrollEvent<H::Element>) {
        self.dispatch_scroll(event);
        self.styles.flush(&mut self.host);
    }

    /// Capturing `scroll` from the listener on a shadow root.
    pub fn shadow_root_scroll(&mut self, root: H::Element, event: &ScrollEvent<H::Element>) {
        if !self.router.accepts_shadow_scroll(root) {
            return;
        }
        self.dispatch_scroll(event);
        self.styles.flush(&mut self.host);
    }

    fn dispatch_scroll(&mut self, event: &ScrollEvent<H::Element>) {
        self.router.scroll.emit(event);
        for id in self.router.active_items().to_vec() {
            self.drag_on_scroll(id, event.target);
        }
        for list in self.lists.ids::<DropListId>() {
            if self.lists.get(list).is_some_and(|l| l.listening) {
                self.list_on_scroll(list, event.target);
            }
        }
    }

    /// `selectstart` from the document or a shadow root.
    pub fn select_start(&mut self, event: &mut TargetEvent<H::Element>) {
        let in_blocked_root = event.target.is_some_and(|target| {
            self.router
                .select_start_roots()
                .any(|root| self.host.contains(root, target))
        });
        if !self.router.active_items().is_empty() || in_blocked_root {
            event.default_prevented = true;
        }
    }

    /// `transitionend` on a preview.
    pub fn transition_end(&mut self, event: &TransitionEndEvent<'_, H::Element>) {
        if event.property_name != "transform" {
            return;
        }
        for id in self.items.ids::<DragId>() {
            let Some(item) = self.items.get(id) else {
                continue;
            };
            if item.preview != Some(event.target) {
                continue;
            }
            if let Some(pending) = item.pending_drop {
                self.finish_drop(id, pending.event);
            }
        }
        self.styles.flush(&mut self.host);
    }

    /// Advance the clock to `now` (milliseconds). Finishes drops whose
    /// animation should be over.
    pub fn tick(&mut self, now: u64) {
        for id in self.items.ids::<DragId>() {
            let Some(pending) = self.items.get(id).and_then(|item| item.pending_drop) else {
                continue;
            };
            if pending.deadline <= now {
                self.finish_drop(id, pending.event);
            }
        }
        self.styles.flush(&mut self.host);
    }

    /// One animation frame: lists that are auto-scrolling scroll by their step.
    pub fn animation_frame(&mut self) {
        self.auto_scroll_frame();
        self.styles.flush(&mut self.host);
    }

    /// Whether [`DragDrop::animation_frame`] has work to do.
    pub fn wants_animation_frame(&self) -> bool {
        self.lists
            .ids::<DropListId>()
            .into_iter()
            .any(|list| self.lists.get(list).is_some_and(|l| l.auto_scroll.running))
    }

    /// Dispose every item and list and unbind all listeners.
    pub fn dispose(&mut self) {
        for id in self.items.ids::<DragId>() {
            self.dispose_drag(id);
        }
        for list in self.lists.ids::<DropListId>() {
            self.dispose_drop_list(list);
        }
        self.router.dispose(&mut self.host);
        self.styles.flush(&mut self.host);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::boxed::Box;
    use alloc::rc::Rc;
    use alloc::vec;
    use alloc::vec::Vec;
    use core::cell::RefCell;

    use kurbo::{Point, Rect, Vec2};
    use proptest::prelude::*;

    use crate::config::DragStartDelay;
    use crate::event::DropEvent;
    use crate::host::{GlobalListener, ScrollMetrics, ScrollTarget};
    use crate::testing::{El, FakeHost, NodeKind};

    type Log<T> = Rc<RefCell<Vec<T>>>;

    fn engine() -> DragDrop<FakeHost> {
        DragDrop::new(FakeHost::new(), DragDropConfig::default())
    }

    fn mouse(kind: PointerKind, x: f64, y: f64, t: u64) -> PointerEvent<El> {
        PointerEvent::mouse(kind, Point::new(x, y), t)
    }

    /// A vertical list at `x` with 100px items starting at y = 100.
    fn list(dd: &mut DragDrop<FakeHost>, x: f64, count: usize) -> (DropListId, El, Vec<DragId>) {
        let body = dd.host().body_element();
        let bottom = 100.0 + 100.0 * count as f64;
        let element = dd
            .host_mut()
            .element(body, Rect::new(x, 100.0, x + 200.0, bottom.max(400.0)));
        let id = dd.create_drop_list(element);
        let items: Vec<DragId> = (0..count)
            .map(|i| {
                let top = 100.0 + 100.0 * i as f64;
                let root = dd
                    .host_mut()
                    .element(element, Rect::new(x, top, x + 200.0, top + 100.0));
                dd.create_drag(root)
            })
            .collect();
        dd.with_items(id, &items);
        (id, element, items)
    }

    fn record_list(dd: &mut DragDrop<FakeHost>, list: DropListId) -> Log<DropListEvent<El>> {
        let log: Log<DropListEvent<El>> = Rc::default();
        let sink = log.clone();
        dd.subscribe_drop_list(list, move |e| sink.borrow_mut().push(e.clone()));
        log
    }

    fn record_drag(dd: &mut DragDrop<FakeHost>, id: DragId) -> Log<DragEvent<El>> {
        let log: Log<DragEvent<El>> = Rc::default();
        let sink = log.clone();
        dd.subscribe_drag(id, move |e| sink.borrow_mut().push(*e));
        log
    }

    fn dropped(log: &Log<DropListEvent<El>>) -> Option<DropEvent<El>> {
        log.borrow().iter().find_map(|e| match e {
            DropListEvent::Dropped(drop) => Some(*drop),
            _ => None,
        })
    }

    /// Press at `from`, then move far enough to start.
    fn press_and_start(dd: &mut DragDrop<FakeHost>, id: DragId, from: Point) {
        let root = dd.root_element(id).unwrap();
        let mut down = mouse(PointerKind::MouseDown, from.x, from.y, 0).with_target(root);
        dd.pointer_down(id, &mut down);
        let mut start = mouse(PointerKind::MouseMove, from.x, from.y + 10.0, 10);
        dd.global_pointer_move(&mut start);
        assert_eq!(dd.drag_phase(id), Some(DragPhase::Dragging));
    }

    fn move_to(dd: &mut DragDrop<FakeHost>, x: f64, y: f64, t: u64) -> PointerEvent<El> {
        let mut event = mouse(PointerKind::MouseMove, x, y, t);
        dd.global_pointer_move(&mut event);
        event
    }

    fn release(dd: &mut DragDrop<FakeHost>, x: f64, y: f64, t: u64) {
        let mut up = mouse(PointerKind::MouseUp, x, y, t);
        dd.global_pointer_up(&mut up);
    }

    #[test]
    fn reorders_within_a_list() {
        let mut dd = engine();
        let (list_id, list_el, items) = list(&mut dd, 0.0, 3);
        let log = record_list(&mut dd, list_id);
        let [a, b, _c] = [items[0], items[1], items[2]];
        let root_a = dd.root_element(a).unwrap();
        let root_b = dd.root_element(b).unwrap();

        press_and_start(&mut dd, a, Point::new(100.0, 150.0));
        assert!(dd.is_list_dragging(list_id));
        assert_eq!(log.borrow().first(), Some(&DropListEvent::BeforeStarted));
        let placeholder = dd.placeholder_element(a).unwrap();
        let preview = dd.preview_element(a).unwrap();
        assert!(!dd.host().node(root_a).visible, "root is hidden while dragging");
        assert_eq!(dd.host().parent(placeholder), Some(list_el));
        assert_eq!(dd.host().node(list_el).scroll_snap, "none");
        assert_eq!(
            dd.host().node(preview).preview_spec.map(|spec| spec.z_index),
            Some(crate::config::DEFAULT_PREVIEW_Z_INDEX)
        );

        let moved = move_to(&mut dd, 100.0, 350.0, 20);
        assert!(moved.default_prevented);
        assert!(log.borrow().contains(&DropListEvent::Sorted {
            item: a,
            previous_index: 0,
            current_index: 2,
        }));
        assert_eq!(dd.host().transform(root_b), "translate3d(0, -100px, 0)");
        assert_eq!(dd.host().transform(placeholder), "translate3d(0, 200px, 0)");
        assert_eq!(dd.host().transform(preview), "translate3d(0px, 300px, 0)");

        release(&mut dd, 100.0, 350.0, 30);
        let drop = dropped(&log).expect("list emits Dropped");
        assert_eq!((drop.previous_index, drop.current_index), (0, 2));
        assert_eq!(drop.container, list_id);
        assert_eq!(drop.previous_container, list_id);
        assert!(drop.is_pointer_over_container);

        assert_eq!(dd.drag_phase(a), Some(DragPhase::Idle));
        assert!(!dd.is_list_dragging(list_id));
        assert!(dd.host().node(root_a).visible);
        assert_eq!(dd.host().parent(root_a), Some(list_el));
        assert!(dd.host().nodes_of_kind(NodeKind::Preview).is_empty());
        assert!(dd.host().nodes_of_kind(NodeKind::Placeholder).is_empty());
        assert_eq!(dd.host().transform(root_b), "", "sort offsets are undone");
        assert!(dd.router().active_items().is_empty());
        assert_eq!(dd.host().listener_count(GlobalListener::MouseMove), 0);
    }

    #[test]
    fn transfers_between_connected_lists() {
        let mut dd = engine();
        let (first, first_el, first_items) = list(&mut dd, 0.0, 3);
        let (second, _, _) = list(&mut dd, 300.0, 2);
        dd.connected_to(first, &[second]);
        dd.connected_to(second, &[first]);
        let first_log = record_list(&mut dd, first);
        let second_log = record_list(&mut dd, second);
        let a = first_items[0];
        let drag_log = record_drag(&mut dd, a);

        press_and_start(&mut dd, a, Point::new(100.0, 150.0));
        assert!(dd.is_receiving(second));
        assert!(matches!(
            second_log.borrow().first(),
            Some(DropListEvent::ReceivingStarted { initiator, .. }) if *initiator == first
        ));

        move_to(&mut dd, 400.0, 250.0, 20);
        assert_eq!(dd.drop_container(a), Some(second));
        let count = |log: &Log<DropListEvent<El>>, f: fn(&DropListEvent<El>) -> bool| {
            log.borrow().iter().filter(|e| f(e)).count()
        };
        assert_eq!(count(&first_log, |e| matches!(e, DropListEvent::Exited { .. })), 1);
        assert_eq!(count(&first_log, |e| matches!(e, DropListEvent::Entered { .. })), 0);
        assert_eq!(count(&second_log, |e| matches!(e, DropListEvent::Exited { .. })), 0);
        assert_eq!(count(&second_log, |e| matches!(e, DropListEvent::Entered { .. })), 1);
        assert!(second_log.borrow().contains(&DropListEvent::Entered {
            item: a,
            current_index: 1,
        }));
        let drag_exits = drag_log
            .borrow()
            .iter()
            .filter(|e| **e == DragEvent::Exited { container: first })
            .count();
        let drag_enters = drag_log
            .borrow()
            .iter()
            .filter(|e| {
                **e == DragEvent::Entered {
                    container: second,
                    current_index: 1,
                }
            })
            .count();
        assert_eq!((drag_exits, drag_enters), (1, 1));

        release(&mut dd, 400.0, 250.0, 30);
        let drop = dropped(&second_log).expect("target list emits Dropped");
        assert_eq!(drop.container, second);
        assert_eq!(drop.previous_container, first);
        assert_eq!(drop.previous_index, 0);
        assert_eq!(drop.current_index, 2);
        assert!(drop.is_pointer_over_container);
        assert!(dropped(&first_log).is_none());
        assert_eq!(count(&second_log, |e| matches!(e, DropListEvent::Dropped(_))), 1);
        let drag_drops = drag_log
            .borrow()
            .iter()
            .filter(|e| matches!(e, DragEvent::Dropped(_)))
            .count();
        assert_eq!(drag_drops, 1);
        assert_eq!(dd.drop_container(a), Some(first), "back home until the host moves it");
        let root_a = dd.root_element(a).unwrap();
        assert_eq!(dd.host().parent(root_a), Some(first_el));
        assert!(!dd.is_receiving(first) && !dd.is_receiving(second));
    }

    #[test]
    fn enter_predicate_blocks_transfer() {
        let mut dd = engine();
        let (first, _, first_items) = list(&mut dd, 0.0, 3);
        let (second, _, _) = list(&mut dd, 300.0, 2);
        dd.connected_to(first, &[second]);
        dd.drop_list_options_mut(second).unwrap().enter_predicate = Box::new(|_, _| false);
        let first_log = record_list(&mut dd, first);
        let second_log = record_list(&mut dd, second);
        let a = first_items[0];

        press_and_start(&mut dd, a, Point::new(100.0, 150.0));
        assert!(!dd.is_receiving(second));
        move_to(&mut dd, 400.0, 250.0, 20);
        assert_eq!(dd.drop_container(a), Some(first));
        release(&mut dd, 400.0, 250.0, 30);

        let drop = dropped(&first_log).expect("original list keeps the item");
        assert_eq!((drop.previous_index, drop.current_index), (0, 0));
        assert!(!drop.is_pointer_over_container);
        assert!(second_log.borrow().is_empty());
    }

    #[test]
    fn rejected_presses_never_arm() {
        let mut dd = engine();
        let (_, _, items) = list(&mut dd, 0.0, 1);
        let a = items[0];
        let root = dd.root_element(a).unwrap();
        let log = record_drag(&mut dd, a);

        let mut fake = mouse(PointerKind::MouseDown, 100.0, 150.0, 0)
            .with_target(root)
            .with_buttons(0, 0);
        dd.pointer_down(a, &mut fake);
        let mut secondary = mouse(PointerKind::MouseDown, 100.0, 150.0, 0)
            .with_target(root)
            .with_buttons(2, 2);
        dd.pointer_down(a, &mut secondary);

        assert_eq!(dd.drag_phase(a), Some(DragPhase::Idle));
        assert!(dd.router().active_items().is_empty());
        assert_eq!(dd.host().listener_count(GlobalListener::MouseMove), 0);
        assert_eq!(
            *log.borrow(),
            vec![DragEvent::BeforeStarted, DragEvent::BeforeStarted],
            "BeforeStarted fires for every press"
        );
    }

    #[test]
    fn emulated_mouse_after_touch_is_ignored() {
        let mut dd = engine();
        let body = dd.host().body_element();
        let root = dd.host_mut().element(body, Rect::new(0.0, 100.0, 100.0, 200.0));
        let id = dd.create_drag(root);

        let mut down = PointerEvent::touch(PointerKind::TouchStart, Point::new(50.0, 150.0), 0)
            .with_target(root);
        dd.pointer_down(id, &mut down);
        let mut touch_move = PointerEvent::touch(PointerKind::TouchMove, Point::new(50.0, 170.0), 10);
        dd.global_pointer_move(&mut touch_move);
        assert_eq!(dd.drag_phase(id), Some(DragPhase::Dragging));
        let mut end = PointerEvent::touch(PointerKind::TouchEnd, Point::new(50.0, 170.0), 20);
        dd.global_pointer_up(&mut end);

        let mut emulated = mouse(PointerKind::MouseDown, 50.0, 170.0, 500).with_target(root);
        dd.pointer_down(id, &mut emulated);
        assert_eq!(dd.drag_phase(id), Some(DragPhase::Idle));

        let mut real = mouse(PointerKind::MouseDown, 50.0, 170.0, 2000).with_target(root);
        dd.pointer_down(id, &mut real);
        assert_eq!(dd.drag_phase(id), Some(DragPhase::PendingThreshold));
    }

    #[test]
    fn touch_moves_are_prevented_only_after_start() {
        let mut dd = engine();
        let body = dd.host().body_element();
        let root = dd.host_mut().element(body, Rect::new(0.0, 100.0, 100.0, 200.0));
        let id = dd.create_drag(root);

        let mut down = PointerEvent::touch(PointerKind::TouchStart, Point::new(50.0, 150.0), 0)
            .with_target(root);
        dd.pointer_down(id, &mut down);
        let mut small = PointerEvent::touch(PointerKind::TouchMove, Point::new(50.0, 152.0), 5);
        dd.global_pointer_move(&mut small);
        assert!(!small.default_prevented, "the page may still scroll");

        let mut far = PointerEvent::touch(PointerKind::TouchMove, Point::new(50.0, 170.0), 10);
        dd.global_pointer_move(&mut far);
        let mut after = PointerEvent::touch(PointerKind::TouchMove, Point::new(50.0, 180.0), 15);
        dd.global_pointer_move(&mut after);
        assert!(after.default_prevented);
    }

    #[test]
    fn moving_before_the_delay_aborts() {
        let mut dd = engine();
        let (_, _, items) = list(&mut dd, 0.0, 2);
        let a = items[0];
        dd.drag_options_mut(a).unwrap().drag_start_delay = DragStartDelay::Uniform(500);
        let log = record_drag(&mut dd, a);
        let root = dd.root_element(a).unwrap();

        let mut down = mouse(PointerKind::MouseDown, 100.0, 150.0, 0).with_target(root);
        dd.pointer_down(a, &mut down);
        move_to(&mut dd, 100.0, 180.0, 100);

        assert_eq!(dd.drag_phase(a), Some(DragPhase::Idle));
        assert!(dd.router().active_items().is_empty());
        assert_eq!(*log.borrow(), vec![DragEvent::BeforeStarted]);
    }

    #[test]
    fn handles_gate_the_press() {
        let mut dd = engine();
        let body = dd.host().body_element();
        let root = dd.host_mut().element(body, Rect::new(0.0, 100.0, 100.0, 200.0));
        let handle = dd.host_mut().element(root, Rect::new(0.0, 100.0, 20.0, 120.0));
        let id = dd.create_drag(root);
        dd.with_handles(id, &[handle]);

        let mut off_handle = mouse(PointerKind::MouseDown, 50.0, 150.0, 0).with_target(root);
        dd.pointer_down(id, &mut off_handle);
        assert_eq!(dd.drag_phase(id), Some(DragPhase::Idle));

        dd.disable_handle(id, handle);
        let mut disabled = mouse(PointerKind::MouseDown, 10.0, 110.0, 0).with_target(handle);
        dd.pointer_down(id, &mut disabled);
        assert_eq!(dd.drag_phase(id), Some(DragPhase::Idle));

        dd.enable_handle(id, handle);
        let mut on_handle = mouse(PointerKind::MouseDown, 10.0, 110.0, 0).with_target(handle);
        dd.pointer_down(id, &mut on_handle);
        assert_eq!(dd.drag_phase(id), Some(DragPhase::PendingThreshold));

        let mut native = TargetEvent::new(Some(root));
        dd.native_drag_start(id, &mut native);
        assert!(!native.default_prevented, "outside the handle native drag is left alone");
        let mut native = TargetEvent::new(Some(handle));
        dd.native_drag_start(id, &mut native);
        assert!(native.default_prevented);
    }

    #[test]
    fn free_drag_accumulates_and_resets() {
        let mut dd = engine();
        let body = dd.host().body_element();
        let root = dd.host_mut().element(body, Rect::new(0.0, 100.0, 100.0, 200.0));
        dd.host_mut().set_transform(root, "rotate(45deg)");
        let id = dd.create_drag(root);
        let log = record_drag(&mut dd, id);

        press_and_start(&mut dd, id, Point::new(50.0, 150.0));
        move_to(&mut dd, 80.0, 190.0, 20);
        assert_eq!(dd.free_drag_position(id), Some(Vec2::new(30.0, 40.0)));
        assert_eq!(dd.host().transform(root), "translate3d(30px, 40px, 0) rotate(45deg)");
        assert!(!dd.host().node(root).native_drag);
        release(&mut dd, 80.0, 190.0, 30);
        assert!(dd.host().node(root).native_drag);
        assert!(log.borrow().contains(&DragEvent::Ended {
            distance: Vec2::new(30.0, 40.0),
            drop_point: Point::new(80.0, 190.0),
            event: mouse(PointerKind::MouseUp, 80.0, 190.0, 30),
        }));
        assert_eq!(dd.free_drag_position(id), Some(Vec2::new(30.0, 40.0)));

        let mut down = mouse(PointerKind::MouseDown, 80.0, 190.0, 100).with_target(root);
        dd.pointer_down(id, &mut down);
        move_to(&mut dd, 80.0, 200.0, 110);
        move_to(&mut dd, 90.0, 200.0, 120);
        assert_eq!(dd.host().transform(root), "translate3d(40px, 50px, 0) rotate(45deg)");
        release(&mut dd, 90.0, 200.0, 130);

        dd.reset_drag(id);
        assert_eq!(dd.host().transform(root), "rotate(45deg)");
        assert_eq!(dd.free_drag_position(id), Some(Vec2::ZERO));
    }

    #[test]
    fn viewport_scroll_keeps_free_item_under_pointer() {
        let mut dd = engine();
        let body = dd.host().body_element();
        let root = dd.host_mut().element(body, Rect::new(0.0, 100.0, 100.0, 200.0));
        let id = dd.create_drag(root);

        press_and_start(&mut dd, id, Point::new(50.0, 150.0));
        move_to(&mut dd, 50.0, 170.0, 20);
        assert_eq!(dd.free_drag_position(id), Some(Vec2::new(0.0, 20.0)));

        dd.host_mut().viewport_scroll = Vec2::new(0.0, 20.0);
        dd.global_scroll(&ScrollEvent {
            target: ScrollTarget::Document,
        });
        assert_eq!(dd.free_drag_position(id), Some(Vec2::new(0.0, 40.0)));

        // The page point moves with the scroll; the offset stays put.
        move_to(&mut dd, 50.0, 190.0, 30);
        assert_eq!(dd.free_drag_position(id), Some(Vec2::new(0.0, 40.0)));
    }

    #[test]
    fn boundary_and_axis_lock_constrain_free_drag() {
        let mut dd = engine();
        let body = dd.host().body_element();
        let bounds = dd.host_mut().element(body, Rect::new(0.0, 100.0, 300.0, 300.0));
        let root = dd.host_mut().element(bounds, Rect::new(0.0, 100.0, 100.0, 200.0));
        let id = dd.create_drag(root);
        {
            let options = dd.drag_options_mut(id).unwrap();
            options.boundary_element = Some(bounds);
            options.lock_axis = Some(crate::types::Axis::X);
        }

        press_and_start(&mut dd, id, Point::new(50.0, 150.0));
        move_to(&mut dd, 500.0, 400.0, 20);
        // Pickup is 50px into the 100px item, so x stops at 300 - 50.
        assert_eq!(dd.free_drag_position(id), Some(Vec2::new(200.0, 0.0)));
    }

    #[test]
    fn auto_scrolls_nearest_scrollable_edge() {
        let mut dd = engine();
        let body = dd.host().body_element();
        let list_el = dd
            .host_mut()
            .element(body, Rect::new(0.0, 100.0, 200.0, 400.0));
        dd.host_mut().set_scroll_metrics(
            list_el,
            ScrollMetrics {
                scroll_top: 50.0,
                scroll_left: 0.0,
                scroll_width: 200.0,
                scroll_height: 1000.0,
                client_width: 200.0,
                client_height: 300.0,
            },
        );
        let list_id = dd.create_drop_list(list_el);
        // Document rects are offset by the list's scroll of 50.
        let items: Vec<DragId> = (0..3_i32)
            .map(|i| {
                let top = 150.0 + 100.0 * f64::from(i);
                let root = dd
                    .host_mut()
                    .element(list_el, Rect::new(0.0, top, 200.0, top + 100.0));
                dd.create_drag(root)
            })
            .collect();
        dd.with_items(list_id, &items);

        press_and_start(&mut dd, items[0], Point::new(100.0, 150.0));
        move_to(&mut dd, 100.0, 105.0, 20);
        assert!(dd.wants_animation_frame());
        dd.animation_frame();
        assert_eq!(
            dd.host().scroll_calls(),
            &[(ScrollTarget::Element(list_el), Vec2::new(0.0, -2.0))]
        );
        assert_eq!(dd.host().scroll_metrics(list_el).scroll_top, 48.0);

        move_to(&mut dd, 100.0, 990.0, 30);
        dd.animation_frame();
        assert_eq!(
            dd.host().scroll_calls().last(),
            Some(&(ScrollTarget::Document, Vec2::new(0.0, 2.0))),
            "the viewport is the fallback"
        );

        release(&mut dd, 100.0, 990.0, 40);
        assert!(!dd.wants_animation_frame());
    }

    #[test]
    fn animated_drop_waits_for_transition() {
        let mut dd = engine();
        dd.host_mut().transition_duration = 200;
        let (list_id, _, items) = list(&mut dd, 0.0, 2);
        let log = record_list(&mut dd, list_id);
        let a = items[0];

        press_and_start(&mut dd, a, Point::new(100.0, 150.0));
        move_to(&mut dd, 100.0, 260.0, 20);
        release(&mut dd, 100.0, 260.0, 30);
        assert_eq!(dd.drag_phase(a), Some(DragPhase::Ending));
        let preview = dd.preview_element(a).unwrap();
        assert!(dd.host().node(preview).has_class(crate::host::ANIMATING_CLASS));

        dd.transition_end(&TransitionEndEvent {
            target: preview,
            property_name: "opacity",
        });
        assert_eq!(dd.drag_phase(a), Some(DragPhase::Ending));
        dd.tick(329);
        assert_eq!(dd.drag_phase(a), Some(DragPhase::Ending));
        dd.tick(330);
        assert_eq!(dd.drag_phase(a), Some(DragPhase::Idle));
        assert!(dropped(&log).is_some());
    }

    #[test]
    fn select_start_is_blocked_while_routing() {
        let mut dd = engine();
        let body = dd.host().body_element();
        let root = dd.host_mut().element(body, Rect::new(0.0, 100.0, 100.0, 200.0));
        let id = dd.create_drag(root);

        let mut idle = TargetEvent::new(Some(root));
        dd.select_start(&mut idle);
        assert!(!idle.default_prevented);

        let mut down = mouse(PointerKind::MouseDown, 50.0, 150.0, 0).with_target(root);
        dd.pointer_down(id, &mut down);
        let mut during = TargetEvent::new(Some(root));
        dd.select_start(&mut during);
        assert!(during.default_prevented);
    }

    #[test]
    fn shadow_roots_get_their_own_listeners() {
        let mut dd = engine();
        let body = dd.host().body_element();
        let shadow = dd
            .host_mut()
            .element(body, Rect::new(0.0, 0.0, 1000.0, 1000.0));
        dd.host_mut().node_mut(shadow).shadow_root = Some(shadow);
        let root = dd.host_mut().element(shadow, Rect::new(0.0, 100.0, 100.0, 200.0));
        let id = dd.create_drag(root);

        press_and_start(&mut dd, id, Point::new(50.0, 150.0));
        assert!(dd.router().accepts_shadow_scroll(shadow));
        assert!(dd.router().select_start_roots().any(|r| r == shadow));

        release(&mut dd, 50.0, 160.0, 20);
        assert!(!dd.router().accepts_shadow_scroll(shadow));
        assert_eq!(dd.router().select_start_roots().count(), 0);
    }

    #[test]
    fn dispose_and_repeated_release_are_harmless() {
        let mut dd = engine();
        let (list_id, _, items) = list(&mut dd, 0.0, 3);
        let a = items[0];
        let log = record_drag(&mut dd, a);

        press_and_start(&mut dd, a, Point::new(100.0, 150.0));
        release(&mut dd, 100.0, 150.0, 20);
        release(&mut dd, 100.0, 150.0, 30);
        let released = log
            .borrow()
            .iter()
            .filter(|e| matches!(e, DragEvent::Released { .. }))
            .count();
        assert_eq!(released, 1);

        press_and_start(&mut dd, a, Point::new(100.0, 150.0));
        dd.dispose_drag(a);
        dd.dispose_drag(a);
        assert!(dd.root_element(a).is_none());
        assert!(dd.subscribe_drag(a, |_| {}).is_none());
        assert_eq!(dd.drop_list_items(list_id), &items[1..]);
        assert!(!dd.is_list_dragging(list_id), "the list drag is abandoned");
        assert!(dd.host().nodes_of_kind(NodeKind::Preview).is_empty());
        assert!(dd.router().active_items().is_empty());
        assert_eq!(dd.host().listener_count(GlobalListener::MouseMove), 0);

        dd.dispose();
        dd.dispose_drop_list(list_id);
        assert_eq!(dd.host().total_listeners(), 0);
    }

    #[test]
    fn moved_events_are_opt_in() {
        let mut dd = engine();
        let body = dd.host().body_element();
        let root = dd.host_mut().element(body, Rect::new(0.0, 100.0, 100.0, 200.0));
        let id = dd.create_drag(root);
        let moves: Log<DragMoved<El>> = Rc::default();
        let sink = moves.clone();
        let listener = dd
            .subscribe_drag_moved(id, move |m| sink.borrow_mut().push(*m))
            .unwrap();

        press_and_start(&mut dd, id, Point::new(50.0, 150.0));
        move_to(&mut dd, 60.0, 170.0, 20);
        assert_eq!(moves.borrow().len(), 1);
        let m = moves.borrow()[0];
        assert_eq!(m.distance, Vec2::new(10.0, 20.0));
        assert_eq!((m.delta.x, m.delta.y), (1, 1));

        assert!(dd.unsubscribe_drag_moved(id, listener));
        move_to(&mut dd, 70.0, 180.0, 30);
        assert_eq!(moves.borrow().len(), 1);
    }

    #[test]
    fn disposing_an_idle_sibling_keeps_sorting() {
        let mut dd = engine();
        let (list_id, _, items) = list(&mut dd, 0.0, 3);
        let log = record_list(&mut dd, list_id);
        let [a, c] = [items[0], items[2]];

        press_and_start(&mut dd, a, Point::new(100.0, 150.0));
        dd.dispose_drag(c);
        assert!(dd.is_list_dragging(list_id));
        assert_eq!(dd.drop_list_items(list_id), &items[..2]);
        assert_eq!(dd.item_index(list_id, c), None);

        move_to(&mut dd, 100.0, 250.0, 20);
        assert_eq!(dd.drag_phase(a), Some(DragPhase::Dragging));
        assert!(log.borrow().contains(&DropListEvent::Sorted {
            item: a,
            previous_index: 0,
            current_index: 1,
        }));
    }

    #[test]
    fn release_after_list_disposal_restores_the_root() {
        let mut dd = engine();
        let (list_id, list_el, items) = list(&mut dd, 0.0, 3);
        let a = items[0];
        let log = record_drag(&mut dd, a);
        let root_a = dd.root_element(a).unwrap();

        press_and_start(&mut dd, a, Point::new(100.0, 150.0));
        assert!(!dd.host().node(root_a).visible);
        dd.dispose_drop_list(list_id);
        release(&mut dd, 100.0, 160.0, 20);

        assert_eq!(dd.drag_phase(a), Some(DragPhase::Idle));
        assert!(dd.host().node(root_a).visible);
        assert_eq!(dd.host().parent(root_a), Some(list_el));
        assert!(dd.host().nodes_of_kind(NodeKind::Preview).is_empty());
        assert!(dd.host().nodes_of_kind(NodeKind::Placeholder).is_empty());
        assert!(dd.preview_element(a).is_none());
        assert!(dd.placeholder_element(a).is_none());
        assert!(dd.router().active_items().is_empty());
        let ended = log
            .borrow()
            .iter()
            .filter(|e| matches!(e, DragEvent::Ended { .. }))
            .count();
        assert_eq!(ended, 1);
        assert!(!log.borrow().iter().any(|e| matches!(e, DragEvent::Dropped(_))));
    }

    #[test]
    fn items_added_mid_drag_can_be_sorted_to() {
        let mut dd = engine();
        let (list_id, list_el, items) = list(&mut dd, 0.0, 3);
        let log = record_list(&mut dd, list_id);
        let a = items[0];

        press_and_start(&mut dd, a, Point::new(100.0, 150.0));
        let root_d = dd
            .host_mut()
            .element(list_el, Rect::new(0.0, 400.0, 200.0, 500.0));
        let d = dd.create_drag(root_d);
        let mut grown = items.clone();
        grown.push(d);
        dd.with_items(list_id, &grown);
        assert!(dd.is_list_dragging(list_id));
        assert_eq!(dd.item_index(list_id, d), Some(3));

        // Still within the list's drop proximity below its bottom edge.
        move_to(&mut dd, 100.0, 410.0, 20);
        assert!(log.borrow().contains(&DropListEvent::Sorted {
            item: a,
            previous_index: 0,
            current_index: 3,
        }));
        assert_eq!(dd.host().transform(root_d), "translate3d(0, -100px, 0)");
    }

    #[test]
    fn unscrollable_edge_cedes_to_the_viewport() {
        let mut dd = engine();
        let body = dd.host().body_element();
        let list_el = dd
            .host_mut()
            .element(body, Rect::new(0.0, 20.0, 200.0, 320.0));
        dd.host_mut().set_scroll_metrics(
            list_el,
            ScrollMetrics {
                scroll_top: 0.0,
                scroll_left: 0.0,
                scroll_width: 200.0,
                scroll_height: 1000.0,
                client_width: 200.0,
                client_height: 300.0,
            },
        );
        let list_id = dd.create_drop_list(list_el);
        let items: Vec<DragId> = (0..3_i32)
            .map(|i| {
                let top = 20.0 + 100.0 * f64::from(i);
                let root = dd
                    .host_mut()
                    .element(list_el, Rect::new(0.0, top, 200.0, top + 100.0));
                dd.create_drag(root)
            })
            .collect();
        dd.with_items(list_id, &items);

        press_and_start(&mut dd, items[0], Point::new(100.0, 70.0));
        assert!(!dd.wants_animation_frame());

        // Near the list's top edge, but the list is already scrolled to the top.
        move_to(&mut dd, 100.0, 25.0, 20);
        assert!(dd.wants_animation_frame());
        dd.animation_frame();
        assert_eq!(
            dd.host().scroll_calls(),
            &[(ScrollTarget::Document, Vec2::new(0.0, -2.0))]
        );
        assert_eq!(dd.host().scroll_metrics(list_el).scroll_top, 0.0);

        release(&mut dd, 100.0, 25.0, 30);
        assert!(!dd.wants_animation_frame());
    }

    #[test]
    fn huge_transition_durations_saturate() {
        let mut dd = engine();
        dd.host_mut().transition_duration = u64::MAX;
        let (_, _, items) = list(&mut dd, 0.0, 2);
        let a = items[0];

        press_and_start(&mut dd, a, Point::new(100.0, 150.0));
        move_to(&mut dd, 100.0, 260.0, 20);
        release(&mut dd, 100.0, 260.0, 30);
        assert_eq!(dd.drag_phase(a), Some(DragPhase::Ending));
        dd.tick(u64::MAX - 1);
        assert_eq!(dd.drag_phase(a), Some(DragPhase::Ending));
        dd.tick(u64::MAX);
        assert_eq!(dd.drag_phase(a), Some(DragPhase::Idle));
    }

    proptest! {
        #[test]
        fn drag_starts_exactly_at_threshold(dx in -12_i32..12, dy in -12_i32..12) {
            let mut dd = engine();
            let body = dd.host().body_element();
            let root = dd.host_mut().element(body, Rect::new(0.0, 100.0, 100.0, 200.0));
            let id = dd.create_drag(root);
            let mut down = mouse(PointerKind::MouseDown, 50.0, 150.0, 0).with_target(root);
            dd.pointer_down(id, &mut down);
            move_to(&mut dd, 50.0 + f64::from(dx), 150.0 + f64::from(dy), 10);

            let expected = if dx.abs() + dy.abs() >= 5 {
                DragPhase::Dragging
            } else {
                DragPhase::PendingThreshold
            };
            prop_assert_eq!(dd.drag_phase(id), Some(expected));
        }
    }

    #[test]
    fn free_position_can_be_set_directly() {
        let mut dd = engine();
        let body = dd.host().body_element();
        let root = dd.host_mut().element(body, Rect::new(0.0, 100.0, 100.0, 200.0));
        let id = dd.create_drag(root);
        dd.set_free_drag_position(id, Vec2::new(5.0, 6.0));
        assert_eq!(dd.host().transform(root), "translate3d(5px, 6px, 0)");
        assert_eq!(dd.free_drag_position(id), Some(Vec2::new(5.0, 6.0)));
    }
}
