// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pointer router: one set of global listeners shared by every draggable item.
//!
//! ## Overview
//!
//! Items register when created and become *active* when a pointer goes down on
//! them. The router binds document listeners lazily:
//!
//! - a persistent capturing, non-passive `touchmove` while any item exists,
//!   since some engines cannot make a touch listener non-passive after a
//!   touch sequence has begun;
//! - `scroll`, `selectstart`, the release events, and (for mouse sequences)
//!   `mousemove` while at least one item is active.
//!
//! Everything is released again when the last item stops or unregisters.
//!
//! The router does not call into items. [`DragDrop`](crate::DragDrop) asks it
//! which items are active and routes host events to them, and broadcasts the
//! same events on [`PointerRouter::pointer_move`], [`PointerRouter::pointer_up`],
//! and [`PointerRouter::scroll`] for outside observers.

use core::hash::Hash;

use hashbrown::{HashMap, HashSet};
use smallvec::SmallVec;

use crate::emitter::Emitter;
use crate::event::{PointerEvent, ScrollEvent};
use crate::host::{DragHost, GlobalListener, ListenerOptions, ListenerTarget};
use crate::types::{DragId, DropListId};

bitflags::bitflags! {
    /// Document listeners currently bound by a [`PointerRouter`].
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct BoundListeners: u8 {
        /// Persistent `touchmove`.
        const TOUCH_MOVE   = 0b0000_0001;
        /// `mousemove` for mouse sequences.
        const MOUSE_MOVE   = 0b0000_0010;
        /// `mouseup` for mouse sequences.
        const MOUSE_UP     = 0b0000_0100;
        /// `touchend` for touch sequences.
        const TOUCH_END    = 0b0000_1000;
        /// `touchcancel` for touch sequences.
        const TOUCH_CANCEL = 0b0001_0000;
        /// Capturing `scroll`.
        const SCROLL       = 0b0010_0000;
        /// `selectstart`.
        const SELECT_START = 0b0100_0000;
    }
}

impl BoundListeners {
    /// Listeners that only live while a sequence is active.
    pub const SEQUENCE: Self = Self::MOUSE_MOVE
        .union(Self::MOUSE_UP)
        .union(Self::TOUCH_END)
        .union(Self::TOUCH_CANCEL)
        .union(Self::SCROLL)
        .union(Self::SELECT_START);

    /// The listener behind a single flag.
    fn listener(self) -> Option<(GlobalListener, ListenerOptions)> {
        const TABLE: [(BoundListeners, GlobalListener, ListenerOptions); 7] = [
            (
                BoundListeners::TOUCH_MOVE,
                GlobalListener::TouchMove,
                ListenerOptions::ACTIVE_CAPTURE,
            ),
            (
                BoundListeners::MOUSE_MOVE,
                GlobalListener::MouseMove,
                ListenerOptions::ACTIVE_CAPTURE,
            ),
            (
                BoundListeners::MOUSE_UP,
                GlobalListener::MouseUp,
                ListenerOptions::ACTIVE_CAPTURE,
            ),
            (
                BoundListeners::TOUCH_END,
                GlobalListener::TouchEnd,
                ListenerOptions::ACTIVE_CAPTURE,
            ),
            (
                BoundListeners::TOUCH_CANCEL,
                GlobalListener::TouchCancel,
                ListenerOptions::ACTIVE_CAPTURE,
            ),
            (
                BoundListeners::SCROLL,
                GlobalListener::Scroll,
                ListenerOptions::CAPTURE,
            ),
            (
                BoundListeners::SELECT_START,
                GlobalListener::SelectStart,
                ListenerOptions::ACTIVE_CAPTURE,
            ),
        ];
        TABLE
            .iter()
            .find(|(flag, _, _)| *flag == self)
            .map(|&(_, listener, options)| (listener, options))
    }
}

/// Shared registry of draggable items and the global listeners they need.
#[derive(Debug)]
pub struct PointerRouter<E> {
    items: HashSet<DragId>,
    lists: HashSet<DropListId>,
    active: SmallVec<[DragId; 2]>,
    bound: BoundListeners,
    shadow_scroll: HashMap<E, u32>,
    shadow_select_start: HashMap<E, u32>,
    /// Every routed pointer move.
    pub pointer_move: Emitter<PointerEvent<E>>,
    /// Every routed release.
    pub pointer_up: Emitter<PointerEvent<E>>,
    /// Every scroll observed while an item is active.
    pub scroll: Emitter<ScrollEvent<E>>,
}

impl<E> Default for PointerRouter<E> {
    fn default() -> Self {
        Self {
            items: HashSet::new(),
            lists: HashSet::new(),
            active: SmallVec::new(),
            bound: BoundListeners::empty(),
            shadow_scroll: HashMap::new(),
            shadow_select_start: HashMap::new(),
            pointer_move: Emitter::default(),
            pointer_up: Emitter::default(),
            scroll: Emitter::default(),
        }
    }
}

impl<E: Copy + Eq + Hash> PointerRouter<E> {
    /// Track a new item. The first one binds the persistent `touchmove` listener.
    pub fn register_item<H: DragHost<Element = E>>(&mut self, host: &mut H, item: DragId) {
        self.items.insert(item);
        if self.items.len() == 1 {
            self.bind(host, BoundListeners::TOUCH_MOVE);
        }
    }

    /// Forget an item, stopping it first. The last one unbinds `touchmove`.
    pub fn unregister_item<H: DragHost<Element = E>>(&mut self, host: &mut H, item: DragId) {
        if !self.items.remove(&item) {
            return;
        }
        self.stop_dragging(host, item);
        if self.items.is_empty() {
            self.unbind(host, BoundListeners::TOUCH_MOVE);
        }
    }

    /// Track a new drop list.
    pub fn register_drop_list(&mut self, list: DropListId) {
        self.lists.insert(list);
    }

    /// Forget a drop list.
    pub fn unregister_drop_list(&mut self, list: DropListId) {
        self.lists.remove(&list);
    }

    /// Make `item` active for the sequence started by `event`.
    ///
    /// Returns `false` if it already was. The first active item binds the
    /// sequence listeners for the kind of pointer that started it.
    pub fn start_dragging<H: DragHost<Element = E>>(
        &mut self,
        host: &mut H,
        item: DragId,
        event: &PointerEvent<E>,
    ) -> bool {
        if self.active.contains(&item) {
            return false;
        }
        self.active.push(item);
        if self.active.len() == 1 {
            let mut wanted = BoundListeners::SCROLL | BoundListeners::SELECT_START;
            if event.kind.is_touch() {
                wanted |= BoundListeners::TOUCH_END | BoundListeners::TOUCH_CANCEL;
            } else {
                wanted |= BoundListeners::MOUSE_UP | BoundListeners::MOUSE_MOVE;
            }
            self.bind(host, wanted);
        }
        true
    }

    /// Make `item` inactive. The last one unbinds the sequence listeners.
    pub fn stop_dragging<H: DragHost<Element = E>>(&mut self, host: &mut H, item: DragId) {
        let Some(idx) = self.active.iter().position(|a| *a == item) else {
            return;
        };
        self.active.remove(idx);
        if self.active.is_empty() {
            self.unbind(host, BoundListeners::SEQUENCE);
        }
    }

    /// Whether `item` is active (routed), whether or not its drag has visibly started.
    pub fn is_dragging(&self, item: DragId) -> bool {
        self.active.contains(&item)
    }

    /// Active items in activation order.
    pub fn active_items(&self) -> &[DragId] {
        &self.active
    }

    /// Whether `item` is registered.
    pub fn is_registered(&self, item: DragId) -> bool {
        self.items.contains(&item)
    }

    /// Whether `list` is registered.
    pub fn is_list_registered(&self, list: DropListId) -> bool {
        self.lists.contains(&list)
    }

    /// Listeners currently bound at the document.
    pub fn bound(&self) -> BoundListeners {
        self.bound
    }

    /// Observe scrolling inside a shadow root (ref-counted).
    pub fn watch_shadow_root<H: DragHost<Element = E>>(&mut self, host: &mut H, root: E) {
        let count = self.shadow_scroll.entry(root).or_insert(0);
        *count += 1;
        if *count == 1 {
            host.add_listener(
                ListenerTarget::ShadowRoot(root),
                GlobalListener::Scroll,
                ListenerOptions::CAPTURE,
            );
        }
    }

    /// Release one [`PointerRouter::watch_shadow_root`].
    pub fn unwatch_shadow_root<H: DragHost<Element = E>>(&mut self, host: &mut H, root: E) {
        if release(&mut self.shadow_scroll, root) {
            host.remove_listener(
                ListenerTarget::ShadowRoot(root),
                GlobalListener::Scroll,
                ListenerOptions::CAPTURE,
            );
        }
    }

    /// Whether scroll events from `root` should be routed.
    pub fn accepts_shadow_scroll(&self, root: E) -> bool {
        !self.active.is_empty() && self.shadow_scroll.contains_key(&root)
    }

    /// Block text selection inside a shadow root (ref-counted).
    pub fn bind_shadow_select_start<H: DragHost<Element = E>>(&mut self, host: &mut H, root: E) {
        let count = self.shadow_select_start.entry(root).or_insert(0);
        *count += 1;
        if *count == 1 {
            host.add_listener(
                ListenerTarget::ShadowRoot(root),
                GlobalListener::SelectStart,
                ListenerOptions::ACTIVE_CAPTURE,
            );
        }
    }

    /// Release one [`PointerRouter::bind_shadow_select_start`].
    pub fn unbind_shadow_select_start<H: DragHost<Element = E>>(&mut self, host: &mut H, root: E) {
        if release(&mut self.shadow_select_start, root) {
            host.remove_listener(
                ListenerTarget::ShadowRoot(root),
                GlobalListener::SelectStart,
                ListenerOptions::ACTIVE_CAPTURE,
            );
        }
    }

    /// Shadow roots with selection currently blocked.
    pub fn select_start_roots(&self) -> impl Iterator<Item = E> + '_ {
        self.shadow_select_start.keys().copied()
    }

    /// Unbind everything and complete the broadcast emitters.
    ///
    /// Safe to call more than once.
    pub fn dispose<H: DragHost<Element = E>>(&mut self, host: &mut H) {
        self.active.clear();
        self.items.clear();
        self.lists.clear();
        self.unbind(host, BoundListeners::all());
        for (root, _) in self.shadow_scroll.drain() {
            host.remove_listener(
                ListenerTarget::ShadowRoot(root),
                GlobalListener::Scroll,
                ListenerOptions::CAPTURE,
            );
        }
        for (root, _) in self.shadow_select_start.drain() {
            host.remove_listener(
                ListenerTarget::ShadowRoot(root),
                GlobalListener::SelectStart,
                ListenerOptions::ACTIVE_CAPTURE,
            );
        }
        self.pointer_move.complete();
        self.pointer_up.complete();
        self.scroll.complete();
    }

    fn bind<H: DragHost<Element = E>>(&mut self, host: &mut H, flags: BoundListeners) {
        for flag in (flags - self.bound).iter() {
            if let Some((listener, options)) = flag.listener() {
                host.add_listener(ListenerTarget::Document, listener, options);
            }
        }
        #[cfg(feature = "tracing")]
        tracing::debug!(bound = ?(flags - self.bound), "binding global drag listeners");
        self.bound |= flags;
    }

    fn unbind<H: DragHost<Element = E>>(&mut self, host: &mut H, flags: BoundListeners) {
        for flag in (flags & self.bound).iter() {
            if let Some((listener, options)) = flag.listener() {
                host.remove_listener(ListenerTarget::Document, listener, options);
            }
        }
        #[cfg(feature = "tracing")]
        tracing::debug!(unbound = ?(flags & self.bound), "unbinding global drag listeners");
        self.bound -= flags;
    }
}

/// Decrement a ref-count; returns whether it reached zero.
fn release<E: Eq + Hash>(counts: &mut HashMap<E, u32>, key: E) -> bool {
    let Some(count) = counts.get_mut(&key) else {
        return false;
    };
    *count -= 1;
    if *count == 0 {
        counts.remove(&key);
        true
    } else {
        false
    }
}
