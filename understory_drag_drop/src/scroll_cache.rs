// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scroll offsets and rectangles of scrollable ancestors, kept current without re-measuring.
//!
//! ## Usage
//!
//! 1) Call [`ScrollPositionCache::cache`] when a drag starts, with the scrollable
//!    elements that matter to it.
//! 2) Feed every `scroll` event to [`ScrollPositionCache::handle_scroll`]. It
//!    returns how far the scrolled node moved its content and shifts every cached
//!    rectangle inside that node by the same amount.
//! 3) Call [`ScrollPositionCache::clear`] when the drag ends.
//!
//! Entries live in a flat vector addressed by [`ScrollSlot`]; the document entry
//! is always first.

use alloc::vec::Vec;

use kurbo::{Rect, Vec2};

use crate::geometry::adjust_rect;
use crate::host::{DragHost, ScrollTarget};

/// Index of an entry in a [`ScrollPositionCache`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ScrollSlot(usize);

/// One cached scroll node.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ScrollEntry<E> {
    /// The node.
    pub node: ScrollTarget<E>,
    /// Last seen scroll offset (`x` = left, `y` = top).
    pub scroll_position: Vec2,
    /// Client rectangle, adjusted as ancestors scroll. `None` for the document.
    pub rect: Option<Rect>,
}

/// Snapshot of scroll offsets and rectangles for one drag session.
#[derive(Clone, Debug)]
pub struct ScrollPositionCache<E> {
    entries: Vec<ScrollEntry<E>>,
}

impl<E> Default for ScrollPositionCache<E> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<E: Copy + Eq> ScrollPositionCache<E> {
    /// Replace the cache with the document and `elements`, measured now.
    pub fn cache<H: DragHost<Element = E>>(&mut self, host: &H, elements: &[E]) {
        self.entries.clear();
        self.entries.push(ScrollEntry {
            node: ScrollTarget::Document,
            scroll_position: host.viewport_scroll_position(),
            rect: None,
        });
        for &element in elements {
            if self.slot_of(ScrollTarget::Element(element)).is_some() {
                continue;
            }
            self.entries.push(ScrollEntry {
                node: ScrollTarget::Element(element),
                scroll_position: host.scroll_metrics(element).offset(),
                rect: Some(host.client_rect(element)),
            });
        }
    }

    /// Account for a scroll of `target`.
    ///
    /// Returns `old - new` offset (`x` = left, `y` = top), or `None` when `target` is not cached.
    /// Every cached rectangle strictly inside `target` is shifted by the returned delta.
    pub fn handle_scroll<H: DragHost<Element = E>>(
        &mut self,
        host: &H,
        target: ScrollTarget<E>,
    ) -> Option<Vec2> {
        let slot = self.slot_of(target)?;
        let new_position = match target {
            ScrollTarget::Document => host.viewport_scroll_position(),
            ScrollTarget::Element(element) => host.scroll_metrics(element).offset(),
        };
        let difference = self.entries[slot.0].scroll_position - new_position;

        for entry in &mut self.entries {
            let (ScrollTarget::Element(node), Some(rect)) = (entry.node, entry.rect.as_mut()) else {
                continue;
            };
            let inside = match target {
                ScrollTarget::Document => true,
                ScrollTarget::Element(scrolled) => scrolled != node && host.contains(scrolled, node),
            };
            if inside {
                adjust_rect(rect, difference.y, difference.x);
            }
        }

        self.entries[slot.0].scroll_position = new_position;
        Some(difference)
    }

    /// Cached viewport scroll offset, if the cache is populated.
    pub fn viewport_scroll_position(&self) -> Option<Vec2> {
        self.entries
            .first()
            .filter(|e| e.node == ScrollTarget::Document)
            .map(|e| e.scroll_position)
    }

    /// Cached rectangle of `element`.
    pub fn rect_of(&self, element: E) -> Option<Rect> {
        self.slot_of(ScrollTarget::Element(element))
            .and_then(|slot| self.entries[slot.0].rect)
    }

    /// Slot of `node`, if cached.
    pub fn slot_of(&self, node: ScrollTarget<E>) -> Option<ScrollSlot> {
        self.entries
            .iter()
            .position(|e| e.node == node)
            .map(ScrollSlot)
    }

    /// Entry at `slot`.
    pub fn get(&self, slot: ScrollSlot) -> Option<&ScrollEntry<E>> {
        self.entries.get(slot.0)
    }

    /// All entries, document first.
    pub fn entries(&self) -> &[ScrollEntry<E>] {
        &self.entries
    }

    /// Whether nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Forget everything.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
