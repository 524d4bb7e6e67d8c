// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Single-axis sorting of the items in a drop list.
//!
//! The strategy keeps one [`ItemPosition`] per item, ordered by leading edge
//! (top, or left for horizontal lists), not by index in the item list. While
//! the user drags, it finds the item under the pointer, moves the dragged
//! entry there, and reports how far every displaced entry must be translated.
//! Cached rectangles are moved along with the translations so no measuring
//! happens mid-drag.
//!
//! The strategy is pure data. Writing the resulting transforms is up to the caller.

use alloc::string::String;
use alloc::vec::Vec;

use kurbo::{Point, Rect};

use crate::geometry::{adjust_rect, is_inside_rect};
use crate::types::{Direction, DragId, Orientation, PointerDelta};

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;

/// Cached geometry of one item.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct ItemPosition {
    pub(crate) drag: DragId,
    /// Client rectangle, adjusted as the item is translated or its ancestors scroll.
    pub(crate) rect: Rect,
    /// Translation applied so far along the list axis.
    pub(crate) offset: f64,
    /// Inline transform the item had when positions were cached.
    pub(crate) initial_transform: String,
}

/// The last swap, used to keep the pointer from flip-flopping between two items.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
struct PreviousSwap {
    drag: Option<DragId>,
    delta: i8,
    overlaps: bool,
}

/// An entry whose place in the order changed during a sort.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Displacement {
    pub(crate) drag: DragId,
    /// Total translation along the list axis.
    pub(crate) offset: f64,
    pub(crate) initial_transform: String,
}

/// Result of a successful sort.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct SortOutcome {
    pub(crate) previous_index: usize,
    pub(crate) current_index: usize,
    pub(crate) displaced: Vec<Displacement>,
}

/// Sorting state of one drop list.
#[derive(Clone, Debug, Default)]
pub(crate) struct SingleAxisSortStrategy {
    pub(crate) orientation: Orientation,
    pub(crate) direction: Direction,
    /// Items taking part in the current drag, in list order.
    active: Vec<DragId>,
    /// Cached positions, in visual order.
    positions: Vec<ItemPosition>,
    previous_swap: PreviousSwap,
}

impl SingleAxisSortStrategy {
    fn is_horizontal(&self) -> bool {
        self.orientation == Orientation::Horizontal
    }

    /// Begin a drag over `items`. Positions must be cached separately.
    pub(crate) fn start(&mut self, items: &[DragId]) {
        self.with_items(items);
    }

    /// Replace the set of items taking part.
    pub(crate) fn with_items(&mut self, items: &[DragId]) {
        self.active = items.to_vec();
    }

    /// Items taking part, in list order.
    pub(crate) fn active(&self) -> &[DragId] {
        &self.active
    }

    pub(crate) fn positions(&self) -> &[ItemPosition] {
        &self.positions
    }

    /// Store freshly measured positions and order them by leading edge.
    pub(crate) fn set_positions(&mut self, mut positions: Vec<ItemPosition>) {
        let horizontal = self.is_horizontal();
        positions.sort_by(|a, b| {
            let (a, b) = if horizontal {
                (a.rect.x0, b.rect.x0)
            } else {
                (a.rect.y0, b.rect.y0)
            };
            a.total_cmp(&b)
        });
        self.positions = positions;
    }

    /// Visual index of `item`, counted in reading order.
    pub(crate) fn item_index(&self, item: DragId) -> Option<usize> {
        let index = self.positions.iter().position(|p| p.drag == item)?;
        if self.is_horizontal() && self.direction == Direction::Rtl {
            Some(self.positions.len() - 1 - index)
        } else {
            Some(index)
        }
    }

    /// Index of the entry under the pointer, skipping `item` itself.
    ///
    /// With a `delta`, the entry last swapped with is skipped while the pointer
    /// still overlaps it and keeps moving the same way.
    pub(crate) fn index_from_pointer(
        &self,
        item: DragId,
        pointer: Point,
        delta: Option<PointerDelta>,
        accept: &dyn Fn(usize) -> bool,
    ) -> Option<usize> {
        let horizontal = self.is_horizontal();
        let index = self.positions.iter().position(|position| {
            if position.drag == item {
                return false;
            }
            if let Some(delta) = delta {
                let direction = delta.along(self.orientation);
                let swap = &self.previous_swap;
                if swap.drag == Some(position.drag) && swap.overlaps && swap.delta == direction {
                    return false;
                }
            }
            let rect = &position.rect;
            if horizontal {
                pointer.x >= rect.x0.floor() && pointer.x < rect.x1.floor()
            } else {
                pointer.y >= rect.y0.floor() && pointer.y < rect.y1.floor()
            }
        })?;
        accept(index).then_some(index)
    }

    /// Move `item` to the entry under the pointer.
    pub(crate) fn sort(
        &mut self,
        item: DragId,
        pointer: Point,
        delta: PointerDelta,
        accept: &dyn Fn(usize) -> bool,
    ) -> Option<SortOutcome> {
        let new_index = self.index_from_pointer(item, pointer, Some(delta), accept)?;
        let current_index = self.positions.iter().position(|p| p.drag == item)?;
        let horizontal = self.is_horizontal();

        let current_rect = self.positions[current_index].rect;
        let new_rect = self.positions[new_index].rect;
        let target = self.positions[new_index].drag;
        let step: i8 = if current_index > new_index { 1 } else { -1 };

        let item_offset = self.item_offset(&current_rect, &new_rect, step);
        let sibling_offset = self.sibling_offset(current_index, step);

        let old_order: Vec<DragId> = self.positions.iter().map(|p| p.drag).collect();
        let moved = self.positions.remove(current_index);
        self.positions.insert(new_index, moved);

        let mut displaced = Vec::new();
        for (index, position) in self.positions.iter_mut().enumerate() {
            if old_order[index] == position.drag {
                continue;
            }
            let offset = if position.drag == item {
                item_offset
            } else {
                sibling_offset
            };
            position.offset += offset;
            if horizontal {
                adjust_rect(&mut position.rect, 0.0, offset);
            } else {
                adjust_rect(&mut position.rect, offset, 0.0);
            }
            displaced.push(Displacement {
                drag: position.drag,
                offset: position.offset,
                initial_transform: position.initial_transform.clone(),
            });
        }

        self.previous_swap = PreviousSwap {
            drag: Some(target),
            delta: delta.along(self.orientation),
            overlaps: is_inside_rect(&new_rect, pointer.x, pointer.y),
        };

        Some(SortOutcome {
            previous_index: current_index,
            current_index: new_index,
            displaced,
        })
    }

    /// Distance the dragged entry travels to reach `new_rect`.
    fn item_offset(&self, current: &Rect, new: &Rect, step: i8) -> f64 {
        let horizontal = self.is_horizontal();
        let mut offset = if horizontal {
            new.x0 - current.x0
        } else {
            new.y0 - current.y0
        };
        // Moving forward, the item lands after the target and must clear its size.
        if step == -1 {
            offset += if horizontal {
                new.width() - current.width()
            } else {
                new.height() - current.height()
            };
        }
        offset
    }

    /// Distance every displaced sibling travels.
    fn sibling_offset(&self, current_index: usize, step: i8) -> f64 {
        let horizontal = self.is_horizontal();
        let current = &self.positions[current_index].rect;
        let size = if horizontal {
            current.width()
        } else {
            current.height()
        };
        let mut offset = size * f64::from(step);

        let neighbour = if step == 1 {
            current_index.checked_sub(1)
        } else {
            Some(current_index + 1)
        };
        if let Some(neighbour) = neighbour.and_then(|i| self.positions.get(i)) {
            let (start, end) = if horizontal {
                (neighbour.rect.x0, current.x1)
            } else {
                (neighbour.rect.y0, current.y1)
            };
            let (current_start, neighbour_end) = if horizontal {
                (current.x0, neighbour.rect.x1)
            } else {
                (current.y0, neighbour.rect.y1)
            };
            if step == -1 {
                offset -= start - end;
            } else {
                offset += current_start - neighbour_end;
            }
        }
        offset
    }

    /// Where the placeholder of an entering item goes.
    ///
    /// Updates the active set and returns the item to insert before, or `None`
    /// to append. `should_enter_first` reports whether the pointer is before
    /// the first entry; `is_dragging` tells whether an item is being dragged.
    pub(crate) fn enter(
        &mut self,
        item: DragId,
        pointer: Point,
        index: Option<usize>,
        is_dragging: &dyn Fn(DragId) -> bool,
        accept: &dyn Fn(usize) -> bool,
    ) -> Option<DragId> {
        let new_index = index.or_else(|| self.index_from_pointer(item, pointer, None, accept));
        let current_index = self.active.iter().position(|a| *a == item);

        let mut reference = new_index.and_then(|i| self.active.get(i).copied());
        if reference == Some(item) {
            reference = new_index.and_then(|i| self.active.get(i + 1).copied());
        }
        let mut insert_at = new_index;
        if reference.is_none()
            && new_index.is_none_or(|i| i + 1 < self.active.len())
            && self.should_enter_as_first_child(pointer)
        {
            reference = self.active.first().copied();
            if new_index.is_none() {
                insert_at = Some(0);
            }
        }

        if let Some(current_index) = current_index {
            self.active.remove(current_index);
        }

        match (reference, insert_at) {
            (Some(reference), Some(at)) if !is_dragging(reference) => {
                let at = at.min(self.active.len());
                self.active.insert(at, item);
                Some(reference)
            }
            _ => {
                self.active.push(item);
                None
            }
        }
    }

    /// Whether the pointer is before the first entry, taking reversed layouts into account.
    fn should_enter_as_first_child(&self, pointer: Point) -> bool {
        let (Some(first_active), Some(first), Some(last)) = (
            self.active.first(),
            self.positions.first(),
            self.positions.last(),
        ) else {
            return false;
        };
        let horizontal = self.is_horizontal();
        if first.drag != *first_active {
            // Reversed: the first item in the list is laid out last.
            if horizontal {
                pointer.x >= last.rect.x1
            } else {
                pointer.y >= last.rect.y1
            }
        } else if horizontal {
            pointer.x <= first.rect.x0
        } else {
            pointer.y <= first.rect.y0
        }
    }

    /// Shift cached rectangles after a scroll.
    pub(crate) fn update_on_scroll(&mut self, top: f64, left: f64) {
        for position in &mut self.positions {
            adjust_rect(&mut position.rect, top, left);
        }
    }

    /// End the drag. Returns each active item with the transform to restore.
    pub(crate) fn reset(&mut self) -> Vec<(DragId, String)> {
        let restore = self
            .active
            .iter()
            .map(|&drag| {
                let initial = self
                    .positions
                    .iter()
                    .find(|p| p.drag == drag)
                    .map(|p| p.initial_transform.clone())
                    .unwrap_or_default();
                (drag, initial)
            })
            .collect();
        self.positions.clear();
        self.active.clear();
        self.previous_swap = PreviousSwap::default();
        restore
    }
}
