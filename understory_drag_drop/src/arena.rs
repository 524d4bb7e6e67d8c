// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Generational slot storage backing [`DragId`](crate::DragId) and [`DropListId`](crate::DropListId).

use alloc::vec::Vec;

/// A generational handle into an [`Arena`].
pub(crate) trait ArenaId: Copy + Eq {
    fn new(idx: u32, generation: u32) -> Self;
    fn idx(self) -> usize;
    fn generation(self) -> u32;
}

/// Slots plus per-slot generations; freed slots are reused with a bumped generation.
#[derive(Debug)]
pub(crate) struct Arena<T> {
    slots: Vec<Option<T>>,
    /// last generation per slot (persists across frees)
    generations: Vec<u32>,
    free_list: Vec<usize>,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
        }
    }
}

impl<T> Arena<T> {
    pub(crate) fn insert<I: ArenaId>(&mut self, value: T) -> I {
        if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            self.slots[idx] = Some(value);
            #[allow(
                clippy::cast_possible_truncation,
                reason = "Handles use 32-bit indices by design."
            )]
            I::new(idx as u32, generation)
        } else {
            self.slots.push(Some(value));
            self.generations.push(1);
            #[allow(
                clippy::cast_possible_truncation,
                reason = "Handles use 32-bit indices by design."
            )]
            I::new((self.slots.len() - 1) as u32, 1)
        }
    }

    pub(crate) fn remove<I: ArenaId>(&mut self, id: I) -> Option<T> {
        if !self.is_alive(id) {
            return None;
        }
        let value = self.slots[id.idx()].take();
        self.free_list.push(id.idx());
        value
    }

    pub(crate) fn is_alive<I: ArenaId>(&self, id: I) -> bool {
        self.generations.get(id.idx()) == Some(&id.generation())
            && self.slots.get(id.idx()).is_some_and(Option::is_some)
    }

    pub(crate) fn get<I: ArenaId>(&self, id: I) -> Option<&T> {
        if !self.is_alive(id) {
            return None;
        }
        self.slots[id.idx()].as_ref()
    }

    pub(crate) fn get_mut<I: ArenaId>(&mut self, id: I) -> Option<&mut T> {
        if !self.is_alive(id) {
            return None;
        }
        self.slots[id.idx()].as_mut()
    }

    /// Live handles in slot order.
    pub(crate) fn ids<I: ArenaId>(&self) -> Vec<I> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(i, _)| {
                #[allow(
                    clippy::cast_possible_truncation,
                    reason = "Handles use 32-bit indices by design."
                )]
                I::new(i as u32, self.generations[i])
            })
            .collect()
    }
}
