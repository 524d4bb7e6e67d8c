// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Synchronous multicast listener lists.
//!
//! An [`Emitter`] calls every current listener in subscription order, right
//! away, with a borrowed event. Nothing is buffered or replayed: a listener
//! subscribed after an emission never sees it. Completing an emitter drops
//! all listeners and refuses new ones, which is what disposal of an item or
//! list does.
//!
//! ## Usage
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use understory_drag_drop::Emitter;
//!
//! let seen = Rc::new(RefCell::new(Vec::new()));
//! let mut emitter: Emitter<u32> = Emitter::default();
//! let sink = seen.clone();
//! let id = emitter.subscribe(move |v| sink.borrow_mut().push(*v)).unwrap();
//!
//! emitter.emit(&1);
//! emitter.unsubscribe(id);
//! emitter.emit(&2);
//! assert_eq!(*seen.borrow(), vec![1]);
//!
//! emitter.complete();
//! assert!(emitter.subscribe(|_| {}).is_none());
//! ```

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

/// Handle of one subscription on an [`Emitter`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u32);

type Listener<T> = Box<dyn FnMut(&T)>;

/// A replay-free, completable list of listeners.
pub struct Emitter<T> {
    listeners: Vec<(ListenerId, Listener<T>)>,
    next_id: u32,
    completed: bool,
}

impl<T> Default for Emitter<T> {
    fn default() -> Self {
        Self {
            listeners: Vec::new(),
            next_id: 0,
            completed: false,
        }
    }
}

impl<T> fmt::Debug for Emitter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emitter")
            .field("listeners", &self.listeners.len())
            .field("next_id", &self.next_id)
            .field("completed", &self.completed)
            .finish()
    }
}

impl<T> Emitter<T> {
    /// Add a listener. Returns `None` once the emitter is completed.
    pub fn subscribe(&mut self, listener: impl FnMut(&T) + 'static) -> Option<ListenerId> {
        if self.completed {
            return None;
        }
        let id = ListenerId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.listeners.push((id, Box::new(listener)));
        Some(id)
    }

    /// Remove a listener. Returns whether it was subscribed.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(l, _)| *l != id);
        self.listeners.len() != before
    }

    /// Call every listener with `event`.
    pub fn emit(&mut self, event: &T) {
        for (_, listener) in &mut self.listeners {
            listener(event);
        }
    }

    /// Drop all listeners and refuse new ones.
    pub fn complete(&mut self) {
        self.completed = true;
        self.listeners.clear();
    }

    /// Whether nobody is listening.
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Whether [`Emitter::complete`] was called.
    pub fn is_completed(&self) -> bool {
        self.completed
    }
}
