// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Coalescing writer for inline transforms.
//!
//! One pointer move can re-sort a list, move the preview, and shift a free item.
//! Writes are collected here, last value per element wins, and reach the host in
//! one [`StyleBatch::flush`] at the end of the input event. Reads check pending
//! writes first, so the engine always sees its own latest value. Anything that
//! measures layout flushes first.

use alloc::string::String;
use core::hash::Hash;

use hashbrown::HashMap;

use crate::host::DragHost;

/// Pending inline transform writes.
#[derive(Clone, Debug)]
pub struct StyleBatch<E> {
    pending: HashMap<E, String>,
}

impl<E> Default for StyleBatch<E> {
    fn default() -> Self {
        Self {
            pending: HashMap::new(),
        }
    }
}

impl<E: Copy + Eq + Hash> StyleBatch<E> {
    /// Queue a transform for `element`, replacing any queued one.
    pub fn set(&mut self, element: E, transform: String) {
        self.pending.insert(element, transform);
    }

    /// The transform `element` will have after the next flush.
    pub fn read<H: DragHost<Element = E>>(&self, host: &H, element: E) -> String {
        match self.pending.get(&element) {
            Some(transform) => transform.clone(),
            None => host.transform(element),
        }
    }

    /// Drop a queued write for an element that is going away.
    pub fn forget(&mut self, element: E) {
        self.pending.remove(&element);
    }

    /// Number of queued writes.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Write everything queued to the host.
    pub fn flush<H: DragHost<Element = E>>(&mut self, host: &mut H) {
        for (element, transform) in self.pending.drain() {
            host.set_transform(element, &transform);
        }
    }
}
