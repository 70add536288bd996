// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The per-context validity cache.
//!
//! One atomic slot per rendering context holds where that context stands with
//! respect to a technique's validity predicate. Every transition is a single
//! compare-and-swap: a failed swap means another actor already moved the slot
//! and the caller must re-read rather than overwrite. No locks are taken on
//! the query path.

use glint_core::context::ContextId;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, RwLock};

/// Where a technique stands for one rendering context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ValidityStatus {
    /// No check has been scheduled yet.
    Unknown = 0,
    /// A validation task is scheduled or running; poll again later.
    QueryInProgress = 1,
    /// The predicate held for this context.
    Valid = 2,
    /// The predicate did not hold for this context.
    Invalid = 3,
}

impl ValidityStatus {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => ValidityStatus::QueryInProgress,
            2 => ValidityStatus::Valid,
            3 => ValidityStatus::Invalid,
            _ => ValidityStatus::Unknown,
        }
    }
}

/// A single status slot with compare-and-swap transition control.
#[derive(Debug)]
pub struct AtomicStatus(AtomicU8);

impl AtomicStatus {
    /// Creates a slot holding the given status.
    pub fn new(status: ValidityStatus) -> Self {
        Self(AtomicU8::new(status as u8))
    }

    /// Reads the current status.
    pub fn load(&self) -> ValidityStatus {
        ValidityStatus::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Attempts to transition `old -> new`, returning `true` on success.
    ///
    /// A `false` return means another actor transitioned the slot first; the
    /// caller must re-read the authoritative value instead of retrying with
    /// the stale one.
    pub fn compare_and_swap(&self, old: ValidityStatus, new: ValidityStatus) -> bool {
        self.0
            .compare_exchange(old as u8, new as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

impl Default for AtomicStatus {
    fn default() -> Self {
        Self::new(ValidityStatus::Unknown)
    }
}

/// One status slot per rendering context, grown on demand and never shrunk.
#[derive(Debug, Default)]
pub struct ValidityCache {
    slots: RwLock<Vec<Arc<AtomicStatus>>>,
}

impl ValidityCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the slot for a context id, growing the cache when needed.
    pub fn slot(&self, id: ContextId) -> Arc<AtomicStatus> {
        let index = id as usize;
        {
            let slots = self.slots.read().unwrap();
            if let Some(slot) = slots.get(index) {
                return Arc::clone(slot);
            }
        }
        let mut slots = self.slots.write().unwrap();
        while slots.len() <= index {
            slots.push(Arc::new(AtomicStatus::default()));
        }
        Arc::clone(&slots[index])
    }

    /// Reads the status for a context without growing the cache.
    pub fn status(&self, id: ContextId) -> ValidityStatus {
        let slots = self.slots.read().unwrap();
        slots
            .get(id as usize)
            .map(|slot| slot.load())
            .unwrap_or(ValidityStatus::Unknown)
    }

    /// Grows the cache to hold at least `len` slots. Never shrinks.
    pub fn resize(&self, len: usize) {
        let mut slots = self.slots.write().unwrap();
        while slots.len() < len {
            slots.push(Arc::new(AtomicStatus::default()));
        }
    }

    /// Forces one context's slot back to `Unknown` so the next query
    /// re-triggers validation.
    pub fn reset(&self, id: ContextId) {
        let slots = self.slots.read().unwrap();
        if let Some(slot) = slots.get(id as usize) {
            reset_slot(slot);
        }
    }

    /// Forces every slot back to `Unknown`.
    pub fn reset_all(&self) {
        let slots = self.slots.read().unwrap();
        for slot in slots.iter() {
            reset_slot(slot);
        }
    }

    /// Copies the current statuses into an independent cache.
    pub fn snapshot(&self) -> Self {
        let slots = self.slots.read().unwrap();
        Self {
            slots: RwLock::new(
                slots
                    .iter()
                    .map(|slot| Arc::new(AtomicStatus::new(slot.load())))
                    .collect(),
            ),
        }
    }
}

fn reset_slot(slot: &AtomicStatus) {
    let old = slot.load();
    // What happens if we lose the race here? A concurrent winner's fresher
    // value can be pushed back to Unknown; the next query simply re-validates.
    if !slot.compare_and_swap(old, ValidityStatus::Unknown) {
        log::trace!("validity reset raced with a concurrent transition");
    }
}
