//! Per-product serialization of in-flight mutations.
//!
//! Each mutation holds the slot for its `(collection, product)` key across
//! the whole remote round trip. A second mutation for the same key waits in
//! FIFO order (`tokio::sync::Mutex` is fair) and only reads local state once
//! the first has been applied or discarded.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use crowns_collars_core::ProductId;
use tokio::sync::OwnedMutexGuard;

/// Serialization key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotKey {
    Cart(ProductId),
    Wishlist(ProductId),
}

type Slot = Arc<tokio::sync::Mutex<()>>;

#[derive(Debug)]
struct Entry {
    slot: Slot,
    /// Holder plus queued waiters, including ones not yet polled.
    users: usize,
}

/// Table of live slots. Entries are dropped once nobody holds or awaits them.
#[derive(Debug, Default)]
pub struct SlotTable {
    slots: Mutex<HashMap<SlotKey, Entry>>,
}

impl SlotTable {
    /// Wait for exclusive use of `key`.
    ///
    /// The claim is registered before waiting, so dropping the returned
    /// future mid-wait gives the claim back.
    pub async fn acquire(&self, key: SlotKey) -> SlotGuard<'_> {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            let entry = slots.entry(key).or_insert_with(|| Entry {
                slot: Slot::default(),
                users: 0,
            });
            entry.users += 1;
            Arc::clone(&entry.slot)
        };

        let mut held = SlotGuard {
            table: self,
            key,
            guard: None,
        };
        held.guard = Some(slot.lock_owned().await);
        held
    }

    /// Number of keys currently held or awaited.
    #[must_use]
    pub fn active(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn release(&self, key: SlotKey) {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(entry) = slots.get_mut(&key) else {
            return;
        };
        entry.users = entry.users.saturating_sub(1);
        if entry.users == 0 {
            slots.remove(&key);
        }
    }
}

/// Claim on a slot; exclusive once `acquire` resolves. Released on drop.
#[derive(Debug)]
pub struct SlotGuard<'a> {
    table: &'a SlotTable,
    key: SlotKey,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for SlotGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        self.table.release(self.key);
    }
}
