use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use crate::types::{ContainerRecord, ContainerState};

pub type Snapshot = Arc<Vec<ContainerRecord>>;

/// Shared container list. Writers swap in a whole new `Arc`'d list, so a reader
/// holding a snapshot always sees one complete list.
pub struct ContainerStore {
    records: RwLock<Snapshot>,
    include_stopped: AtomicBool,
    generation: AtomicU64,
}

impl ContainerStore {
    pub fn new(records: Vec<ContainerRecord>, include_stopped: bool) -> Arc<Self> {
        Arc::new(Self {
            records: RwLock::new(Arc::new(records)),
            include_stopped: AtomicBool::new(include_stopped),
            generation: AtomicU64::new(0),
        })
    }

    pub fn replace(&self, records: Vec<ContainerRecord>) {
        let next = Arc::new(records);
        let mut current = self.records.write().unwrap_or_else(|e| e.into_inner());
        *current = next;
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Replaces the list only when it differs structurally. Returns whether it did.
    pub fn replace_if_changed(&self, records: Vec<ContainerRecord>) -> bool {
        let mut current = self.records.write().unwrap_or_else(|e| e.into_inner());
        if **current == records {
            return false;
        }
        *current = Arc::new(records);
        self.generation.fetch_add(1, Ordering::SeqCst);
        true
    }

    /// Like `replace_if_changed`, but only when nothing has touched the store
    /// since `seen` was read from `generation`. A fetch that raced a newer
    /// write is dropped.
    pub fn replace_if_current(&self, seen: u64, records: Vec<ContainerRecord>) -> bool {
        let mut current = self.records.write().unwrap_or_else(|e| e.into_inner());
        if self.generation() != seen || **current == records {
            return false;
        }
        *current = Arc::new(records);
        self.generation.fetch_add(1, Ordering::SeqCst);
        true
    }

    pub fn snapshot(&self) -> Snapshot {
        Arc::clone(&self.records.read().unwrap_or_else(|e| e.into_inner()))
    }

    /// Records the operator should see under the current filter.
    pub fn visible(&self) -> Vec<ContainerRecord> {
        let snapshot = self.snapshot();
        if self.include_stopped() {
            return snapshot.as_ref().clone();
        }
        snapshot
            .iter()
            .filter(|c| c.state != ContainerState::Stopped)
            .cloned()
            .collect()
    }

    pub fn set_filter(&self, include_stopped: bool) {
        let previous = self.include_stopped.swap(include_stopped, Ordering::SeqCst);
        if previous != include_stopped {
            self.generation.fetch_add(1, Ordering::SeqCst);
        }
    }

    pub fn toggle_filter(&self) -> bool {
        let next = !self.include_stopped();
        self.set_filter(next);
        next
    }

    pub fn include_stopped(&self) -> bool {
        self.include_stopped.load(Ordering::SeqCst)
    }

    /// Bumped on every change to what `visible` would return.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }
}
