//! Watcher registration.
//!
//! Each event axis (track-piece change, pong, delocalization, battery)
//! keeps its own registry. Registration hands back an opaque
//! [`WatcherId`]; removal is keyed on that handle and fails when the
//! handle was never added.

use std::sync::Arc;

/// Callback invoked from the session's dispatch task.
pub type WatcherFn = Arc<dyn Fn() + Send + Sync + 'static>;

/// Opaque handle identifying one registered watcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatcherId(u64);

/// One axis of watchers. Ids are never reused within a registry.
pub(crate) struct Registry {
    next_id: u64,
    entries: Vec<(WatcherId, WatcherFn)>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self {
            next_id: 1,
            entries: Vec::new(),
        }
    }

    pub(crate) fn add(&mut self, watcher: WatcherFn) -> WatcherId {
        let id = WatcherId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, watcher));
        id
    }

    /// Returns `false` when the handle is unknown.
    pub(crate) fn remove(&mut self, id: WatcherId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }

    /// Clone the callback list so it can be invoked without holding the
    /// registry lock.
    pub(crate) fn snapshot(&self) -> Vec<WatcherFn> {
        self.entries
            .iter()
            .map(|(_, watcher)| Arc::clone(watcher))
            .collect()
    }
}
