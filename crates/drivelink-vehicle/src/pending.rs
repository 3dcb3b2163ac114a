//! Pending-request slots.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use tokio::sync::oneshot;

/// A FIFO of single-use response slots.
///
/// Every `register` installs a fresh slot behind any already pending;
/// every `resolve` consumes the oldest slot. A response therefore settles
/// exactly one waiter, and a waiter can never observe a result that was
/// latched before it registered. With no pending slot a response is
/// dropped (response cardinality is not 1:1 with requests on this
/// protocol).
pub(crate) struct ResponseSlots<T> {
    waiters: Mutex<VecDeque<oneshot::Sender<T>>>,
}

impl<T> ResponseSlots<T> {
    pub(crate) fn new() -> Self {
        Self {
            waiters: Mutex::new(VecDeque::new()),
        }
    }

    /// Install a fresh slot and hand back its receiving half.
    pub(crate) fn register(&self) -> oneshot::Receiver<T> {
        let (tx, rx) = oneshot::channel();
        self.waiters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(tx);
        rx
    }

    /// Resolve the oldest pending slot.
    ///
    /// The value is latched to that slot even when its waiter has
    /// already gone away.
    pub(crate) fn resolve(&self, value: T) {
        let slot = self
            .waiters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        if let Some(tx) = slot {
            let _ = tx.send(value);
        }
    }
}
