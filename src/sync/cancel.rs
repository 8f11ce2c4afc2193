//! Cancellation tokens
//!
//! A token is handed to blocking lock calls; cancelling it wakes every wait
//! the token is currently parked in.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use super::mutex::Gate;

/// Signal used to abandon a blocked lock acquisition.
///
/// Clones share state, so one clone can be kept by the waiting thread while
/// another is cancelled from elsewhere. Once cancelled a token stays
/// cancelled.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<TokenInner>,
}

#[derive(Debug, Default)]
struct TokenInner {
    cancelled: AtomicBool,

    /// Gates this token is currently waiting on
    parked: Mutex<Vec<Arc<Gate>>>,
}

impl CancelToken {
    /// Create a token that has not been cancelled
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel the token and wake any wait it is parked in
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);

        let parked: Vec<Arc<Gate>> = self.inner.parked.lock().clone();
        for gate in parked {
            gate.wake_all();
        }
    }

    /// Whether `cancel` has been called on this token or any clone of it
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    pub(super) fn park(&self, gate: &Arc<Gate>) {
        self.inner.parked.lock().push(Arc::clone(gate));
    }

    pub(super) fn unpark(&self, gate: &Arc<Gate>) {
        let mut parked = self.inner.parked.lock();
        if let Some(idx) = parked.iter().position(|g| Arc::ptr_eq(g, gate)) {
            parked.swap_remove(idx);
        }
    }
}
