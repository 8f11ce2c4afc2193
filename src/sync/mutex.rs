//! Interruptible mutex
//!
//! A mutual-exclusion lock whose blocking acquisition can be abandoned
//! through a [`CancelToken`].

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use parking_lot::{Condvar, Mutex, MutexGuard};

use crate::error::{Result, ScullError};

use super::CancelToken;

/// Ownership flag plus the condition waiters sleep on.
///
/// The flag, not the inner data mutex, decides who owns the lock; the data
/// mutex is only ever taken by the flag's owner.
#[derive(Debug, Default)]
pub(crate) struct Gate {
    held: Mutex<bool>,
    released: Condvar,
}

impl Gate {
    /// Wake every waiter so it can re-check its token
    pub(crate) fn wake_all(&self) {
        let _held = self.held.lock();
        self.released.notify_all();
    }

    fn release(&self) {
        let mut held = self.held.lock();
        *held = false;
        drop(held);
        self.released.notify_one();
    }
}

/// Exclusive lock with cancellable blocking acquisition
#[derive(Debug)]
pub struct InterruptibleMutex<T> {
    gate: Arc<Gate>,
    data: Mutex<T>,
}

impl<T> InterruptibleMutex<T> {
    pub fn new(value: T) -> Self {
        Self {
            gate: Arc::new(Gate::default()),
            data: Mutex::new(value),
        }
    }

    /// Acquire the lock, blocking until it is free.
    pub fn lock(&self) -> InterruptibleGuard<'_, T> {
        let mut held = self.gate.held.lock();
        while *held {
            self.gate.released.wait(&mut held);
        }
        *held = true;
        drop(held);
        self.guard()
    }

    /// Acquire the lock, blocking until it is free or `token` is cancelled.
    ///
    /// A free lock is taken even when the token is already cancelled;
    /// cancellation only cuts a wait short.
    pub fn lock_interruptible(&self, token: &CancelToken) -> Result<InterruptibleGuard<'_, T>> {
        let mut held = self.gate.held.lock();
        if *held {
            token.park(&self.gate);
            while *held {
                if token.is_cancelled() {
                    token.unpark(&self.gate);
                    return Err(ScullError::Interrupted);
                }
                self.gate.released.wait(&mut held);
            }
            token.unpark(&self.gate);
        }
        *held = true;
        drop(held);
        Ok(self.guard())
    }

    /// Acquire the lock only if it is free right now
    pub fn try_lock(&self) -> Option<InterruptibleGuard<'_, T>> {
        let mut held = self.gate.held.lock();
        if *held {
            return None;
        }
        *held = true;
        drop(held);
        Some(self.guard())
    }

    /// Whether some caller currently owns the lock
    pub fn is_locked(&self) -> bool {
        *self.gate.held.lock()
    }

    /// Mutable access without locking; exclusive borrow proves no one else holds it
    pub fn get_mut(&mut self) -> &mut T {
        self.data.get_mut()
    }

    pub fn into_inner(self) -> T {
        self.data.into_inner()
    }

    fn guard(&self) -> InterruptibleGuard<'_, T> {
        InterruptibleGuard {
            data: self.data.lock(),
            gate: &self.gate,
        }
    }
}

impl<T: Default> Default for InterruptibleMutex<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

/// RAII guard; releases the lock and wakes one waiter on drop
pub struct InterruptibleGuard<'a, T> {
    data: MutexGuard<'a, T>,
    gate: &'a Gate,
}

impl<T> Deref for InterruptibleGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.data
    }
}

impl<T> DerefMut for InterruptibleGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.data
    }
}

impl<T> Drop for InterruptibleGuard<'_, T> {
    fn drop(&mut self) {
        // The next owner may briefly block on `data` until this guard's
        // field is dropped right after this body returns.
        self.gate.release();
    }
}
