//! Device
//!
//! One storage object: a [`DeviceState`] behind an interruptible lock.

use crate::config::Geometry;
use crate::error::Result;
use crate::sync::{CancelToken, InterruptibleGuard, InterruptibleMutex};
use crate::transfer::{UserSink, UserSource};

use super::chain::ChainStats;
use super::state::DeviceState;

/// A sparse in-memory storage device
///
/// ## Concurrency Model
/// Every read, write, trim and snapshot visit holds `state`'s lock for its
/// whole duration, so operations on one device are totally ordered. Waits
/// for the lock can be cancelled with the caller's [`CancelToken`].
#[derive(Debug)]
pub struct Device {
    /// Position in the engine's device table
    index: usize,

    /// Geometry restored by every trim
    defaults: Geometry,

    state: InterruptibleMutex<DeviceState>,
}

impl Device {
    pub fn new(index: usize, defaults: Geometry, memory_limit: Option<usize>) -> Self {
        Self {
            index,
            defaults,
            state: InterruptibleMutex::new(DeviceState::new(defaults, memory_limit)),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Geometry the device returns to on trim
    pub fn defaults(&self) -> Geometry {
        self.defaults
    }

    /// Read at most `count` bytes at `*f_pos` into `dst`
    pub fn read<D>(&self, token: &CancelToken, dst: &mut D, count: usize, f_pos: &mut u64) -> Result<usize>
    where
        D: UserSink + ?Sized,
    {
        let mut state = self.lock(token)?;
        let n = state.read(dst, count, f_pos)?;
        tracing::trace!(device = self.index, bytes = n, offset = *f_pos, "read");
        Ok(n)
    }

    /// Write at most `count` bytes from `src` to `*f_pos`
    pub fn write<S>(&self, token: &CancelToken, src: &S, count: usize, f_pos: &mut u64) -> Result<usize>
    where
        S: UserSource + ?Sized,
    {
        let mut state = self.lock(token)?;
        let n = state.write(src, count, f_pos)?;
        tracing::trace!(device = self.index, bytes = n, offset = *f_pos, size = state.size(), "write");
        Ok(n)
    }

    /// Release all memory, zero the size and restore the default geometry
    pub fn trim(&self, token: &CancelToken) -> Result<()> {
        let mut state = self.lock(token)?;
        let released = state.trim(self.defaults);
        tracing::debug!(
            device = self.index,
            segments = released.segments,
            blocks = released.blocks,
            bytes = released.bytes,
            "trimmed"
        );
        Ok(())
    }

    /// Override quantum and qset until the next trim
    pub fn set_geometry(&self, token: &CancelToken, quantum: usize, qset: usize) -> Result<()> {
        let geometry = Geometry::new(quantum, qset)?;
        self.lock(token)?.set_geometry(geometry)?;
        tracing::debug!(device = self.index, quantum, qset, "geometry set");
        Ok(())
    }

    // =========================================================================
    // Accessors (block until the lock is free)
    // =========================================================================

    pub fn geometry(&self) -> Geometry {
        self.state.lock().geometry()
    }

    pub fn size(&self) -> u64 {
        self.state.lock().size()
    }

    pub fn stats(&self) -> ChainStats {
        self.state.lock().stats()
    }

    /// Hold the device lock, e.g. to inspect the chain consistently
    pub fn lock(&self, token: &CancelToken) -> Result<InterruptibleGuard<'_, DeviceState>> {
        self.state.lock_interruptible(token).map_err(|e| {
            tracing::warn!(device = self.index, "interrupted waiting for device lock");
            e
        })
    }
}

impl Drop for Device {
    fn drop(&mut self) {
        self.state.get_mut().trim(self.defaults);
    }
}
