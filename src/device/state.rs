//! Device state
//!
//! Everything a device lock protects, and the read/write/trim logic that
//! runs while it is held.

use crate::config::Geometry;
use crate::error::{Result, ScullError};
use crate::transfer::{UserSink, UserSource};

use super::chain::{ChainStats, SegmentChain};
use super::position::Position;

/// Lock-protected contents of one device
#[derive(Debug)]
pub struct DeviceState {
    /// Current block size and fan-out (defaults until overridden)
    geometry: Geometry,

    /// One past the highest byte ever written
    size: u64,

    /// Segments and blocks
    chain: SegmentChain,
}

impl DeviceState {
    pub fn new(geometry: Geometry, memory_limit: Option<usize>) -> Self {
        Self {
            geometry,
            size: 0,
            chain: SegmentChain::new(memory_limit),
        }
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn chain(&self) -> &SegmentChain {
        &self.chain
    }

    pub fn stats(&self) -> ChainStats {
        self.chain.stats()
    }

    /// Replace the geometry. Only allowed while nothing is allocated, since
    /// existing blocks were laid out under the old one.
    pub fn set_geometry(&mut self, geometry: Geometry) -> Result<()> {
        if !self.chain.is_empty() {
            return Err(ScullError::Config(
                "geometry can only change on an empty device".to_string(),
            ));
        }
        self.geometry = geometry;
        Ok(())
    }

    /// Copy up to `count` bytes at `*f_pos` into `dst`.
    ///
    /// Never crosses a block boundary. Returns `Ok(0)` both at end of data
    /// and on a hole inside the written extent.
    pub fn read<D>(&mut self, dst: &mut D, count: usize, f_pos: &mut u64) -> Result<usize>
    where
        D: UserSink + ?Sized,
    {
        if *f_pos >= self.size {
            return Ok(0);
        }
        let available = self.size - *f_pos;
        let count = usize::try_from(available).map_or(count, |avail| count.min(avail));

        let pos = Position::locate(*f_pos, self.geometry);
        let id = self.chain.follow(pos.item)?;
        let Some(block) = self.chain.segment(id).block(pos.slot) else {
            tracing::trace!(offset = *f_pos, "read hit a hole");
            return Ok(0);
        };

        let count = count.min(pos.block_remaining(self.geometry));
        dst.copy_to_user(&block[pos.inner..pos.inner + count])?;

        *f_pos += count as u64;
        Ok(count)
    }

    /// Copy up to `count` bytes from `src` to `*f_pos`, allocating the slot
    /// array and block on demand.
    ///
    /// Never crosses a block boundary; callers loop for longer writes.
    pub fn write<S>(&mut self, src: &S, count: usize, f_pos: &mut u64) -> Result<usize>
    where
        S: UserSource + ?Sized,
    {
        let room = u64::MAX - *f_pos;
        if room == 0 {
            return Ok(0);
        }
        let count = usize::try_from(room).map_or(count, |room| count.min(room));

        let pos = Position::locate(*f_pos, self.geometry);
        let id = self.chain.follow(pos.item)?;
        let block = self.chain.block_mut(id, pos.slot, self.geometry)?;

        let count = count.min(pos.block_remaining(self.geometry));
        src.copy_from_user(&mut block[pos.inner..pos.inner + count])?;

        *f_pos += count as u64;
        if self.size < *f_pos {
            self.size = *f_pos;
        }
        Ok(count)
    }

    /// Release the whole chain and return to `defaults`.
    pub fn trim(&mut self, defaults: Geometry) -> ChainStats {
        let released = self.chain.release_all();
        self.size = 0;
        self.geometry = defaults;
        released
    }
}
