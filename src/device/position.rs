//! Address translation
//!
//! Maps a linear byte offset onto the segmented layout.

use crate::config::Geometry;

/// Where a byte offset lands inside a device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    /// Index of the segment in the chain
    pub item: u64,

    /// Block slot within that segment
    pub slot: usize,

    /// Byte offset within that block
    pub inner: usize,
}

impl Position {
    /// Translate `offset` under `geometry`. Total for every offset.
    pub fn locate(offset: u64, geometry: Geometry) -> Self {
        let item_size = geometry.item_size();
        let quantum = geometry.quantum() as u64;

        let item = offset / item_size;
        let rest = offset % item_size;

        Self {
            item,
            slot: (rest / quantum) as usize,
            inner: (rest % quantum) as usize,
        }
    }

    /// Bytes left in the block from `inner` to its end
    pub fn block_remaining(&self, geometry: Geometry) -> usize {
        geometry.quantum() - self.inner
    }
}
