//! Segment chain
//!
//! Arena of segments linked by index. Segment `i` of the chain is found by
//! following `i` successor links from the head; the arena only provides
//! storage, never shortcuts.

use std::mem;

use crate::config::Geometry;
use crate::error::{Result, ScullError};

/// Stable index of a segment inside its chain's arena
pub type SegmentId = usize;

/// One fixed-size block of device memory
pub type Block = Box<[u8]>;

/// A node of the chain: `qset` block slots plus a successor link
#[derive(Debug, Default)]
pub struct Segment {
    /// Allocated on the first write into this segment
    slots: Option<Box<[Option<Block>]>>,

    /// `None` marks the tail
    next: Option<SegmentId>,
}

impl Segment {
    /// The block in `slot`, or `None` for a hole or a missing slot array
    pub fn block(&self, slot: usize) -> Option<&[u8]> {
        self.slots.as_ref()?.get(slot)?.as_deref()
    }

    /// Block slots, if the slot array has been allocated
    pub fn slots(&self) -> Option<&[Option<Block>]> {
        self.slots.as_deref()
    }

    pub fn next(&self) -> Option<SegmentId> {
        self.next
    }
}

/// Allocation counters for one chain
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChainStats {
    pub segments: usize,
    pub slot_arrays: usize,
    pub blocks: usize,
    /// Bytes charged against the memory limit
    pub bytes: usize,
}

/// Owns every segment and block of one device
#[derive(Debug)]
pub struct SegmentChain {
    segments: Vec<Segment>,
    head: Option<SegmentId>,
    stats: ChainStats,
    memory_limit: Option<usize>,
}

impl SegmentChain {
    pub fn new(memory_limit: Option<usize>) -> Self {
        Self {
            segments: Vec::new(),
            head: None,
            stats: ChainStats::default(),
            memory_limit,
        }
    }

    pub fn head(&self) -> Option<SegmentId> {
        self.head
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    pub fn stats(&self) -> ChainStats {
        self.stats
    }

    pub fn segment(&self, id: SegmentId) -> &Segment {
        &self.segments[id]
    }

    /// Segments in chain order, starting at the head
    pub fn iter(&self) -> ChainIter<'_> {
        ChainIter {
            chain: self,
            cursor: self.head,
        }
    }

    /// Walk to segment `item`, creating the head and any missing successors.
    ///
    /// New segments have no slot array. On allocation failure the segments
    /// linked so far stay in the chain.
    pub fn follow(&mut self, item: u64) -> Result<SegmentId> {
        let mut id = match self.head {
            Some(id) => id,
            None => {
                let id = self.alloc_segment()?;
                self.head = Some(id);
                id
            }
        };

        for _ in 0..item {
            id = match self.segments[id].next {
                Some(next) => next,
                None => {
                    let next = self.alloc_segment()?;
                    self.segments[id].next = Some(next);
                    next
                }
            };
        }

        Ok(id)
    }

    /// The block at `slot` of segment `id`, allocating the slot array and the
    /// block as needed. Fresh blocks are zero-filled.
    pub fn block_mut(&mut self, id: SegmentId, slot: usize, geometry: Geometry) -> Result<&mut [u8]> {
        let mut slots = match self.segments[id].slots.take() {
            Some(slots) => slots,
            None => self.alloc_slots(geometry.qset())?,
        };

        let block = match slots[slot].take() {
            Some(block) => block,
            None => match self.alloc_block(geometry.quantum()) {
                Ok(block) => block,
                Err(e) => {
                    self.segments[id].slots = Some(slots);
                    return Err(e);
                }
            },
        };

        let slots = self.segments[id].slots.insert(slots);
        let block: &mut [u8] = slots[slot].insert(block);
        Ok(block)
    }

    /// Free every block, slot array and segment, in chain order.
    ///
    /// Returns what was released.
    pub fn release_all(&mut self) -> ChainStats {
        let released = self.stats;

        let mut cursor = self.head.take();
        while let Some(id) = cursor {
            let segment = &mut self.segments[id];
            if let Some(mut slots) = segment.slots.take() {
                for entry in slots.iter_mut() {
                    entry.take();
                }
            }
            cursor = segment.next.take();
        }

        self.segments = Vec::new();
        self.stats = ChainStats::default();
        released
    }

    // =========================================================================
    // Allocation
    // =========================================================================

    fn alloc_segment(&mut self) -> Result<SegmentId> {
        let cost = mem::size_of::<Segment>();
        self.reserve(cost, "segment")?;
        self.segments
            .try_reserve(1)
            .map_err(|e| self.alloc_failed("segment", e))?;

        let id = self.segments.len();
        self.segments.push(Segment::default());
        self.stats.segments += 1;
        self.stats.bytes += cost;
        tracing::trace!(segment = id, "allocated segment");
        Ok(id)
    }

    fn alloc_slots(&mut self, qset: usize) -> Result<Box<[Option<Block>]>> {
        let cost = qset.saturating_mul(mem::size_of::<Option<Block>>());
        self.reserve(cost, "slot array")?;

        let mut slots: Vec<Option<Block>> = Vec::new();
        slots
            .try_reserve_exact(qset)
            .map_err(|e| self.alloc_failed("slot array", e))?;
        slots.resize_with(qset, || None);

        self.stats.slot_arrays += 1;
        self.stats.bytes += cost;
        Ok(slots.into_boxed_slice())
    }

    fn alloc_block(&mut self, quantum: usize) -> Result<Block> {
        self.reserve(quantum, "block")?;

        let mut block: Vec<u8> = Vec::new();
        block
            .try_reserve_exact(quantum)
            .map_err(|e| self.alloc_failed("block", e))?;
        block.resize(quantum, 0);

        self.stats.blocks += 1;
        self.stats.bytes += quantum;
        Ok(block.into_boxed_slice())
    }

    /// Check `cost` more bytes fit under the memory limit
    fn reserve(&self, cost: usize, what: &str) -> Result<()> {
        let Some(limit) = self.memory_limit else {
            return Ok(());
        };
        match self.stats.bytes.checked_add(cost) {
            Some(total) if total <= limit => Ok(()),
            _ => {
                tracing::warn!(
                    what,
                    cost,
                    used = self.stats.bytes,
                    limit,
                    "allocation refused by memory limit"
                );
                Err(ScullError::OutOfResources(format!(
                    "{} of {} bytes exceeds memory limit ({} of {} used)",
                    what, cost, self.stats.bytes, limit
                )))
            }
        }
    }

    fn alloc_failed(&self, what: &str, err: std::collections::TryReserveError) -> ScullError {
        tracing::warn!(what, error = %err, "allocation failed");
        ScullError::OutOfResources(format!("{} allocation failed: {}", what, err))
    }
}

/// Iterator over a chain's segments in link order
pub struct ChainIter<'a> {
    chain: &'a SegmentChain,
    cursor: Option<SegmentId>,
}

impl<'a> Iterator for ChainIter<'a> {
    type Item = (SegmentId, &'a Segment);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.cursor?;
        let segment = self.chain.segment(id);
        self.cursor = segment.next;
        Some((id, segment))
    }
}
