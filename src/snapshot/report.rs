//! Snapshot records
//!
//! Point-in-time views of one device, captured under its lock.
//!
//! Segments are identified by their arena id (`item at #id`), not by an
//! address; slot arrays and blocks are reported by address.

use std::fmt;

use serde::Serialize;

use crate::device::{DeviceState, SegmentId};

/// One device's record in a snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceReport {
    pub index: usize,
    pub qset: usize,
    pub quantum: usize,
    pub size: u64,

    /// Every segment in chain order
    pub segments: Vec<SegmentReport>,
}

/// One segment of a device's chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SegmentReport {
    /// Arena index of the segment
    pub id: SegmentId,

    /// Address of the slot array, if allocated
    pub slots_addr: Option<usize>,

    /// Present blocks; only filled in for the last segment
    pub blocks: Vec<BlockReport>,
}

/// A present block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BlockReport {
    pub slot: usize,
    pub addr: usize,
}

impl DeviceReport {
    /// Capture `state`; the caller holds the device lock
    pub fn capture(index: usize, state: &DeviceState) -> Self {
        let chain = state.chain();
        let segments = chain
            .iter()
            .map(|(id, segment)| {
                let slots = segment.slots();
                let blocks = match slots {
                    Some(slots) if segment.next().is_none() => slots
                        .iter()
                        .enumerate()
                        .filter_map(|(slot, block)| {
                            block.as_ref().map(|b| BlockReport {
                                slot,
                                addr: b.as_ptr() as usize,
                            })
                        })
                        .collect(),
                    _ => Vec::new(),
                };
                SegmentReport {
                    id,
                    slots_addr: slots.map(|s| s.as_ptr() as usize),
                    blocks,
                }
            })
            .collect();

        Self {
            index,
            qset: state.geometry().qset(),
            quantum: state.geometry().quantum(),
            size: state.size(),
            segments,
        }
    }

    /// Number of present blocks listed (last segment only)
    pub fn listed_blocks(&self) -> usize {
        self.segments.iter().map(|s| s.blocks.len()).sum()
    }
}

impl fmt::Display for DeviceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Device {}: qset {}, quantum {}, size {}",
            self.index, self.qset, self.quantum, self.size
        )?;
        for segment in &self.segments {
            match segment.slots_addr {
                Some(addr) => writeln!(f, "  item at #{}, qset at {:#x}", segment.id, addr)?,
                None => writeln!(f, "  item at #{}, qset at null", segment.id)?,
            }
            for block in &segment.blocks {
                writeln!(f, "    {:4}: {:#x}", block.slot, block.addr)?;
            }
        }
        Ok(())
    }
}
