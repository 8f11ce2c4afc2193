//! Device Module
//!
//! The sparse storage engine.
//!
//! ## Responsibilities
//! - Translate byte offsets into (segment, slot, offset-in-block)
//! - Grow the segment chain and allocate blocks on first write
//! - Serve reads without ever materializing holes
//! - Release everything at once on trim
//!
//! ## Layout
//! ```text
//!  head
//!   │
//!   ▼
//! ┌──────────────┐  next  ┌──────────────┐  next
//! │ segment 0    │───────▶│ segment 1    │───────▶ None
//! │ slots[qset]  │        │ slots: None  │
//! └──┬───┬───┬───┘        └──────────────┘
//!    │   ·   │
//!    ▼  hole ▼
//!  block    block         (each block = quantum bytes)
//! ```
//!
//! Offset `f` lives in segment `f / (quantum * qset)`, slot
//! `(f % (quantum * qset)) / quantum`, byte `f % quantum` of that block.

mod chain;
mod object;
mod position;
mod state;

pub use chain::{Block, ChainIter, ChainStats, Segment, SegmentChain, SegmentId};
pub use object::Device;
pub use position::Position;
pub use state::DeviceState;
