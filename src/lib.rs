//! # scull
//!
//! A sparse, segmented storage device held entirely in memory:
//! - Byte-addressable and growable, with lazily allocated fixed-size blocks
//! - Unwritten regions ("holes") are never materialized
//! - One exclusive, cancellable lock per device
//! - Read-only text snapshots for monitoring
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Engine                              │
//! │                (fixed table of N devices)                    │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ open_device(i, mode)
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                          Handle                              │
//! │        (access mode + cancel token, caller's cursor)         │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                 Device (InterruptibleMutex)                  │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │  Position   │          │SegmentChain │
//!   │ (translate) │          │   (arena)   │
//!   └─────────────┘          └──────┬──────┘
//!                                   │
//!                                   ▼
//!                           ┌─────────────┐
//!                           │   Blocks    │
//!                           │ (quantum B) │
//!                           └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod sync;
pub mod transfer;
pub mod device;
pub mod handle;
pub mod snapshot;
pub mod engine;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{Result, ScullError};
pub use config::{Config, Geometry};
pub use engine::Engine;
pub use handle::{AccessMode, Handle};
pub use sync::CancelToken;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of scull
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
