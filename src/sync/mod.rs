//! Sync Module
//!
//! Locking primitives for device access.
//!
//! ## Responsibilities
//! - One exclusive lock per device, held for a whole operation
//! - Blocking acquisition that a caller can cancel from another thread
//! - No timeouts: a waiter leaves only by acquiring or by being cancelled
//!
//! ## Wait Protocol
//! ```text
//!   waiter                               canceller
//!   ──────                               ─────────
//!   lock gate state
//!   held? ── no ──▶ take it
//!     │ yes
//!   park gate on token
//!   loop:
//!     cancelled? ── yes ──▶ Interrupted   set cancelled flag
//!     wait(released) ◀──────────────────  lock gate state, notify_all
//! ```

mod cancel;
mod mutex;

pub use cancel::CancelToken;
pub use mutex::{InterruptibleGuard, InterruptibleMutex};
