//! Open device handles
//!
//! A [`Handle`] is one open session on a device: an access mode, a
//! cancellation token for its lock waits and, for the `std::io` adapters,
//! a cursor. The explicit `read`/`write` calls take the cursor from the
//! caller instead.

use std::fmt;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::device::Device;
use crate::error::{Result, ScullError};
use crate::sync::CancelToken;
use crate::transfer::{UserSink, UserSource};

/// How a device was opened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessMode {
    ReadOnly,

    /// Opening write-only always trims the device first
    WriteOnly,

    ReadWrite,
}

impl AccessMode {
    pub fn can_read(self) -> bool {
        matches!(self, AccessMode::ReadOnly | AccessMode::ReadWrite)
    }

    pub fn can_write(self) -> bool {
        matches!(self, AccessMode::WriteOnly | AccessMode::ReadWrite)
    }
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AccessMode::ReadOnly => "read-only",
            AccessMode::WriteOnly => "write-only",
            AccessMode::ReadWrite => "read-write",
        };
        f.write_str(name)
    }
}

/// An open session on one device
pub struct Handle {
    device: Arc<Device>,
    mode: AccessMode,
    token: CancelToken,

    /// Cursor used by the `std::io` impls
    pos: u64,
}

impl Handle {
    /// Open `device`, trimming it first when `mode` is write-only
    pub(crate) fn open(device: Arc<Device>, mode: AccessMode) -> Result<Self> {
        let token = CancelToken::new();
        if mode == AccessMode::WriteOnly {
            device.trim(&token)?;
        }
        tracing::debug!(device = device.index(), %mode, "opened");
        Ok(Self {
            device,
            mode,
            token,
            pos: 0,
        })
    }

    /// Read at most `count` bytes at `*cursor` into `dst`.
    ///
    /// Returns `Ok(0)` at end of data and on holes; a single call never
    /// crosses a block boundary. Lock waits use the handle's own token.
    pub fn read<D>(&self, dst: &mut D, count: usize, cursor: &mut u64) -> Result<usize>
    where
        D: UserSink + ?Sized,
    {
        self.read_interruptible(&self.token, dst, count, cursor)
    }

    /// [`Handle::read`] with the lock wait cut short by `token` instead of
    /// the handle's token
    pub fn read_interruptible<D>(
        &self,
        token: &CancelToken,
        dst: &mut D,
        count: usize,
        cursor: &mut u64,
    ) -> Result<usize>
    where
        D: UserSink + ?Sized,
    {
        if !self.mode.can_read() {
            return Err(self.denied());
        }
        self.device.read(token, dst, count, cursor)
    }

    /// Write at most `count` bytes from `src` at `*cursor`.
    ///
    /// A single call never crosses a block boundary; loop on short writes.
    pub fn write<S>(&self, src: &S, count: usize, cursor: &mut u64) -> Result<usize>
    where
        S: UserSource + ?Sized,
    {
        self.write_interruptible(&self.token, src, count, cursor)
    }

    /// [`Handle::write`] with the lock wait cut short by `token`
    pub fn write_interruptible<S>(
        &self,
        token: &CancelToken,
        src: &S,
        count: usize,
        cursor: &mut u64,
    ) -> Result<usize>
    where
        S: UserSource + ?Sized,
    {
        if !self.mode.can_write() {
            return Err(self.denied());
        }
        self.device.write(token, src, count, cursor)
    }

    /// A clone of this handle's token; cancelling it interrupts whatever
    /// lock wait the handle is in and every later one.
    pub fn cancel_token(&self) -> CancelToken {
        self.token.clone()
    }

    /// Give the handle a fresh, uncancelled token
    pub fn reset_token(&mut self) {
        self.token = CancelToken::new();
    }

    pub fn device(&self) -> &Arc<Device> {
        &self.device
    }

    pub fn mode(&self) -> AccessMode {
        self.mode
    }

    /// Cursor used by the `std::io` impls
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Close the handle. Device contents are untouched.
    pub fn close(self) {
        tracing::debug!(device = self.device.index(), mode = %self.mode, "closed");
    }

    fn denied(&self) -> ScullError {
        ScullError::AccessDenied(format!("device {} opened {}", self.device.index(), self.mode))
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("device", &self.device.index())
            .field("mode", &self.mode)
            .field("pos", &self.pos)
            .finish()
    }
}

// =============================================================================
// std::io adapters
// =============================================================================

impl Read for Handle {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let len = buf.len();
        let mut pos = self.pos;
        let n = Handle::read(self, buf, len, &mut pos)?;
        self.pos = pos;
        Ok(n)
    }
}

impl Write for Handle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut pos = self.pos;
        let n = Handle::write(self, buf, buf.len(), &mut pos)?;
        self.pos = pos;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Seek for Handle {
    fn seek(&mut self, target: SeekFrom) -> io::Result<u64> {
        let (base, delta) = match target {
            SeekFrom::Start(offset) => {
                self.pos = offset;
                return Ok(offset);
            }
            SeekFrom::End(delta) => (self.device.size(), delta),
            SeekFrom::Current(delta) => (self.pos, delta),
        };
        let pos = base.checked_add_signed(delta).ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "seek to a negative or overflowing offset")
        })?;
        self.pos = pos;
        Ok(pos)
    }
}
