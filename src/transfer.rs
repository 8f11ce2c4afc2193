//! Buffer transfer
//!
//! The boundary between device memory and a caller's buffer. The engine only
//! calls these while holding the device lock, and any failure is reported as
//! [`ScullError::TransferFault`]; a copy either happens in full or not at all.

use crate::error::{Result, ScullError};

/// Destination of a read
pub trait UserSink {
    /// Copy all of `src` to the start of this buffer
    fn copy_to_user(&mut self, src: &[u8]) -> Result<()>;
}

/// Source of a write
pub trait UserSource {
    /// Fill all of `dst` from the start of this buffer
    fn copy_from_user(&self, dst: &mut [u8]) -> Result<()>;
}

impl UserSink for [u8] {
    fn copy_to_user(&mut self, src: &[u8]) -> Result<()> {
        let len = self.len();
        let dst = self.get_mut(..src.len()).ok_or_else(|| {
            ScullError::TransferFault(format!(
                "destination holds {} bytes, {} requested",
                len,
                src.len()
            ))
        })?;
        dst.copy_from_slice(src);
        Ok(())
    }
}

impl UserSink for Vec<u8> {
    fn copy_to_user(&mut self, src: &[u8]) -> Result<()> {
        self.as_mut_slice().copy_to_user(src)
    }
}

impl UserSource for [u8] {
    fn copy_from_user(&self, dst: &mut [u8]) -> Result<()> {
        let src = self.get(..dst.len()).ok_or_else(|| {
            ScullError::TransferFault(format!(
                "source holds {} bytes, {} requested",
                self.len(),
                dst.len()
            ))
        })?;
        dst.copy_from_slice(src);
        Ok(())
    }
}

impl UserSource for Vec<u8> {
    fn copy_from_user(&self, dst: &mut [u8]) -> Result<()> {
        self.as_slice().copy_from_user(dst)
    }
}

impl UserSource for str {
    fn copy_from_user(&self, dst: &mut [u8]) -> Result<()> {
        self.as_bytes().copy_from_user(dst)
    }
}
