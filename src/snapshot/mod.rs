//! Snapshot Module
//!
//! Read-only text reports over every device, for external monitoring.
//!
//! ## Responsibilities
//! - Visit devices in index order, one lock at a time
//! - Render qset, quantum, size, the segment chain and the last segment's
//!   present blocks
//! - Stay restartable from any device index
//!
//! The output is a set of per-device point-in-time views. Writers may run
//! between two visits, so it is never one atomic system-wide picture.

mod report;

pub use report::{BlockReport, DeviceReport, SegmentReport};

use std::fmt::Write as _;
use std::sync::Arc;

use crate::device::Device;
use crate::error::Result;
use crate::sync::CancelToken;

/// Lazy, restartable walk over a device table
pub struct Snapshot<'a> {
    devices: &'a [Arc<Device>],
    pos: usize,
    token: CancelToken,
    interrupted: bool,
}

impl<'a> Snapshot<'a> {
    /// Begin at device `pos`; positions past the end yield nothing
    pub fn start(devices: &'a [Arc<Device>], pos: usize) -> Self {
        Self {
            devices,
            pos,
            token: CancelToken::new(),
            interrupted: false,
        }
    }

    /// Use `token` for the per-device lock waits
    pub fn with_token(mut self, token: CancelToken) -> Self {
        self.token = token;
        self
    }

    /// Index of the next device to visit. After an interrupted visit this
    /// is the device that was not rendered, so `start(devices, position())`
    /// resumes where the walk stopped.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// End the walk. Holds no resources between visits, so nothing to undo.
    pub fn stop(self) {}
}

impl Iterator for Snapshot<'_> {
    type Item = Result<DeviceReport>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.interrupted {
            return None;
        }
        let device = self.devices.get(self.pos)?;

        let state = match device.lock(&self.token) {
            Ok(state) => state,
            Err(e) => {
                self.interrupted = true;
                return Some(Err(e));
            }
        };
        let report = DeviceReport::capture(device.index(), &state);
        drop(state);

        self.pos += 1;
        Some(Ok(report))
    }
}

/// Render every device's record, in index order
pub fn render(devices: &[Arc<Device>]) -> Result<String> {
    let mut out = String::new();
    for report in Snapshot::start(devices, 0) {
        let _ = write!(out, "{}", report?);
    }
    Ok(out)
}

/// Render a report that fits a caller buffer of `limit` bytes.
///
/// Before each device the output so far is checked against `limit - 80`;
/// the device is emitted while at most that many bytes have been written,
/// so output can overrun the last check by one record. A `limit` under 80
/// leaves no room and yields an empty report. Slot addresses are listed
/// only for a device whose chain is a single segment, and every slot is
/// listed, holes included.
pub fn render_bounded(devices: &[Arc<Device>], limit: usize) -> Result<String> {
    let mut out = String::new();
    let Some(threshold) = limit.checked_sub(80) else {
        return Ok(out);
    };
    let token = CancelToken::new();

    for device in devices {
        if out.len() > threshold {
            break;
        }
        let state = device.lock(&token)?;
        let geometry = state.geometry();
        let _ = writeln!(
            out,
            "Device {}: qset {}, q {}, sz {}",
            device.index(),
            geometry.qset(),
            geometry.quantum(),
            state.size()
        );

        let chain = state.chain();
        if let Some(head) = chain.head().map(|id| chain.segment(id)) {
            if let (Some(slots), None) = (head.slots(), head.next()) {
                for (slot, block) in slots.iter().enumerate() {
                    match block {
                        Some(block) => {
                            let _ = writeln!(out, "  {:4}: {:#x}", slot, block.as_ptr() as usize);
                        }
                        None => {
                            let _ = writeln!(out, "  {:4}: null", slot);
                        }
                    }
                }
            }
        }
    }

    Ok(out)
}
