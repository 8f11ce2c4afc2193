//! Engine Module
//!
//! Owns the fixed set of devices for the lifetime of the process.
//!
//! ## Responsibilities
//! - Create `nr_devs` devices with the default geometry at startup
//! - Hand out handles (`open_device`), trimming on write-only opens
//! - Produce snapshot reports over all devices
//! - Trim and free every device at shutdown

use std::sync::Arc;

use crate::config::{Config, Geometry};
use crate::device::Device;
use crate::error::{Result, ScullError};
use crate::handle::{AccessMode, Handle};
use crate::snapshot::{self, Snapshot};
use crate::sync::CancelToken;

/// The device table
///
/// ## Concurrency Model
/// The table itself is immutable after `open`; all mutable state lives in
/// the devices, each behind its own lock. Callers on different devices never
/// contend, callers on the same device are fully serialized.
pub struct Engine {
    /// Engine configuration
    config: Config,

    /// Geometry every device starts with and returns to on trim
    defaults: Geometry,

    /// Fixed-size device table, indexed by device number
    devices: Vec<Arc<Device>>,
}

impl Engine {
    /// Create the device table described by `config`
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;
        let defaults = config.geometry()?;

        let devices = (0..config.nr_devs)
            .map(|index| Arc::new(Device::new(index, defaults, config.memory_limit)))
            .collect();

        tracing::info!(
            devices = config.nr_devs,
            quantum = defaults.quantum(),
            qset = defaults.qset(),
            "engine started"
        );

        Ok(Self {
            config,
            defaults,
            devices,
        })
    }

    /// Open device `index`. Write-only opens trim the device first.
    pub fn open_device(&self, index: usize, mode: AccessMode) -> Result<Handle> {
        let device = self.device(index)?;
        Handle::open(Arc::clone(device), mode)
    }

    /// Trim device `index` explicitly
    pub fn trim(&self, index: usize, token: &CancelToken) -> Result<()> {
        self.device(index)?.trim(token)
    }

    /// Lazy per-device snapshot, starting at device 0
    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot::start(&self.devices, 0)
    }

    /// Full text report over all devices
    pub fn report(&self) -> Result<String> {
        snapshot::render(&self.devices)
    }

    /// Shut down: trim every device, then free the table
    pub fn close(self) {
        let token = CancelToken::new();
        for device in &self.devices {
            // A fresh token is never cancelled, so this only waits.
            if let Err(e) = device.trim(&token) {
                tracing::warn!(device = device.index(), error = %e, "trim at shutdown failed");
            }
        }
        tracing::info!(devices = self.devices.len(), "engine stopped");
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn device(&self, index: usize) -> Result<&Arc<Device>> {
        self.devices.get(index).ok_or(ScullError::NoSuchDevice {
            index,
            count: self.devices.len(),
        })
    }

    pub fn devices(&self) -> &[Arc<Device>] {
        &self.devices
    }

    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    pub fn defaults(&self) -> Geometry {
        self.defaults
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}
