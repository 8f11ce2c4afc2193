//! Configuration for scull
//!
//! Centralized configuration with sensible defaults.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScullError};

/// Main configuration for a scull engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Device Set Configuration
    // -------------------------------------------------------------------------
    /// Number of devices created at startup (fixed for the engine's lifetime)
    pub nr_devs: usize,

    // -------------------------------------------------------------------------
    // Geometry Defaults
    // -------------------------------------------------------------------------
    /// Bytes per block. Every trim resets a device back to this value.
    pub quantum: usize,

    /// Block slots per segment. Every trim resets a device back to this value.
    pub qset: usize,

    // -------------------------------------------------------------------------
    // Resource Configuration
    // -------------------------------------------------------------------------
    /// Per-device cap on bytes held by segments, slot arrays and blocks.
    /// `None` means allocation is only bounded by the allocator itself.
    pub memory_limit: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            nr_devs: 4,
            quantum: 2000,
            qset: 1000,
            memory_limit: None,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check that the config describes at least one usable device
    pub fn validate(&self) -> Result<()> {
        if self.nr_devs == 0 {
            return Err(ScullError::Config("nr_devs must be positive".to_string()));
        }
        Geometry::new(self.quantum, self.qset)?;
        Ok(())
    }

    /// The default geometry every device starts with and returns to on trim
    pub fn geometry(&self) -> Result<Geometry> {
        Geometry::new(self.quantum, self.qset)
    }
}

/// Block size and segment fan-out of a device.
///
/// Immutable once built; a device swaps in a whole new value rather than
/// mutating one in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Geometry {
    quantum: usize,
    qset: usize,
}

impl Geometry {
    /// Build a geometry, rejecting zero sizes and a segment span that does
    /// not fit in a `u64` offset.
    pub fn new(quantum: usize, qset: usize) -> Result<Self> {
        if quantum == 0 {
            return Err(ScullError::Config("quantum must be positive".to_string()));
        }
        if qset == 0 {
            return Err(ScullError::Config("qset must be positive".to_string()));
        }
        let span = quantum.checked_mul(qset).ok_or_else(|| {
            ScullError::Config(format!("quantum {} * qset {} overflows", quantum, qset))
        })?;
        if u64::try_from(span).is_err() {
            return Err(ScullError::Config(format!("segment span {} too large", span)));
        }
        Ok(Self { quantum, qset })
    }

    /// Bytes per block
    pub fn quantum(&self) -> usize {
        self.quantum
    }

    /// Block slots per segment
    pub fn qset(&self) -> usize {
        self.qset
    }

    /// Bytes covered by one segment (`quantum * qset`)
    pub fn item_size(&self) -> u64 {
        (self.quantum * self.qset) as u64
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the number of devices
    pub fn nr_devs(mut self, count: usize) -> Self {
        self.config.nr_devs = count;
        self
    }

    /// Set the default block size (in bytes)
    pub fn quantum(mut self, bytes: usize) -> Self {
        self.config.quantum = bytes;
        self
    }

    /// Set the default number of block slots per segment
    pub fn qset(mut self, slots: usize) -> Self {
        self.config.qset = slots;
        self
    }

    /// Cap the bytes each device may allocate
    pub fn memory_limit(mut self, bytes: usize) -> Self {
        self.config.memory_limit = Some(bytes);
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
