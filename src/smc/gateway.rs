//! Hardware Sensor Gateway
//!
//! Enumerates SMC sensor keys and reads their raw typed values, partitioned
//! by the numeric kind the hardware reports. One scrape opens and closes one
//! SMC connection; a mutex serializes concurrent scrapes over the hardware.

use std::collections::HashMap;

use crate::error::Result;
use crate::smc::decode::RawValue;

#[cfg(target_os = "macos")]
use crate::error::Error;
#[cfg(target_os = "macos")]
use crate::smc::ffi::SmcConnection;
#[cfg(target_os = "macos")]
use tracing::trace;

// =============================================================================
// Raw Readings
// =============================================================================

/// One scrape's worth of raw sensor values, partitioned by numeric kind.
/// A key may appear in at most one partition per read, but nothing upstream
/// guarantees uniqueness across reads of different kinds; deduplication is
/// the classifier's job.
#[derive(Debug, Default, Clone)]
pub struct RawReadings {
    pub floats: HashMap<String, f32>,
    pub unsigned: HashMap<String, u64>,
    pub signed: HashMap<String, i64>,
}

impl RawReadings {
    pub fn new() -> Self {
        Self::default()
    }

    /// File a decoded value into the partition matching its kind.
    pub fn insert(&mut self, key: String, value: RawValue) {
        match value {
            RawValue::Float(v) => {
                self.floats.insert(key, v);
            }
            RawValue::Unsigned(v) => {
                self.unsigned.insert(key, v);
            }
            RawValue::Signed(v) => {
                self.signed.insert(key, v);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.floats.len() + self.unsigned.len() + self.signed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate all readings widened to f64, in the contractual partition
    /// order: floats, then unsigned, then signed. The classifier's
    /// first-occurrence-wins dedup relies on this ordering.
    pub fn iter_partitioned(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.floats
            .iter()
            .map(|(k, v)| (k.as_str(), *v as f64))
            .chain(self.unsigned.iter().map(|(k, v)| (k.as_str(), *v as f64)))
            .chain(self.signed.iter().map(|(k, v)| (k.as_str(), *v as f64)))
    }
}

// =============================================================================
// Gateway Trait
// =============================================================================

/// Capability boundary to the sensor hardware. Implemented by the SMC on
/// macOS and by mocks in tests.
pub trait SensorGateway: Send + Sync {
    /// List every sensor key the hardware exposes, in hardware order.
    fn enumerate_keys(&self) -> Result<Vec<String>>;

    /// Read the given keys, partitioning results by reported numeric kind.
    /// Individual unreadable keys are skipped, not errors.
    fn read_values(&self, keys: &[String]) -> Result<RawReadings>;
}

// =============================================================================
// SMC Gateway (macOS)
// =============================================================================

/// Gateway backed by the AppleSMC IOKit user client.
pub struct SmcGateway {
    /// The SMC user client is not documented thread-safe; serialize scrapes.
    #[cfg(target_os = "macos")]
    hardware_lock: parking_lot::Mutex<()>,
}

impl SmcGateway {
    pub fn new() -> Self {
        Self {
            #[cfg(target_os = "macos")]
            hardware_lock: parking_lot::Mutex::new(()),
        }
    }
}

impl Default for SmcGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(target_os = "macos")]
impl SensorGateway for SmcGateway {
    fn enumerate_keys(&self) -> Result<Vec<String>> {
        let _guard = self.hardware_lock.lock();
        let conn = SmcConnection::open()?;

        let count = conn.key_count()?;
        let mut keys = Vec::with_capacity(count as usize);
        for index in 0..count {
            match conn.key_name(index) {
                Ok(name) => keys.push(name),
                Err(e) => trace!(index, error = %e, "skipping unreadable key index"),
            }
        }

        Ok(keys)
    }

    fn read_values(&self, keys: &[String]) -> Result<RawReadings> {
        let _guard = self.hardware_lock.lock();
        let conn = SmcConnection::open()?;

        let mut readings = RawReadings::new();
        for key in keys {
            match conn.read_key(key) {
                Ok(Some(value)) => readings.insert(key.clone(), value),
                Ok(None) => trace!(key, "skipping key with unmodeled data type"),
                Err(e) => trace!(key, error = %e, "skipping unreadable key"),
            }
        }

        Ok(readings)
    }
}

#[cfg(not(target_os = "macos"))]
impl SensorGateway for SmcGateway {
    fn enumerate_keys(&self) -> Result<Vec<String>> {
        Err(crate::error::Error::Unsupported)
    }

    fn read_values(&self, _keys: &[String]) -> Result<RawReadings> {
        Err(crate::error::Error::Unsupported)
    }
}
