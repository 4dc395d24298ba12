//! Sensor abstraction for the DHT22 bridge.
//!
//! The physical DHT22 driver lives outside this crate; the bridge only
//! depends on the [`SensorReader`] trait. Whatever retry policy the
//! driver applies internally is opaque here: a read either produces a
//! humidity/temperature pair or fails, and a failed read simply skips
//! that poll cycle.

pub mod simulated;

pub use simulated::SimulatedReader;

use crate::config::{Pin, SensorConfig};
use crate::error::Result;
use async_trait::async_trait;

/// One humidity/temperature pair, raw or calibrated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    /// Relative humidity in percent.
    pub humidity: f64,
    /// Temperature in degrees Celsius.
    pub temperature: f64,
}

impl Reading {
    pub fn new(humidity: f64, temperature: f64) -> Self {
        Self {
            humidity,
            temperature,
        }
    }

    /// Apply the sensor's calibration offsets to this reading.
    ///
    /// Pure additive correction, no clamping:
    /// `humidity + humidity_offset`, `temperature + temperature_offset`.
    pub fn calibrated(self, config: &SensorConfig) -> Reading {
        Reading {
            humidity: self.humidity + config.humidity_offset,
            temperature: self.temperature + config.temperature_offset,
        }
    }
}

/// Boundary to the physical sensor driver.
///
/// `read` blocks (from the session's point of view) until the driver
/// produces a value or gives up. The bridge never retries on its own;
/// the fixed poll interval is the sole recovery mechanism.
#[async_trait]
pub trait SensorReader: Send + Sync {
    async fn read(&self, pin: &Pin) -> Result<Reading>;
}
