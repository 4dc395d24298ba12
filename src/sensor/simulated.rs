//! Simulated DHT22 for development and testing.
//!
//! Produces a slow random walk around a baseline reading so sessions
//! see realistic value changes without any hardware attached.

use super::{Reading, SensorReader};
use crate::config::Pin;
use crate::error::{BridgeError, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use rand::Rng;

/// Sensor reader that fabricates readings instead of touching GPIO.
///
/// Each call nudges humidity and temperature by a small random step,
/// so change detection downstream has something to react to. An
/// optional failure rate injects read failures for exercising the
/// skip-cycle path.
pub struct SimulatedReader {
    current: Mutex<Reading>,
    failure_rate: f64,
}

impl SimulatedReader {
    /// Create a simulated sensor starting at the given baseline.
    pub fn new(baseline: Reading) -> Self {
        Self {
            current: Mutex::new(baseline),
            failure_rate: 0.0,
        }
    }

    /// Fail roughly this fraction of reads (0.0 ..= 1.0).
    pub fn with_failure_rate(mut self, rate: f64) -> Self {
        self.failure_rate = rate;
        self
    }
}

impl Default for SimulatedReader {
    fn default() -> Self {
        // Indoor-ish starting point
        Self::new(Reading::new(45.0, 21.0))
    }
}

#[async_trait]
impl SensorReader for SimulatedReader {
    async fn read(&self, pin: &Pin) -> Result<Reading> {
        let mut rng = rand::thread_rng();

        if self.failure_rate > 0.0 && rng.gen_range(0.0..1.0) < self.failure_rate {
            return Err(BridgeError::sensor_read(pin, "simulated checksum error"));
        }

        let mut current = self.current.lock();
        current.humidity = (current.humidity + rng.gen_range(-0.5..0.5)).clamp(0.0, 100.0);
        current.temperature = (current.temperature + rng.gen_range(-0.2..0.2)).clamp(-40.0, 80.0);
        Ok(*current)
    }
}
