use crate::config::Pin;
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum BridgeError {
    #[error("Sensor read failed on pin {pin}: {reason}")]
    SensorRead { pin: Pin, reason: String },

    #[error("No sensor configuration available")]
    ConfigurationMissing,

    #[error("Duplicate pin in configuration: {0}")]
    DuplicatePin(Pin),

    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    SerdeJsonError(#[from] serde_json::Error),
}

impl BridgeError {
    /// Build a read failure for `pin` from whatever the driver reported.
    pub fn sensor_read(pin: &Pin, reason: impl Into<String>) -> Self {
        Self::SensorRead {
            pin: pin.clone(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
