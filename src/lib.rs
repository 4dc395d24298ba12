//! DHT22 bridge library.
//!
//! Bridges DHT22 temperature/humidity sensors into a smart-home
//! gateway's device model: one background polling session per
//! configured pin, additive calibration, change detection and outbound
//! change notifications. The physical sensor driver and the gateway
//! integration itself stay behind the [`sensor::SensorReader`] and
//! [`notify::NotificationSink`] boundaries.

pub mod config;
pub mod error;
pub mod notify;
pub mod registry;
pub mod sensor;
pub mod session;

pub use config::{Config, Pin, SensorConfig};
pub use error::{BridgeError, Result};
pub use notify::{ChannelSink, EventKind, NotificationSink, PropertyEvent, PropertyName};
pub use registry::AdapterRegistry;
pub use sensor::{Reading, SensorReader, SimulatedReader};
pub use session::DeviceSession;
