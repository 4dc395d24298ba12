//! Session registry: one polling session per configured pin.
//!
//! The registry is the boundary to the gateway's adapter layer. It
//! reads the configured sensor list once at startup, enforces pin
//! uniqueness and owns the resulting session handles. No global
//! state: whoever owns the adapter's lifecycle owns the registry.

use crate::config::Config;
use crate::error::{BridgeError, Result};
use crate::notify::NotificationSink;
use crate::sensor::SensorReader;
use crate::session::DeviceSession;
use futures_util::future::join_all;
use log::info;
use std::collections::HashSet;
use std::sync::Arc;

#[derive(Debug)]
pub struct AdapterRegistry {
    sessions: Vec<DeviceSession>,
}

impl AdapterRegistry {
    /// Create one [`DeviceSession`] per configured sensor.
    ///
    /// Fails before spawning anything if the configuration is empty or
    /// lists the same pin twice; fails on the first sensor whose seed
    /// read does not produce a value.
    pub async fn start(
        config: &Config,
        reader: Arc<dyn SensorReader>,
        sink: Arc<dyn NotificationSink>,
    ) -> Result<Self> {
        if config.sensors.is_empty() {
            return Err(BridgeError::ConfigurationMissing);
        }

        let mut seen = HashSet::new();
        for sensor in &config.sensors {
            if !seen.insert(sensor.pin.clone()) {
                return Err(BridgeError::DuplicatePin(sensor.pin.clone()));
            }
        }

        let interval = config.poll_interval();
        let mut sessions = Vec::with_capacity(config.sensors.len());
        for sensor in &config.sensors {
            match DeviceSession::spawn(sensor.clone(), interval, reader.clone(), sink.clone())
                .await
            {
                Ok(session) => {
                    info!("Started DHT22 session on pin {}", session.pin());
                    sessions.push(session);
                }
                Err(e) => {
                    // Tear down sessions already spawned for earlier
                    // pins; no polling loop may outlive a failed start.
                    for session in &sessions {
                        session.abort();
                    }
                    join_all(sessions.into_iter().map(DeviceSession::join)).await;
                    return Err(e);
                }
            }
        }

        Ok(Self { sessions })
    }

    pub fn sessions(&self) -> &[DeviceSession] {
        &self.sessions
    }

    /// Abort every polling task and wait for them to wind down.
    /// Called at process shutdown; sessions have no other stop signal.
    pub async fn shutdown(self) {
        for session in &self.sessions {
            session.abort();
        }
        join_all(self.sessions.into_iter().map(DeviceSession::join)).await;
    }
}
