//! Per-sensor polling session.
//!
//! A [`DeviceSession`] owns the whole lifecycle of one DHT22: the
//! initial seed read, the background polling loop, calibration, change
//! detection and notification dispatch. Each session runs on its own
//! tokio task; sessions never share state with each other.

use crate::config::{Pin, SensorConfig};
use crate::error::Result;
use crate::notify::{NotificationSink, PropertyName};
use crate::sensor::{Reading, SensorReader};
use log::{info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Change gate: publish on any bit-different value.
///
/// Deliberately exact float inequality, no tolerance band. Sensor
/// jitter at the least significant bit will produce notifications;
/// adding an epsilon here would silently change observable behavior.
fn should_publish(previous: f64, next: f64) -> bool {
    next != previous
}

/// Last published value of one exposed measurement.
///
/// Owned exclusively by the session's task; `last_value` always holds
/// the most recently notified value.
struct PropertyState {
    name: PropertyName,
    unit: &'static str,
    last_value: f64,
}

impl PropertyState {
    fn new(name: PropertyName, initial: f64) -> Self {
        Self {
            name,
            unit: name.unit(),
            last_value: initial,
        }
    }

    /// Run the change gate against `next`; on a change, update the
    /// stored value and notify in one step.
    fn publish(&mut self, next: f64, pin: &Pin, sink: &dyn NotificationSink) {
        if !should_publish(self.last_value, next) {
            return;
        }

        let old = self.last_value;
        self.last_value = next;
        sink.changed(pin, self.name, next);
        info!(
            "Value of {} sensor on pin {} has changed from {} to {}",
            self.name, pin, old, next
        );
    }
}

/// Everything the polling task owns for one sensor.
struct SessionState {
    config: SensorConfig,
    humidity: PropertyState,
    temperature: PropertyState,
    sink: Arc<dyn NotificationSink>,
}

impl SessionState {
    /// Seed both properties from the calibrated initial reading.
    ///
    /// Seeding reports starting values to the sink but is not a change
    /// notification and writes no change log line.
    fn seed(config: SensorConfig, initial: Reading, sink: Arc<dyn NotificationSink>) -> Self {
        let humidity = PropertyState::new(PropertyName::Humidity, initial.humidity);
        let temperature = PropertyState::new(PropertyName::Temperature, initial.temperature);

        sink.seeded(&config.pin, humidity.name, humidity.last_value);
        sink.seeded(&config.pin, temperature.name, temperature.last_value);
        info!(
            "Seeded pin {}: {} {} {}, {} {} {}",
            config.pin,
            humidity.name,
            humidity.last_value,
            humidity.unit,
            temperature.name,
            temperature.last_value,
            temperature.unit
        );

        Self {
            config,
            humidity,
            temperature,
            sink,
        }
    }

    /// One successful poll cycle: each property independently runs the
    /// change gate against the calibrated reading.
    fn apply(&mut self, calibrated: Reading) {
        self.humidity
            .publish(calibrated.humidity, &self.config.pin, self.sink.as_ref());
        self.temperature
            .publish(calibrated.temperature, &self.config.pin, self.sink.as_ref());
    }
}

/// Handle to one sensor's running session.
///
/// The polling task is spawned at creation and retained here so the
/// hosting runtime can join or abort it at shutdown instead of leaving
/// it unsupervised.
#[derive(Debug)]
pub struct DeviceSession {
    pin: Pin,
    handle: JoinHandle<()>,
}

impl DeviceSession {
    /// Perform the initial seed read, then start the polling loop.
    ///
    /// Fails with [`crate::error::BridgeError::SensorRead`] if the
    /// seed read fails; a session never starts without a starting
    /// value for both properties.
    pub async fn spawn(
        config: SensorConfig,
        interval: Duration,
        reader: Arc<dyn SensorReader>,
        sink: Arc<dyn NotificationSink>,
    ) -> Result<Self> {
        let initial = reader.read(&config.pin).await?.calibrated(&config);
        let pin = config.pin.clone();
        let mut state = SessionState::seed(config, initial, sink);

        let task_pin = pin.clone();
        let handle = tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                match reader.read(&task_pin).await {
                    Ok(raw) => {
                        let calibrated = raw.calibrated(&state.config);
                        state.apply(calibrated);
                    }
                    Err(e) => {
                        // Transient failure: skip this cycle, keep polling.
                        warn!("Poll cycle skipped on pin {}: {}", task_pin, e);
                    }
                }
            }
        });

        Ok(Self { pin, handle })
    }

    pub fn pin(&self) -> &Pin {
        &self.pin
    }

    /// Stop the polling task. Used at process shutdown.
    pub fn abort(&self) {
        self.handle.abort();
    }

    /// Wait for the polling task to finish (it only does when aborted).
    pub async fn join(self) {
        let _ = self.handle.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BridgeError;
    use crate::notify::{EventKind, RecordingSink};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    const INTERVAL: Duration = Duration::from_secs(5);

    /// Let the spawned polling task run up to its next await point.
    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    /// Reader that replays a fixed script (`None` = failed read), then
    /// fails every read once the script is exhausted.
    struct ScriptedReader {
        reads: Mutex<VecDeque<Option<Reading>>>,
    }

    impl ScriptedReader {
        fn new(reads: impl IntoIterator<Item = Option<Reading>>) -> Self {
            Self {
                reads: Mutex::new(reads.into_iter().collect()),
            }
        }
    }

    #[async_trait]
    impl SensorReader for ScriptedReader {
        async fn read(&self, pin: &Pin) -> Result<Reading> {
            self.reads
                .lock()
                .pop_front()
                .flatten()
                .ok_or_else(|| BridgeError::sensor_read(pin, "no value this cycle"))
        }
    }

    fn config(pin: u32, temperature_offset: f64, humidity_offset: f64) -> SensorConfig {
        SensorConfig {
            pin: pin.into(),
            temperature_offset,
            humidity_offset,
        }
    }

    fn seeded_state(sink: Arc<RecordingSink>) -> SessionState {
        SessionState::seed(config(4, 0.0, 0.0), Reading::new(45.0, 21.0), sink)
    }

    #[test]
    fn change_gate_is_exact_inequality() {
        assert!(!should_publish(21.0, 21.0));
        assert!(should_publish(21.0, 22.0));
        // Any bit-different float publishes, even LSB jitter.
        assert!(should_publish(21.0, 21.0 + f64::EPSILON * 21.0));
    }

    #[test]
    fn seed_reports_both_properties_without_change_events() {
        let sink = Arc::new(RecordingSink::new());
        let state = seeded_state(sink.clone());

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.kind == EventKind::Seed));
        assert_eq!(events[0].property, PropertyName::Humidity);
        assert_eq!(events[0].value, 45.0);
        assert_eq!(events[1].property, PropertyName::Temperature);
        assert_eq!(events[1].value, 21.0);

        assert_eq!(state.humidity.last_value, 45.0);
        assert_eq!(state.temperature.last_value, 21.0);
    }

    #[test]
    fn identical_reading_publishes_nothing() {
        let sink = Arc::new(RecordingSink::new());
        let mut state = seeded_state(sink.clone());

        state.apply(Reading::new(45.0, 21.0));
        state.apply(Reading::new(45.0, 21.0));

        assert!(sink.changes().is_empty());
    }

    #[test]
    fn changed_property_publishes_exactly_once() {
        let sink = Arc::new(RecordingSink::new());
        let mut state = seeded_state(sink.clone());

        state.apply(Reading::new(45.0, 22.0));

        let changes = sink.changes();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].property, PropertyName::Temperature);
        assert_eq!(changes[0].value, 22.0);
        assert_eq!(state.temperature.last_value, 22.0);
        assert_eq!(state.humidity.last_value, 45.0);
    }

    #[test]
    fn both_properties_publish_independently() {
        let sink = Arc::new(RecordingSink::new());
        let mut state = seeded_state(sink.clone());

        state.apply(Reading::new(46.5, 20.0));

        let changes = sink.changes();
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].property, PropertyName::Humidity);
        assert_eq!(changes[0].value, 46.5);
        assert_eq!(changes[1].property, PropertyName::Temperature);
        assert_eq!(changes[1].value, 20.0);
    }

    #[tokio::test]
    async fn spawn_fails_when_seed_read_fails() {
        let reader = Arc::new(ScriptedReader::new([None]));
        let sink = Arc::new(RecordingSink::new());

        let result = DeviceSession::spawn(config(4, 0.0, 0.0), INTERVAL, reader, sink.clone()).await;

        assert!(matches!(result, Err(BridgeError::SensorRead { .. })));
        assert!(sink.events().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn polling_loop_detects_changes_and_survives_failures() {
        let reader = Arc::new(ScriptedReader::new([
            Some(Reading::new(45.0, 21.0)), // seed
            Some(Reading::new(45.0, 22.0)), // cycle 1: temperature change
            None,                           // cycle 2: read failure, cycle skipped
            Some(Reading::new(50.0, 22.0)), // cycle 3: humidity change
        ]));
        let sink = Arc::new(RecordingSink::new());

        let session =
            DeviceSession::spawn(config(4, 0.0, 0.0), INTERVAL, reader.clone(), sink.clone())
                .await
                .unwrap();
        assert_eq!(sink.events().len(), 2);

        // Cycle 1
        settle().await;
        tokio::time::advance(INTERVAL).await;
        settle().await;
        let changes = sink.changes();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].property, PropertyName::Temperature);
        assert_eq!(changes[0].value, 22.0);

        // Cycle 2: read failure, no state change, no notification
        tokio::time::advance(INTERVAL).await;
        settle().await;
        assert_eq!(sink.changes().len(), 1);

        // Cycle 3: loop kept running, state survived the failed cycle
        tokio::time::advance(INTERVAL).await;
        settle().await;
        let changes = sink.changes();
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[1].property, PropertyName::Humidity);
        assert_eq!(changes[1].value, 50.0);

        session.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn offsets_are_applied_before_change_detection() {
        let reader = Arc::new(ScriptedReader::new([
            Some(Reading::new(50.0, 20.0)), // seed -> calibrated 52.0 / 19.0
            Some(Reading::new(50.0, 20.0)), // same raw value: no change
            Some(Reading::new(51.0, 20.0)), // humidity raw change -> calibrated 53.0
        ]));
        let sink = Arc::new(RecordingSink::new());

        let session =
            DeviceSession::spawn(config(4, -1.0, 2.0), INTERVAL, reader, sink.clone())
                .await
                .unwrap();

        let seeds = sink.events();
        assert_eq!(seeds[0].value, 52.0);
        assert_eq!(seeds[1].value, 19.0);

        settle().await;
        tokio::time::advance(INTERVAL).await;
        settle().await;
        assert!(sink.changes().is_empty());

        tokio::time::advance(INTERVAL).await;
        settle().await;
        let changes = sink.changes();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].property, PropertyName::Humidity);
        assert_eq!(changes[0].value, 53.0);

        session.abort();
    }
}
