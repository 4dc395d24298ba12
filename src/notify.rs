//! Change notification boundary between sessions and the gateway.
//!
//! Sessions report value changes through the [`NotificationSink`]
//! trait; the gateway integration decides what to do with them. The
//! in-tree [`ChannelSink`] forwards events over an mpsc channel so the
//! hosting runtime can consume them wherever it likes.

use crate::config::Pin;
use std::fmt;
use tokio::sync::mpsc;

/// The two measurements a DHT22 exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyName {
    Temperature,
    Humidity,
}

impl PropertyName {
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyName::Temperature => "temperature",
            PropertyName::Humidity => "humidity",
        }
    }

    /// Unit reported to the gateway's property schema.
    pub fn unit(&self) -> &'static str {
        match self {
            PropertyName::Temperature => "degree celsius",
            PropertyName::Humidity => "percent",
        }
    }
}

impl fmt::Display for PropertyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether an event seeds a starting value or reports a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Initial value at session creation. Not a change notification.
    Seed,
    /// The calibrated value differs from the last published one.
    Change,
}

/// One outbound notification from a session.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyEvent {
    pub pin: Pin,
    pub property: PropertyName,
    pub value: f64,
    pub kind: EventKind,
}

/// Sink for session notifications, implemented by the gateway side.
///
/// `seeded` is called once per property when a session starts;
/// `changed` fires only when the change gate passes. Both are called
/// from the session's own task, never concurrently for one session.
pub trait NotificationSink: Send + Sync {
    fn seeded(&self, pin: &Pin, property: PropertyName, value: f64);
    fn changed(&self, pin: &Pin, property: PropertyName, value: f64);
}

/// Sink that forwards every event over an unbounded mpsc channel.
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<PropertyEvent>,
}

impl ChannelSink {
    /// Create a sink plus the receiving half for the gateway consumer.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<PropertyEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn send(&self, pin: &Pin, property: PropertyName, value: f64, kind: EventKind) {
        // A dropped receiver just means nobody is listening anymore.
        let _ = self.tx.send(PropertyEvent {
            pin: pin.clone(),
            property,
            value,
            kind,
        });
    }
}

impl NotificationSink for ChannelSink {
    fn seeded(&self, pin: &Pin, property: PropertyName, value: f64) {
        self.send(pin, property, value, EventKind::Seed);
    }

    fn changed(&self, pin: &Pin, property: PropertyName, value: f64) {
        self.send(pin, property, value, EventKind::Change);
    }
}

/// Test sink that records every event it receives.
#[cfg(test)]
pub(crate) struct RecordingSink {
    events: parking_lot::Mutex<Vec<PropertyEvent>>,
}

#[cfg(test)]
impl RecordingSink {
    pub(crate) fn new() -> Self {
        Self {
            events: parking_lot::Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn events(&self) -> Vec<PropertyEvent> {
        self.events.lock().clone()
    }

    pub(crate) fn changes(&self) -> Vec<PropertyEvent> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.kind == EventKind::Change)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
impl NotificationSink for RecordingSink {
    fn seeded(&self, pin: &Pin, property: PropertyName, value: f64) {
        self.events.lock().push(PropertyEvent {
            pin: pin.clone(),
            property,
            value,
            kind: EventKind::Seed,
        });
    }

    fn changed(&self, pin: &Pin, property: PropertyName, value: f64) {
        self.events.lock().push(PropertyEvent {
            pin: pin.clone(),
            property,
            value,
            kind: EventKind::Change,
        });
    }
}
