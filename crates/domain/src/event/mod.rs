use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

mod publisher;
pub use publisher::EventPublisher;

/// Why a write command never reached a device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DropReason {
    /// No tag with that name is configured
    UnknownTag,
    /// The tag has no device behind it
    Unbound,
    /// The bound device has no writable capability
    NotWritable,
}

impl DropReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnknownTag => "unknown tag",
            Self::Unbound => "unbound tag",
            Self::NotWritable => "device not writable",
        }
    }
}

/// Events the HAL reports to its telemetry sink
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum HalEvent {
    /// Result of opening a bus at start-up
    BusOpened {
        bus: String,
        port: String,
        connected: bool,
        timestamp: DateTime<Utc>,
    },

    /// Bus released at shutdown
    BusClosed {
        bus: String,
        timestamp: DateTime<Utc>,
    },

    /// A poll read left the tag unavailable
    ReadFailed {
        tag: String,
        device: String,
        timestamp: DateTime<Utc>,
    },

    /// A dispatched write was rejected by the device or bus
    WriteFailed {
        tag: String,
        device: String,
        value: f64,
        timestamp: DateTime<Utc>,
    },

    /// A write command was discarded without touching a device
    WriteDropped {
        tag: String,
        value: f64,
        reason: DropReason,
        timestamp: DateTime<Utc>,
    },
}

impl HalEvent {
    pub fn bus_opened(bus: impl Into<String>, port: impl Into<String>, connected: bool) -> Self {
        Self::BusOpened {
            bus: bus.into(),
            port: port.into(),
            connected,
            timestamp: Utc::now(),
        }
    }

    pub fn bus_closed(bus: impl Into<String>) -> Self {
        Self::BusClosed {
            bus: bus.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn read_failed(tag: impl Into<String>, device: impl Into<String>) -> Self {
        Self::ReadFailed {
            tag: tag.into(),
            device: device.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn write_failed(tag: impl Into<String>, device: impl Into<String>, value: f64) -> Self {
        Self::WriteFailed {
            tag: tag.into(),
            device: device.into(),
            value,
            timestamp: Utc::now(),
        }
    }

    pub fn write_dropped(tag: impl Into<String>, value: f64, reason: DropReason) -> Self {
        Self::WriteDropped {
            tag: tag.into(),
            value,
            reason,
            timestamp: Utc::now(),
        }
    }
}
