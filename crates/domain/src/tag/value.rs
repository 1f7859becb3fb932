use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::TagQuality;

/// Latest known state of one tag.
///
/// Value, quality and timestamp always come from the same update.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TagValue {
    /// Engineering value, `None` when unavailable
    pub value: Option<f64>,
    /// Quality of the latest operation
    pub quality: TagQuality,
    /// When the update was accepted
    pub timestamp: DateTime<Utc>,
}

impl TagValue {
    pub fn new(value: Option<f64>, quality: TagQuality, timestamp: DateTime<Utc>) -> Self {
        Self {
            value,
            quality,
            timestamp,
        }
    }

    pub fn good(value: f64, timestamp: DateTime<Utc>) -> Self {
        Self::new(Some(value), TagQuality::Good, timestamp)
    }

    pub fn bad(timestamp: DateTime<Utc>) -> Self {
        Self::new(None, TagQuality::Bad, timestamp)
    }
}

/// Point-in-time copy of the whole tag table, ordered by tag name
pub type Snapshot = BTreeMap<String, TagValue>;
