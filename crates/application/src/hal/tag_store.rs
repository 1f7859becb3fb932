use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{Duration, Utc};
use domain::tag::{Snapshot, TagQuality, TagValue};

/// Live table of the latest value per tag.
///
/// Every access copies in or out under one lock that is never held across
/// an `.await`, so bus latency never extends the hold time.
#[derive(Debug, Default)]
pub struct TagStore {
    values: Mutex<HashMap<String, TagValue>>,
}

impl TagStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, TagValue>> {
        self.values.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Overwrite the entry for `tag` as one unit.
    ///
    /// The timestamp strictly increases per tag: when the clock has not
    /// moved past the previous update, it is bumped one microsecond.
    pub fn record(&self, tag: &str, value: Option<f64>, quality: TagQuality) -> TagValue {
        let mut values = self.lock();
        let now = Utc::now();
        let timestamp = match values.get(tag) {
            Some(previous) if now <= previous.timestamp => {
                previous.timestamp + Duration::microseconds(1)
            }
            _ => now,
        };
        let entry = TagValue::new(value, quality, timestamp);
        values.insert(tag.to_string(), entry);
        entry
    }

    pub fn record_good(&self, tag: &str, value: f64) -> TagValue {
        self.record(tag, Some(value), TagQuality::Good)
    }

    pub fn record_bad(&self, tag: &str) -> TagValue {
        self.record(tag, None, TagQuality::Bad)
    }

    pub fn get(&self, tag: &str) -> Option<TagValue> {
        self.lock().get(tag).copied()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.lock()
            .iter()
            .map(|(name, value)| (name.clone(), *value))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_entries_created_lazily() {
        let store = TagStore::new();
        assert!(store.is_empty());
        assert_eq!(store.get("P1"), None);

        store.record_good("P1", 1.5);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("P1").unwrap().value, Some(1.5));
    }

    #[test]
    fn test_bad_update_clears_value() {
        let store = TagStore::new();
        store.record_good("P1", 1.5);
        let bad = store.record_bad("P1");

        assert_eq!(bad.value, None);
        assert_eq!(bad.quality, TagQuality::Bad);
        assert_eq!(store.get("P1"), Some(bad));
    }

    #[test]
    fn test_timestamps_strictly_increase() {
        let store = TagStore::new();
        let mut last = store.record_good("P1", 0.0).timestamp;
        for i in 1..1000 {
            let next = store.record_good("P1", f64::from(i)).timestamp;
            assert!(next > last);
            last = next;
        }
    }

    #[test]
    fn test_snapshot_is_a_detached_copy() {
        let store = TagStore::new();
        store.record_good("P1", 1.0);
        let snapshot = store.snapshot();

        store.record_good("P1", 2.0);
        store.record_good("P2", 3.0);

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot["P1"].value, Some(1.0));
    }

    #[test]
    fn test_no_torn_triples_under_concurrent_updates() {
        // Good entries always carry a value, bad ones never do
        let store = Arc::new(TagStore::new());
        let writers: Vec<_> = (0..4)
            .map(|n| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for i in 0..2000 {
                        if (i + n) % 2 == 0 {
                            store.record_good("shared", f64::from(i));
                        } else {
                            store.record_bad("shared");
                        }
                    }
                })
            })
            .collect();

        for _ in 0..2000 {
            for value in store.snapshot().values() {
                match value.quality {
                    TagQuality::Good => assert!(value.value.is_some()),
                    TagQuality::Bad => assert!(value.value.is_none()),
                    TagQuality::Unknown => unreachable!(),
                }
            }
        }
        for writer in writers {
            writer.join().unwrap();
        }
    }
}
