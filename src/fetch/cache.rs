// src/fetch/cache.rs
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::debug;

use crate::workbook::RawSheet;

/// Time source for expiry checks. Injected so tests can step time
/// instead of sleeping.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// One worksheet of one source document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SheetKey {
    pub source: String,
    pub sheet: String,
}

struct CacheEntry {
    fetched_at: DateTime<Utc>,
    sheet: RawSheet,
}

/// TTL cache for fetched worksheets. Callers own an instance and pass
/// it where needed; there is deliberately no process-wide cache.
pub struct SheetCache {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<SheetKey, CacheEntry>>,
}

impl SheetCache {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Cached sheet for `key`. An entry older than the TTL is dropped
    /// and reported as a miss.
    pub fn get(&self, key: &SheetKey) -> Option<RawSheet> {
        let mut entries = self.entries.lock().unwrap();
        match entries.get(key) {
            Some(entry) => {
                let age = self.clock.now() - entry.fetched_at;
                if age < self.ttl {
                    Some(entry.sheet.clone())
                } else {
                    debug!(source = %key.source, sheet = %key.sheet, "cache entry expired");
                    entries.remove(key);
                    None
                }
            }
            None => None,
        }
    }

    pub fn insert(&self, key: SheetKey, sheet: RawSheet) {
        let entry = CacheEntry {
            fetched_at: self.clock.now(),
            sheet,
        };
        self.entries.lock().unwrap().insert(key, entry);
    }

    /// Forget one worksheet.
    pub fn invalidate(&self, key: &SheetKey) {
        if self.entries.lock().unwrap().remove(key).is_some() {
            debug!(source = %key.source, sheet = %key.sheet, "cache entry invalidated");
        }
    }

    /// Forget everything.
    pub fn invalidate_all(&self) {
        self.entries.lock().unwrap().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workbook::Cell;

    /// Manually advanced clock.
    struct StepClock {
        now: Mutex<DateTime<Utc>>,
    }

    impl StepClock {
        fn starting_at(now: DateTime<Utc>) -> Arc<Self> {
            Arc::new(Self {
                now: Mutex::new(now),
            })
        }

        fn advance(&self, by: Duration) {
            let mut now = self.now.lock().unwrap();
            *now = *now + by;
        }
    }

    impl Clock for StepClock {
        fn now(&self) -> DateTime<Utc> {
            *self.now.lock().unwrap()
        }
    }

    fn sample_sheet() -> RawSheet {
        RawSheet::new("2024", vec![vec![Cell::Text("Name".to_string())]])
    }

    fn key() -> SheetKey {
        SheetKey {
            source: "doc-key".to_string(),
            sheet: "2024".to_string(),
        }
    }

    #[test]
    fn fresh_entries_hit() {
        let cache = SheetCache::new(Duration::minutes(10));
        cache.insert(key(), sample_sheet());
        assert_eq!(cache.get(&key()), Some(sample_sheet()));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn entries_expire_at_the_ttl() {
        let clock = StepClock::starting_at(Utc::now());
        let cache = SheetCache::with_clock(Duration::minutes(10), clock.clone());
        cache.insert(key(), sample_sheet());

        clock.advance(Duration::minutes(9));
        assert!(cache.get(&key()).is_some());

        clock.advance(Duration::minutes(1));
        assert!(cache.get(&key()).is_none());
        // the expired entry is gone, not just hidden
        assert!(cache.is_empty());
    }

    #[test]
    fn invalidate_targets_a_single_key() {
        let cache = SheetCache::new(Duration::minutes(10));
        let other = SheetKey {
            source: "doc-key".to_string(),
            sheet: "2023".to_string(),
        };
        cache.insert(key(), sample_sheet());
        cache.insert(other.clone(), sample_sheet());

        cache.invalidate(&key());
        assert!(cache.get(&key()).is_none());
        assert!(cache.get(&other).is_some());
    }

    #[test]
    fn invalidate_all_clears_every_entry() {
        let cache = SheetCache::new(Duration::minutes(10));
        cache.insert(key(), sample_sheet());
        cache.invalidate_all();
        assert!(cache.is_empty());
    }
}
