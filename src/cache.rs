//! Single-slot item cache with a time-to-live.

use crate::model::SearchItem;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch.
    fn now_ms(&self) -> u64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

struct CacheSlot {
    items: Arc<Vec<SearchItem>>,
    timestamp: u64,
}

pub struct ItemCache {
    slot: Option<CacheSlot>,
    ttl: Duration,
    clock: Box<dyn Clock>,
}

impl ItemCache {
    pub fn new(ttl: Duration, clock: Box<dyn Clock>) -> Self {
        Self {
            slot: None,
            ttl,
            clock,
        }
    }

    pub fn set_ttl(&mut self, ttl: Duration) {
        self.ttl = ttl;
    }

    pub fn set_clock(&mut self, clock: Box<dyn Clock>) {
        self.clock = clock;
    }

    pub fn is_expired(&self) -> bool {
        match &self.slot {
            None => true,
            Some(slot) => {
                let age = self.clock.now_ms().saturating_sub(slot.timestamp);
                u128::from(age) >= self.ttl.as_millis()
            }
        }
    }

    /// The cached items if still fresh.
    pub fn get(&self) -> Option<Arc<Vec<SearchItem>>> {
        if self.is_expired() {
            return None;
        }
        self.slot.as_ref().map(|slot| Arc::clone(&slot.items))
    }

    pub fn store(&mut self, items: Vec<SearchItem>) -> Arc<Vec<SearchItem>> {
        let items = Arc::new(items);
        self.slot = Some(CacheSlot {
            items: Arc::clone(&items),
            timestamp: self.clock.now_ms(),
        });
        items
    }

    pub fn invalidate(&mut self) {
        self.slot = None;
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::Clock;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    /// Clock that only moves when told to.
    #[derive(Clone, Default)]
    pub struct ManualClock(Arc<AtomicU64>);

    impl ManualClock {
        pub fn at(ms: u64) -> Self {
            Self(Arc::new(AtomicU64::new(ms)))
        }

        pub fn set(&self, ms: u64) {
            self.0.store(ms, Ordering::SeqCst);
        }
    }

    impl Clock for ManualClock {
        fn now_ms(&self) -> u64 {
            self.0.load(Ordering::SeqCst)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::ManualClock;
    use super::*;

    #[test]
    fn fresh_until_ttl_elapses() {
        let clock = ManualClock::at(1_000);
        let mut cache = ItemCache::new(Duration::from_millis(100), Box::new(clock.clone()));
        assert!(cache.get().is_none());

        let stored = cache.store(Vec::new());
        clock.set(1_099);
        let hit = cache.get().unwrap();
        assert!(Arc::ptr_eq(&stored, &hit));

        clock.set(1_100);
        assert!(cache.is_expired());
        assert!(cache.get().is_none());
    }

    #[test]
    fn invalidate_clears_regardless_of_age() {
        let clock = ManualClock::at(0);
        let mut cache = ItemCache::new(Duration::from_secs(60), Box::new(clock));
        cache.store(Vec::new());
        assert!(cache.get().is_some());
        cache.invalidate();
        assert!(cache.get().is_none());
    }
}
