//! Merge idempotency ledger.
//!
//! After a session merges, its directory is gone; a repeated merge call
//! would otherwise be indistinguishable from a session that never existed.
//! The ledger keeps a short-lived tombstone per merged session so the two
//! cases can be told apart. It is explicit, injected state with a bounded
//! TTL, never a hidden process-wide map.

use dashmap::DashMap;
use pressroom_core::SessionId;
use std::sync::Arc;
use time::{Duration, OffsetDateTime};

/// A source of time, injectable so tests can drive TTL expiry.
pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;
}

/// Wall-clock time.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// TTL-bounded record of successfully merged sessions.
pub struct MergeLedger {
    tombstones: DashMap<String, OffsetDateTime>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl MergeLedger {
    /// Create a ledger with the given tombstone TTL.
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            tombstones: DashMap::new(),
            ttl,
            clock,
        }
    }

    /// Record that a session merged successfully.
    pub fn record(&self, session: &SessionId) {
        self.tombstones
            .insert(session.as_str().to_string(), self.clock.now());
        self.purge_expired();
    }

    /// Whether a session merged within the TTL window.
    pub fn was_merged(&self, session: &SessionId) -> bool {
        match self.tombstones.get(session.as_str()) {
            Some(entry) => self.clock.now() - *entry.value() <= self.ttl,
            None => false,
        }
    }

    /// Drop tombstones older than the TTL.
    pub fn purge_expired(&self) {
        let now = self.clock.now();
        let ttl = self.ttl;
        self.tombstones.retain(|_, merged_at| now - *merged_at <= ttl);
    }

    /// Number of live tombstones.
    pub fn len(&self) -> usize {
        self.tombstones.len()
    }

    /// Whether the ledger holds no tombstones.
    pub fn is_empty(&self) -> bool {
        self.tombstones.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Manually advanced clock.
    struct FakeClock(Mutex<OffsetDateTime>);

    impl FakeClock {
        fn new() -> Arc<Self> {
            Arc::new(Self(Mutex::new(OffsetDateTime::UNIX_EPOCH)))
        }

        fn advance(&self, by: Duration) {
            let mut now = self.0.lock().unwrap();
            *now += by;
        }
    }

    impl Clock for FakeClock {
        fn now(&self) -> OffsetDateTime {
            *self.0.lock().unwrap()
        }
    }

    #[test]
    fn test_tombstone_lives_within_ttl() {
        let clock = FakeClock::new();
        let ledger = MergeLedger::new(Duration::minutes(15), clock.clone());
        let id = SessionId::generate();

        assert!(!ledger.was_merged(&id));
        ledger.record(&id);
        assert!(ledger.was_merged(&id));

        clock.advance(Duration::minutes(14));
        assert!(ledger.was_merged(&id));
    }

    #[test]
    fn test_tombstone_expires_after_ttl() {
        let clock = FakeClock::new();
        let ledger = MergeLedger::new(Duration::minutes(15), clock.clone());
        let id = SessionId::generate();

        ledger.record(&id);
        clock.advance(Duration::minutes(16));
        assert!(!ledger.was_merged(&id));

        ledger.purge_expired();
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_record_purges_expired_entries() {
        let clock = FakeClock::new();
        let ledger = MergeLedger::new(Duration::minutes(15), clock.clone());
        let old = SessionId::generate();

        ledger.record(&old);
        clock.advance(Duration::minutes(30));
        ledger.record(&SessionId::generate());
        assert_eq!(ledger.len(), 1);
    }
}
