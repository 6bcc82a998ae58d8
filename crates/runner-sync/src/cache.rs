use std::time::{Duration, Instant};

use crate::model::{PlayerRecord, StageFlags};

struct Entry<T> {
    value: T,
    fetched_at: Instant,
}

impl<T: Clone> Entry<T> {
    fn fresh(&self, ttl: Duration) -> Option<T> {
        (self.fetched_at.elapsed() < ttl).then(|| self.value.clone())
    }
}

/// Short-lived cache over the connected player's reads.
///
/// Only complete answers are stored: failed player reads and flag sets with
/// unresolved entries go straight back to the ledger next time.
pub struct ReadCache {
    ttl: Duration,
    player: Option<Entry<PlayerRecord>>,
    flags: Option<Entry<StageFlags>>,
}

impl ReadCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            player: None,
            flags: None,
        }
    }

    pub fn player(&self) -> Option<PlayerRecord> {
        self.player.as_ref().and_then(|e| e.fresh(self.ttl))
    }

    pub fn flags(&self) -> Option<StageFlags> {
        self.flags.as_ref().and_then(|e| e.fresh(self.ttl))
    }

    pub fn store_player(&mut self, value: PlayerRecord) {
        self.player = Some(Entry {
            value,
            fetched_at: Instant::now(),
        });
    }

    pub fn store_flags(&mut self, value: StageFlags) {
        if !value.is_settled() {
            return;
        }
        self.flags = Some(Entry {
            value,
            fetched_at: Instant::now(),
        });
    }

    /// Drop everything. Called after every confirmed write.
    pub fn invalidate(&mut self) {
        self.player = None;
        self.flags = None;
    }
}
