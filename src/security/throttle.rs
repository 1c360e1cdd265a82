//! Broadcast guard windows and log-once bookkeeping.

use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Why a broadcast was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardBlock {
    /// Guard is negative and the broadcast already went out once.
    AlreadySent,
    /// Still inside the cooldown window.
    Cooldown,
}

/// Last-sent times per broadcast name.
///
/// A guard below zero allows one send per session, zero never blocks,
/// and a positive guard blocks while `now <= last_sent + guard`.
#[derive(Debug, Default)]
pub struct BroadcastThrottle {
    sent: HashMap<String, DateTime<Utc>>,
}

impl BroadcastThrottle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide and record in one step.
    ///
    /// On success the previous timestamp is returned so a failed send can
    /// be undone with [`restore`](Self::restore).
    pub fn try_send(
        &mut self,
        name: &str,
        guard_secs: i64,
        now: DateTime<Utc>,
    ) -> Result<Option<DateTime<Utc>>, GuardBlock> {
        if let Some(&last) = self.sent.get(name) {
            if guard_secs < 0 {
                debug!(broadcast = %name, "broadcast already sent once");
                return Err(GuardBlock::AlreadySent);
            }
            if guard_secs > 0 && in_window(last, guard_secs, now) {
                debug!(broadcast = %name, "broadcast inside guard window");
                return Err(GuardBlock::Cooldown);
            }
        }
        Ok(self.sent.insert(name.to_string(), now))
    }

    /// Put back the timestamp that [`try_send`](Self::try_send) replaced.
    pub fn restore(&mut self, name: &str, previous: Option<DateTime<Utc>>) {
        match previous {
            Some(at) => {
                self.sent.insert(name.to_string(), at);
            }
            None => {
                self.sent.remove(name);
            }
        }
    }

    pub fn last_sent(&self, name: &str) -> Option<DateTime<Utc>> {
        self.sent.get(name).copied()
    }
}

/// Whether `now` is at or before `last + guard_secs`. A window end past
/// the representable range never closes.
fn in_window(last: DateTime<Utc>, guard_secs: i64, now: DateTime<Utc>) -> bool {
    Duration::try_seconds(guard_secs)
        .and_then(|guard| last.checked_add_signed(guard))
        .is_none_or(|end| now <= end)
}

/// Remembers which messages were already logged or sent.
#[derive(Debug, Default)]
pub struct NoticeLog {
    seen: HashSet<String>,
}

impl NoticeLog {
    /// `true` the first time `key` is seen.
    pub fn first(&mut self, key: &str) -> bool {
        if self.seen.contains(key) {
            return false;
        }
        self.seen.insert(key.to_string())
    }

    /// Forget `key` so it can fire again.
    pub fn clear(&mut self, key: &str) {
        self.seen.remove(key);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.seen.contains(key)
    }
}
