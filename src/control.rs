//! Collaborator seams.
//!
//! The engine never touches the meeting, audio or mail directly. It talks
//! to these traits, and the embedding application supplies the
//! implementations.

use crate::error::{ControlError, EmailError};
use crate::state::names::collapse_whitespace;
use crate::state::{Participant, ParticipantId, ParticipantStatus, Recipient, Role};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;

/// Commands and lookups offered by the meeting application.
///
/// Implementations are the only writers of participant state.
#[async_trait]
pub trait MeetingControl: Send + Sync {
    /// Every participant currently known, attending or waiting.
    async fn participants(&self) -> Result<Vec<Participant>, ControlError>;

    /// Look up one participant by id.
    async fn participant(&self, id: ParticipantId) -> Result<Option<Participant>, ControlError>;

    /// Exact-name lookup. Whitespace runs are collapsed; case matters.
    async fn participants_named(&self, name: &str) -> Result<Vec<Participant>, ControlError> {
        let wanted = collapse_whitespace(name);
        Ok(self
            .participants()
            .await?
            .into_iter()
            .filter(|p| p.status != ParticipantStatus::Left)
            .filter(|p| collapse_whitespace(&p.name) == wanted)
            .collect())
    }

    /// The bot's own participant entry.
    async fn me(&self) -> Result<Participant, ControlError>;

    async fn admit(&self, id: ParticipantId) -> Result<(), ControlError>;
    async fn promote(&self, id: ParticipantId, role: Role) -> Result<(), ControlError>;
    async fn demote(&self, id: ParticipantId) -> Result<(), ControlError>;
    async fn mute(&self, id: ParticipantId) -> Result<(), ControlError>;
    async fn unmute(&self, id: ParticipantId) -> Result<(), ControlError>;
    async fn expel(&self, id: ParticipantId) -> Result<(), ControlError>;
    async fn put_in_waiting_room(&self, id: ParticipantId) -> Result<(), ControlError>;
    async fn rename(&self, id: ParticipantId, new_name: &str) -> Result<(), ControlError>;

    async fn send_chat(&self, to: Recipient, text: &str) -> Result<(), ControlError>;

    async fn lock_meeting(&self, locked: bool) -> Result<(), ControlError>;
    async fn set_allow_unmute_self(&self, allowed: bool) -> Result<(), ControlError>;

    /// Take the host role back, e.g. after the meeting owner left.
    async fn reclaim_host(&self) -> Result<(), ControlError>;

    /// Leave the meeting, optionally ending it for everyone.
    async fn leave(&self, end_for_all: bool) -> Result<(), ControlError>;
}

/// Fire-and-forget audio output.
pub trait SoundSink: Send + Sync {
    fn speak(&self, text: &str);
    fn play(&self, sound: &str);
    /// Items queued but not yet played.
    fn pending(&self) -> usize;
}

/// Outbound email.
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, subject: &str, body: &str, to: &str) -> Result<(), EmailError>;
}

/// Wall-clock source.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock() += by;
    }

    pub fn set(&self, at: DateTime<Utc>) {
        *self.now.lock() = at;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_manual_clock_advances() {
        let start = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let clock = ManualClock::new(start);
        clock.advance(Duration::seconds(90));
        assert_eq!(clock.now(), start + Duration::seconds(90));
    }
}
