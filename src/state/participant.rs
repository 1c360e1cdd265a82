//! Participant snapshots as reported by the meeting collaborator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable numeric id assigned by the meeting.
pub type ParticipantId = u64;

/// Where a participant currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantStatus {
    WaitingRoom,
    Attending,
    Left,
}

/// Read-only view of a meeting participant.
///
/// The engine never mutates these; every change goes through
/// [`MeetingControl`](crate::control::MeetingControl).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
    #[serde(default)]
    pub is_self: bool,
    #[serde(default)]
    pub is_host: bool,
    #[serde(default)]
    pub is_cohost: bool,
    pub status: ParticipantStatus,
    #[serde(default)]
    pub audio_muted: bool,
    #[serde(default)]
    pub video_on: bool,
    /// When the participant entered the waiting room, if known.
    #[serde(default)]
    pub waiting_since: Option<DateTime<Utc>>,
}

impl Participant {
    /// Build an attending participant with no roles.
    pub fn attending(id: ParticipantId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            is_self: false,
            is_host: false,
            is_cohost: false,
            status: ParticipantStatus::Attending,
            audio_muted: false,
            video_on: true,
            waiting_since: None,
        }
    }

    /// Build a participant sitting in the waiting room since `since`.
    pub fn waiting(id: ParticipantId, name: impl Into<String>, since: DateTime<Utc>) -> Self {
        Self {
            status: ParticipantStatus::WaitingRoom,
            waiting_since: Some(since),
            video_on: false,
            ..Self::attending(id, name)
        }
    }

    pub fn is_attending(&self) -> bool {
        self.status == ParticipantStatus::Attending
    }

    pub fn is_waiting(&self) -> bool {
        self.status == ParticipantStatus::WaitingRoom
    }

    /// Host or co-host in the meeting's own role model.
    pub fn is_privileged(&self) -> bool {
        self.is_host || self.is_cohost
    }

    /// Name as shown in listings, optionally suffixed with `#id`.
    pub fn label(&self, include_id: bool) -> String {
        if include_id {
            format!("{}#{}", self.name, self.id)
        } else {
            self.name.clone()
        }
    }
}

impl fmt::Display for Participant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Destination of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recipient {
    Participant(ParticipantId),
    EveryoneInMeeting,
    EveryoneInWaitingRoom,
}

/// Meeting role the engine can grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    CoHost,
    Host,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::CoHost => f.write_str("co-host"),
            Role::Host => f.write_str("host"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_with_and_without_id() {
        let p = Participant::attending(42, "Jane Doe");
        assert_eq!(p.label(false), "Jane Doe");
        assert_eq!(p.label(true), "Jane Doe#42");
        assert_eq!(p.to_string(), "Jane Doe");
    }

    #[test]
    fn test_deserialize_defaults() {
        let p: Participant =
            serde_json::from_str(r#"{"id": 7, "name": "Bob", "status": "waiting_room"}"#).unwrap();
        assert!(p.is_waiting());
        assert!(!p.is_privileged());
        assert!(p.waiting_since.is_none());
    }
}
