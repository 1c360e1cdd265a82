//! In-memory meeting used by the replay driver and the tests.
//!
//! Applies every command to its own participant table and records it, so
//! the engine can run without a real meeting application behind it.

use crate::control::{EmailSender, MeetingControl};
use crate::engine::MeetingEvent;
use crate::error::{ControlError, EmailError};
use crate::state::{Participant, ParticipantId, ParticipantStatus, Recipient, Role};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;

/// A command the engine sent to the meeting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Admit(ParticipantId),
    Promote(ParticipantId, Role),
    Demote(ParticipantId),
    Mute(ParticipantId),
    Unmute(ParticipantId),
    Expel(ParticipantId),
    PutInWaitingRoom(ParticipantId),
    Rename(ParticipantId, String),
    Chat(Recipient, String),
    Lock(bool),
    AllowUnmuteSelf(bool),
    ReclaimHost,
    Leave { end_for_all: bool },
}

impl Action {
    /// Short name, also used to inject failures.
    pub fn kind(&self) -> &'static str {
        match self {
            Action::Admit(_) => "admit",
            Action::Promote(..) => "promote",
            Action::Demote(_) => "demote",
            Action::Mute(_) => "mute",
            Action::Unmute(_) => "unmute",
            Action::Expel(_) => "expel",
            Action::PutInWaitingRoom(_) => "waiting_room",
            Action::Rename(..) => "rename",
            Action::Chat(..) => "chat",
            Action::Lock(_) => "lock",
            Action::AllowUnmuteSelf(_) => "allow_unmute_self",
            Action::ReclaimHost => "reclaim_host",
            Action::Leave { .. } => "leave",
        }
    }
}

/// Meeting state kept entirely in memory.
#[derive(Debug)]
pub struct InMemoryMeeting {
    participants: Mutex<Vec<Participant>>,
    actions: Mutex<Vec<Action>>,
    failing: Mutex<HashSet<&'static str>>,
}

impl InMemoryMeeting {
    /// Start a meeting containing only the bot.
    pub fn new(mut me: Participant) -> Self {
        me.is_self = true;
        Self {
            participants: Mutex::new(vec![me]),
            actions: Mutex::new(Vec::new()),
            failing: Mutex::new(HashSet::new()),
        }
    }

    /// Add or replace a participant, keeping join order.
    pub fn upsert(&self, participant: Participant) {
        let mut list = self.participants.lock();
        match list.iter_mut().find(|p| p.id == participant.id) {
            Some(existing) => *existing = participant,
            None => list.push(participant),
        }
    }

    pub fn get(&self, id: ParticipantId) -> Option<Participant> {
        self.participants.lock().iter().find(|p| p.id == id).cloned()
    }

    /// Mirror a participant event into the table.
    pub fn apply_event(&self, event: &MeetingEvent) {
        match event {
            MeetingEvent::ParticipantJoinWaitingRoom { participant } => {
                let mut p = participant.clone();
                p.status = ParticipantStatus::WaitingRoom;
                p.waiting_since.get_or_insert_with(Utc::now);
                self.upsert(p);
            }
            MeetingEvent::ParticipantJoinMeeting { participant } => {
                let mut p = participant.clone();
                p.status = ParticipantStatus::Attending;
                self.upsert(p);
            }
            MeetingEvent::ParticipantLeaveWaitingRoom { participant }
            | MeetingEvent::ParticipantLeaveMeeting { participant } => {
                self.participants.lock().retain(|p| p.id != participant.id);
            }
            _ => {}
        }
    }

    /// Make every future command of `kind` fail.
    pub fn fail(&self, kind: &'static str) {
        self.failing.lock().insert(kind);
    }

    pub fn recover(&self, kind: &'static str) {
        self.failing.lock().remove(kind);
    }

    /// Every command received so far, failed ones included.
    pub fn actions(&self) -> Vec<Action> {
        self.actions.lock().clone()
    }

    pub fn take_actions(&self) -> Vec<Action> {
        std::mem::take(&mut *self.actions.lock())
    }

    /// Chat texts sent to `to`.
    pub fn chats_to(&self, to: Recipient) -> Vec<String> {
        self.actions
            .lock()
            .iter()
            .filter_map(|a| match a {
                Action::Chat(r, text) if *r == to => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    fn record(&self, action: Action) -> Result<(), ControlError> {
        let kind = action.kind();
        info!(action = ?action, "Meeting command");
        self.actions.lock().push(action);
        if self.failing.lock().contains(kind) {
            return Err(ControlError::Refused {
                action: kind,
                reason: "simulated failure".to_string(),
            });
        }
        Ok(())
    }

    fn update(
        &self,
        id: ParticipantId,
        f: impl FnOnce(&mut Participant),
    ) -> Result<(), ControlError> {
        let mut list = self.participants.lock();
        let p = list
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(ControlError::NoSuchParticipant(id))?;
        f(p);
        Ok(())
    }

    fn update_me(&self, f: impl FnOnce(&mut Participant)) -> Result<(), ControlError> {
        let mut list = self.participants.lock();
        let me = list
            .iter_mut()
            .find(|p| p.is_self)
            .ok_or_else(|| ControlError::Unavailable("bot is not in the meeting".to_string()))?;
        f(me);
        Ok(())
    }
}

#[async_trait]
impl MeetingControl for InMemoryMeeting {
    async fn participants(&self) -> Result<Vec<Participant>, ControlError> {
        Ok(self.participants.lock().clone())
    }

    async fn participant(&self, id: ParticipantId) -> Result<Option<Participant>, ControlError> {
        Ok(self.get(id))
    }

    async fn me(&self) -> Result<Participant, ControlError> {
        self.participants
            .lock()
            .iter()
            .find(|p| p.is_self)
            .cloned()
            .ok_or_else(|| ControlError::Unavailable("bot is not in the meeting".to_string()))
    }

    async fn admit(&self, id: ParticipantId) -> Result<(), ControlError> {
        self.record(Action::Admit(id))?;
        self.update(id, |p| {
            p.status = ParticipantStatus::Attending;
            p.waiting_since = None;
        })
    }

    async fn promote(&self, id: ParticipantId, role: Role) -> Result<(), ControlError> {
        self.record(Action::Promote(id, role))?;
        match role {
            Role::CoHost => self.update(id, |p| p.is_cohost = true),
            Role::Host => {
                self.update(id, |p| p.is_host = true)?;
                self.update_me(|me| me.is_host = false)
            }
        }
    }

    async fn demote(&self, id: ParticipantId) -> Result<(), ControlError> {
        self.record(Action::Demote(id))?;
        self.update(id, |p| p.is_cohost = false)
    }

    async fn mute(&self, id: ParticipantId) -> Result<(), ControlError> {
        self.record(Action::Mute(id))?;
        self.update(id, |p| p.audio_muted = true)
    }

    async fn unmute(&self, id: ParticipantId) -> Result<(), ControlError> {
        self.record(Action::Unmute(id))?;
        self.update(id, |p| p.audio_muted = false)
    }

    async fn expel(&self, id: ParticipantId) -> Result<(), ControlError> {
        self.record(Action::Expel(id))?;
        let mut list = self.participants.lock();
        let before = list.len();
        list.retain(|p| p.id != id);
        if list.len() == before {
            return Err(ControlError::NoSuchParticipant(id));
        }
        Ok(())
    }

    async fn put_in_waiting_room(&self, id: ParticipantId) -> Result<(), ControlError> {
        self.record(Action::PutInWaitingRoom(id))?;
        self.update(id, |p| {
            p.status = ParticipantStatus::WaitingRoom;
            p.is_cohost = false;
            p.waiting_since = Some(Utc::now());
        })
    }

    async fn rename(&self, id: ParticipantId, new_name: &str) -> Result<(), ControlError> {
        self.record(Action::Rename(id, new_name.to_string()))?;
        self.update(id, |p| p.name = new_name.to_string())
    }

    async fn send_chat(&self, to: Recipient, text: &str) -> Result<(), ControlError> {
        self.record(Action::Chat(to, text.to_string()))
    }

    async fn lock_meeting(&self, locked: bool) -> Result<(), ControlError> {
        self.record(Action::Lock(locked))
    }

    async fn set_allow_unmute_self(&self, allowed: bool) -> Result<(), ControlError> {
        self.record(Action::AllowUnmuteSelf(allowed))
    }

    async fn reclaim_host(&self) -> Result<(), ControlError> {
        self.record(Action::ReclaimHost)?;
        self.update_me(|me| me.is_host = true)
    }

    async fn leave(&self, end_for_all: bool) -> Result<(), ControlError> {
        self.record(Action::Leave { end_for_all })?;
        self.update_me(|me| me.status = ParticipantStatus::Left)
    }
}

/// A sent email, as recorded by [`Outbox`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Email sender that logs and keeps every message instead of delivering it.
#[derive(Debug, Default)]
pub struct Outbox {
    sent: Mutex<Vec<SentEmail>>,
    offline: AtomicBool,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make delivery fail until called again with `false`.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl EmailSender for Outbox {
    async fn send(&self, subject: &str, body: &str, to: &str) -> Result<(), EmailError> {
        let Some((user, domain)) = to.split_once('@') else {
            return Err(EmailError::InvalidAddress(to.to_string()));
        };
        if user.is_empty() || domain.is_empty() {
            return Err(EmailError::InvalidAddress(to.to_string()));
        }
        if self.offline.load(Ordering::SeqCst) {
            return Err(EmailError::Delivery("outbox is offline".to_string()));
        }

        info!(to = %to, subject = %subject, "Email queued");
        self.sent.lock().push(SentEmail {
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}
