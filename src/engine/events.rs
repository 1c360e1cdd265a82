//! Event routing and conversational chat.

use super::commands::TrackKind;
use super::{Engine, Moderation};
use crate::state::{Participant, ParticipantId, ParticipantStatus, Recipient};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Something that happened in the meeting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum MeetingEvent {
    ParticipantJoinWaitingRoom { participant: Participant },
    ParticipantLeaveWaitingRoom { participant: Participant },
    ParticipantJoinMeeting { participant: Participant },
    ParticipantLeaveMeeting { participant: Participant },
    ChatMessageReceived(ChatMessage),
    /// Names of the participants currently talking.
    ActiveAudioChanged { participants: Vec<String> },
    /// Names of the participants with a raised hand.
    RaisedHandsChanged { participants: Vec<String> },
    Tick,
}

/// A chat message as the bot saw it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub from: Participant,
    /// Private recipient, if the message was not sent to everyone.
    #[serde(default)]
    pub to: Option<Participant>,
    pub text: String,
    #[serde(default)]
    pub is_to_everyone: bool,
}

impl Engine {
    /// Handle one event from the meeting.
    ///
    /// Waits for the moderation lock; only [`MeetingEvent::Tick`] may be
    /// dropped when the engine is busy.
    pub async fn handle_event(&self, event: MeetingEvent) {
        if event == MeetingEvent::Tick {
            self.tick().await;
            return;
        }
        if self.is_leaving() {
            debug!("Leaving the meeting; event ignored");
            return;
        }

        let mut st = self.state.lock().await;
        match event {
            MeetingEvent::ParticipantJoinWaitingRoom { participant } => {
                info!(participant = %participant, id = participant.id, "Joined the waiting room");
                if participants_enabled(&st) {
                    let now = self.clock.now();
                    self.admit_if_needed(&mut st, &participant, now).await;
                }
            }
            MeetingEvent::ParticipantLeaveWaitingRoom { participant } => {
                debug!(participant = %participant, "Left the waiting room");
            }
            MeetingEvent::ParticipantJoinMeeting { participant } => {
                info!(participant = %participant, id = participant.id, "Joined the meeting");
                if participants_enabled(&st) {
                    let bot_privileged = match self.control.me().await {
                        Ok(me) => me.is_privileged(),
                        Err(e) => {
                            warn!(error = %e, "Cannot look up the bot's own role");
                            false
                        }
                    };
                    self.promote_if_needed(&mut st, &participant, bot_privileged).await;
                }
                self.send_topic_if_needed(&mut st, &participant).await;
            }
            MeetingEvent::ParticipantLeaveMeeting { participant } => {
                debug!(participant = %participant, "Left the meeting");
                st.trackers.remove(&participant.id);
            }
            MeetingEvent::ChatMessageReceived(message) => {
                self.on_chat(&mut st, message).await;
            }
            MeetingEvent::ActiveAudioChanged { participants } => {
                let text = list_or_none(&participants);
                st.talkers = participants;
                self.notify_trackers(&mut st, TrackKind::Talkers, &text, None).await;
            }
            MeetingEvent::RaisedHandsChanged { participants } => {
                let text = list_or_none(&participants);
                st.raised_hands = participants;
                self.notify_trackers(&mut st, TrackKind::Hands, &text, None).await;
            }
            MeetingEvent::Tick => {}
        }
    }

    async fn on_chat(&self, st: &mut Moderation, message: ChatMessage) {
        let from = message.from;
        if from.is_self || !st.modes.flags.process_chat {
            return;
        }

        let (text, private) = if message.is_to_everyone {
            match self.strip_bot_name(&message.text) {
                Some(stripped) => (stripped, false),
                None if self.attendee_count().await == Some(2) => (message.text, false),
                None => return,
            }
        } else {
            let line = format!("{}: {}", from.name, message.text);
            self.notify_trackers(st, TrackKind::Chat, &line, Some(from.id)).await;
            if !message.to.as_ref().is_some_and(|to| to.is_self) {
                return;
            }
            (message.text, true)
        };

        for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            self.handle_line(st, &from, line, private).await;
        }
    }

    /// Text of a message sent to everyone with the bot's name removed, or
    /// `None` when the bot was not mentioned.
    fn strip_bot_name(&self, text: &str) -> Option<String> {
        let re = self.addressed.as_ref()?;
        if !re.is_match(text) {
            return None;
        }
        let stripped = re.replace_all(text, "");
        Some(
            stripped
                .trim_matches(|c: char| c.is_whitespace() || matches!(c, ',' | ':' | '@'))
                .to_string(),
        )
    }

    async fn attendee_count(&self) -> Option<usize> {
        match self.control.participants().await {
            Ok(list) => Some(list.iter().filter(|p| p.is_attending()).count()),
            Err(e) => {
                warn!(error = %e, "Cannot count attendees");
                None
            }
        }
    }

    async fn handle_line(&self, st: &mut Moderation, from: &Participant, line: &str, private: bool) {
        let prefix = self.config.bot.command_prefix.as_str();
        let reply_to = if private {
            Recipient::Participant(from.id)
        } else {
            Recipient::EveryoneInMeeting
        };

        let command_line = if line.starts_with(prefix) {
            if !private {
                debug!(participant = %from, "Command sent to everyone ignored");
                return;
            }
            line.to_string()
        } else {
            if !st.modes.flags.converse {
                return;
            }
            if let Some(text) = self.broadcast_keyword_reply(line, from) {
                self.send(reply_to, &text).await;
                return;
            }
            if mentions_topic(line) {
                let text = self.topic_line(st);
                self.send(reply_to, &text).await;
                return;
            }
            let Some(response) = self.chatbots.converse(line, from, None).await else {
                return;
            };
            if !response.starts_with(prefix) {
                if self.send(reply_to, &response).await
                    && st.modes.flags.speak
                    && (!private || self.attendee_count().await == Some(2))
                {
                    let spoken = speakable(&response);
                    if !spoken.is_empty() {
                        self.sound.speak(&spoken);
                    }
                }
                return;
            }
            debug!(participant = %from, command = %response, "Chatbot redirected to a command");
            response
        };

        if let Some(reply) = self.run_command(st, from, &command_line).await {
            self.send(reply.to, &reply.text).await;
        }
    }

    /// Broadcast text for the first broadcast keyword the line mentions.
    fn broadcast_keyword_reply(&self, line: &str, from: &Participant) -> Option<String> {
        let broadcast = words(line).find_map(|w| self.broadcasts.get(&w))?;
        Some(self.render_for(&broadcast.message, from))
    }

    /// Send `text` to every tracker subscribed to `kind`, pruning trackers
    /// that are gone.
    pub(crate) async fn notify_trackers(
        &self,
        st: &mut Moderation,
        kind: TrackKind,
        text: &str,
        except: Option<ParticipantId>,
    ) {
        let subscribers: Vec<ParticipantId> = st
            .trackers
            .iter()
            .filter(|(id, kinds)| kinds.contains(&kind) && Some(**id) != except)
            .map(|(id, _)| *id)
            .collect();

        let message = format!("{}: {}", kind.label(), text);
        for id in subscribers {
            match self.control.participant(id).await {
                Ok(Some(p)) if p.status != ParticipantStatus::Left => {
                    self.send(Recipient::Participant(id), &message).await;
                }
                Ok(_) => {
                    debug!(id, "Tracker is gone; removing");
                    st.trackers.remove(&id);
                }
                Err(e) => warn!(id, error = %e, "Cannot look up tracker"),
            }
        }
    }
}

/// Lowercased words of `text`.
fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric() && c != '\'')
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
}

fn mentions_topic(text: &str) -> bool {
    words(text).any(|w| w == "topic" || w == "reading")
}

fn participants_enabled(st: &Moderation) -> bool {
    st.modes.flags.process_participants && !st.modes.paused
}

pub(crate) fn list_or_none(names: &[String]) -> String {
    if names.is_empty() {
        "None".to_string()
    } else {
        names.join(", ")
    }
}

/// Drop lines that would sound bad read aloud (addresses, links).
fn speakable(text: &str) -> String {
    text.lines()
        .filter(|l| {
            let lower = l.to_lowercase();
            !(lower.contains('@') || lower.contains("http") || lower.contains("www."))
        })
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}
