//! Chat command table.
//!
//! A command line is `<prefix><name> [args]`. Senders below the co-host
//! trust level only reach the topic query and broadcasts; `remember` and
//! `forget` additionally need admin. Every command produces at most one
//! [`Reply`].

mod broadcast;
mod email;
mod media;
mod modes;
mod participants;
mod topic;
mod tracking;
mod trust;

use super::{Engine, Moderation};
use crate::state::names::{collapse_whitespace, normalize};
use crate::state::{Participant, ParticipantId, ParticipantStatus, Recipient, TrustLevel};
use participants::ParticipantAction;
use tracing::{debug, warn};

/// Every spelling of "send back to the waiting room".
pub(crate) const WAITING_ROOM_ALIASES: &[&str] = &[
    "wait",
    "putwr",
    "waitroom",
    "waitingroom",
    "putinwait",
    "putinwaiting",
    "putinwaitingroom",
];

const UNAUTHORIZED: &str = "Sorry, you are not authorized to run that command.";

/// A chat message to send back after a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub to: Recipient,
    pub text: String,
}

impl Reply {
    pub(crate) fn private(to: &Participant, text: impl Into<String>) -> Self {
        Self {
            to: Recipient::Participant(to.id),
            text: text.into(),
        }
    }
}

/// Who a command is aimed at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// The sender.
    Me,
    /// `#<id>`
    ById(ParticipantId),
    /// Exact display name.
    ByName(String),
}

impl Target {
    pub fn parse(arg: &str) -> Self {
        let arg = arg.trim();
        if arg.eq_ignore_ascii_case("me") {
            return Target::Me;
        }
        if let Some(id) = arg.strip_prefix('#').and_then(|n| n.parse().ok()) {
            return Target::ById(id);
        }
        Target::ByName(collapse_whitespace(arg))
    }
}

/// Notification streams a co-host can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    Hands,
    Talkers,
    Chat,
}

impl TrackKind {
    pub fn label(self) -> &'static str {
        match self {
            TrackKind::Hands => "Raised Hands",
            TrackKind::Talkers => "Talkers",
            TrackKind::Chat => "Chat",
        }
    }

    pub(crate) fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "hands" | "hand" => Some(TrackKind::Hands),
            "talkers" | "talker" | "talking" => Some(TrackKind::Talkers),
            "chat" => Some(TrackKind::Chat),
            _ => None,
        }
    }
}

/// Split `line` into a lowercased command name and its trimmed arguments.
fn split_command<'a>(line: &'a str, prefix: &str) -> Option<(String, &'a str)> {
    let body = line.trim().strip_prefix(prefix)?;
    let (name, args) = body.split_once(char::is_whitespace).unwrap_or((body, ""));
    let name = name.to_lowercase();
    if name.is_empty() {
        return None;
    }
    Some((name, args.trim()))
}

impl Engine {
    /// Run one command line from `from`.
    pub(crate) async fn run_command(
        &self,
        st: &mut Moderation,
        from: &Participant,
        line: &str,
    ) -> Option<Reply> {
        let (cmd, args) = split_command(line, &self.config.bot.command_prefix)?;
        let level = self.trust.get(&from.name);

        let public = (cmd == "topic" && args.is_empty()) || self.broadcasts.contains_key(&cmd);
        if level < TrustLevel::CoHost && !public {
            warn!(participant = %from, command = %cmd, "Command from untrusted sender refused");
            return Some(Reply::private(from, UNAUTHORIZED));
        }
        debug!(participant = %from, command = %cmd, args = %args, "Running command");

        if let Some(email) = self.email_commands.get(&cmd) {
            return Some(self.cmd_email(from, &cmd, email, args).await);
        }
        if self.broadcasts.contains_key(&cmd) {
            return self.cmd_broadcast(st, from, &cmd).await;
        }

        let reply = match cmd.as_str() {
            "topic" => self.cmd_topic(st, from, args).await,
            "remember" | "forget" => {
                if level < TrustLevel::Admin {
                    warn!(participant = %from, command = %cmd, "Admin command refused");
                    return Some(Reply::private(from, UNAUTHORIZED));
                }
                if cmd == "remember" {
                    self.cmd_remember(from, args).await
                } else {
                    self.cmd_forget(from, args).await
                }
            }
            "citadel" | "lockdown" | "lock" | "passive" => {
                self.cmd_mode(st, from, &cmd, args).await
            }
            "ids" => self.cmd_ids(st, from, args),
            "waitmsg" => self.cmd_waitmsg(st, from, args),
            "rename" => self.cmd_rename(from, args).await,
            "speaker" => self.cmd_speaker(st, from, args).await,
            "speak" | "say" => return self.cmd_speak(from, &cmd, args).await,
            "play" => self.cmd_play(from, args),
            "list" => self.cmd_list(st, from, args),
            "track" => self.cmd_track(st, from, args),
            "who" => self.cmd_who(st, from).await,
            "admit" => {
                self.cmd_participant(st, from, &cmd, args, ParticipantAction::Admit)
                    .await
            }
            "cohost" | "promote" => {
                self.cmd_participant(st, from, &cmd, args, ParticipantAction::Promote)
                    .await
            }
            "demote" => {
                self.cmd_participant(st, from, &cmd, args, ParticipantAction::Demote)
                    .await
            }
            "mute" => {
                self.cmd_participant(st, from, &cmd, args, ParticipantAction::Mute)
                    .await
            }
            "unmute" => {
                self.cmd_participant(st, from, &cmd, args, ParticipantAction::Unmute)
                    .await
            }
            "expel" | "kick" => {
                self.cmd_participant(st, from, &cmd, args, ParticipantAction::Expel)
                    .await
            }
            c if WAITING_ROOM_ALIASES.contains(&c) => {
                self.cmd_participant(st, from, &cmd, args, ParticipantAction::WaitingRoom)
                    .await
            }
            _ => Reply::private(from, format!("Sorry, I don't know the command {cmd}")),
        };
        Some(reply)
    }

    /// Resolve a target to a live participant, or the reply explaining why
    /// that failed.
    pub(crate) async fn resolve_target(
        &self,
        from: &Participant,
        target: &Target,
    ) -> Result<Participant, String> {
        const LOOKUP_FAILED: &str = "Sorry, I can't look up participants right now";

        match target {
            Target::Me => match self.control.participant(from.id).await {
                Ok(Some(me)) if me.status != ParticipantStatus::Left => Ok(me),
                Ok(_) => Ok(from.clone()),
                Err(e) => {
                    warn!(error = %e, "Participant lookup failed");
                    Err(LOOKUP_FAILED.to_string())
                }
            },
            Target::ById(id) => match self.control.participant(*id).await {
                Ok(Some(p)) if p.status != ParticipantStatus::Left => Ok(p),
                Ok(_) => Err(format!("I don't see anyone with id #{id}")),
                Err(e) => {
                    warn!(error = %e, "Participant lookup failed");
                    Err(LOOKUP_FAILED.to_string())
                }
            },
            Target::ByName(name) => {
                let exact = match self.control.participants_named(name).await {
                    Ok(list) => list,
                    Err(e) => {
                        warn!(error = %e, "Participant lookup failed");
                        return Err(LOOKUP_FAILED.to_string());
                    }
                };
                // Two live names that normalize alike are ambiguous even
                // when one of them matches exactly.
                if exact.len() > 1 || self.similar_names(name).await > 1 {
                    return Err(ambiguous(name));
                }
                exact.into_iter().next().ok_or_else(|| {
                    format!("I don't see anyone named {name}. Remember, case matters!")
                })
            }
        }
    }

    /// Live participants whose normalized name matches `name`.
    async fn similar_names(&self, name: &str) -> usize {
        let wanted = normalize(name);
        match self.control.participants().await {
            Ok(list) => list
                .iter()
                .filter(|p| p.status != ParticipantStatus::Left && normalize(&p.name) == wanted)
                .count(),
            Err(_) => 0,
        }
    }
}

fn ambiguous(name: &str) -> String {
    format!(
        "More than one participant matches {name}; type the name exactly as shown, or use #id"
    )
}

/// Parse `on` / `off`.
pub(crate) fn on_off(arg: &str) -> Option<bool> {
    match arg.trim().to_lowercase().as_str() {
        "on" => Some(true),
        "off" => Some(false),
        _ => None,
    }
}
