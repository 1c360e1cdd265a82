use super::{Engine, Moderation, Reply, Target};
use crate::state::{Participant, ParticipantStatus, Role};
use tracing::{info, warn};

const CANNOT_TARGET_SELF: &str = "Sorry, I can't do that to myself";

/// Moderation actions aimed at one participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ParticipantAction {
    Admit,
    Promote,
    Demote,
    Mute,
    Unmute,
    Expel,
    WaitingRoom,
}

impl ParticipantAction {
    /// Verb for "Failed to ..." replies.
    fn verb(self) -> &'static str {
        match self {
            ParticipantAction::Admit => "admit",
            ParticipantAction::Promote => "promote",
            ParticipantAction::Demote => "demote",
            ParticipantAction::Mute => "mute",
            ParticipantAction::Unmute => "unmute",
            ParticipantAction::Expel => "expel",
            ParticipantAction::WaitingRoom => "move",
        }
    }

    fn success(self, name: &str) -> String {
        match self {
            ParticipantAction::Admit => format!("Successfully admitted {name}"),
            ParticipantAction::Promote => format!("Successfully promoted {name} to co-host"),
            ParticipantAction::Demote => format!("Successfully demoted {name}"),
            ParticipantAction::Mute => format!("Successfully muted {name}"),
            ParticipantAction::Unmute => format!("Successfully unmuted {name}"),
            ParticipantAction::Expel => format!("Successfully expelled {name}"),
            ParticipantAction::WaitingRoom => {
                format!("Successfully moved {name} to the waiting room")
            }
        }
    }

    fn failure(self, name: &str) -> String {
        match self {
            ParticipantAction::WaitingRoom => format!("Failed to move {name} to the waiting room"),
            other => format!("Failed to {} {name}", other.verb()),
        }
    }

    /// Whether the target must stay out of automatic admission and
    /// promotion afterwards.
    fn marks_bad_user(self) -> bool {
        matches!(
            self,
            ParticipantAction::Demote | ParticipantAction::Expel | ParticipantAction::WaitingRoom
        )
    }

    /// Why `target` cannot receive this action, if it cannot.
    fn precondition(self, target: &Participant) -> Option<String> {
        let name = &target.name;
        match self {
            ParticipantAction::Admit if !target.is_waiting() => {
                Some(format!("{name} is not in the waiting room"))
            }
            ParticipantAction::Admit => None,
            ParticipantAction::Expel if target.status != ParticipantStatus::Left => None,
            _ if !target.is_attending() => Some(format!("{name} is not attending")),
            ParticipantAction::Promote if target.is_privileged() => {
                Some(format!("{name} is already host or co-host"))
            }
            ParticipantAction::Promote if !target.video_on => {
                Some(format!("{name} has video off, so cannot be promoted"))
            }
            ParticipantAction::Demote if !target.is_cohost => {
                Some(format!("{name} is not a co-host, so cannot be demoted"))
            }
            _ => None,
        }
    }
}

impl Engine {
    pub(super) async fn cmd_participant(
        &self,
        st: &mut Moderation,
        from: &Participant,
        cmd: &str,
        args: &str,
        action: ParticipantAction,
    ) -> Reply {
        if args.is_empty() {
            return Reply::private(
                from,
                format!("Please tell me who, for example: /{cmd} Jane Doe or /{cmd} #12"),
            );
        }

        let target = match self.resolve_target(from, &Target::parse(args)).await {
            Ok(target) => target,
            Err(reply) => return Reply::private(from, reply),
        };
        if target.is_self {
            return Reply::private(from, CANNOT_TARGET_SELF);
        }
        if let Some(reason) = action.precondition(&target) {
            return Reply::private(from, reason);
        }

        if action.marks_bad_user() {
            st.bad_users.insert(&target);
        }

        let id = target.id;
        let result = match action {
            ParticipantAction::Admit => self.control.admit(id).await,
            ParticipantAction::Promote => self.control.promote(id, Role::CoHost).await,
            ParticipantAction::Demote => self.control.demote(id).await,
            ParticipantAction::Mute => self.control.mute(id).await,
            ParticipantAction::Unmute => self.control.unmute(id).await,
            ParticipantAction::Expel => self.control.expel(id).await,
            ParticipantAction::WaitingRoom => self.control.put_in_waiting_room(id).await,
        };

        let label = target.label(st.include_ids);
        match result {
            Ok(()) => {
                info!(participant = %target, id, by = %from, action = ?action, "Command applied");
                Reply::private(from, action.success(&label))
            }
            Err(e) => {
                warn!(participant = %target, id, action = ?action, error = %e, code = e.error_code(), "Command failed");
                Reply::private(from, action.failure(&label))
            }
        }
    }

    /// `/rename Old Name to New Name`
    pub(super) async fn cmd_rename(&self, from: &Participant, args: &str) -> Reply {
        let Some((old, new)) = args
            .split_once(" to ")
            .map(|(old, new)| (old.trim(), new.trim()))
            .filter(|(old, new)| !old.is_empty() && !new.is_empty())
        else {
            return Reply::private(from, "Please use the format: /rename Old Name to New Name");
        };

        let target = match self.resolve_target(from, &Target::parse(old)).await {
            Ok(target) => target,
            Err(reply) => return Reply::private(from, reply),
        };
        if target.is_self {
            return Reply::private(from, CANNOT_TARGET_SELF);
        }
        if target.id == from.id {
            return Reply::private(from, "Why don't you just rename yourself?");
        }

        match self.control.rename(target.id, new).await {
            Ok(()) => {
                info!(participant = %target, to = %new, by = %from, "Renamed participant");
                Reply::private(from, format!("Renamed {} to {new}", target.name))
            }
            Err(e) => {
                warn!(participant = %target, error = %e, "Rename failed");
                Reply::private(from, format!("Failed to rename {}", target.name))
            }
        }
    }
}
