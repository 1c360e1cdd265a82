use super::{Engine, Moderation, Reply, TrackKind};
use crate::engine::events::list_or_none;
use crate::state::Participant;
use tracing::{info, warn};

impl Engine {
    /// `/list hands` or `/list talkers`.
    pub(super) fn cmd_list(&self, st: &Moderation, from: &Participant, args: &str) -> Reply {
        let (kind, names) = match TrackKind::from_keyword(&args.to_lowercase()) {
            Some(TrackKind::Hands) => (TrackKind::Hands, &st.raised_hands),
            Some(TrackKind::Talkers) => (TrackKind::Talkers, &st.talkers),
            _ => return Reply::private(from, "Please use the format: /list hands, or /list talkers"),
        };
        Reply::private(from, format!("{}: {}", kind.label(), list_or_none(names)))
    }

    /// `/track hands|talkers|chat` subscribes the sender; `/track off`
    /// drops every subscription.
    pub(super) fn cmd_track(&self, st: &mut Moderation, from: &Participant, args: &str) -> Reply {
        let word = args.to_lowercase();
        if word == "off" {
            return if st.trackers.remove(&from.id).is_some() {
                info!(participant = %from, "Tracking disabled");
                Reply::private(from, "Tracking disabled")
            } else {
                Reply::private(from, "Tracking is not enabled")
            };
        }

        let Some(kind) = TrackKind::from_keyword(&word) else {
            return Reply::private(
                from,
                "Please use the format: /track hands, /track talkers, /track chat, or /track off",
            );
        };
        if st.trackers.entry(from.id).or_default().insert(kind) {
            info!(participant = %from, kind = kind.label(), "Tracking enabled");
            Reply::private(from, format!("Tracking of {} enabled", kind.label()))
        } else {
            Reply::private(from, format!("Tracking of {} is already enabled", kind.label()))
        }
    }

    /// `/who`: who is attending and who is waiting.
    pub(super) async fn cmd_who(&self, st: &Moderation, from: &Participant) -> Reply {
        let participants = match self.control.participants().await {
            Ok(list) => list,
            Err(e) => {
                warn!(error = %e, "Cannot list participants");
                return Reply::private(from, "Sorry, I can't look up participants right now");
            }
        };

        let labels = |waiting: bool| -> Vec<String> {
            participants
                .iter()
                .filter(|p| !p.is_self)
                .filter(|p| if waiting { p.is_waiting() } else { p.is_attending() })
                .map(|p| p.label(st.include_ids))
                .collect()
        };
        let attending = labels(false);
        let waiting = labels(true);
        Reply::private(
            from,
            format!(
                "Attending ({}): {}\nWaiting ({}): {}",
                attending.len(),
                list_or_none(&attending),
                waiting.len(),
                list_or_none(&waiting)
            ),
        )
    }
}
