use super::{Engine, Moderation, Reply};
use crate::security::GuardBlock;
use crate::state::{Participant, Recipient};
use tracing::{info, warn};

impl Engine {
    /// Send a configured broadcast to everyone, subject to the guard window.
    ///
    /// Nothing is replied on success; the broadcast itself is the answer.
    pub(super) async fn cmd_broadcast(
        &self,
        st: &mut Moderation,
        from: &Participant,
        cmd: &str,
    ) -> Option<Reply> {
        let broadcast = self.broadcasts.get(cmd)?;
        let guard = self.config.broadcast.guard_secs;
        let now = self.clock.now();

        let previous = match st.broadcasts_sent.try_send(&broadcast.canonical, guard, now) {
            Ok(previous) => previous,
            Err(GuardBlock::AlreadySent) => {
                return Some(Reply::private(
                    from,
                    format!("{cmd}: This broadcast message was already sent."),
                ));
            }
            Err(GuardBlock::Cooldown) => {
                return Some(Reply::private(
                    from,
                    format!(
                        "{cmd}: This broadcast message was already sent recently. Please try again later."
                    ),
                ));
            }
        };

        let text = self.render_for(&broadcast.message, from);
        if self.send(Recipient::EveryoneInMeeting, &text).await {
            info!(broadcast = %broadcast.canonical, by = %from, "Broadcast sent");
            None
        } else {
            warn!(broadcast = %broadcast.canonical, "Broadcast failed; guard window reset");
            st.broadcasts_sent.restore(&broadcast.canonical, previous);
            Some(Reply::private(from, format!("{cmd}: Failed to send the broadcast message")))
        }
    }
}
