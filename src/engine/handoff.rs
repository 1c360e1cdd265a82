//! Leaving the meeting and handing the host role over first.

use super::Engine;
use crate::state::{Participant, Role, TrustLevel};
use std::sync::atomic::Ordering;
use std::time::Duration;
use tracing::{error, info, warn};

/// `10 × trust rank`, plus one for a current co-host.
pub fn handoff_score(level: TrustLevel, is_cohost: bool) -> u32 {
    10 * level.rank() + u32::from(is_cohost)
}

/// Best candidate to receive the host role.
///
/// The strictly highest score wins, so ties go to the earliest candidate.
/// Returns `None` when nobody scores above zero.
pub fn choose_handoff_target<'a, I>(candidates: I) -> Option<&'a Participant>
where
    I: IntoIterator<Item = (&'a Participant, TrustLevel)>,
{
    let mut best: Option<(&Participant, u32)> = None;
    for (participant, level) in candidates {
        let score = handoff_score(level, participant.is_cohost);
        if best.is_none_or(|(_, top)| score > top) {
            best = Some((participant, score));
        }
    }
    best.filter(|(_, score)| *score > 0).map(|(p, _)| p)
}

impl Engine {
    /// Ask the engine to leave at the next tick.
    ///
    /// Raising the flag twice is a no-op, except that a later request to
    /// end the meeting for everyone still sticks. Returns `true` the first
    /// time.
    pub fn request_leave(&self, end_for_all: bool) -> bool {
        if end_for_all {
            self.end_for_all.store(true, Ordering::SeqCst);
        }
        let first = !self.leaving.swap(true, Ordering::SeqCst);
        if first {
            info!(end_for_all, "Leaving the meeting");
        }
        first
    }

    /// Leave the meeting, handing host over first when possible. Runs once.
    pub(crate) async fn finish_leave(&self) {
        if self.left.swap(true, Ordering::SeqCst) {
            return;
        }

        let end_for_all =
            self.end_for_all.load(Ordering::SeqCst) || !self.hand_off_host().await;

        match self.control.leave(end_for_all).await {
            Ok(()) => info!(end_for_all, "Left the meeting"),
            Err(e) => error!(error = %e, end_for_all, "Failed to leave the meeting"),
        }
    }

    /// Returns `false` when the meeting has to be ended for everyone.
    async fn hand_off_host(&self) -> bool {
        let me = match self.control.me().await {
            Ok(me) => me,
            Err(e) => {
                warn!(error = %e, "Cannot look up the bot's role before leaving");
                return true;
            }
        };
        if !me.is_host {
            return true;
        }

        let participants = match self.control.participants().await {
            Ok(list) => list,
            Err(e) => {
                warn!(error = %e, "Cannot list participants for host handoff");
                return false;
            }
        };
        let candidates = participants
            .iter()
            .filter(|p| !p.is_self && p.is_attending())
            .map(|p| (p, self.trust.get(&p.name)));

        let Some(target) = choose_handoff_target(candidates) else {
            warn!("No one to hand the meeting to; ending it for everyone");
            return false;
        };

        match self.control.promote(target.id, Role::Host).await {
            Ok(()) => {
                info!(participant = %target, id = target.id, "Host handed off");
                true
            }
            Err(e) => {
                error!(participant = %target, error = %e, "Host handoff failed; ending the meeting for everyone");
                false
            }
        }
    }

    /// Stop plugins, leave the meeting and give queued audio a bounded
    /// time to finish.
    pub async fn stop(&self) {
        self.chatbots.stop_all().await;
        self.request_leave(false);
        self.finish_leave().await;

        let grace = Duration::from_secs(self.config.bot.shutdown_grace_secs);
        let deadline = tokio::time::Instant::now().checked_add(grace);
        while self.sound.pending() > 0
            && deadline.is_none_or(|d| tokio::time::Instant::now() < d)
        {
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
        if self.sound.pending() > 0 {
            warn!(pending = self.sound.pending(), "Audio queue did not drain before shutdown");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_cohost(id: u64, name: &str, cohost: bool) -> Participant {
        let mut p = Participant::attending(id, name);
        p.is_cohost = cohost;
        p
    }

    #[test]
    fn test_scores() {
        assert_eq!(handoff_score(TrustLevel::Admin, true), 41);
        assert_eq!(handoff_score(TrustLevel::CoHost, false), 20);
        assert_eq!(handoff_score(TrustLevel::Known, true), 11);
        assert_eq!(handoff_score(TrustLevel::Unknown, false), 0);
    }

    #[test]
    fn test_admin_cohost_wins() {
        let a = with_cohost(1, "Known Cohost", true);
        let b = with_cohost(2, "Admin Cohost", true);
        let c = with_cohost(3, "Cohost Only", false);
        let picked = choose_handoff_target([
            (&a, TrustLevel::Known),
            (&b, TrustLevel::Admin),
            (&c, TrustLevel::CoHost),
        ]);
        assert_eq!(picked.map(|p| p.id), Some(2));
    }

    #[test]
    fn test_tie_keeps_earliest() {
        let a = with_cohost(1, "First", false);
        let b = with_cohost(2, "Second", false);
        let picked = choose_handoff_target([(&a, TrustLevel::Known), (&b, TrustLevel::Known)]);
        assert_eq!(picked.map(|p| p.id), Some(1));
    }

    #[test]
    fn test_zero_score_means_nobody() {
        let a = with_cohost(1, "Stranger", false);
        assert!(choose_handoff_target([(&a, TrustLevel::Unknown)]).is_none());
        assert!(choose_handoff_target(Vec::<(&Participant, TrustLevel)>::new()).is_none());
    }
}
