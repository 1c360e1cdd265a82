//! Periodic sweep: trust reload, remote commands, admission and promotion.

use super::{Engine, Moderation, secs};
use crate::security::{
    AdmissionDecision, AdmitKind, PromotionContext, PromotionDecision, SkipReason,
    evaluate_admission, evaluate_promotion,
};
use crate::state::names::normalize;
use crate::state::{Participant, ParticipantStatus, Recipient, Role};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const NOT_PRIVILEGED: &str = "bot is neither host nor co-host; cannot promote";

/// What a call to [`Engine::tick`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Participants were swept.
    Swept,
    /// Files were polled but participants were left alone.
    Paused,
    /// Another handler held the lock; the tick was dropped.
    Busy,
    /// The engine has left the meeting.
    Left,
}

/// Spawn the periodic sweep task.
///
/// Runs every `bot.tick_interval_secs` until `shutdown` is cancelled or the
/// engine leaves the meeting.
pub fn spawn_ticker(engine: Arc<Engine>, shutdown: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        let period = std::time::Duration::from_secs(engine.config.bot.tick_interval_secs.max(1));
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = interval.tick() => {
                    if engine.tick().await == TickOutcome::Left {
                        break;
                    }
                }
            }
        }
        debug!("Sweep task stopped");
    })
}

impl Engine {
    /// Run one sweep.
    ///
    /// Dropped, not queued, when the moderation lock is held elsewhere.
    pub async fn tick(&self) -> TickOutcome {
        if self.is_leaving() {
            self.finish_leave().await;
            return TickOutcome::Left;
        }

        let Ok(mut st) = self.state.try_lock() else {
            info!("Busy; will try again later");
            return TickOutcome::Busy;
        };

        match self.trust.load() {
            Ok(true) => info!(entries = self.trust.len(), "Trust list reloaded"),
            Ok(false) => {}
            Err(e) => warn!(error = %e, "Failed to load the trust list"),
        }

        self.poll_remote_commands(&mut st).await;
        if self.is_leaving() {
            drop(st);
            self.finish_leave().await;
            return TickOutcome::Left;
        }

        if st.modes.paused {
            debug!("Paused; participant sweep skipped");
            return TickOutcome::Paused;
        }

        self.sweep(&mut st).await;
        TickOutcome::Swept
    }

    async fn sweep(&self, st: &mut Moderation) {
        let now = self.clock.now();
        let me = match self.control.me().await {
            Ok(me) => me,
            Err(e) => {
                warn!(error = %e, "Cannot look up the bot; sweep skipped");
                return;
            }
        };

        self.automate_self(st, &me).await;
        if !st.modes.flags.process_participants {
            return;
        }

        let participants = match self.control.participants().await {
            Ok(list) => list,
            Err(e) => {
                warn!(error = %e, "Cannot list participants; sweep skipped");
                return;
            }
        };

        let bot_privileged = me.is_privileged();
        if bot_privileged {
            st.notices.clear(NOT_PRIVILEGED);
        }

        for p in &participants {
            if self.is_leaving() {
                return;
            }
            match p.status {
                ParticipantStatus::WaitingRoom => self.admit_if_needed(st, p, now).await,
                ParticipantStatus::Attending => {
                    self.promote_if_needed(st, p, bot_privileged).await;
                    self.send_topic_if_needed(st, p).await;
                }
                ParticipantStatus::Left => {}
            }
        }

        self.announce_to_waiting_room(st, &participants, now).await;
        st.trackers.retain(|id, _| {
            participants
                .iter()
                .any(|p| p.id == *id && p.status != ParticipantStatus::Left)
        });

        let waiting = participants.iter().filter(|p| p.is_waiting()).count();
        let attending = participants.iter().filter(|p| p.is_attending()).count();
        if st.modes.debug {
            info!(attending, waiting, blocked = st.bad_users.len(), "Sweep done");
        } else {
            debug!(attending, waiting, blocked = st.bad_users.len(), "Sweep done");
        }
    }

    /// Keep the bot itself host, correctly named and unmuted.
    async fn automate_self(&self, st: &mut Moderation, me: &Participant) {
        let flags = st.modes.flags;

        if flags.reclaim_host
            && !me.is_host
            && let Err(e) = self.control.reclaim_host().await
            && st.notices.first("reclaim host failed")
        {
            warn!(error = %e, "Failed to reclaim host");
        }

        let wanted = &self.config.bot.name;
        if flags.rename_self && me.name != *wanted {
            match self.control.rename(me.id, wanted).await {
                Ok(()) => info!(from = %me.name, to = %wanted, "Renamed self"),
                Err(e) => warn!(error = %e, "Failed to rename self"),
            }
        }

        if flags.unmute_self
            && me.audio_muted
            && let Err(e) = self.control.unmute(me.id).await
        {
            warn!(error = %e, "Failed to unmute self");
        }
    }

    /// Admit `p` from the waiting room if policy allows it.
    pub(crate) async fn admit_if_needed(
        &self,
        st: &mut Moderation,
        p: &Participant,
        now: DateTime<Utc>,
    ) {
        let trust = self.trust.get(&p.name);
        let decision = evaluate_admission(p, &self.admission_context(st, trust, now));

        let kind = match decision {
            AdmissionDecision::Defer => return,
            AdmissionDecision::Block(reason) => {
                if st.notices.first(&reason) {
                    warn!(participant = %p, id = p.id, "{reason}");
                }
                return;
            }
            AdmissionDecision::Admit(kind) => kind,
        };

        match self.control.participant(p.id).await {
            Ok(Some(live)) if live.is_waiting() => {}
            Ok(_) => return,
            Err(e) => {
                warn!(participant = %p, error = %e, "Cannot re-check participant before admitting");
                return;
            }
        }

        match self.control.admit(p.id).await {
            Ok(()) => {
                info!(participant = %p, id = p.id, known = (kind == AdmitKind::Known), "Admitted");
                if kind == AdmitKind::Unknown {
                    st.last_unknown_admit = Some(now);
                }
            }
            Err(e) => warn!(participant = %p, error = %e, "Failed to admit; will retry"),
        }
    }

    /// Make `p` co-host if their trust level calls for it.
    pub(crate) async fn promote_if_needed(
        &self,
        st: &mut Moderation,
        p: &Participant,
        bot_privileged: bool,
    ) {
        let ctx = PromotionContext {
            flags: &st.modes.flags,
            bad_users: &st.bad_users,
            trust: self.trust.get(&p.name),
            bot_privileged,
        };

        match evaluate_promotion(p, &ctx) {
            PromotionDecision::Skip(SkipReason::NotPrivileged) => {
                if st.notices.first(NOT_PRIVILEGED) {
                    warn!(participant = %p, "{NOT_PRIVILEGED}");
                }
            }
            PromotionDecision::Skip(_) => {}
            PromotionDecision::Promote => {
                match self.control.participant(p.id).await {
                    Ok(Some(live)) if live.is_attending() && !live.is_privileged() => {}
                    Ok(_) => return,
                    Err(e) => {
                        warn!(participant = %p, error = %e, "Cannot re-check participant before promoting");
                        return;
                    }
                }
                match self.control.promote(p.id, Role::CoHost).await {
                    Ok(()) => info!(participant = %p, id = p.id, "Promoted to co-host"),
                    Err(e) => warn!(participant = %p, error = %e, "Failed to promote; will retry"),
                }
            }
        }
    }

    /// Tell `p` the topic once per session.
    pub(crate) async fn send_topic_if_needed(&self, st: &mut Moderation, p: &Participant) {
        if p.is_self || !st.modes.flags.send_topic_on_join || st.topic.is_none() {
            return;
        }
        let key = normalize(&p.name);
        if st.topic_sent.contains(&key) {
            return;
        }
        let line = self.topic_line(st);
        if self.send(Recipient::Participant(p.id), &line).await {
            st.topic_sent.insert(key);
        }
    }

    async fn announce_to_waiting_room(
        &self,
        st: &mut Moderation,
        participants: &[Participant],
        now: DateTime<Utc>,
    ) {
        let delay = self.config.waiting_room.delay_secs;
        let Some(message) = st.waiting_message.clone() else {
            return;
        };
        if delay == 0 || !participants.iter().any(|p| p.is_waiting()) {
            return;
        }
        let delay = secs(delay);
        if st
            .last_waiting_announcement
            .is_some_and(|last| now - last < delay)
        {
            return;
        }

        if self.send(Recipient::EveryoneInWaitingRoom, &message).await {
            debug!("Waiting room announcement sent");
            st.last_waiting_announcement = Some(now);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::control::SystemClock;
    use crate::engine::Collaborators;
    use crate::replay::{Action, InMemoryMeeting, Outbox};
    use crate::services::ChatBotPipeline;
    use crate::sound::SoundQueue;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_tick_dropped_while_busy() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.files.trust_list = dir.path().join("good_users.txt");
        config.files.remote_commands = dir.path().join("command_file.txt");

        let mut me = Participant::attending(0, "UsherBot");
        me.is_host = true;
        let meeting = Arc::new(InMemoryMeeting::new(me));
        meeting.upsert(Participant::waiting(
            1,
            "Stranger",
            Utc::now() - chrono::Duration::hours(1),
        ));
        let (sound, _player) = SoundQueue::new();
        let engine = Engine::new(
            config,
            Collaborators {
                control: meeting.clone(),
                sound: Arc::new(sound),
                email: Arc::new(Outbox::new()),
                clock: Arc::new(SystemClock),
            },
            ChatBotPipeline::new(std::time::Duration::from_secs(1)),
        );

        // a handler holds the lock: the tick gives up without touching anything
        let held = engine.state.lock().await;
        assert_eq!(engine.tick().await, TickOutcome::Busy);
        std::fs::write(dir.path().join("command_file.txt"), "citadel:on\n").unwrap();
        assert_eq!(engine.tick().await, TickOutcome::Busy);
        assert!(meeting.actions().is_empty());
        assert!(dir.path().join("command_file.txt").exists());
        drop(held);

        // the dropped ticks were not queued; the next one runs normally
        std::fs::remove_file(dir.path().join("command_file.txt")).unwrap();
        assert_eq!(engine.tick().await, TickOutcome::Swept);
        assert_eq!(meeting.actions(), vec![Action::Admit(1)]);
    }
}
