//! Moderation engine.
//!
//! One [`Engine`] per meeting session owns every piece of moderation
//! state. Events and the periodic sweep serialize on a single lock; the
//! sweep gives up instead of waiting when the lock is taken.
//!
//! Handlers are split across submodules:
//! - [`events`]: event routing and chat handling
//! - [`sweep`]: the periodic tick, admission and promotion
//! - `commands`: the chat command table
//! - [`handoff`]: leaving the meeting and host handoff
//! - [`remote`]: the out-of-band command file

mod commands;
pub mod events;
pub mod handoff;
pub mod remote;
pub mod sweep;

pub use commands::{Reply, Target, TrackKind};
pub use events::{ChatMessage, MeetingEvent};
pub use handoff::{choose_handoff_target, handoff_score};
pub use remote::RemoteCommand;
pub use sweep::{TickOutcome, spawn_ticker};

use crate::config::{Config, EmailCommandConfig};
use crate::control::{Clock, EmailSender, MeetingControl, SoundSink};
use crate::security::{
    AdmissionContext, AdmissionDecision, BadUsers, BroadcastThrottle, NoticeLog, evaluate_admission,
};
use crate::services::ChatBotPipeline;
use crate::state::names::{self, TemplateVars};
use crate::state::{
    Mode, ModeState, Participant, ParticipantId, Recipient, TrustLevel, TrustStore,
};
use chrono::{DateTime, Duration, Local, Timelike, Utc};
use regex::Regex;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use tracing::{error, info, warn};

/// External collaborators the engine drives.
#[derive(Clone)]
pub struct Collaborators {
    pub control: Arc<dyn MeetingControl>,
    pub sound: Arc<dyn SoundSink>,
    pub email: Arc<dyn EmailSender>,
    pub clock: Arc<dyn Clock>,
}

/// A configured broadcast, reachable under one or more aliases.
#[derive(Debug, Clone)]
pub(crate) struct Broadcast {
    /// First alias; the guard window is tracked under this name.
    pub(crate) canonical: String,
    pub(crate) message: String,
}

/// State guarded by the moderation lock.
#[derive(Debug, Default)]
pub(crate) struct Moderation {
    pub(crate) modes: ModeState,
    pub(crate) bad_users: BadUsers,
    pub(crate) broadcasts_sent: BroadcastThrottle,
    pub(crate) notices: NoticeLog,
    pub(crate) topic: Option<String>,
    /// Normalized names that already got the topic privately.
    pub(crate) topic_sent: HashSet<String>,
    pub(crate) trackers: HashMap<ParticipantId, HashSet<TrackKind>>,
    pub(crate) raised_hands: Vec<String>,
    pub(crate) talkers: Vec<String>,
    pub(crate) last_unknown_admit: Option<DateTime<Utc>>,
    pub(crate) waiting_message: Option<String>,
    pub(crate) last_waiting_announcement: Option<DateTime<Utc>>,
    pub(crate) include_ids: bool,
    pub(crate) speaker: Option<ParticipantId>,
}

/// The moderation engine for one meeting session.
pub struct Engine {
    config: Config,
    control: Arc<dyn MeetingControl>,
    sound: Arc<dyn SoundSink>,
    email: Arc<dyn EmailSender>,
    clock: Arc<dyn Clock>,
    trust: TrustStore,
    chatbots: ChatBotPipeline,
    bad_name: Option<Regex>,
    addressed: Option<Regex>,
    broadcasts: HashMap<String, Broadcast>,
    /// Alias to message, for `{key}` placeholders.
    broadcast_texts: BTreeMap<String, String>,
    email_commands: HashMap<String, EmailCommandConfig>,
    state: Mutex<Moderation>,
    leaving: AtomicBool,
    end_for_all: AtomicBool,
    left: AtomicBool,
}

impl Engine {
    /// Build an engine. Plugins in `chatbots` should already be started.
    ///
    /// Invalid patterns and templates in `config` are logged and the
    /// feature they belong to is left out.
    pub fn new(config: Config, collaborators: Collaborators, chatbots: ChatBotPipeline) -> Self {
        let bad_name = config
            .admission
            .bad_name_pattern
            .as_deref()
            .and_then(|pattern| match Regex::new(pattern) {
                Ok(re) => Some(re),
                Err(e) => {
                    error!(pattern = %pattern, error = %e, "Invalid bad-name pattern; name blocking disabled");
                    None
                }
            });

        let addressed = Regex::new(&format!(r"(?i)\b{}\b", regex::escape(&config.bot.name)))
            .map_err(|e| error!(error = %e, "Cannot match the bot name in chat"))
            .ok();

        let entries = config.broadcast.entries();
        let broadcast_texts: BTreeMap<String, String> = entries
            .iter()
            .map(|(alias, _, message)| (alias.clone(), message.clone()))
            .collect();
        let mut broadcasts = HashMap::new();
        for (alias, canonical, message) in entries {
            if let Err(e) = names::check_template(&message, &broadcast_texts) {
                error!(broadcast = %alias, error = %e, "Malformed broadcast template; broadcast disabled");
                continue;
            }
            broadcasts.insert(alias, Broadcast { canonical, message });
        }

        let email_commands = config
            .email
            .commands
            .iter()
            .map(|(name, command)| (name.to_lowercase(), command.clone()))
            .collect();

        let state = Moderation {
            modes: ModeState::new(config.automation, config.bot.paused, config.bot.debug),
            waiting_message: config.waiting_room.message.clone(),
            include_ids: config.listing.include_ids,
            ..Moderation::default()
        };

        let trust = TrustStore::new(config.files.trust_list.clone());
        if let Err(e) = trust.load() {
            warn!(path = %trust.path().display(), error = %e, "Failed to load the trust list");
        }

        info!(
            bot = %config.bot.name,
            trusted = trust.len(),
            chatbots = chatbots.len(),
            broadcasts = broadcasts.len(),
            "Moderation engine ready"
        );

        Self {
            trust,
            control: collaborators.control,
            sound: collaborators.sound,
            email: collaborators.email,
            clock: collaborators.clock,
            chatbots,
            bad_name,
            addressed,
            broadcasts,
            broadcast_texts,
            email_commands,
            state: Mutex::new(state),
            leaving: AtomicBool::new(false),
            end_for_all: AtomicBool::new(false),
            left: AtomicBool::new(false),
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn trust(&self) -> &TrustStore {
        &self.trust
    }

    /// Current automation state.
    pub async fn modes(&self) -> ModeState {
        self.state.lock().await.modes.clone()
    }

    pub async fn topic(&self) -> Option<String> {
        self.state.lock().await.topic.clone()
    }

    /// Whether `participant` was removed by a co-host this session.
    pub async fn is_bad_user(&self, participant: &Participant) -> bool {
        self.state.lock().await.bad_users.contains(participant)
    }

    /// Admission decision for `participant` right now, without acting on it.
    pub async fn admission_for(&self, participant: &Participant) -> AdmissionDecision {
        let st = self.state.lock().await;
        let trust = self.trust.get(&participant.name);
        evaluate_admission(participant, &self.admission_context(&st, trust, self.clock.now()))
    }

    /// Switch a named mode. Returns whether anything changed.
    pub async fn set_mode(&self, mode: Mode, on: bool) -> bool {
        let mut st = self.state.lock().await;
        self.apply_mode(&mut st, mode, on).await
    }

    pub(crate) fn admission_context<'a>(
        &'a self,
        st: &'a Moderation,
        trust: TrustLevel,
        now: DateTime<Utc>,
    ) -> AdmissionContext<'a> {
        AdmissionContext {
            flags: &st.modes.flags,
            bad_users: &st.bad_users,
            bad_name: self.bad_name.as_ref(),
            trust,
            now,
            last_unknown_admit: st.last_unknown_admit,
            unknown_wait: secs(self.config.admission.unknown_wait_secs),
            unknown_throttle: secs(self.config.admission.unknown_throttle_secs),
        }
    }

    pub(crate) async fn apply_mode(&self, st: &mut Moderation, mode: Mode, on: bool) -> bool {
        if !st.modes.set(mode, on) {
            return false;
        }
        info!(mode = %mode, on, "Mode changed");

        if mode.locks_meeting()
            && let Err(e) = self.control.lock_meeting(on).await
        {
            warn!(mode = %mode, error = %e, "Failed to lock or unlock the meeting");
        }
        true
    }

    /// Send a chat message, logging failures.
    pub(crate) async fn send(&self, to: Recipient, text: &str) -> bool {
        match self.control.send_chat(to, text).await {
            Ok(()) => true,
            Err(e) => {
                warn!(recipient = ?to, error = %e, code = e.error_code(), "Failed to send chat message");
                false
            }
        }
    }

    /// Local hour of the engine clock.
    pub(crate) fn local_hour(&self) -> u32 {
        self.clock.now().with_timezone(&Local).hour()
    }

    /// Fill `{0}`, `{1}` and broadcast placeholders for `who`.
    pub(crate) fn render_for(&self, template: &str, who: &Participant) -> String {
        let first = names::first_name(&who.name);
        let vars = TemplateVars {
            first_name: &first,
            daytime: names::daytime(self.local_hour()),
            broadcasts: &self.broadcast_texts,
        };
        names::render(template, &vars).unwrap_or_else(|e| {
            error!(error = %e, "Template failed to render; sending it unformatted");
            template.to_string()
        })
    }

    pub fn is_leaving(&self) -> bool {
        self.leaving.load(Ordering::SeqCst)
    }

    pub fn has_left(&self) -> bool {
        self.left.load(Ordering::SeqCst)
    }
}

pub(crate) fn secs(n: u64) -> Duration {
    i64::try_from(n)
        .ok()
        .and_then(Duration::try_seconds)
        .unwrap_or(Duration::MAX)
}
