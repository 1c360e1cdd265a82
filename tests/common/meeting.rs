//! Test meeting harness.

#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use meetwarden::config::Config;
use meetwarden::control::ManualClock;
use meetwarden::engine::{ChatMessage, Collaborators, Engine, MeetingEvent, TickOutcome};
use meetwarden::replay::{Action, InMemoryMeeting, Outbox};
use meetwarden::services::{ChatBotPipeline, KeywordBot};
use meetwarden::sound::{SoundQueue, SoundReceiver};
use meetwarden::state::{Participant, ParticipantId, Recipient};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

pub const BOT_ID: ParticipantId = 0;

/// An engine wired to an in-memory meeting.
pub struct TestMeeting {
    pub engine: Arc<Engine>,
    pub meeting: Arc<InMemoryMeeting>,
    pub clock: Arc<ManualClock>,
    pub outbox: Arc<Outbox>,
    pub sound: SoundReceiver,
    dir: TempDir,
}

impl TestMeeting {
    /// Default config with the given trust list contents.
    pub async fn new(trust_list: &str) -> Self {
        Self::with_config(trust_list, |_| {}).await
    }

    /// Start a meeting after letting `configure` adjust the config.
    pub async fn with_config(trust_list: &str, configure: impl FnOnce(&mut Config)) -> Self {
        let dir = TempDir::new().expect("tempdir");
        let mut config = Config::default();
        config.files.trust_list = dir.path().join("good_users.txt");
        config.files.remote_commands = dir.path().join("command_file.txt");
        config.chatbot.keyword.enabled = false;
        configure(&mut config);

        std::fs::write(&config.files.trust_list, trust_list).expect("write trust list");

        let mut me = Participant::attending(BOT_ID, config.bot.name.clone());
        me.is_host = true;
        let meeting = Arc::new(InMemoryMeeting::new(me));
        let clock = Arc::new(ManualClock::new(start_time()));
        let outbox = Arc::new(Outbox::new());
        let (queue, sound) = SoundQueue::new();

        let mut chatbots = ChatBotPipeline::new(std::time::Duration::from_secs(1));
        if config.chatbot.keyword.enabled {
            chatbots.register(Arc::new(KeywordBot::new(&config.chatbot.keyword)));
        }
        chatbots.start_all().await;

        let collaborators = Collaborators {
            control: meeting.clone(),
            sound: Arc::new(queue),
            email: outbox.clone(),
            clock: clock.clone(),
        };
        let engine = Arc::new(Engine::new(config, collaborators, chatbots));

        Self {
            engine,
            meeting,
            clock,
            outbox,
            sound,
            dir,
        }
    }

    pub fn remote_command_path(&self) -> PathBuf {
        self.dir.path().join("command_file.txt")
    }

    pub fn trust_list_path(&self) -> PathBuf {
        self.dir.path().join("good_users.txt")
    }

    pub fn now(&self) -> DateTime<Utc> {
        use meetwarden::control::Clock;
        self.clock.now()
    }

    pub fn advance(&self, secs: i64) {
        self.clock.advance(Duration::seconds(secs));
    }

    pub async fn tick(&self) -> TickOutcome {
        self.engine.tick().await
    }

    /// Mirror `event` into the meeting, then hand it to the engine.
    pub async fn send(&self, event: MeetingEvent) {
        self.meeting.apply_event(&event);
        self.engine.handle_event(event).await;
    }

    pub async fn join_waiting(&self, id: ParticipantId, name: &str) -> Participant {
        let participant = Participant::waiting(id, name, self.now());
        self.send(MeetingEvent::ParticipantJoinWaitingRoom {
            participant: participant.clone(),
        })
        .await;
        participant
    }

    pub async fn join_meeting(&self, id: ParticipantId, name: &str) -> Participant {
        let participant = Participant::attending(id, name);
        self.send(MeetingEvent::ParticipantJoinMeeting {
            participant: participant.clone(),
        })
        .await;
        participant
    }

    /// Private chat from `from` to the bot.
    pub async fn say_private(&self, from: ParticipantId, text: &str) {
        let from = self.meeting.get(from).expect("sender in meeting");
        let me = self.meeting.get(BOT_ID).expect("bot in meeting");
        self.send(MeetingEvent::ChatMessageReceived(ChatMessage {
            from,
            to: Some(me),
            text: text.to_string(),
            is_to_everyone: false,
        }))
        .await;
    }

    /// Chat from `from` to everyone.
    pub async fn say_public(&self, from: ParticipantId, text: &str) {
        let from = self.meeting.get(from).expect("sender in meeting");
        self.send(MeetingEvent::ChatMessageReceived(ChatMessage {
            from,
            to: None,
            text: text.to_string(),
            is_to_everyone: true,
        }))
        .await;
    }

    /// Chat texts sent privately to `id`.
    pub fn replies_to(&self, id: ParticipantId) -> Vec<String> {
        self.meeting.chats_to(Recipient::Participant(id))
    }

    pub fn last_reply_to(&self, id: ParticipantId) -> Option<String> {
        self.replies_to(id).pop()
    }

    pub fn to_everyone(&self) -> Vec<String> {
        self.meeting.chats_to(Recipient::EveryoneInMeeting)
    }

    /// Actions other than chat messages.
    pub fn commands(&self) -> Vec<Action> {
        self.meeting
            .actions()
            .into_iter()
            .filter(|a| !matches!(a, Action::Chat(..)))
            .collect()
    }

    pub fn admitted(&self) -> Vec<ParticipantId> {
        self.commands()
            .into_iter()
            .filter_map(|a| match a {
                Action::Admit(id) => Some(id),
                _ => None,
            })
            .collect()
    }
}

/// Monday 2026-01-05 10:00 UTC.
pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 5, 10, 0, 0)
        .single()
        .expect("valid start time")
}
