//! Core configuration types and loading.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::defaults::*;
use crate::state::ModeFlags;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Engine configuration. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Bot identity and scheduling.
    #[serde(default)]
    pub bot: BotConfig,
    /// Initial automation flags.
    #[serde(default)]
    pub automation: ModeFlags,
    /// Waiting-room admission policy.
    #[serde(default)]
    pub admission: AdmissionConfig,
    /// Canned broadcast messages and their guard window.
    #[serde(default)]
    pub broadcast: BroadcastConfig,
    /// Chat commands that send an email.
    #[serde(default)]
    pub email: EmailConfig,
    /// Periodic waiting-room announcement.
    #[serde(default)]
    pub waiting_room: WaitingRoomConfig,
    /// Participant listing options.
    #[serde(default)]
    pub listing: ListingConfig,
    /// On-disk state files.
    #[serde(default)]
    pub files: FilesConfig,
    /// Chatbot pipeline settings.
    #[serde(default)]
    pub chatbot: ChatBotConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

/// Bot identity and scheduling.
#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    /// Display name the bot keeps in the meeting.
    #[serde(default = "default_bot_name")]
    pub name: String,
    /// Prefix that marks a chat line as a command.
    #[serde(default = "default_command_prefix")]
    pub command_prefix: String,
    /// Seconds between periodic sweeps.
    #[serde(default = "default_tick_interval_secs")]
    pub tick_interval_secs: u64,
    /// Upper bound on waiting for queued audio when stopping.
    #[serde(default = "default_shutdown_grace_secs")]
    pub shutdown_grace_secs: u64,
    /// Start with participant sweeps paused.
    #[serde(default)]
    pub paused: bool,
    /// Start with verbose sweep logging.
    #[serde(default)]
    pub debug: bool,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: default_bot_name(),
            command_prefix: default_command_prefix(),
            tick_interval_secs: default_tick_interval_secs(),
            shutdown_grace_secs: default_shutdown_grace_secs(),
            paused: false,
            debug: false,
        }
    }
}

/// Waiting-room admission policy.
#[derive(Debug, Clone, Deserialize)]
pub struct AdmissionConfig {
    /// Minimum time an unknown participant waits before admission.
    #[serde(default = "default_unknown_wait_secs")]
    pub unknown_wait_secs: u64,
    /// Minimum spacing between two unknown admissions.
    #[serde(default = "default_unknown_throttle_secs")]
    pub unknown_throttle_secs: u64,
    /// Display names matching this regex are never admitted.
    #[serde(default)]
    pub bad_name_pattern: Option<String>,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            unknown_wait_secs: default_unknown_wait_secs(),
            unknown_throttle_secs: default_unknown_throttle_secs(),
            bad_name_pattern: None,
        }
    }
}

/// Canned broadcast messages.
///
/// Keys may list aliases separated by `|`; the first alias names the
/// broadcast for guard purposes.
#[derive(Debug, Clone, Deserialize)]
pub struct BroadcastConfig {
    /// Negative: once ever. Zero: unguarded. Positive: cooldown seconds.
    #[serde(default = "default_broadcast_guard_secs")]
    pub guard_secs: i64,
    #[serde(default)]
    pub commands: BTreeMap<String, String>,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            guard_secs: default_broadcast_guard_secs(),
            commands: BTreeMap::new(),
        }
    }
}

impl BroadcastConfig {
    /// Flatten aliases into `(alias, canonical, message)` triples.
    pub fn entries(&self) -> Vec<(String, String, String)> {
        let mut out = Vec::new();
        for (key, message) in &self.commands {
            let aliases: Vec<String> = key
                .split('|')
                .map(|a| a.trim().to_lowercase())
                .filter(|a| !a.is_empty())
                .collect();
            let Some(canonical) = aliases.first().cloned() else {
                continue;
            };
            for alias in aliases {
                out.push((alias, canonical.clone(), message.clone()));
            }
        }
        out
    }
}

/// Chat commands that trigger an email.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmailConfig {
    #[serde(default)]
    pub commands: BTreeMap<String, EmailCommandConfig>,
}

/// One email command: `/<name> <address> [argument]`.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailCommandConfig {
    /// Shown when a required argument is missing.
    #[serde(default)]
    pub args_example: String,
    /// Subject; `{0}` is replaced with the argument.
    pub subject: String,
    /// Body; `{0}` is replaced with the argument.
    pub body: String,
}

impl EmailCommandConfig {
    /// Whether the templates expect an argument.
    pub fn takes_arg(&self) -> bool {
        self.subject.contains("{0}") || self.body.contains("{0}")
    }
}

/// Periodic announcement to the waiting room.
#[derive(Debug, Clone, Deserialize)]
pub struct WaitingRoomConfig {
    #[serde(default)]
    pub message: Option<String>,
    /// Seconds between announcements; zero disables them.
    #[serde(default = "default_waiting_room_delay_secs")]
    pub delay_secs: u64,
}

impl Default for WaitingRoomConfig {
    fn default() -> Self {
        Self {
            message: None,
            delay_secs: default_waiting_room_delay_secs(),
        }
    }
}

/// Participant listing options.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingConfig {
    /// Append `#id` to names in listings.
    #[serde(default)]
    pub include_ids: bool,
}

/// On-disk state files.
#[derive(Debug, Clone, Deserialize)]
pub struct FilesConfig {
    #[serde(default = "default_trust_list_path")]
    pub trust_list: PathBuf,
    #[serde(default = "default_remote_commands_path")]
    pub remote_commands: PathBuf,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            trust_list: default_trust_list_path(),
            remote_commands: default_remote_commands_path(),
        }
    }
}

/// Chatbot pipeline settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatBotConfig {
    /// Per-plugin time limit for one reply.
    #[serde(default = "default_chatbot_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub keyword: KeywordBotConfig,
}

impl Default for ChatBotConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_chatbot_timeout_secs(),
            keyword: KeywordBotConfig::default(),
        }
    }
}

/// Built-in keyword chatbot.
#[derive(Debug, Clone, Deserialize)]
pub struct KeywordBotConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_keyword_priority")]
    pub priority: i32,
    /// Sent the first time someone greets the bot. `{0}` is their first name.
    #[serde(default)]
    pub greeting: Option<String>,
    /// Sent once per person when nothing else matched.
    #[serde(default = "default_one_time_message")]
    pub one_time_message: Option<String>,
    /// Keyword (with `|` aliases) to candidate replies.
    #[serde(default)]
    pub responses: BTreeMap<String, Vec<String>>,
}

impl Default for KeywordBotConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            priority: default_keyword_priority(),
            greeting: None,
            one_time_message: default_one_time_message(),
            responses: BTreeMap::new(),
        }
    }
}
