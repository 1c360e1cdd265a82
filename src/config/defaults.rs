//! Default value functions for configuration.
//!
//! Separated into its own module for clarity and reuse.

use std::path::PathBuf;

/// Returns `true` (for serde defaults).
pub fn default_true() -> bool {
    true
}

// =============================================================================
// Bot Defaults
// =============================================================================

pub fn default_bot_name() -> String {
    "UsherBot".to_string()
}

pub fn default_command_prefix() -> String {
    "/".to_string()
}

pub fn default_tick_interval_secs() -> u64 {
    5
}

pub fn default_shutdown_grace_secs() -> u64 {
    5
}

// =============================================================================
// Admission Defaults
// =============================================================================

pub fn default_unknown_wait_secs() -> u64 {
    30
}

pub fn default_unknown_throttle_secs() -> u64 {
    15
}

// =============================================================================
// Broadcast / Waiting Room Defaults
// =============================================================================

pub fn default_broadcast_guard_secs() -> i64 {
    300
}

pub fn default_waiting_room_delay_secs() -> u64 {
    60
}

// =============================================================================
// File Defaults
// =============================================================================

pub fn default_trust_list_path() -> PathBuf {
    PathBuf::from("good_users.txt")
}

pub fn default_remote_commands_path() -> PathBuf {
    PathBuf::from("command_file.txt")
}

// =============================================================================
// Chatbot Defaults
// =============================================================================

pub fn default_chatbot_timeout_secs() -> u64 {
    5
}

pub fn default_keyword_priority() -> i32 {
    10
}

pub fn default_one_time_message() -> Option<String> {
    Some("I'm just a Bot. If you need something, please chat with one of the Co-Hosts.".to_string())
}
