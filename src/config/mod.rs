//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: Config struct definitions and loading
//! - [`defaults`]: serde default functions
//! - [`validation`]: startup checks that collect every problem at once

pub mod defaults;
mod types;
mod validation;

pub use types::{
    AdmissionConfig, BotConfig, BroadcastConfig, ChatBotConfig, Config, ConfigError,
    EmailCommandConfig, EmailConfig, FilesConfig, KeywordBotConfig, ListingConfig,
    WaitingRoomConfig,
};
pub use validation::{ValidationError, validate};
