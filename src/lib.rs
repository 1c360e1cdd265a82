//! meetwarden - moderation and chat orchestration for live meetings.
//!
//! The [`engine::Engine`] takes participant and chat events from a meeting
//! application, decides who is admitted and promoted, answers chat
//! commands and conversation, and hands the meeting over when it leaves.
//! Everything it drives sits behind the traits in [`control`].

pub mod config;
pub mod control;
pub mod engine;
pub mod error;
pub mod replay;
pub mod security;
pub mod services;
pub mod sound;
pub mod state;
