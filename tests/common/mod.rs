//! Integration test common infrastructure.
//!
//! Builds an engine on top of the in-memory meeting with a manual clock,
//! a recording outbox and a trust list in a temporary directory.

pub mod meeting;

#[allow(unused_imports)]
pub use meeting::{BOT_ID, TestMeeting};
