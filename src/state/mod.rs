//! Session state owned by the engine.
//!
//! Participants belong to the meeting collaborator; everything else here
//! (trust levels, automation modes, name handling) is engine-side.

pub mod modes;
pub mod names;
mod participant;
pub mod trust;

pub use modes::{Mode, ModeFlags, ModeState};
pub use participant::{Participant, ParticipantId, ParticipantStatus, Recipient, Role};
pub use trust::{TrustLevel, TrustStore};
