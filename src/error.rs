//! Error types for meetwarden.
//!
//! Each collaborator seam gets its own enum. None of these are fatal to the
//! engine: callers log them and degrade the feature that failed.

use crate::state::ParticipantId;
use thiserror::Error;

// ============================================================================
// Meeting control
// ============================================================================

/// Errors reported by the meeting-control collaborator.
#[derive(Debug, Error)]
pub enum ControlError {
    #[error("no participant with id #{0}")]
    NoSuchParticipant(ParticipantId),

    #[error("meeting refused {action}: {reason}")]
    Refused { action: &'static str, reason: String },

    #[error("meeting control unavailable: {0}")]
    Unavailable(String),
}

impl ControlError {
    /// Static label used in structured log fields.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NoSuchParticipant(_) => "no_such_participant",
            Self::Refused { .. } => "refused",
            Self::Unavailable(_) => "unavailable",
        }
    }
}

// ============================================================================
// Chatbot plugins
// ============================================================================

/// Errors raised by (or around) a chatbot plugin.
#[derive(Debug, Error)]
pub enum ChatBotError {
    #[error("chatbot {0} is not started")]
    NotStarted(String),

    #[error("chatbot {name} failed: {reason}")]
    Failed { name: String, reason: String },

    #[error("chatbot {0} timed out")]
    Timeout(String),

    #[error("chatbot {0} panicked")]
    Panicked(String),
}

// ============================================================================
// Email
// ============================================================================

/// Errors reported by the email collaborator.
#[derive(Debug, Error)]
pub enum EmailError {
    #[error("invalid recipient address: {0}")]
    InvalidAddress(String),

    #[error("email delivery failed: {0}")]
    Delivery(String),
}

// ============================================================================
// Trust store
// ============================================================================

/// Errors from loading or persisting the trust list.
#[derive(Debug, Error)]
pub enum TrustStoreError {
    #[error("trust list I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// ============================================================================
// Templates
// ============================================================================

/// A reply template that cannot be rendered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("unclosed '{{' at byte {0}")]
    Unclosed(usize),

    #[error("stray '}}' at byte {0}")]
    StrayClose(usize),

    #[error("unknown placeholder {{{0}}}")]
    UnknownKey(String),
}
