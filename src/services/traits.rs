use crate::error::ChatBotError;
use crate::state::Participant;
use async_trait::async_trait;

/// Name and ordering of a chatbot plugin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatBotInfo {
    pub name: String,
    /// Lower runs first.
    pub priority: i32,
}

/// Trait for chatbot plugins.
///
/// A plugin is configured when constructed, started once before the first
/// message and stopped when the engine shuts down.
#[async_trait]
pub trait ChatBot: Send + Sync {
    fn info(&self) -> ChatBotInfo;

    async fn start(&self) -> Result<(), ChatBotError> {
        Ok(())
    }

    async fn stop(&self) {}

    /// Reply to `text` from `from`, or `None` to let the next plugin try.
    ///
    /// A reply starting with the command prefix is run as a command on
    /// behalf of the sender.
    async fn converse(&self, text: &str, from: &Participant)
    -> Result<Option<String>, ChatBotError>;
}
