//! Chatbot services.
//!
//! Chatbots are plugins that answer conversational chat. The engine only
//! sees them through [`ChatBotPipeline`], which asks each in priority
//! order and keeps the first answer.

pub mod keyword;
mod pipeline;
mod traits;

pub use keyword::KeywordBot;
pub use pipeline::ChatBotPipeline;
pub use traits::{ChatBot, ChatBotInfo};
