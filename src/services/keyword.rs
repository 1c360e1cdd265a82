//! Built-in keyword chatbot.
//!
//! Answers from a keyword table, greets each person once and otherwise
//! sends a one-time "I'm just a bot" note.

use super::traits::{ChatBot, ChatBotInfo};
use crate::config::KeywordBotConfig;
use crate::error::ChatBotError;
use crate::state::Participant;
use crate::state::names::{first_name, normalize};
use async_trait::async_trait;
use parking_lot::Mutex;
use rand::seq::SliceRandom;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};

const GREETINGS: &[&str] = &["hi", "hello", "hey", "howdy", "greetings"];

#[derive(Debug, Default)]
struct Memory {
    greeted: HashSet<String>,
    noted: HashSet<String>,
    /// Last reply given to each person, to avoid repeating it.
    last_reply: HashMap<String, String>,
}

/// Keyword-table chatbot.
#[derive(Debug)]
pub struct KeywordBot {
    priority: i32,
    greeting: Option<String>,
    one_time_message: Option<String>,
    /// Lowercase keyword to candidate replies, aliases expanded.
    responses: Vec<(String, Vec<String>)>,
    memory: Mutex<Memory>,
    running: AtomicBool,
}

impl KeywordBot {
    pub const NAME: &'static str = "keyword";

    pub fn new(config: &KeywordBotConfig) -> Self {
        let mut responses = Vec::new();
        for (keys, replies) in &config.responses {
            if replies.is_empty() {
                continue;
            }
            for key in keys.split('|').map(|k| k.trim().to_lowercase()) {
                if !key.is_empty() {
                    responses.push((key, replies.clone()));
                }
            }
        }

        Self {
            priority: config.priority,
            greeting: config.greeting.clone(),
            one_time_message: config.one_time_message.clone(),
            responses,
            memory: Mutex::new(Memory::default()),
            running: AtomicBool::new(false),
        }
    }

    fn matching_replies(&self, text: &str) -> Option<&[String]> {
        let lowered = text.to_lowercase();
        let words: Vec<&str> = lowered
            .split(|c: char| !c.is_alphanumeric() && c != '\'')
            .filter(|w| !w.is_empty())
            .collect();

        self.responses
            .iter()
            .find(|(key, _)| {
                if key.contains(' ') {
                    lowered.contains(key.as_str())
                } else {
                    words.contains(&key.as_str())
                }
            })
            .map(|(_, replies)| replies.as_slice())
    }
}

fn is_greeting(text: &str) -> bool {
    text.split(|c: char| !c.is_alphabetic())
        .find(|w| !w.is_empty())
        .is_some_and(|w| GREETINGS.contains(&w.to_lowercase().as_str()))
}

#[async_trait]
impl ChatBot for KeywordBot {
    fn info(&self) -> ChatBotInfo {
        ChatBotInfo {
            name: Self::NAME.to_string(),
            priority: self.priority,
        }
    }

    async fn start(&self) -> Result<(), ChatBotError> {
        self.running.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    async fn converse(
        &self,
        text: &str,
        from: &Participant,
    ) -> Result<Option<String>, ChatBotError> {
        if !self.running.load(Ordering::SeqCst) {
            return Err(ChatBotError::NotStarted(Self::NAME.to_string()));
        }

        let who = normalize(&from.name);
        let mut memory = self.memory.lock();

        if let Some(replies) = self.matching_replies(text) {
            let last = memory.last_reply.get(&who);
            let fresh: Vec<&String> = replies.iter().filter(|r| Some(*r) != last).collect();
            let pool = if fresh.is_empty() { replies.iter().collect() } else { fresh };
            if let Some(&template) = pool.choose(&mut rand::thread_rng()) {
                memory.last_reply.insert(who, template.clone());
                return Ok(Some(template.replace("{0}", &first_name(&from.name))));
            }
        }

        if let Some(ref greeting) = self.greeting
            && is_greeting(text)
            && memory.greeted.insert(who.clone())
        {
            return Ok(Some(greeting.replace("{0}", &first_name(&from.name))));
        }

        if let Some(ref note) = self.one_time_message
            && memory.noted.insert(who)
        {
            return Ok(Some(note.clone()));
        }

        Ok(None)
    }
}
