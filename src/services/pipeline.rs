//! Ordered chain of chatbot plugins.

use super::traits::ChatBot;
use crate::error::ChatBotError;
use crate::state::Participant;
use futures_util::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Plugins sorted by ascending priority.
pub struct ChatBotPipeline {
    bots: Vec<Arc<dyn ChatBot>>,
    timeout: Duration,
}

impl ChatBotPipeline {
    pub fn new(timeout: Duration) -> Self {
        Self {
            bots: Vec::new(),
            timeout,
        }
    }

    /// Add a plugin. Equal priorities keep registration order.
    pub fn register(&mut self, bot: Arc<dyn ChatBot>) {
        let info = bot.info();
        debug!(bot = %info.name, priority = info.priority, "Chatbot registered");
        self.bots.push(bot);
        self.bots.sort_by_key(|b| b.info().priority);
    }

    pub fn len(&self) -> usize {
        self.bots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bots.is_empty()
    }

    /// Names in the order they will be asked.
    pub fn names(&self) -> Vec<String> {
        self.bots.iter().map(|b| b.info().name).collect()
    }

    /// Start every plugin; ones that fail to start are dropped.
    pub async fn start_all(&mut self) {
        let mut started = Vec::with_capacity(self.bots.len());
        for bot in self.bots.drain(..) {
            let name = bot.info().name;
            match bot.start().await {
                Ok(()) => {
                    info!(bot = %name, "Chatbot started");
                    started.push(bot);
                }
                Err(e) => error!(bot = %name, error = %e, "Chatbot failed to start; disabled"),
            }
        }
        self.bots = started;
    }

    pub async fn stop_all(&self) {
        for bot in &self.bots {
            bot.stop().await;
        }
    }

    /// Ask each plugin in turn and return the first reply.
    ///
    /// With `required` set only the plugin of that name is asked. A plugin
    /// that errors, panics or times out is skipped like one that had
    /// nothing to say.
    pub async fn converse(
        &self,
        text: &str,
        from: &Participant,
        required: Option<&str>,
    ) -> Option<String> {
        for bot in &self.bots {
            let name = bot.info().name;
            if required.is_some_and(|r| !r.eq_ignore_ascii_case(&name)) {
                continue;
            }

            match self.ask(bot.as_ref(), &name, text, from).await {
                Ok(Some(reply)) if !reply.trim().is_empty() => {
                    debug!(bot = %name, participant = %from, "Chatbot replied");
                    return Some(reply);
                }
                Ok(_) => {}
                Err(e) => warn!(bot = %name, error = %e, "Chatbot failed; trying next"),
            }
        }
        None
    }

    async fn ask(
        &self,
        bot: &dyn ChatBot,
        name: &str,
        text: &str,
        from: &Participant,
    ) -> Result<Option<String>, ChatBotError> {
        let call = tokio::time::timeout(self.timeout, bot.converse(text, from));
        match AssertUnwindSafe(call).catch_unwind().await {
            Ok(Ok(result)) => result,
            Ok(Err(_elapsed)) => Err(ChatBotError::Timeout(name.to_string())),
            Err(_panic) => Err(ChatBotError::Panicked(name.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ChatBotInfo;
    use async_trait::async_trait;

    struct Fixed {
        name: &'static str,
        priority: i32,
        reply: Result<Option<&'static str>, ()>,
    }

    #[async_trait]
    impl ChatBot for Fixed {
        fn info(&self) -> ChatBotInfo {
            ChatBotInfo {
                name: self.name.to_string(),
                priority: self.priority,
            }
        }

        async fn converse(
            &self,
            _text: &str,
            _from: &Participant,
        ) -> Result<Option<String>, ChatBotError> {
            match self.reply {
                Ok(r) => Ok(r.map(str::to_string)),
                Err(()) => Err(ChatBotError::Failed {
                    name: self.name.to_string(),
                    reason: "boom".to_string(),
                }),
            }
        }
    }

    struct Panics;

    #[async_trait]
    impl ChatBot for Panics {
        fn info(&self) -> ChatBotInfo {
            ChatBotInfo {
                name: "panics".to_string(),
                priority: 1,
            }
        }

        async fn converse(
            &self,
            _text: &str,
            _from: &Participant,
        ) -> Result<Option<String>, ChatBotError> {
            panic!("plugin bug")
        }
    }

    struct Slow;

    #[async_trait]
    impl ChatBot for Slow {
        fn info(&self) -> ChatBotInfo {
            ChatBotInfo {
                name: "slow".to_string(),
                priority: 0,
            }
        }

        async fn converse(
            &self,
            _text: &str,
            _from: &Participant,
        ) -> Result<Option<String>, ChatBotError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(Some("too late".to_string()))
        }
    }

    fn sender() -> Participant {
        Participant::attending(3, "Alice")
    }

    #[tokio::test]
    async fn test_falls_through_none_and_fault() {
        let mut pipeline = ChatBotPipeline::new(Duration::from_secs(1));
        pipeline.register(Arc::new(Fixed {
            name: "third",
            priority: 30,
            reply: Ok(Some("hello")),
        }));
        pipeline.register(Arc::new(Fixed {
            name: "first",
            priority: 10,
            reply: Ok(None),
        }));
        pipeline.register(Arc::new(Fixed {
            name: "second",
            priority: 20,
            reply: Err(()),
        }));

        assert_eq!(pipeline.names(), vec!["first", "second", "third"]);
        assert_eq!(
            pipeline.converse("hi", &sender(), None).await.as_deref(),
            Some("hello")
        );
    }

    #[tokio::test]
    async fn test_panic_is_contained() {
        let mut pipeline = ChatBotPipeline::new(Duration::from_secs(1));
        pipeline.register(Arc::new(Panics));
        pipeline.register(Arc::new(Fixed {
            name: "fallback",
            priority: 5,
            reply: Ok(Some("still here")),
        }));
        assert_eq!(
            pipeline.converse("hi", &sender(), None).await.as_deref(),
            Some("still here")
        );
    }

    #[tokio::test]
    async fn test_timeout_skips_plugin() {
        let mut pipeline = ChatBotPipeline::new(Duration::from_millis(100));
        pipeline.register(Arc::new(Slow));
        pipeline.register(Arc::new(Fixed {
            name: "quick",
            priority: 5,
            reply: Ok(Some("quick answer")),
        }));
        assert_eq!(
            pipeline.converse("hi", &sender(), None).await.as_deref(),
            Some("quick answer")
        );
    }

    #[tokio::test]
    async fn test_required_bot_only() {
        let mut pipeline = ChatBotPipeline::new(Duration::from_secs(1));
        pipeline.register(Arc::new(Fixed {
            name: "a",
            priority: 1,
            reply: Ok(Some("from a")),
        }));
        pipeline.register(Arc::new(Fixed {
            name: "b",
            priority: 2,
            reply: Ok(Some("from b")),
        }));
        assert_eq!(
            pipeline.converse("hi", &sender(), Some("B")).await.as_deref(),
            Some("from b")
        );
        assert_eq!(pipeline.converse("hi", &sender(), Some("zzz")).await, None);
    }

    #[tokio::test]
    async fn test_empty_pipeline_returns_none() {
        let pipeline = ChatBotPipeline::new(Duration::from_secs(1));
        assert!(pipeline.converse("anything", &sender(), None).await.is_none());
    }
}
