//! meetwarden replay driver.
//!
//! Reads newline-delimited JSON meeting events from stdin, feeds them to
//! the engine and logs every command the engine sends back.

use meetwarden::config::{Config, validate};
use meetwarden::control::SystemClock;
use meetwarden::engine::{Collaborators, Engine, MeetingEvent, spawn_ticker};
use meetwarden::replay::{InMemoryMeeting, Outbox};
use meetwarden::services::{ChatBotPipeline, KeywordBot};
use meetwarden::sound::{SoundItem, SoundQueue};
use meetwarden::state::Participant;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if std::env::var("MEETWARDEN_LOG_JSON").is_ok() {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    let config = if std::path::Path::new(&config_path).exists() {
        Config::load(&config_path).map_err(|e| {
            error!(path = %config_path, error = %e, "Failed to load config");
            e
        })?
    } else {
        warn!(path = %config_path, "Config file not found; using defaults");
        Config::default()
    };

    if let Err(errors) = validate(&config) {
        for e in &errors {
            error!(error = %e, "Config problem");
        }
        if errors.iter().any(|e| e.is_fatal()) {
            anyhow::bail!("Refusing to start with an invalid config");
        }
    }

    info!(bot = %config.bot.name, "Starting meetwarden");

    // In-memory meeting with the bot as host
    let mut me = Participant::attending(0, &config.bot.name);
    me.is_host = true;
    let meeting = Arc::new(InMemoryMeeting::new(me));

    // Audio queue; the replay driver only logs what would be played
    let (sound, mut player) = SoundQueue::new();
    tokio::spawn(async move {
        while let Some(item) = player.recv().await {
            match item {
                SoundItem::Speak(text) => info!(text = %text, "Speak"),
                SoundItem::Play(name) => info!(sound = %name, "Play"),
            }
            player.done();
        }
    });

    // Chatbot plugins
    let mut chatbots = ChatBotPipeline::new(Duration::from_secs(config.chatbot.timeout_secs));
    if config.chatbot.keyword.enabled {
        chatbots.register(Arc::new(KeywordBot::new(&config.chatbot.keyword)));
    }
    chatbots.start_all().await;
    info!(chatbots = ?chatbots.names(), "Chatbots started");

    let collaborators = Collaborators {
        control: meeting.clone(),
        sound: Arc::new(sound),
        email: Arc::new(Outbox::new()),
        clock: Arc::new(SystemClock),
    };
    let engine = Arc::new(Engine::new(config, collaborators, chatbots));

    let shutdown = CancellationToken::new();
    let ticker = spawn_ticker(Arc::clone(&engine), shutdown.clone());
    info!("Sweep task started");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => {
                        info!("End of input");
                        break;
                    }
                    Err(e) => {
                        error!(error = %e, "Failed to read input");
                        break;
                    }
                };
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<MeetingEvent>(&line) {
                    Ok(event) => {
                        debug!(event = ?event, "Event");
                        meeting.apply_event(&event);
                        engine.handle_event(event).await;
                    }
                    Err(e) => warn!(error = %e, line = %line, "Ignoring malformed event"),
                }
                if engine.has_left() {
                    break;
                }
            }
        }
    }

    engine.stop().await;
    shutdown.cancel();
    if let Err(e) = ticker.await {
        warn!(error = %e, "Sweep task ended abnormally");
    }

    info!(commands = meeting.actions().len(), "meetwarden stopped");
    Ok(())
}
