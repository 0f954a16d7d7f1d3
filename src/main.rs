//! Local harness for the auto-reply pipeline.
//!
//! Reads lines from stdin as inbound messages in a single conversation and
//! prints whatever the pipeline decides to send back, so the filter, history,
//! and completion call can be exercised against a real OpenAI-compatible
//! endpoint without a host chat application.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use autoreply::config::AutoReplyConfig;
use autoreply::generator::ReplyGenerator;
use autoreply::history::ConversationHistoryStore;
use autoreply::host::{
    AutoReplySettings, ConversationClassifier, HostEvent, InboundMessageEvent, MessageSender,
    SettingsProvider,
};
use autoreply::llm_client::LlmClient;
use autoreply::policy::AutoReplyPolicy;

/// Serves the configured settings on every read.
struct ConfigSettings(AutoReplySettings);

#[async_trait]
impl SettingsProvider for ConfigSettings {
    async fn settings(&self) -> AutoReplySettings {
        self.0.clone()
    }
}

/// Prints outgoing messages to stdout in place of a real send API.
struct ConsoleSender;

#[async_trait]
impl MessageSender for ConsoleSender {
    async fn send_text(&self, conversation_id: &str, text: &str) -> Result<()> {
        println!("[{}] <- {}", conversation_id, text);
        Ok(())
    }
}

/// Ids prefixed "channel:" are broadcast channels; everything else is direct.
struct PrefixClassifier;

impl ConversationClassifier for PrefixClassifier {
    fn is_channel(&self, conversation_id: &str) -> bool {
        conversation_id.starts_with("channel:")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AutoReplyConfig::load();

    tracing::info!(
        "Auto-reply harness starting (endpoint={}, model={}, agent={})",
        config.llm_api_url,
        config.llm_model,
        config.auto_reply_agent
    );
    if config.llm_api_key.is_none() {
        tracing::warn!("No API key configured; only keyless local endpoints will work");
    }

    let client = LlmClient::new(
        config.llm_api_url.clone(),
        config.llm_api_key.clone().unwrap_or_default(),
        config.llm_model.clone(),
        Duration::from_secs(config.completion_timeout_secs),
    )
    .context("failed to build completion client")?;

    let store = Arc::new(ConversationHistoryStore::new(
        config.max_tracked_conversations,
    ));
    let generator = ReplyGenerator::new(Arc::new(client), store);

    let settings = AutoReplySettings {
        enabled: config.auto_reply_enabled,
        agent: config.auto_reply_agent.clone(),
        custom_agent: config.custom_auto_reply_agent.clone(),
    };
    let policy = Arc::new(AutoReplyPolicy::new(
        Arc::new(ConfigSettings(settings)),
        Arc::new(ConsoleSender),
        Arc::new(PrefixClassifier),
        generator,
    ));

    let (event_tx, event_rx) = flume::unbounded();
    let policy_loop = tokio::spawn(policy.run(event_rx));

    let conversation_id = format!("local-{}", uuid::Uuid::new_v4());
    tracing::info!(
        "Type a message and press enter (conversation={}); Ctrl-D to exit",
        conversation_id
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        event_tx
            .send_async(HostEvent::NewMessage(InboundMessageEvent {
                conversation_id: Some(conversation_id.clone()),
                text: text.to_string(),
                outgoing: false,
            }))
            .await
            .context("event channel closed")?;
    }

    drop(event_tx);
    policy_loop.await.context("policy loop panicked")?;
    Ok(())
}
