//! The auto-reply decision pipeline.
//!
//! Every inbound message event runs the eligibility filter; eligible events
//! get a generated reply (or the canned fallback) sent back through the host.
//! No failure on any path is allowed to reach the host's event dispatch, so
//! the subscription stays healthy across repeated errors.

use std::sync::Arc;

use crate::generator::{GenerationOutcome, ReplyGenerator};
use crate::host::{
    AutoReplySettings, ConversationClassifier, HostEvent, InboundMessageEvent, MessageSender,
    SettingsProvider,
};
use crate::persona::AgentPersona;

/// Canned reply sent when no generated reply is available.
pub const FALLBACK_TEXT: &str = "I'm currently away and will respond to your message later.";

/// Why an event was filtered out. Each reason is a deliberate no-op, not an
/// error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuppressReason {
    Disabled,
    Outgoing,
    MissingConversationId,
    ChannelOrigin,
}

/// Terminal result of handling one inbound message event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyOutcome {
    /// A generated reply went out.
    Sent(String),
    /// No reply was generated; the fallback text went out instead.
    FellBack,
    /// The event failed the eligibility filter; nothing was sent.
    Suppressed(SuppressReason),
    /// The host send API failed; logged, not retried.
    SendFailed,
}

/// Subscribes to host events and drives reply generation for eligible
/// inbound messages.
pub struct AutoReplyPolicy {
    settings: Arc<dyn SettingsProvider>,
    sender: Arc<dyn MessageSender>,
    classifier: Arc<dyn ConversationClassifier>,
    generator: ReplyGenerator,
}

impl AutoReplyPolicy {
    pub fn new(
        settings: Arc<dyn SettingsProvider>,
        sender: Arc<dyn MessageSender>,
        classifier: Arc<dyn ConversationClassifier>,
        generator: ReplyGenerator,
    ) -> Self {
        Self {
            settings,
            sender,
            classifier,
            generator,
        }
    }

    /// Handle one inbound message event. Infallible by construction: every
    /// internal failure is absorbed into the returned outcome.
    pub async fn on_new_message(&self, event: &InboundMessageEvent) -> PolicyOutcome {
        // Settings are read per event, never cached.
        let settings = self.settings.settings().await;

        if !settings.enabled {
            tracing::debug!("Auto-reply disabled, ignoring message");
            return PolicyOutcome::Suppressed(SuppressReason::Disabled);
        }

        if event.outgoing {
            tracing::debug!("Skipping outgoing message");
            return PolicyOutcome::Suppressed(SuppressReason::Outgoing);
        }

        let conversation_id = match event.conversation_id.as_deref() {
            Some(id) if !id.trim().is_empty() => id,
            _ => {
                tracing::debug!("Message has no conversation id");
                return PolicyOutcome::Suppressed(SuppressReason::MissingConversationId);
            }
        };

        if self.classifier.is_channel(conversation_id) {
            tracing::debug!("Skipping channel message (conversation={})", conversation_id);
            return PolicyOutcome::Suppressed(SuppressReason::ChannelOrigin);
        }

        let persona =
            AgentPersona::from_settings(&settings.agent, settings.custom_agent.as_deref());
        tracing::debug!(
            "Generating reply (conversation={}, persona={:?})",
            conversation_id,
            persona
        );

        let outcome = self
            .generator
            .generate(&event.text, conversation_id, &persona)
            .await;

        match outcome {
            GenerationOutcome::Reply(text) => {
                match self.sender.send_text(conversation_id, &text).await {
                    Ok(()) => {
                        tracing::info!("Sent auto-reply (conversation={})", conversation_id);
                        PolicyOutcome::Sent(text)
                    }
                    Err(e) => {
                        tracing::error!(
                            "Failed to send auto-reply (conversation={}): {:#}",
                            conversation_id,
                            e
                        );
                        PolicyOutcome::SendFailed
                    }
                }
            }
            // Service failure and empty candidate both mean "no reply"; send
            // the canned fallback either way.
            GenerationOutcome::EmptyCandidate | GenerationOutcome::ServiceError => {
                match self.sender.send_text(conversation_id, FALLBACK_TEXT).await {
                    Ok(()) => {
                        tracing::info!("Sent fallback reply (conversation={})", conversation_id);
                        PolicyOutcome::FellBack
                    }
                    Err(e) => {
                        tracing::error!(
                            "Failed to send fallback reply (conversation={}): {:#}",
                            conversation_id,
                            e
                        );
                        PolicyOutcome::SendFailed
                    }
                }
            }
        }
    }

    /// Settings changes are observed for diagnostics only.
    pub fn on_settings_updated(&self, settings: &AutoReplySettings) {
        tracing::info!(
            "Auto-reply settings updated (enabled={}, agent={})",
            settings.enabled,
            settings.agent
        );
    }

    /// Consume host events until the channel closes.
    ///
    /// Each inbound message is handled on its own task, so a slow completion
    /// call in one conversation never stalls event dispatch or another
    /// conversation's reply.
    pub async fn run(self: Arc<Self>, events: flume::Receiver<HostEvent>) {
        while let Ok(event) = events.recv_async().await {
            match event {
                HostEvent::NewMessage(message) => {
                    let policy = self.clone();
                    tokio::spawn(async move {
                        let outcome = policy.on_new_message(&message).await;
                        tracing::debug!("Auto-reply outcome: {:?}", outcome);
                    });
                }
                HostEvent::SettingsUpdated(settings) => self.on_settings_updated(&settings),
            }
        }
        tracing::info!("Host event channel closed, auto-reply loop exiting");
    }
}
