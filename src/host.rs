//! Interfaces to the host chat system.
//!
//! The host delivers events over a channel and exposes three capabilities the
//! pipeline needs: the user's current auto-reply settings, a send API, and a
//! peer classifier. All three are traits so the host side stays swappable
//! (and stubbable in tests).

use anyhow::Result;
use async_trait::async_trait;

/// A new-message event as delivered by the host. Read-only input.
#[derive(Debug, Clone)]
pub struct InboundMessageEvent {
    /// Opaque stable id of the peer/chat the message belongs to, when known.
    pub conversation_id: Option<String>,
    pub text: String,
    /// True for messages sent by this user (self-sent echoes).
    pub outgoing: bool,
}

/// The user's auto-reply settings as stored by the host.
#[derive(Debug, Clone)]
pub struct AutoReplySettings {
    pub enabled: bool,
    /// Agent kind: "professional", "friendly", "concise", or "custom".
    pub agent: String,
    /// Free-form persona prompt, used when `agent` is "custom".
    pub custom_agent: Option<String>,
}

/// Events the host pushes to the pipeline.
#[derive(Debug, Clone)]
pub enum HostEvent {
    NewMessage(InboundMessageEvent),
    SettingsUpdated(AutoReplySettings),
}

/// Read access to the host's settings state. Queried on every event so
/// settings changes take effect immediately.
#[async_trait]
pub trait SettingsProvider: Send + Sync {
    async fn settings(&self) -> AutoReplySettings;
}

/// The host's outgoing-message API.
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send_text(&self, conversation_id: &str, text: &str) -> Result<()>;
}

/// Classifies conversations by origin. Broadcast channels never get
/// auto-replies.
pub trait ConversationClassifier: Send + Sync {
    fn is_channel(&self, conversation_id: &str) -> bool;
}
