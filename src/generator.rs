//! Reply generation: history in, persona-conditioned completion out.

use std::sync::Arc;

use crate::history::{ConversationHistoryStore, ConversationTurn};
use crate::llm_client::{ChatMessage, CompletionService};
use crate::persona::AgentPersona;

/// What one generation attempt produced.
///
/// The distinction between an unreachable service and a service that declined
/// to answer is kept here for logging and tests; callers deciding what to
/// send collapse both to "no reply".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    Reply(String),
    /// The call succeeded but produced no text.
    EmptyCandidate,
    /// The call failed (network, auth, decode, timeout). Already logged.
    ServiceError,
}

impl GenerationOutcome {
    /// The generated text, when there is one.
    pub fn reply(&self) -> Option<&str> {
        match self {
            GenerationOutcome::Reply(text) => Some(text),
            _ => None,
        }
    }
}

/// Produces replies for inbound messages and keeps the conversation history
/// current as it does so.
pub struct ReplyGenerator {
    service: Arc<dyn CompletionService>,
    store: Arc<ConversationHistoryStore>,
}

impl ReplyGenerator {
    pub fn new(service: Arc<dyn CompletionService>, store: Arc<ConversationHistoryStore>) -> Self {
        Self { service, store }
    }

    pub fn store(&self) -> &Arc<ConversationHistoryStore> {
        &self.store
    }

    /// Generate a reply to `message_text` in `conversation_id`.
    ///
    /// The prompt is the persona's system instruction, the conversation's
    /// existing turns in order, then the new message. The conversation's
    /// history lock is held across the whole read-call-append sequence, so
    /// concurrent events for the same conversation are processed one at a
    /// time while other conversations proceed independently.
    ///
    /// Never fails: service errors are logged and reported as
    /// [`GenerationOutcome::ServiceError`].
    pub async fn generate(
        &self,
        message_text: &str,
        conversation_id: &str,
        persona: &AgentPersona,
    ) -> GenerationOutcome {
        let handle = self.store.history(conversation_id).await;
        let mut history = handle.lock().await;

        let mut messages = vec![ChatMessage::new("system", persona.system_instruction())];
        messages.extend(
            history
                .turns()
                .map(|turn| ChatMessage::new(turn.role.as_str(), turn.content.clone())),
        );
        messages.push(ChatMessage::new("user", message_text));

        history.push(ConversationTurn::user(message_text));

        match self.service.complete(messages).await {
            Ok(reply) if !reply.is_empty() => {
                history.push(ConversationTurn::assistant(reply.clone()));
                GenerationOutcome::Reply(reply)
            }
            Ok(_) => {
                tracing::debug!(
                    "Completion returned no candidate (conversation={})",
                    conversation_id
                );
                GenerationOutcome::EmptyCandidate
            }
            Err(e) => {
                tracing::warn!(
                    "Completion request failed (conversation={}): {:#}",
                    conversation_id,
                    e
                );
                GenerationOutcome::ServiceError
            }
        }
    }
}
