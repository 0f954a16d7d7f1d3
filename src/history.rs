//! Per-conversation rolling message history.
//!
//! Each conversation keeps at most [`MAX_HISTORY_TURNS`] turns; appending past
//! the bound discards the oldest turns first. The store tracks a bounded
//! number of conversations (least-recently-used eviction) so a long-lived
//! process talking to many peers does not grow without limit.

use std::collections::VecDeque;
use std::num::NonZeroUsize;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use lru::LruCache;
use tokio::sync::Mutex;

/// Maximum turns retained per conversation.
pub const MAX_HISTORY_TURNS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }
}

/// One role-tagged message unit in a conversation's history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ConversationTurn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Ordered turns for a single conversation, bounded to [`MAX_HISTORY_TURNS`].
#[derive(Debug, Default)]
pub struct ConversationHistory {
    turns: VecDeque<ConversationTurn>,
}

impl ConversationHistory {
    /// Append one turn, then trim from the front until the bound holds.
    pub fn push(&mut self, turn: ConversationTurn) {
        self.turns.push_back(turn);
        while self.turns.len() > MAX_HISTORY_TURNS {
            self.turns.pop_front();
        }
    }

    pub fn turns(&self) -> impl Iterator<Item = &ConversationTurn> {
        self.turns.iter()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

/// Shared handle to one conversation's history.
///
/// The mutex is the per-conversation serialization point: a caller doing a
/// read-then-append sequence (e.g. assembling a prompt and recording the
/// reply) holds the guard for the whole sequence, so concurrent events for
/// the same conversation observe a consistent turn order. Distinct
/// conversations never contend with each other.
pub type HistoryHandle = Arc<Mutex<ConversationHistory>>;

/// In-memory store of per-conversation histories.
///
/// Histories are created lazily on first access and live until evicted as the
/// least-recently-used entry once `max_conversations` distinct ids are
/// tracked. An in-flight caller holding an evicted handle finishes against
/// that handle; the store simply forgets the id.
pub struct ConversationHistoryStore {
    conversations: Mutex<LruCache<String, HistoryHandle>>,
}

impl ConversationHistoryStore {
    pub fn new(max_conversations: usize) -> Self {
        let cap = NonZeroUsize::new(max_conversations.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            conversations: Mutex::new(LruCache::new(cap)),
        }
    }

    /// Handle for `conversation_id`, created empty if absent. Never fails.
    pub async fn history(&self, conversation_id: &str) -> HistoryHandle {
        let mut conversations = self.conversations.lock().await;
        conversations
            .get_or_insert(conversation_id.to_string(), || {
                Arc::new(Mutex::new(ConversationHistory::default()))
            })
            .clone()
    }

    /// Current ordered turns for `conversation_id` (empty if untracked).
    pub async fn snapshot(&self, conversation_id: &str) -> Vec<ConversationTurn> {
        let handle = self.history(conversation_id).await;
        let history = handle.lock().await;
        history.turns().cloned().collect()
    }

    /// Append one turn to `conversation_id`'s history.
    pub async fn append(&self, conversation_id: &str, turn: ConversationTurn) {
        let handle = self.history(conversation_id).await;
        let mut history = handle.lock().await;
        history.push(turn);
    }

    /// Number of conversations currently tracked.
    pub async fn tracked(&self) -> usize {
        self.conversations.lock().await.len()
    }

    /// Whether `conversation_id` is tracked, without refreshing its recency.
    pub async fn is_tracked(&self, conversation_id: &str) -> bool {
        self.conversations.lock().await.contains(conversation_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn histories_are_created_lazily_and_start_empty() {
        let store = ConversationHistoryStore::new(16);
        assert!(store.snapshot("peer-1").await.is_empty());
        assert_eq!(store.tracked().await, 1);
    }

    #[tokio::test]
    async fn appends_preserve_arrival_order() {
        let store = ConversationHistoryStore::new(16);
        store.append("peer-1", ConversationTurn::user("one")).await;
        store
            .append("peer-1", ConversationTurn::assistant("two"))
            .await;
        store.append("peer-1", ConversationTurn::user("three")).await;

        let turns = store.snapshot("peer-1").await;
        let contents: Vec<&str> = turns.iter().map(|t| t.content.as_str()).collect();
        assert_eq!(contents, vec!["one", "two", "three"]);
    }

    #[tokio::test]
    async fn eleven_appends_keep_only_the_last_ten() {
        let store = ConversationHistoryStore::new(16);
        for i in 1..=11 {
            store
                .append("peer-1", ConversationTurn::user(format!("msg-{}", i)))
                .await;
        }

        let turns = store.snapshot("peer-1").await;
        assert_eq!(turns.len(), MAX_HISTORY_TURNS);
        assert_eq!(turns[0].content, "msg-2");
        assert_eq!(turns[9].content, "msg-11");
    }

    #[tokio::test]
    async fn history_length_is_min_of_appends_and_bound() {
        let store = ConversationHistoryStore::new(16);
        for n in [3usize, 10, 25] {
            let id = format!("peer-{}", n);
            for i in 0..n {
                store
                    .append(&id, ConversationTurn::user(format!("m{}", i)))
                    .await;
            }
            assert_eq!(store.snapshot(&id).await.len(), n.min(MAX_HISTORY_TURNS));
        }
    }

    #[tokio::test]
    async fn conversations_are_independent() {
        let store = ConversationHistoryStore::new(16);
        store.append("peer-1", ConversationTurn::user("hello")).await;
        assert!(store.snapshot("peer-2").await.is_empty());
        assert_eq!(store.snapshot("peer-1").await.len(), 1);
    }

    #[tokio::test]
    async fn least_recently_used_conversation_is_evicted_at_cap() {
        let store = ConversationHistoryStore::new(2);
        store.append("peer-1", ConversationTurn::user("a")).await;
        store.append("peer-2", ConversationTurn::user("b")).await;
        // Touch peer-1 so peer-2 becomes the eviction candidate.
        store.history("peer-1").await;
        store.append("peer-3", ConversationTurn::user("c")).await;

        assert_eq!(store.tracked().await, 2);
        assert!(store.is_tracked("peer-1").await);
        assert!(!store.is_tracked("peer-2").await);
        assert!(store.is_tracked("peer-3").await);
    }

    #[tokio::test]
    async fn timestamps_do_not_decrease_within_a_conversation() {
        let store = ConversationHistoryStore::new(4);
        for i in 0..5 {
            store
                .append("peer-1", ConversationTurn::user(format!("m{}", i)))
                .await;
        }
        let turns = store.snapshot("peer-1").await;
        for pair in turns.windows(2) {
            assert!(pair[0].timestamp <= pair[1].timestamp);
        }
    }
}
