//! In-memory chat transcripts.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One message in a chat session. Never changed once appended.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// Ordered turns of one chat session.
#[derive(Debug, Default)]
pub struct Conversation {
    turns: Vec<ConversationTurn>,
}

impl Conversation {
    /// Append a turn. Timestamps are kept strictly increasing even when the
    /// clock reads the same instant for consecutive turns.
    pub fn push(&mut self, role: Role, content: impl Into<String>, now: DateTime<Utc>) {
        let timestamp = match self.turns.last() {
            Some(last) if now <= last.timestamp => last.timestamp + Duration::microseconds(1),
            _ => now,
        };

        self.turns.push(ConversationTurn {
            role,
            content: content.into(),
            timestamp,
        });
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    fn last_activity(&self) -> Option<DateTime<Utc>> {
        self.turns.last().map(|turn| turn.timestamp)
    }
}

/// Sessions kept per container before the least recently active is dropped.
pub const MAX_SESSIONS: usize = 1000;
/// Sessions idle this long are dropped when a new session starts.
pub const SESSION_IDLE_MINUTES: i64 = 60;

/// Conversations keyed by chat session id, bounded in count and idle age.
#[derive(Debug)]
pub struct Conversations {
    sessions: HashMap<String, Conversation>,
    max_sessions: usize,
    idle_timeout: Duration,
}

impl Default for Conversations {
    fn default() -> Self {
        Self::with_limits(MAX_SESSIONS, Duration::minutes(SESSION_IDLE_MINUTES))
    }
}

impl Conversations {
    pub fn with_limits(max_sessions: usize, idle_timeout: Duration) -> Self {
        Self {
            sessions: HashMap::new(),
            max_sessions: max_sessions.max(1),
            idle_timeout,
        }
    }

    /// Record a question and its answer as consecutive turns, returning the
    /// session id used. A missing or blank id starts a new session.
    pub fn record_exchange(
        &mut self,
        session_id: Option<&str>,
        question: &str,
        answer: &str,
        now: DateTime<Utc>,
    ) -> String {
        let session_id = session_id
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        if !self.sessions.contains_key(&session_id) {
            self.make_room(now);
        }

        let conversation = self.sessions.entry(session_id.clone()).or_default();
        conversation.push(Role::User, question, now);
        conversation.push(Role::Assistant, answer, now);

        session_id
    }

    pub fn get(&self, session_id: &str) -> Option<&Conversation> {
        self.sessions.get(session_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Drop idle sessions, then the least recently active ones until a new
    /// session fits.
    fn make_room(&mut self, now: DateTime<Utc>) {
        let cutoff = now - self.idle_timeout;
        self.sessions
            .retain(|_, conversation| conversation.last_activity().is_some_and(|at| at > cutoff));

        while self.sessions.len() >= self.max_sessions {
            let oldest = self
                .sessions
                .iter()
                .min_by_key(|(_, conversation)| conversation.last_activity())
                .map(|(id, _)| id.clone());
            match oldest {
                Some(id) => {
                    self.sessions.remove(&id);
                }
                None => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turns_strictly_ordered_for_same_instant() {
        let now = Utc::now();
        let mut conversation = Conversation::default();
        conversation.push(Role::User, "hi", now);
        conversation.push(Role::Assistant, "hello", now);
        conversation.push(Role::User, "again", now - Duration::seconds(5));

        let turns = conversation.turns();
        assert_eq!(turns.len(), 3);
        assert!(turns[0].timestamp < turns[1].timestamp);
        assert!(turns[1].timestamp < turns[2].timestamp);
    }

    #[test]
    fn test_exchange_appends_user_then_assistant() {
        let mut conversations = Conversations::default();
        let id = conversations.record_exchange(None, "How do I create event", "answer", Utc::now());

        let turns = conversations.get(&id).unwrap().turns();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].role, Role::User);
        assert_eq!(turns[0].content, "How do I create event");
        assert_eq!(turns[1].role, Role::Assistant);
    }

    #[test]
    fn test_sessions_are_kept_apart() {
        let mut conversations = Conversations::default();
        let now = Utc::now();
        conversations.record_exchange(Some("a"), "one", "1", now);
        conversations.record_exchange(Some("a"), "two", "2", now);
        conversations.record_exchange(Some("b"), "three", "3", now);

        assert_eq!(conversations.get("a").unwrap().len(), 4);
        assert_eq!(conversations.get("b").unwrap().len(), 2);
        assert!(conversations.get("c").is_none());
    }

    #[test]
    fn test_least_recently_active_session_is_evicted_at_capacity() {
        let mut conversations = Conversations::with_limits(2, Duration::hours(1));
        let start = Utc::now();
        conversations.record_exchange(Some("a"), "one", "1", start);
        conversations.record_exchange(Some("b"), "two", "2", start + Duration::seconds(1));
        // "a" becomes the most recently active
        conversations.record_exchange(Some("a"), "three", "3", start + Duration::seconds(2));

        conversations.record_exchange(Some("c"), "four", "4", start + Duration::seconds(3));

        assert_eq!(conversations.len(), 2);
        assert!(conversations.get("b").is_none());
        assert_eq!(conversations.get("a").unwrap().len(), 4);
        assert!(conversations.get("c").is_some());
    }

    #[test]
    fn test_idle_sessions_are_dropped_when_a_new_one_starts() {
        let mut conversations = Conversations::with_limits(100, Duration::minutes(30));
        let start = Utc::now();
        conversations.record_exchange(Some("stale"), "q", "a", start);
        conversations.record_exchange(Some("fresh"), "q", "a", start + Duration::minutes(20));

        conversations.record_exchange(None, "q", "a", start + Duration::minutes(40));

        assert!(conversations.get("stale").is_none());
        assert!(conversations.get("fresh").is_some());
        assert_eq!(conversations.len(), 2);
    }

    #[test]
    fn test_anonymous_chats_stay_bounded() {
        let mut conversations = Conversations::with_limits(10, Duration::hours(1));
        let now = Utc::now();
        for _ in 0..50 {
            conversations.record_exchange(None, "hello", "hi", now);
        }
        assert_eq!(conversations.len(), 10);
    }

    #[test]
    fn test_blank_session_id_starts_new_session() {
        let mut conversations = Conversations::default();
        let id = conversations.record_exchange(Some("  "), "q", "a", Utc::now());
        assert!(Uuid::parse_str(&id).is_ok());
    }
}
