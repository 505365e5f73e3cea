//! The help-center coordinator.
//!
//! One [`HelpCenter`] owns the chat transcripts, the waiting queue and the
//! agent roster for its Lambda container. Everything durable goes through the
//! [`HelpCenterStore`].

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{error, info, warn};
use uuid::Uuid;

use shared::{Error, Result};

use crate::conversation::{ConversationTurn, Conversations};
use crate::live_agent::{AgentDesk, LiveAgentReceipt, NewTicket, QueueEntry, TicketPriority};
use crate::responder;
use crate::screen_share::{generate_code, normalize_code, ScreenShareSession};
use crate::store::{ChatRecord, HelpCenterStore};

pub const DEFAULT_HISTORY_LIMIT: i64 = 10;
pub const MAX_HISTORY_LIMIT: i64 = 100;
const CODE_ATTEMPTS: usize = 5;

/// Answer to a chat message.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    pub response: String,
    pub session_id: String,
}

fn service_error(operation: &str, e: Error) -> Error {
    error!(operation, error = %e, "Help-center store call failed");
    Error::ExternalService(format!("{} failed: {}", operation, e))
}

pub struct HelpCenter {
    store: Arc<dyn HelpCenterStore>,
    conversations: Mutex<Conversations>,
    desk: Mutex<AgentDesk>,
    /// Serialises the code check and insert of session creation.
    screen_share: Mutex<()>,
}

impl HelpCenter {
    pub fn new(store: Arc<dyn HelpCenterStore>) -> Self {
        Self {
            store,
            conversations: Mutex::new(Conversations::default()),
            desk: Mutex::new(AgentDesk::default()),
            screen_share: Mutex::new(()),
        }
    }

    /// Answer a message, record both turns in the session and, for a signed-in
    /// user, persist the exchange.
    pub async fn send_message(
        &self,
        session_id: Option<&str>,
        message: &str,
        user_id: Option<Uuid>,
    ) -> Result<ChatReply> {
        if message.trim().is_empty() {
            return Err(Error::Validation("Message is required".to_string()));
        }

        let response = responder::answer(message);
        let now = Utc::now();
        let session_id = self
            .conversations
            .lock()
            .await
            .record_exchange(session_id, message, response, now);

        if let Some(user_id) = user_id {
            let record = ChatRecord {
                user_id,
                user_message: message.to_string(),
                ai_response: response.to_string(),
                created_at: now,
            };
            self.store
                .save_chat(&record)
                .await
                .map_err(|e| service_error("Saving conversation", e))?;
        }

        Ok(ChatReply {
            response: response.to_string(),
            session_id,
        })
    }

    /// Turns of one chat session, oldest first.
    pub async fn conversation(&self, session_id: &str) -> Vec<ConversationTurn> {
        self.conversations
            .lock()
            .await
            .get(session_id)
            .map(|c| c.turns().to_vec())
            .unwrap_or_default()
    }

    /// A user's persisted chats, newest first.
    pub async fn conversation_history(&self, user_id: Uuid, limit: Option<i64>) -> Result<Vec<ChatRecord>> {
        let limit = limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
        if !(1..=MAX_HISTORY_LIMIT).contains(&limit) {
            return Err(Error::Validation(format!(
                "limit must be between 1 and {}",
                MAX_HISTORY_LIMIT
            )));
        }

        self.store
            .recent_chats(user_id, limit)
            .await
            .map_err(|e| service_error("Fetching conversation history", e))
    }

    /// Open a live-chat ticket and put the user in the waiting queue.
    ///
    /// Nothing is queued if the ticket cannot be created.
    pub async fn request_live_agent(
        &self,
        user_id: Uuid,
        message: &str,
        priority: TicketPriority,
    ) -> Result<LiveAgentReceipt> {
        if message.trim().is_empty() {
            return Err(Error::Validation("Message is required".to_string()));
        }

        let ticket = NewTicket::live_chat(user_id, message, priority);
        let ticket_id = self
            .store
            .create_ticket(&ticket)
            .await
            .map_err(|e| service_error("Creating support ticket", e))?;

        let receipt = self.desk.lock().await.enqueue(QueueEntry {
            ticket_id,
            user_id,
            message: message.to_string(),
            timestamp: Utc::now(),
        });

        info!(
            ticket_id = %ticket_id,
            priority = priority.as_str(),
            position = receipt.position_in_queue,
            wait_minutes = receipt.estimated_wait_time,
            "User queued for live agent"
        );
        Ok(receipt)
    }

    /// Mark an agent online, returning how many agents are now online.
    pub async fn agent_online(&self, agent_id: Uuid) -> usize {
        let mut desk = self.desk.lock().await;
        if desk.agent_online(agent_id) {
            info!(agent_id = %agent_id, "Agent online");
        }
        desk.active_agents()
    }

    /// Mark an agent offline, returning how many agents are still online.
    pub async fn agent_offline(&self, agent_id: Uuid) -> usize {
        let mut desk = self.desk.lock().await;
        if desk.agent_offline(agent_id) {
            info!(agent_id = %agent_id, "Agent offline");
        }
        desk.active_agents()
    }

    /// Give the longest-waiting user to an online agent.
    pub async fn assign_next(&self, agent_id: Uuid) -> Result<Option<QueueEntry>> {
        let mut desk = self.desk.lock().await;
        if !desk.is_online(agent_id) {
            return Err(Error::Validation("Agent is not online".to_string()));
        }

        let next = desk.assign_next(agent_id);
        if let Some(entry) = &next {
            info!(agent_id = %agent_id, ticket_id = %entry.ticket_id, "Assigned queued user to agent");
        }
        Ok(next)
    }

    /// Start a screen-share session under `code`, or under a generated code
    /// when none is given. A code held by another active session is refused.
    pub async fn create_screen_share_session(&self, user_id: Uuid, code: Option<&str>) -> Result<ScreenShareSession> {
        let requested = code.map(normalize_code).transpose()?;
        let _guard = self.screen_share.lock().await;

        let session = match requested {
            Some(code) => {
                if self.code_in_use(&code).await? {
                    return Err(code_taken());
                }
                self.insert_session(user_id, code).await?.ok_or_else(code_taken)?
            }
            None => self.insert_with_generated_code(user_id).await?,
        };

        info!(session_id = %session.id, user_id = %user_id, "Screen share session created");
        Ok(session)
    }

    /// The active session with exactly this code. Expiry is reported on the
    /// session but not enforced here.
    pub async fn validate_screen_share_code(&self, code: &str) -> Result<Option<ScreenShareSession>> {
        self.store
            .find_active_session(code)
            .await
            .map_err(|e| service_error("Validating screen share code", e))
    }

    async fn code_in_use(&self, code: &str) -> Result<bool> {
        Ok(self.validate_screen_share_code(code).await?.is_some())
    }

    /// Insert a new session under `code`, or `None` if the store found the
    /// code already held by an active session.
    async fn insert_session(&self, user_id: Uuid, code: String) -> Result<Option<ScreenShareSession>> {
        let session = ScreenShareSession::new(user_id, code, Utc::now());
        let inserted = self
            .store
            .insert_screen_share_session(&session)
            .await
            .map_err(|e| service_error("Creating screen share session", e))?;
        Ok(inserted.then_some(session))
    }

    async fn insert_with_generated_code(&self, user_id: Uuid) -> Result<ScreenShareSession> {
        for _ in 0..CODE_ATTEMPTS {
            let code = generate_code(&mut rand::thread_rng());
            if !self.code_in_use(&code).await? {
                if let Some(session) = self.insert_session(user_id, code).await? {
                    return Ok(session);
                }
            }
            warn!("Generated confirmation code collided, retrying");
        }
        Err(Error::Internal("Could not allocate a confirmation code".to_string()))
    }
}

fn code_taken() -> Error {
    Error::Validation("Confirmation code is already in use".to_string())
}
