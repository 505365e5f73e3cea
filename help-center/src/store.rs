//! Help-center persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use shared::Result;

use crate::live_agent::NewTicket;
use crate::screen_share::{ScreenShareSession, SessionStatus};

/// One question and its answer, as stored in `help_chat_conversations`.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ChatRecord {
    pub user_id: Uuid,
    pub user_message: String,
    pub ai_response: String,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait HelpCenterStore: Send + Sync {
    async fn save_chat(&self, record: &ChatRecord) -> Result<()>;

    /// Most recent chats for a user, newest first.
    async fn recent_chats(&self, user_id: Uuid, limit: i64) -> Result<Vec<ChatRecord>>;

    /// Create a support ticket, returning its id.
    async fn create_ticket(&self, ticket: &NewTicket) -> Result<Uuid>;

    /// Insert the session unless another active session holds its code.
    /// Returns false, inserting nothing, on such a conflict.
    async fn insert_screen_share_session(&self, session: &ScreenShareSession) -> Result<bool>;

    /// The `active` session holding this exact code, if any.
    async fn find_active_session(&self, confirmation_code: &str) -> Result<Option<ScreenShareSession>>;
}

/// [`HelpCenterStore`] over the project's Postgres database.
pub struct PgHelpCenterStore {
    pool: PgPool,
}

impl PgHelpCenterStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct SessionRow {
    id: Uuid,
    user_id: Uuid,
    confirmation_code: String,
    status: String,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl SessionRow {
    fn into_session(self) -> Result<ScreenShareSession> {
        Ok(ScreenShareSession {
            id: self.id,
            user_id: self.user_id,
            confirmation_code: self.confirmation_code,
            status: SessionStatus::parse(&self.status)?,
            created_at: self.created_at,
            expires_at: self.expires_at,
        })
    }
}

#[async_trait]
impl HelpCenterStore for PgHelpCenterStore {
    async fn save_chat(&self, record: &ChatRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO help_chat_conversations (user_id, user_message, ai_response, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(record.user_id)
        .bind(&record.user_message)
        .bind(&record.ai_response)
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn recent_chats(&self, user_id: Uuid, limit: i64) -> Result<Vec<ChatRecord>> {
        let rows = sqlx::query_as::<_, ChatRecord>(
            r#"
            SELECT user_id, user_message, ai_response, created_at
            FROM help_chat_conversations
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn create_ticket(&self, ticket: &NewTicket) -> Result<Uuid> {
        let id = sqlx::query_scalar(
            r#"
            INSERT INTO support_tickets (user_id, title, description, category, priority, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(ticket.user_id)
        .bind(&ticket.title)
        .bind(&ticket.description)
        .bind(&ticket.category)
        .bind(ticket.priority.as_str())
        .bind(&ticket.status)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    async fn insert_screen_share_session(&self, session: &ScreenShareSession) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO screen_share_sessions (id, user_id, confirmation_code, status, created_at, expires_at)
            SELECT $1, $2, $3, $4, $5, $6
            WHERE NOT EXISTS (
                SELECT 1 FROM screen_share_sessions
                WHERE confirmation_code = $3 AND status = 'active'
            )
            "#,
        )
        .bind(session.id)
        .bind(session.user_id)
        .bind(&session.confirmation_code)
        .bind(session.status.as_str())
        .bind(session.created_at)
        .bind(session.expires_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => Ok(done.rows_affected() == 1),
            // a partial unique index on active codes reports the race as a violation
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_active_session(&self, confirmation_code: &str) -> Result<Option<ScreenShareSession>> {
        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT id, user_id, confirmation_code, status, created_at, expires_at
            FROM screen_share_sessions
            WHERE confirmation_code = $1 AND status = 'active'
            LIMIT 1
            "#,
        )
        .bind(confirmation_code)
        .fetch_optional(&self.pool)
        .await?;

        row.map(SessionRow::into_session).transpose()
    }
}

#[cfg(test)]
pub(crate) mod memory {
    use std::sync::{Mutex, MutexGuard};

    use super::*;
    use shared::Error;

    fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
        mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// In-memory [`HelpCenterStore`] that can be told to fail every call, or to
    /// yield to the scheduler inside session lookups and inserts.
    #[derive(Default)]
    pub struct MemoryHelpCenterStore {
        pub fail: bool,
        pub yielding: bool,
        /// Refuse every session insert as if another container held the code.
        pub conflicting: bool,
        pub chats: Mutex<Vec<ChatRecord>>,
        pub tickets: Mutex<Vec<(Uuid, NewTicket)>>,
        pub sessions: Mutex<Vec<ScreenShareSession>>,
    }

    impl MemoryHelpCenterStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        pub fn yielding() -> Self {
            Self {
                yielding: true,
                ..Self::default()
            }
        }

        pub fn conflicting() -> Self {
            Self {
                conflicting: true,
                ..Self::default()
            }
        }

        pub fn sessions(&self) -> Vec<ScreenShareSession> {
            lock(&self.sessions).clone()
        }

        async fn pause(&self) {
            if self.yielding {
                tokio::task::yield_now().await;
            }
        }

        pub fn with_session(self, session: ScreenShareSession) -> Self {
            lock(&self.sessions).push(session);
            self
        }

        pub fn chats(&self) -> Vec<ChatRecord> {
            lock(&self.chats).clone()
        }

        pub fn tickets(&self) -> Vec<(Uuid, NewTicket)> {
            lock(&self.tickets).clone()
        }

        fn check(&self) -> Result<()> {
            if self.fail {
                return Err(Error::Database(sqlx::Error::PoolTimedOut));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl HelpCenterStore for MemoryHelpCenterStore {
        async fn save_chat(&self, record: &ChatRecord) -> Result<()> {
            self.check()?;
            lock(&self.chats).push(record.clone());
            Ok(())
        }

        async fn recent_chats(&self, user_id: Uuid, limit: i64) -> Result<Vec<ChatRecord>> {
            self.check()?;
            let mut chats: Vec<ChatRecord> = lock(&self.chats)
                .iter()
                .filter(|c| c.user_id == user_id)
                .cloned()
                .collect();
            chats.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            chats.truncate(limit.max(0) as usize);
            Ok(chats)
        }

        async fn create_ticket(&self, ticket: &NewTicket) -> Result<Uuid> {
            self.check()?;
            let id = Uuid::new_v4();
            lock(&self.tickets).push((id, ticket.clone()));
            Ok(id)
        }

        async fn insert_screen_share_session(&self, session: &ScreenShareSession) -> Result<bool> {
            self.check()?;
            self.pause().await;
            let mut sessions = lock(&self.sessions);
            let taken = sessions
                .iter()
                .any(|s| s.confirmation_code == session.confirmation_code && s.status == SessionStatus::Active);
            if taken || self.conflicting {
                return Ok(false);
            }
            sessions.push(session.clone());
            Ok(true)
        }

        async fn find_active_session(&self, confirmation_code: &str) -> Result<Option<ScreenShareSession>> {
            self.check()?;
            self.pause().await;
            Ok(lock(&self.sessions)
                .iter()
                .find(|s| s.confirmation_code == confirmation_code && s.status == SessionStatus::Active)
                .cloned())
        }
    }
}
