//! Guest and form data access.
//!
//! The business rules live in Postgres procedures (`confirm_guest_email`,
//! `submit_form_and_create_guest`, `get_form_by_token`); this module only
//! calls them and the handful of plain table queries the handlers need.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{FeedbackRecord, FormDefinition, GuestConfirmation};
use crate::Result;

#[async_trait]
pub trait GuestStore: Send + Sync {
    /// Run `confirm_guest_email`; an empty vec means the token matched nothing.
    async fn confirm_guest_email(&self, confirmation_token: &str) -> Result<Vec<GuestConfirmation>>;

    /// Run `submit_form_and_create_guest` and return its rows as JSON.
    async fn submit_form(&self, token: &str, responses: &serde_json::Value) -> Result<serde_json::Value>;

    /// Run `get_form_by_token`.
    async fn get_form(&self, token: &str) -> Result<Vec<FormDefinition>>;

    /// Look up an app user by email.
    async fn find_user_id_by_email(&self, email: &str) -> Result<Option<Uuid>>;

    /// Look up the guest with this email on this event.
    async fn find_guest_id(&self, event_id: &str, email: &str) -> Result<Option<Uuid>>;

    /// Store feedback, returning the new row id.
    async fn insert_feedback(&self, record: &FeedbackRecord) -> Result<Uuid>;
}

/// [`GuestStore`] over the project's Postgres database.
pub struct PgGuestStore {
    pool: PgPool,
}

impl PgGuestStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GuestStore for PgGuestStore {
    async fn confirm_guest_email(&self, confirmation_token: &str) -> Result<Vec<GuestConfirmation>> {
        let rows = sqlx::query_as::<_, GuestConfirmation>(
            r#"
            SELECT success, message, guest_email
            FROM confirm_guest_email(p_confirmation_token => $1)
            "#,
        )
        .bind(confirmation_token)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn submit_form(&self, token: &str, responses: &serde_json::Value) -> Result<serde_json::Value> {
        let data: Option<serde_json::Value> = sqlx::query_scalar(
            r#"
            SELECT jsonb_agg(to_jsonb(r))
            FROM submit_form_and_create_guest(p_token => $1, p_responses => $2) AS r
            "#,
        )
        .bind(token)
        .bind(responses)
        .fetch_one(&self.pool)
        .await?;

        Ok(data.unwrap_or(serde_json::Value::Null))
    }

    async fn get_form(&self, token: &str) -> Result<Vec<FormDefinition>> {
        let rows = sqlx::query_as::<_, FormDefinition>(
            r#"
            SELECT title, description, fields
            FROM get_form_by_token(p_token => $1)
            "#,
        )
        .bind(token)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn find_user_id_by_email(&self, email: &str) -> Result<Option<Uuid>> {
        let id = sqlx::query_scalar("SELECT id FROM users WHERE email = $1 LIMIT 1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(id)
    }

    async fn find_guest_id(&self, event_id: &str, email: &str) -> Result<Option<Uuid>> {
        let id = sqlx::query_scalar(
            r#"
            SELECT id FROM guests
            WHERE event_id::text = $1 AND email = $2
            LIMIT 1
            "#,
        )
        .bind(event_id)
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(id)
    }

    async fn insert_feedback(&self, record: &FeedbackRecord) -> Result<Uuid> {
        let id = sqlx::query_scalar(
            r#"
            INSERT INTO event_feedback (event_id, guest_id, guest_email, rating, feedback_text, submitted_at)
            VALUES ($1::uuid, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(&record.event_id)
        .bind(record.guest_id)
        .bind(&record.guest_email)
        .bind(record.rating)
        .bind(&record.feedback_text)
        .bind(record.submitted_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }
}
