//! Shared data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Row returned by the `confirm_guest_email` procedure.
#[derive(Debug, Clone, PartialEq, Deserialize, sqlx::FromRow)]
pub struct GuestConfirmation {
    pub success: bool,
    pub message: String,
    pub guest_email: Option<String>,
}

/// Row returned by the `get_form_by_token` procedure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct FormDefinition {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub fields: Option<serde_json::Value>,
}

impl FormDefinition {
    /// Fields as an array, treating a missing column as no fields.
    pub fn fields_or_empty(&self) -> serde_json::Value {
        self.fields
            .clone()
            .filter(|f| !f.is_null())
            .unwrap_or_else(|| serde_json::Value::Array(Vec::new()))
    }
}

/// Feedback submitted by a guest for an event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedbackRecord {
    pub event_id: String,
    pub guest_id: Uuid,
    pub guest_email: String,
    pub rating: i16,
    pub feedback_text: Option<String>,
    pub submitted_at: DateTime<Utc>,
}
