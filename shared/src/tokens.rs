//! Feedback tokens.
//!
//! A token is plain base64 of `eventId:email:unixMillis`. It only correlates a
//! submission with an event/guest pair; it carries no signature.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};

use crate::{Error, Result};

/// Event/guest pair recovered from a feedback token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackToken {
    pub event_id: String,
    pub guest_email: String,
}

impl FeedbackToken {
    /// Encode a token for one guest of one event.
    pub fn encode(event_id: &str, guest_email: &str, issued_at: DateTime<Utc>) -> String {
        STANDARD.encode(format!("{}:{}:{}", event_id, guest_email, issued_at.timestamp_millis()))
    }

    /// Decode a token, requiring at least the event id and email parts.
    pub fn decode(token: &str) -> Result<Self> {
        let invalid = || Error::Validation("Invalid feedback token".to_string());

        let bytes = STANDARD.decode(token.trim()).map_err(|_| invalid())?;
        let decoded = String::from_utf8(bytes).map_err(|_| invalid())?;

        let mut parts = decoded.split(':');
        match (parts.next(), parts.next()) {
            (Some(event_id), Some(guest_email)) => Ok(Self {
                event_id: event_id.to_string(),
                guest_email: guest_email.to_string(),
            }),
            _ => Err(invalid()),
        }
    }
}
