//! Screen-share sessions identified by a short confirmation code.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared::{Error, Result};

pub const CODE_LENGTH: usize = 6;
/// Longest code the sessions table accepts.
pub const MAX_CODE_LENGTH: usize = 10;
const CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Completed,
    Expired,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Active => "active",
            SessionStatus::Completed => "completed",
            SessionStatus::Expired => "expired",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "active" => Ok(SessionStatus::Active),
            "completed" => Ok(SessionStatus::Completed),
            "expired" => Ok(SessionStatus::Expired),
            other => Err(Error::Internal(format!("Unknown session status: {}", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenShareSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub confirmation_code: String,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl ScreenShareSession {
    /// A fresh active session valid for one hour.
    pub fn new(user_id: Uuid, confirmation_code: String, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            confirmation_code,
            status: SessionStatus::Active,
            created_at: now,
            expires_at: now + Duration::hours(1),
        }
    }
}

/// Random uppercase alphanumeric code of [`CODE_LENGTH`] characters.
pub fn generate_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..CODE_LENGTH)
        .map(|_| CODE_CHARSET[rng.gen_range(0..CODE_CHARSET.len())] as char)
        .collect()
}

/// Normalise a caller-supplied code, rejecting ones the table cannot hold.
pub fn normalize_code(code: &str) -> Result<String> {
    let code = code.trim().to_uppercase();
    if code.is_empty() || code.len() > MAX_CODE_LENGTH || !code.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(Error::Validation(format!(
            "Confirmation code must be 1-{} letters or digits",
            MAX_CODE_LENGTH
        )));
    }
    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_code_shape() {
        let mut rng = rand::thread_rng();
        for _ in 0..50 {
            let code = generate_code(&mut rng);
            assert_eq!(code.len(), CODE_LENGTH);
            assert!(code.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_normalize_code() {
        assert_eq!(normalize_code(" ab12cd ").unwrap(), "AB12CD");
        assert!(normalize_code("").is_err());
        assert!(normalize_code("TOO-LONG").is_err());
        assert!(normalize_code("ABCDEFGHIJK").is_err());
    }

    #[test]
    fn test_session_expires_after_an_hour() {
        let now = Utc::now();
        let session = ScreenShareSession::new(Uuid::new_v4(), "ABC123".to_string(), now);
        assert_eq!(session.status, SessionStatus::Active);
        assert_eq!(session.expires_at - session.created_at, Duration::hours(1));
    }

    #[test]
    fn test_status_round_trip() {
        for status in [SessionStatus::Active, SessionStatus::Completed, SessionStatus::Expired] {
            assert_eq!(SessionStatus::parse(status.as_str()).unwrap(), status);
        }
        assert!(SessionStatus::parse("paused").is_err());
    }
}
