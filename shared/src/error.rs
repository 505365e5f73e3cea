//! Error types for OnTimely functions.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in OnTimely functions.
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or malformed request field
    #[error("{0}")]
    Validation(String),

    /// Missing or invalid bearer token
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Lookup miss
    #[error("{0}")]
    NotFound(String),

    /// Wrong HTTP verb for the endpoint
    #[error("Method not allowed")]
    MethodNotAllowed,

    /// Mail API, auth admin or flight API call failed
    #[error("External service error: {0}")]
    ExternalService(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Get HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::Validation(_) => 400,
            Error::Auth(_) => 401,
            Error::NotFound(_) => 404,
            Error::MethodNotAllowed => 405,
            _ => 500,
        }
    }

    /// Message safe to return to callers. Collaborator and configuration
    /// failures collapse to a generic string; the detail stays in the logs.
    pub fn public_message(&self) -> String {
        match self {
            Error::Validation(_) | Error::Auth(_) | Error::NotFound(_) | Error::MethodNotAllowed => {
                self.to_string()
            }
            Error::ExternalService(_) | Error::Database(_) => "Service error".to_string(),
            Error::Internal(message) => message.clone(),
            Error::Config(_) | Error::Serialization(_) => "Internal server error".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(Error::Validation("x".into()).status_code(), 400);
        assert_eq!(Error::Auth("x".into()).status_code(), 401);
        assert_eq!(Error::NotFound("x".into()).status_code(), 404);
        assert_eq!(Error::MethodNotAllowed.status_code(), 405);
        assert_eq!(Error::ExternalService("x".into()).status_code(), 500);
        assert_eq!(Error::Config("x".into()).status_code(), 500);
    }

    #[test]
    fn test_public_message_hides_server_detail() {
        let err = Error::ExternalService("resend returned 502: upstream body".into());
        assert_eq!(err.public_message(), "Service error");

        let err = Error::Validation("Missing confirmation token".into());
        assert_eq!(err.public_message(), "Missing confirmation token");
    }
}
