//! Shared library for OnTimely Lambda functions.
//!
//! This crate provides common utilities, types, and clients used across all Lambda functions.

pub mod auth;
pub mod auth_admin;
pub mod config;
pub mod db;
pub mod error;
pub mod feedback;
pub mod guest_mail;
pub mod http;
pub mod mail;
pub mod models;
pub mod secrets;
pub mod store;
pub mod templates;
pub mod tokens;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use auth::{validate_token, AuthenticatedUser, SupabaseClaims};
pub use auth_admin::{PasswordAdmin, SupabaseAuthAdmin};
pub use config::Config;
pub use error::{Error, Result};
pub use http::ApiResponse;
pub use mail::{mailer_from_config, MailSender, OutgoingEmail, SentEmail};
pub use models::{FeedbackRecord, FormDefinition, GuestConfirmation};
pub use secrets::{get_database_credentials, get_secret, DatabaseCredentials};
pub use store::{GuestStore, PgGuestStore};
pub use tokens::FeedbackToken;
