//! Configuration management for Lambda functions.

use std::env;
use std::time::Duration;

use crate::{Error, Result};

/// Which mail API outgoing email goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailProvider {
    Resend,
    Ses,
}

impl MailProvider {
    fn parse(value: &str) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "resend" => Ok(MailProvider::Resend),
            "ses" => Ok(MailProvider::Ses),
            other => Err(Error::Config(format!("Unknown MAIL_PROVIDER: {}", other))),
        }
    }
}

/// Application configuration loaded from environment variables.
///
/// Every function loads the same struct; the fields a function does not use
/// are simply ignored, so only the variables it actually needs must be set.
#[derive(Debug, Clone)]
pub struct Config {
    /// Database host
    pub db_host: Option<String>,
    /// Database name
    pub db_name: String,
    /// ARN of the secret containing database credentials
    pub db_secret_arn: Option<String>,
    /// Supabase project URL (auth admin API)
    pub supabase_url: Option<String>,
    /// Supabase service-role key
    pub supabase_service_key: Option<String>,
    /// Secret used to verify Supabase access tokens
    pub jwt_secret: Option<String>,
    /// Mail API selection
    pub mail_provider: MailProvider,
    /// Resend API key
    pub resend_api_key: Option<String>,
    /// Sender address for transactional email
    pub from_email: String,
    /// OpenSky API base URL
    pub opensky_base_url: String,
    /// OpenSky API client id
    pub opensky_client_id: Option<String>,
    /// OpenSky API client secret
    pub opensky_client_secret: Option<String>,
    /// Timeout applied to outbound HTTP calls
    pub http_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_host: None,
            db_name: "postgres".to_string(),
            db_secret_arn: None,
            supabase_url: None,
            supabase_service_key: None,
            jwt_secret: None,
            mail_provider: MailProvider::Resend,
            resend_api_key: None,
            from_email: "noreply@ontimely.co.uk".to_string(),
            opensky_base_url: "https://opensky-network.org/api".to_string(),
            opensky_client_id: None,
            opensky_client_secret: None,
            http_timeout: Duration::from_secs(10),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let mail_provider = match env::var("MAIL_PROVIDER") {
            Ok(value) => MailProvider::parse(&value)?,
            Err(_) => defaults.mail_provider,
        };

        let http_timeout = match env::var("HTTP_TIMEOUT_SECS") {
            Ok(value) => value
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| Error::Config(format!("Invalid HTTP_TIMEOUT_SECS: {}", value)))?,
            Err(_) => defaults.http_timeout,
        };

        Ok(Self {
            db_host: env::var("DB_HOST").ok(),
            db_name: env::var("DB_NAME").unwrap_or(defaults.db_name),
            db_secret_arn: env::var("DB_SECRET_ARN").ok(),
            supabase_url: env::var("SUPABASE_URL").ok(),
            supabase_service_key: env::var("SUPABASE_SERVICE_ROLE_KEY").ok(),
            jwt_secret: env::var("SUPABASE_JWT_SECRET").ok(),
            mail_provider,
            resend_api_key: env::var("RESEND_API_KEY").ok().filter(|k| !k.is_empty()),
            from_email: env::var("FROM_EMAIL").unwrap_or(defaults.from_email),
            opensky_base_url: env::var("OPENSKY_BASE_URL").unwrap_or(defaults.opensky_base_url),
            opensky_client_id: env::var("OPENSKY_CLIENT_ID").ok(),
            opensky_client_secret: env::var("OPENSKY_CLIENT_SECRET").ok(),
            http_timeout,
        })
    }

    /// Return a required optional setting or a configuration error naming it.
    pub fn require<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str> {
        value
            .as_deref()
            .ok_or_else(|| Error::Config(format!("{} not configured", name)))
    }

    /// Shared reqwest client honouring the configured timeout.
    pub fn http_client(&self) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(self.http_timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))
    }
}
