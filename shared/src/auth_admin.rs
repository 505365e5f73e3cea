//! Supabase auth administration (service-role only).

use async_trait::async_trait;
use tracing::{error, info};
use uuid::Uuid;

use crate::{Config, Error, Result};

#[async_trait]
pub trait PasswordAdmin: Send + Sync {
    async fn update_password(&self, user_id: Uuid, password: &str) -> Result<()>;
}

/// Calls the GoTrue admin API with the service-role key.
pub struct SupabaseAuthAdmin {
    client: reqwest::Client,
    base_url: String,
    service_key: String,
}

impl SupabaseAuthAdmin {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, service_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            service_key: service_key.into(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let base_url = Config::require(&config.supabase_url, "SUPABASE_URL")?;
        let service_key = Config::require(&config.supabase_service_key, "SUPABASE_SERVICE_ROLE_KEY")?;
        Ok(Self::new(config.http_client()?, base_url, service_key))
    }

    fn user_url(&self, user_id: Uuid) -> String {
        format!("{}/auth/v1/admin/users/{}", self.base_url, user_id)
    }
}

#[async_trait]
impl PasswordAdmin for SupabaseAuthAdmin {
    async fn update_password(&self, user_id: Uuid, password: &str) -> Result<()> {
        let response = self
            .client
            .put(self.user_url(user_id))
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
            .json(&serde_json::json!({ "password": password }))
            .send()
            .await
            .map_err(|e| Error::ExternalService(format!("Failed to reach auth admin API: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(user_id = %user_id, status = %status, body = %body, "Password update rejected");
            return Err(Error::ExternalService(format!("Auth admin API returned {}", status)));
        }

        info!(user_id = %user_id, "Password updated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_url_trims_trailing_slash() {
        let admin = SupabaseAuthAdmin::new(reqwest::Client::new(), "https://abc.supabase.co/", "key");
        let id = Uuid::nil();
        assert_eq!(
            admin.user_url(id),
            "https://abc.supabase.co/auth/v1/admin/users/00000000-0000-0000-0000-000000000000"
        );
    }

    #[test]
    fn test_from_config_requires_service_key() {
        let config = Config {
            supabase_url: Some("https://abc.supabase.co".to_string()),
            ..Config::default()
        };
        assert!(matches!(SupabaseAuthAdmin::from_config(&config), Err(Error::Config(_))));
    }
}
