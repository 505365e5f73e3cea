//! AWS Secrets Manager integration.

use aws_sdk_secretsmanager::Client as SecretsClient;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::OnceLock;
use tokio::sync::RwLock;

use crate::{Error, Result};

/// Secret strings fetched during this container's lifetime.
static SECRETS_CACHE: OnceLock<RwLock<HashMap<String, String>>> = OnceLock::new();

fn cache() -> &'static RwLock<HashMap<String, String>> {
    SECRETS_CACHE.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Database credentials as stored by RDS/Supabase rotation.
#[derive(Debug, Deserialize)]
pub struct DatabaseCredentials {
    pub username: String,
    pub password: String,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub dbname: Option<String>,
}

/// Get a secret string, served from the cache after the first fetch.
pub async fn get_secret(client: &SecretsClient, secret_arn: &str) -> Result<String> {
    if let Some(value) = cache().read().await.get(secret_arn) {
        return Ok(value.clone());
    }

    let response = client
        .get_secret_value()
        .secret_id(secret_arn)
        .send()
        .await
        .map_err(|e| Error::ExternalService(format!("Failed to get secret: {}", e)))?;

    let secret_string = response
        .secret_string()
        .ok_or_else(|| Error::Config(format!("Secret {} has no string value", secret_arn)))?
        .to_string();

    cache()
        .write()
        .await
        .insert(secret_arn.to_string(), secret_string.clone());

    Ok(secret_string)
}

/// Get a JSON secret and deserialize it.
pub async fn get_json_secret<T: DeserializeOwned>(client: &SecretsClient, secret_arn: &str) -> Result<T> {
    let secret_string = get_secret(client, secret_arn).await?;
    parse_json_secret(&secret_string)
}

/// Get database credentials from Secrets Manager.
pub async fn get_database_credentials(
    client: &SecretsClient,
    secret_arn: &str,
) -> Result<DatabaseCredentials> {
    get_json_secret(client, secret_arn).await
}

fn parse_json_secret<T: DeserializeOwned>(secret_string: &str) -> Result<T> {
    serde_json::from_str(secret_string)
        .map_err(|e| Error::Config(format!("Failed to parse secret: {}", e)))
}

/// Forget every cached secret, forcing the next read to hit Secrets Manager.
pub async fn clear_cache() {
    cache().write().await.clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_credentials() {
        let json = r#"{"username":"postgres","password":"secret123","host":"db.example.supabase.co","port":5432}"#;
        let creds: DatabaseCredentials = parse_json_secret(json).unwrap();
        assert_eq!(creds.username, "postgres");
        assert_eq!(creds.password, "secret123");
        assert_eq!(creds.host.as_deref(), Some("db.example.supabase.co"));
        assert!(creds.dbname.is_none());
    }

    #[test]
    fn test_malformed_secret_is_config_error() {
        let err = parse_json_secret::<DatabaseCredentials>("{").unwrap_err();
        assert_eq!(err.status_code(), 500);
        assert!(matches!(err, Error::Config(_)));
    }

    #[tokio::test]
    async fn test_cached_secret_short_circuits() {
        cache()
            .write()
            .await
            .insert("arn:test:cached".to_string(), "value".to_string());

        let config = aws_sdk_secretsmanager::Config::builder()
            .behavior_version(aws_sdk_secretsmanager::config::BehaviorVersion::latest())
            .region(aws_sdk_secretsmanager::config::Region::new("eu-west-2"))
            .build();
        let client = SecretsClient::from_conf(config);

        assert_eq!(get_secret(&client, "arn:test:cached").await.unwrap(), "value");
        clear_cache().await;
        assert!(cache().read().await.is_empty());
    }
}
