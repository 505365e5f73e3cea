//! JWT authentication utilities.

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Audience Supabase stamps on tokens of signed-in users.
const AUTHENTICATED_AUDIENCE: &str = "authenticated";

/// JWT claims from a Supabase access token.
#[derive(Debug, Serialize, Deserialize)]
pub struct SupabaseClaims {
    /// Subject (auth user id)
    pub sub: String,
    /// Email
    pub email: Option<String>,
    /// Postgres role the token maps to
    pub role: Option<String>,
    /// Audience
    pub aud: String,
    /// Expiration
    pub exp: i64,
}

/// Decoded user information from JWT.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    /// Auth user id
    pub user_id: Uuid,
    /// User's email
    pub email: Option<String>,
}

impl TryFrom<SupabaseClaims> for AuthenticatedUser {
    type Error = Error;

    fn try_from(claims: SupabaseClaims) -> Result<Self> {
        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| Error::Auth("Invalid sub claim".to_string()))?;

        Ok(Self {
            user_id,
            email: claims.email,
        })
    }
}

/// Validate a Supabase access token against the project's JWT secret.
pub fn validate_token(token: &str, secret: &str) -> Result<AuthenticatedUser> {
    let token = token.strip_prefix("Bearer ").unwrap_or(token);

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[AUTHENTICATED_AUDIENCE]);

    let token_data = decode::<SupabaseClaims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map_err(|e| Error::Auth(format!("Failed to decode token: {}", e)))?;

    AuthenticatedUser::try_from(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "super-secret-jwt-token-with-at-least-32-characters";

    fn token(sub: &str, exp: i64, secret: &str) -> String {
        let claims = SupabaseClaims {
            sub: sub.to_string(),
            email: Some("planner@example.com".to_string()),
            role: Some("authenticated".to_string()),
            aud: AUTHENTICATED_AUDIENCE.to_string(),
            exp,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    fn in_an_hour() -> i64 {
        chrono::Utc::now().timestamp() + 3600
    }

    #[test]
    fn test_valid_token() {
        let user_id = Uuid::new_v4();
        let user = validate_token(&token(&user_id.to_string(), in_an_hour(), SECRET), SECRET).unwrap();
        assert_eq!(user.user_id, user_id);
        assert_eq!(user.email.as_deref(), Some("planner@example.com"));
    }

    #[test]
    fn test_bearer_prefix_is_accepted() {
        let raw = token(&Uuid::new_v4().to_string(), in_an_hour(), SECRET);
        assert!(validate_token(&format!("Bearer {}", raw), SECRET).is_ok());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let raw = token(&Uuid::new_v4().to_string(), in_an_hour(), "another-secret-that-is-also-long-enough");
        let err = validate_token(&raw, SECRET).unwrap_err();
        assert_eq!(err.status_code(), 401);
    }

    #[test]
    fn test_expired_token_rejected() {
        let raw = token(&Uuid::new_v4().to_string(), 1_000, SECRET);
        assert!(validate_token(&raw, SECRET).is_err());
    }

    #[test]
    fn test_non_uuid_subject_rejected() {
        let raw = token("service", in_an_hour(), SECRET);
        assert!(matches!(validate_token(&raw, SECRET), Err(Error::Auth(_))));
    }
}
