//! Set Password Lambda - Lets a guest choose their own app password.
//!
//! Endpoints:
//! - POST /api/set-password

use lambda_http::http::Method;
use lambda_http::{run, service_fn, Body, Error, Request, Response};
use serde::{Deserialize, Serialize};
use shared::http::{error_response, json_response};
use shared::{guard_method, parse_body, ApiResponse, Config, GuestStore, PasswordAdmin, PgGuestStore, SupabaseAuthAdmin};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const SPECIAL_CHARS: &str = "!@#$%^&*(),.?\":{}|<>";

#[derive(Debug, Deserialize)]
struct SetPasswordRequest {
    email: Option<String>,
    password: Option<String>,
}

#[derive(Debug, Serialize)]
struct Updated {
    message: &'static str,
}

struct AppState {
    store: Arc<dyn GuestStore>,
    auth_admin: Arc<dyn PasswordAdmin>,
}

impl AppState {
    async fn new() -> Result<Self, Error> {
        let config = Config::from_env()?;
        let aws = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        let pool = shared::db::connect(&config, &aws_sdk_secretsmanager::Client::new(&aws)).await?;

        Ok(Self {
            store: Arc::new(PgGuestStore::new(pool)),
            auth_admin: Arc::new(SupabaseAuthAdmin::from_config(&config)?),
        })
    }
}

/// At least 8 characters with a lowercase letter, an uppercase letter, a digit
/// and one of [`SPECIAL_CHARS`].
fn is_strong_password(password: &str) -> bool {
    password.chars().count() >= 8
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| SPECIAL_CHARS.contains(c))
}

async fn handler(state: Arc<AppState>, event: Request) -> Result<Response<Body>, Error> {
    guard_method!(&event, [Method::POST]);

    let request: SetPasswordRequest = parse_body!(event.body());

    let (email, password) = match (request.email, request.password) {
        (Some(email), Some(password)) if !email.is_empty() && !password.is_empty() => (email, password),
        _ => return error_response(400, "Email and password are required"),
    };

    if !is_strong_password(&password) {
        return error_response(
            400,
            "Password must be at least 8 characters with uppercase, lowercase, number, and special character",
        );
    }

    let user_id = match state.store.find_user_id_by_email(&email).await {
        Ok(Some(id)) => id,
        Ok(None) => return error_response(404, "User not found"),
        Err(e) => {
            warn!(error = %e, "User lookup error");
            return error_response(404, "User not found");
        }
    };

    if let Err(e) = state.auth_admin.update_password(user_id, &password).await {
        error!(user_id = %user_id, error = %e, "Password update error");
        return error_response(500, "Failed to update password");
    }

    info!(user_id = %user_id, "Password updated");
    json_response(
        200,
        &ApiResponse::success(Updated {
            message: "Password updated successfully",
        }),
    )
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let state = Arc::new(AppState::new().await?);

    run(service_fn(move |event| {
        let state = Arc::clone(&state);
        async move { handler(state, event).await }
    }))
    .await
}
