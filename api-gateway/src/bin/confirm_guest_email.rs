//! Guest Email Confirmation Lambda - Redeems the token from a guest's access email.
//!
//! Endpoints:
//! - POST /api/confirm-guest-email

use lambda_http::http::Method;
use lambda_http::{run, service_fn, Body, Error, Request, Response};
use serde::{Deserialize, Serialize};
use shared::http::{error_response, json_response};
use shared::{guard_method, parse_body, ApiResponse, Config, GuestStore, PgGuestStore};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Deserialize)]
struct ConfirmRequest {
    confirmation_token: Option<String>,
}

#[derive(Debug, Serialize)]
struct Confirmed {
    message: String,
    guest_email: Option<String>,
}

struct AppState {
    store: Arc<dyn GuestStore>,
}

impl AppState {
    async fn new() -> Result<Self, Error> {
        let config = Config::from_env()?;
        let aws = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        let pool = shared::db::connect(&config, &aws_sdk_secretsmanager::Client::new(&aws)).await?;

        Ok(Self {
            store: Arc::new(PgGuestStore::new(pool)),
        })
    }
}

async fn handler(state: Arc<AppState>, event: Request) -> Result<Response<Body>, Error> {
    guard_method!(&event, [Method::POST]);

    let request: ConfirmRequest = parse_body!(event.body());

    let Some(token) = request.confirmation_token.filter(|t| !t.is_empty()) else {
        return error_response(400, "Missing confirmation token");
    };

    let rows = match state.store.confirm_guest_email(&token).await {
        Ok(rows) => rows,
        Err(e) => {
            error!(error = %e, "Error confirming guest email");
            return error_response(500, "Database error confirming email");
        }
    };

    let Some(result) = rows.into_iter().next() else {
        return error_response(400, "Invalid or expired confirmation token");
    };

    if !result.success {
        warn!(message = %result.message, "Guest email confirmation refused");
        return error_response(400, result.message);
    }

    info!(guest_email = ?result.guest_email, "Guest email confirmed");
    json_response(
        200,
        &ApiResponse::success(Confirmed {
            message: result.message,
            guest_email: result.guest_email,
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

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use shared::testing::MemoryGuestStore;
    use shared::GuestConfirmation;

    fn state(store: MemoryGuestStore) -> Arc<AppState> {
        Arc::new(AppState { store: Arc::new(store) })
    }

    fn post(body: Value) -> Request {
        let mut req = Request::new(Body::from(body.to_string()));
        *req.method_mut() = Method::POST;
        req
    }

    fn body_of(response: &Response<Body>) -> Value {
        serde_json::from_slice(response.body().as_ref()).unwrap()
    }

    #[tokio::test]
    async fn test_confirmed() {
        let store = MemoryGuestStore::new().with_confirmation(
            "tok-1",
            GuestConfirmation {
                success: true,
                message: "Email confirmed".to_string(),
                guest_email: Some("ada@example.com".to_string()),
            },
        );

        let response = handler(state(store), post(json!({ "confirmation_token": "tok-1" })))
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
        assert_eq!(
            body_of(&response),
            json!({ "success": true, "message": "Email confirmed", "guest_email": "ada@example.com" })
        );
    }

    #[tokio::test]
    async fn test_refused_row_passes_message_through() {
        let store = MemoryGuestStore::new().with_confirmation(
            "tok-1",
            GuestConfirmation {
                success: false,
                message: "Email already confirmed".to_string(),
                guest_email: None,
            },
        );

        let response = handler(state(store), post(json!({ "confirmation_token": "tok-1" })))
            .await
            .unwrap();

        assert_eq!(response.status(), 400);
        assert_eq!(body_of(&response)["error"], "Email already confirmed");
    }

    #[tokio::test]
    async fn test_unknown_token() {
        let response = handler(state(MemoryGuestStore::new()), post(json!({ "confirmation_token": "nope" })))
            .await
            .unwrap();

        assert_eq!(response.status(), 400);
        assert_eq!(body_of(&response)["error"], "Invalid or expired confirmation token");
    }

    #[tokio::test]
    async fn test_missing_token() {
        let response = handler(state(MemoryGuestStore::new()), post(json!({}))).await.unwrap();
        assert_eq!(response.status(), 400);
        assert_eq!(body_of(&response)["error"], "Missing confirmation token");
    }

    #[tokio::test]
    async fn test_store_failure() {
        let response = handler(
            state(MemoryGuestStore::new().failing_reads()),
            post(json!({ "confirmation_token": "tok-1" })),
        )
        .await
        .unwrap();
        assert_eq!(response.status(), 500);
    }
}
