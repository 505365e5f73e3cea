//! Form Submission Lambda - Stores a recipient's responses and creates their guest record.
//!
//! Endpoints:
//! - POST /api/submit-form

use lambda_http::http::Method;
use lambda_http::{run, service_fn, Body, Error, Request, Response};
use serde::Deserialize;
use serde_json::json;
use shared::http::{error_response, json_response};
use shared::{guard_method, parse_body, ApiResponse, Config, GuestStore, PgGuestStore};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Deserialize)]
struct SubmitFormRequest {
    token: Option<String>,
    responses: Option<serde_json::Value>,
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

    let request: SubmitFormRequest = parse_body!(event.body());

    let (token, responses) = match (request.token, request.responses) {
        (Some(token), Some(responses)) if !token.is_empty() && !responses.is_null() => (token, responses),
        _ => return error_response(400, "Token and responses are required"),
    };

    match state.store.submit_form(&token, &responses).await {
        Ok(data) => {
            info!("Form submitted");
            json_response(200, &ApiResponse::success(json!({ "data": data })))
        }
        Err(e) => {
            error!(error = %e, "Form submission failed");
            error_response(500, format!("Failed to submit form: {}", e))
        }
    }
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
