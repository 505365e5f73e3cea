//! Submit Feedback Lambda - Records a guest's post-event rating.
//!
//! Endpoints:
//! - POST /api/submit-feedback

use chrono::Utc;
use lambda_http::http::Method;
use lambda_http::{run, service_fn, Body, Error, Request, Response};
use shared::feedback::{submit_feedback, FeedbackSubmission};
use shared::http::{from_error, json_response};
use shared::{guard_method, parse_body, ApiResponse, Config, GuestStore, PgGuestStore};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

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

    let submission: FeedbackSubmission = parse_body!(event.body());

    match submit_feedback(state.store.as_ref(), &submission, Utc::now()).await {
        Ok(receipt) => {
            info!(stored = receipt.feedback_id.is_some(), "Feedback submission handled");
            json_response(200, &ApiResponse::success(receipt))
        }
        Err(e) => from_error(&e),
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
