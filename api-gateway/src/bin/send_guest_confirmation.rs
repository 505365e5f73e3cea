//! Guest Confirmation Lambda - Emails app credentials to a newly added guest.
//!
//! Endpoints:
//! - POST /api/send-guest-confirmation

use lambda_http::http::Method;
use lambda_http::{run, service_fn, Body, Error, Request, Response};
use serde_json::json;
use shared::guest_mail::{access_email, AccessStyle, GuestEmailRequest};
use shared::http::{error_response, error_response_with_details, json_response};
use shared::{guard_method, parse_body, ApiResponse, Config, MailSender};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

struct AppState {
    mailer: Arc<dyn MailSender>,
    from_email: String,
}

impl AppState {
    async fn new() -> Result<Self, Error> {
        let config = Config::from_env()?;
        let mailer = shared::mailer_from_config(&config).await?;

        Ok(Self {
            mailer,
            from_email: shared::guest_mail::branded_sender(&config.from_email),
        })
    }
}

async fn handler(state: Arc<AppState>, event: Request) -> Result<Response<Body>, Error> {
    guard_method!(&event, [Method::POST]);

    let request: GuestEmailRequest = parse_body!(event.body());

    let email = match access_email(&state.from_email, &request, AccessStyle::Plain) {
        Ok(email) => email,
        Err(e) => return error_response(e.status_code(), e.public_message()),
    };

    match state.mailer.send(&email).await {
        Ok(sent) => {
            info!(email_id = %sent.id, "Guest confirmation sent");
            json_response(200, &ApiResponse::success(sent))
        }
        Err(e) => {
            error!(error = %e, "Failed to send guest confirmation email");
            error_response_with_details(500, "Failed to send guest confirmation email", json!(e.to_string()))
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
