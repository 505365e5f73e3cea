//! Password Reset Email Lambda - Emails a reset link.
//!
//! Endpoints:
//! - POST /api/send-password-reset-email

use lambda_http::http::Method;
use lambda_http::{run, service_fn, Body, Error, Request, Response};
use serde::Deserialize;
use serde_json::json;
use shared::guest_mail::branded_sender;
use shared::http::{error_response, error_response_with_details, json_response};
use shared::{guard_method, parse_body, templates, ApiResponse, Config, MailSender, OutgoingEmail};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct PasswordResetRequest {
    email: Option<String>,
    name: Option<String>,
    #[validate(url)]
    reset_url: Option<String>,
}

struct AppState {
    mailer: Arc<dyn MailSender>,
    sender: String,
}

impl AppState {
    async fn new() -> Result<Self, Error> {
        let config = Config::from_env()?;
        let mailer = shared::mailer_from_config(&config).await?;

        Ok(Self {
            mailer,
            sender: branded_sender(&config.from_email),
        })
    }
}

async fn handler(state: Arc<AppState>, event: Request) -> Result<Response<Body>, Error> {
    guard_method!(&event, [Method::POST]);

    let request: PasswordResetRequest = parse_body!(event.body());

    let (email, name, reset_url) = match (&request.email, &request.name, &request.reset_url) {
        (Some(email), Some(name), Some(url)) if !email.is_empty() && !name.is_empty() && !url.is_empty() => {
            (email, name, url)
        }
        _ => return error_response(400, "Missing required fields: email, name, resetUrl"),
    };

    if request.validate().is_err() {
        return error_response(400, "resetUrl must be a valid URL");
    }

    let message = OutgoingEmail {
        from: state.sender.clone(),
        to: vec![email.clone()],
        subject: "Reset Your OnTimely Password".to_string(),
        html: templates::password_reset(name, reset_url),
    };

    match state.mailer.send(&message).await {
        Ok(sent) => {
            info!(email_id = %sent.id, "Password reset email sent");
            json_response(200, &ApiResponse::success(sent))
        }
        Err(e) => {
            error!(error = %e, "Failed to send password reset email");
            error_response_with_details(500, "Failed to send password reset email", json!(e.to_string()))
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

#[cfg(test)]
mod tests {
    use super::*;
    use shared::testing::RecordingMailer;

    fn state(mailer: Arc<RecordingMailer>) -> Arc<AppState> {
        Arc::new(AppState {
            mailer,
            sender: "OnTimely <noreply@ontimely.co.uk>".to_string(),
        })
    }

    fn post(body: serde_json::Value) -> Request {
        let mut req = Request::new(Body::from(body.to_string()));
        *req.method_mut() = Method::POST;
        req
    }

    #[tokio::test]
    async fn test_reset_email_sent() {
        let mailer = Arc::new(RecordingMailer::new());
        let response = handler(
            state(mailer.clone()),
            post(json!({ "email": "ada@example.com", "name": "Ada", "resetUrl": "https://app.ontimely.co.uk/reset?t=1" })),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), 200);
        let sent = mailer.sent();
        assert_eq!(sent[0].subject, "Reset Your OnTimely Password");
        assert!(sent[0].html.contains("https://app.ontimely.co.uk/reset?t=1"));
    }

    #[tokio::test]
    async fn test_missing_reset_url() {
        let response = handler(
            state(Arc::new(RecordingMailer::new())),
            post(json!({ "email": "ada@example.com", "name": "Ada" })),
        )
        .await
        .unwrap();
        assert_eq!(response.status(), 400);
    }

    #[tokio::test]
    async fn test_reset_url_must_be_url() {
        let mailer = Arc::new(RecordingMailer::new());
        let response = handler(
            state(mailer.clone()),
            post(json!({ "email": "ada@example.com", "name": "Ada", "resetUrl": "not a url" })),
        )
        .await
        .unwrap();
        assert_eq!(response.status(), 400);
        assert!(mailer.sent().is_empty());
    }
}
