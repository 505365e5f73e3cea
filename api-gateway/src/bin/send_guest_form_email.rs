//! Guest Form Email Lambda - Form invitations and confirm-your-email access emails.
//!
//! Endpoints:
//! - POST /api/send-guest-form-email with `emailType: "login"` - Access email with confirmation link
//! - POST /api/send-guest-form-email otherwise - Form invitation to `emails[]`

use lambda_http::http::Method;
use lambda_http::{run, service_fn, Body, Error, Request, Response};
use serde_json::json;
use shared::guest_mail::{access_email, branded_sender, form_email, AccessStyle, GuestEmailRequest};
use shared::http::{error_response, error_response_with_details, json_response};
use shared::{guard_method, parse_body, ApiResponse, Config, MailSender};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

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

    let request: GuestEmailRequest = parse_body!(event.body());
    info!(email_type = ?request.email_type, event_name = ?request.event_name, "Received guest form email request");

    let email = if request.is_login() {
        access_email(&state.sender, &request, AccessStyle::WithConfirmation)
    } else {
        form_email(&state.sender, &request)
    };

    let email = match email {
        Ok(email) => email,
        Err(e) => return error_response(e.status_code(), e.public_message()),
    };

    match state.mailer.send(&email).await {
        Ok(sent) => {
            info!(email_id = %sent.id, "Guest form email sent");
            json_response(200, &ApiResponse::success(sent))
        }
        Err(e) => {
            error!(error = %e, "Mail API error");
            error_response_with_details(500, "Failed to send email", json!(e.to_string()))
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
    async fn test_login_email_carries_confirmation_link() {
        let mailer = Arc::new(RecordingMailer::new());
        let response = handler(
            state(mailer.clone()),
            post(json!({
                "emailType": "login",
                "email": "ada@example.com",
                "password": "Temp#1234",
                "eventName": "Gala",
                "guestName": "Ada",
                "confirmationToken": "abc123",
            })),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), 200);
        let sent = mailer.sent();
        assert!(sent[0]
            .html
            .contains("https://ontimely.co.uk/guest-success-email-confirmed?token=abc123"));
    }

    #[tokio::test]
    async fn test_form_invitation() {
        let mailer = Arc::new(RecordingMailer::new());
        let response = handler(
            state(mailer.clone()),
            post(json!({ "emails": ["a@x.co", "b@x.co"], "link": "https://f.test/1", "eventName": "Gala" })),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), 200);
        assert_eq!(mailer.sent()[0].to.len(), 2);
    }

    #[tokio::test]
    async fn test_get_not_allowed() {
        let mut req = Request::new(Body::Empty);
        *req.method_mut() = Method::GET;
        let response = handler(state(Arc::new(RecordingMailer::new())), req).await.unwrap();
        assert_eq!(response.status(), 405);
    }
}
