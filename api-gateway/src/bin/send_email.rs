//! Send Email Lambda - Guest login credentials and form invitations.
//!
//! Endpoints:
//! - POST /api/send-email with `emailType: "login"` - Guest access email
//! - POST /api/send-email otherwise - Form invitation to `emails[]`

use lambda_http::http::Method;
use lambda_http::{run, service_fn, Body, Error, Request, Response};
use serde_json::json;
use shared::guest_mail::{access_email, form_email, AccessStyle, GuestEmailRequest};
use shared::http::{error_response, error_response_with_details, json_response};
use shared::{guard_method, parse_body, ApiResponse, Config, MailSender};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Application state
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
            from_email: config.from_email,
        })
    }
}

async fn handler(state: Arc<AppState>, event: Request) -> Result<Response<Body>, Error> {
    guard_method!(&event, [Method::POST]);

    let request: GuestEmailRequest = parse_body!(event.body());

    let email = if request.is_login() {
        access_email(&state.from_email, &request, AccessStyle::Welcome)
    } else {
        form_email(&state.from_email, &request)
    };

    let email = match email {
        Ok(email) => email,
        Err(e) => return error_response(e.status_code(), e.public_message()),
    };

    info!(subject = %email.subject, recipients = email.to.len(), "Sending email");

    match state.mailer.send(&email).await {
        Ok(sent) => json_response(200, &ApiResponse::success(json!({ "data": sent }))),
        Err(e) => {
            error!(error = %e, "Failed to send email");
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
            from_email: "noreply@ontimely.co.uk".to_string(),
        })
    }

    fn post(body: serde_json::Value) -> Request {
        let mut req = Request::new(Body::from(body.to_string()));
        *req.method_mut() = Method::POST;
        req
    }

    fn body_of(response: &Response<Body>) -> serde_json::Value {
        serde_json::from_slice(response.body().as_ref()).unwrap()
    }

    #[tokio::test]
    async fn test_login_email() {
        let mailer = Arc::new(RecordingMailer::new());
        let response = handler(
            state(mailer.clone()),
            post(json!({
                "emailType": "login",
                "email": "ada@example.com",
                "password": "Temp#1234",
                "eventName": "Summer Gala",
                "guestName": "Ada",
            })),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), 200);
        assert_eq!(body_of(&response)["data"]["id"], "email-1");

        let sent = mailer.sent();
        assert_eq!(sent[0].subject, "Welcome to Summer Gala • Your Guest Access");
        assert_eq!(sent[0].from, "noreply@ontimely.co.uk");
    }

    #[tokio::test]
    async fn test_form_email_missing_link() {
        let mailer = Arc::new(RecordingMailer::new());
        let response = handler(
            state(mailer.clone()),
            post(json!({ "emails": ["a@x.co"], "eventName": "Gala" })),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), 400);
        assert_eq!(body_of(&response)["error"], "Missing required fields: emails[], link, eventName");
        assert!(mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn test_mail_failure_is_500() {
        let mailer = Arc::new(RecordingMailer::new().refusing("a@x.co"));
        let response = handler(
            state(mailer),
            post(json!({ "emails": ["a@x.co"], "link": "https://f.test/1", "eventName": "Gala" })),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), 500);
        let body = body_of(&response);
        assert_eq!(body["error"], "Failed to send email");
        assert!(body["details"].as_str().unwrap().contains("a@x.co"));
    }

    #[tokio::test]
    async fn test_get_not_allowed() {
        let mut req = Request::new(Body::Empty);
        *req.method_mut() = Method::GET;
        let response = handler(state(Arc::new(RecordingMailer::new())), req).await.unwrap();
        assert_eq!(response.status(), 405);
    }
}
