//! Event Feedback Lambda - Sends feedback requests and records ratings.
//!
//! Endpoints:
//! - POST /api/feedback with `eventId` + `guestEmails[]` - Email feedback links
//! - POST /api/feedback with `token` + `rating` - Record a guest's rating

use chrono::Utc;
use lambda_http::http::Method;
use lambda_http::{run, service_fn, Body, Error, Request, Response};
use serde_json::{json, Value};
use shared::feedback::{send_feedback_requests, submit_feedback, FeedbackRequest, FeedbackSubmission};
use shared::http::{error_response, from_error, json_response};
use shared::{guard_method, parse_body, ApiResponse, Config, GuestStore, MailSender, PgGuestStore};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Application state
struct AppState {
    store: Arc<dyn GuestStore>,
    mailer: Arc<dyn MailSender>,
    from_email: String,
}

impl AppState {
    async fn new() -> Result<Self, Error> {
        let config = Config::from_env()?;
        let aws = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        let secrets_client = aws_sdk_secretsmanager::Client::new(&aws);

        let pool = shared::db::connect(&config, &secrets_client).await?;
        let mailer = shared::mailer_from_config(&config).await?;

        Ok(Self {
            store: Arc::new(PgGuestStore::new(pool)),
            mailer,
            from_email: config.from_email,
        })
    }
}

/// Which of the two operations a request body asks for.
enum Operation {
    SendRequests(FeedbackRequest),
    Submit(FeedbackSubmission),
}

fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Number(n)) => n.as_f64() != Some(0.0),
        Some(_) => true,
    }
}

fn classify(body: Value) -> Result<Option<Operation>, serde_json::Error> {
    if is_truthy(body.get("eventId")) && body.get("guestEmails").is_some_and(Value::is_array) {
        return serde_json::from_value(body).map(|r| Some(Operation::SendRequests(r)));
    }
    if is_truthy(body.get("token")) && is_truthy(body.get("rating")) {
        return serde_json::from_value(body).map(|s| Some(Operation::Submit(s)));
    }
    Ok(None)
}

async fn handler(state: Arc<AppState>, event: Request) -> Result<Response<Body>, Error> {
    guard_method!(&event, [Method::POST]);

    let body: Value = parse_body!(event.body());

    let operation = match classify(body) {
        Ok(Some(operation)) => operation,
        Ok(None) => {
            return error_response(
                400,
                "Invalid request. Must include either (eventId, guestEmails) or (token, rating)",
            )
        }
        Err(e) => return error_response(400, format!("Invalid request body: {}", e)),
    };

    match operation {
        Operation::SendRequests(request) => {
            let summary = match send_feedback_requests(state.mailer.as_ref(), &state.from_email, &request, Utc::now()).await {
                Ok(summary) => summary,
                Err(e) => return from_error(&e),
            };

            if !summary.failures.is_empty() {
                warn!(failed = summary.failures.len(), "Some feedback emails failed to send");
                let body = ApiResponse {
                    success: false,
                    data: Some(json!({ "successCount": summary.sent })),
                    error: Some("Some emails failed to send".to_string()),
                    details: Some(json!(summary.failures)),
                };
                return json_response(500, &body);
            }

            info!(sent = summary.sent, "Feedback requests sent");
            json_response(
                200,
                &ApiResponse::success(json!({
                    "message": format!("Feedback requests sent to {} guest(s)", summary.sent),
                    "sentCount": summary.sent,
                })),
            )
        }
        Operation::Submit(submission) => match submit_feedback(state.store.as_ref(), &submission, Utc::now()).await {
            Ok(receipt) => json_response(200, &ApiResponse::success(receipt)),
            Err(e) => from_error(&e),
        },
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
    use shared::testing::{MemoryGuestStore, RecordingMailer};
    use shared::FeedbackToken;
    use uuid::Uuid;

    fn state(store: MemoryGuestStore, mailer: RecordingMailer) -> (Arc<AppState>, Arc<MemoryGuestStore>, Arc<RecordingMailer>) {
        let store = Arc::new(store);
        let mailer = Arc::new(mailer);
        let state = Arc::new(AppState {
            store: store.clone(),
            mailer: mailer.clone(),
            from_email: "noreply@ontimely.co.uk".to_string(),
        });
        (state, store, mailer)
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
    async fn test_send_requests() {
        let (state, _, mailer) = state(MemoryGuestStore::new(), RecordingMailer::new());
        let response = handler(
            state,
            post(json!({ "eventId": "evt-1", "eventName": "Gala", "guestEmails": ["a@x.co", "b@x.co"] })),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), 200);
        let body = body_of(&response);
        assert_eq!(body["sentCount"], 2);
        assert_eq!(body["message"], "Feedback requests sent to 2 guest(s)");
        assert_eq!(mailer.sent().len(), 2);
    }

    #[tokio::test]
    async fn test_partial_failure_reports_success_count() {
        let (state, _, _) = state(MemoryGuestStore::new(), RecordingMailer::new().refusing("b@x.co"));
        let response = handler(
            state,
            post(json!({ "eventId": "evt-1", "eventName": "Gala", "guestEmails": ["a@x.co", "b@x.co"] })),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), 500);
        let body = body_of(&response);
        assert_eq!(body["error"], "Some emails failed to send");
        assert_eq!(body["success"], false);
        assert_eq!(body["successCount"], 1);
        let failures = body["details"].as_array().unwrap();
        assert_eq!(failures.len(), 1);
        assert!(failures[0].to_string().contains("b@x.co"));
    }

    #[tokio::test]
    async fn test_submit_rating() {
        let store = MemoryGuestStore::new().with_guest("evt-1", "a@x.co", Uuid::new_v4());
        let (state, store, _) = state(store, RecordingMailer::new());
        let token = FeedbackToken::encode("evt-1", "a@x.co", Utc::now());

        let response = handler(state, post(json!({ "token": token, "rating": 4, "feedback": "Great" })))
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
        assert!(body_of(&response)["feedbackId"].is_string());
        assert_eq!(store.stored_feedback()[0].rating, 4);
    }

    #[tokio::test]
    async fn test_unknown_guest_is_404() {
        let (state, _, _) = state(MemoryGuestStore::new(), RecordingMailer::new());
        let token = FeedbackToken::encode("evt-1", "nobody@x.co", Utc::now());

        let response = handler(state, post(json!({ "token": token, "rating": 2 })))
            .await
            .unwrap();
        assert_eq!(response.status(), 404);
        assert_eq!(body_of(&response)["error"], "Guest not found for this event");
    }

    #[tokio::test]
    async fn test_unrecognised_body() {
        let (state, _, _) = state(MemoryGuestStore::new(), RecordingMailer::new());
        let response = handler(state, post(json!({ "rating": 5 }))).await.unwrap();
        assert_eq!(response.status(), 400);
    }
}
