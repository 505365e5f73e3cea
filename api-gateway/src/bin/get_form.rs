//! Form Lookup Lambda - Loads the form behind an invitation link.
//!
//! Endpoints:
//! - GET /api/get-form?token=... - Fetch form definition
//! - POST /api/get-form with `{ token }` - Same, for clients that cannot build query strings

use lambda_http::http::Method;
use lambda_http::{run, service_fn, Body, Error, Request, RequestExt, Response};
use serde::{Deserialize, Serialize};
use shared::http::{error_response, json_response};
use shared::{guard_method, parse_body, ApiResponse, Config, GuestStore, PgGuestStore};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Deserialize)]
struct GetFormRequest {
    token: Option<String>,
}

#[derive(Debug, Serialize)]
struct FormView {
    title: Option<String>,
    description: Option<String>,
    fields: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct FormPayload {
    form: FormView,
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
    guard_method!(&event, [Method::GET, Method::POST]);

    let token = if event.method() == Method::GET {
        event.query_string_parameters().first("token").map(str::to_string)
    } else {
        let request: GetFormRequest = parse_body!(event.body());
        request.token
    };

    let Some(token) = token.filter(|t| !t.is_empty()) else {
        return error_response(400, "Token is required");
    };

    let rows = match state.store.get_form(&token).await {
        Ok(rows) => rows,
        Err(e) => {
            error!(error = %e, "Get form error");
            return error_response(500, "Failed to load form");
        }
    };

    let Some(form) = rows.into_iter().next() else {
        return error_response(404, "Form not found");
    };

    info!(title = ?form.title, "Form loaded");
    let fields = form.fields_or_empty();
    json_response(
        200,
        &ApiResponse::success(FormPayload {
            form: FormView {
                title: form.title,
                description: form.description,
                fields,
            },
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
