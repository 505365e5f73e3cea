//! HTTP routes of the help-center Lambda.
//!
//! Endpoints:
//! - POST /help/chat - Ask the assistant (bearer token optional)
//! - GET /help/history?limit=10 - Signed-in user's past chats
//! - POST /help/live-agent - Join the live-agent queue
//! - POST /help/screen-share - Start a screen-share session
//! - GET /help/screen-share/{code} - Look up an active session by code
//! - POST /help/agent/status - Agent goes online/offline
//! - POST /help/agent/next - Agent takes the next waiting user

use std::sync::Arc;

use lambda_http::http::Method;
use lambda_http::{Body, Error, Request, RequestExt, Response};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};

use shared::http::{bearer_token, error_response, from_error, json_response, preflight_response};
use shared::{parse_body, validate_token, ApiResponse, AuthenticatedUser, Config};

use crate::live_agent::TicketPriority;
use crate::service::HelpCenter;
use crate::store::PgHelpCenterStore;

const SCREEN_SHARE_PREFIX: &str = "/help/screen-share/";
const ROUTES: &[&str] = &[
    "/help/chat",
    "/help/history",
    "/help/live-agent",
    "/help/screen-share",
    "/help/agent/status",
    "/help/agent/next",
];

pub struct AppState {
    pub help_center: HelpCenter,
    pub jwt_secret: String,
}

impl AppState {
    pub async fn new() -> Result<Self, Error> {
        let config = Config::from_env()?;
        let jwt_secret = Config::require(&config.jwt_secret, "SUPABASE_JWT_SECRET")?.to_string();

        let aws = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        let pool = shared::db::connect(&config, &aws_sdk_secretsmanager::Client::new(&aws)).await?;

        Ok(Self {
            help_center: HelpCenter::new(Arc::new(PgHelpCenterStore::new(pool))),
            jwt_secret,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChatRequest {
    message: Option<String>,
    session_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LiveAgentRequest {
    message: Option<String>,
    #[serde(default)]
    priority: TicketPriority,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScreenShareRequest {
    confirmation_code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AgentStatusRequest {
    online: Option<bool>,
}

/// Turn a service result into a 200 success body or the mapped error.
fn respond<T: Serialize>(result: shared::Result<T>) -> Result<Response<Body>, Error> {
    match result {
        Ok(data) => json_response(200, &ApiResponse::success(data)),
        Err(e) => {
            if e.status_code() >= 500 {
                error!(error = %e, "Help-center request failed");
            }
            from_error(&e)
        }
    }
}

fn current_user(state: &AppState, event: &Request) -> shared::Result<Option<AuthenticatedUser>> {
    bearer_token(event)
        .map(|token| validate_token(token, &state.jwt_secret))
        .transpose()
}

fn require_user(state: &AppState, event: &Request) -> shared::Result<AuthenticatedUser> {
    current_user(state, event)?.ok_or_else(|| shared::Error::Auth("Missing bearer token".to_string()))
}

pub async fn handler(state: Arc<AppState>, event: Request) -> Result<Response<Body>, Error> {
    let raw_path = event.uri().path();
    // Strip /api stage prefix if present
    let path = raw_path.strip_prefix("/api").unwrap_or(raw_path);
    let method = event.method().clone();

    if method == Method::OPTIONS {
        return preflight_response();
    }

    match (method.as_str(), path) {
        ("POST", "/help/chat") => {
            let user = match current_user(&state, &event) {
                Ok(user) => user,
                Err(e) => return from_error(&e),
            };
            let request: ChatRequest = parse_body!(event.body());
            let message = request.message.unwrap_or_default();

            respond(
                state
                    .help_center
                    .send_message(request.session_id.as_deref(), &message, user.map(|u| u.user_id))
                    .await,
            )
        }

        ("GET", "/help/history") => {
            let user = match require_user(&state, &event) {
                Ok(user) => user,
                Err(e) => return from_error(&e),
            };
            let limit = match event.query_string_parameters().first("limit") {
                None => None,
                Some(raw) => match raw.parse::<i64>() {
                    Ok(limit) => Some(limit),
                    Err(_) => return error_response(400, "limit must be a number"),
                },
            };

            respond(
                state
                    .help_center
                    .conversation_history(user.user_id, limit)
                    .await
                    .map(|conversations| json!({ "conversations": conversations })),
            )
        }

        ("POST", "/help/live-agent") => {
            let user = match require_user(&state, &event) {
                Ok(user) => user,
                Err(e) => return from_error(&e),
            };
            let request: LiveAgentRequest = parse_body!(event.body());
            let message = request.message.unwrap_or_default();

            respond(
                state
                    .help_center
                    .request_live_agent(user.user_id, &message, request.priority)
                    .await,
            )
        }

        ("POST", "/help/screen-share") => {
            let user = match require_user(&state, &event) {
                Ok(user) => user,
                Err(e) => return from_error(&e),
            };
            let request: ScreenShareRequest = parse_body!(event.body());

            respond(
                state
                    .help_center
                    .create_screen_share_session(user.user_id, request.confirmation_code.as_deref())
                    .await
                    .map(|session| json!({ "session": session })),
            )
        }

        ("GET", _) if path.starts_with(SCREEN_SHARE_PREFIX) => {
            let code = &path[SCREEN_SHARE_PREFIX.len()..];
            match state.help_center.validate_screen_share_code(code).await {
                Ok(Some(session)) => json_response(200, &ApiResponse::success(json!({ "session": session }))),
                Ok(None) => error_response(404, "Invalid or inactive confirmation code"),
                Err(e) => from_error(&e),
            }
        }

        ("POST", "/help/agent/status") => {
            let agent = match require_user(&state, &event) {
                Ok(user) => user,
                Err(e) => return from_error(&e),
            };
            let request: AgentStatusRequest = parse_body!(event.body());
            let Some(online) = request.online else {
                return error_response(400, "online is required");
            };

            let active_agents = if online {
                state.help_center.agent_online(agent.user_id).await
            } else {
                state.help_center.agent_offline(agent.user_id).await
            };
            info!(agent_id = %agent.user_id, online, active_agents, "Agent status changed");
            json_response(200, &ApiResponse::success(json!({ "activeAgents": active_agents })))
        }

        ("POST", "/help/agent/next") => {
            let agent = match require_user(&state, &event) {
                Ok(user) => user,
                Err(e) => return from_error(&e),
            };

            respond(
                state
                    .help_center
                    .assign_next(agent.user_id)
                    .await
                    .map(|assignment| json!({ "assignment": assignment })),
            )
        }

        _ if ROUTES.contains(&path) || path.starts_with(SCREEN_SHARE_PREFIX) => {
            error_response(405, "Method not allowed")
        }

        _ => error_response(404, "Not found"),
    }
}
