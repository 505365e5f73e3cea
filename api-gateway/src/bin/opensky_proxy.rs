//! OpenSky Proxy Lambda - Looks up a flight in the OpenSky state vectors.
//!
//! Endpoints:
//! - GET /api/opensky-proxy?flightNumber=BA123&flightDate=2025-06-01&landingTime=14:00

use chrono::{DateTime, Duration, NaiveDate, SecondsFormat, Utc};
use lambda_http::http::{header, Method};
use lambda_http::{run, service_fn, Body, Error, Request, RequestExt, Response};
use serde::Serialize;
use serde_json::{json, Value};
use shared::http::{error_response, error_response_with_details, json_response};
use shared::{guard_method, ApiResponse, Config};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_LANDING_TIME: &str = "14:00";
const USER_AGENT: &str = "Timely/1.0";
const API_SOURCE: &str = "OpenSky States API (Real Flight Data)";
const PREVIEW_CHARS: usize = 500;

struct AppState {
    client: reqwest::Client,
    base_url: String,
    client_id: String,
    client_secret: String,
}

impl AppState {
    fn new() -> Result<Self, Error> {
        let config = Config::from_env()?;

        Ok(Self {
            client: config.http_client()?,
            client_id: Config::require(&config.opensky_client_id, "OPENSKY_CLIENT_ID")?.to_string(),
            client_secret: Config::require(&config.opensky_client_secret, "OPENSKY_CLIENT_SECRET")?.to_string(),
            base_url: config.opensky_base_url.trim_end_matches('/').to_string(),
        })
    }
}

/// Flight as reported back to the client. The states endpoint carries no
/// airport data, so those fields are always "Unknown".
#[derive(Debug, Serialize)]
struct FlightView {
    flight_number: String,
    flight_date: String,
    flight_status: &'static str,
    departure_airport: &'static str,
    arrival_airport: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    departure_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    arrival_time: Option<String>,
    departure_iata: &'static str,
    arrival_iata: &'static str,
    api_source: &'static str,
    raw_data: Value,
}

/// Unix-second bounds one hour either side of the landing hour on `date`.
fn search_window(date: &str, landing_time: &str) -> Option<(i64, i64)> {
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
    let hour: u32 = landing_time.split(':').next()?.trim().parse().ok()?;
    let landing = date.and_hms_opt(hour, 0, 0)?.and_utc();

    let begin = landing - Duration::hours(1);
    let end = landing + Duration::hours(1);
    Some((begin.timestamp(), end.timestamp()))
}

/// State vectors from either a bare array or the `{ time, states }` envelope.
fn state_vectors(body: Value) -> Vec<Value> {
    match body {
        Value::Array(states) => states,
        Value::Object(mut envelope) => match envelope.remove("states") {
            Some(Value::Array(states)) => states,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

/// First state vector whose callsign contains the flight number, ignoring
/// whitespace and case.
fn find_flight<'a>(states: &'a [Value], flight_number: &str) -> Option<&'a Value> {
    let wanted = flight_number.to_uppercase();
    states.iter().find(|state| {
        state
            .get(1)
            .and_then(Value::as_str)
            .map(|callsign| {
                callsign
                    .chars()
                    .filter(|c| !c.is_whitespace())
                    .collect::<String>()
                    .to_uppercase()
                    .contains(&wanted)
            })
            .unwrap_or(false)
    })
}

fn timestamp_at(state: &Value, index: usize) -> Option<String> {
    let secs = state.get(index).and_then(Value::as_f64).filter(|s| *s != 0.0)?;
    DateTime::<Utc>::from_timestamp(secs as i64, 0).map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true))
}

fn flight_view(flight_number: &str, flight_date: &str, state: &Value) -> FlightView {
    FlightView {
        flight_number: flight_number.to_string(),
        flight_date: flight_date.to_string(),
        flight_status: "confirmed",
        departure_airport: "Unknown",
        arrival_airport: "Unknown",
        departure_time: timestamp_at(state, 3),
        arrival_time: timestamp_at(state, 4),
        departure_iata: "Unknown",
        arrival_iata: "Unknown",
        api_source: API_SOURCE,
        raw_data: state.clone(),
    }
}

fn preview(text: &str) -> String {
    text.chars().take(PREVIEW_CHARS).collect()
}

/// Status, message and details for a non-2xx upstream answer.
fn upstream_failure(status: u16, text: &str) -> (u16, String, String) {
    if text.contains("<html") || text.contains("<!DOCTYPE") {
        return (
            500,
            format!("OpenSky API returned HTML error page (status: {})", status),
            "The API returned an HTML page instead of JSON. This usually means authentication failed or the endpoint is incorrect."
                .to_string(),
        );
    }
    (status, format!("OpenSky API error: {}", status), preview(text))
}

async fn handler(state: Arc<AppState>, event: Request) -> Result<Response<Body>, Error> {
    guard_method!(&event, [Method::GET]);

    let params = event.query_string_parameters();
    let flight_number = params.first("flightNumber").filter(|s| !s.is_empty());
    let flight_date = params.first("flightDate").filter(|s| !s.is_empty());
    let landing_time = params
        .first("landingTime")
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_LANDING_TIME);

    let (Some(flight_number), Some(flight_date)) = (flight_number, flight_date) else {
        return error_response(400, "Missing flightNumber or flightDate");
    };

    let Some((begin, end)) = search_window(flight_date, landing_time) else {
        return error_response(400, "Invalid flightDate or landingTime");
    };

    info!(flight_number, flight_date, landing_time, begin, end, "Searching OpenSky");

    let response = match state
        .client
        .get(format!("{}/states/all", state.base_url))
        .query(&[("begin", begin), ("end", end)])
        .header("X-API-Client", &state.client_id)
        .header("X-API-Secret", &state.client_secret)
        .header(header::USER_AGENT, USER_AGENT)
        .send()
        .await
    {
        Ok(response) => response,
        Err(e) => {
            error!(error = %e, "OpenSky request failed");
            return error_response_with_details(500, "Failed to reach OpenSky API", json!(e.to_string()));
        }
    };

    let status = response.status();
    let text = match response.text().await {
        Ok(text) => text,
        Err(e) => {
            error!(error = %e, "Failed to read OpenSky response");
            return error_response_with_details(500, "Failed to read OpenSky response", json!(e.to_string()));
        }
    };

    if !status.is_success() {
        warn!(status = status.as_u16(), preview = %preview(&text), "OpenSky returned an error");
        let (code, message, details) = upstream_failure(status.as_u16(), &text);
        return error_response_with_details(code, message, json!(details));
    }

    let body: Value = match serde_json::from_str(&text) {
        Ok(body) => body,
        Err(e) => {
            error!(error = %e, "Failed to parse OpenSky response");
            return error_response_with_details(
                500,
                "OpenSky API returned invalid response (HTML instead of JSON)",
                json!(preview(&text)),
            );
        }
    };

    let states = state_vectors(body);
    info!(count = states.len(), "OpenSky states received");

    if let Some(found) = find_flight(&states, flight_number) {
        info!(callsign = ?found.get(1), "Found flight");
        return json_response(
            200,
            &ApiResponse::success(json!({ "flight": flight_view(flight_number, flight_date, found) })),
        );
    }

    json_response(
        404,
        &ApiResponse {
            success: false,
            data: Some(json!({ "available_flights": states.len() })),
            error: Some(format!(
                "Flight {} not found in OpenSky data for {}",
                flight_number, flight_date
            )),
            details: None,
        },
    )
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let state = Arc::new(AppState::new()?);

    run(service_fn(move |event| {
        let state = Arc::clone(&state);
        async move { handler(state, event).await }
    }))
    .await
}
