//! HTTP helpers for Lambda functions.

use lambda_http::http::{header, Method};
use lambda_http::{Body, Request, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::Error;

const ALLOW_METHODS: &str = "GET, POST, OPTIONS";
const ALLOW_HEADERS: &str = "Content-Type, Authorization";

/// Standard API response wrapper.
///
/// The payload is flattened next to `success`, so a handler returning
/// `{ message, guest_email }` produces `{"success":true,"message":..,"guest_email":..}`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(flatten)]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            details: None,
        }
    }

    pub fn error(message: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            error: Some(message.into()),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// Create a JSON response with the given status code and data.
pub fn json_response<T: Serialize>(status: u16, data: &T) -> Result<Response<Body>, lambda_http::Error> {
    Ok(Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")
        .header(header::ACCESS_CONTROL_ALLOW_METHODS, ALLOW_METHODS)
        .header(header::ACCESS_CONTROL_ALLOW_HEADERS, ALLOW_HEADERS)
        .body(Body::from(serde_json::to_string(data)?))?)
}

/// Create an error response with the given status code and message.
pub fn error_response(status: u16, message: impl Into<String>) -> Result<Response<Body>, lambda_http::Error> {
    json_response(status, &ApiResponse::<()>::error(message))
}

/// Error response carrying a `details` value next to the message.
pub fn error_response_with_details(
    status: u16,
    message: impl Into<String>,
    details: serde_json::Value,
) -> Result<Response<Body>, lambda_http::Error> {
    json_response(status, &ApiResponse::<()>::error(message).with_details(details))
}

/// Map a shared error onto its status code and public message.
pub fn from_error(err: &Error) -> Result<Response<Body>, lambda_http::Error> {
    error_response(err.status_code(), err.public_message())
}

/// Empty 200 answer to a CORS preflight.
pub fn preflight_response() -> Result<Response<Body>, lambda_http::Error> {
    Ok(Response::builder()
        .status(200)
        .header(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")
        .header(header::ACCESS_CONTROL_ALLOW_METHODS, ALLOW_METHODS)
        .header(header::ACCESS_CONTROL_ALLOW_HEADERS, ALLOW_HEADERS)
        .body(Body::Empty)?)
}

/// Answer preflights and reject verbs the endpoint does not serve.
///
/// Returns `Ok(Some(response))` when the request has been answered here and
/// `Ok(None)` when the handler should carry on.
pub fn check_method(event: &Request, allowed: &[Method]) -> Result<Option<Response<Body>>, lambda_http::Error> {
    let method = event.method();
    if method == Method::OPTIONS {
        return preflight_response().map(Some);
    }
    if allowed.contains(method) {
        return Ok(None);
    }

    let allow = allowed
        .iter()
        .map(Method::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    let mut response = error_response(405, "Method not allowed")?;
    response.headers_mut().insert(header::ALLOW, allow.parse()?);
    Ok(Some(response))
}

/// Parse request body as JSON, returning a 400 response on failure.
///
/// An empty body parses as `{}`, so request types made of optional fields
/// report their own "missing field" errors instead of a parse error.
///
/// Returns `Ok(Ok(T))` on successful parse, `Ok(Err(Response))` on parse error (400),
/// or `Err(lambda_http::Error)` on serialization failure.
pub fn parse_json_body<T: DeserializeOwned>(body: &Body) -> Result<Result<T, Response<Body>>, lambda_http::Error> {
    let bytes: &[u8] = body.as_ref();
    let bytes = if bytes.iter().all(u8::is_ascii_whitespace) {
        b"{}".as_slice()
    } else {
        bytes
    };

    match serde_json::from_slice(bytes) {
        Ok(parsed) => Ok(Ok(parsed)),
        Err(e) => {
            let response = error_response(400, format!("Invalid request body: {}", e))?;
            Ok(Err(response))
        }
    }
}

/// Read a bearer token from the `Authorization` header.
pub fn bearer_token(event: &Request) -> Option<&str> {
    event
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Macro to parse request body, returning early with 400 on parse error.
///
/// Usage:
/// ```ignore
/// let request: MyRequest = parse_body!(event.body());
/// ```
#[macro_export]
macro_rules! parse_body {
    ($body:expr) => {
        match shared::http::parse_json_body($body)? {
            Ok(parsed) => parsed,
            Err(response) => return Ok(response),
        }
    };
}

/// Macro to answer OPTIONS and reject unsupported verbs, returning early.
///
/// Usage:
/// ```ignore
/// guard_method!(&event, [Method::POST]);
/// ```
#[macro_export]
macro_rules! guard_method {
    ($event:expr, [$($method:expr),+ $(,)?]) => {
        if let Some(response) = shared::http::check_method($event, &[$($method),+])? {
            return Ok(response);
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Serialize)]
    struct Confirmed {
        message: String,
        guest_email: String,
    }

    #[derive(Debug, Deserialize, Default)]
    struct Optional {
        token: Option<String>,
    }

    fn request(method: Method) -> Request {
        let mut req = Request::new(Body::Empty);
        *req.method_mut() = method;
        req
    }

    #[test]
    fn test_success_payload_is_flattened() {
        let body = serde_json::to_value(ApiResponse::success(Confirmed {
            message: "ok".into(),
            guest_email: "guest@example.com".into(),
        }))
        .unwrap();

        assert_eq!(
            body,
            serde_json::json!({"success": true, "message": "ok", "guest_email": "guest@example.com"})
        );
    }

    #[test]
    fn test_error_body_shape() {
        let body = serde_json::to_value(
            ApiResponse::<()>::error("Some emails failed to send")
                .with_details(serde_json::json!(["bounce"])),
        )
        .unwrap();

        assert_eq!(
            body,
            serde_json::json!({"success": false, "error": "Some emails failed to send", "details": ["bounce"]})
        );
    }

    #[test]
    fn test_options_is_answered_with_cors() {
        let response = check_method(&request(Method::OPTIONS), &[Method::POST])
            .unwrap()
            .expect("preflight answered");
        assert_eq!(response.status(), 200);
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    }

    #[test]
    fn test_wrong_verb_is_405() {
        let response = check_method(&request(Method::GET), &[Method::POST])
            .unwrap()
            .expect("rejected");
        assert_eq!(response.status(), 405);
        assert_eq!(response.headers()[header::ALLOW], "POST");

        assert!(check_method(&request(Method::POST), &[Method::POST]).unwrap().is_none());
    }

    #[test]
    fn test_empty_body_parses_as_object() {
        let parsed: Optional = parse_json_body(&Body::Empty).unwrap().unwrap();
        assert!(parsed.token.is_none());

        let rejected = parse_json_body::<Optional>(&Body::from("not json")).unwrap();
        assert_eq!(rejected.unwrap_err().status(), 400);
    }

    #[test]
    fn test_bearer_token() {
        let mut req = request(Method::GET);
        req.headers_mut()
            .insert(header::AUTHORIZATION, "Bearer abc.def".parse().unwrap());
        assert_eq!(bearer_token(&req), Some("abc.def"));

        let req = request(Method::GET);
        assert_eq!(bearer_token(&req), None);
    }
}
