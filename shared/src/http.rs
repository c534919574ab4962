//! HTTP helpers for the Lambda handler.

use lambda_http::{Body, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{error, warn};

use crate::Error;

/// Error body returned for every failed request.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub detail: String,
}

/// Create a JSON response with the given status code and data.
pub fn json_response<T: Serialize>(status: u16, data: &T) -> Result<Response<Body>, lambda_http::Error> {
    let json = serde_json::to_string(data)?;
    Ok(Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(Body::from(json))?)
}

/// Create an error response with the given status code and message.
pub fn error_response(status: u16, message: impl Into<String>) -> Result<Response<Body>, lambda_http::Error> {
    json_response(
        status,
        &ErrorResponse {
            detail: message.into(),
        },
    )
}

/// Map a service error onto its HTTP response, logging it on the way out.
pub fn from_error(err: &Error) -> Result<Response<Body>, lambda_http::Error> {
    let status = err.status_code();
    if status >= 500 {
        error!("Request failed: {}", err);
    } else {
        warn!("Request rejected ({}): {}", status, err);
    }
    error_response(status, err.public_message())
}

/// Empty 204 answer to a CORS preflight request.
pub fn preflight_response() -> Result<Response<Body>, lambda_http::Error> {
    Ok(Response::builder()
        .status(204)
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Methods", "GET, POST, PUT, DELETE, OPTIONS")
        .header("Access-Control-Allow-Headers", "*")
        .body(Body::Empty)?)
}

/// Parse request body as JSON, returning a 400 response on failure.
///
/// Returns `Ok(Ok(T))` on successful parse, `Ok(Err(Response))` on parse error (400),
/// or `Err(lambda_http::Error)` on serialization failure.
pub fn parse_json_body<T: DeserializeOwned>(body: &Body) -> Result<Result<T, Response<Body>>, lambda_http::Error> {
    match serde_json::from_slice(body.as_ref()) {
        Ok(parsed) => Ok(Ok(parsed)),
        Err(e) => {
            warn!("Rejected request body: {}", e);
            let response = error_response(400, format!("Invalid request body: {}", e))?;
            Ok(Err(response))
        }
    }
}

/// Macro to parse request body, returning early with 400 on parse error.
///
/// Usage:
/// ```ignore
/// let request: CreateEventRequest = parse_body!(event.body());
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UpdateEventRequest;

    fn body_json(response: &Response<Body>) -> serde_json::Value {
        serde_json::from_slice(response.body().as_ref()).unwrap()
    }

    #[test]
    fn test_json_response_sets_headers() {
        let response = json_response(200, &serde_json::json!({"status": "healthy"})).unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(response.headers()["content-type"], "application/json");
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
        assert_eq!(body_json(&response)["status"], "healthy");
    }

    #[test]
    fn test_from_error_uses_status_and_detail() {
        let response = from_error(&Error::Conflict("e1".to_string())).unwrap();
        assert_eq!(response.status(), 409);
        assert_eq!(body_json(&response)["detail"], "Event with ID e1 already exists");

        let response = from_error(&Error::Config("bad backend".to_string())).unwrap();
        assert_eq!(response.status(), 500);
        assert_eq!(body_json(&response)["detail"], "Internal server error");
    }

    #[test]
    fn test_parse_json_body_rejects_garbage() {
        let body = Body::from("{not json");
        let response = parse_json_body::<UpdateEventRequest>(&body)
            .unwrap()
            .unwrap_err();
        assert_eq!(response.status(), 400);
        let detail = body_json(&response)["detail"].as_str().unwrap().to_string();
        assert!(detail.starts_with("Invalid request body:"));
    }

    #[test]
    fn test_parse_json_body_accepts_valid_json() {
        let body = Body::from(r#"{"title": "Launch"}"#);
        let parsed = parse_json_body::<UpdateEventRequest>(&body).unwrap().unwrap();
        assert_eq!(parsed.title.as_deref(), Some("Launch"));
    }
}
