//! Lenient response-body handling shared by the Graph clients.

use bizprofile_core::gateway::{GatewayError, RemoteResponse};
use serde_json::{Map, Value};

/// Parse a successful response body. Malformed or empty JSON becomes `{}`.
pub fn parse_success_body(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|_| Value::Object(Map::new()))
}

/// Parse an error response body.
///
/// Unparsable text is kept verbatim as a JSON string so it can be passed
/// through to the caller; an empty body becomes `{}`.
pub fn parse_error_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Object(Map::new());
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

/// Map a transport-level failure, stripping the URL from the message.
pub fn transport_error(err: reqwest::Error) -> GatewayError {
    GatewayError::Transport(err.without_url().to_string())
}

/// Read `response` into a [`RemoteResponse`], failing on non-2xx statuses.
pub async fn read_response(response: reqwest::Response) -> Result<RemoteResponse, GatewayError> {
    let status = response.status();
    let text = response.text().await.map_err(transport_error)?;

    if !status.is_success() {
        return Err(GatewayError::Remote {
            status: status.as_u16(),
            body: parse_error_body(&text),
        });
    }

    Ok(RemoteResponse {
        status: status.as_u16(),
        body: parse_success_body(&text),
    })
}
