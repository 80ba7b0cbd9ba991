//! Caller-facing envelopes.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

/// Fixed-shape status/message envelope returned by every handler.
///
/// `body` is itself a JSON document (a JSON string literal for every message
/// the service emits), mirroring the API Gateway proxy integration contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandlerResponse {
    pub status_code: u16,
    pub body: String,
}

impl HandlerResponse {
    /// Build an envelope whose body is `message` encoded as a JSON string.
    pub fn message(status: StatusCode, message: &str) -> Self {
        Self {
            status_code: status.as_u16(),
            body: serde_json::to_string(message).unwrap_or_default(),
        }
    }

    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for HandlerResponse {
    fn into_response(self) -> Response {
        (
            self.status(),
            [(header::CONTENT_TYPE, "application/json")],
            self.body,
        )
            .into_response()
    }
}

/// Inbound event in the API Gateway proxy shape.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyEvent {
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub is_base64_encoded: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_is_json_encoded_string() {
        let response = HandlerResponse::message(StatusCode::OK, "Code generation completed");
        assert_eq!(response.body, "\"Code generation completed\"");

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["statusCode"], 200);
        assert_eq!(json["body"], "\"Code generation completed\"");
    }

    #[test]
    fn test_proxy_event_defaults() {
        let event: ProxyEvent = serde_json::from_str("{}").unwrap();
        assert!(event.body.is_none());
        assert!(!event.is_base64_encoded);

        let event: ProxyEvent =
            serde_json::from_str(r#"{"body": "aGk=", "isBase64Encoded": true}"#).unwrap();
        assert_eq!(event.body.as_deref(), Some("aGk="));
        assert!(event.is_base64_encoded);
    }
}
