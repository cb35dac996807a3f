//! Submission gateway: validate a step, then post it and read the reply.
//!
//! HTTP status is authoritative. Body fields such as `success` are advisory
//! and only logged when they disagree with the status.

pub mod payload;
pub mod transport;
pub mod validate;

pub use payload::{FilePart, StepPayload, build_payload};
pub use transport::{HttpTransport, RawResponse, Transport};
pub use validate::validate_step;

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::error::GatewayError;
use crate::wizard::{FieldBag, Step};

/// Message used when a successful response carries none.
pub const DEFAULT_SUCCESS_MESSAGE: &str = "Saved successfully";

/// Message used when a 2xx body is not JSON.
pub const INVALID_RESPONSE_MESSAGE: &str = "Invalid response from server";

/// Outcome of one step submission, ready to display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmitResult {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SubmitResult {
    pub fn ok(message: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data,
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            success: false,
            error: Some(message.clone()),
            message,
            data: None,
        }
    }
}

impl From<GatewayError> for SubmitResult {
    fn from(e: GatewayError) -> Self {
        Self::failed(e.to_string())
    }
}

/// Per-step validate-then-submit.
#[derive(Clone)]
pub struct Gateway {
    transport: Arc<dyn Transport>,
}

impl Gateway {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Submit one step's slice of `fields`.
    ///
    /// A validation failure returns before any request is made. There is no
    /// retry; the caller re-submits.
    pub async fn submit(&self, step: Step, organization_id: &str, fields: &FieldBag) -> SubmitResult {
        if let Err(e) = validate_step(step, organization_id, fields) {
            info!(%step, error = %e, "Step failed local validation");
            return e.into();
        }

        let payload = build_payload(step, organization_id, fields);
        let response = match self.transport.post_multipart(step.endpoint(), payload).await {
            Ok(response) => response,
            Err(e) => {
                warn!(%step, error = %e, "Step submission did not reach the backend");
                return e.into();
            }
        };

        let result = interpret_response(response.status, &response.body);
        if result.success {
            info!(%step, status = response.status, "Step submitted");
        } else {
            warn!(%step, status = response.status, message = %result.message, "Step rejected");
        }
        result
    }
}

/// Turn a status and body into a [`SubmitResult`].
pub fn interpret_response(status: u16, body: &str) -> SubmitResult {
    let parsed = if body.trim().is_empty() {
        None
    } else {
        serde_json::from_str::<Value>(body).ok()
    };

    if (200..300).contains(&status) {
        if body.trim().is_empty() {
            return SubmitResult::ok(DEFAULT_SUCCESS_MESSAGE, None);
        }
        let Some(json) = parsed else {
            return GatewayError::Application {
                status,
                message: INVALID_RESPONSE_MESSAGE.to_string(),
            }
            .into();
        };
        if json.get("success").and_then(Value::as_bool) == Some(false) {
            warn!(status, "Body reports success=false on a 2xx response; trusting the status");
        }
        let message = json
            .get("message")
            .and_then(Value::as_str)
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(DEFAULT_SUCCESS_MESSAGE)
            .to_string();
        let data = json.get("data").filter(|d| !d.is_null()).cloned();
        return SubmitResult::ok(message, data);
    }

    let message = parsed
        .as_ref()
        .and_then(error_message_from_body)
        .unwrap_or_else(|| status_text(status));
    GatewayError::Application { status, message }.into()
}

/// Best-effort error text from `message`, `detail`, or `error`.
///
/// `detail` may be a list of validation entries; the first `msg` wins.
fn error_message_from_body(body: &Value) -> Option<String> {
    ["message", "detail", "error"].iter().find_map(|key| {
        match body.get(*key)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            Value::Array(items) => items
                .iter()
                .find_map(|item| item.get("msg").and_then(Value::as_str))
                .map(str::to_string),
            Value::Object(obj) => obj
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string),
            _ => None,
        }
    })
}

fn status_text(status: u16) -> String {
    reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .map(str::to_string)
        .unwrap_or_else(|| format!("Request failed with status {status}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use crate::wizard::fields::{Attachment, BusinessType};

    /// Records every call and answers with a canned response.
    struct RecordingTransport {
        calls: Mutex<Vec<(String, StepPayload)>>,
        reply: Result<RawResponse, String>,
    }

    impl RecordingTransport {
        fn replying(status: u16, body: &str) -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                reply: Ok(RawResponse {
                    status,
                    body: body.to_string(),
                }),
            })
        }

        fn failing(message: &str) -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                reply: Err(message.to_string()),
            })
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait::async_trait]
    impl Transport for RecordingTransport {
        async fn post_multipart(
            &self,
            endpoint: &str,
            payload: StepPayload,
        ) -> Result<RawResponse, GatewayError> {
            self.calls
                .lock()
                .unwrap()
                .push((endpoint.to_string(), payload));
            self.reply.clone().map_err(GatewayError::Transport)
        }
    }

    const ORG: &str = "ORG_ABCDEFGH";

    fn compliance_without_privacy() -> FieldBag {
        let mut bag = FieldBag::default();
        bag.compliance.information_security_policy =
            Some(Attachment::new("isp.pdf", b"%PDF".to_vec()));
        bag.compliance.data_privacy_policy_url = "  \t ".into();
        bag
    }

    #[tokio::test]
    async fn validation_failure_sends_nothing() {
        let transport = RecordingTransport::replying(200, "{}");
        let gateway = Gateway::new(transport.clone());

        let result = gateway
            .submit(Step::Compliance, ORG, &compliance_without_privacy())
            .await;

        assert!(!result.success);
        assert_eq!(
            result.error.as_deref(),
            Some("Data Privacy Policy PDF or website link is required")
        );
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn success_posts_to_step_endpoint() {
        let transport = RecordingTransport::replying(
            201,
            r#"{"message": "Basic info saved", "data": {"id": 42}}"#,
        );
        let gateway = Gateway::new(transport.clone());

        let mut bag = FieldBag::default();
        bag.basic_info.legal_entity_name = "Acme".into();
        bag.basic_info.registered_address = "1 Main St".into();
        bag.basic_info.business_type = Some(BusinessType::Partnership);

        let result = gateway.submit(Step::BasicInfo, ORG, &bag).await;
        assert!(result.success);
        assert_eq!(result.message, "Basic info saved");
        assert_eq!(result.data, Some(serde_json::json!({"id": 42})));
        assert!(result.error.is_none());

        let calls = transport.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "/basic-info");
        assert_eq!(calls[0].1.request_data["organization_id"], ORG);
    }

    #[tokio::test]
    async fn transport_failure_is_surfaced() {
        let gateway = Gateway::new(RecordingTransport::failing("connection refused"));
        let result = gateway.submit(Step::UseCase, ORG, &FieldBag::default()).await;
        assert!(!result.success);
        assert_eq!(result.message, "connection refused");
    }

    #[test]
    fn interpret_success_defaults_message() {
        let result = interpret_response(200, r#"{"data": null}"#);
        assert!(result.success);
        assert_eq!(result.message, DEFAULT_SUCCESS_MESSAGE);
        assert!(result.data.is_none());

        let empty = interpret_response(204, "");
        assert!(empty.success);
    }

    #[test]
    fn interpret_status_is_authoritative() {
        // Advisory body flag disagrees; the status wins.
        let result = interpret_response(200, r#"{"success": false, "message": "ok?"}"#);
        assert!(result.success);

        let result = interpret_response(400, r#"{"success": true, "message": "Bad org"}"#);
        assert!(!result.success);
        assert_eq!(result.message, "Bad org");
    }

    #[test]
    fn interpret_unparsable_success_body() {
        let result = interpret_response(200, "<html>proxy</html>");
        assert!(!result.success);
        assert_eq!(result.message, INVALID_RESPONSE_MESSAGE);
    }

    #[test]
    fn interpret_error_message_sources() {
        assert_eq!(
            interpret_response(422, r#"{"detail": "Organization not found"}"#).message,
            "Organization not found"
        );
        assert_eq!(
            interpret_response(
                422,
                r#"{"detail": [{"loc": ["body"], "msg": "field required"}]}"#
            )
            .message,
            "field required"
        );
        assert_eq!(
            interpret_response(500, r#"{"error": {"message": "boom"}}"#).message,
            "boom"
        );
        assert_eq!(
            interpret_response(502, "Bad Gateway from nginx").message,
            "Bad Gateway"
        );
        assert_eq!(
            interpret_response(599, "").message,
            "Request failed with status 599"
        );
    }
}
