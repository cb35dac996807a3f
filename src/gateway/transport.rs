//! HTTP transport for step submissions.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use secrecy::ExposeSecret;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::GatewayError;

use super::payload::{REQUEST_DATA_PART, StepPayload};

/// Shown when a transport failure carries no message of its own.
pub const NETWORK_ERROR_FALLBACK: &str = "Network error. Please try again.";

/// Status and body of a completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

/// Sends a step payload and returns whatever came back.
///
/// Implementations report a response for any HTTP status; only failures to
/// get a response at all are errors.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post_multipart(
        &self,
        endpoint: &str,
        payload: StepPayload,
    ) -> Result<RawResponse, GatewayError>;
}

/// `reqwest`-backed transport.
///
/// No timeout is set: a request runs until it completes or the connection
/// fails.
pub struct HttpTransport {
    client: reqwest::Client,
    config: ClientConfig,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config: config.clone(),
        }
    }

    fn build_form(payload: StepPayload) -> Result<Form, GatewayError> {
        let request_data = serde_json::to_string(&payload.request_data)
            .map_err(|e| GatewayError::Transport(format!("Failed to encode request: {e}")))?;
        let json_part = Part::text(request_data)
            .mime_str("application/json")
            .map_err(transport_error)?;

        let mut form = Form::new().part(REQUEST_DATA_PART, json_part);
        for file in payload.files {
            let part = Part::bytes(file.attachment.bytes)
                .file_name(file.attachment.file_name)
                .mime_str(&file.attachment.content_type)
                .map_err(transport_error)?;
            form = form.part(file.field, part);
        }
        Ok(form)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post_multipart(
        &self,
        endpoint: &str,
        payload: StepPayload,
    ) -> Result<RawResponse, GatewayError> {
        let url = self.config.endpoint_url(endpoint);
        let file_count = payload.files.len();
        let form = Self::build_form(payload)?;

        let mut request = self.client.post(&url).multipart(form);
        if let Some(token) = &self.config.api_token {
            request = request.bearer_auth(token.expose_secret());
        }

        debug!(%url, files = file_count, "Posting step payload");
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(transport_error)?;
        Ok(RawResponse { status, body })
    }
}

fn transport_error(e: reqwest::Error) -> GatewayError {
    let message = e.to_string();
    if message.trim().is_empty() {
        GatewayError::Transport(NETWORK_ERROR_FALLBACK.to_string())
    } else {
        GatewayError::Transport(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_endpoint() {
        let config = ClientConfig {
            api_url: "https://api.example.com/api/v1".into(),
            ..ClientConfig::default()
        };
        let transport = HttpTransport::new(&config);
        assert_eq!(
            transport.config.endpoint_url("/technical"),
            "https://api.example.com/api/v1/technical"
        );
    }

    #[tokio::test]
    async fn unreachable_host_is_transport_error() {
        let config = ClientConfig {
            // Port 9 (discard) on localhost is closed in test environments.
            api_url: "http://127.0.0.1:9".into(),
            ..ClientConfig::default()
        };
        let transport = HttpTransport::new(&config);
        let payload = super::super::payload::build_payload(
            crate::wizard::Step::UseCase,
            "ORG_ABCDEFGH",
            &crate::wizard::FieldBag::default(),
        );
        let err = transport.post_multipart("/usecase", payload).await.unwrap_err();
        assert!(matches!(err, GatewayError::Transport(ref m) if !m.is_empty()));
    }
}
