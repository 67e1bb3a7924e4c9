//! HTTP plumbing shared by every backend collaborator, plus the chat client.
//!
//! The backend exposes one base URL; `/api/chat`, `/api/tts`, `/api/asr`
//! and `/api/status` hang off it. Every non-2xx answer carries
//! `{"error": "..."}`.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, error};

use voxmate_core::types::{ChatReply, ChatRequest, ErrorBody};
use voxmate_core::{VoxError, VoxResult};

use crate::traits::ChatProvider;

/// Longest error body kept when the backend did not send `{"error"}`.
const MAX_ERROR_BODY_CHARS: usize = 200;

// ─────────────────────────────────────────────
// Shared client
// ─────────────────────────────────────────────

/// A reqwest client bound to the backend base URL.
#[derive(Clone)]
pub struct BackendClient {
    /// HTTP client (shared, connection-pooled).
    client: reqwest::Client,
    /// Base URL without trailing slash (e.g. `"http://127.0.0.1:5000"`).
    api_base: String,
}

impl std::fmt::Debug for BackendClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendClient")
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl BackendClient {
    /// Build a client whose requests time out after `timeout`.
    pub fn new(api_base: &str, timeout: Duration) -> VoxResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| VoxError::Config(format!("cannot build HTTP client: {e}")))?;

        Ok(BackendClient {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
        })
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Full URL for an endpoint path such as `/api/chat`.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.client
    }
}

/// Map a transport failure (connect, timeout, broken body) to `Network`.
pub(crate) fn transport_error(endpoint: &str, e: reqwest::Error) -> VoxError {
    error!(endpoint, error = %e, "HTTP request failed");
    if e.is_timeout() {
        VoxError::Network(format!("{endpoint} timed out"))
    } else {
        VoxError::Network(e.to_string())
    }
}

/// Turn a non-2xx response into `Status`, preferring the `{"error"}` text.
pub(crate) async fn status_error(endpoint: &str, response: reqwest::Response) -> VoxError {
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Failed to read error body".to_string());

    let message = match serde_json::from_str::<ErrorBody>(&body) {
        Ok(parsed) => parsed.error,
        Err(_) => voxmate_core::utils::truncate_string(body.trim(), MAX_ERROR_BODY_CHARS),
    };

    error!(endpoint, status = %status, body = %message, "API error");
    VoxError::Status {
        status: status.as_u16(),
        message,
    }
}

// ─────────────────────────────────────────────
// Chat
// ─────────────────────────────────────────────

/// `POST /api/chat` client.
#[derive(Clone, Debug)]
pub struct HttpChatClient {
    backend: BackendClient,
}

impl HttpChatClient {
    pub fn new(api_base: &str, timeout: Duration) -> VoxResult<Self> {
        Ok(HttpChatClient {
            backend: BackendClient::new(api_base, timeout)?,
        })
    }

    fn chat_url(&self) -> String {
        self.backend.url("/api/chat")
    }
}

#[async_trait]
impl ChatProvider for HttpChatClient {
    async fn chat(&self, request: &ChatRequest) -> VoxResult<String> {
        debug!(
            provider = %request.provider,
            model = %request.model,
            messages = request.messages.len(),
            "Calling chat backend"
        );

        let response = self
            .backend
            .http()
            .post(self.chat_url())
            .json(request)
            .send()
            .await
            .map_err(|e| transport_error("/api/chat", e))?;

        if !response.status().is_success() {
            return Err(status_error("/api/chat", response).await);
        }

        let reply: ChatReply = response.json().await.map_err(|e| {
            error!(error = %e, "Failed to parse chat response");
            VoxError::Payload(format!("unreadable chat response: {e}"))
        })?;

        if reply.response.trim().is_empty() {
            error!("Chat backend returned an empty response");
            return Err(VoxError::Payload("empty chat response".into()));
        }

        debug!(chars = reply.response.chars().count(), "Chat response received");
        Ok(reply.response)
    }

    fn display_name(&self) -> &str {
        "chat backend"
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use voxmate_core::types::{Role, WireMessage};
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> ChatRequest {
        ChatRequest {
            provider: "deepseek".into(),
            api_key: "sk-test-0123456789".into(),
            model: "DeepSeek-V3".into(),
            messages: vec![WireMessage {
                role: Role::User,
                content: "hi".into(),
            }],
            temperature: 0.6,
        }
    }

    fn client(uri: &str) -> HttpChatClient {
        HttpChatClient::new(uri, Duration::from_secs(5)).unwrap()
    }

    // ── Unit tests ──

    #[test]
    fn test_url_trailing_slash() {
        let c = client("http://127.0.0.1:5000/");
        assert_eq!(c.chat_url(), "http://127.0.0.1:5000/api/chat");
    }

    #[test]
    fn test_url_no_trailing_slash() {
        let c = client("http://127.0.0.1:5000");
        assert_eq!(c.chat_url(), "http://127.0.0.1:5000/api/chat");
    }

    // ── Integration tests with mock server ──

    #[tokio::test]
    async fn test_chat_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "response": "hello",
                "timestamp": "2024-05-29T16:26:40"
            })))
            .mount(&mock_server)
            .await;

        let reply = client(&mock_server.uri()).chat(&request()).await.unwrap();
        assert_eq!(reply, "hello");
    }

    #[tokio::test]
    async fn test_chat_sends_correct_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_partial_json(serde_json::json!({
                "provider": "deepseek",
                "api_key": "sk-test-0123456789",
                "model": "DeepSeek-V3",
                "messages": [{"role": "user", "content": "hi"}],
                "temperature": 0.6
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"response": "ok"})),
            )
            .mount(&mock_server)
            .await;

        // If the body matcher fails, wiremock returns 404 → we'd get an error
        let reply = client(&mock_server.uri()).chat(&request()).await.unwrap();
        assert_eq!(reply, "ok");
    }

    #[tokio::test]
    async fn test_chat_api_error_uses_error_field() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(
                ResponseTemplate::new(500)
                    .set_body_json(serde_json::json!({"error": "upstream exploded"})),
            )
            .mount(&mock_server)
            .await;

        let err = client(&mock_server.uri()).chat(&request()).await.unwrap_err();
        match err {
            VoxError::Status { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "upstream exploded");
            }
            other => panic!("Expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_chat_api_error_plain_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
            .mount(&mock_server)
            .await;

        let err = client(&mock_server.uri()).chat(&request()).await.unwrap_err();
        assert!(matches!(err, VoxError::Status { status: 502, ref message } if message == "Bad Gateway"));
    }

    #[tokio::test]
    async fn test_chat_malformed_payload() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"answer": "nope"})),
            )
            .mount(&mock_server)
            .await;

        let err = client(&mock_server.uri()).chat(&request()).await.unwrap_err();
        assert!(matches!(err, VoxError::Payload(_)));
    }

    #[tokio::test]
    async fn test_chat_blank_response_is_payload_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"response": "  "})),
            )
            .mount(&mock_server)
            .await;

        let err = client(&mock_server.uri()).chat(&request()).await.unwrap_err();
        assert!(matches!(err, VoxError::Payload(_)));
    }

    #[tokio::test]
    async fn test_chat_network_error() {
        // Point to a port that's not listening
        let err = client("http://127.0.0.1:1").chat(&request()).await.unwrap_err();
        assert!(matches!(err, VoxError::Network(_)));
    }

    #[tokio::test]
    async fn test_chat_timeout_is_network_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"response": "late"}))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&mock_server)
            .await;

        let slow = HttpChatClient::new(&mock_server.uri(), Duration::from_millis(50)).unwrap();
        let err = slow.chat(&request()).await.unwrap_err();
        assert!(matches!(err, VoxError::Network(_)));
    }
}
