//! Speech synthesis client: `POST /api/tts` → audio bytes.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, error};

use voxmate_core::types::SpeechRequest;
use voxmate_core::{VoxError, VoxResult};

use crate::http_provider::{status_error, transport_error, BackendClient};
use crate::traits::SpeechSynthesizer;

#[derive(Clone, Debug)]
pub struct HttpSpeechClient {
    backend: BackendClient,
}

impl HttpSpeechClient {
    pub fn new(api_base: &str, timeout: Duration) -> VoxResult<Self> {
        Ok(HttpSpeechClient {
            backend: BackendClient::new(api_base, timeout)?,
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for HttpSpeechClient {
    async fn synthesize(&self, request: &SpeechRequest) -> VoxResult<Vec<u8>> {
        debug!(
            engine = %request.engine,
            voice = %request.voice,
            rate = request.rate,
            volume = request.volume,
            chars = request.text.chars().count(),
            "Requesting speech"
        );

        let response = self
            .backend
            .http()
            .post(self.backend.url("/api/tts"))
            .json(request)
            .send()
            .await
            .map_err(|e| transport_error("/api/tts", e))?;

        if !response.status().is_success() {
            return Err(status_error("/api/tts", response).await);
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| transport_error("/api/tts", e))?;

        if audio.is_empty() {
            error!("Speech backend returned an empty audio body");
            return Err(VoxError::Payload("empty audio".into()));
        }

        debug!(bytes = audio.len(), "Speech received");
        Ok(audio.to_vec())
    }

    fn display_name(&self) -> &str {
        "speech backend"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> SpeechRequest {
        SpeechRequest {
            text: "hello there".into(),
            voice: "zh-CN-XiaoxiaoNeural".into(),
            rate: 1.0,
            volume: 1.2,
            engine: "edge".into(),
        }
    }

    fn client(uri: &str) -> HttpSpeechClient {
        HttpSpeechClient::new(uri, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_synthesize_returns_audio_bytes() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/tts"))
            .and(body_json(serde_json::json!({
                "text": "hello there",
                "voice": "zh-CN-XiaoxiaoNeural",
                "rate": 1.0,
                "volume": 1.2,
                "engine": "edge"
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(vec![0x49, 0x44, 0x33, 0x04], "audio/mpeg"),
            )
            .mount(&mock_server)
            .await;

        let audio = client(&mock_server.uri()).synthesize(&request()).await.unwrap();
        assert_eq!(audio, vec![0x49, 0x44, 0x33, 0x04]);
    }

    #[tokio::test]
    async fn test_empty_audio_is_payload_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/tts"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(Vec::<u8>::new(), "audio/mpeg"))
            .mount(&mock_server)
            .await;

        let err = client(&mock_server.uri())
            .synthesize(&request())
            .await
            .unwrap_err();
        assert!(matches!(err, VoxError::Payload(_)));
    }

    #[tokio::test]
    async fn test_error_status_carries_message() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/tts"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(serde_json::json!({"error": "text is empty"})),
            )
            .mount(&mock_server)
            .await;

        let err = client(&mock_server.uri())
            .synthesize(&request())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "backend returned 400: text is empty");
    }

    #[tokio::test]
    async fn test_unreachable_backend() {
        let err = client("http://127.0.0.1:1")
            .synthesize(&request())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "network");
    }
}
