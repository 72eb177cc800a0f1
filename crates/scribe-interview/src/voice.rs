//! Spoken-reply notification.
//!
//! After each reply the controller asks the notifier for an audio rendering.
//! A notifier either returns a URL path the client can fetch or nothing.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::{debug, info};
use uuid::Uuid;

use scribe_core::config::SpeechConfig;

use crate::error::InterviewError;

/// URL prefix under which audio files are served.
pub const AUDIO_ROUTE: &str = "/audio";

/// Best-effort audio rendering of an agent reply.
#[async_trait]
pub trait AudioNotifier: Send + Sync {
    /// Returns the URL path of the rendered audio, if any.
    async fn notify(&self, text: &str) -> Result<Option<String>, InterviewError>;
}

/// Build the notifier from configuration.
pub fn notifier_from_config(config: &SpeechConfig, data_dir: &Path) -> Arc<dyn AudioNotifier> {
    if !config.enabled || config.endpoint.trim().is_empty() {
        debug!("Speech disabled");
        return Arc::new(SilentNotifier);
    }
    let api_key = std::env::var(&config.api_key_env)
        .ok()
        .filter(|k| !k.trim().is_empty());
    let audio_dir = data_dir.join(&config.audio_subdir);
    info!(endpoint = %config.endpoint, dir = %audio_dir.display(), "Speech enabled");
    Arc::new(HttpSpeechNotifier::new(config.endpoint.clone(), api_key, audio_dir))
}

/// Never produces audio.
pub struct SilentNotifier;

#[async_trait]
impl AudioNotifier for SilentNotifier {
    async fn notify(&self, _text: &str) -> Result<Option<String>, InterviewError> {
        Ok(None)
    }
}

/// Posts reply text to a text-to-speech endpoint and stores the returned
/// audio under the audio directory.
pub struct HttpSpeechNotifier {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    audio_dir: PathBuf,
}

impl HttpSpeechNotifier {
    pub fn new(endpoint: String, api_key: Option<String>, audio_dir: PathBuf) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(20))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            endpoint,
            api_key,
            audio_dir,
        }
    }

    pub fn audio_dir(&self) -> &Path {
        &self.audio_dir
    }
}

#[async_trait]
impl AudioNotifier for HttpSpeechNotifier {
    async fn notify(&self, text: &str) -> Result<Option<String>, InterviewError> {
        if text.trim().is_empty() {
            return Ok(None);
        }

        let mut request = self.client.post(&self.endpoint).json(&json!({ "text": text }));
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        let response = request
            .send()
            .await
            .map_err(|e| InterviewError::Speech(format!("request failed: {e}")))?;
        if !response.status().is_success() {
            return Err(InterviewError::Speech(format!(
                "endpoint returned {}",
                response.status()
            )));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| InterviewError::Speech(format!("failed to read audio: {e}")))?;
        if bytes.is_empty() {
            return Err(InterviewError::Speech("endpoint returned no audio".to_string()));
        }

        tokio::fs::create_dir_all(&self.audio_dir)
            .await
            .map_err(|e| InterviewError::Speech(format!("failed to create audio dir: {e}")))?;
        let file_name = format!("{}.mp3", Uuid::new_v4());
        tokio::fs::write(self.audio_dir.join(&file_name), &bytes)
            .await
            .map_err(|e| InterviewError::Speech(format!("failed to write audio: {e}")))?;

        debug!(file = %file_name, size = bytes.len(), "Stored reply audio");
        Ok(Some(format!("{}/{}", AUDIO_ROUTE, file_name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_silent_notifier() {
        assert_eq!(SilentNotifier.notify("hello").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_http_notifier_writes_audio_file() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_json(json!({"text": "What is your name?"})))
            .and(header("authorization", "Bearer speech-key"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0xFFu8, 0xFB, 0x90, 0x00]))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let notifier = HttpSpeechNotifier::new(
            server.uri(),
            Some("speech-key".to_string()),
            dir.path().join("audio"),
        );

        let url = notifier.notify("What is your name?").await.unwrap().unwrap();
        assert!(url.starts_with("/audio/"));
        assert!(url.ends_with(".mp3"));

        let file = url.trim_start_matches("/audio/");
        let stored = std::fs::read(dir.path().join("audio").join(file)).unwrap();
        assert_eq!(stored, vec![0xFF, 0xFB, 0x90, 0x00]);
    }

    #[tokio::test]
    async fn test_http_notifier_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let notifier = HttpSpeechNotifier::new(server.uri(), None, dir.path().to_path_buf());
        let err = notifier.notify("hi").await.unwrap_err();
        assert!(matches!(err, InterviewError::Speech(_)));
    }

    #[tokio::test]
    async fn test_http_notifier_skips_blank_text() {
        let dir = tempfile::tempdir().unwrap();
        let notifier =
            HttpSpeechNotifier::new("http://127.0.0.1:9".to_string(), None, dir.path().into());
        assert_eq!(notifier.notify("  ").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_notifier_from_config_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let notifier = notifier_from_config(&SpeechConfig::default(), dir.path());
        assert_eq!(notifier.notify("hello").await.unwrap(), None);
    }
}
