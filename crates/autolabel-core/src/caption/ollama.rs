//! Ollama caption source for local vision model inference.
//!
//! Talks to a local Ollama instance via its HTTP API. No authentication.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};

use super::CaptionSource;
use crate::config::OllamaConfig;
use crate::error::PipelineError;
use crate::pipeline::LoadedImage;

/// Captions images with a vision model served by Ollama.
pub struct OllamaCaptioner {
    endpoint: String,
    model: String,
    prompt: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl OllamaCaptioner {
    pub fn new(config: &OllamaConfig, timeout: Duration) -> Self {
        Self {
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            prompt: config.prompt.clone(),
            timeout,
            client: reqwest::Client::new(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn error(image: &LoadedImage, message: String, status_code: Option<u16>) -> PipelineError {
        PipelineError::Caption {
            path: image.path.clone(),
            message,
            status_code,
        }
    }
}

/// Ollama /api/generate request body.
#[derive(Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    images: Vec<String>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

/// Ollama /api/generate response.
#[derive(Deserialize)]
struct OllamaResponse {
    response: String,
}

#[async_trait]
impl CaptionSource for OllamaCaptioner {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn caption(&self, image: &LoadedImage) -> Result<String, PipelineError> {
        let url = format!("{}/api/generate", self.endpoint);

        let body = OllamaRequest {
            model: &self.model,
            prompt: &self.prompt,
            images: vec![base64::engine::general_purpose::STANDARD.encode(image.bytes.as_slice())],
            stream: false,
            options: OllamaOptions {
                temperature: 0.0,
                num_predict: 60,
            },
        };

        let resp = self
            .client
            .post(&url)
            .json(&body)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| Self::error(image, format!("Ollama request failed: {e}"), None))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(Self::error(
                image,
                format!("Ollama HTTP {status}: {text}"),
                Some(status.as_u16()),
            ));
        }

        let parsed: OllamaResponse = resp.json().await.map_err(|e| {
            Self::error(image, format!("Failed to parse Ollama response: {e}"), None)
        })?;

        let text = parsed.response.trim().to_string();
        if text.is_empty() {
            return Err(Self::error(
                image,
                "Ollama returned an empty caption".to_string(),
                None,
            ));
        }
        tracing::debug!("{} caption: {}", image.file_name, text);
        Ok(text)
    }
}
