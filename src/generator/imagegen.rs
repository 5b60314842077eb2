//! Client for the remote image model (`models/<model>:generateContent`).
//!
//! Wire types are private to this module; callers get raw image bytes or an
//! [`ImageError`] carrying a stable error code for the JSON report.

use std::path::{Path, PathBuf};
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, trace};

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("no API key configured")]
    MissingApiKey,

    #[error("request failed: {0}")]
    Request(String),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("response is not valid JSON: {0}")]
    BadJson(String),

    #[error("response contains no image data")]
    NoImage,

    #[error("image data is not valid base64: {0}")]
    Base64(String),

    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ImageError {
    /// Stable code reported to API callers.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingApiKey => "missing_api_key",
            Self::Request(_) => "request_failed",
            Self::Http { .. } => "http_error",
            Self::BadJson(_) => "bad_json",
            Self::NoImage => "no_image_in_response",
            Self::Base64(_) => "base64_decode_failed",
            Self::Write { .. } => "write_failed",
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn detail(&self) -> Option<String> {
        match self {
            Self::MissingApiKey | Self::NoImage => None,
            Self::Http { body, .. } => Some(body.clone()),
            Self::Request(msg) | Self::BadJson(msg) | Self::Base64(msg) => Some(msg.clone()),
            Self::Write { path, source } => Some(format!("{}: {source}", path.display())),
        }
    }
}

// ── Client ────────────────────────────────────────────────────────────────────

/// Cheap to clone; `reqwest::Client` is reference-counted.
#[derive(Debug, Clone)]
pub struct ImageClient {
    client: Client,
    api_base_url: String,
}

impl ImageClient {
    pub fn new(api_base_url: &str, timeout_seconds: u64) -> Result<Self, ImageError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| ImageError::Request(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.api_base_url,
            urlencoding::encode(model)
        )
    }

    /// One round-trip. No retry.
    pub async fn generate(
        &self,
        api_key: &str,
        prompt: &str,
        model: &str,
        aspect_ratio: &str,
    ) -> Result<Vec<u8>, ImageError> {
        if api_key.trim().is_empty() {
            return Err(ImageError::MissingApiKey);
        }

        let payload = GenerateRequest {
            contents: vec![Content {
                parts: vec![TextPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                response_modalities: ["Image"],
                image_config: ImageConfig { aspect_ratio },
            },
        };
        let url = self.endpoint(model);

        debug!(%model, %aspect_ratio, prompt_len = prompt.len(), "sending image request");
        trace!(%prompt, "image prompt");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                error!(%url, error = %e, timeout = e.is_timeout(), "image request failed (transport)");
                ImageError::Request(e.to_string())
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ImageError::Request(format!("failed to read response body: {e}")))?;

        if !status.is_success() {
            error!(%status, body_len = body.len(), "image request returned HTTP error");
            return Err(ImageError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let data = extract_image_data(&body)?;
        let bytes = STANDARD
            .decode(data.split_whitespace().collect::<String>())
            .map_err(|e| ImageError::Base64(e.to_string()))?;

        debug!(bytes = bytes.len(), "received image");
        Ok(bytes)
    }

    /// Generate and write the image to `out_path`, creating parent dirs.
    /// Returns the number of bytes written.
    pub async fn generate_to_file(
        &self,
        api_key: &str,
        prompt: &str,
        model: &str,
        aspect_ratio: &str,
        out_path: &Path,
    ) -> Result<usize, ImageError> {
        let bytes = self.generate(api_key, prompt, model, aspect_ratio).await?;
        let write_err = |source| ImageError::Write {
            path: out_path.to_path_buf(),
            source,
        };
        if let Some(parent) = out_path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
        }
        tokio::fs::write(out_path, &bytes).await.map_err(write_err)?;
        Ok(bytes.len())
    }
}

/// Pull the first inline image payload out of a response body.
///
/// Walks `candidates[0].content.parts` loosely: parts that are not objects or
/// carry no `inlineData.data` (or `inline_data.data`) string are skipped.
fn extract_image_data(body: &str) -> Result<String, ImageError> {
    let value: Value = serde_json::from_str(body).map_err(|e| ImageError::BadJson(e.to_string()))?;
    if !value.is_object() {
        return Err(ImageError::BadJson("top-level value is not an object".into()));
    }

    value
        .pointer("/candidates/0/content/parts")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .find_map(|part| {
            part.get("inlineData")
                .or_else(|| part.get("inline_data"))
                .and_then(|d| d.get("data"))
                .and_then(Value::as_str)
                .filter(|d| !d.is_empty())
        })
        .map(str::to_string)
        .ok_or(ImageError::NoImage)
}

// ── Private wire types ────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig<'a>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<TextPart<'a>>,
}

#[derive(Debug, Serialize)]
struct TextPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct GenerationConfig<'a> {
    #[serde(rename = "responseModalities")]
    response_modalities: [&'static str; 1],
    #[serde(rename = "imageConfig")]
    image_config: ImageConfig<'a>,
}

#[derive(Debug, Serialize)]
struct ImageConfig<'a> {
    #[serde(rename = "aspectRatio")]
    aspect_ratio: &'a str,
}
