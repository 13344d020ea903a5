//! Upstream services: the vision model and the optional OCR pre-pass.
//!
//! Both sit behind small traits so the analysis entry point can be driven
//! by a fake in tests, and so a different model vendor is one new impl.
//!
//! ```text
//! ImageInput ──▶ TextDetector (optional) ──▶ VisionModel ──▶ raw answer text
//!                (Cloud Vision)              (Gemini)
//! ```
//!
//! Request bodies are built and response bodies decoded by pure functions
//! in each submodule; only [`post_json`] touches the network.

pub mod cloud_vision;
pub mod gemini;

pub use cloud_vision::CloudVisionClient;
pub use gemini::GeminiClient;

use crate::error::ItemLensError;
use crate::image::ImageInput;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

/// One prompt + image call to a vision model.
#[derive(Debug, Clone)]
pub struct VisionRequest {
    pub prompt: String,
    /// Extra text part sent between the prompt and the image (OCR context).
    pub context: Option<String>,
    pub image: ImageInput,
}

/// The model's answer and what it cost.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisionAnswer {
    pub text: String,
    pub prompt_tokens: Option<u32>,
    pub output_tokens: Option<u32>,
}

/// A generative model that answers a prompt about an image.
#[async_trait]
pub trait VisionModel: Send + Sync {
    /// Model identifier, reported in the analysis stats.
    fn name(&self) -> &str;

    /// One request, no retries. An answer with no text is an error, never
    /// an empty `VisionAnswer`.
    async fn generate(&self, request: &VisionRequest) -> Result<VisionAnswer, ItemLensError>;
}

/// Text detection over an image.
#[async_trait]
pub trait TextDetector: Send + Sync {
    /// `Ok(None)` when the image contains no text.
    async fn detect_text(&self, image: &ImageInput) -> Result<Option<String>, ItemLensError>;
}

/// Build the shared HTTP client with the per-request timeout.
pub(crate) fn http_client(service: &str, timeout_secs: u64) -> Result<reqwest::Client, ItemLensError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| ItemLensError::UpstreamRequest {
            service: service.to_string(),
            reason: e.to_string(),
        })
}

/// POST `body` as JSON with the API key header and decode the JSON reply.
///
/// Non-2xx replies become [`ItemLensError::UpstreamStatus`] carrying the
/// first part of the body, which is where Google APIs put the reason.
pub(crate) async fn post_json<B, R>(
    client: &reqwest::Client,
    service: &str,
    url: &str,
    api_key: &str,
    body: &B,
    timeout_secs: u64,
) -> Result<R, ItemLensError>
where
    B: Serialize + ?Sized + Sync,
    R: DeserializeOwned,
{
    debug!("POST {} ({})", url, service);

    let response = client
        .post(url)
        .header("x-goog-api-key", api_key)
        .json(body)
        .send()
        .await
        .map_err(|e| request_error(service, timeout_secs, e))?;

    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| request_error(service, timeout_secs, e))?;

    if !status.is_success() {
        return Err(ItemLensError::UpstreamStatus {
            service: service.to_string(),
            status: status.as_u16(),
            body: truncate_body(&text),
        });
    }

    serde_json::from_str(&text).map_err(|e| ItemLensError::InvalidResponse {
        service: service.to_string(),
        detail: e.to_string(),
    })
}

fn request_error(service: &str, timeout_secs: u64, e: reqwest::Error) -> ItemLensError {
    if e.is_timeout() {
        ItemLensError::UpstreamTimeout {
            service: service.to_string(),
            secs: timeout_secs,
        }
    } else {
        ItemLensError::UpstreamRequest {
            service: service.to_string(),
            reason: e.to_string(),
        }
    }
}

const MAX_ERROR_BODY: usize = 500;

fn truncate_body(body: &str) -> String {
    let body = body.trim();
    match body.char_indices().nth(MAX_ERROR_BODY) {
        Some((i, _)) => format!("{}…", &body[..i]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_bodies_are_truncated() {
        let long = "x".repeat(2000);
        let t = truncate_body(&long);
        assert_eq!(t.chars().count(), MAX_ERROR_BODY + 1);
        assert!(t.ends_with('…'));
        assert_eq!(truncate_body("  short \n"), "short");
    }
}
