//! Cloud Vision `images:annotate` text detection.
//!
//! Used as an OCR pre-pass: the detected text is handed to the vision model
//! as extra context, which noticeably improves its reading of labels and
//! serial plates.

use super::{http_client, post_json, TextDetector};
use crate::config::AnalysisConfig;
use crate::error::ItemLensError;
use crate::image::ImageInput;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

const SERVICE: &str = "cloud-vision";

/// Annotation results requested per image.
const MAX_RESULTS: u32 = 50;

#[derive(Clone)]
pub struct CloudVisionClient {
    client: reqwest::Client,
    url: String,
    api_key: String,
    timeout_secs: u64,
}

impl std::fmt::Debug for CloudVisionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudVisionClient")
            .field("url", &self.url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl CloudVisionClient {
    pub fn new(config: &AnalysisConfig) -> Result<Self, ItemLensError> {
        Ok(Self {
            client: http_client(SERVICE, config.timeout_secs)?,
            url: config.ocr_endpoint.clone(),
            api_key: config.require_api_key()?.to_string(),
            timeout_secs: config.timeout_secs,
        })
    }
}

#[async_trait]
impl TextDetector for CloudVisionClient {
    async fn detect_text(&self, image: &ImageInput) -> Result<Option<String>, ItemLensError> {
        let body = build_request(image);
        let response: AnnotateResponse = post_json(
            &self.client,
            SERVICE,
            &self.url,
            &self.api_key,
            &body,
            self.timeout_secs,
        )
        .await?;
        let text = parse_response(response)?;
        debug!(
            "OCR pre-pass found {} chars",
            text.as_ref().map(|t| t.len()).unwrap_or(0)
        );
        Ok(text)
    }
}

// ── Wire types ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct AnnotateRequest {
    requests: Vec<ImageRequest>,
}

#[derive(Debug, Serialize)]
struct ImageRequest {
    image: ImageContent,
    features: Vec<Feature>,
}

#[derive(Debug, Serialize)]
struct ImageContent {
    content: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Feature {
    #[serde(rename = "type")]
    kind: &'static str,
    max_results: u32,
}

#[derive(Debug, Deserialize)]
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<ImageResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageResponse {
    #[serde(default)]
    text_annotations: Vec<TextAnnotation>,
    error: Option<Status>,
}

#[derive(Debug, Deserialize)]
struct TextAnnotation {
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct Status {
    #[serde(default)]
    message: String,
}

fn build_request(image: &ImageInput) -> AnnotateRequest {
    AnnotateRequest {
        requests: vec![ImageRequest {
            image: ImageContent {
                content: image.data.clone(),
            },
            features: vec![Feature {
                kind: "TEXT_DETECTION",
                max_results: MAX_RESULTS,
            }],
        }],
    }
}

/// The first annotation is the full detected text; the rest are single words.
fn parse_response(response: AnnotateResponse) -> Result<Option<String>, ItemLensError> {
    let Some(first) = response.responses.into_iter().next() else {
        return Ok(None);
    };
    if let Some(status) = first.error {
        return Err(ItemLensError::InvalidResponse {
            service: SERVICE.to_string(),
            detail: status.message,
        });
    }
    Ok(first
        .text_annotations
        .into_iter()
        .next()
        .map(|a| a.description.trim().to_string())
        .filter(|t| !t.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<Option<String>, ItemLensError> {
        parse_response(serde_json::from_str(json).unwrap())
    }

    #[test]
    fn request_shape() {
        let image = ImageInput {
            mime_type: "image/jpeg".into(),
            data: "abc".into(),
        };
        let json = serde_json::to_value(build_request(&image)).unwrap();
        let req = &json["requests"][0];
        assert_eq!(req["image"]["content"], "abc");
        assert_eq!(req["features"][0]["type"], "TEXT_DETECTION");
        assert_eq!(req["features"][0]["maxResults"], 50);
    }

    #[test]
    fn first_annotation_is_full_text() {
        let text = parse(
            r#"{"responses": [{"textAnnotations": [
                {"description": "MADE IN\nJAPAN\n"},
                {"description": "MADE"}
            ]}]}"#,
        )
        .unwrap();
        assert_eq!(text.as_deref(), Some("MADE IN\nJAPAN"));
    }

    #[test]
    fn no_text_is_none() {
        assert_eq!(parse(r#"{"responses": [{}]}"#).unwrap(), None);
        assert_eq!(parse("{}").unwrap(), None);
    }

    #[test]
    fn per_image_error_surfaces() {
        let err = parse(r#"{"responses": [{"error": {"code": 3, "message": "Bad image data."}}]}"#)
            .unwrap_err();
        assert!(err.to_string().contains("Bad image data."));
    }
}
