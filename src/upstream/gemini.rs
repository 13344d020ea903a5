//! Gemini `generateContent` client.
//!
//! The request is a single user turn with up to three parts: the analysis
//! prompt, the OCR context (when there is one) and the inline image. The
//! answer is every text part of the first candidate, concatenated.

use super::{http_client, post_json, VisionAnswer, VisionModel, VisionRequest};
use crate::config::AnalysisConfig;
use crate::error::ItemLensError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

const SERVICE: &str = "gemini";

/// Gemini over the public REST API.
#[derive(Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    url: String,
    api_key: String,
    model: String,
    generation: GenerationConfig,
    timeout_secs: u64,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("url", &self.url)
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl GeminiClient {
    /// Build a client from the configuration. Fails without an API key.
    pub fn new(config: &AnalysisConfig) -> Result<Self, ItemLensError> {
        let api_key = config.require_api_key()?.to_string();
        Ok(Self {
            client: http_client(SERVICE, config.timeout_secs)?,
            url: generate_url(&config.endpoint, &config.model),
            api_key,
            model: config.model.clone(),
            generation: GenerationConfig::from(config),
            timeout_secs: config.timeout_secs,
        })
    }
}

#[async_trait]
impl VisionModel for GeminiClient {
    fn name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: &VisionRequest) -> Result<VisionAnswer, ItemLensError> {
        let body = build_request(request, &self.generation);
        let response: GenerateContentResponse = post_json(
            &self.client,
            SERVICE,
            &self.url,
            &self.api_key,
            &body,
            self.timeout_secs,
        )
        .await?;
        parse_response(response)
    }
}

fn generate_url(endpoint: &str, model: &str) -> String {
    let model = model.strip_prefix("models/").unwrap_or(model);
    format!("{}/models/{}:generateContent", endpoint.trim_end_matches('/'), model)
}

// ── Wire types ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

#[derive(Debug, Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_k: u32,
    top_p: f32,
    max_output_tokens: u32,
}

impl From<&AnalysisConfig> for GenerationConfig {
    fn from(c: &AnalysisConfig) -> Self {
        Self {
            temperature: c.temperature,
            top_k: c.top_k,
            top_p: c.top_p,
            max_output_tokens: c.max_output_tokens,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    prompt_token_count: Option<u32>,
    candidates_token_count: Option<u32>,
}

// ── Pure request/response mapping ────────────────────────────────────────

fn build_request(request: &VisionRequest, generation: &GenerationConfig) -> GenerateContentRequest {
    let mut parts = vec![Part::Text {
        text: request.prompt.clone(),
    }];
    if let Some(context) = request.context.as_deref().filter(|c| !c.trim().is_empty()) {
        parts.push(Part::Text {
            text: context.to_string(),
        });
    }
    parts.push(Part::InlineData {
        inline_data: InlineData {
            mime_type: request.image.mime_type.clone(),
            data: request.image.data.clone(),
        },
    });

    GenerateContentRequest {
        contents: vec![Content { parts }],
        generation_config: *generation,
    }
}

fn parse_response(response: GenerateContentResponse) -> Result<VisionAnswer, ItemLensError> {
    let usage = response.usage_metadata;
    let Some(candidate) = response.candidates.into_iter().next() else {
        return Err(match response.prompt_feedback.and_then(|f| f.block_reason) {
            Some(reason) => ItemLensError::Blocked { reason },
            None => ItemLensError::EmptyResponse,
        });
    };

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(match candidate.finish_reason.as_deref() {
            Some(reason @ ("SAFETY" | "RECITATION" | "BLOCKLIST" | "PROHIBITED_CONTENT")) => {
                ItemLensError::Blocked {
                    reason: reason.to_string(),
                }
            }
            _ => ItemLensError::EmptyResponse,
        });
    }

    debug!(
        "Gemini answer: {} chars, finish reason {:?}",
        text.len(),
        candidate.finish_reason
    );

    Ok(VisionAnswer {
        text,
        prompt_tokens: usage.as_ref().and_then(|u| u.prompt_token_count),
        output_tokens: usage.as_ref().and_then(|u| u.candidates_token_count),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::ImageInput;

    fn request(context: Option<&str>) -> VisionRequest {
        VisionRequest {
            prompt: "Describe".into(),
            context: context.map(str::to_string),
            image: ImageInput {
                mime_type: "image/png".into(),
                data: "iVBORw0KGgo=".into(),
            },
        }
    }

    fn parse(json: &str) -> Result<VisionAnswer, ItemLensError> {
        parse_response(serde_json::from_str(json).unwrap())
    }

    #[test]
    fn request_body_shape() {
        let generation = GenerationConfig::from(&AnalysisConfig::default());
        let body = build_request(&request(Some("OCR: hi")), &generation);
        let json = serde_json::to_value(&body).unwrap();

        let parts = json["contents"][0]["parts"].as_array().unwrap();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0]["text"], "Describe");
        assert_eq!(parts[1]["text"], "OCR: hi");
        assert_eq!(parts[2]["inline_data"]["mime_type"], "image/png");

        let gc = &json["generationConfig"];
        assert_eq!(gc["topK"], 32);
        assert_eq!(gc["maxOutputTokens"], 4096);
    }

    #[test]
    fn no_context_part_without_ocr() {
        let generation = GenerationConfig::from(&AnalysisConfig::default());
        let body = build_request(&request(None), &generation);
        assert_eq!(body.contents[0].parts.len(), 2);
    }

    #[test]
    fn url_from_endpoint_and_model() {
        assert_eq!(
            generate_url("https://example.test/v1beta/", "models/gemini-1.5-flash"),
            "https://example.test/v1beta/models/gemini-1.5-flash:generateContent"
        );
    }

    #[test]
    fn parses_text_and_usage() {
        let answer = parse(
            r#"{
                "candidates": [{
                    "content": { "parts": [{ "text": "Name: " }, { "text": "Kettle" }] },
                    "finishReason": "STOP"
                }],
                "usageMetadata": { "promptTokenCount": 1200, "candidatesTokenCount": 640 }
            }"#,
        )
        .unwrap();
        assert_eq!(answer.text, "Name: Kettle");
        assert_eq!(answer.prompt_tokens, Some(1200));
        assert_eq!(answer.output_tokens, Some(640));
    }

    #[test]
    fn empty_candidates_rejected() {
        assert!(matches!(parse(r#"{"candidates": []}"#), Err(ItemLensError::EmptyResponse)));
        assert!(matches!(parse("{}"), Err(ItemLensError::EmptyResponse)));
    }

    #[test]
    fn blocked_prompt() {
        let err = parse(r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#).unwrap_err();
        assert!(matches!(err, ItemLensError::Blocked { reason } if reason == "SAFETY"));
    }

    #[test]
    fn candidate_without_text() {
        let err = parse(r#"{"candidates": [{"finishReason": "SAFETY"}]}"#).unwrap_err();
        assert!(matches!(err, ItemLensError::Blocked { .. }));
        let err = parse(r#"{"candidates": [{"content": {"parts": []}}]}"#).unwrap_err();
        assert!(matches!(err, ItemLensError::EmptyResponse));
    }
}
