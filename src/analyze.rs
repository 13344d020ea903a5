//! Analysis entry points: image → upstream answer → [`ResultRecord`].
//!
//! One call is one request: an optional OCR pre-pass, one model call (with
//! retries only if configured), and exactly one extraction. Upstream
//! failures are fatal and returned as `Err`; an answer in the wrong shape is
//! never an error, it just produces a sparser record.
//!
//! ## Retry Strategy
//!
//! Retries are off by default (`max_retries = 0`). When enabled, only
//! transient failures (timeouts, dropped connections, 429, 5xx) are retried,
//! with exponential backoff `retry_backoff_ms * 2^(attempt - 1)`, capped at 30s.
//!
//! [`ResultRecord`]: crate::ResultRecord

use crate::config::AnalysisConfig;
use crate::error::ItemLensError;
use crate::extract::Extractor;
use crate::image::ImageInput;
use crate::prompts::ocr_context;
use crate::record::{AnalysisOutput, AnalysisStats};
use crate::upstream::{
    CloudVisionClient, GeminiClient, TextDetector, VisionAnswer, VisionModel, VisionRequest,
};
use std::time::Instant;
use tokio::time::{sleep, Duration};
use tracing::{info, warn};

/// Analyse an image with Gemini (and Cloud Vision OCR if `config.ocr`).
///
/// # Errors
/// Fails before any network I/O if no API key is configured. Otherwise
/// returns the upstream error when the model call fails after retries.
/// An OCR failure is logged and does not fail the request.
///
/// # Example
/// ```rust,no_run
/// use itemlens::{analyze, AnalysisConfig, Extractor, ImageInput};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = AnalysisConfig::builder().api_key("…").build()?;
/// let image = ImageInput::from_path("kettle.jpg")?;
/// let output = analyze(&image, &config, &Extractor::default()).await?;
/// println!("{}", output.record.name);
/// # Ok(())
/// # }
/// ```
pub async fn analyze(
    image: &ImageInput,
    config: &AnalysisConfig,
    extractor: &Extractor,
) -> Result<AnalysisOutput, ItemLensError> {
    let model = GeminiClient::new(config)?;
    if config.ocr {
        let detector = CloudVisionClient::new(config)?;
        analyze_with(&model, Some(&detector as &dyn TextDetector), image, config, extractor).await
    } else {
        analyze_with(&model, None, image, config, extractor).await
    }
}

/// Synchronous wrapper around [`analyze`].
///
/// Creates a temporary tokio runtime internally.
pub fn analyze_sync(
    image: &ImageInput,
    config: &AnalysisConfig,
    extractor: &Extractor,
) -> Result<AnalysisOutput, ItemLensError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ItemLensError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(analyze(image, config, extractor))
}

/// Analyse with caller-supplied upstream collaborators.
///
/// `config` still supplies the prompt and retry policy; its endpoint and
/// key are not used.
pub async fn analyze_with(
    model: &dyn VisionModel,
    detector: Option<&dyn TextDetector>,
    image: &ImageInput,
    config: &AnalysisConfig,
    extractor: &Extractor,
) -> Result<AnalysisOutput, ItemLensError> {
    let start = Instant::now();
    info!("Analysing {} image with {}", image.mime_type, model.name());

    let ocr_text = match detector {
        Some(detector) => match detector.detect_text(image).await {
            Ok(text) => text,
            Err(e) => {
                warn!("OCR pre-pass failed, continuing without it: {}", e);
                None
            }
        },
        None => None,
    };

    let request = VisionRequest {
        prompt: config.prompt().to_string(),
        context: ocr_text.as_deref().map(ocr_context),
        image: image.clone(),
    };

    let (answer, retries) = generate_with_retry(model, &request, config).await?;
    let record = extractor.extract_with_ocr(Some(&answer.text), ocr_text.as_deref());

    let duration_ms = start.elapsed().as_millis() as u64;
    info!(
        "Identified '{}' in {}ms ({} retries)",
        record.name, duration_ms, retries
    );

    Ok(AnalysisOutput {
        record,
        raw_text: answer.text,
        ocr_text,
        stats: AnalysisStats {
            model: model.name().to_string(),
            duration_ms,
            retries,
            prompt_tokens: answer.prompt_tokens,
            output_tokens: answer.output_tokens,
        },
    })
}

async fn generate_with_retry(
    model: &dyn VisionModel,
    request: &VisionRequest,
    config: &AnalysisConfig,
) -> Result<(VisionAnswer, u32), ItemLensError> {
    let mut attempt = 0;
    loop {
        match model.generate(request).await {
            Ok(answer) => return Ok((answer, attempt)),
            Err(e) if e.is_transient() && attempt < config.max_retries => {
                attempt += 1;
                let backoff = backoff_ms(config.retry_backoff_ms, attempt);
                warn!(
                    "{}: retry {}/{} after {}ms: {}",
                    model.name(),
                    attempt,
                    config.max_retries,
                    backoff,
                    e
                );
                sleep(Duration::from_millis(backoff)).await;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Longest wait between two attempts.
const MAX_BACKOFF_MS: u64 = 30_000;

/// `base * 2^(attempt - 1)`, saturating and capped at [`MAX_BACKOFF_MS`].
fn backoff_ms(base: u64, attempt: u32) -> u64 {
    base.saturating_mul(2u64.saturating_pow(attempt.saturating_sub(1)))
        .min(MAX_BACKOFF_MS)
}
