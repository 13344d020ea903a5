//! # itemlens
//!
//! Identify the object in a photo with a vision model, then carve the
//! model's free-form answer into a structured [`ResultRecord`].
//!
//! ## Why this crate?
//!
//! Vision models answer in prose, not JSON, and the shape of that prose
//! drifts: sections go missing, get reordered, pick up markdown bold or
//! change their pluralisation. The extraction layer here is a pure, total
//! function over that text. It never fails a request; a section it cannot
//! read is simply absent from the record while every other section is still
//! extracted.
//!
//! ## Pipeline Overview
//!
//! ```text
//! image
//!  │
//!  ├─ 1. Input    file path or data URL → base64 + sniffed MIME type
//!  ├─ 2. OCR      optional Cloud Vision text detection (failure is a warning)
//!  ├─ 3. Model    Gemini generateContent: prompt + OCR context + image
//!  ├─ 4. Extract  heading table drives one parser per section
//!  └─ 5. Output   ResultRecord + raw answer + timing/token stats
//! ```
//!
//! ## Quick Start
//!
//! Offline, on a saved answer:
//!
//! ```rust
//! use itemlens::{extract, Extractor};
//!
//! let answer = "Name: Vintage Camera\n\nSimilar Items:\n- Widget A | $19.99 | https://example.com/a | 92%\n";
//! let record = Extractor::builder().seed(7).build().extract(Some(answer));
//! assert_eq!(record.name, "Vintage Camera");
//! assert_eq!(record.similar_items.unwrap()[0].similarity, 92);
//!
//! // Absent input is a documented fallback, not an error.
//! assert_eq!(extract(None).confidence, 0);
//! ```
//!
//! Against the live model:
//!
//! ```rust,no_run
//! use itemlens::{analyze, AnalysisConfig, Extractor, ImageInput};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AnalysisConfig::builder()
//!         .api_key(std::env::var("GEMINI_API_KEY")?)
//!         .ocr(true)
//!         .build()?;
//!     let image = ImageInput::from_path("kettle.jpg")?;
//!     let output = analyze(&image, &config, &Extractor::default()).await?;
//!     println!("{}", serde_json::to_string_pretty(&output.record)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `itemlens` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! itemlens = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod analyze;
pub mod config;
pub mod error;
pub mod extract;
pub mod headings;
pub mod image;
pub mod prompts;
pub mod record;
pub mod synthesis;
pub mod upstream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use analyze::{analyze, analyze_sync, analyze_with};
pub use config::{AnalysisConfig, AnalysisConfigBuilder};
pub use error::{ExtractionError, ItemLensError, TableOrigin};
pub use extract::{
    extract, Extractor, ExtractorBuilder, FieldValue, FixedSimilarity, SeededSampler,
    SimilaritySampler, ThreadRngSampler,
};
pub use headings::{Field, FieldKind, HeadingSpec, HeadingTable};
pub use image::ImageInput;
pub use record::{
    AnalysisOutput, AnalysisStats, EducationalResource, LocationKind, LocationSuggestion,
    ResourceKind, ResultRecord, SimilarItem,
};
pub use synthesis::LinkKind;
pub use upstream::{TextDetector, VisionAnswer, VisionModel, VisionRequest};
