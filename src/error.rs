//! Error types for the itemlens library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ItemLensError`] is **fatal**: the request cannot produce an answer at
//!   all (no API key, unreadable image, upstream model failed or returned no
//!   candidates, invalid heading table). Returned as `Err(ItemLensError)`
//!   from [`crate::analyze`] and the configuration builders.
//!
//! * [`ExtractionError`] is **non-fatal**: one section of the model's answer
//!   was missing or malformed. It never leaves the extractor; the affected
//!   field falls back to its documented default and every other field is
//!   still extracted.
//!
//! "The model answered, but not in the expected shape" is always an
//! `ExtractionError`. "The model did not answer" is always an
//! `ItemLensError`.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the itemlens library.
#[derive(Debug, Error)]
pub enum ItemLensError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Image file was not found at the given path.
    #[error("Image file not found: '{path}'\nCheck the path exists and is readable.")]
    ImageNotFound { path: PathBuf },

    /// Image file exists but could not be read.
    #[error("Failed to read image '{path}': {source}")]
    ImageRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The input is neither a known image type nor a `data:image/...` URL.
    #[error("Unsupported image input '{input}': expected jpeg, png, webp, gif or a data URL")]
    UnsupportedImage { input: String },

    // ── Upstream errors ───────────────────────────────────────────────────
    /// No API key was supplied in the configuration.
    #[error("No API key configured for the vision model.\nPass --api-key or set GEMINI_API_KEY.")]
    MissingApiKey,

    /// The HTTP request could not be sent or the body could not be read.
    #[error("Request to {service} failed: {reason}")]
    UpstreamRequest { service: String, reason: String },

    /// The upstream call exceeded the configured timeout.
    #[error("Request to {service} timed out after {secs}s")]
    UpstreamTimeout { service: String, secs: u64 },

    /// The upstream service answered with a non-2xx status.
    #[error("{service} returned HTTP {status}: {body}")]
    UpstreamStatus {
        service: String,
        status: u16,
        body: String,
    },

    /// The model produced no candidate text.
    #[error("The vision model returned no candidates")]
    EmptyResponse,

    /// The model refused to answer.
    #[error("The vision model blocked the request: {reason}")]
    Blocked { reason: String },

    /// The response body was not the JSON shape we expect.
    #[error("Invalid response from {service}: {detail}")]
    InvalidResponse { service: String, detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A heading table failed to load or validate.
    #[error("Invalid heading table ({origin}): {detail}")]
    InvalidHeadingTable { origin: TableOrigin, detail: String },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ItemLensError {
    /// Whether retrying the same request could succeed.
    ///
    /// Timeouts, dropped connections, 429 and 5xx are transient. A bad key,
    /// a blocked prompt or a malformed body will fail the same way again.
    pub fn is_transient(&self) -> bool {
        match self {
            ItemLensError::UpstreamTimeout { .. } | ItemLensError::UpstreamRequest { .. } => true,
            ItemLensError::UpstreamStatus { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// Where a heading table came from, for error messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableOrigin {
    Inline,
    File(PathBuf),
}

impl std::fmt::Display for TableOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableOrigin::Inline => f.write_str("inline"),
            TableOrigin::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// A non-fatal problem with a single section of the model's answer.
///
/// Produced per heading-table row and flattened to the field's default
/// when the [`crate::ResultRecord`] is assembled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    /// None of the section's labels occur as a heading line.
    #[error("section '{heading}' not found")]
    SectionNotFound { heading: String },

    /// The heading exists but nothing worth keeping follows it.
    #[error("section '{heading}' is empty")]
    EmptySection { heading: String },

    /// A bullet or sub-item line did not have the expected shape.
    #[error("section '{heading}': malformed line {line:?}")]
    MalformedLine { heading: String, line: String },

    /// Extracting this section panicked; the panic was contained.
    #[error("section '{heading}': unexpected failure: {detail}")]
    Unexpected { heading: String, detail: String },
}

impl ExtractionError {
    /// Missing sections are expected and only worth a debug line.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ExtractionError::SectionNotFound { .. })
    }
}
