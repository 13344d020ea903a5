//! Section extraction: the model's free-form answer → [`ResultRecord`].
//!
//! Extraction is a pure, total function. It never fails the request: every
//! row of the [`HeadingTable`] is parsed on its own into a
//! `Result<FieldValue, ExtractionError>`, and errors are logged and flattened
//! to the field's default when the record is assembled.
//!
//! ## Data Flow
//!
//! ```text
//! text ──▶ normalise ──▶ Document ──▶ per-row parse ──▶ assign ──▶ fallbacks
//!          (CRLF→LF)     (headings)   (scalar/list/…)   (record)   (links, resources)
//! ```
//!
//! 1. [`sections`]: heading detection and section body boundaries
//! 2. `items`: similar-item and educational-resource line shapes
//! 3. [`sampler`]: similarity scores for unscored similar items
//!
//! ## Why one routine per table row
//!
//! The heading vocabulary has changed with every revision of the prompt.
//! Driving extraction from data means a renamed section is a table edit, and
//! every field goes through the same tested code path.

mod items;
pub mod sampler;
pub mod sections;

pub use sampler::{
    FixedSimilarity, SeededSampler, SimilaritySampler, ThreadRngSampler, SIMILARITY_MAX,
    SIMILARITY_MIN,
};

use crate::error::ExtractionError;
use crate::headings::{Field, FieldKind, HeadingSpec, HeadingTable};
use crate::record::{
    EducationalResource, ResultRecord, SimilarItem, DEFAULT_CONFIDENCE, DEFAULT_DESCRIPTION,
    DEFAULT_NAME,
};
use crate::synthesis;
use sections::{bullet_text, normalise_line_endings, Document, HeadingLine};
use std::collections::HashSet;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, warn};

/// Extract a record with the default extractor.
///
/// ```rust
/// let record = itemlens::extract(Some("Name: Vintage Camera\n\nDescription: An old film camera.\n"));
/// assert_eq!(record.name, "Vintage Camera");
/// assert_eq!(record.description, "An old film camera.");
///
/// let empty = itemlens::extract(None);
/// assert_eq!(empty.name, "Unknown Item");
/// assert_eq!(empty.confidence, 0);
/// ```
pub fn extract(text: Option<&str>) -> ResultRecord {
    Extractor::default().extract(text)
}

/// The parsed value of one section, before it is placed in the record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
    Links(Vec<String>),
    SimilarItems(Vec<SimilarItem>),
    Resources(Vec<EducationalResource>),
}

/// Turns model answers into [`ResultRecord`]s.
///
/// Holds no mutable state; one instance can serve every request and be
/// shared across threads.
#[derive(Clone)]
pub struct Extractor {
    headings: Arc<HeadingTable>,
    confidence: u8,
    sampler: Arc<dyn SimilaritySampler>,
    synthesize_links: bool,
    fallback_resources: bool,
    location_suggestions: bool,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl fmt::Debug for Extractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extractor")
            .field("headings_version", &self.headings.version())
            .field("headings", &self.headings.entries().len())
            .field("confidence", &self.confidence)
            .field("sampler", &"<dyn SimilaritySampler>")
            .field("synthesize_links", &self.synthesize_links)
            .field("fallback_resources", &self.fallback_resources)
            .field("location_suggestions", &self.location_suggestions)
            .finish()
    }
}

impl Extractor {
    pub fn builder() -> ExtractorBuilder {
        ExtractorBuilder::default()
    }

    pub fn headings(&self) -> &HeadingTable {
        &self.headings
    }

    pub fn confidence(&self) -> u8 {
        self.confidence
    }

    /// Parse `text` into a record. Absent or blank text yields
    /// [`ResultRecord::default()`].
    pub fn extract(&self, text: Option<&str>) -> ResultRecord {
        self.extract_with_ocr(text, None)
    }

    /// Like [`Extractor::extract`], but fills `extracted_text` from the OCR
    /// pre-pass when the answer has no text section of its own.
    ///
    /// OCR text is ignored when `text` is absent: a failed model call still
    /// produces the canonical default record.
    pub fn extract_with_ocr(&self, text: Option<&str>, ocr_text: Option<&str>) -> ResultRecord {
        let text = match text {
            Some(t) if !t.trim().is_empty() => t,
            _ => {
                debug!("No model text to extract from; returning default record");
                return ResultRecord::default();
            }
        };

        let normalised = normalise_line_endings(text);
        let doc = Document::parse(&normalised);
        debug!(
            "Indexed {} lines with {} heading lines",
            normalised.lines().count(),
            doc.headings().len()
        );

        let mut record = ResultRecord {
            name: DEFAULT_NAME.to_string(),
            description: DEFAULT_DESCRIPTION.to_string(),
            confidence: self.confidence,
            ..ResultRecord::default()
        };

        for spec in self.headings.entries() {
            match self.extract_field(&doc, spec) {
                Ok(value) => assign(&mut record, spec.field, value),
                Err(e) if e.is_not_found() => debug!("{}: {}", spec.field, e),
                Err(e) => warn!("{}: {}", spec.field, e),
            }
        }

        self.apply_fallbacks(&mut record, ocr_text);
        record
    }

    /// Parse one table row, containing any panic to this field.
    fn extract_field(
        &self,
        doc: &Document<'_>,
        spec: &HeadingSpec,
    ) -> Result<FieldValue, ExtractionError> {
        catch_unwind(AssertUnwindSafe(|| self.parse_section(doc, spec))).unwrap_or_else(
            |payload| {
                let detail = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "panic".to_string());
                Err(ExtractionError::Unexpected {
                    heading: spec.primary_label().to_string(),
                    detail,
                })
            },
        )
    }

    fn parse_section(
        &self,
        doc: &Document<'_>,
        spec: &HeadingSpec,
    ) -> Result<FieldValue, ExtractionError> {
        let heading = doc
            .find(&spec.labels)
            .ok_or_else(|| ExtractionError::SectionNotFound {
                heading: spec.primary_label().to_string(),
            })?;

        let value = match spec.kind {
            FieldKind::Scalar => {
                let text = doc.scalar_body(heading);
                (!text.is_empty()).then_some(FieldValue::Text(text))
            }
            FieldKind::List => {
                let items: Vec<String> = self
                    .bullets(doc, heading)
                    .filter(|b| !b.is_empty())
                    .map(str::to_string)
                    .collect();
                (!items.is_empty()).then_some(FieldValue::List(items))
            }
            FieldKind::Links => {
                let mut seen = HashSet::new();
                let links: Vec<String> = doc
                    .list_body(heading, &self.headings)
                    .into_iter()
                    .flat_map(|line| items::find_urls(line))
                    .filter(|url| seen.insert(*url))
                    .map(str::to_string)
                    .collect();
                (!links.is_empty()).then_some(FieldValue::Links(links))
            }
            FieldKind::SimilarItems => {
                let found: Vec<SimilarItem> = self
                    .bullets(doc, heading)
                    .filter_map(|line| {
                        let item = items::parse_similar_item(line, || self.sampler.sample());
                        if item.is_none() {
                            log_malformed(heading, line);
                        }
                        item
                    })
                    .collect();
                (!found.is_empty()).then_some(FieldValue::SimilarItems(found))
            }
            FieldKind::Resources => {
                let found: Vec<EducationalResource> = self
                    .bullets(doc, heading)
                    .filter_map(|line| {
                        let resource = items::parse_resource(line);
                        if resource.is_none() {
                            log_malformed(heading, line);
                        }
                        resource
                    })
                    .collect();
                (!found.is_empty()).then_some(FieldValue::Resources(found))
            }
        };

        value.ok_or_else(|| ExtractionError::EmptySection {
            heading: heading.label.to_string(),
        })
    }

    /// Bullet texts of a list section, markers stripped, in order.
    fn bullets<'d>(
        &self,
        doc: &Document<'d>,
        heading: HeadingLine<'d>,
    ) -> impl Iterator<Item = &'d str> {
        doc.list_body(heading, &self.headings)
            .into_iter()
            .filter_map(bullet_text)
    }

    fn apply_fallbacks(&self, record: &mut ResultRecord, ocr_text: Option<&str>) {
        if record.extracted_text.is_none() {
            if let Some(ocr) = ocr_text.map(str::trim).filter(|t| !t.is_empty()) {
                record.extracted_text = Some(ocr.to_string());
            }
        }

        if self.synthesize_links && record.product_links.is_none() && record.has_name() {
            record.product_links = Some(synthesis::product_links(&record.name));
        }

        if self.fallback_resources && record.educational_resources.is_none() {
            record.educational_resources = Some(synthesis::fallback_resources());
        }

        if self.location_suggestions {
            if let Some(category) = record.category.as_deref() {
                record.location_suggestions = synthesis::location_suggestions(category);
            }
        }
    }
}

fn log_malformed(heading: HeadingLine<'_>, line: &str) {
    let e = ExtractionError::MalformedLine {
        heading: heading.label.to_string(),
        line: line.to_string(),
    };
    warn!("{}; line dropped", e);
}

/// Place a parsed value in its record slot. Kinds are validated by the
/// heading table, so the value always fits the field.
fn assign(record: &mut ResultRecord, field: Field, value: FieldValue) {
    match value {
        FieldValue::Text(text) => match field {
            Field::Name => record.name = text,
            Field::Description => record.description = text,
            Field::Category => record.category = Some(text),
            Field::ExtractedText => record.extracted_text = Some(text),
            other => debug!("{}: text value has no slot", other),
        },
        FieldValue::List(items) => match list_slot(record, field) {
            Some(slot) => *slot = Some(items),
            None => debug!("{}: list value has no slot", field),
        },
        FieldValue::Links(links) => record.product_links = Some(links),
        FieldValue::SimilarItems(items) => record.similar_items = Some(items),
        FieldValue::Resources(resources) => record.educational_resources = Some(resources),
    }
}

fn list_slot(record: &mut ResultRecord, field: Field) -> Option<&mut Option<Vec<String>>> {
    Some(match field {
        Field::HistoricalContext => &mut record.historical_context,
        Field::TechnicalDetails => &mut record.technical_details,
        Field::Advantages => &mut record.advantages,
        Field::Disadvantages => &mut record.disadvantages,
        Field::UsageApplications => &mut record.usage_applications,
        Field::MarketInformation => &mut record.market_information,
        Field::MaintenanceCare => &mut record.maintenance_care,
        Field::EnvironmentalImpact => &mut record.environmental_impact,
        Field::SafetyConsiderations => &mut record.safety_considerations,
        Field::ExpertTips => &mut record.expert_tips,
        _ => return None,
    })
}

/// Builder for [`Extractor`].
pub struct ExtractorBuilder {
    headings: Option<Arc<HeadingTable>>,
    confidence: u8,
    sampler: Option<Arc<dyn SimilaritySampler>>,
    synthesize_links: bool,
    fallback_resources: bool,
    location_suggestions: bool,
}

impl Default for ExtractorBuilder {
    fn default() -> Self {
        Self {
            headings: None,
            confidence: DEFAULT_CONFIDENCE,
            sampler: None,
            synthesize_links: true,
            fallback_resources: true,
            location_suggestions: true,
        }
    }
}

impl fmt::Debug for ExtractorBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractorBuilder")
            .field("headings", &self.headings.as_ref().map(|h| h.version()))
            .field("confidence", &self.confidence)
            .field("sampler", &self.sampler.as_ref().map(|_| "<dyn SimilaritySampler>"))
            .field("synthesize_links", &self.synthesize_links)
            .field("fallback_resources", &self.fallback_resources)
            .field("location_suggestions", &self.location_suggestions)
            .finish()
    }
}

impl ExtractorBuilder {
    pub fn headings(mut self, table: HeadingTable) -> Self {
        self.headings = Some(Arc::new(table));
        self
    }

    pub fn shared_headings(mut self, table: Arc<HeadingTable>) -> Self {
        self.headings = Some(table);
        self
    }

    /// Confidence stamped on every parsed record. Clamped to 0–100.
    pub fn confidence(mut self, confidence: u8) -> Self {
        self.confidence = confidence.min(100);
        self
    }

    pub fn sampler(mut self, sampler: impl SimilaritySampler + 'static) -> Self {
        self.sampler = Some(Arc::new(sampler));
        self
    }

    /// Shorthand for a [`SeededSampler`].
    pub fn seed(self, seed: u64) -> Self {
        self.sampler(SeededSampler::new(seed))
    }

    /// Build search links from the name when the answer has none. Default: on.
    ///
    /// Only a real name triggers this: a record still carrying the
    /// `"Unknown Item"` default gets no synthesized links.
    pub fn synthesize_links(mut self, v: bool) -> Self {
        self.synthesize_links = v;
        self
    }

    /// Use the constant resource list when the answer has none. Default: on.
    pub fn fallback_resources(mut self, v: bool) -> Self {
        self.fallback_resources = v;
        self
    }

    /// Suggest nearby places from the category. Default: on.
    pub fn location_suggestions(mut self, v: bool) -> Self {
        self.location_suggestions = v;
        self
    }

    pub fn build(self) -> Extractor {
        Extractor {
            headings: self
                .headings
                .unwrap_or_else(|| Arc::new(HeadingTable::default())),
            confidence: self.confidence,
            sampler: self.sampler.unwrap_or_else(|| Arc::new(ThreadRngSampler)),
            synthesize_links: self.synthesize_links,
            fallback_resources: self.fallback_resources,
            location_suggestions: self.location_suggestions,
        }
    }
}
