//! The structured result of one analysis.
//!
//! [`ResultRecord`] is the contract between the extractor and whatever
//! renders the answer. It serializes to flat `snake_case` JSON; optional
//! fields that were not found in the model's answer are omitted entirely
//! rather than emitted as `null` or `[]`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Title used when the answer carries no `Name:` section.
pub const DEFAULT_NAME: &str = "Unknown Item";

/// Text used when the answer carries no `Description:` section.
pub const DEFAULT_DESCRIPTION: &str = "No description available";

/// Trust level assigned to every record parsed from a real answer.
pub const DEFAULT_CONFIDENCE: u8 = 95;

/// Structured output of the section extractor.
///
/// Built exactly once per request by [`crate::Extractor`] and never mutated
/// afterwards. Every list field is either `None` or non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub name: String,
    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Text spotted in the image, either from the answer or the OCR pre-pass.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extracted_text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub historical_context: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technical_details: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advantages: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disadvantages: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage_applications: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_information: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maintenance_care: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environmental_impact: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub safety_considerations: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expert_tips: Option<Vec<String>>,

    /// Parsed from the answer, or synthesized search URLs for the name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_links: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similar_items: Option<Vec<SimilarItem>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub educational_resources: Option<Vec<EducationalResource>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_suggestions: Option<Vec<LocationSuggestion>>,

    /// Policy constant in `0..=100`, not derived from the answer.
    pub confidence: u8,
}

impl Default for ResultRecord {
    /// The canonical record for a request whose model call produced no text.
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            description: DEFAULT_DESCRIPTION.to_string(),
            category: None,
            extracted_text: None,
            historical_context: None,
            technical_details: None,
            advantages: None,
            disadvantages: None,
            usage_applications: None,
            market_information: None,
            maintenance_care: None,
            environmental_impact: None,
            safety_considerations: None,
            expert_tips: None,
            product_links: None,
            similar_items: None,
            educational_resources: None,
            location_suggestions: None,
            confidence: 0,
        }
    }
}

impl ResultRecord {
    /// Whether the answer carried a real `Name:` rather than the default.
    pub fn has_name(&self) -> bool {
        self.name != DEFAULT_NAME
    }
}

/// An item the model considers similar to the one in the photo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimilarItem {
    pub name: String,
    /// Percentage in `0..=100`; sampled from `80..=99` when the answer has none.
    pub similarity: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purchase_url: Option<String>,
}

/// A learning resource about the identified item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EducationalResource {
    pub title: String,
    #[serde(rename = "type")]
    pub kind: ResourceKind,
    /// May be the literal placeholder `"N/A"` or empty.
    pub url: String,
    pub description: String,
}

/// Medium of an [`EducationalResource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    #[default]
    Article,
    Book,
    Video,
    Course,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Article => "article",
            ResourceKind::Book => "book",
            ResourceKind::Video => "video",
            ResourceKind::Course => "course",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = String;

    /// Case-insensitive; surrounding whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "article" => Ok(ResourceKind::Article),
            "book" => Ok(ResourceKind::Book),
            "video" => Ok(ResourceKind::Video),
            "course" => Ok(ResourceKind::Course),
            other => Err(format!("unknown resource type '{other}'")),
        }
    }
}

/// A nearby place where the user could see more of the same kind of thing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationSuggestion {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: LocationKind,
    pub distance: String,
    pub description: String,
    pub confidence: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationKind {
    Landmark,
    Plant,
    Animal,
}

/// Everything produced by one call to [`crate::analyze`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisOutput {
    pub record: ResultRecord,
    /// The model's unparsed answer, kept for diagnostics.
    pub raw_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocr_text: Option<String>,
    pub stats: AnalysisStats,
}

/// Timing and token usage of one analysis.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisStats {
    pub model: String,
    pub duration_ms: u64,
    pub retries: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_tokens: Option<u32>,
}
