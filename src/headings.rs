//! The heading vocabulary: which labels map to which record field.
//!
//! The model's output template has drifted repeatedly (sections added,
//! renamed, pluralised). Keeping the vocabulary as data means a new label
//! is a one-line table change, or a JSON file passed at runtime, and the
//! extraction engine in [`crate::extract`] never changes.
//!
//! # Example
//! ```rust
//! use itemlens::{Field, HeadingTable};
//!
//! let table = HeadingTable::from_json_str(r#"{
//!     "version": 2,
//!     "entries": [
//!         { "field": "name", "kind": "scalar", "labels": ["Name", "Item"] },
//!         { "field": "expert_tips", "kind": "list", "labels": ["Usage Tips"] }
//!     ]
//! }"#).unwrap();
//!
//! assert_eq!(table.version(), 2);
//! assert!(table.is_known_label("Item"));
//! assert!(table.entry(Field::Description).is_none());
//! ```

use crate::error::{ItemLensError, TableOrigin};
use crate::extract::sections::is_heading_label;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

/// Shape of a section body, which decides how it is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Free text after the colon, up to a blank line or the next heading.
    Scalar,
    /// `-` bullet lines, one string each.
    List,
    /// `name | price | url | NN%` bullets.
    SimilarItems,
    /// `title | type | url | description` bullets.
    Resources,
    /// Every URL token in the body.
    Links,
}

/// A slot of [`crate::ResultRecord`] that a section can fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Name,
    Description,
    Category,
    ExtractedText,
    HistoricalContext,
    TechnicalDetails,
    Advantages,
    Disadvantages,
    UsageApplications,
    MarketInformation,
    ProductLinks,
    MaintenanceCare,
    EnvironmentalImpact,
    SafetyConsiderations,
    ExpertTips,
    SimilarItems,
    EducationalResources,
}

impl Field {
    /// The body kind the record slot can hold.
    pub fn kind(&self) -> FieldKind {
        match self {
            Field::Name | Field::Description | Field::Category | Field::ExtractedText => {
                FieldKind::Scalar
            }
            Field::ProductLinks => FieldKind::Links,
            Field::SimilarItems => FieldKind::SimilarItems,
            Field::EducationalResources => FieldKind::Resources,
            Field::HistoricalContext
            | Field::TechnicalDetails
            | Field::Advantages
            | Field::Disadvantages
            | Field::UsageApplications
            | Field::MarketInformation
            | Field::MaintenanceCare
            | Field::EnvironmentalImpact
            | Field::SafetyConsiderations
            | Field::ExpertTips => FieldKind::List,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Description => "description",
            Field::Category => "category",
            Field::ExtractedText => "extracted_text",
            Field::HistoricalContext => "historical_context",
            Field::TechnicalDetails => "technical_details",
            Field::Advantages => "advantages",
            Field::Disadvantages => "disadvantages",
            Field::UsageApplications => "usage_applications",
            Field::MarketInformation => "market_information",
            Field::ProductLinks => "product_links",
            Field::MaintenanceCare => "maintenance_care",
            Field::EnvironmentalImpact => "environmental_impact",
            Field::SafetyConsiderations => "safety_considerations",
            Field::ExpertTips => "expert_tips",
            Field::SimilarItems => "similar_items",
            Field::EducationalResources => "educational_resources",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the table: a field, its body kind and the labels that open it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadingSpec {
    pub field: Field,
    pub kind: FieldKind,
    /// Case-sensitive labels, without the trailing colon. First match wins.
    pub labels: Vec<String>,
}

impl HeadingSpec {
    pub fn new(field: Field, labels: &[&str]) -> Self {
        Self {
            field,
            kind: field.kind(),
            labels: labels.iter().map(|l| l.to_string()).collect(),
        }
    }

    /// The label used in log lines and error messages.
    pub fn primary_label(&self) -> &str {
        self.labels.first().map(String::as_str).unwrap_or("")
    }
}

/// A validated heading vocabulary.
///
/// Construct with [`HeadingTable::default()`] (the current template),
/// [`HeadingTable::new`], or load from JSON. All constructors validate, so a
/// `HeadingTable` in hand is always usable by the extractor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadingTable {
    version: u32,
    entries: Vec<HeadingSpec>,
}

impl Default for HeadingTable {
    fn default() -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            entries: vec![
                HeadingSpec::new(Field::Name, &["Name"]),
                HeadingSpec::new(Field::Description, &["Description"]),
                HeadingSpec::new(Field::Category, &["Category"]),
                HeadingSpec::new(Field::ExtractedText, &["Extracted Text"]),
                HeadingSpec::new(Field::HistoricalContext, &["Historical Context"]),
                HeadingSpec::new(Field::TechnicalDetails, &["Technical Details"]),
                HeadingSpec::new(Field::Advantages, &["Advantages"]),
                HeadingSpec::new(Field::Disadvantages, &["Disadvantages"]),
                HeadingSpec::new(Field::UsageApplications, &["Usage & Applications"]),
                HeadingSpec::new(Field::MarketInformation, &["Market Information"]),
                HeadingSpec::new(Field::ProductLinks, &["Product Links", "Product links"]),
                HeadingSpec::new(Field::MaintenanceCare, &["Maintenance & Care"]),
                HeadingSpec::new(Field::EnvironmentalImpact, &["Environmental Impact"]),
                HeadingSpec::new(Field::SafetyConsiderations, &["Safety Considerations"]),
                HeadingSpec::new(Field::ExpertTips, &["Expert Tips"]),
                HeadingSpec::new(Field::SimilarItems, &["Similar Items", "Similar Products"]),
                HeadingSpec::new(Field::EducationalResources, &["Educational Resources"]),
            ],
        }
    }
}

impl HeadingTable {
    /// Version of the built-in vocabulary.
    pub const CURRENT_VERSION: u32 = 1;

    /// Build and validate a table.
    pub fn new(version: u32, entries: Vec<HeadingSpec>) -> Result<Self, ItemLensError> {
        let table = Self { version, entries };
        table
            .validate()
            .map_err(|detail| ItemLensError::InvalidHeadingTable {
                origin: TableOrigin::Inline,
                detail,
            })?;
        Ok(table)
    }

    /// Parse and validate a table from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self, ItemLensError> {
        let table: HeadingTable =
            serde_json::from_str(json).map_err(|e| ItemLensError::InvalidHeadingTable {
                origin: TableOrigin::Inline,
                detail: e.to_string(),
            })?;
        Self::new(table.version, table.entries)
    }

    /// Read, parse and validate a table from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ItemLensError> {
        let path = path.as_ref();
        let origin = TableOrigin::File(path.to_path_buf());
        let text = std::fs::read_to_string(path).map_err(|e| ItemLensError::InvalidHeadingTable {
            origin: origin.clone(),
            detail: e.to_string(),
        })?;
        Self::from_json_str(&text).map_err(|e| match e {
            ItemLensError::InvalidHeadingTable { detail, .. } => {
                ItemLensError::InvalidHeadingTable { origin, detail }
            }
            other => other,
        })
    }

    /// Pretty JSON, suitable for `from_json_str`.
    pub fn to_json(&self) -> Result<String, ItemLensError> {
        serde_json::to_string_pretty(self).map_err(|e| ItemLensError::Internal(e.to_string()))
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn entries(&self) -> &[HeadingSpec] {
        &self.entries
    }

    pub fn entry(&self, field: Field) -> Option<&HeadingSpec> {
        self.entries.iter().find(|e| e.field == field)
    }

    /// Whether `label` opens any section in this table.
    pub fn is_known_label(&self, label: &str) -> bool {
        self.entries
            .iter()
            .any(|e| e.labels.iter().any(|l| l == label))
    }

    /// Return a copy with `spec` added, replacing any row for the same field.
    pub fn with_entry(&self, spec: HeadingSpec) -> Result<Self, ItemLensError> {
        let mut entries: Vec<HeadingSpec> = self
            .entries
            .iter()
            .filter(|e| e.field != spec.field)
            .cloned()
            .collect();
        entries.push(spec);
        Self::new(self.version, entries)
    }

    fn validate(&self) -> Result<(), String> {
        if self.entries.is_empty() {
            return Err("table has no entries".into());
        }

        let mut fields = HashSet::new();
        let mut labels = HashSet::new();

        for entry in &self.entries {
            if !fields.insert(entry.field) {
                return Err(format!("field '{}' is listed twice", entry.field));
            }
            if entry.kind != entry.field.kind() {
                return Err(format!(
                    "field '{}' holds {:?} sections, not {:?}",
                    entry.field,
                    entry.field.kind(),
                    entry.kind
                ));
            }
            if entry.labels.is_empty() {
                return Err(format!("field '{}' has no labels", entry.field));
            }
            for label in &entry.labels {
                if !is_heading_label(label) {
                    return Err(format!(
                        "label '{label}' for field '{}' is not a valid heading",
                        entry.field
                    ));
                }
                if !labels.insert(label.as_str()) {
                    return Err(format!("label '{label}' is used more than once"));
                }
            }
        }

        Ok(())
    }
}
