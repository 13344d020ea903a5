//! Sub-record parsing for pipe-delimited bullets.
//!
//! Models are asked for `name | price | url | NN%` and
//! `title | Type: kind | URL: url | description`, and mostly comply. When a
//! line comes back short, the parts that are present are kept and the rest
//! stay absent or empty; a line is only dropped when its first slot is empty.

use crate::record::{EducationalResource, ResourceKind, SimilarItem};
use once_cell::sync::Lazy;
use regex::Regex;

static RE_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"https?://[^\s|<>"'()\[\]]+"#).unwrap());

static RE_PRICE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[$€£¥]\s?\d[\d,]*(?:\.\d+)?|\b\d[\d,]*(?:\.\d+)?\s?(?:USD|EUR|GBP)\b").unwrap()
});

/// Integer part captured; a fraction (`92.5%`) is truncated.
static RE_PERCENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)(?:\.\d+)?\s?%").unwrap());

/// Every URL in `text`, in order, with trailing sentence punctuation removed.
pub(crate) fn find_urls(text: &str) -> impl Iterator<Item = &str> {
    RE_URL
        .find_iter(text)
        .map(|m| m.as_str().trim_end_matches(['.', ',', ';', ':', '!', '?']))
}

/// Parse the text of a similar-item bullet (marker already stripped).
///
/// `sample` supplies the similarity when the line has no percentage.
/// Returns `None` when the name slot is empty.
pub(crate) fn parse_similar_item(line: &str, sample: impl FnOnce() -> u8) -> Option<SimilarItem> {
    let mut parts = line.split('|').map(str::trim);
    let name = parts.next().unwrap_or("");
    if name.is_empty() {
        return None;
    }

    let mut price = None;
    let mut purchase_url = None;
    let mut similarity = None;

    for part in parts {
        let mut remainder = part.to_string();

        if purchase_url.is_none() {
            if let Some(url) = find_urls(part).next() {
                purchase_url = Some(url.to_string());
            }
        }
        // URL paths can carry `%20` or `$` that would confuse the other scans.
        if RE_URL.is_match(part) {
            remainder = RE_URL.replace_all(part, " ").into_owned();
        }

        if price.is_none() {
            if let Some(m) = RE_PRICE.find(&remainder) {
                price = Some(m.as_str().trim().to_string());
            }
        }
        if similarity.is_none() {
            similarity = RE_PERCENT
                .captures(&remainder)
                // All digits, so a parse failure can only be overflow.
                .map(|c| c[1].parse::<u32>().map_or(100, |p| p.min(100)) as u8);
        }
    }

    Some(SimilarItem {
        name: name.to_string(),
        similarity: similarity.unwrap_or_else(sample),
        price,
        purchase_url,
    })
}

/// Parse the text of an educational-resource bullet (marker already stripped).
///
/// Returns `None` when the title slot is empty. Parts beyond the fourth are
/// folded back into the description so no text is lost.
pub(crate) fn parse_resource(line: &str) -> Option<EducationalResource> {
    let parts: Vec<&str> = line.split('|').map(str::trim).collect();
    let title = parts.first().copied().unwrap_or("");
    if title.is_empty() {
        return None;
    }

    let kind = parts
        .get(1)
        .map(|p| strip_label(p, "Type:"))
        .and_then(|p| p.parse::<ResourceKind>().ok())
        .unwrap_or_default();
    let url = parts
        .get(2)
        .map(|p| strip_label(p, "URL:"))
        .unwrap_or("")
        .to_string();
    let description = if parts.len() > 3 {
        parts[3..].join(" | ")
    } else {
        String::new()
    };

    Some(EducationalResource {
        title: title.to_string(),
        kind,
        url,
        description,
    })
}

/// Strip a leading `Label:` (ASCII case-insensitive) and surrounding spaces.
fn strip_label<'a>(part: &'a str, label: &str) -> &'a str {
    match part.get(..label.len()) {
        Some(head) if head.eq_ignore_ascii_case(label) => part[label.len()..].trim(),
        _ => part.trim(),
    }
}
