//! Section boundaries: find heading lines and cut the body that follows.
//!
//! A heading line is a short run of words anchored at line start and closed
//! by a colon (`Technical Details:`). Bullets never qualify because they
//! start with a marker, so `- See Details: http://x` stays inside its list.
//! A bare URL at line start (`https://…`) is not a heading either.
//!
//! Scalar bodies end at the first blank line or heading line. List bodies
//! tolerate blank lines and stray prose; they end at a heading line that
//! follows a blank line, or at any heading label the table knows.

use crate::headings::HeadingTable;
use once_cell::sync::Lazy;
use regex::Regex;

/// One to six words, the first starting with a letter; `&` may stand alone.
const LABEL: &str = r"[A-Za-z][A-Za-z0-9'/\-]*(?: (?:&|[A-Za-z0-9][A-Za-z0-9'/\-]*)){0,5}";

static RE_HEADING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"^[ \t]*(?:#{{1,6}}[ \t]*)?(?:\*\*)?(?P<label>{LABEL})(?:\*\*)?[ \t]*:(?:\*\*)?(?P<rest>.*)$"
    ))
    .unwrap()
});

static RE_LABEL: Lazy<Regex> = Lazy::new(|| Regex::new(&format!(r"^{LABEL}$")).unwrap());

/// Whether `label` could open a section, i.e. `"{label}:"` is a heading line.
pub fn is_heading_label(label: &str) -> bool {
    RE_LABEL.is_match(label)
}

/// A line recognised as a section heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct HeadingLine<'a> {
    /// 0-based line number.
    pub index: usize,
    pub label: &'a str,
    /// Text after the colon, trimmed.
    pub rest: &'a str,
}

/// Parse a single line as a heading, if it is one.
pub(crate) fn parse_heading(index: usize, line: &str) -> Option<HeadingLine<'_>> {
    let caps = RE_HEADING.captures(line)?;
    let label = caps.name("label")?.as_str();
    let rest = caps.name("rest").map(|m| m.as_str()).unwrap_or("");
    if rest.starts_with("//") {
        return None;
    }
    Some(HeadingLine {
        index,
        label,
        rest: rest.trim(),
    })
}

/// The model's answer split into lines, with heading lines indexed.
#[derive(Debug)]
pub(crate) struct Document<'a> {
    lines: Vec<&'a str>,
    headings: Vec<HeadingLine<'a>>,
    /// `heading_at[i]` is the position in `headings` of line `i`, if any.
    heading_at: Vec<Option<usize>>,
}

impl<'a> Document<'a> {
    /// Index `text`, which must already use `\n` line endings.
    pub fn parse(text: &'a str) -> Self {
        let lines: Vec<&str> = text.split('\n').collect();
        let mut headings = Vec::new();
        let mut heading_at = vec![None; lines.len()];

        for (i, line) in lines.iter().enumerate() {
            if let Some(h) = parse_heading(i, line) {
                heading_at[i] = Some(headings.len());
                headings.push(h);
            }
        }

        Self {
            lines,
            headings,
            heading_at,
        }
    }

    pub fn headings(&self) -> &[HeadingLine<'a>] {
        &self.headings
    }

    /// The first heading line, in text order, whose label is one of `labels`.
    pub fn find(&self, labels: &[String]) -> Option<HeadingLine<'a>> {
        self.headings
            .iter()
            .find(|h| labels.iter().any(|l| l == h.label))
            .copied()
    }

    fn is_heading(&self, index: usize) -> bool {
        self.heading_at.get(index).copied().flatten().is_some()
    }

    fn is_blank(&self, index: usize) -> bool {
        self.lines
            .get(index)
            .map(|l| l.trim().is_empty())
            .unwrap_or(true)
    }

    /// Value of a scalar section: the text after the colon plus following
    /// lines, up to a blank line or the next heading line.
    ///
    /// Blank lines directly after an empty heading (`Extracted Text:\n\n…`)
    /// are skipped before collection starts.
    pub fn scalar_body(&self, heading: HeadingLine<'a>) -> String {
        let mut parts: Vec<&str> = Vec::new();
        if !heading.rest.is_empty() {
            parts.push(heading.rest);
        }

        for i in heading.index + 1..self.lines.len() {
            if self.is_heading(i) {
                break;
            }
            if self.is_blank(i) {
                if parts.is_empty() {
                    continue;
                }
                break;
            }
            parts.push(self.lines[i].trim());
        }

        parts.join("\n").trim().to_string()
    }

    /// Raw lines of a list section, excluding the heading line itself but
    /// including any text that followed its colon.
    pub fn list_body(&self, heading: HeadingLine<'a>, table: &HeadingTable) -> Vec<&'a str> {
        let mut body = Vec::new();
        if !heading.rest.is_empty() {
            body.push(heading.rest);
        }

        for i in heading.index + 1..self.lines.len() {
            if let Some(pos) = self.heading_at[i] {
                let next = self.headings[pos];
                if self.is_blank(i - 1) || table.is_known_label(next.label) {
                    break;
                }
            }
            body.push(self.lines[i]);
        }

        body
    }
}

/// Text of a bullet line with its marker stripped, or `None` for any other
/// line. `-`, `•` and `* ` are accepted; a horizontal rule is not a bullet.
pub(crate) fn bullet_text(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    if trimmed.chars().all(|c| c == '-' || c.is_whitespace()) && trimmed.len() > 1 {
        return None;
    }
    let rest = trimmed
        .strip_prefix('-')
        .or_else(|| trimmed.strip_prefix('•'))
        .or_else(|| trimmed.strip_prefix("* "))?;
    Some(rest.trim())
}

/// Normalise CRLF and lone CR line endings to LF.
pub(crate) fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}
