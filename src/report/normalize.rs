//! Section normalization — buckets cleaned report text under the fixed
//! section schema and re-serializes it into canonical flattened form.

use super::sanitize::strip_special_tokens;
use super::schema::{canonicalize_header, Section};

/// Placeholder emitted for a section with no collected content. Applied at
/// flatten/render time only; the bucket itself stays empty so "empty means
/// no content" holds for inspection and tests.
pub const PLACEHOLDER_LINE: &str = "- None reported.";

/// Ordered mapping from each canonical section to its content lines.
///
/// Invariant: every canonical section is always present, even when its
/// line list is empty. Created fresh per report, populated once by
/// [`bucket_sections`], consumed once by the renderer.
#[derive(Debug, Clone, Default)]
pub struct ReportBuckets {
    lines: [Vec<String>; Section::COUNT],
}

impl ReportBuckets {
    /// Empty buckets — all eight sections present, no content.
    pub fn new() -> Self {
        Self::default()
    }

    /// Content lines collected for a section.
    pub fn lines(&self, section: Section) -> &[String] {
        &self.lines[section.index()]
    }

    /// Append a content line to a section's bucket.
    pub fn push(&mut self, section: Section, line: String) {
        self.lines[section.index()].push(line);
    }

    /// True when the section collected no content.
    pub fn is_empty_section(&self, section: Section) -> bool {
        self.lines[section.index()].is_empty()
    }

    /// Sections with their lines, in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (Section, &[String])> {
        Section::ALL
            .iter()
            .map(move |&s| (s, self.lines(s)))
    }

    /// Canonical flattened text: exactly the eight canonical headers in
    /// schema order, each followed by its lines or a single placeholder,
    /// sections separated by a blank line.
    pub fn flatten(&self) -> String {
        let mut out = String::new();
        for (section, lines) in self.iter() {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(section.display_name());
            out.push('\n');
            if lines.is_empty() {
                out.push_str(PLACEHOLDER_LINE);
                out.push('\n');
            } else {
                for line in lines {
                    out.push_str(line);
                    out.push('\n');
                }
            }
        }
        out
    }
}

/// Normalize a leading bullet marker to the canonical `- ` prefix. Lines
/// without a marker are passed through trimmed.
fn normalize_bullet(line: &str) -> String {
    let trimmed = line.trim();
    match trimmed.strip_prefix(['-', '*', '•', '·', '–', '—']) {
        Some(rest) => format!("- {}", rest.trim_start()),
        None => trimmed.to_string(),
    }
}

/// Bucket cleaned, censored text under the canonical sections.
///
/// Header lines switch the current-section cursor and are not emitted as
/// content. Content seen before any header defaults to Doctor's Notes —
/// unclassified leading text is attributed, not discarded. Special tokens
/// are re-stripped per line in case any survived the coarse pass.
pub fn bucket_sections(text: &str) -> ReportBuckets {
    let mut buckets = ReportBuckets::new();
    let mut current: Option<Section> = None;

    for raw_line in text.lines() {
        let line = strip_special_tokens(raw_line);
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(section) = canonicalize_header(line) {
            current = Some(section);
            continue;
        }

        let section = *current.get_or_insert(Section::DoctorsNotes);
        buckets.push(section, normalize_bullet(line));
    }

    buckets
}
