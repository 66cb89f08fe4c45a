//! Patient-identifier censorship.
//!
//! The rendered document's metadata header is the single source of truth
//! for patient identity. Body text must never repeat or contradict it, so
//! any line that opens with an identifying field label is dropped before
//! section normalization — the model may have hallucinated the value or
//! copied it from the transcript.

use std::sync::LazyLock;

use regex::Regex;

/// Identifying field labels, matched against the start of a line (after
/// optional leading whitespace) and followed by `:` or `=`.
static IDENTIFIER_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?ix)^\s*
          ( patient (\s+ (full \s+)? name)?
          | (full \s+)? name
          | patient \s* (id | identifier | number | no\.?)
          | id
          | mrn
          | medical \s+ record \s+ (number | no\.?)
          | date \s+ of \s+ birth
          | dob
          | age
          | (date \s+ of \s+)? consultation (\s+ date)?
          | date
          | (home \s+)? address
          | phone (\s+ (number | no\.?))?
          | contact (\s+ (number | details | info))?
          )
          \s* [:=]",
    )
    .expect("valid identifier regex")
});

/// True when the line opens with a patient-identifying field label.
pub fn is_identifying_line(line: &str) -> bool {
    IDENTIFIER_LINE_RE.is_match(line)
}

/// Drop identifying lines from body text; other lines pass through
/// right-trimmed. Logs the removed count only — never the content.
pub fn censor_identifiers(text: &str) -> String {
    let mut kept: Vec<&str> = Vec::new();
    let mut removed = 0usize;

    for line in text.lines() {
        if is_identifying_line(line) {
            removed += 1;
        } else {
            kept.push(line.trim_end());
        }
    }

    if removed > 0 {
        tracing::warn!(removed_lines = removed, "Identifying lines censored from report body");
    }

    kept.join("\n")
}
