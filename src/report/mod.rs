//! Report normalization and rendering pipeline.
//!
//! The pipeline is single-threaded, synchronous, and pure: raw model text
//! goes through the sanitizer, the identifier censor, and the section
//! normalizer, and the resulting buckets feed the document renderer. Every
//! stage is robust against ugly model output — malformed input degrades,
//! it never errors.

pub mod censor;
pub mod normalize;
pub mod render;
pub mod sanitize;
pub mod schema;

pub use censor::censor_identifiers;
pub use normalize::{bucket_sections, ReportBuckets, PLACEHOLDER_LINE};
pub use render::{
    consultation_date, export_report_to_file, render_report, render_report_text, RenderError,
    ReportMetadata, DATE_UNAVAILABLE,
};
pub use sanitize::sanitize_model_output;
pub use schema::{canonicalize_header, Section};

/// Sanitize, censor, and bucket raw model output in one pass.
pub fn bucket_report(raw: &str) -> ReportBuckets {
    let sanitized = sanitize_model_output(raw);
    let censored = censor_identifiers(&sanitized);
    bucket_sections(&censored)
}

/// Canonical flattened text form of a raw model report: exactly the eight
/// canonical headers in schema order, placeholder lines for empty
/// sections. Suitable for persistence or inspection.
pub fn canonical_report_text(raw: &str) -> String {
    bucket_report(raw).flatten()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn end_to_end_schema_order_not_input_order() {
        let raw = "Assessment\n- Mild\nSymptoms\n- Fever";
        let buckets = bucket_report(raw);
        assert_eq!(buckets.lines(Section::Symptoms), ["- Fever"]);
        assert_eq!(buckets.lines(Section::Assessment), ["- Mild"]);
        for (section, lines) in buckets.iter() {
            if !matches!(section, Section::Symptoms | Section::Assessment) {
                assert!(lines.is_empty(), "{section} should be empty");
            }
        }

        let flat = canonical_report_text(raw);
        assert!(flat.find("Symptoms").unwrap() < flat.find("Assessment").unwrap());
    }

    #[test]
    fn end_to_end_identifier_never_appears() {
        let raw = "Symptoms\n- Cough\npatient name: SHOULD NOT APPEAR\n- Fever";
        let buckets = bucket_report(raw);
        for (_, lines) in buckets.iter() {
            assert!(!lines.iter().any(|l| l.contains("SHOULD NOT APPEAR")));
        }
        assert_eq!(buckets.lines(Section::Symptoms), ["- Cough", "- Fever"]);
        assert!(!canonical_report_text(raw).contains("SHOULD NOT APPEAR"));
    }

    #[test]
    fn end_to_end_markdown_report() {
        let raw = "## **Symptoms**\n- *Fever* for two days\n\n### Diagnosis:\n- Viral infection\n<|end_of_text|>";
        let buckets = bucket_report(raw);
        assert_eq!(buckets.lines(Section::Symptoms), ["- Fever for two days"]);
        assert_eq!(buckets.lines(Section::Diagnosis), ["- Viral infection"]);
    }

    #[test]
    fn unparseable_input_yields_placeholder_only_report() {
        let flat = canonical_report_text("<|begin_of_sentence|><think></think>");
        assert_eq!(flat.matches(PLACEHOLDER_LINE).count(), 8);
        for section in Section::ALL {
            assert!(flat.contains(section.display_name()));
        }
    }

    #[test]
    fn think_wrapper_content_attributed_to_doctors_notes() {
        let raw = "<think>model deliberation</think>Follow up in one week.";
        let buckets = bucket_report(raw);
        assert!(buckets
            .lines(Section::DoctorsNotes)
            .iter()
            .any(|l| l.contains("Follow up in one week.")));
    }
}
