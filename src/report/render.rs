//! Document renderer — lays bucketed report content out as an A4 PDF.
//!
//! One call renders one complete document from one bucket map plus
//! metadata: centered title, four-line metadata header, divider, then
//! exactly eight section boxes in canonical order. Each box has a shaded,
//! fully bordered header row and ruled content rows (bottom border only),
//! padded with writable blank rows up to the section's minimum.

use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::NaiveDate;
use printpdf::path::PaintMode;
use printpdf::*;
use regex::Regex;

use super::normalize::{bucket_sections, ReportBuckets, PLACEHOLDER_LINE};
use super::schema::Section;

/// Sentinel used whenever no parsable date token is present in the source
/// identifier. Bracketed so it reads as a fill-in marker, not a date.
pub const DATE_UNAVAILABLE: &str = "[Date not available]";

/// Document title printed at the top of every report.
const REPORT_TITLE: &str = "Medical Consultation Report";

const PAGE_W: f32 = 210.0;
const PAGE_H: f32 = 297.0;
const MARGIN: f32 = 20.0;
const BOX_W: f32 = PAGE_W - 2.0 * MARGIN;
const HEADER_ROW_H: f32 = 8.0;
const CONTENT_ROW_H: f32 = 6.5;
const SECTION_GAP: f32 = 6.0;

/// Per-request report metadata. Supplied by the caller, never inferred
/// from model output — the censor strips identity fields from the body so
/// this block stays the single source of truth.
#[derive(Debug, Clone)]
pub struct ReportMetadata {
    pub patient_name: String,
    pub patient_id: String,
    /// Clinician display name for the "Generated by" line.
    pub clinician: String,
    /// Date-bearing source identifier, e.g. the saved audio filename
    /// `alice_20250312_143000_visit.mp3`.
    pub source_name: String,
}

/// Errors from PDF assembly or the final file write.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("PDF font error: {0}")]
    Font(String),
    #[error("PDF save error: {0}")]
    Save(String),
    #[error("Cannot write report file: {0}")]
    Io(#[from] std::io::Error),
}

/// 8-digit date token immediately followed by an underscore and a 6-digit
/// time token, as produced by the audio-intake filename scheme.
static DATE_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{8})_\d{6}").expect("valid regex"));

/// Derive the human-readable consultation date from a source identifier.
///
/// Scans for `YYYYMMDD_HHMMSS`, parses the date half, and formats it as
/// `DD Month YYYY`. Missing or unparsable tokens (month 13, day 40)
/// degrade to [`DATE_UNAVAILABLE`]; this never fails the render.
pub fn consultation_date(source_name: &str) -> String {
    DATE_TOKEN_RE
        .captures(source_name)
        .and_then(|caps| NaiveDate::parse_from_str(&caps[1], "%Y%m%d").ok())
        .map(|date| date.format("%d %B %Y").to_string())
        .unwrap_or_else(|| DATE_UNAVAILABLE.to_string())
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    italic: IndirectFontRef,
}

/// Render the complete report document. Always produces all eight section
/// boxes in canonical order, regardless of how much content the buckets
/// hold; empty sections show a single placeholder row.
pub fn render_report(
    buckets: &ReportBuckets,
    meta: &ReportMetadata,
) -> Result<Vec<u8>, RenderError> {
    let (doc, page1, layer1) =
        PdfDocument::new(REPORT_TITLE, Mm(PAGE_W), Mm(PAGE_H), "Layer 1");
    let mut layer = doc.get_page(page1).get_layer(layer1);

    let fonts = Fonts {
        regular: builtin(&doc, BuiltinFont::Helvetica)?,
        bold: builtin(&doc, BuiltinFont::HelveticaBold)?,
        italic: builtin(&doc, BuiltinFont::HelveticaOblique)?,
    };

    let mut y = PAGE_H - MARGIN;

    // Title block
    layer.use_text(REPORT_TITLE, 16.0, centered_x(REPORT_TITLE, 16.0), Mm(y), &fonts.bold);
    y -= 12.0;

    // Metadata block — fixed label order, then a dash divider.
    let metadata_lines = [
        format!("Patient Name: {}", meta.patient_name),
        format!("Patient ID: {}", meta.patient_id),
        format!("Date of Consultation: {}", consultation_date(&meta.source_name)),
        format!("Generated by: {}", meta.clinician),
    ];
    for line in &metadata_lines {
        layer.use_text(line, 10.0, Mm(MARGIN), Mm(y), &fonts.regular);
        y -= 5.5;
    }
    layer.use_text("-".repeat(76), 10.0, Mm(MARGIN), Mm(y), &fonts.regular);
    y -= 9.0;

    // Section boxes in canonical order.
    for (section, lines) in buckets.iter() {
        let rows = section_rows(section, lines);
        let box_height = HEADER_ROW_H + rows.len() as f32 * CONTENT_ROW_H;

        // Keep the header row attached to at least its first content row.
        if y - (HEADER_ROW_H + CONTENT_ROW_H) < MARGIN {
            layer = new_page(&doc);
            y = PAGE_H - MARGIN;
        } else if y - box_height < MARGIN && box_height <= PAGE_H - 2.0 * MARGIN {
            layer = new_page(&doc);
            y = PAGE_H - MARGIN;
        }

        // Header row: shaded, all four borders, centered bold name.
        let header_bottom = y - HEADER_ROW_H;
        layer.set_fill_color(Color::Rgb(Rgb::new(0.85, 0.85, 0.85, None)));
        layer.set_outline_color(Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None)));
        layer.set_outline_thickness(0.6);
        layer.add_rect(
            Rect::new(Mm(MARGIN), Mm(header_bottom), Mm(MARGIN + BOX_W), Mm(y))
                .with_mode(PaintMode::FillStroke),
        );
        layer.set_fill_color(Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None)));
        let name = section.display_name();
        layer.use_text(
            name,
            11.0,
            centered_x(name, 11.0),
            Mm(header_bottom + 2.6),
            &fonts.bold,
        );
        y = header_bottom;

        // Content rows: text (when present) over a bottom border only.
        let (body_font, body_size) = if section == Section::Disclaimer {
            (&fonts.italic, 8.0)
        } else {
            (&fonts.regular, 9.0)
        };
        for row in &rows {
            if y - CONTENT_ROW_H < MARGIN {
                layer = new_page(&doc);
                y = PAGE_H - MARGIN;
            }
            let row_bottom = y - CONTENT_ROW_H;
            if let Some(text) = row {
                layer.use_text(text, body_size, Mm(MARGIN + 2.0), Mm(row_bottom + 1.8), body_font);
            }
            layer.set_outline_thickness(0.3);
            layer.add_line(Line {
                points: vec![
                    (Point::new(Mm(MARGIN), Mm(row_bottom)), false),
                    (Point::new(Mm(MARGIN + BOX_W), Mm(row_bottom)), false),
                ],
                is_closed: false,
            });
            y = row_bottom;
        }

        y -= SECTION_GAP;
    }

    let mut buf = BufWriter::new(Vec::new());
    doc.save(&mut buf)
        .map_err(|e| RenderError::Save(e.to_string()))?;
    buf.into_inner()
        .map_err(|e| RenderError::Save(e.to_string()))
}

/// Render from flattened or otherwise pre-cleaned report text.
///
/// The text is re-bucketed with the very same header matching the
/// normalizer uses, so input that skipped normalization still produces
/// all eight boxes in canonical order.
pub fn render_report_text(
    text: &str,
    meta: &ReportMetadata,
) -> Result<Vec<u8>, RenderError> {
    render_report(&bucket_sections(text), meta)
}

/// Write rendered report bytes to `<dir>/<filename>`, creating the
/// directory if needed. The one write the pipeline performs.
pub fn export_report_to_file(
    pdf_bytes: &[u8],
    filename: &str,
    reports_dir: &Path,
) -> Result<PathBuf, RenderError> {
    std::fs::create_dir_all(reports_dir)?;
    let path = reports_dir.join(filename);
    std::fs::write(&path, pdf_bytes)?;
    Ok(path)
}

fn builtin(doc: &PdfDocumentReference, font: BuiltinFont) -> Result<IndirectFontRef, RenderError> {
    doc.add_builtin_font(font)
        .map_err(|e| RenderError::Font(e.to_string()))
}

fn new_page(doc: &PdfDocumentReference) -> PdfLayerReference {
    let (page, layer) = doc.add_page(Mm(PAGE_W), Mm(PAGE_H), "Layer 1");
    doc.get_page(page).get_layer(layer)
}

/// The rows drawn for a section: every content line word-wrapped to the
/// box width, or a single placeholder when empty, padded with writable
/// blank rows (`None`) up to the section minimum.
fn section_rows(section: Section, lines: &[String]) -> Vec<Option<String>> {
    let wrap_at = if section == Section::Disclaimer { 104 } else { 92 };

    let mut rows: Vec<Option<String>> = Vec::new();
    if lines.is_empty() {
        rows.push(Some(PLACEHOLDER_LINE.to_string()));
    } else {
        for line in lines {
            for segment in wrap_text(line, wrap_at) {
                rows.push(Some(segment));
            }
        }
    }
    while rows.len() < section.min_rows() {
        rows.push(None);
    }
    rows
}

/// Approximate horizontal centering for builtin Helvetica.
fn centered_x(text: &str, font_size_pt: f32) -> Mm {
    let width_mm = text.chars().count() as f32 * font_size_pt * 0.5 * 0.352_778;
    Mm(((PAGE_W - width_mm) / 2.0).max(MARGIN))
}

/// Simple word-wrap helper for box-width text rows.
fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.len() + word.len() + 1 > max_chars && !current.is_empty() {
            lines.push(current.clone());
            current.clear();
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}
