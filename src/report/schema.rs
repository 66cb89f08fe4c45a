//! Section schema — the fixed ordered set of clinical report sections and
//! the header canonicalizer shared by the normalizer and the renderer.
//!
//! The order of [`Section::ALL`] is the render order. It is fixed at
//! compile time and never inferred from model output.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// One of the eight canonical clinical report sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Symptoms,
    Diagnosis,
    Prescription,
    DoctorsNotes,
    Assessment,
    Plan,
    RedFlags,
    Disclaimer,
}

impl Section {
    /// All sections in canonical render order.
    pub const ALL: [Section; 8] = [
        Section::Symptoms,
        Section::Diagnosis,
        Section::Prescription,
        Section::DoctorsNotes,
        Section::Assessment,
        Section::Plan,
        Section::RedFlags,
        Section::Disclaimer,
    ];

    /// Number of canonical sections.
    pub const COUNT: usize = Self::ALL.len();

    /// Position in the canonical order.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Canonical display name as printed in headers and rendered boxes.
    pub fn display_name(self) -> &'static str {
        match self {
            Section::Symptoms => "Symptoms",
            Section::Diagnosis => "Diagnosis",
            Section::Prescription => "Prescription / Treatment Plan",
            Section::DoctorsNotes => "Doctor's Notes",
            Section::Assessment => "Assessment",
            Section::Plan => "Plan",
            Section::RedFlags => "Red Flags",
            Section::Disclaimer => "Disclaimer",
        }
    }

    /// Minimum number of content rows the renderer draws for this section.
    /// Clinical sections get writable ruled lines even when empty; the
    /// disclaimer never needs blank lines.
    pub fn min_rows(self) -> usize {
        match self {
            Section::Symptoms
            | Section::Diagnosis
            | Section::Prescription
            | Section::DoctorsNotes => 3,
            Section::Assessment | Section::Plan | Section::RedFlags => 2,
            Section::Disclaimer => 1,
        }
    }

    /// Recognition aliases for this section, as an anchored full-line
    /// pattern over a normalized header line (lowercased, whitespace
    /// collapsed, trailing colon stripped). The patterns are mutually
    /// exclusive by construction — no line may match two sections — and
    /// the exclusivity is enforced by tests below.
    fn alias_pattern(self) -> &'static str {
        match self {
            Section::Symptoms => r"^(symptoms?|chief complaints?|presenting complaints?|complaints?)$",
            Section::Diagnosis => r"^(diagnos(is|es)|dx|impressions?|provisional diagnosis)$",
            Section::Prescription => {
                r"^(prescriptions?|treatment plans?|treatments?|medications?|meds|rx)$"
            }
            Section::DoctorsNotes => {
                r"^(doctor'?s notes?|doctor notes?|clinical notes?|additional notes?|notes?)$"
            }
            Section::Assessment => r"^(assessments?|clinical assessment|evaluation)$",
            Section::Plan => r"^(plan( of care)?|care plan|follow[ -]?up( plan)?|next steps)$",
            Section::RedFlags => r"^(red flags?|warning signs?|danger signs?|alerts?)$",
            Section::Disclaimer => r"^(disclaimers?|important notice|notice)$",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Compiled alias regexes, one per section, in canonical order.
static ALIAS_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    Section::ALL
        .iter()
        .map(|s| Regex::new(&format!("(?i){}", s.alias_pattern())).expect("valid alias regex"))
        .collect()
});

static INNER_WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));
static SLASH_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*/\s*").expect("valid regex"));

/// Normalize a candidate header line for matching: collapse internal
/// whitespace, strip one trailing colon, single spacing around `/`,
/// lowercase.
fn normalize_header(line: &str) -> String {
    let collapsed = INNER_WS_RE.replace_all(line.trim(), " ");
    let slashed = SLASH_RE.replace_all(&collapsed, " / ");
    slashed.trim_end_matches(':').trim().to_lowercase()
}

/// Resolve an arbitrary text line to a canonical section, or `None` when
/// the line is not a header. Exact canonical-name matches win; otherwise
/// the first matching alias (the table is exclusive, so order is moot).
pub fn canonicalize_header(line: &str) -> Option<Section> {
    let normalized = normalize_header(line);
    if normalized.is_empty() {
        return None;
    }

    for section in Section::ALL {
        if normalize_header(section.display_name()) == normalized {
            return Some(section);
        }
    }

    for section in Section::ALL {
        if ALIAS_RES[section.index()].is_match(&normalized) {
            return Some(section);
        }
    }

    None
}
