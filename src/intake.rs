//! Patient-detail intake — parses identity details from free chat text
//! and holds them, per author, until the matching recording arrives.
//!
//! Extraction is an ordered list of independent rules tried in fixed
//! priority order; the first rule that matches wins. The pending store
//! keeps at most one record per author identity and hands it out exactly
//! once.

use std::collections::HashMap;
use std::sync::LazyLock;
use std::time::{Duration, Instant};

use regex::Regex;

/// Identity details captured from intake chat, consumed by the report
/// metadata header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatientDetails {
    pub name: String,
    pub patient_id: String,
}

/// One candidate extraction rule: a named pattern with `name` and `id`
/// capture groups.
struct DetailRule {
    /// What the rule recognizes, for trace logs.
    description: &'static str,
    regex: Regex,
}

/// Rules in priority order — first success wins. Each rule is complete on
/// its own; they are alternatives, not stages.
static DETAIL_RULES: LazyLock<Vec<DetailRule>> = LazyLock::new(|| {
    vec![
        // Label spellings include the Indonesian "nama" seen in intake chats.
        DetailRule {
            description: "quoted name then id",
            regex: Regex::new(
                r#"(?i)(?:patient\s+)?(?:name|nama)\s*[:=]\s*"(?P<name>[^"\n]+)"\s*[,;]?\s*(?:patient\s+)?id\s*[:=]\s*(?P<id>[\w-]+)"#,
            )
            .expect("valid rule regex"),
        },
        DetailRule {
            description: "labeled name then id",
            regex: Regex::new(
                r"(?i)(?:patient\s+)?(?:name|nama)\s*[:=]\s*(?P<name>[^,;\n]+?)\s*[,;\n]\s*(?:patient\s+)?id\s*[:=]\s*(?P<id>[\w-]+)",
            )
            .expect("valid rule regex"),
        },
        DetailRule {
            description: "labeled id then name",
            regex: Regex::new(
                r"(?i)(?:patient\s+)?id\s*[:=]\s*(?P<id>[\w-]+)\s*[,;\n]\s*(?:patient\s+)?(?:name|nama)\s*[:=]\s*(?P<name>[^,;\n]+)",
            )
            .expect("valid rule regex"),
        },
        DetailRule {
            description: "compact name-comma-id",
            regex: Regex::new(r"(?m)^\s*(?P<name>[A-Za-z][A-Za-z .'-]+?)\s*,\s*(?P<id>[A-Za-z0-9][\w-]*\d[\w-]*)\s*$")
                .expect("valid rule regex"),
        },
    ]
});

/// Parse patient details from free-form chat text, or `None` when no rule
/// matches.
pub fn parse_patient_details(text: &str) -> Option<PatientDetails> {
    for rule in DETAIL_RULES.iter() {
        if let Some(caps) = rule.regex.captures(text) {
            let details = PatientDetails {
                name: caps["name"].trim().trim_matches('"').trim().to_string(),
                patient_id: caps["id"].trim().to_string(),
            };
            if details.name.is_empty() || details.patient_id.is_empty() {
                continue;
            }
            tracing::debug!(rule = rule.description, "Patient details extracted");
            return Some(details);
        }
    }
    None
}

/// A pending record waiting for its recording.
struct PendingRecord {
    details: PatientDetails,
    created_at: Instant,
}

/// Short-lived in-memory store of pending patient details, keyed by
/// author identity.
///
/// Contract: at most one pending record per author (`insert` replaces),
/// consumed atomically on first use (`consume` removes), swept by TTL
/// (`expire_stale`). The caller owns sweep scheduling.
pub struct PendingSessions {
    ttl: Duration,
    pending: HashMap<String, PendingRecord>,
}

impl PendingSessions {
    /// Default time-to-live for a pending record.
    pub const DEFAULT_TTL: Duration = Duration::from_secs(15 * 60);

    /// Empty store with the default TTL.
    pub fn new() -> Self {
        Self::with_ttl(Self::DEFAULT_TTL)
    }

    /// Empty store with an explicit TTL.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            pending: HashMap::new(),
        }
    }

    /// Record pending details for an author, replacing any earlier record.
    pub fn insert(&mut self, author: &str, details: PatientDetails) {
        self.pending.insert(
            author.to_string(),
            PendingRecord {
                details,
                created_at: Instant::now(),
            },
        );
    }

    /// Take the pending details for an author. Removes the record — a
    /// second call returns `None`.
    pub fn consume(&mut self, author: &str) -> Option<PatientDetails> {
        self.pending.remove(author).map(|r| r.details)
    }

    /// Whether the author has a pending record.
    pub fn has_pending(&self, author: &str) -> bool {
        self.pending.contains_key(author)
    }

    /// Drop records older than the TTL. Returns how many were removed.
    pub fn expire_stale(&mut self) -> usize {
        let ttl = self.ttl;
        let before = self.pending.len();
        self.pending.retain(|_, r| r.created_at.elapsed() < ttl);
        before - self.pending.len()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl Default for PendingSessions {
    fn default() -> Self {
        Self::new()
    }
}
