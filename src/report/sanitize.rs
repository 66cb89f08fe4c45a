//! Pre-normalization cleanup of raw model output.
//!
//! Strips markdown scaffolding (fences, headings, emphasis) and model
//! artifacts (special tokens, think-wrapper tags) before the censor and
//! normalizer run. Pure text-to-text and idempotent: applying the
//! sanitizer twice yields the same result as once.

use std::sync::LazyLock;

use regex::Regex;

/// Fence marker lines (``` or ```lang) — removed whole, inner text kept.
static FENCE_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*```[\w-]*[ \t]*\r?\n?").expect("valid regex"));

/// Any stray inline fence marker left after the line pass.
static FENCE_INLINE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new("```").expect("valid regex"));

/// Leading markdown heading markers.
static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^#{1,6}[ \t]*").expect("valid regex"));

/// Bold/italic emphasis markers; the enclosed text is kept.
static EMPHASIS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*{1,3}|_{2,3}").expect("valid regex"));

/// Model special tokens: non-delimiter text enclosed in a pair of
/// vertical-bar-like delimiters (ASCII `|` or full-width `｜`), with the
/// usual `<`/`>` wrappers and stray adjacent periods. A misbehaving model
/// may emit `<|end_of_text|>`, `<｜end▁of▁sentence｜>` or close visual
/// variants anywhere in the body. On the leading side only a run of two
/// or more periods counts as stray — a single one is the sentence's own
/// full stop and must survive.
static SPECIAL_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:\.{2,})?<?[|｜][^|｜\r\n]+[|｜]>?\.*").expect("valid regex"));

/// Paired reasoning-wrapper tags, removed tag-by-tag regardless of balance.
static THINK_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</?think(ing)?\s*>").expect("valid regex"));

/// Runs of spaces/tabs left behind by in-line removals.
static MULTI_SPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]{2,}").expect("valid regex"));

/// Strip model special tokens from a single line or text fragment.
///
/// Exported separately because the normalizer re-applies it per line:
/// tokens emitted mid-body can survive the coarse whole-text pass when a
/// model interleaves them with fresh delimiters.
pub fn strip_special_tokens(text: &str) -> String {
    let stripped = SPECIAL_TOKEN_RE.replace_all(text, " ");
    MULTI_SPACE_RE.replace_all(&stripped, " ").to_string()
}

/// Clean raw model output for section normalization.
///
/// Rule order matters — later rules must not resurrect what earlier ones
/// removed:
/// 1. unwrap fenced code blocks (drop the fence markers, keep inner text)
/// 2. strip leading `#` heading markers
/// 3. strip `*`/`_` emphasis markers, keeping the enclosed text
/// 4. remove model special tokens (see [`strip_special_tokens`])
/// 5. remove think-wrapper tags, case-insensitively, tag-by-tag
pub fn sanitize_model_output(raw: &str) -> String {
    let text = FENCE_LINE_RE.replace_all(raw, "");
    let text = FENCE_INLINE_RE.replace_all(&text, "");
    let text = HEADING_RE.replace_all(&text, "");
    let text = EMPHASIS_RE.replace_all(&text, "");
    let text = strip_special_tokens(&text);
    let text = THINK_TAG_RE.replace_all(&text, "");

    // Right-trim each line so removals never leave trailing spaces.
    let cleaned: Vec<&str> = text.lines().map(str::trim_end).collect();
    cleaned.join("\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unwraps_fenced_code_blocks() {
        let raw = "```markdown\nSymptoms\n- Fever\n```";
        let result = sanitize_model_output(raw);
        assert_eq!(result, "Symptoms\n- Fever");
    }

    #[test]
    fn strips_heading_markers() {
        let raw = "## Symptoms\n### Diagnosis\n#Plan";
        let result = sanitize_model_output(raw);
        assert_eq!(result, "Symptoms\nDiagnosis\nPlan");
    }

    #[test]
    fn strips_emphasis_keeping_text() {
        let raw = "**Symptoms**\n- *mild* fever\n__Diagnosis__";
        let result = sanitize_model_output(raw);
        assert_eq!(result, "Symptoms\n- mild fever\nDiagnosis");
    }

    #[test]
    fn strips_ascii_special_tokens() {
        let raw = "<|begin_of_sentence|>Symptoms\n- Fever<|end_of_text|>";
        let result = sanitize_model_output(raw);
        assert!(!result.contains("<|"));
        assert!(!result.contains("|>"));
        assert!(result.contains("Symptoms"));
        assert!(result.contains("- Fever"));
    }

    #[test]
    fn strips_fullwidth_special_tokens() {
        let raw = "Assessment\n- Stable.<｜end▁of▁sentence｜>";
        let result = sanitize_model_output(raw);
        assert!(!result.contains('｜'));
        assert_eq!(result, "Assessment\n- Stable.");
    }

    #[test]
    fn token_removal_leaves_no_orphaned_periods() {
        let raw = "Plan\n- Rest..<|eot_id|>..";
        let result = sanitize_model_output(raw);
        assert_eq!(result, "Plan\n- Rest");
    }

    #[test]
    fn sentence_period_before_token_survives() {
        let raw = "- Condition stable.<|eot_id|>";
        assert_eq!(sanitize_model_output(raw), "- Condition stable.");
    }

    #[test]
    fn strips_think_tags_unbalanced() {
        let raw = "<think>reasoning here\nSymptoms\n- Fever</THINK>\n<Thinking>";
        let result = sanitize_model_output(raw);
        assert!(!result.to_lowercase().contains("<think"));
        assert!(!result.to_lowercase().contains("</think"));
        assert!(result.contains("reasoning here"));
        assert!(result.contains("- Fever"));
    }

    #[test]
    fn known_model_artifacts_all_absent() {
        let raw = "<|begin_of_sentence|>\n<think>\nSymptoms\n- Fever\n</think>";
        let result = sanitize_model_output(raw);
        assert!(!result.contains("<|begin_of_sentence|>"));
        assert!(!result.contains("<think>"));
        assert!(!result.contains("</think>"));
        assert!(result.contains("- Fever"));
    }

    #[test]
    fn sanitize_is_idempotent() {
        let raw = "```md\n## **Symptoms**\n- Fever <|sep|> chills\n<think>hmm</think>\n```";
        let once = sanitize_model_output(raw);
        let twice = sanitize_model_output(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn midline_token_keeps_word_spacing() {
        let raw = "Fever<|sep|>chills";
        let result = sanitize_model_output(raw);
        assert_eq!(result, "Fever chills");
    }

    #[test]
    fn clean_text_unchanged() {
        let text = "Symptoms\n- Fever for two days\n\nDiagnosis\n- Viral infection";
        assert_eq!(sanitize_model_output(text), text);
    }

    #[test]
    fn empty_input_returns_empty() {
        assert_eq!(sanitize_model_output(""), "");
        assert_eq!(sanitize_model_output("  \n \n"), "");
    }

    #[test]
    fn strip_special_tokens_standalone() {
        assert_eq!(strip_special_tokens("- Rest <|tok|> daily"), "- Rest daily");
        assert_eq!(strip_special_tokens("no tokens here"), "no tokens here");
    }

    #[test]
    fn lone_pipe_characters_survive() {
        // A single bar is not a token delimiter pair.
        let raw = "- BP 120|80";
        assert_eq!(sanitize_model_output(raw), "- BP 120|80");
    }
}
