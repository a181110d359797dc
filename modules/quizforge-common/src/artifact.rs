//! Shared helpers over raw artifact text: the fragment marker block and the
//! handful of spans both the metrics engine and the renderer care about.

use regex::Regex;
use std::sync::LazyLock;

/// The single designated executable fragment: `[[def: ... ]]`, case-insensitive,
/// newlines allowed. Only the first match counts.
static FRAGMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)\[\[def:(.*?)\]\]").unwrap());

static BOLD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\\textbf\{(.*?)\}").unwrap());

/// Scratch placeholder tokens the renderer must strip: `[[code:name]]`.
static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[code:[^\]]*\]\]").unwrap());

/// Raw code of the designated fragment, if the marker pair is present.
pub fn fragment_code(text: &str) -> Option<&str> {
    FRAGMENT_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Artifact text with the fragment marker block removed.
pub fn strip_fragment_block(text: &str) -> String {
    FRAGMENT_RE.replace(text, "").into_owned()
}

/// Content of the first bold span, used as the export short description.
pub fn first_bold_span(text: &str) -> Option<String> {
    BOLD_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Remove leftover `[[code:...]]` placeholder tokens.
pub fn strip_placeholders(text: &str) -> String {
    PLACEHOLDER_RE.replace_all(text, "").into_owned()
}
