//! Markup axis: counts of the recognized LaTeX-subset constructs and
//! open/close directive balance. Only the constructs the pipeline must
//! recognize are scanned; this is not a markup engine.

use regex::Regex;
use std::sync::LazyLock;

use quizforge_common::MarkupMetrics;

static VERBATIM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\\begin\{verbatim\}.*?\\end\{verbatim\}").unwrap());
static ENUMERATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\\begin\{enumerate\}.*?\\end\{enumerate\}").unwrap());
static BOLD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\\textbf\{.*?\}").unwrap());
static INLINE_CODE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\\texttt\{.*?\}").unwrap());
static ITEM_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\\item").unwrap());

/// Scan one artifact. Validity requires balanced block directives AND at
/// least one recognized construct.
pub fn scan(text: &str) -> MarkupMetrics {
    let verbatim_blocks = VERBATIM_RE.find_iter(text).count();
    let enumerate_blocks = ENUMERATE_RE.find_iter(text).count();
    let bold_spans = BOLD_RE.find_iter(text).count();
    let inline_code_spans = INLINE_CODE_RE.find_iter(text).count();
    let list_items = ITEM_RE.find_iter(text).count();

    let begin_directives = text.matches(r"\begin{").count();
    let end_directives = text.matches(r"\end{").count();
    let balanced = begin_directives == end_directives;

    let total_constructs =
        verbatim_blocks + enumerate_blocks + bold_spans + inline_code_spans + list_items;

    MarkupMetrics {
        verbatim_blocks,
        enumerate_blocks,
        bold_spans,
        inline_code_spans,
        list_items,
        begin_directives,
        end_directives,
        balanced,
        total_constructs,
        valid: balanced && total_constructs > 0,
    }
}
