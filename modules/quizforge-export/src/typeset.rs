//! Typeset-ready document: the winning artifact with its scratch machinery
//! removed and target-markup special characters escaped. Verbatim spans pass
//! through untouched.

use std::path::Path;

use anyhow::{Context, Result};
use regex::Regex;
use std::sync::LazyLock;
use tracing::info;

use quizforge_common::{artifact, ExtractionContext, QuestionKind};

static COMMENT_BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\\begin\{comment\}.*?\\end\{comment\}").unwrap());

/// Example-input/output scratch section: an optional spacing-decorated bold
/// header followed by a verbatim block holding only a placeholder token.
static SCRATCH_SECTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?s)(?:\\vspace\{[^}]*\})?(?:\\noindent)?\\textbf\{[^}]*\}(?:\\vspace\{[^}]*\})?\s*\\begin\{verbatim\}\s*\[\[code:[^\]]*\]\]\s*\\end\{verbatim\}",
    )
    .unwrap()
});

/// A bare placeholder verbatim block with no header.
static PLACEHOLDER_VERBATIM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\\begin\{verbatim\}\s*\[\[code:[^\]]*\]\]\s*\\end\{verbatim\}").unwrap()
});

static VERBATIM_SPAN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\\begin\{verbatim\}.*?\\end\{verbatim\}").unwrap());

/// Produce the sanitized document. For open-kind artifacts with a valid
/// extraction context, a freshly rendered worked example is appended from
/// the first vector pair — never copied from the original text, which keeps
/// stale examples out.
pub fn render_document(
    text: &str,
    kind: QuestionKind,
    context: Option<&ExtractionContext>,
) -> String {
    let doc = artifact::strip_fragment_block(text);
    let doc = COMMENT_BLOCK_RE.replace_all(&doc, "");
    let doc = SCRATCH_SECTION_RE.replace_all(&doc, "");
    let doc = PLACEHOLDER_VERBATIM_RE.replace_all(&doc, "");
    let doc = artifact::strip_placeholders(&doc);

    let mut out = escape_outside_verbatim(doc.trim());

    if kind == QuestionKind::Open {
        if let Some(context) = context.filter(|c| c.is_valid()) {
            let pairs = context.vector_pairs();
            out.push_str(&worked_example(&pairs[0].input, &pairs[0].output));
        }
    }

    out
}

pub fn write_document(document: &str, path: &Path) -> Result<()> {
    std::fs::write(path, document)
        .with_context(|| format!("Failed to write document to {}", path.display()))?;
    info!(path = %path.display(), "Typeset document written");
    Ok(())
}

/// Escape `$`, `%`, `#` and unescaped `_` everywhere except inside verbatim
/// spans.
fn escape_outside_verbatim(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for span in VERBATIM_SPAN_RE.find_iter(text) {
        out.push_str(&escape_special(&text[cursor..span.start()]));
        out.push_str(span.as_str());
        cursor = span.end();
    }
    out.push_str(&escape_special(&text[cursor..]));
    out
}

fn escape_special(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev = '\0';
    for c in text.chars() {
        if matches!(c, '$' | '%' | '#' | '_') && prev != '\\' {
            out.push('\\');
        }
        out.push(c);
        prev = c;
    }
    out
}

fn worked_example(input: &str, output: &str) -> String {
    format!(
        "\n\n\\vspace{{2mm}}\\noindent\\textbf{{Example Input:}}\\vspace{{-2mm}}\n\
\\begin{{verbatim}}\n{input}\n\\end{{verbatim}}\n\n\
\\vspace{{-2mm}}\\noindent\\textbf{{Example Output:}}\\vspace{{-2mm}}\n\
\\begin{{verbatim}}\n{output}\n\\end{{verbatim}}\n"
    )
}
