//! Test-vector export in the VPL cases format: one three-line stanza per
//! case, capped at the first five pairs.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

use quizforge_common::{ExtractionContext, QuestionKind, VectorPair};

pub const MAX_EXPORTED_CASES: usize = 5;

/// What happened to the cases file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VplOutcome {
    Written(usize),
    /// Multiple-choice artifacts expect no vectors; any stale file is removed.
    Removed,
    /// No valid extraction context; nothing exported.
    Skipped,
}

/// Render the first min(5, N) pairs. Inner line breaks are flattened to
/// single spaces so each value stays on its stanza line.
pub fn render_cases(pairs: &[VectorPair]) -> String {
    let mut out = String::new();
    for (index, pair) in pairs.iter().take(MAX_EXPORTED_CASES).enumerate() {
        writeln!(out, "case=case{}", index + 1).ok();
        writeln!(out, "input={}", flatten(&pair.input)).ok();
        writeln!(out, "output={}", flatten(&pair.output)).ok();
    }
    out
}

pub fn export(
    context: Option<&ExtractionContext>,
    kind: QuestionKind,
    path: &Path,
) -> Result<VplOutcome> {
    if kind == QuestionKind::MultipleChoice {
        match std::fs::remove_file(path) {
            Ok(()) => info!(path = %path.display(), "Stale cases file removed (multiple choice)"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to remove {}", path.display()))
            }
        }
        return Ok(VplOutcome::Removed);
    }

    let Some(context) = context.filter(|c| c.is_valid()) else {
        warn!("No valid extraction context, skipping cases export");
        return Ok(VplOutcome::Skipped);
    };

    let pairs = context.vector_pairs();
    let body = render_cases(&pairs);
    std::fs::write(path, body)
        .with_context(|| format!("Failed to write cases file to {}", path.display()))?;

    let written = pairs.len().min(MAX_EXPORTED_CASES);
    info!(path = %path.display(), cases = written, "Cases file written");
    Ok(VplOutcome::Written(written))
}

fn flatten(value: &str) -> String {
    value.replace("\r\n", " ").replace(['\n', '\r'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(n: usize) -> ExtractionContext {
        ExtractionContext {
            inputs: (0..n).map(|i| format!("in{i}")).collect(),
            outputs: (0..n).map(|i| format!("out{i}")).collect(),
        }
    }

    #[test]
    fn stanza_format_is_exact() {
        let pairs = vec![VectorPair {
            input: "a;cmd()".to_string(),
            output: "result".to_string(),
        }];
        assert_eq!(
            render_cases(&pairs),
            "case=case1\ninput=a;cmd()\noutput=result\n"
        );
    }

    #[test]
    fn only_the_first_five_pairs_are_exported() {
        let pairs = context(8).vector_pairs();
        let body = render_cases(&pairs);
        assert!(body.contains("case=case5"));
        assert!(!body.contains("case=case6"));
    }

    #[test]
    fn inner_line_breaks_are_flattened() {
        let pairs = vec![VectorPair {
            input: "line one\nline two".to_string(),
            output: "a\r\nb".to_string(),
        }];
        let body = render_cases(&pairs);
        assert!(body.contains("input=line one line two"));
        assert!(body.contains("output=a b"));
    }

    #[test]
    fn multiple_choice_removes_any_stale_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("question.cases");
        std::fs::write(&path, "stale").unwrap();

        let outcome = export(Some(&context(2)), QuestionKind::MultipleChoice, &path).unwrap();
        assert_eq!(outcome, VplOutcome::Removed);
        assert!(!path.exists());

        // removing again is not an error
        let outcome = export(None, QuestionKind::MultipleChoice, &path).unwrap();
        assert_eq!(outcome, VplOutcome::Removed);
    }

    #[test]
    fn invalid_context_skips_the_export() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("question.cases");

        let outcome = export(None, QuestionKind::Open, &path).unwrap();
        assert_eq!(outcome, VplOutcome::Skipped);

        let empty = ExtractionContext::default();
        let outcome = export(Some(&empty), QuestionKind::Open, &path).unwrap();
        assert_eq!(outcome, VplOutcome::Skipped);
        assert!(!path.exists());
    }

    #[test]
    fn written_file_matches_rendered_body() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("question.cases");
        let ctx = context(2);
        let outcome = export(Some(&ctx), QuestionKind::Open, &path).unwrap();
        assert_eq!(outcome, VplOutcome::Written(2));
        let body = std::fs::read_to_string(&path).unwrap();
        assert_eq!(body, render_cases(&ctx.vector_pairs()));
    }
}
