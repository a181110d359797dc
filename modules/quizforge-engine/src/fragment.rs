//! Locates the designated executable fragment, normalizes its indentation
//! and runs it in the sandbox. Upstream generation frequently emits
//! inconsistent indentation, so a failed execution earns exactly one retry
//! under an alternate normalization; never more than two attempts total.

use tracing::{error, warn};

use quizforge_common::{artifact, ExtractionContext};

use crate::sandbox::Sandbox;

/// Result of one extraction. Failures are data: document rendering proceeds
/// without a context, only vector export is skipped.
#[derive(Debug)]
pub struct FragmentOutcome {
    pub context: Option<ExtractionContext>,
    /// The code text of the last attempt that actually ran, for diagnostics.
    pub executed_code: String,
    pub failure: Option<String>,
}

pub struct CodeFragmentExtractor {
    sandbox: Sandbox,
}

impl CodeFragmentExtractor {
    pub fn new(sandbox: Sandbox) -> Self {
        Self { sandbox }
    }

    pub async fn extract(&self, artifact_text: &str) -> FragmentOutcome {
        let Some(raw) = artifact::fragment_code(artifact_text) else {
            warn!("No fragment marker found in artifact");
            return FragmentOutcome {
                context: None,
                executed_code: String::new(),
                failure: Some("no fragment marker found".to_string()),
            };
        };

        let primary = dedent(raw);
        let first_error = match self.sandbox.execute(&primary).await {
            Ok(context) => {
                check_collections(&context);
                return FragmentOutcome {
                    context: Some(context),
                    executed_code: primary,
                    failure: None,
                };
            }
            Err(e) => e,
        };

        warn!(error = %first_error, "Fragment execution failed, retrying with flattened indentation");

        let fallback = strip_all_indent(raw);
        match self.sandbox.execute(&fallback).await {
            Ok(context) => {
                check_collections(&context);
                FragmentOutcome {
                    context: Some(context),
                    executed_code: fallback,
                    failure: None,
                }
            }
            Err(second_error) => {
                error!(error = %second_error, "Fragment execution failed on both normalization attempts");
                FragmentOutcome {
                    context: None,
                    executed_code: primary,
                    failure: Some(first_error.to_string()),
                }
            }
        }
    }
}

fn check_collections(context: &ExtractionContext) {
    if !context.is_valid() {
        warn!(
            inputs = context.inputs.len(),
            outputs = context.outputs.len(),
            "Fragment executed but its output collections are missing or misaligned"
        );
    }
}

/// Strip the longest whitespace prefix shared by all non-blank lines, then
/// trim surrounding blank lines.
pub fn dedent(code: &str) -> String {
    let lines: Vec<&str> = code.lines().collect();

    let mut prefix: Option<&str> = None;
    for line in &lines {
        if line.trim().is_empty() {
            continue;
        }
        let indent = &line[..line.len() - line.trim_start().len()];
        prefix = Some(match prefix {
            None => indent,
            Some(current) => common_prefix(current, indent),
        });
    }
    let prefix = prefix.unwrap_or("");

    let stripped: Vec<&str> = lines
        .iter()
        .map(|line| {
            if line.trim().is_empty() {
                ""
            } else {
                line.strip_prefix(prefix).unwrap_or(line)
            }
        })
        .collect();

    join_trimmed(&stripped)
}

/// Alternate normalization: drop ALL leading whitespace on every line.
pub fn strip_all_indent(code: &str) -> String {
    let stripped: Vec<&str> = code.lines().map(str::trim_start).collect();
    join_trimmed(&stripped)
}

fn common_prefix<'a>(a: &'a str, b: &str) -> &'a str {
    let mut end = 0;
    for (ca, cb) in a.chars().zip(b.chars()) {
        if ca != cb {
            break;
        }
        end += ca.len_utf8();
    }
    &a[..end]
}

fn join_trimmed(lines: &[&str]) -> String {
    let start = lines.iter().position(|l| !l.trim().is_empty());
    let end = lines.iter().rposition(|l| !l.trim().is_empty());
    match (start, end) {
        (Some(start), Some(end)) => lines[start..=end].join("\n"),
        _ => String::new(),
    }
}
