//! Evaluation report rendering. One `EvaluationReport` value backs both the
//! JSON form and the fixed-section human-readable form.

use anyhow::Result;
use chrono::Utc;

use quizforge_common::{Candidate, EvaluationReport, MetricSet};

const RULE: &str =
    "================================================================================";
const SECTION_RULE: &str =
    "--------------------------------------------------------------------------------";

fn glyph(ok: bool) -> &'static str {
    if ok {
        "✓"
    } else {
        "✗"
    }
}

/// Build the terminal record for a selected candidate.
pub fn build(winner: &Candidate) -> EvaluationReport {
    EvaluationReport {
        timestamp: Utc::now(),
        score: winner.score,
        metrics: winner.metrics.clone(),
        selected_candidate: winner.name.clone(),
    }
}

pub fn to_json(report: &EvaluationReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// Fixed-section technical report with ✓/✗ glyphs per boolean check.
pub fn to_text(report: &EvaluationReport) -> String {
    let mut out = Vec::new();
    out.push(RULE.to_string());
    out.push("QUESTION EVALUATION REPORT".to_string());
    out.push(RULE.to_string());
    out.push(format!(
        "Timestamp: {}",
        report.timestamp.format("%Y-%m-%d %H:%M:%S")
    ));
    out.push(format!("Selected candidate: {}", report.selected_candidate));
    out.push(format!("Overall score: {}/10", report.score));
    out.push(String::new());

    render_metrics(&mut out, &report.metrics);

    out.push(RULE.to_string());
    out.join("\n")
}

fn render_metrics(out: &mut Vec<String>, metrics: &MetricSet) {
    out.push(SECTION_RULE.to_string());
    out.push("1. SEMANTIC ANALYSIS".to_string());
    out.push(SECTION_RULE.to_string());
    match &metrics.semantic {
        Some(semantic) => {
            out.push(format!("  Semantic similarity: {:.4}", semantic.similarity));
            out.push(format!("  Interpretation: {}", semantic.bucket.label()));
            out.push(format!(
                "  Significant tokens (original): {}",
                semantic.significant_tokens_original
            ));
            out.push(format!(
                "  Significant tokens (candidate): {}",
                semantic.significant_tokens_candidate
            ));
            out.push(format!("  Token ratio: {}", semantic.token_ratio));
        }
        None => out.push("  (no similarity oracle configured, axis skipped)".to_string()),
    }
    out.push(String::new());

    out.push(SECTION_RULE.to_string());
    out.push("2. MARKUP VALIDATION".to_string());
    out.push(SECTION_RULE.to_string());
    out.push(format!("  Markup valid: {}", glyph(metrics.markup.valid)));
    out.push(format!(
        "  Balanced blocks: {}",
        glyph(metrics.markup.balanced)
    ));
    out.push(format!(
        "  Total markup constructs: {}",
        metrics.markup.total_constructs
    ));
    out.push(String::new());

    out.push(SECTION_RULE.to_string());
    out.push("3. CODE SNIPPET VALIDATION".to_string());
    out.push(SECTION_RULE.to_string());
    out.push(format!("  Snippets OK: {}", glyph(metrics.snippet.ok)));
    out.push(format!("  Code blocks: {}", metrics.snippet.blocks_found));
    out.push(format!("  Valid: {}", metrics.snippet.valid_blocks));
    out.push(format!("  Invalid: {}", metrics.snippet.invalid_blocks));
    if !metrics.snippet.issues.is_empty() {
        out.push("  Syntax errors:".to_string());
        for issue in &metrics.snippet.issues {
            let line = issue
                .line
                .map(|l| format!(" (line {l})"))
                .unwrap_or_default();
            out.push(format!(
                "    - block {}: {}{}",
                issue.block, issue.message, line
            ));
        }
    }
    out.push(String::new());

    out.push(SECTION_RULE.to_string());
    out.push("4. STRUCTURAL ANALYSIS".to_string());
    out.push(SECTION_RULE.to_string());
    out.push(format!("  Has class: {}", glyph(metrics.structure.has_class)));
    out.push(format!(
        "  Has methods: {}",
        glyph(metrics.structure.has_methods)
    ));
    out.push(format!(
        "  Has attributes: {}",
        glyph(metrics.structure.has_attributes)
    ));
    out.push(format!(
        "  Has alternatives: {}",
        glyph(metrics.structure.has_alternatives)
    ));
    out.push(format!(
        "  Classes found: {}",
        metrics.structure.class_names.len()
    ));
    out.push(format!(
        "  Methods found: {}",
        metrics.structure.method_names.len()
    ));
    out.push(String::new());
}

#[cfg(test)]
mod tests {
    use super::*;
    use quizforge_common::{
        MarkupMetrics, SemanticMetrics, SimilarityBucket, SnippetMetrics, StructureMetrics,
        SyntaxIssue,
    };

    fn sample_metrics() -> MetricSet {
        MetricSet {
            semantic: Some(SemanticMetrics {
                similarity: 0.6234,
                bucket: SimilarityBucket::Similar,
                significant_tokens_original: 120,
                significant_tokens_candidate: 110,
                token_ratio: 0.92,
            }),
            markup: MarkupMetrics {
                verbatim_blocks: 2,
                enumerate_blocks: 0,
                bold_spans: 3,
                inline_code_spans: 1,
                list_items: 4,
                begin_directives: 3,
                end_directives: 3,
                balanced: true,
                total_constructs: 10,
                valid: true,
            },
            snippet: SnippetMetrics {
                blocks_found: 2,
                valid_blocks: 1,
                invalid_blocks: 1,
                issues: vec![SyntaxIssue {
                    block: 2,
                    line: Some(3),
                    message: "invalid syntax".to_string(),
                }],
                ok: false,
            },
            structure: StructureMetrics {
                has_class: true,
                has_methods: true,
                has_attributes: true,
                has_alternatives: false,
                has_statement: true,
                text_len: 900,
                line_count: 40,
                class_names: vec!["Student".to_string()],
                method_names: vec!["get_name".to_string()],
            },
            score: 6.5,
        }
    }

    fn sample_candidate() -> Candidate {
        Candidate {
            name: "llama".to_string(),
            raw_text: "...".to_string(),
            similarity: 0.6234,
            structurally_valid: true,
            metrics: sample_metrics(),
            score: 6.5,
        }
    }

    #[test]
    fn text_report_carries_every_section_and_glyphs() {
        let report = build(&sample_candidate());
        let text = to_text(&report);
        assert!(text.contains("1. SEMANTIC ANALYSIS"));
        assert!(text.contains("2. MARKUP VALIDATION"));
        assert!(text.contains("3. CODE SNIPPET VALIDATION"));
        assert!(text.contains("4. STRUCTURAL ANALYSIS"));
        assert!(text.contains("Markup valid: ✓"));
        assert!(text.contains("Snippets OK: ✗"));
        assert!(text.contains("block 2: invalid syntax (line 3)"));
        assert!(text.contains("Overall score: 6.5/10"));
    }

    #[test]
    fn json_form_round_trips_the_same_value() {
        let report = build(&sample_candidate());
        let json = to_json(&report).unwrap();
        let parsed: EvaluationReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.score, report.score);
        assert_eq!(parsed.selected_candidate, report.selected_candidate);
        assert_eq!(parsed.metrics, report.metrics);
    }

    #[test]
    fn skipped_semantic_axis_is_stated_in_text() {
        let mut candidate = sample_candidate();
        candidate.metrics.semantic = None;
        let text = to_text(&build(&candidate));
        assert!(text.contains("axis skipped"));
    }
}
