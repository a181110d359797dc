//! Round persistence: one JSON audit record per round plus a detailed
//! per-candidate text report.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use quizforge_common::{Candidate, CandidateRecord, EvaluationReport, RoundLog};

use crate::report;

/// Assemble the audit record for a finished round. `winner` is None when the
/// round exhausted its attempts.
pub fn build(original: &str, candidates: &[Candidate], winner: Option<&str>) -> RoundLog {
    RoundLog {
        round_id: Uuid::new_v4(),
        timestamp: Utc::now(),
        original_question: original.to_string(),
        selected_candidate: winner.map(str::to_string),
        models_evaluated: candidates.len(),
        results: candidates
            .iter()
            .map(|c| CandidateRecord {
                model: c.name.clone(),
                similarity: c.similarity,
                valid: c.structurally_valid,
                score: c.score,
                metrics: c.metrics.clone(),
                output: c.raw_text.clone(),
            })
            .collect(),
    }
}

pub fn write_json(log: &RoundLog, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(log)?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write round log to {}", path.display()))?;
    info!(path = %path.display(), "Round log saved");
    Ok(())
}

/// One full evaluation report per candidate, concatenated, followed by the
/// candidate's raw output.
pub fn write_detailed_report(candidates: &[Candidate], path: &Path) -> Result<()> {
    let mut out = String::new();
    for candidate in candidates {
        let report = EvaluationReport {
            timestamp: Utc::now(),
            score: candidate.score,
            metrics: candidate.metrics.clone(),
            selected_candidate: candidate.name.clone(),
        };
        out.push_str(&report::to_text(&report));
        out.push_str("\n\nGENERATED QUESTION:\n");
        out.push_str(&"-".repeat(80));
        out.push('\n');
        out.push_str(&candidate.raw_text);
        out.push_str("\n\n");
    }
    std::fs::write(path, out)
        .with_context(|| format!("Failed to write detailed report to {}", path.display()))?;
    info!(path = %path.display(), "Detailed report saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use quizforge_common::{
        MarkupMetrics, MetricSet, SnippetMetrics, StructureMetrics,
    };

    fn candidate(name: &str, score: f64) -> Candidate {
        Candidate {
            name: name.to_string(),
            raw_text: format!("{name} output"),
            similarity: 0.5,
            structurally_valid: true,
            score,
            metrics: MetricSet {
                semantic: None,
                markup: MarkupMetrics {
                    verbatim_blocks: 0,
                    enumerate_blocks: 0,
                    bold_spans: 0,
                    inline_code_spans: 0,
                    list_items: 0,
                    begin_directives: 0,
                    end_directives: 0,
                    balanced: true,
                    total_constructs: 0,
                    valid: false,
                },
                snippet: SnippetMetrics {
                    blocks_found: 0,
                    valid_blocks: 0,
                    invalid_blocks: 0,
                    issues: vec![],
                    ok: false,
                },
                structure: StructureMetrics {
                    has_class: true,
                    has_methods: false,
                    has_attributes: false,
                    has_alternatives: false,
                    has_statement: true,
                    text_len: 200,
                    line_count: 10,
                    class_names: vec!["A".to_string()],
                    method_names: vec![],
                },
                score,
            },
        }
    }

    #[test]
    fn round_log_records_every_candidate() {
        let candidates = vec![candidate("llama", 5.0), candidate("gpt", 7.0)];
        let log = build("original text", &candidates, Some("gpt"));
        assert_eq!(log.models_evaluated, 2);
        assert_eq!(log.selected_candidate.as_deref(), Some("gpt"));
        assert_eq!(log.results[1].model, "gpt");
        assert_eq!(log.results[1].score, 7.0);
    }

    #[test]
    fn files_are_written_where_asked() {
        let dir = tempfile::tempdir().unwrap();
        let candidates = vec![candidate("llama", 5.0)];
        let log = build("original", &candidates, Some("llama"));

        let json_path = dir.path().join("generation_results.json");
        write_json(&log, &json_path).unwrap();
        let raw = std::fs::read_to_string(&json_path).unwrap();
        let parsed: RoundLog = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed.models_evaluated, 1);

        let report_path = dir.path().join("evaluation_report.txt");
        write_detailed_report(&candidates, &report_path).unwrap();
        let text = std::fs::read_to_string(&report_path).unwrap();
        assert!(text.contains("GENERATED QUESTION:"));
        assert!(text.contains("llama output"));
    }
}
