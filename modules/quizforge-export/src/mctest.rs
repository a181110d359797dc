//! Structured export record for the MCTest import format: a JSON array with
//! exactly one element per invocation.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use quizforge_common::{artifact, QuestionKind};

pub const DEFAULT_SHORT_DESC: &str = "New OOP Question";
const DEFAULT_DIFFICULTY: &str = "3";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McTestRecord {
    pub topic_text: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub difficulty: String,
    pub group: String,
    pub short_desc: String,
    pub text: String,
    pub parametric: String,
}

/// Build the record: short description from the first bold span (with a
/// fixed fallback), body with the fragment marker block removed.
pub fn build_record(text: &str, kind: QuestionKind, topic: &str) -> McTestRecord {
    let short_desc =
        artifact::first_bold_span(text).unwrap_or_else(|| DEFAULT_SHORT_DESC.to_string());

    McTestRecord {
        topic_text: topic.to_string(),
        kind: kind.export_code().to_string(),
        difficulty: DEFAULT_DIFFICULTY.to_string(),
        group: String::new(),
        short_desc,
        text: artifact::strip_fragment_block(text),
        parametric: "no".to_string(),
    }
}

pub fn write(record: &McTestRecord, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(&[record])?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write MCTest export to {}", path.display()))?;
    info!(path = %path.display(), "MCTest export written");
    Ok(())
}
