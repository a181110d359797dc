//! Renders every derived artifact for one round winner. Writes are
//! synchronous and local; exactly one winner exists per round, so
//! last-writer-wins on a shared destination is acceptable.

use std::path::PathBuf;

use anyhow::Result;
use tracing::info;

use quizforge_common::{ExtractionContext, QuestionKind};

use crate::{diagram, mctest, typeset, vpl};

pub const MCTEST_FILE: &str = "mctest_import.json";
pub const CASES_FILE: &str = "question.cases";
pub const DIAGRAM_FILE: &str = "class_diagram.dot";
pub const DOCUMENT_FILE: &str = "question.tex";

#[derive(Debug)]
pub struct RenderSummary {
    pub mctest_path: PathBuf,
    pub cases: vpl::VplOutcome,
    pub diagram_path: Option<PathBuf>,
    pub document_path: PathBuf,
}

pub struct ArtifactRenderer {
    out_dir: PathBuf,
    topic: String,
}

impl ArtifactRenderer {
    pub fn new(out_dir: impl Into<PathBuf>, topic: impl Into<String>) -> Self {
        Self {
            out_dir: out_dir.into(),
            topic: topic.into(),
        }
    }

    /// Produce all four derived artifacts from the winning text and the
    /// (possibly absent) extraction context. Vector export degrades to a
    /// skip on a missing context; document rendering always proceeds.
    pub fn render(
        &self,
        winner_text: &str,
        kind: QuestionKind,
        context: Option<&ExtractionContext>,
    ) -> Result<RenderSummary> {
        std::fs::create_dir_all(&self.out_dir)?;

        let mctest_path = self.path_of(MCTEST_FILE);
        let record = mctest::build_record(winner_text, kind, &self.topic);
        mctest::write(&record, &mctest_path)?;

        let cases = vpl::export(context, kind, &self.path_of(CASES_FILE))?;

        let diagram_path = match diagram::scan(winner_text) {
            Some(class_diagram) => {
                let path = self.path_of(DIAGRAM_FILE);
                std::fs::write(&path, diagram::to_dot(&class_diagram))?;
                info!(path = %path.display(), classes = class_diagram.classes.len(), "Diagram written");
                Some(path)
            }
            None => {
                info!("No type declarations found, skipping diagram");
                None
            }
        };

        let document_path = self.path_of(DOCUMENT_FILE);
        let document = typeset::render_document(winner_text, kind, context);
        typeset::write_document(&document, &document_path)?;

        Ok(RenderSummary {
            mctest_path,
            cases,
            diagram_path,
            document_path,
        })
    }

    fn path_of(&self, file: &str) -> PathBuf {
        self.out_dir.join(file)
    }
}

impl RenderSummary {
    pub fn describe(&self) -> String {
        let cases = match self.cases {
            vpl::VplOutcome::Written(n) => format!("{n} cases"),
            vpl::VplOutcome::Removed => "removed (multiple choice)".to_string(),
            vpl::VplOutcome::Skipped => "skipped".to_string(),
        };
        format!(
            "mctest: {} | cases: {} | diagram: {} | document: {}",
            self.mctest_path.display(),
            cases,
            self.diagram_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "none".to_string()),
            self.document_path.display()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    const WINNER: &str = r"\textbf{Vehicle Class} build the class below.

\begin{verbatim}
class Vehicle:
    def __init__(self, plate):
        self.plate = plate
\end{verbatim}

[[def:
inp_list = ['v1']
out_list = ['ok']
]]";

    fn path_exists(path: &Path) -> bool {
        path.exists()
    }

    #[test]
    fn full_render_produces_all_four_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = ArtifactRenderer::new(dir.path(), "01 - Topic");
        let context = ExtractionContext {
            inputs: vec!["v1".to_string()],
            outputs: vec!["ok".to_string()],
        };

        let summary = renderer
            .render(WINNER, QuestionKind::Open, Some(&context))
            .unwrap();

        assert!(path_exists(&summary.mctest_path));
        assert_eq!(summary.cases, vpl::VplOutcome::Written(1));
        assert!(path_exists(summary.diagram_path.as_ref().unwrap()));
        assert!(path_exists(&summary.document_path));

        let document = std::fs::read_to_string(&summary.document_path).unwrap();
        assert!(!document.contains("[[def:"));
        assert!(document.contains("Example Input"));
    }

    #[test]
    fn missing_context_still_renders_the_document() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = ArtifactRenderer::new(dir.path(), "01 - Topic");

        let summary = renderer.render(WINNER, QuestionKind::Open, None).unwrap();

        assert_eq!(summary.cases, vpl::VplOutcome::Skipped);
        assert!(path_exists(&summary.document_path));
        let document = std::fs::read_to_string(&summary.document_path).unwrap();
        assert!(!document.contains("Example Input"));
    }

    #[test]
    fn prose_only_winner_gets_no_diagram() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = ArtifactRenderer::new(dir.path(), "t");
        let summary = renderer
            .render(
                r"\textbf{T} a prose question about classes and attributes",
                QuestionKind::MultipleChoice,
                None,
            )
            .unwrap();
        assert!(summary.diagram_path.is_none());
        assert_eq!(summary.cases, vpl::VplOutcome::Removed);
    }
}
