use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// --- Question Kinds ---

/// The two artifact shapes the pipeline understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    /// Free-code question. Carries an executable fragment and a worked example.
    Open,
    /// Multiple-choice question. Has an alternatives block, no test vectors.
    MultipleChoice,
}

impl QuestionKind {
    /// Detect the kind from artifact text: an enumerate block means alternatives.
    pub fn detect(text: &str) -> Self {
        if text.contains(r"\begin{enumerate}") {
            QuestionKind::MultipleChoice
        } else {
            QuestionKind::Open
        }
    }

    /// Two-letter code used by the structured export record.
    pub fn export_code(&self) -> &'static str {
        match self {
            QuestionKind::Open => "QT",
            QuestionKind::MultipleChoice => "QM",
        }
    }
}

impl std::fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuestionKind::Open => write!(f, "open"),
            QuestionKind::MultipleChoice => write!(f, "multiple_choice"),
        }
    }
}

// --- Selection ---

/// How a round ranks its structurally valid candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// Highest similarity to the original wins.
    MostSimilar,
    /// Lowest similarity to the original wins.
    MostDifferent,
}

impl std::str::FromStr for SelectionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "most_similar" => Ok(SelectionPolicy::MostSimilar),
            "most_different" => Ok(SelectionPolicy::MostDifferent),
            other => Err(format!(
                "unknown selection policy '{other}' (expected most_similar or most_different)"
            )),
        }
    }
}

impl std::fmt::Display for SelectionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SelectionPolicy::MostSimilar => write!(f, "most_similar"),
            SelectionPolicy::MostDifferent => write!(f, "most_different"),
        }
    }
}

// --- Metric Axes ---

/// Band a similarity score falls into. Thresholds are fixed; see `from_similarity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityBucket {
    TooSimilar,
    Similar,
    Moderate,
    Low,
    VeryDifferent,
}

impl SimilarityBucket {
    pub fn from_similarity(sim: f64) -> Self {
        if sim > 0.8 {
            SimilarityBucket::TooSimilar
        } else if sim > 0.6 {
            SimilarityBucket::Similar
        } else if sim > 0.4 {
            SimilarityBucket::Moderate
        } else if sim > 0.2 {
            SimilarityBucket::Low
        } else {
            SimilarityBucket::VeryDifferent
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SimilarityBucket::TooSimilar => {
                "too similar (possible copy of the original, please review the output)"
            }
            SimilarityBucket::Similar => "similar (good variation)",
            SimilarityBucket::Moderate => "moderately similar",
            SimilarityBucket::Low => "low similarity",
            SimilarityBucket::VeryDifferent => "very different",
        }
    }
}

/// Semantic axis: one similarity-oracle call plus token-level signals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticMetrics {
    pub similarity: f64,
    pub bucket: SimilarityBucket,
    pub significant_tokens_original: usize,
    pub significant_tokens_candidate: usize,
    /// Candidate significant tokens over original's; 0 when the original has none.
    pub token_ratio: f64,
}

/// Markup axis: recognized construct counts and directive balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkupMetrics {
    pub verbatim_blocks: usize,
    pub enumerate_blocks: usize,
    pub bold_spans: usize,
    pub inline_code_spans: usize,
    pub list_items: usize,
    pub begin_directives: usize,
    pub end_directives: usize,
    pub balanced: bool,
    pub total_constructs: usize,
    /// Balanced directives AND at least one recognized construct.
    pub valid: bool,
}

/// One syntax failure inside a verbatim code block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntaxIssue {
    /// 1-based index of the code block within the artifact.
    pub block: usize,
    /// 1-based line within the block, when the parser could locate it.
    pub line: Option<usize>,
    pub message: String,
}

/// Snippet axis: every verbatim block parsed as Python.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnippetMetrics {
    pub blocks_found: usize,
    pub valid_blocks: usize,
    pub invalid_blocks: usize,
    pub issues: Vec<SyntaxIssue>,
    /// At least one block found and none failed to parse.
    pub ok: bool,
}

/// Structural axis: declaration-level feature flags plus raw counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureMetrics {
    pub has_class: bool,
    pub has_methods: bool,
    pub has_attributes: bool,
    pub has_alternatives: bool,
    /// Text long enough to plausibly hold a problem statement.
    pub has_statement: bool,
    pub text_len: usize,
    pub line_count: usize,
    pub class_names: Vec<String>,
    pub method_names: Vec<String>,
}

/// Everything the metrics engine measured for one candidate. Built once,
/// never mutated afterward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSet {
    /// Absent when no similarity oracle is configured. The axis then drops
    /// out of both numerator and denominator of the score.
    pub semantic: Option<SemanticMetrics>,
    pub markup: MarkupMetrics,
    pub snippet: SnippetMetrics,
    pub structure: StructureMetrics,
    /// Weighted aggregate in [0, 10], rounded to 2 decimals.
    pub score: f64,
}

// --- Candidates ---

/// One generated artifact under evaluation. Immutable after scoring; only
/// the round winner survives into export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub name: String,
    pub raw_text: String,
    /// 0.0 when no similarity oracle is configured.
    pub similarity: f64,
    pub structurally_valid: bool,
    pub metrics: MetricSet,
    pub score: f64,
}

// --- Extraction ---

/// The two named output collections retrieved from the executed fragment's
/// namespace, stringified element-wise. The rest of the namespace is
/// discarded after retrieval.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionContext {
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
}

impl ExtractionContext {
    /// Both collections nonempty and index-aligned.
    pub fn is_valid(&self) -> bool {
        !self.inputs.is_empty() && self.inputs.len() == self.outputs.len()
    }

    pub fn vector_pairs(&self) -> Vec<VectorPair> {
        self.inputs
            .iter()
            .zip(self.outputs.iter())
            .map(|(input, output)| VectorPair {
                input: input.clone(),
                output: output.clone(),
            })
            .collect()
    }
}

/// One (input, expected-output) record derived from fragment execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorPair {
    pub input: String,
    pub output: String,
}

// --- Class Descriptors ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Public,
    Private,
}

impl Visibility {
    /// Leading-underscore naming convention.
    pub fn of(name: &str) -> Self {
        if name.starts_with('_') {
            Visibility::Private
        } else {
            Visibility::Public
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMember {
    pub name: String,
    pub visibility: Visibility,
}

impl ClassMember {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let visibility = Visibility::of(&name);
        Self { name, visibility }
    }
}

/// One declared type, derived by scanning declaration boundaries in the
/// artifact text. Attributes and methods are deduplicated preserving
/// first-seen order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDescriptor {
    pub name: String,
    pub parent: Option<String>,
    pub attributes: Vec<ClassMember>,
    pub methods: Vec<ClassMember>,
}

// --- Reports ---

/// Terminal, persisted record of a round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub timestamp: DateTime<Utc>,
    pub score: f64,
    pub metrics: MetricSet,
    pub selected_candidate: String,
}

/// Per-candidate entry in the round log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub model: String,
    pub similarity: f64,
    pub valid: bool,
    pub score: f64,
    pub metrics: MetricSet,
    pub output: String,
}

/// Full audit record of one generate-evaluate-select cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundLog {
    pub round_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub original_question: String,
    pub selected_candidate: Option<String>,
    pub models_evaluated: usize,
    pub results: Vec<CandidateRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_detection_flags_enumerate_blocks() {
        let mc = r"Pick one:\begin{enumerate}\item a\item b\end{enumerate}";
        assert_eq!(QuestionKind::detect(mc), QuestionKind::MultipleChoice);
        assert_eq!(QuestionKind::detect("write a class"), QuestionKind::Open);
        assert_eq!(QuestionKind::MultipleChoice.export_code(), "QM");
        assert_eq!(QuestionKind::Open.export_code(), "QT");
    }

    #[test]
    fn bucket_thresholds_match_fixed_bands() {
        assert_eq!(
            SimilarityBucket::from_similarity(0.95),
            SimilarityBucket::TooSimilar
        );
        assert_eq!(
            SimilarityBucket::from_similarity(0.8),
            SimilarityBucket::Similar
        );
        assert_eq!(
            SimilarityBucket::from_similarity(0.61),
            SimilarityBucket::Similar
        );
        assert_eq!(
            SimilarityBucket::from_similarity(0.6),
            SimilarityBucket::Moderate
        );
        assert_eq!(
            SimilarityBucket::from_similarity(0.41),
            SimilarityBucket::Moderate
        );
        assert_eq!(SimilarityBucket::from_similarity(0.4), SimilarityBucket::Low);
        assert_eq!(
            SimilarityBucket::from_similarity(0.21),
            SimilarityBucket::Low
        );
        assert_eq!(
            SimilarityBucket::from_similarity(0.2),
            SimilarityBucket::VeryDifferent
        );
        assert_eq!(
            SimilarityBucket::from_similarity(0.0),
            SimilarityBucket::VeryDifferent
        );
    }

    #[test]
    fn extraction_context_validity_requires_aligned_nonempty_lists() {
        let empty = ExtractionContext::default();
        assert!(!empty.is_valid());

        let misaligned = ExtractionContext {
            inputs: vec!["a".into(), "b".into()],
            outputs: vec!["x".into()],
        };
        assert!(!misaligned.is_valid());

        let ok = ExtractionContext {
            inputs: vec!["a".into()],
            outputs: vec!["x".into()],
        };
        assert!(ok.is_valid());
        assert_eq!(
            ok.vector_pairs(),
            vec![VectorPair {
                input: "a".into(),
                output: "x".into()
            }]
        );
    }

    #[test]
    fn visibility_follows_leading_underscore() {
        assert_eq!(Visibility::of("name"), Visibility::Public);
        assert_eq!(Visibility::of("_name"), Visibility::Private);
        assert_eq!(Visibility::of("__name"), Visibility::Private);
    }

    #[test]
    fn selection_policy_parses_both_modes() {
        assert_eq!(
            "most_similar".parse::<SelectionPolicy>().unwrap(),
            SelectionPolicy::MostSimilar
        );
        assert_eq!(
            "most_different".parse::<SelectionPolicy>().unwrap(),
            SelectionPolicy::MostDifferent
        );
        assert!("best".parse::<SelectionPolicy>().is_err());
    }
}
