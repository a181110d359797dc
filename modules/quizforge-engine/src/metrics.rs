//! Multi-axis candidate scoring. Oracles are injected at construction so the
//! engine runs against deterministic doubles in tests.

use std::sync::Arc;

use anyhow::Result;
use regex::Regex;
use std::sync::LazyLock;

use oracle_client::traits::{SimilarityOracle, TokenClassifier};
use quizforge_common::{
    MarkupMetrics, MetricSet, SemanticMetrics, SimilarityBucket, SnippetMetrics, StructureMetrics,
};

use crate::{markup, snippet};

static CLASS_NAME_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bclass\s+(\w+)").unwrap());
static METHOD_NAME_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bdef\s+(\w+)").unwrap());
static ATTRIBUTE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"self\.\w+").unwrap());
static ALTERNATIVES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\\item|alternatives:").unwrap());

/// Minimum text length for the has-statement flag.
const STATEMENT_MIN_CHARS: usize = 100;

pub struct MetricsEngine {
    similarity: Option<Arc<dyn SimilarityOracle>>,
    tokens: Arc<dyn TokenClassifier>,
}

impl MetricsEngine {
    pub fn new(
        similarity: Option<Arc<dyn SimilarityOracle>>,
        tokens: Arc<dyn TokenClassifier>,
    ) -> Self {
        Self { similarity, tokens }
    }

    /// Compute the full MetricSet for one candidate. The semantic axis is
    /// omitted entirely (not scored as zero) when no similarity oracle is
    /// configured, keeping scores comparable across configurations.
    pub async fn evaluate(&self, original: &str, candidate: &str) -> Result<MetricSet> {
        let semantic = match &self.similarity {
            Some(oracle) => {
                let similarity = oracle.similarity(original, candidate).await?;
                Some(self.semantic_axis(similarity, original, candidate))
            }
            None => None,
        };

        let markup = markup::scan(candidate);
        let snippet = snippet::scan(candidate)?;
        let structure = structure_axis(candidate);
        let score = aggregate_score(semantic.as_ref(), &markup, &snippet, &structure);

        Ok(MetricSet {
            semantic,
            markup,
            snippet,
            structure,
            score,
        })
    }

    fn semantic_axis(&self, similarity: f64, original: &str, candidate: &str) -> SemanticMetrics {
        let significant_tokens_original = self.tokens.significant_token_count(original);
        let significant_tokens_candidate = self.tokens.significant_token_count(candidate);
        let token_ratio = if significant_tokens_original > 0 {
            round2(significant_tokens_candidate as f64 / significant_tokens_original as f64)
        } else {
            0.0
        };

        SemanticMetrics {
            similarity,
            bucket: SimilarityBucket::from_similarity(similarity),
            significant_tokens_original,
            significant_tokens_candidate,
            token_ratio,
        }
    }
}

/// Structural feature flags plus the declared names, captured verbatim.
pub fn structure_axis(text: &str) -> StructureMetrics {
    let class_names: Vec<String> = CLASS_NAME_RE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect();
    let method_names: Vec<String> = METHOD_NAME_RE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect();

    StructureMetrics {
        has_class: !class_names.is_empty(),
        has_methods: !method_names.is_empty(),
        has_attributes: ATTRIBUTE_RE.is_match(text),
        has_alternatives: ALTERNATIVES_RE.is_match(text),
        has_statement: text.chars().count() > STATEMENT_MIN_CHARS,
        text_len: text.chars().count(),
        line_count: text.lines().count(),
        class_names,
        method_names,
    }
}

/// Semantic-axis points for a similarity value. Pure and total over [0, 1]:
/// the [0.4, 0.7] sweet spot earns 3, the adjacent bands 2, everything else 1.
pub fn semantic_points(similarity: f64) -> f64 {
    if (0.4..=0.7).contains(&similarity) {
        3.0
    } else if (0.3..0.4).contains(&similarity) || (similarity > 0.7 && similarity <= 0.8) {
        2.0
    } else {
        1.0
    }
}

/// Weighted aggregate normalized to [0, 10]. Only computable axes contribute
/// to the denominator.
pub fn aggregate_score(
    semantic: Option<&SemanticMetrics>,
    markup: &MarkupMetrics,
    snippet: &SnippetMetrics,
    structure: &StructureMetrics,
) -> f64 {
    let mut points = 0.0;
    let mut max_points = 0.0;

    if let Some(sem) = semantic {
        points += semantic_points(sem.similarity);
        max_points += 3.0;
    }

    if markup.valid {
        points += 2.0;
    }
    max_points += 2.0;

    if snippet.ok {
        points += 3.0;
    }
    max_points += 3.0;

    for flag in [
        structure.has_class,
        structure.has_methods,
        structure.has_attributes,
        structure.has_alternatives,
    ] {
        if flag {
            points += 0.5;
        }
    }
    max_points += 2.0;

    if max_points == 0.0 {
        return 0.0;
    }
    round2(points / max_points * 10.0)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
