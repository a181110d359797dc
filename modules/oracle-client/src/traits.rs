use anyhow::Result;
use async_trait::async_trait;

// =============================================================================
// Oracle Traits
// =============================================================================
//
// The core treats every external collaborator as a narrow function behind a
// dyn-compatible trait, so selectors and metrics engines take test doubles
// in unit tests and real HTTP clients in production.

/// Produces one raw candidate document from a prompt.
#[async_trait]
pub trait GenerationOracle: Send + Sync {
    async fn generate(&self, model: &str, prompt: &str) -> Result<String>;
}

/// Maps two texts to a similarity score in [0, 1].
#[async_trait]
pub trait SimilarityOracle: Send + Sync {
    async fn similarity(&self, a: &str, b: &str) -> Result<f64>;
}

/// Counts tokens that carry meaning (stopwords and punctuation excluded).
/// Linguistic classification is an oracle concern, never re-derived in core.
pub trait TokenClassifier: Send + Sync {
    fn significant_token_count(&self, text: &str) -> usize;
}
