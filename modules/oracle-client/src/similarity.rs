use anyhow::Result;
use async_trait::async_trait;

use crate::openai::OpenAiCompat;
use crate::traits::SimilarityOracle;

/// Similarity oracle backed by an embeddings endpoint: embed both texts,
/// compare with cosine similarity.
pub struct EmbeddingSimilarity {
    client: OpenAiCompat,
    model: String,
}

impl EmbeddingSimilarity {
    pub fn new(api_key: &str, base_url: &str, model: &str) -> Self {
        Self {
            client: OpenAiCompat::new(api_key).with_base_url(base_url),
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl SimilarityOracle for EmbeddingSimilarity {
    async fn similarity(&self, a: &str, b: &str) -> Result<f64> {
        let emb_a = self.client.embed(&self.model, a).await?;
        let emb_b = self.client.embed(&self.model, b).await?;
        Ok(cosine(&emb_a, &emb_b))
    }
}

/// Cosine similarity clamped to [0, 1]. Anticorrelated embeddings count as
/// "not similar at all" rather than going negative.
pub fn cosine(a: &[f32], b: &[f32]) -> f64 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }
    let mut dot = 0.0_f64;
    let mut norm_a = 0.0_f64;
    let mut norm_b = 0.0_f64;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += f64::from(*x) * f64::from(*y);
        norm_a += f64::from(*x) * f64::from(*x);
        norm_b += f64::from(*y) * f64::from(*y);
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_vectors_score_one() {
        let v = vec![0.5, -0.25, 1.0];
        assert!((cosine(&v, &v) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn orthogonal_vectors_score_zero() {
        assert_eq!(cosine(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
    }

    #[test]
    fn anticorrelated_vectors_clamp_to_zero() {
        assert_eq!(cosine(&[1.0, 0.0], &[-1.0, 0.0]), 0.0);
    }

    #[test]
    fn degenerate_inputs_score_zero() {
        assert_eq!(cosine(&[], &[]), 0.0);
        assert_eq!(cosine(&[1.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
    }
}
