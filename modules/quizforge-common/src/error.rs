use thiserror::Error;

#[derive(Error, Debug)]
pub enum QuizforgeError {
    /// Fragment marker missing, or both normalization attempts failed to execute.
    #[error("extraction error: {0}")]
    Extraction(String),

    #[error("fragment execution timed out after {seconds}s")]
    SandboxTimeout { seconds: u64 },

    #[error("oracle rate limited: {0}")]
    RateLimited(String),

    #[error("oracle error: {0}")]
    Oracle(String),

    #[error("no structurally valid candidate after {attempts} attempts")]
    SelectionExhausted { attempts: u32 },

    #[error("render error: {0}")]
    Render(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl QuizforgeError {
    /// Whether a round-level retry should apply the rate-limit backoff delay.
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, QuizforgeError::RateLimited(_))
    }
}

/// Classify an upstream oracle failure message. Providers signal throttling
/// inconsistently; the original Groq path surfaced "rate_limit" in the body.
pub fn looks_rate_limited(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("rate_limit") || lower.contains("rate limit") || lower.contains("429")
}
