use std::env;
use std::path::PathBuf;

use tracing::info;

use crate::types::SelectionPolicy;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Generation oracle (OpenAI-compatible API)
    pub oracle_api_key: String,
    pub oracle_base_url: String,
    /// `name=model_id` pairs, one candidate generated per entry and round.
    pub generation_targets: Vec<(String, String)>,

    // Similarity oracle (embeddings). Absent key disables the semantic axis.
    pub embed_api_key: Option<String>,
    pub embed_base_url: String,
    pub embedding_model: String,

    // Selection
    pub pick_mode: SelectionPolicy,
    pub max_round_attempts: u32,

    // Sandbox
    pub python_bin: String,
    pub sandbox_timeout_secs: u64,

    // Export
    pub out_dir: PathBuf,
    pub topic: String,
}

const DEFAULT_ORACLE_BASE_URL: &str = "https://api.groq.com/openai/v1";
const DEFAULT_EMBED_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
const DEFAULT_GENERATION_TARGETS: &str =
    "llama=llama-3.1-8b-instant,gpt=openai/gpt-oss-20b,kimi=moonshotai/kimi-k2-instruct-0905";

impl Config {
    /// Load configuration from environment variables.
    /// Panics with a clear message if required vars are missing.
    pub fn from_env() -> Self {
        Self {
            oracle_api_key: required_env("ORACLE_API_KEY"),
            oracle_base_url: env::var("ORACLE_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_ORACLE_BASE_URL.to_string()),
            generation_targets: parse_targets(
                &env::var("GENERATION_TARGETS")
                    .unwrap_or_else(|_| DEFAULT_GENERATION_TARGETS.to_string()),
            ),
            embed_api_key: env::var("EMBED_API_KEY").ok().filter(|k| !k.is_empty()),
            embed_base_url: env::var("EMBED_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_EMBED_BASE_URL.to_string()),
            embedding_model: env::var("EMBEDDING_MODEL")
                .unwrap_or_else(|_| DEFAULT_EMBEDDING_MODEL.to_string()),
            pick_mode: env::var("PICK_MODE")
                .unwrap_or_else(|_| "most_similar".to_string())
                .parse()
                .expect("PICK_MODE must be most_similar or most_different"),
            max_round_attempts: env::var("MAX_ROUND_ATTEMPTS")
                .unwrap_or_else(|_| "3".to_string())
                .parse()
                .expect("MAX_ROUND_ATTEMPTS must be a number"),
            python_bin: env::var("PYTHON_BIN").unwrap_or_else(|_| "python3".to_string()),
            sandbox_timeout_secs: env::var("SANDBOX_TIMEOUT_SECS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .expect("SANDBOX_TIMEOUT_SECS must be a number"),
            out_dir: PathBuf::from(env::var("OUT_DIR").unwrap_or_else(|_| ".".to_string())),
            topic: env::var("QUESTION_TOPIC")
                .unwrap_or_else(|_| "02 - Classes, Attributes and Methods".to_string()),
        }
    }

    /// Log the effective configuration without leaking secrets.
    pub fn log_redacted(&self) {
        info!(
            oracle_base_url = self.oracle_base_url.as_str(),
            targets = self.generation_targets.len(),
            semantic_axis = self.embed_api_key.is_some(),
            pick_mode = %self.pick_mode,
            max_round_attempts = self.max_round_attempts,
            sandbox_timeout_secs = self.sandbox_timeout_secs,
            out_dir = %self.out_dir.display(),
            "Configuration loaded"
        );
    }
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}

/// Parse `name=model_id` pairs from a comma-separated list. Entries without
/// an `=` use the model id as the display name.
fn parse_targets(raw: &str) -> Vec<(String, String)> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| match entry.split_once('=') {
            Some((name, model)) => (name.trim().to_string(), model.trim().to_string()),
            None => (entry.to_string(), entry.to_string()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn targets_parse_named_and_bare_entries() {
        let targets = parse_targets("llama=llama-3.1-8b-instant, bare-model ,,gpt=openai/gpt");
        assert_eq!(
            targets,
            vec![
                ("llama".to_string(), "llama-3.1-8b-instant".to_string()),
                ("bare-model".to_string(), "bare-model".to_string()),
                ("gpt".to_string(), "openai/gpt".to_string()),
            ]
        );
    }
}
