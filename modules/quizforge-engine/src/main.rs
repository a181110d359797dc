use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use oracle_client::traits::SimilarityOracle;
use oracle_client::{BasicTokenClassifier, EmbeddingSimilarity, OpenAiCompat};
use quizforge_common::{Config, QuestionKind, SelectionPolicy};
use quizforge_engine::fragment::CodeFragmentExtractor;
use quizforge_engine::metrics::MetricsEngine;
use quizforge_engine::sandbox::Sandbox;
use quizforge_engine::selector::{CandidateSelector, GenerationTarget};
use quizforge_engine::{report, round_log};
use quizforge_export::ArtifactRenderer;

/// Generate, evaluate and export one programming-exercise question.
#[derive(Parser, Debug)]
#[command(name = "quizforge")]
struct Args {
    /// Original question file (LaTeX with an embedded [[def:]] fragment).
    #[arg(long)]
    question: PathBuf,

    /// Override PICK_MODE (most_similar | most_different).
    #[arg(long)]
    policy: Option<SelectionPolicy>,

    /// Override MAX_ROUND_ATTEMPTS.
    #[arg(long)]
    attempts: Option<u32>,

    /// Override OUT_DIR.
    #[arg(long)]
    out_dir: Option<PathBuf>,
}

fn build_prompt(kind: QuestionKind, question: &str) -> String {
    match kind {
        QuestionKind::Open => format!(
            "Rewrite from scratch an object-oriented programming question, keeping the LaTeX \
format but using new class, attribute and method names, adding new challenges and changing \
the question's fictional theme. Do not generate a parametric question; generate a new one. \
Keep the example input/output blocks and the [[def:...]] block.\n\n{question}"
        ),
        QuestionKind::MultipleChoice => format!(
            "Generate a new multiple-choice question in the same format as the following one, \
in LaTeX with \\begin{{verbatim}} for code and \\begin{{enumerate}} for the alternatives.\n\n\
Question:\n{question}"
        ),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("quizforge=info".parse()?))
        .init();

    info!("Quizforge starting...");

    let args = Args::parse();

    // Load config, CLI flags win
    let mut config = Config::from_env();
    if let Some(policy) = args.policy {
        config.pick_mode = policy;
    }
    if let Some(attempts) = args.attempts {
        config.max_round_attempts = attempts;
    }
    if let Some(out_dir) = args.out_dir {
        config.out_dir = out_dir;
    }
    config.log_redacted();

    let original = std::fs::read_to_string(&args.question)
        .with_context(|| format!("Failed to read question file {}", args.question.display()))?;
    let kind = QuestionKind::detect(&original);
    info!(kind = %kind, "Question kind detected");

    // Wire oracles
    let generator =
        Arc::new(OpenAiCompat::new(&config.oracle_api_key).with_base_url(&config.oracle_base_url));
    let similarity: Option<Arc<dyn SimilarityOracle>> = match &config.embed_api_key {
        Some(key) => Some(Arc::new(EmbeddingSimilarity::new(
            key,
            &config.embed_base_url,
            &config.embedding_model,
        ))),
        None => {
            warn!("EMBED_API_KEY not set, semantic axis disabled");
            None
        }
    };
    let metrics = MetricsEngine::new(similarity, Arc::new(BasicTokenClassifier::new()));

    let targets: Vec<GenerationTarget> = config
        .generation_targets
        .iter()
        .map(|(name, model)| GenerationTarget::new(name, model))
        .collect();

    // Select a winner
    let selector = CandidateSelector::new(
        generator,
        metrics,
        config.pick_mode,
        config.max_round_attempts,
    );
    let prompt = build_prompt(kind, &original);
    let outcome = selector.run_round(&original, &prompt, &targets).await?;
    info!("Round finished. {}", outcome.stats);

    // Derive test vectors from the winner
    let sandbox = Sandbox::new(
        &config.python_bin,
        Duration::from_secs(config.sandbox_timeout_secs),
    );
    let extractor = CodeFragmentExtractor::new(sandbox);
    let extraction = extractor.extract(&outcome.winner.raw_text).await;
    if let Some(failure) = &extraction.failure {
        warn!(
            failure = failure.as_str(),
            "Vector extraction failed, exports will be partial"
        );
    }

    // Render exports
    let renderer = ArtifactRenderer::new(&config.out_dir, &config.topic);
    let summary = renderer.render(
        &outcome.winner.raw_text,
        kind,
        extraction.context.as_ref(),
    )?;
    info!(summary = summary.describe().as_str(), "Exports rendered");

    // Persist the round audit trail and the winner's report
    let log = round_log::build(&original, &outcome.candidates, Some(&outcome.winner.name));
    round_log::write_json(&log, &config.out_dir.join("generation_results.json"))?;
    round_log::write_detailed_report(
        &outcome.candidates,
        &config.out_dir.join("evaluation_report.txt"),
    )?;

    let winner_report = report::build(&outcome.winner);
    info!("Winner report:\n{}", report::to_text(&winner_report));

    Ok(())
}
