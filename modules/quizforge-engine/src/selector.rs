//! One generate-evaluate-select cycle across all configured generation
//! targets, retried with backoff up to a configured ceiling. Candidates are
//! evaluated independently and fanned out; the coordinator aggregates the
//! returned results, so the round holds no shared mutable state.

use std::cmp::Ordering;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use regex::Regex;
use std::sync::LazyLock;
use tracing::{info, warn};

use oracle_client::traits::GenerationOracle;
use quizforge_common::{error::looks_rate_limited, Candidate, QuizforgeError, SelectionPolicy};

use crate::backoff::{BackoffPolicy, FailureKind};
use crate::metrics::MetricsEngine;

/// Generation and similarity calls are blocking remote calls; keep a small
/// number in flight.
const MAX_CONCURRENT_EVALUATIONS: usize = 4;

// Cheap pre-filter, independent of the metrics engine. Matches the class
// keyword and attribute-family words ("attribute", "atributo").
static CLASS_KEYWORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)class").unwrap());
static ATTRIBUTE_KEYWORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)at+ribut").unwrap());

/// Lightweight keyword presence check used to filter candidates before
/// ranking. Not a replacement for the metrics engine.
pub fn structurally_valid(text: &str) -> bool {
    CLASS_KEYWORD_RE.is_match(text) && ATTRIBUTE_KEYWORD_RE.is_match(text)
}

/// One generation slot in a round.
#[derive(Debug, Clone)]
pub struct GenerationTarget {
    pub name: String,
    pub model: String,
}

impl GenerationTarget {
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
        }
    }
}

/// Counters from the winning round attempt.
#[derive(Debug, Default)]
pub struct RoundStats {
    pub attempts: u32,
    pub generated: usize,
    pub oracle_failures: usize,
    pub valid: usize,
}

impl std::fmt::Display for RoundStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\n=== Round Complete ===")?;
        writeln!(f, "Attempts:        {}", self.attempts)?;
        writeln!(f, "Candidates:      {}", self.generated)?;
        writeln!(f, "Oracle failures: {}", self.oracle_failures)?;
        writeln!(f, "Valid:           {}", self.valid)?;
        Ok(())
    }
}

/// Winner plus the full candidate list for audit and reporting.
#[derive(Debug)]
pub struct RoundOutcome {
    pub winner: Candidate,
    pub candidates: Vec<Candidate>,
    pub stats: RoundStats,
}

pub struct CandidateSelector {
    generator: Arc<dyn GenerationOracle>,
    metrics: MetricsEngine,
    policy: SelectionPolicy,
    max_attempts: u32,
    backoff: BackoffPolicy,
}

impl CandidateSelector {
    pub fn new(
        generator: Arc<dyn GenerationOracle>,
        metrics: MetricsEngine,
        policy: SelectionPolicy,
        max_attempts: u32,
    ) -> Self {
        Self {
            generator,
            metrics,
            policy,
            max_attempts,
            backoff: BackoffPolicy::default(),
        }
    }

    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    /// Run rounds until one produces a structurally valid winner or the
    /// attempt ceiling is reached.
    pub async fn run_round(
        &self,
        original: &str,
        prompt: &str,
        targets: &[GenerationTarget],
    ) -> Result<RoundOutcome, QuizforgeError> {
        for attempt in 0..self.max_attempts {
            info!(
                attempt = attempt + 1,
                targets = targets.len(),
                policy = %self.policy,
                "Starting generation round"
            );

            let (candidates, rate_limited, oracle_failures) =
                self.evaluate_all(original, prompt, targets).await;

            for candidate in &candidates {
                info!(
                    name = candidate.name.as_str(),
                    similarity = candidate.similarity,
                    score = candidate.score,
                    valid = candidate.structurally_valid,
                    "Candidate evaluated"
                );
            }

            let mut valid: Vec<Candidate> = candidates
                .iter()
                .filter(|c| c.structurally_valid)
                .cloned()
                .collect();

            if valid.is_empty() {
                warn!(attempt = attempt + 1, "No structurally valid candidate this round");
                if attempt + 1 < self.max_attempts {
                    let kind = if rate_limited {
                        FailureKind::RateLimited
                    } else {
                        FailureKind::NoValidCandidate
                    };
                    let delay = self.backoff.next_delay(attempt, kind);
                    info!(delay_ms = delay.as_millis() as u64, "Backing off before next round");
                    tokio::time::sleep(delay).await;
                }
                continue;
            }

            // Stable sort: ties keep first-seen (target) order.
            match self.policy {
                SelectionPolicy::MostSimilar => valid.sort_by(|a, b| {
                    b.similarity
                        .partial_cmp(&a.similarity)
                        .unwrap_or(Ordering::Equal)
                }),
                SelectionPolicy::MostDifferent => valid.sort_by(|a, b| {
                    a.similarity
                        .partial_cmp(&b.similarity)
                        .unwrap_or(Ordering::Equal)
                }),
            }

            let valid_count = valid.len();
            let winner = valid.remove(0);
            info!(
                winner = winner.name.as_str(),
                similarity = winner.similarity,
                score = winner.score,
                "Round winner selected"
            );

            return Ok(RoundOutcome {
                winner,
                stats: RoundStats {
                    attempts: attempt + 1,
                    generated: candidates.len(),
                    oracle_failures,
                    valid: valid_count,
                },
                candidates,
            });
        }

        Err(QuizforgeError::SelectionExhausted {
            attempts: self.max_attempts,
        })
    }

    /// Fan out one evaluation per target. `buffered` (not `buffer_unordered`)
    /// keeps completion order aligned with target order, which the stable
    /// tie-break depends on.
    async fn evaluate_all(
        &self,
        original: &str,
        prompt: &str,
        targets: &[GenerationTarget],
    ) -> (Vec<Candidate>, bool, usize) {
        let results: Vec<Result<Candidate, QuizforgeError>> = stream::iter(targets)
            .map(|target| self.evaluate_one(original, prompt, target))
            .buffered(MAX_CONCURRENT_EVALUATIONS)
            .collect()
            .await;

        let mut candidates = Vec::new();
        let mut rate_limited = false;
        let mut oracle_failures = 0;
        for (target, result) in targets.iter().zip(results) {
            match result {
                Ok(candidate) => candidates.push(candidate),
                Err(e) => {
                    oracle_failures += 1;
                    rate_limited |= e.is_rate_limit();
                    warn!(
                        target = target.name.as_str(),
                        error = %e,
                        "Candidate dropped from round"
                    );
                }
            }
        }
        (candidates, rate_limited, oracle_failures)
    }

    async fn evaluate_one(
        &self,
        original: &str,
        prompt: &str,
        target: &GenerationTarget,
    ) -> Result<Candidate, QuizforgeError> {
        let raw_text = self
            .generator
            .generate(&target.model, prompt)
            .await
            .map_err(|e| {
                let message = format!("{e:#}");
                if looks_rate_limited(&message) {
                    QuizforgeError::RateLimited(message)
                } else {
                    QuizforgeError::Oracle(message)
                }
            })?;

        let structurally_valid = structurally_valid(&raw_text);
        let metrics = self
            .metrics
            .evaluate(original, &raw_text)
            .await
            .map_err(|e| QuizforgeError::Oracle(format!("{e:#}")))?;

        let similarity = metrics
            .semantic
            .as_ref()
            .map(|s| s.similarity)
            .unwrap_or(0.0);
        let score = metrics.score;

        Ok(Candidate {
            name: target.name.clone(),
            raw_text,
            similarity,
            structurally_valid,
            metrics,
            score,
        })
    }
}
