pub mod backoff;
pub mod fragment;
pub mod markup;
pub mod metrics;
pub mod report;
pub mod round_log;
pub mod sandbox;
pub mod selector;
pub mod snippet;

pub use fragment::{CodeFragmentExtractor, FragmentOutcome};
pub use metrics::MetricsEngine;
pub use sandbox::Sandbox;
pub use selector::{CandidateSelector, GenerationTarget, RoundOutcome};
