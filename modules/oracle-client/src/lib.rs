pub mod classify;
pub mod openai;
pub mod similarity;
pub mod traits;

pub use classify::BasicTokenClassifier;
pub use openai::OpenAiCompat;
pub use similarity::EmbeddingSimilarity;
pub use traits::{GenerationOracle, SimilarityOracle, TokenClassifier};
