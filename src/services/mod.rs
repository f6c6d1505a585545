pub mod classifier;
pub mod extractor;
pub mod prompts;
pub mod provider;
pub mod relay;

pub use classifier::{DocumentClassifier, DocumentMetadata, HeuristicClassifier};
pub use extractor::TextExtractor;
pub use prompts::PromptTemplates;
pub use provider::{GeminiProvider, GenerativeProvider};
pub use relay::RelayService;
