pub mod aggregator;
pub mod content_gate;
pub mod exporter;
pub mod feature_extractor;
pub mod llm_service;
pub mod normalizer;
pub mod response;
pub mod session_store;
pub mod test_case_synthesizer;

pub use aggregator::ResultAggregator;
pub use content_gate::ContentGate;
pub use exporter::{ExportFormat, SpreadsheetExporter};
pub use feature_extractor::FeatureExtractor;
pub use llm_service::LlmService;
pub use session_store::{InMemorySessionStore, SessionStore};
pub use test_case_synthesizer::TestCaseSynthesizer;
