pub mod backend;
pub mod document_reader;

pub use backend::GenerationBackend;
pub use document_reader::{DocumentContentReader, PlainTextReader};
