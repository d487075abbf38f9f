// Library interface for briefing modules
// This allows tests and the binary to import modules

pub mod aggregate;
pub mod digest;
pub mod ingestion;
pub mod llm;
pub mod notify;
pub mod pipeline;
pub mod relevance;
pub mod sources;
