// Two-step match scoring: skill extraction → score synthesis → stored record.
// All model calls go through llm_client::TextGenerator.

pub mod batch;
pub mod contract;
pub mod extractor;
pub mod handlers;
pub mod orchestrator;
pub mod prompts;
pub mod store;
pub mod synthesizer;
