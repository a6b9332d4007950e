//! Standalone document analysis: structured views of a job description or a
//! résumé, stored alongside the document.

pub mod analyzer;
pub mod handlers;
pub mod models;
pub mod prompts;
pub mod store;
