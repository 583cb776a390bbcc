//! Infrastructure layer: job orchestration, storage adapters, content, config.

pub mod assets;
pub mod config;
pub mod content;
pub mod jobs;
pub mod requests;

pub use config::OrchestratorConfig;
