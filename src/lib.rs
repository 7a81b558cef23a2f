pub mod analysis;
pub mod config;
pub mod error;
pub mod export;
pub mod github;
pub mod llm;
pub mod models;
pub mod storage;

pub use analysis::AnalysisOrchestrator;
pub use config::Config;
pub use error::{Error, Result};
pub use export::ExportService;
pub use github::GitHubClient;
pub use llm::{GeminiProvider, InsightGenerator, InsightProvider};
pub use storage::Store;
