pub mod orchestrator;
pub mod structure;

pub use orchestrator::AnalysisOrchestrator;
pub use structure::build_file_structure;
