use async_trait::async_trait;

use crate::error::Result;

/// Seam for the generative-AI backend. Implementations return the model's
/// raw text; prompt construction and response parsing live with the caller
/// so providers stay interchangeable.
#[async_trait]
pub trait InsightProvider: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
    fn name(&self) -> &str;
}
