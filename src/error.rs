use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid GitHub repository URL: {0}")]
    InvalidUrl(String),

    #[error("Repository not found: {0}")]
    RepoNotFound(String),

    #[error("Rate limit exceeded, retry after {0} seconds")]
    RateLimited(u64),

    #[error("GitHub API error: {0}")]
    GitHubApi(String),

    #[error("Insight generation failed: {0}")]
    Generation(String),

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Unsupported export format: {0}")]
    UnsupportedFormat(String),

    #[error("Analysis is {0}, only completed analyses can be exported")]
    ExportUnavailable(String),

    #[error("Analysis not found: {0}")]
    AnalysisNotFound(String),

    #[error("No {1} export exists for analysis {0}")]
    ExportNotFound(String, String),

    #[error("Document rendering failed: {0}")]
    Render(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::RateLimited(_) | Error::Network(_))
    }

    /// Message stored on a failed analysis record. Rate limits get an
    /// explicit retry hint so a caller knows to back off before resubmitting.
    pub fn stored_message(&self) -> String {
        match self {
            Error::RateLimited(secs) => format!(
                "Analysis failed: GitHub rate limit exceeded. Retry after {} seconds.",
                secs
            ),
            other => format!("Analysis failed: {}", other),
        }
    }
}
