use crate::error::{Error, Result};
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub github_token: Option<String>,
    pub database_path: String,
    pub export_dir: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let gemini_api_key = env::var("GEMINI_API_KEY")
            .map_err(|_| Error::Config("GEMINI_API_KEY environment variable not set".to_string()))?;

        let gemini_model =
            env::var("GEMINI_MODEL").unwrap_or_else(|_| "gemini-2.0-flash".to_string());

        // Unauthenticated requests work for public repositories, at a much
        // lower rate limit.
        let github_token = env::var("GITHUB_TOKEN").ok().filter(|t| !t.is_empty());

        let database_path =
            env::var("DATABASE_PATH").unwrap_or_else(|_| "repoinsight.db".to_string());

        let export_dir = env::var("EXPORT_DIR").unwrap_or_else(|_| "exports".to_string());

        Ok(Self {
            gemini_api_key,
            gemini_model,
            github_token,
            database_path,
            export_dir,
        })
    }
}
