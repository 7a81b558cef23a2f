use std::sync::Arc;

use crate::error::{Error, Result};
use crate::llm::parser::parse_tech_stack;
use crate::llm::prompts;
use crate::llm::provider::InsightProvider;
use crate::models::{RepositoryData, TechStack};

/// Turns fetched repository data into the three analysis artifacts by
/// prompting the provider and defensively parsing what comes back.
pub struct InsightGenerator {
    provider: Arc<dyn InsightProvider>,
}

impl InsightGenerator {
    pub fn new(provider: Arc<dyn InsightProvider>) -> Self {
        Self { provider }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// An empty or whitespace-only summary is a generation failure; there is
    /// nothing useful to persist without it.
    pub async fn generate_summary(&self, data: &RepositoryData) -> Result<String> {
        let text = self.provider.generate(&prompts::summary_prompt(data)).await?;
        let text = text.trim().to_string();
        if text.is_empty() {
            return Err(Error::Generation("Model returned an empty summary".to_string()));
        }
        Ok(text)
    }

    /// Tech-stack extraction tolerates an unparseable response: the model's
    /// JSON is best-effort, and a stack derived from language and manifest
    /// data is still a usable answer.
    pub async fn detect_tech_stack(&self, data: &RepositoryData) -> Result<TechStack> {
        let response = self
            .provider
            .generate(&prompts::tech_stack_prompt(data))
            .await?;

        match parse_tech_stack(&response) {
            Ok(stack) => Ok(stack),
            Err(e) => {
                tracing::warn!(
                    "Tech stack response from {} unparseable ({}), using fallback",
                    self.provider.name(),
                    e
                );
                Ok(fallback_tech_stack(data))
            }
        }
    }

    pub async fn generate_setup_instructions(
        &self,
        data: &RepositoryData,
        tech_stack: &TechStack,
    ) -> Result<String> {
        let text = self
            .provider
            .generate(&prompts::setup_prompt(data, tech_stack))
            .await?;
        let text = text.trim().to_string();
        if text.is_empty() {
            return Err(Error::Generation(
                "Model returned empty setup instructions".to_string(),
            ));
        }
        Ok(text)
    }
}

/// Deterministic stack built from the fetch data alone, used when the model's
/// structured answer cannot be parsed.
fn fallback_tech_stack(data: &RepositoryData) -> TechStack {
    let mut stack = TechStack {
        primary_languages: {
            let mut langs: Vec<_> = data.languages.iter().collect();
            langs.sort_by(|a, b| b.1.cmp(a.1));
            langs.into_iter().map(|(name, _)| name.clone()).collect()
        },
        ..TechStack::default()
    };

    for filename in data.manifests.keys() {
        match filename.as_str() {
            "package.json" => stack.package_managers.push("npm".to_string()),
            "requirements.txt" | "Pipfile" | "poetry.lock" => {
                stack.package_managers.push("pip".to_string())
            }
            "Gemfile" => stack.package_managers.push("bundler".to_string()),
            "composer.json" => stack.package_managers.push("composer".to_string()),
            "Cargo.toml" => stack.package_managers.push("cargo".to_string()),
            "go.mod" => stack.package_managers.push("go modules".to_string()),
            "pom.xml" => stack.build_tools.push("maven".to_string()),
            "build.gradle" => stack.build_tools.push("gradle".to_string()),
            _ => {}
        }
    }
    stack.package_managers.sort();
    stack.package_managers.dedup();

    stack
}
