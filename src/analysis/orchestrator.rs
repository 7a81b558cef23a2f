use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::analysis::structure::build_file_structure;
use crate::error::{Error, Result};
use crate::github::{parse_repo_url, GitHubClient};
use crate::llm::InsightGenerator;
use crate::models::{AnalysisRecord, AnalysisStatus, RepoStats};
use crate::storage::Store;

/// Sequences one analysis run: create pending → analyzing → fetch → generate
/// → completed, recording any stage failure on the record as failed.
///
/// A malformed URL is the only error returned to the caller without a stored
/// record; every later failure lands in the record's error field.
pub struct AnalysisOrchestrator {
    github: Arc<GitHubClient>,
    generator: InsightGenerator,
    store: Arc<Store>,
}

impl AnalysisOrchestrator {
    pub fn new(github: Arc<GitHubClient>, generator: InsightGenerator, store: Arc<Store>) -> Self {
        Self {
            github,
            generator,
            store,
        }
    }

    /// Submits a repository URL for analysis and drives the run to its
    /// terminal state. The returned record is `Completed` or `Failed`.
    pub async fn submit(&self, repository_url: &str) -> Result<AnalysisRecord> {
        let (owner, repo) = parse_repo_url(repository_url)?;

        let mut record = AnalysisRecord::new(repository_url, &owner, &repo);
        self.store.insert_analysis(&record)?;
        tracing::info!("Created analysis {} for {}/{}", record.id, owner, repo);

        self.run(&mut record).await?;
        Ok(record)
    }

    /// Re-runs analysis against an existing record: results are cleared, the
    /// status drops back to pending, and the same sequence executes again.
    /// Identity (id, owner, repo) is stable; summary and timestamps are fresh.
    pub async fn reanalyze(&self, id: Uuid) -> Result<AnalysisRecord> {
        let mut record = self
            .store
            .get_analysis(&id)?
            .ok_or_else(|| Error::AnalysisNotFound(id.to_string()))?;

        record.reset();
        self.store.update_analysis(&record)?;
        tracing::info!("Re-analyzing {} ({})", record.full_name(), record.id);

        self.run(&mut record).await?;
        Ok(record)
    }

    /// Re-analysis addressed by URL: resets the most recent record for that
    /// URL, or starts a fresh analysis if none exists.
    pub async fn reanalyze_url(&self, repository_url: &str) -> Result<AnalysisRecord> {
        match self.store.find_by_url(repository_url)? {
            Some(existing) => self.reanalyze(existing.id).await,
            None => self.submit(repository_url).await,
        }
    }

    async fn run(&self, record: &mut AnalysisRecord) -> Result<()> {
        record.status = AnalysisStatus::Analyzing;
        record.updated_at = Utc::now();
        self.store.update_analysis(record)?;

        match self.execute(record).await {
            Ok(()) => {
                record.status = AnalysisStatus::Completed;
                tracing::info!("Analysis completed for {}", record.full_name());
            }
            Err(e) => {
                record.status = AnalysisStatus::Failed;
                record.error_message = Some(e.stored_message());
                tracing::error!("Analysis failed for {}: {}", record.full_name(), e);
            }
        }
        record.updated_at = Utc::now();
        self.store.update_analysis(record)?;
        Ok(())
    }

    async fn execute(&self, record: &mut AnalysisRecord) -> Result<()> {
        let data = self
            .github
            .fetch_repository_data(&record.owner, &record.repository_name)
            .await?;

        // Persist repository stats before generation so a later failure
        // still leaves the metadata inspectable.
        record.stats = RepoStats {
            stars: data.info.stargazers_count,
            forks: data.info.forks_count,
            language: data.info.language.clone(),
            description: data.info.description.clone(),
        };
        record.updated_at = Utc::now();
        self.store.update_analysis(record)?;

        tracing::info!(
            "Generating insights for {} via {}",
            record.full_name(),
            self.generator.provider_name()
        );
        let summary = self.generator.generate_summary(&data).await?;
        let tech_stack = self.generator.detect_tech_stack(&data).await?;
        let setup_instructions = self
            .generator
            .generate_setup_instructions(&data, &tech_stack)
            .await?;

        record.summary = summary;
        record.tech_stack = tech_stack;
        record.setup_instructions = setup_instructions;
        record.file_structure = build_file_structure(&data.tree, &data.languages);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::InsightProvider;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Counts calls so consecutive runs produce distinguishable summaries.
    struct CountingProvider {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl InsightProvider for CountingProvider {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("{{generated text, call {}}}", n))
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    async fn mock_github() -> MockServer {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/repos/octocat/Hello-World"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "name": "Hello-World",
                "full_name": "octocat/Hello-World",
                "owner": {"login": "octocat"},
                "description": "My first repository",
                "language": "C",
                "stargazers_count": 80,
                "forks_count": 9,
                "topics": [],
                "default_branch": "master",
                "html_url": "https://github.com/octocat/Hello-World"
            })))
            .with_priority(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/repos/octocat/Hello-World/languages"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"C": 14212})),
            )
            .with_priority(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/repos/octocat/Hello-World/contents/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"name": "README", "path": "README", "type": "file", "size": 14},
                {"name": "src", "path": "src", "type": "dir", "size": 0}
            ])))
            .with_priority(1)
            .mount(&server)
            .await;

        // Everything else (readme candidates, manifests, subdirectories).
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .with_priority(200)
            .mount(&server)
            .await;

        server
    }

    fn orchestrator_for(server: &MockServer) -> AnalysisOrchestrator {
        let github = GitHubClient::new(None).unwrap().with_base_url(&server.uri());
        let generator = InsightGenerator::new(Arc::new(CountingProvider {
            calls: AtomicUsize::new(0),
        }));
        AnalysisOrchestrator::new(Arc::new(github), generator, Arc::new(Store::in_memory().unwrap()))
    }

    #[tokio::test]
    async fn invalid_url_is_rejected_without_a_record() {
        let server = mock_github().await;
        let orchestrator = orchestrator_for(&server);

        let err = orchestrator.submit("https://example.com/not/github").await.unwrap_err();
        assert!(matches!(err, Error::InvalidUrl(_)));
        assert!(orchestrator
            .store
            .list_analyses(None, 10)
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn successful_run_reaches_completed() {
        let server = mock_github().await;
        let orchestrator = orchestrator_for(&server);

        let record = orchestrator
            .submit("https://github.com/octocat/Hello-World")
            .await
            .unwrap();

        assert_eq!(record.owner, "octocat");
        assert_eq!(record.repository_name, "Hello-World");
        assert_eq!(record.status, AnalysisStatus::Completed);
        assert!(!record.summary.is_empty());
        assert!(record.error_message.is_none());
        assert_eq!(record.stats.stars, 80);
        assert_eq!(record.file_structure.total_files, 1);
        // Unparseable stack response fell back to language data.
        assert_eq!(record.tech_stack.primary_languages, vec!["C"]);

        let stored = orchestrator.store.get_analysis(&record.id).unwrap().unwrap();
        assert_eq!(stored.status, AnalysisStatus::Completed);
    }

    #[tokio::test]
    async fn missing_repository_is_recorded_as_failed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        let orchestrator = orchestrator_for(&server);

        let record = orchestrator
            .submit("https://github.com/octocat/gone")
            .await
            .unwrap();

        assert_eq!(record.status, AnalysisStatus::Failed);
        let message = record.error_message.unwrap();
        assert!(!message.is_empty());
        assert!(message.contains("not found"), "unexpected message: {}", message);
    }

    #[tokio::test]
    async fn rate_limited_failure_stores_retry_hint() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(403)
                    .insert_header("x-ratelimit-remaining", "0")
                    .insert_header("retry-after", "90"),
            )
            .mount(&server)
            .await;
        let orchestrator = orchestrator_for(&server);

        let record = orchestrator
            .submit("https://github.com/octocat/Hello-World")
            .await
            .unwrap();

        assert_eq!(record.status, AnalysisStatus::Failed);
        let message = record.error_message.unwrap();
        assert!(message.contains("Retry after 90 seconds"));
    }

    #[tokio::test]
    async fn reanalyze_keeps_identity_and_refreshes_results() {
        let server = mock_github().await;
        let orchestrator = orchestrator_for(&server);

        let first = orchestrator
            .submit("https://github.com/octocat/Hello-World")
            .await
            .unwrap();
        let second = orchestrator.reanalyze(first.id).await.unwrap();

        assert_eq!(second.id, first.id);
        assert_eq!(second.owner, first.owner);
        assert_eq!(second.repository_name, first.repository_name);
        assert_eq!(second.status, AnalysisStatus::Completed);
        assert_ne!(second.summary, first.summary);
        assert!(second.updated_at >= first.updated_at);
    }

    #[tokio::test]
    async fn reanalyze_unknown_id_errors() {
        let server = mock_github().await;
        let orchestrator = orchestrator_for(&server);

        let err = orchestrator.reanalyze(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, Error::AnalysisNotFound(_)));
    }
}
