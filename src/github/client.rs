use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use futures::future::join_all;
use reqwest::{header, Client, Response, StatusCode};
use std::collections::{HashMap, VecDeque};

use crate::analysis::structure::should_skip_dir;
use crate::error::{Error, Result};
use crate::github::rate_limiter::RateLimiter;
use crate::models::{ContentEntry, RepositoryData, RepositoryInfo};

const README_CANDIDATES: &[&str] = &["README.md", "README.rst", "README.txt", "README"];

/// Dependency manifests worth feeding to the model, across ecosystems.
const MANIFEST_CANDIDATES: &[&str] = &[
    "package.json",
    "requirements.txt",
    "Pipfile",
    "poetry.lock",
    "Gemfile",
    "composer.json",
    "pom.xml",
    "build.gradle",
    "Cargo.toml",
    "go.mod",
    "pubspec.yaml",
    "Package.swift",
];

/// Directory levels fetched when walking the repository tree.
const TREE_DEPTH: usize = 3;

pub struct GitHubClient {
    client: Client,
    rate_limiter: RateLimiter,
    base_url: String,
}

impl GitHubClient {
    /// A token is optional; unauthenticated requests work for public
    /// repositories at a reduced rate limit.
    pub fn new(token: Option<&str>) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "X-GitHub-Api-Version",
            header::HeaderValue::from_static("2022-11-28"),
        );
        headers.insert(
            header::USER_AGENT,
            header::HeaderValue::from_static("repoinsight/0.1"),
        );
        if let Some(token) = token {
            headers.insert(
                header::AUTHORIZATION,
                header::HeaderValue::from_str(&format!("Bearer {}", token))?,
            );
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            rate_limiter: RateLimiter::new(),
            base_url: "https://api.github.com".to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Fetches everything the analysis needs for one repository. Any stage
    /// failure aborts the whole fetch; there is no partial result.
    pub async fn fetch_repository_data(&self, owner: &str, repo: &str) -> Result<RepositoryData> {
        let info = self.get_repository(owner, repo).await?;
        let languages = self.get_languages(owner, repo).await?;
        let readme = self.get_readme(owner, repo).await?;
        let manifests = self.get_manifests(owner, repo).await?;
        let tree = self.get_tree(owner, repo).await?;

        Ok(RepositoryData {
            info,
            languages,
            readme,
            manifests,
            tree,
        })
    }

    pub async fn get_repository(&self, owner: &str, repo: &str) -> Result<RepositoryInfo> {
        tracing::info!("Fetching repository metadata: {}/{}", owner, repo);
        let url = format!("{}/repos/{}/{}", self.base_url, owner, repo);
        let response = self.get(&url).await?;
        let response = self.check(response, &format!("{}/{}", owner, repo)).await?;
        Ok(response.json().await?)
    }

    pub async fn get_languages(&self, owner: &str, repo: &str) -> Result<HashMap<String, u64>> {
        let url = format!("{}/repos/{}/{}/languages", self.base_url, owner, repo);
        let response = self.get(&url).await?;
        let response = self.check(response, &format!("{}/{}", owner, repo)).await?;
        Ok(response.json().await?)
    }

    /// Lists the entries of one directory. `path` is empty for the root.
    pub async fn list_dir(&self, owner: &str, repo: &str, path: &str) -> Result<Vec<ContentEntry>> {
        let url = format!(
            "{}/repos/{}/{}/contents/{}",
            self.base_url, owner, repo, path
        );
        tracing::debug!("Listing contents: {}", url);
        let response = self.get(&url).await?;
        let response = self.check(response, &format!("{}/{}", owner, repo)).await?;
        Ok(response.json().await?)
    }

    /// Fetches one file's decoded content. `Ok(None)` when the path does not
    /// exist or is not a file.
    pub async fn get_file(&self, owner: &str, repo: &str, path: &str) -> Result<Option<String>> {
        let url = format!(
            "{}/repos/{}/{}/contents/{}",
            self.base_url, owner, repo, path
        );
        let response = self.get(&url).await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = self.check(response, &format!("{}/{}", owner, repo)).await?;

        let payload: serde_json::Value = response.json().await?;
        let is_file = payload.get("type").and_then(|t| t.as_str()) == Some("file");
        if !is_file {
            return Ok(None);
        }

        let Some(encoded) = payload.get("content").and_then(|c| c.as_str()) else {
            return Ok(None);
        };
        // The contents API wraps base64 at 60 columns.
        let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
        let bytes = BASE64
            .decode(compact)
            .map_err(|e| Error::Parse(format!("Invalid base64 in {}: {}", path, e)))?;
        Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
    }

    pub async fn get_readme(&self, owner: &str, repo: &str) -> Result<Option<String>> {
        for name in README_CANDIDATES {
            if let Some(content) = self.get_file(owner, repo, name).await? {
                if !content.is_empty() {
                    return Ok(Some(content));
                }
            }
        }
        Ok(None)
    }

    /// Fetches all recognized dependency manifests that exist in the root.
    pub async fn get_manifests(&self, owner: &str, repo: &str) -> Result<HashMap<String, String>> {
        let fetches = MANIFEST_CANDIDATES
            .iter()
            .map(|name| async move { (*name, self.get_file(owner, repo, name).await) });

        let mut manifests = HashMap::new();
        for (name, result) in join_all(fetches).await {
            if let Some(content) = result? {
                if !content.is_empty() {
                    manifests.insert(name.to_string(), content);
                }
            }
        }
        Ok(manifests)
    }

    /// Walks the repository tree breadth-first to a bounded depth, skipping
    /// vendored and VCS directories. A directory that fails to list is
    /// logged and skipped rather than failing the walk.
    pub async fn get_tree(&self, owner: &str, repo: &str) -> Result<Vec<ContentEntry>> {
        let mut tree = Vec::new();
        let mut queue: VecDeque<(String, usize)> = VecDeque::new();
        queue.push_back((String::new(), 0));

        while let Some((path, depth)) = queue.pop_front() {
            let entries = if path.is_empty() {
                // Root listing failures abort the fetch.
                self.list_dir(owner, repo, &path).await?
            } else {
                match self.list_dir(owner, repo, &path).await {
                    Ok(entries) => entries,
                    Err(e) if e.is_retryable() => return Err(e),
                    Err(e) => {
                        tracing::warn!("Skipping unreadable directory {}: {}", path, e);
                        continue;
                    }
                }
            };

            for entry in entries {
                if entry.is_dir() {
                    if depth + 1 < TREE_DEPTH && !should_skip_dir(&entry.name) {
                        queue.push_back((entry.path.clone(), depth + 1));
                    }
                }
                tree.push(entry);
            }
        }

        Ok(tree)
    }

    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }

    async fn get(&self, url: &str) -> Result<Response> {
        self.rate_limiter.acquire().await?;
        let response = self.client.get(url).send().await?;
        self.rate_limiter.observe(&response).await;
        Ok(response)
    }

    async fn check(&self, response: Response, context: &str) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::NOT_FOUND {
            return Err(Error::RepoNotFound(context.to_string()));
        }

        if status == StatusCode::FORBIDDEN || status == StatusCode::TOO_MANY_REQUESTS {
            let remaining = header_u64(&response, "x-ratelimit-remaining");
            let retry_after = header_u64(&response, "retry-after");
            if remaining == Some(0) || retry_after.is_some() {
                let secs = retry_after
                    .or_else(|| reset_delta(&response))
                    .unwrap_or(60);
                return Err(Error::RateLimited(secs));
            }
        }

        if status == StatusCode::UNAUTHORIZED {
            return Err(Error::GitHubApi(format!(
                "Authentication failed for {}; check GITHUB_TOKEN",
                context
            )));
        }

        let body = response.text().await.unwrap_or_default();
        Err(Error::GitHubApi(format!(
            "Request for {} failed: {} - {}",
            context, status, body
        )))
    }
}

fn header_u64(response: &Response, name: &str) -> Option<u64> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
}

/// Seconds until the `x-ratelimit-reset` epoch timestamp.
fn reset_delta(response: &Response) -> Option<u64> {
    let reset = header_u64(response, "x-ratelimit-reset")?;
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .ok()?
        .as_secs();
    Some(reset.saturating_sub(now))
}
