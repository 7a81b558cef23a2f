use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    Pending,
    Analyzing,
    Completed,
    Failed,
}

impl AnalysisStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisStatus::Pending => "pending",
            AnalysisStatus::Analyzing => "analyzing",
            AnalysisStatus::Completed => "completed",
            AnalysisStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(AnalysisStatus::Pending),
            "analyzing" => Some(AnalysisStatus::Analyzing),
            "completed" => Some(AnalysisStatus::Completed),
            "failed" => Some(AnalysisStatus::Failed),
            _ => None,
        }
    }
}

impl std::fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Categorized technology stack. Categories mirror what the model is asked
/// to return; empty categories are serialized as empty lists.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TechStack {
    #[serde(default)]
    pub primary_languages: Vec<String>,
    #[serde(default)]
    pub frameworks: Vec<String>,
    #[serde(default)]
    pub databases: Vec<String>,
    #[serde(default)]
    pub tools_and_services: Vec<String>,
    #[serde(default)]
    pub deployment: Vec<String>,
    #[serde(default)]
    pub testing: Vec<String>,
    #[serde(default)]
    pub build_tools: Vec<String>,
    #[serde(default)]
    pub package_managers: Vec<String>,
    #[serde(default)]
    pub development_tools: Vec<String>,
    #[serde(default)]
    pub api_technologies: Vec<String>,
}

impl TechStack {
    /// Non-empty categories as (label, entries) pairs, for rendering.
    pub fn categories(&self) -> Vec<(&'static str, &[String])> {
        let all: [(&'static str, &[String]); 10] = [
            ("Primary Languages", &self.primary_languages),
            ("Frameworks", &self.frameworks),
            ("Databases", &self.databases),
            ("Tools & Services", &self.tools_and_services),
            ("Deployment", &self.deployment),
            ("Testing", &self.testing),
            ("Build Tools", &self.build_tools),
            ("Package Managers", &self.package_managers),
            ("Development Tools", &self.development_tools),
            ("API Technologies", &self.api_technologies),
        ];
        all.into_iter().filter(|(_, v)| !v.is_empty()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.categories().is_empty()
    }
}

/// File tree breakdown: totals, per-language byte counts, and the top-level
/// entries bucketed by what they are.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileStructure {
    pub total_files: u32,
    #[serde(default)]
    pub languages: HashMap<String, u64>,
    #[serde(default)]
    pub directories: Vec<String>,
    #[serde(default)]
    pub important_files: Vec<String>,
    #[serde(default)]
    pub config_files: Vec<String>,
    #[serde(default)]
    pub documentation: Vec<String>,
    #[serde(default)]
    pub source_code: Vec<String>,
    #[serde(default)]
    pub tests: Vec<String>,
    #[serde(default)]
    pub assets: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepoStats {
    pub stars: u32,
    pub forks: u32,
    pub language: Option<String>,
    pub description: Option<String>,
}

/// One end-to-end analysis of a repository. Created in `Pending`, mutated by
/// the orchestrator as stages complete, never deleted automatically.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub id: Uuid,
    pub repository_url: String,
    pub owner: String,
    pub repository_name: String,
    pub status: AnalysisStatus,
    pub summary: String,
    pub tech_stack: TechStack,
    pub file_structure: FileStructure,
    pub setup_instructions: String,
    pub stats: RepoStats,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AnalysisRecord {
    pub fn new(repository_url: &str, owner: &str, repository_name: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            repository_url: repository_url.to_string(),
            owner: owner.to_string(),
            repository_name: repository_name.to_string(),
            status: AnalysisStatus::Pending,
            summary: String::new(),
            tech_stack: TechStack::default(),
            file_structure: FileStructure::default(),
            setup_instructions: String::new(),
            stats: RepoStats::default(),
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Clears prior results ahead of a re-analysis. Identity and creation
    /// time are kept; everything derived from a previous run goes.
    pub fn reset(&mut self) {
        self.status = AnalysisStatus::Pending;
        self.summary.clear();
        self.tech_stack = TechStack::default();
        self.file_structure = FileStructure::default();
        self.setup_instructions.clear();
        self.stats = RepoStats::default();
        self.error_message = None;
        self.updated_at = Utc::now();
    }

    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repository_name)
    }
}
