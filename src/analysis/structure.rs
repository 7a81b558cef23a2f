use std::collections::HashMap;

use crate::models::{ContentEntry, FileStructure};

/// Directories excluded from the tree walk: vendored code, build output,
/// caches, editor state.
const SKIP_DIRS: &[&str] = &[
    ".git",
    ".github",
    "node_modules",
    "__pycache__",
    ".pytest_cache",
    "venv",
    "env",
    ".venv",
    ".env",
    "dist",
    "build",
    ".next",
    "target",
    "vendor",
    ".idea",
    ".vscode",
    "coverage",
    ".nyc_output",
    "logs",
    "log",
];

pub fn should_skip_dir(name: &str) -> bool {
    let lower = name.to_lowercase();
    lower.starts_with('.') || SKIP_DIRS.contains(&lower.as_str())
}

const MANIFEST_NAMES: &[&str] = &[
    "package.json",
    "requirements.txt",
    "Pipfile",
    "Gemfile",
    "composer.json",
    "pom.xml",
    "build.gradle",
    "Cargo.toml",
    "go.mod",
    "pubspec.yaml",
    "Package.swift",
];

const DOC_KEYWORDS: &[&str] = &["readme", "license", "changelog", "contributing"];
const CONFIG_EXTS: &[&str] = &[".config", ".json", ".yml", ".yaml", ".toml", ".ini"];
const TEST_KEYWORDS: &[&str] = &["test", "spec", "__test__"];
const SOURCE_EXTS: &[&str] = &[
    ".py", ".js", ".ts", ".java", ".cpp", ".c", ".go", ".rs", ".rb",
];
const ASSET_EXTS: &[&str] = &[".png", ".jpg", ".jpeg", ".gif", ".svg", ".ico"];

/// Root-level entries considered for categorization.
const CATEGORIZE_LIMIT: usize = 100;

/// Buckets the fetched tree into a `FileStructure` summary. Categorization
/// covers root-level entries; the file count spans the whole walked tree.
pub fn build_file_structure(
    tree: &[ContentEntry],
    languages: &HashMap<String, u64>,
) -> FileStructure {
    let mut structure = FileStructure {
        total_files: tree.iter().filter(|e| !e.is_dir()).count() as u32,
        languages: languages.clone(),
        ..FileStructure::default()
    };

    let root_entries = tree
        .iter()
        .filter(|e| !e.path.contains('/'))
        .take(CATEGORIZE_LIMIT);

    for entry in root_entries {
        if entry.is_dir() {
            structure.directories.push(entry.name.clone());
            continue;
        }

        let name = entry.name.clone();
        let lower = name.to_lowercase();

        if MANIFEST_NAMES.contains(&name.as_str()) {
            structure.important_files.push(name);
        } else if DOC_KEYWORDS.iter().any(|k| lower.contains(k)) {
            structure.documentation.push(name);
        } else if CONFIG_EXTS.iter().any(|ext| lower.ends_with(ext)) {
            structure.config_files.push(name);
        } else if TEST_KEYWORDS.iter().any(|k| lower.contains(k)) {
            structure.tests.push(name);
        } else if SOURCE_EXTS.iter().any(|ext| lower.ends_with(ext)) {
            structure.source_code.push(name);
        } else if ASSET_EXTS.iter().any(|ext| lower.ends_with(ext)) {
            structure.assets.push(name);
        }
    }

    structure
}
