use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{AnalysisRecord, AnalysisStatus, ExportFile, ExportFormat, RepoStats};

/// SQLite-backed record store. The connection sits behind a mutex so the
/// async orchestrator can share one store; SQLite serializes writes anyway.
pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_db()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_db()?;
        Ok(store)
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("store mutex poisoned")
    }

    fn init_db(&self) -> Result<()> {
        self.conn().execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS analyses (
                id TEXT PRIMARY KEY,
                repository_url TEXT NOT NULL,
                owner TEXT NOT NULL,
                repository_name TEXT NOT NULL,
                status TEXT NOT NULL,
                summary TEXT NOT NULL DEFAULT '',
                tech_stack_json TEXT NOT NULL DEFAULT '{}',
                file_structure_json TEXT NOT NULL DEFAULT '{}',
                setup_instructions TEXT NOT NULL DEFAULT '',
                stars INTEGER NOT NULL DEFAULT 0,
                forks INTEGER NOT NULL DEFAULT 0,
                language TEXT,
                description TEXT,
                error_message TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS exports (
                id TEXT PRIMARY KEY,
                analysis_id TEXT NOT NULL REFERENCES analyses(id),
                format TEXT NOT NULL,
                file_path TEXT NOT NULL,
                file_size INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                UNIQUE(analysis_id, format)
            );

            CREATE INDEX IF NOT EXISTS idx_analyses_status ON analyses(status);
            CREATE INDEX IF NOT EXISTS idx_analyses_url ON analyses(repository_url);
            CREATE INDEX IF NOT EXISTS idx_exports_analysis_id ON exports(analysis_id);
            "#,
        )?;

        Ok(())
    }

    pub fn insert_analysis(&self, record: &AnalysisRecord) -> Result<()> {
        let tech_stack_json = serde_json::to_string(&record.tech_stack)?;
        let file_structure_json = serde_json::to_string(&record.file_structure)?;
        self.conn().execute(
            r#"
            INSERT INTO analyses (
                id, repository_url, owner, repository_name, status, summary,
                tech_stack_json, file_structure_json, setup_instructions,
                stars, forks, language, description, error_message,
                created_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
            "#,
            params![
                record.id.to_string(),
                record.repository_url,
                record.owner,
                record.repository_name,
                record.status.as_str(),
                record.summary,
                tech_stack_json,
                file_structure_json,
                record.setup_instructions,
                record.stats.stars,
                record.stats.forks,
                record.stats.language,
                record.stats.description,
                record.error_message,
                record.created_at.to_rfc3339(),
                record.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn update_analysis(&self, record: &AnalysisRecord) -> Result<()> {
        let tech_stack_json = serde_json::to_string(&record.tech_stack)?;
        let file_structure_json = serde_json::to_string(&record.file_structure)?;
        let updated = self.conn().execute(
            r#"
            UPDATE analyses SET
                repository_url = ?2, owner = ?3, repository_name = ?4,
                status = ?5, summary = ?6, tech_stack_json = ?7,
                file_structure_json = ?8, setup_instructions = ?9,
                stars = ?10, forks = ?11, language = ?12, description = ?13,
                error_message = ?14, updated_at = ?15
            WHERE id = ?1
            "#,
            params![
                record.id.to_string(),
                record.repository_url,
                record.owner,
                record.repository_name,
                record.status.as_str(),
                record.summary,
                tech_stack_json,
                file_structure_json,
                record.setup_instructions,
                record.stats.stars,
                record.stats.forks,
                record.stats.language,
                record.stats.description,
                record.error_message,
                record.updated_at.to_rfc3339(),
            ],
        )?;

        if updated == 0 {
            return Err(Error::AnalysisNotFound(record.id.to_string()));
        }
        Ok(())
    }

    pub fn get_analysis(&self, id: &Uuid) -> Result<Option<AnalysisRecord>> {
        let row = self
            .conn()
            .query_row(
                &format!("{} WHERE id = ?1", SELECT_ANALYSIS),
                params![id.to_string()],
                raw_analysis_row,
            )
            .optional()?;

        row.map(AnalysisRow::into_record).transpose()
    }

    /// Most recent analysis for a repository URL, any status.
    pub fn find_by_url(&self, repository_url: &str) -> Result<Option<AnalysisRecord>> {
        let row = self
            .conn()
            .query_row(
                &format!(
                    "{} WHERE repository_url = ?1 ORDER BY created_at DESC LIMIT 1",
                    SELECT_ANALYSIS
                ),
                params![repository_url],
                raw_analysis_row,
            )
            .optional()?;

        row.map(AnalysisRow::into_record).transpose()
    }

    /// Newest-first listing, optionally filtered by status.
    pub fn list_analyses(
        &self,
        status: Option<AnalysisStatus>,
        limit: usize,
    ) -> Result<Vec<AnalysisRecord>> {
        let conn = self.conn();
        let rows = match status {
            Some(status) => {
                let mut stmt = conn.prepare(&format!(
                    "{} WHERE status = ?1 ORDER BY created_at DESC LIMIT ?2",
                    SELECT_ANALYSIS
                ))?;
                let rows = stmt.query_map(params![status.as_str(), limit as i64], raw_analysis_row)?;
                rows.collect::<std::result::Result<Vec<_>, _>>()?
            }
            None => {
                let mut stmt = conn.prepare(&format!(
                    "{} ORDER BY created_at DESC LIMIT ?1",
                    SELECT_ANALYSIS
                ))?;
                let rows = stmt.query_map(params![limit as i64], raw_analysis_row)?;
                rows.collect::<std::result::Result<Vec<_>, _>>()?
            }
        };
        drop(conn);

        rows.into_iter().map(AnalysisRow::into_record).collect()
    }

    /// Inserts or replaces the export row for (analysis, format).
    pub fn upsert_export(&self, export: &ExportFile) -> Result<()> {
        self.conn().execute(
            r#"
            INSERT INTO exports (id, analysis_id, format, file_path, file_size, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(analysis_id, format) DO UPDATE SET
                id = excluded.id,
                file_path = excluded.file_path,
                file_size = excluded.file_size,
                created_at = excluded.created_at
            "#,
            params![
                export.id.to_string(),
                export.analysis_id.to_string(),
                export.format.extension(),
                export.file_path,
                export.file_size as i64,
                export.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn get_export(&self, analysis_id: &Uuid, format: ExportFormat) -> Result<Option<ExportFile>> {
        let row = self
            .conn()
            .query_row(
                &format!(
                    "{} WHERE analysis_id = ?1 AND format = ?2",
                    SELECT_EXPORT
                ),
                params![analysis_id.to_string(), format.extension()],
                raw_export_row,
            )
            .optional()?;

        row.map(ExportRow::into_export).transpose()
    }

    pub fn list_exports(&self, analysis_id: &Uuid) -> Result<Vec<ExportFile>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "{} WHERE analysis_id = ?1 ORDER BY created_at DESC",
            SELECT_EXPORT
        ))?;
        let rows = stmt.query_map(params![analysis_id.to_string()], raw_export_row)?;
        let rows = rows.collect::<std::result::Result<Vec<_>, _>>()?;
        drop(stmt);
        drop(conn);

        rows.into_iter().map(ExportRow::into_export).collect()
    }
}

const SELECT_ANALYSIS: &str = r#"
    SELECT id, repository_url, owner, repository_name, status, summary,
           tech_stack_json, file_structure_json, setup_instructions,
           stars, forks, language, description, error_message,
           created_at, updated_at
    FROM analyses
"#;

const SELECT_EXPORT: &str = r#"
    SELECT id, analysis_id, format, file_path, file_size, created_at
    FROM exports
"#;

/// Raw column values; converted outside the rusqlite closure so conversion
/// failures surface as crate errors instead of database errors.
struct AnalysisRow {
    id: String,
    repository_url: String,
    owner: String,
    repository_name: String,
    status: String,
    summary: String,
    tech_stack_json: String,
    file_structure_json: String,
    setup_instructions: String,
    stars: u32,
    forks: u32,
    language: Option<String>,
    description: Option<String>,
    error_message: Option<String>,
    created_at: String,
    updated_at: String,
}

fn raw_analysis_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<AnalysisRow> {
    Ok(AnalysisRow {
        id: row.get(0)?,
        repository_url: row.get(1)?,
        owner: row.get(2)?,
        repository_name: row.get(3)?,
        status: row.get(4)?,
        summary: row.get(5)?,
        tech_stack_json: row.get(6)?,
        file_structure_json: row.get(7)?,
        setup_instructions: row.get(8)?,
        stars: row.get(9)?,
        forks: row.get(10)?,
        language: row.get(11)?,
        description: row.get(12)?,
        error_message: row.get(13)?,
        created_at: row.get(14)?,
        updated_at: row.get(15)?,
    })
}

impl AnalysisRow {
    fn into_record(self) -> Result<AnalysisRecord> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| Error::Parse(format!("Invalid analysis id {}: {}", self.id, e)))?;
        let status = AnalysisStatus::parse(&self.status)
            .ok_or_else(|| Error::Parse(format!("Unknown analysis status: {}", self.status)))?;

        Ok(AnalysisRecord {
            id,
            repository_url: self.repository_url,
            owner: self.owner,
            repository_name: self.repository_name,
            status,
            summary: self.summary,
            tech_stack: serde_json::from_str(&self.tech_stack_json).unwrap_or_default(),
            file_structure: serde_json::from_str(&self.file_structure_json).unwrap_or_default(),
            setup_instructions: self.setup_instructions,
            stats: RepoStats {
                stars: self.stars,
                forks: self.forks,
                language: self.language,
                description: self.description,
            },
            error_message: self.error_message,
            created_at: parse_timestamp(&self.created_at),
            updated_at: parse_timestamp(&self.updated_at),
        })
    }
}

struct ExportRow {
    id: String,
    analysis_id: String,
    format: String,
    file_path: String,
    file_size: i64,
    created_at: String,
}

fn raw_export_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ExportRow> {
    Ok(ExportRow {
        id: row.get(0)?,
        analysis_id: row.get(1)?,
        format: row.get(2)?,
        file_path: row.get(3)?,
        file_size: row.get(4)?,
        created_at: row.get(5)?,
    })
}

impl ExportRow {
    fn into_export(self) -> Result<ExportFile> {
        Ok(ExportFile {
            id: Uuid::parse_str(&self.id)
                .map_err(|e| Error::Parse(format!("Invalid export id {}: {}", self.id, e)))?,
            analysis_id: Uuid::parse_str(&self.analysis_id).map_err(|e| {
                Error::Parse(format!("Invalid analysis id {}: {}", self.analysis_id, e))
            })?,
            format: ExportFormat::parse(&self.format)?,
            file_path: self.file_path,
            file_size: self.file_size as u64,
            created_at: parse_timestamp(&self.created_at),
        })
    }
}

fn parse_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TechStack;

    fn sample_record() -> AnalysisRecord {
        let mut record = AnalysisRecord::new(
            "https://github.com/octocat/Hello-World",
            "octocat",
            "Hello-World",
        );
        record.summary = "A demo repository.".to_string();
        record.tech_stack = TechStack {
            primary_languages: vec!["C".to_string()],
            ..TechStack::default()
        };
        record.stats.stars = 80;
        record
    }

    #[test]
    fn insert_and_get_roundtrip() {
        let store = Store::in_memory().unwrap();
        let record = sample_record();
        store.insert_analysis(&record).unwrap();

        let loaded = store.get_analysis(&record.id).unwrap().unwrap();
        assert_eq!(loaded.id, record.id);
        assert_eq!(loaded.owner, "octocat");
        assert_eq!(loaded.status, AnalysisStatus::Pending);
        assert_eq!(loaded.summary, "A demo repository.");
        assert_eq!(loaded.tech_stack.primary_languages, vec!["C"]);
        assert_eq!(loaded.stats.stars, 80);
    }

    #[test]
    fn get_missing_analysis_is_none() {
        let store = Store::in_memory().unwrap();
        assert!(store.get_analysis(&Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn update_missing_analysis_errors() {
        let store = Store::in_memory().unwrap();
        let err = store.update_analysis(&sample_record()).unwrap_err();
        assert!(matches!(err, Error::AnalysisNotFound(_)));
    }

    #[test]
    fn update_persists_status_transition() {
        let store = Store::in_memory().unwrap();
        let mut record = sample_record();
        store.insert_analysis(&record).unwrap();

        record.status = AnalysisStatus::Completed;
        store.update_analysis(&record).unwrap();

        let loaded = store.get_analysis(&record.id).unwrap().unwrap();
        assert_eq!(loaded.status, AnalysisStatus::Completed);
    }

    #[test]
    fn list_filters_by_status() {
        let store = Store::in_memory().unwrap();
        let mut completed = sample_record();
        completed.status = AnalysisStatus::Completed;
        store.insert_analysis(&completed).unwrap();

        let pending = AnalysisRecord::new("https://github.com/octocat/other", "octocat", "other");
        store.insert_analysis(&pending).unwrap();

        let all = store.list_analyses(None, 50).unwrap();
        assert_eq!(all.len(), 2);

        let only_completed = store
            .list_analyses(Some(AnalysisStatus::Completed), 50)
            .unwrap();
        assert_eq!(only_completed.len(), 1);
        assert_eq!(only_completed[0].id, completed.id);
    }

    #[test]
    fn find_by_url_returns_latest() {
        let store = Store::in_memory().unwrap();
        let mut older = sample_record();
        older.created_at = older.created_at - chrono::Duration::minutes(5);
        store.insert_analysis(&older).unwrap();

        let newer = sample_record();
        store.insert_analysis(&newer).unwrap();

        let found = store
            .find_by_url("https://github.com/octocat/Hello-World")
            .unwrap()
            .unwrap();
        assert_eq!(found.id, newer.id);
    }

    #[test]
    fn export_upsert_overwrites_per_format() {
        let store = Store::in_memory().unwrap();
        let record = sample_record();
        store.insert_analysis(&record).unwrap();

        let first = ExportFile {
            id: Uuid::new_v4(),
            analysis_id: record.id,
            format: ExportFormat::Md,
            file_path: "exports/a.md".to_string(),
            file_size: 10,
            created_at: Utc::now(),
        };
        store.upsert_export(&first).unwrap();

        let second = ExportFile {
            id: Uuid::new_v4(),
            file_size: 20,
            ..first.clone()
        };
        store.upsert_export(&second).unwrap();

        let exports = store.list_exports(&record.id).unwrap();
        assert_eq!(exports.len(), 1);
        assert_eq!(exports[0].id, second.id);
        assert_eq!(exports[0].file_size, 20);

        let fetched = store.get_export(&record.id, ExportFormat::Md).unwrap().unwrap();
        assert_eq!(fetched.file_size, 20);
    }
}
