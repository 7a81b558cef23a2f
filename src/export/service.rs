use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::export::renderer::render;
use crate::models::{AnalysisRecord, AnalysisStatus, ExportFile, ExportFormat};
use crate::storage::Store;

/// Renders completed analyses to disk and tracks the resulting files.
/// One file per (analysis, format); re-export overwrites both the file and
/// its row.
pub struct ExportService {
    store: Arc<Store>,
    export_dir: PathBuf,
}

impl ExportService {
    pub fn new(store: Arc<Store>, export_dir: impl AsRef<Path>) -> Self {
        Self {
            store,
            export_dir: export_dir.as_ref().to_path_buf(),
        }
    }

    /// Export entry point for a caller-supplied format string. Unknown
    /// formats fail before any record lookup or file write.
    pub fn export_as(&self, analysis_id: Uuid, format_str: &str) -> Result<ExportFile> {
        let format = ExportFormat::parse(format_str)?;
        self.export(analysis_id, format)
    }

    pub fn export(&self, analysis_id: Uuid, format: ExportFormat) -> Result<ExportFile> {
        let record = self
            .store
            .get_analysis(&analysis_id)?
            .ok_or_else(|| Error::AnalysisNotFound(analysis_id.to_string()))?;

        if record.status != AnalysisStatus::Completed {
            return Err(Error::ExportUnavailable(record.status.to_string()));
        }

        let bytes = render(&record, format)?;

        fs::create_dir_all(&self.export_dir)?;
        let path = self.export_dir.join(format!(
            "{}_{}_{}.{}",
            record.owner,
            record.repository_name,
            record.id,
            format.extension()
        ));
        fs::write(&path, &bytes)?;
        tracing::info!("Exported {} as {} to {}", record.id, format, path.display());

        let export = ExportFile {
            id: Uuid::new_v4(),
            analysis_id,
            format,
            file_path: path.to_string_lossy().into_owned(),
            file_size: bytes.len() as u64,
            created_at: Utc::now(),
        };
        self.store.upsert_export(&export)?;
        Ok(export)
    }

    /// Reads a previously exported document back. A missing file on disk is
    /// regenerated from the record rather than failing the download.
    pub fn download(&self, analysis_id: Uuid, format: ExportFormat) -> Result<(ExportFile, Vec<u8>)> {
        let export = self
            .store
            .get_export(&analysis_id, format)?
            .ok_or_else(|| {
                Error::ExportNotFound(analysis_id.to_string(), format.to_string())
            })?;

        match fs::read(&export.file_path) {
            Ok(bytes) => Ok((export, bytes)),
            Err(_) => {
                tracing::warn!(
                    "Export file {} missing, regenerating",
                    export.file_path
                );
                let export = self.export(analysis_id, format)?;
                let bytes = fs::read(&export.file_path)?;
                Ok((export, bytes))
            }
        }
    }

    /// Filename suggested to a downloader, independent of the storage path.
    pub fn download_filename(record: &AnalysisRecord, format: ExportFormat) -> String {
        format!(
            "{}_{}_analysis.{}",
            record.repository_name,
            record.owner,
            format.extension()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn completed_record() -> AnalysisRecord {
        let mut record = AnalysisRecord::new(
            "https://github.com/octocat/Hello-World",
            "octocat",
            "Hello-World",
        );
        record.status = AnalysisStatus::Completed;
        record.summary = "A demo repository.".to_string();
        record
    }

    fn service_with(record: &AnalysisRecord) -> (ExportService, TempDir) {
        let store = Arc::new(Store::in_memory().unwrap());
        store.insert_analysis(record).unwrap();
        let dir = TempDir::new().unwrap();
        (ExportService::new(store, dir.path()), dir)
    }

    #[test]
    fn export_writes_file_and_records_row() {
        let record = completed_record();
        let (service, _dir) = service_with(&record);

        let export = service.export(record.id, ExportFormat::Md).unwrap();
        assert!(export.file_size > 0);

        let content = fs::read_to_string(&export.file_path).unwrap();
        assert!(content.contains("octocat/Hello-World"));

        let row = service
            .store
            .get_export(&record.id, ExportFormat::Md)
            .unwrap()
            .unwrap();
        assert_eq!(row.file_path, export.file_path);
    }

    #[test]
    fn unknown_format_fails_without_creating_anything() {
        let record = completed_record();
        let (service, _dir) = service_with(&record);

        let err = service.export_as(record.id, "xyz").unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(f) if f == "xyz"));
        assert!(service.store.list_exports(&record.id).unwrap().is_empty());
    }

    #[test]
    fn non_completed_analysis_fails_for_every_format() {
        for status in [
            AnalysisStatus::Pending,
            AnalysisStatus::Analyzing,
            AnalysisStatus::Failed,
        ] {
            let mut record = completed_record();
            record.status = status;
            let (service, _dir) = service_with(&record);

            for format in [
                ExportFormat::Md,
                ExportFormat::Txt,
                ExportFormat::Pdf,
                ExportFormat::Docx,
            ] {
                let err = service.export(record.id, format).unwrap_err();
                assert!(
                    matches!(&err, Error::ExportUnavailable(s) if *s == status.to_string()),
                    "expected precondition failure for {:?}/{:?}, got {:?}",
                    status,
                    format,
                    err
                );
            }
            assert!(service.store.list_exports(&record.id).unwrap().is_empty());
        }
    }

    #[test]
    fn reexport_overwrites_instead_of_accumulating() {
        let record = completed_record();
        let (service, _dir) = service_with(&record);

        service.export(record.id, ExportFormat::Txt).unwrap();
        service.export(record.id, ExportFormat::Txt).unwrap();

        assert_eq!(service.store.list_exports(&record.id).unwrap().len(), 1);
    }

    #[test]
    fn download_regenerates_missing_file() {
        let record = completed_record();
        let (service, _dir) = service_with(&record);

        let export = service.export(record.id, ExportFormat::Txt).unwrap();
        fs::remove_file(&export.file_path).unwrap();

        let (regenerated, bytes) = service.download(record.id, ExportFormat::Txt).unwrap();
        assert!(!bytes.is_empty());
        assert!(Path::new(&regenerated.file_path).exists());
    }

    #[test]
    fn download_without_export_errors() {
        let record = completed_record();
        let (service, _dir) = service_with(&record);

        let err = service.download(record.id, ExportFormat::Pdf).unwrap_err();
        assert!(matches!(err, Error::ExportNotFound(_, _)));
    }

    #[test]
    fn pdf_and_docx_exports_produce_binary_files() {
        let record = completed_record();
        let (service, _dir) = service_with(&record);

        let pdf = service.export(record.id, ExportFormat::Pdf).unwrap();
        let pdf_bytes = fs::read(&pdf.file_path).unwrap();
        assert!(pdf_bytes.starts_with(b"%PDF"));

        let docx = service.export(record.id, ExportFormat::Docx).unwrap();
        let docx_bytes = fs::read(&docx.file_path).unwrap();
        assert!(docx_bytes.starts_with(b"PK"));
    }
}
