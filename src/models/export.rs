use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Md,
    Txt,
    Pdf,
    Docx,
}

impl ExportFormat {
    /// Parses a user-supplied format string. Unknown strings are an
    /// `UnsupportedFormat` error, not a panic or a silent default.
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "md" | "markdown" => Ok(ExportFormat::Md),
            "txt" | "text" => Ok(ExportFormat::Txt),
            "pdf" => Ok(ExportFormat::Pdf),
            "docx" => Ok(ExportFormat::Docx),
            other => Err(Error::UnsupportedFormat(other.to_string())),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Md => "md",
            ExportFormat::Txt => "txt",
            ExportFormat::Pdf => "pdf",
            ExportFormat::Docx => "docx",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Md => "text/markdown",
            ExportFormat::Txt => "text/plain",
            ExportFormat::Pdf => "application/pdf",
            ExportFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// A rendered document derived from a completed analysis. One row per
/// (analysis, format); re-export overwrites it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportFile {
    pub id: Uuid,
    pub analysis_id: Uuid,
    pub format: ExportFormat,
    pub file_path: String,
    pub file_size: u64,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_known_formats() {
        assert_eq!(ExportFormat::parse("md").unwrap(), ExportFormat::Md);
        assert_eq!(ExportFormat::parse("Markdown").unwrap(), ExportFormat::Md);
        assert_eq!(ExportFormat::parse("TXT").unwrap(), ExportFormat::Txt);
        assert_eq!(ExportFormat::parse("pdf").unwrap(), ExportFormat::Pdf);
        assert_eq!(ExportFormat::parse("docx").unwrap(), ExportFormat::Docx);
    }

    #[test]
    fn parse_rejects_unknown_format() {
        let err = ExportFormat::parse("xyz").unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(f) if f == "xyz"));
    }
}
