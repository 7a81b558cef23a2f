use docx_rs::{Docx, Paragraph, Run};
use std::io::Cursor;

use crate::error::{Error, Result};
use crate::models::AnalysisRecord;

// Run sizes are half-points: 32 = 16pt.
const TITLE_SIZE: usize = 32;
const HEADING_SIZE: usize = 26;

/// Renders the analysis as a Word document: a title, then one heading and
/// body block per populated section.
pub fn render_docx(record: &AnalysisRecord) -> Result<Vec<u8>> {
    let mut doc = Docx::new().add_paragraph(title(&format!(
        "Repository Analysis: {}",
        record.full_name()
    )));

    doc = doc.add_paragraph(body(&record.repository_url));
    if let Some(ref description) = record.stats.description {
        doc = doc.add_paragraph(body(description));
    }
    doc = doc.add_paragraph(body(&format!(
        "Stars: {}   Forks: {}   Primary Language: {}",
        record.stats.stars,
        record.stats.forks,
        record.stats.language.as_deref().unwrap_or("N/A")
    )));

    if !record.summary.is_empty() {
        doc = doc.add_paragraph(heading("Summary"));
        doc = add_text_block(doc, &record.summary);
    }

    if !record.tech_stack.is_empty() {
        doc = doc.add_paragraph(heading("Technology Stack"));
        for (label, entries) in record.tech_stack.categories() {
            doc = doc.add_paragraph(body(&format!("{}: {}", label, entries.join(", "))));
        }
    }

    if !record.file_structure.languages.is_empty() {
        doc = doc.add_paragraph(heading("Languages"));
        let mut langs: Vec<_> = record.file_structure.languages.iter().collect();
        langs.sort_by(|a, b| b.1.cmp(a.1));
        for (language, bytes) in langs {
            doc = doc.add_paragraph(body(&format!("{}: {} bytes", language, bytes)));
        }
    }

    if !record.setup_instructions.is_empty() {
        doc = doc.add_paragraph(heading("Setup Instructions"));
        doc = add_text_block(doc, &record.setup_instructions);
    }

    doc = doc.add_paragraph(body(&format!(
        "Analyzed on {}",
        record.updated_at.format("%Y-%m-%d %H:%M:%S UTC")
    )));

    let mut cursor = Cursor::new(Vec::new());
    doc.build()
        .pack(&mut cursor)
        .map_err(|e| Error::Render(e.to_string()))?;
    Ok(cursor.into_inner())
}

fn add_text_block(mut doc: Docx, text: &str) -> Docx {
    for line in text.lines().filter(|l| !l.trim().is_empty()) {
        doc = doc.add_paragraph(body(line));
    }
    doc
}

fn title(text: &str) -> Paragraph {
    Paragraph::new().add_run(Run::new().add_text(text).size(TITLE_SIZE).bold())
}

fn heading(text: &str) -> Paragraph {
    Paragraph::new().add_run(Run::new().add_text(text).size(HEADING_SIZE).bold())
}

fn body(text: &str) -> Paragraph {
    Paragraph::new().add_run(Run::new().add_text(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AnalysisStatus;

    #[test]
    fn produces_a_docx_archive() {
        let mut record = AnalysisRecord::new(
            "https://github.com/octocat/Hello-World",
            "octocat",
            "Hello-World",
        );
        record.status = AnalysisStatus::Completed;
        record.summary = "First line.\n\nSecond line.".to_string();

        let bytes = render_docx(&record).unwrap();
        // DOCX files are zip archives.
        assert!(bytes.starts_with(b"PK"));
    }
}
