use crate::error::Result;
use crate::models::{AnalysisRecord, ExportFormat};

/// Renders a record to the requested format's bytes.
pub fn render(record: &AnalysisRecord, format: ExportFormat) -> Result<Vec<u8>> {
    match format {
        ExportFormat::Md => Ok(render_markdown(record).into_bytes()),
        ExportFormat::Txt => Ok(render_text(record).into_bytes()),
        ExportFormat::Pdf => crate::export::pdf::render_pdf(record),
        ExportFormat::Docx => crate::export::docx::render_docx(record),
    }
}

pub fn render_markdown(record: &AnalysisRecord) -> String {
    let mut output = String::new();

    output.push_str(&format!("# Repository Analysis: {}\n\n", record.full_name()));

    if let Some(ref description) = record.stats.description {
        output.push_str(&format!("> {}\n\n", description));
    }

    output.push_str("## Overview\n\n");
    output.push_str("| Metric | Value |\n|--------|-------|\n");
    output.push_str(&format!("| Repository | [{}]({}) |\n", record.full_name(), record.repository_url));
    output.push_str(&format!("| Stars | {} |\n", record.stats.stars));
    output.push_str(&format!("| Forks | {} |\n", record.stats.forks));
    if let Some(ref language) = record.stats.language {
        output.push_str(&format!("| Primary Language | {} |\n", language));
    }
    output.push_str(&format!("| Total Files | {} |\n", record.file_structure.total_files));

    if !record.summary.is_empty() {
        output.push_str("\n## Summary\n\n");
        output.push_str(&record.summary);
        output.push('\n');
    }

    if !record.tech_stack.is_empty() {
        output.push_str("\n## Technology Stack\n\n");
        for (label, entries) in record.tech_stack.categories() {
            output.push_str(&format!("- **{}**: {}\n", label, entries.join(", ")));
        }
    }

    if !record.file_structure.languages.is_empty() {
        output.push_str("\n## Languages\n\n");
        output.push_str("| Language | Bytes |\n|----------|-------|\n");
        let mut langs: Vec<_> = record.file_structure.languages.iter().collect();
        langs.sort_by(|a, b| b.1.cmp(a.1));
        for (language, bytes) in langs {
            output.push_str(&format!("| {} | {} |\n", language, bytes));
        }
    }

    if !record.file_structure.directories.is_empty() {
        output.push_str("\n## Structure\n\n");
        output.push_str(&format!(
            "Top-level directories: {}\n",
            record.file_structure.directories.join(", ")
        ));
        if !record.file_structure.important_files.is_empty() {
            output.push_str(&format!(
                "\nKey files: {}\n",
                record.file_structure.important_files.join(", ")
            ));
        }
    }

    if !record.setup_instructions.is_empty() {
        output.push_str("\n## Setup Instructions\n\n");
        output.push_str(&record.setup_instructions);
        output.push('\n');
    }

    output.push_str(&format!(
        "\n---\n*Analyzed on {}*\n",
        record.updated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    output
}

pub fn render_text(record: &AnalysisRecord) -> String {
    let mut output = String::new();

    output.push_str(&format!("=== Repository Analysis: {} ===\n\n", record.full_name()));
    output.push_str(&format!("URL: {}\n", record.repository_url));

    if let Some(ref description) = record.stats.description {
        output.push_str(&format!("Description: {}\n", description));
    }
    output.push_str(&format!(
        "Stars: {}  Forks: {}\n",
        record.stats.stars, record.stats.forks
    ));
    if let Some(ref language) = record.stats.language {
        output.push_str(&format!("Primary Language: {}\n", language));
    }
    output.push_str(&format!(
        "Total Files: {}\n",
        record.file_structure.total_files
    ));

    if !record.summary.is_empty() {
        output.push_str("\nSummary:\n");
        output.push_str(&record.summary);
        output.push('\n');
    }

    if !record.tech_stack.is_empty() {
        output.push_str("\nTechnology Stack:\n");
        for (label, entries) in record.tech_stack.categories() {
            output.push_str(&format!("  {}: {}\n", label, entries.join(", ")));
        }
    }

    if !record.file_structure.languages.is_empty() {
        output.push_str("\nLanguages:\n");
        let mut langs: Vec<_> = record.file_structure.languages.iter().collect();
        langs.sort_by(|a, b| b.1.cmp(a.1));
        for (language, bytes) in langs {
            output.push_str(&format!("  {}: {} bytes\n", language, bytes));
        }
    }

    if !record.setup_instructions.is_empty() {
        output.push_str("\nSetup Instructions:\n");
        output.push_str(&record.setup_instructions);
        output.push('\n');
    }

    output.push_str(&format!(
        "\nAnalyzed on: {}\n",
        record.updated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AnalysisStatus, TechStack};

    fn completed_record() -> AnalysisRecord {
        let mut record = AnalysisRecord::new(
            "https://github.com/octocat/Hello-World",
            "octocat",
            "Hello-World",
        );
        record.status = AnalysisStatus::Completed;
        record.summary = "A small demo repository.".to_string();
        record.setup_instructions = "1. Clone the repository.".to_string();
        record.stats.stars = 80;
        record.stats.language = Some("C".to_string());
        record.tech_stack = TechStack {
            primary_languages: vec!["C".to_string()],
            build_tools: vec!["make".to_string()],
            ..TechStack::default()
        };
        record.file_structure.total_files = 3;
        record.file_structure.languages.insert("C".to_string(), 14212);
        record
    }

    #[test]
    fn markdown_includes_all_sections() {
        let output = render_markdown(&completed_record());
        assert!(output.starts_with("# Repository Analysis: octocat/Hello-World"));
        assert!(output.contains("| Stars | 80 |"));
        assert!(output.contains("## Summary"));
        assert!(output.contains("- **Primary Languages**: C"));
        assert!(output.contains("- **Build Tools**: make"));
        assert!(output.contains("## Setup Instructions"));
    }

    #[test]
    fn text_output_has_no_markdown_syntax() {
        let output = render_text(&completed_record());
        assert!(output.contains("Stars: 80"));
        assert!(output.contains("Summary:"));
        assert!(!output.contains("##"));
        assert!(!output.contains("**"));
    }

    #[test]
    fn empty_sections_are_omitted() {
        let mut record = completed_record();
        record.tech_stack = TechStack::default();
        record.setup_instructions.clear();
        let output = render_markdown(&record);
        assert!(!output.contains("## Technology Stack"));
        assert!(!output.contains("## Setup Instructions"));
    }
}
