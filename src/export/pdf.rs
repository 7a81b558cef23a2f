use printpdf::{BuiltinFont, Mm, PdfDocument};
use std::io::BufWriter;

use crate::error::{Error, Result};
use crate::export::renderer::render_text;
use crate::models::AnalysisRecord;

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 15.0;
const LINE_HEIGHT: f32 = 5.0;
const FONT_SIZE: f32 = 10.0;
const WRAP_COLUMNS: usize = 96;

/// Renders the analysis as an A4 PDF: the text rendering, line-wrapped and
/// paginated with a built-in Helvetica.
pub fn render_pdf(record: &AnalysisRecord) -> Result<Vec<u8>> {
    let (doc, first_page, first_layer) = PdfDocument::new(
        format!("Repository Analysis: {}", record.full_name()),
        Mm(PAGE_WIDTH),
        Mm(PAGE_HEIGHT),
        "content",
    );
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| Error::Render(e.to_string()))?;

    let mut layer = doc.get_page(first_page).get_layer(first_layer);
    let mut y = PAGE_HEIGHT - MARGIN;

    for line in wrap_lines(&render_text(record), WRAP_COLUMNS) {
        if y < MARGIN {
            let (page, new_layer) = doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "content");
            layer = doc.get_page(page).get_layer(new_layer);
            y = PAGE_HEIGHT - MARGIN;
        }
        if !line.is_empty() {
            layer.use_text(line, FONT_SIZE, Mm(MARGIN), Mm(y), &font);
        }
        y -= LINE_HEIGHT;
    }

    let mut writer = BufWriter::new(Vec::new());
    doc.save(&mut writer)
        .map_err(|e| Error::Render(e.to_string()))?;
    writer
        .into_inner()
        .map_err(|e| Error::Render(e.to_string()))
}

/// Greedy word wrap; overlong words are split hard at the column limit.
fn wrap_lines(text: &str, columns: usize) -> Vec<String> {
    let mut lines = Vec::new();

    for raw in text.lines() {
        if raw.chars().count() <= columns {
            lines.push(raw.to_string());
            continue;
        }

        let mut current = String::new();
        for word in raw.split_whitespace() {
            let word_len = word.chars().count();
            let current_len = current.chars().count();

            if current_len + word_len + 1 > columns && !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if word_len > columns {
                let chars: Vec<char> = word.chars().collect();
                for chunk in chars.chunks(columns) {
                    lines.push(chunk.iter().collect());
                }
                continue;
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
        }
        if !current.is_empty() {
            lines.push(current);
        }
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AnalysisStatus;

    #[test]
    fn produces_a_pdf_document() {
        let mut record = AnalysisRecord::new(
            "https://github.com/octocat/Hello-World",
            "octocat",
            "Hello-World",
        );
        record.status = AnalysisStatus::Completed;
        record.summary = "A demo. ".repeat(200);

        let bytes = render_pdf(&record).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn wraps_long_lines() {
        let wrapped = wrap_lines(&format!("{} tail", "word ".repeat(40)), 20);
        assert!(wrapped.len() > 1);
        assert!(wrapped.iter().all(|l| l.chars().count() <= 20));
    }

    #[test]
    fn splits_overlong_words() {
        let wrapped = wrap_lines(&"x".repeat(50), 20);
        assert_eq!(wrapped.len(), 3);
    }
}
