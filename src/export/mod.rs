pub mod docx;
pub mod pdf;
pub mod renderer;
pub mod service;

pub use renderer::{render, render_markdown, render_text};
pub use service::ExportService;
