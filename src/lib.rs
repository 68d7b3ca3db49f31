mod batch;
mod config;
mod docx;
mod edit;
mod error;
mod model;
mod package;
mod pdf;
mod xml;

pub use batch::{BatchReport, CONFIRM_PROMPT, confirm_overwrite, document_files, run as run_batch};
pub use config::{Config, FailurePolicy};
pub use edit::{
    delete_notes_section, ensure_transcript_heading, fix_leading_zero, fix_speaker_code_paragraph,
    insert_logo_image, remove_highlight_shading,
};
pub use error::Error;
pub use model::{Alignment, Paragraph, Run, RunStyle};
pub use pdf::{default_converter, export_pdf};

use std::path::Path;

/// Reads the body paragraphs of a DOCX file.
pub fn inspect(path: &Path) -> Result<Vec<Paragraph>, Error> {
    docx::Document::open(path)?.snapshot()
}
