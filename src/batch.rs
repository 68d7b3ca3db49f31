use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use crate::config::{Config, FailurePolicy};
use crate::edit;
use crate::error::Error;
use crate::pdf;

pub const CONFIRM_PROMPT: &str =
    "Your current documents will be overwritten. Ensure you have a backup. Do you wish to proceed? [y/n]: ";

/// Word and the editing libraries leave `~$name.docx` lock files around.
const LOCK_FILE_PREFIX: &str = "~$";

#[derive(Debug, Default)]
pub struct BatchReport {
    pub edited: Vec<PathBuf>,
    /// Files left out under [`FailurePolicy::Skip`].
    pub skipped: Vec<PathBuf>,
    /// Edited files whose PDF export failed.
    pub export_failures: Vec<PathBuf>,
}

/// Asks before anything gets overwritten. Keeps asking until the answer is
/// `y` or `n`; end of input counts as `n`.
pub fn confirm_overwrite<R: BufRead, W: Write>(mut input: R, mut output: W) -> io::Result<bool> {
    loop {
        write!(output, "{CONFIRM_PROMPT}")?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            writeln!(output)?;
            return Ok(false);
        }
        match line.trim().to_lowercase().as_str() {
            "y" => return Ok(true),
            "n" => return Ok(false),
            _ => writeln!(output, "Invalid input. Please enter 'y' or 'n'.")?,
        }
    }
}

/// The `.docx` files in `folder`, sorted by name, without lock files.
pub fn document_files(folder: &Path) -> Result<Vec<PathBuf>, Error> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(folder)? {
        let entry = entry?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with(LOCK_FILE_PREFIX) || !name.ends_with(".docx") {
            continue;
        }
        let path = entry.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Edits every document in the input folder, then exports each to PDF.
///
/// Does not ask for confirmation; callers go through
/// [`confirm_overwrite`] first.
pub fn run(config: &Config) -> Result<BatchReport, Error> {
    let mut report = BatchReport::default();
    for path in document_files(&config.input_folder)? {
        process_document(&path, config, &mut report)?;
    }
    log::info!(
        "{} edited, {} skipped, {} without PDF",
        report.edited.len(),
        report.skipped.len(),
        report.export_failures.len()
    );
    Ok(report)
}

fn process_document(path: &Path, config: &Config, report: &mut BatchReport) -> Result<(), Error> {
    log::info!("editing {}", path.display());

    match edit::delete_notes_section(path) {
        Ok(removed) => log::debug!("removed {removed} notes paragraphs"),
        Err(Error::NotesSectionNotFound) => {
            log::warn!(
                "{}: no \"Notes\" section before \"Transcript\", left as is",
                path.display()
            );
        }
        Err(e) => return Err(e),
    }

    edit::remove_highlight_shading(path)?;

    match edit::fix_speaker_code_paragraph(path, &config.heading_style) {
        Ok(()) => {}
        Err(e @ Error::MissingSpeakerCode(_)) if config.on_missing_code == FailurePolicy::Skip => {
            log::warn!("{e}, skipping");
            report.skipped.push(path.to_path_buf());
            return Ok(());
        }
        Err(e) => return Err(e),
    }

    edit::fix_leading_zero(path)?;
    edit::ensure_transcript_heading(path, &config.heading_style)?;
    edit::insert_logo_image(path, &config.logo_path, config.logo_width_inches)?;
    report.edited.push(path.to_path_buf());

    match pdf::export_pdf(path, &config.converter) {
        Ok(pdf) => log::info!("wrote {}", pdf.display()),
        Err(e @ (Error::ConverterNotFound(_) | Error::ConversionFailed { .. })) => {
            log::error!("{e}");
            report.export_failures.push(path.to_path_buf());
        }
        Err(e) => return Err(e),
    }
    Ok(())
}
