use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::Error;

/// LibreOffice binary used when no converter is configured.
pub fn default_converter() -> PathBuf {
    if cfg!(windows) {
        PathBuf::from(r"C:\Program Files\LibreOffice\program\soffice.exe")
    } else {
        PathBuf::from("libreoffice")
    }
}

/// Converts `input` to PDF next to it with a headless office suite and
/// returns the path of the PDF it should have written.
///
/// Blocks until the converter exits; there is no timeout.
pub fn export_pdf(input: &Path, converter: &Path) -> Result<PathBuf, Error> {
    let input = std::path::absolute(input)?;
    let out_dir = input
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    log::debug!("converting {} with {}", input.display(), converter.display());
    let output = Command::new(converter)
        .args(["--headless", "--convert-to", "pdf", "--outdir"])
        .arg(&out_dir)
        .arg(&input)
        .output()
        .map_err(|e| match e.kind() {
            ErrorKind::NotFound => Error::ConverterNotFound(converter.display().to_string()),
            _ => Error::Io(e),
        })?;

    if !output.status.success() {
        return Err(Error::ConversionFailed {
            path: input,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }
    Ok(input.with_extension("pdf"))
}
