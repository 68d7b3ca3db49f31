use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum Error {
    InvalidDocx(String),
    Zip(zip::result::ZipError),
    Xml(roxmltree::Error),
    XmlWrite(String),
    Image(image::ImageError),
    Io(std::io::Error),
    /// No "Notes" paragraph ahead of the first "Transcript" paragraph.
    NotesSectionNotFound,
    /// First paragraph does not start with a speaker/file code.
    MissingSpeakerCode(PathBuf),
    MissingParagraph(usize),
    ConverterNotFound(String),
    ConversionFailed { path: PathBuf, stderr: String },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidDocx(reason) => write!(f, "not a valid DOCX file: {reason}"),
            Error::Zip(e) => write!(f, "ZIP error: {e}"),
            Error::Xml(e) => write!(f, "XML error: {e}"),
            Error::XmlWrite(e) => write!(f, "XML write error: {e}"),
            Error::Image(e) => write!(f, "image error: {e}"),
            Error::Io(e) => write!(f, "IO error: {e}"),
            Error::NotesSectionNotFound => {
                write!(f, "no \"Notes\" paragraph found ahead of \"Transcript\"")
            }
            Error::MissingSpeakerCode(path) => {
                write!(f, "no speaker/file code in {}", path.display())
            }
            Error::MissingParagraph(index) => {
                write!(f, "document has no paragraph at position {index}")
            }
            Error::ConverterNotFound(cmd) => write!(f, "PDF converter not found: {cmd}"),
            Error::ConversionFailed { path, stderr } => {
                write!(f, "PDF conversion failed for {}: {}", path.display(), stderr.trim())
            }
        }
    }
}

impl std::error::Error for Error {}

impl From<zip::result::ZipError> for Error {
    fn from(e: zip::result::ZipError) -> Self {
        Error::Zip(e)
    }
}

impl From<roxmltree::Error> for Error {
    fn from(e: roxmltree::Error) -> Self {
        Error::Xml(e)
    }
}

impl From<image::ImageError> for Error {
    fn from(e: image::ImageError) -> Self {
        Error::Image(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}
