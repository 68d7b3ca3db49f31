use std::path::PathBuf;

use crate::model::RunStyle;

/// What the batch does with a document whose first paragraph lacks the
/// speaker/file code.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Stop the whole batch; later files are not touched.
    #[default]
    Abort,
    /// Report the file and carry on with the next one.
    Skip,
}

#[derive(Clone, Debug)]
pub struct Config {
    /// Folder whose `.docx` files are edited in place.
    pub input_folder: PathBuf,
    pub logo_path: PathBuf,
    /// Style forced onto the speaker code and "Transcript" heading runs.
    pub heading_style: RunStyle,
    pub logo_width_inches: f32,
    pub converter: PathBuf,
    pub on_missing_code: FailurePolicy,
}

impl Config {
    pub fn new(input_folder: impl Into<PathBuf>, logo_path: impl Into<PathBuf>) -> Self {
        Config {
            input_folder: input_folder.into(),
            logo_path: logo_path.into(),
            heading_style: RunStyle::default(),
            logo_width_inches: 6.5,
            converter: crate::pdf::default_converter(),
            on_missing_code: FailurePolicy::default(),
        }
    }
}
