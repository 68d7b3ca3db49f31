//! The house-style edits applied to each transcript.
//!
//! Every public step opens the file, applies one change and saves it again,
//! so a failing step leaves the file as the previous step wrote it. A step
//! that returns an error does not save.

use std::io::Cursor;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::docx::{self, Document, Picture};
use crate::error::Error;
use crate::model::{Alignment, RunStyle};
use crate::package::{self, IMAGE_REL};

const NOTES: &str = "Notes";
const TRANSCRIPT: &str = "Transcript";
const SPEAKER_CODE_PREFIX: &str = "UC";

static CODE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_(\d{1,2})_").expect("code number pattern is valid"));

fn edit_in_place<T>(
    path: &Path,
    step: &str,
    edit: impl FnOnce(&mut Document) -> Result<T, Error>,
) -> Result<T, Error> {
    log::debug!("{step}: {}", path.display());
    let mut doc = Document::open(path)?;
    let out = edit(&mut doc)?;
    doc.save(path)?;
    Ok(out)
}

/// Removes the vendor "Notes" section: every paragraph from "Notes" up to,
/// but not including, the first "Transcript". Returns how many went.
pub fn delete_notes_section(path: &Path) -> Result<usize, Error> {
    edit_in_place(path, "delete notes section", delete_notes)
}

/// Strips character shading from every run. The vendor uses shading rather
/// than highlighting to mark text. Returns the number of runs changed.
pub fn remove_highlight_shading(path: &Path) -> Result<usize, Error> {
    edit_in_place(path, "remove shading", remove_shading)
}

/// Styles the speaker/file code paragraph and right-aligns it. Fails with
/// [`Error::MissingSpeakerCode`] when the first paragraph is not a code.
pub fn fix_speaker_code_paragraph(path: &Path, style: &RunStyle) -> Result<(), Error> {
    edit_in_place(path, "fix speaker code", |doc| style_speaker_code(doc, path, style))
}

/// Zero-pads a single digit code number (`_7_` becomes `_07_`).
/// Returns whether the paragraph changed.
pub fn fix_leading_zero(path: &Path) -> Result<bool, Error> {
    edit_in_place(path, "fix code number", pad_code_number)
}

/// Makes sure the second paragraph is a styled "Transcript" heading,
/// inserting one if needed. Returns whether a paragraph was inserted.
pub fn ensure_transcript_heading(path: &Path, style: &RunStyle) -> Result<bool, Error> {
    edit_in_place(path, "ensure transcript heading", |doc| ensure_heading(doc, style))
}

/// Inserts the logo as a centered paragraph ahead of the first paragraph.
/// Returns `false` when the document already carries the logo.
pub fn insert_logo_image(path: &Path, logo_path: &Path, width_inches: f32) -> Result<bool, Error> {
    let logo = Logo::load(logo_path)?;
    edit_in_place(path, "insert logo", |doc| insert_logo(doc, &logo, width_inches))
}

pub(crate) fn delete_notes(doc: &mut Document) -> Result<usize, Error> {
    let paragraphs = doc.paragraphs()?;

    let mut notes = None;
    let mut transcript = None;
    for (position, (_, p)) in paragraphs.iter().enumerate() {
        match docx::paragraph_text(p).trim() {
            NOTES => notes = Some(position),
            TRANSCRIPT => {
                transcript = Some(position);
                break;
            }
            _ => {}
        }
    }
    let (Some(notes), Some(transcript)) = (notes, transcript) else {
        return Err(Error::NotesSectionNotFound);
    };

    let doomed: Vec<usize> = paragraphs[notes..transcript].iter().map(|(i, _)| *i).collect();
    let body = doc.body_mut()?;
    for index in doomed.iter().rev() {
        body.children.remove(*index);
    }
    Ok(doomed.len())
}

pub(crate) fn remove_shading(doc: &mut Document) -> Result<usize, Error> {
    let mut changed = 0;
    for p in doc.body_mut()?.elements_mut().filter(|e| docx::is_paragraph(e)) {
        docx::for_each_run_mut(p, &mut |run| {
            if docx::remove_run_shading(run) {
                changed += 1;
            }
        });
    }
    Ok(changed)
}

pub(crate) fn style_speaker_code(
    doc: &mut Document,
    path: &Path,
    style: &RunStyle,
) -> Result<(), Error> {
    let has_code = doc.content_paragraphs()?.first().map(|(index, first)| {
        let text = docx::paragraph_text(first);
        (*index, text.starts_with(SPEAKER_CODE_PREFIX))
    });
    let Some((index, true)) = has_code else {
        return Err(Error::MissingSpeakerCode(path.to_path_buf()));
    };

    let p = doc.element_mut(index)?;
    docx::for_each_run_mut(p, &mut |run| docx::apply_run_style(run, style));
    docx::set_alignment(p, Alignment::Right);
    Ok(())
}

pub(crate) fn pad_code_number(doc: &mut Document) -> Result<bool, Error> {
    let Some(&(index, first)) = doc.content_paragraphs()?.first() else {
        return Ok(false);
    };
    let text = docx::paragraph_text(first);
    let Some(caps) = CODE_NUMBER.captures(&text) else {
        return Ok(false);
    };
    let (Some(whole), Some(digits)) = (caps.get(0), caps.get(1)) else {
        return Ok(false);
    };
    if digits.as_str().chars().count() != 1 {
        return Ok(false);
    }

    let replacement = format!("_0{}_", digits.as_str());
    docx::replace_text(doc.element_mut(index)?, whole.start(), whole.end(), &replacement);
    Ok(true)
}

pub(crate) fn ensure_heading(doc: &mut Document, style: &RunStyle) -> Result<bool, Error> {
    let paragraphs = doc.content_paragraphs()?;
    let Some(&(index, second)) = paragraphs.get(1) else {
        return Err(Error::MissingParagraph(1));
    };

    if docx::paragraph_text(second).contains(TRANSCRIPT) {
        let p = doc.element_mut(index)?;
        docx::for_each_run_mut(p, &mut |run| docx::apply_run_style(run, style));
        docx::set_alignment(p, Alignment::Left);
        Ok(false)
    } else {
        doc.insert(index, docx::text_paragraph(TRANSCRIPT, style, Alignment::Left))?;
        Ok(true)
    }
}

/// Logo image read from disk, with the details needed to embed it.
pub(crate) struct Logo {
    data: Vec<u8>,
    file_name: String,
    extension: &'static str,
    content_type: &'static str,
    pixel_width: u32,
    pixel_height: u32,
}

impl Logo {
    pub(crate) fn load(path: &Path) -> Result<Logo, Error> {
        let data = std::fs::read(path)?;
        let format = image::guess_format(&data)?;
        let reader = image::ImageReader::with_format(Cursor::new(data.as_slice()), format);
        let (pixel_width, pixel_height) = reader.into_dimensions()?;
        let extension = format.extensions_str().first().copied().unwrap_or("png");
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("logo.{extension}"));
        Ok(Logo {
            data,
            file_name,
            extension,
            content_type: format.to_mime_type(),
            pixel_width,
            pixel_height,
        })
    }
}

pub(crate) fn insert_logo(
    doc: &mut Document,
    logo: &Logo,
    width_inches: f32,
) -> Result<bool, Error> {
    if doc.has_logo()? {
        log::info!("logo already present, leaving document as is");
        return Ok(false);
    }
    let Some(&(index, _)) = doc.content_paragraphs()?.first() else {
        return Err(Error::MissingParagraph(0));
    };

    let part_dir = package::part_dir(doc.part_name()).to_string();
    let media_dir = if part_dir.is_empty() {
        "media".to_string()
    } else {
        format!("{part_dir}/media")
    };
    let drawing_id = doc.max_drawing_id() + 1;
    let part_name = doc.package_mut().unused_part_name(&media_dir, "image", logo.extension);
    let target = part_name
        .strip_prefix(&format!("{part_dir}/"))
        .unwrap_or(&part_name)
        .to_string();
    let source_part = doc.part_name().to_string();

    let package = doc.package_mut();
    package.set_part(&part_name, logo.data.clone());
    package.ensure_default_content_type(logo.extension, logo.content_type)?;
    let rel_id = package.add_relationship(&source_part, IMAGE_REL, &target)?;

    let paragraph = docx::picture_paragraph(&Picture {
        rel_id: &rel_id,
        drawing_id,
        file_name: &logo.file_name,
        width_inches,
        pixel_width: logo.pixel_width,
        pixel_height: logo.pixel_height,
    });
    doc.insert(index, paragraph)?;
    Ok(true)
}
