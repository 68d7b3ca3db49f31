#![allow(dead_code)]

use std::fs;
use std::io::{Read, Write};
use std::path::Path;

use zip::ZipArchive;
use zip::write::SimpleFileOptions;

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/><Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/></Types>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

const DOCUMENT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/></Relationships>"#;

pub const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:docDefaults><w:rPrDefault><w:rPr><w:sz w:val="22"/></w:rPr></w:rPrDefault></w:docDefaults></w:styles>"#;

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

/// A plain single-run paragraph.
pub fn para(text: &str) -> String {
    format!(r#"<w:p><w:r><w:t xml:space="preserve">{}</w:t></w:r></w:p>"#, escape(text))
}

/// A paragraph whose run carries the vendor's character shading next to italics.
pub fn shaded_para(text: &str) -> String {
    format!(
        r#"<w:p><w:r><w:rPr><w:i/><w:shd w:val="clear" w:color="auto" w:fill="FFFF00"/></w:rPr><w:t xml:space="preserve">{}</w:t></w:r></w:p>"#,
        escape(text)
    )
}

/// One paragraph split over several runs.
pub fn split_para(parts: &[&str]) -> String {
    let runs: String = parts
        .iter()
        .map(|t| format!(r#"<w:r><w:t xml:space="preserve">{}</w:t></w:r>"#, escape(t)))
        .collect();
    format!("<w:p>{runs}</w:p>")
}

/// Paragraph layout of a vendor transcript: code, notes, transcript.
pub fn vendor_template(code: &str, filler: usize) -> Vec<String> {
    let mut paragraphs = vec![para(code), para("Notes")];
    paragraphs.extend((0..filler).map(|i| para(&format!("note line {i}"))));
    paragraphs.push(para("Transcript"));
    paragraphs.push(shaded_para("Speaker 1 [00:00:01]: Thanks for joining."));
    paragraphs.push(para("Speaker 2 [00:00:04]: Happy to be here."));
    paragraphs
}

pub fn document_xml(paragraphs: &[String]) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing" xmlns:mc="http://schemas.openxmlformats.org/markup-compatibility/2006" xmlns:w14="http://schemas.microsoft.com/office/word/2010/wordml" mc:Ignorable="w14"><w:body>{}<w:sectPr><w:pgSz w:w="12240" w:h="15840"/></w:sectPr></w:body></w:document>"#,
        paragraphs.concat()
    )
}

pub fn write_docx(path: &Path, paragraphs: &[String]) {
    let file = fs::File::create(path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    let parts = [
        ("[Content_Types].xml", CONTENT_TYPES.to_string()),
        ("_rels/.rels", PACKAGE_RELS.to_string()),
        ("word/document.xml", document_xml(paragraphs)),
        ("word/_rels/document.xml.rels", DOCUMENT_RELS.to_string()),
        ("word/styles.xml", STYLES.to_string()),
    ];
    for (name, content) in parts {
        zip.start_file(name, SimpleFileOptions::default()).unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
}

/// A 40x10 PNG, so the logo is four times wider than tall.
pub fn write_logo(path: &Path) {
    image::RgbImage::from_pixel(40, 10, image::Rgb([200, 30, 60]))
        .save(path)
        .unwrap();
}

pub fn read_part_bytes(docx: &Path, name: &str) -> Option<Vec<u8>> {
    let mut zip = ZipArchive::new(fs::File::open(docx).unwrap()).unwrap();
    let mut part = zip.by_name(name).ok()?;
    let mut content = Vec::new();
    part.read_to_end(&mut content).unwrap();
    Some(content)
}

/// Reads an XML part as text.
pub fn read_part(docx: &Path, name: &str) -> Option<String> {
    read_part_bytes(docx, name).map(|bytes| String::from_utf8(bytes).unwrap())
}

pub fn texts(docx: &Path) -> Vec<String> {
    docxside_restyle::inspect(docx)
        .unwrap()
        .into_iter()
        .map(|p| p.text)
        .collect()
}
