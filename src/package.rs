use std::io::{Cursor, Read, Write};
use std::path::Path;

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::Error;
use crate::xml::{Element, Namespace, Node};

const PKG_REL_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const CONTENT_TYPES_NS: &str = "http://schemas.openxmlformats.org/package/2006/content-types";
const OFFICE_DOCUMENT_REL: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
pub(crate) const IMAGE_REL: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";

const CONTENT_TYPES_PART: &str = "[Content_Types].xml";
const DEFAULT_MAIN_PART: &str = "word/document.xml";

struct Entry {
    name: String,
    data: Vec<u8>,
    compression: CompressionMethod,
    is_dir: bool,
}

/// A DOCX (OPC) container held fully in memory.
///
/// Entries keep their original order and compression so rewriting a file
/// only changes the parts that were edited.
pub(crate) struct Package {
    entries: Vec<Entry>,
}

impl Package {
    pub(crate) fn open(path: &Path) -> Result<Package, Error> {
        let file = std::fs::File::open(path)?;
        let mut zip = ZipArchive::new(file)?;
        let mut entries = Vec::with_capacity(zip.len());
        for i in 0..zip.len() {
            let mut file = zip.by_index(i)?;
            let mut data = Vec::new();
            file.read_to_end(&mut data)?;
            entries.push(Entry {
                name: file.name().to_string(),
                data,
                compression: file.compression(),
                is_dir: file.is_dir(),
            });
        }
        Ok(Package { entries })
    }

    pub(crate) fn save(&self, path: &Path) -> Result<(), Error> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for entry in &self.entries {
            let method = match entry.compression {
                CompressionMethod::Stored => CompressionMethod::Stored,
                _ => CompressionMethod::Deflated,
            };
            let options = SimpleFileOptions::default().compression_method(method);
            if entry.is_dir {
                zip.add_directory(entry.name.as_str(), options)?;
                continue;
            }
            zip.start_file(entry.name.as_str(), options)?;
            zip.write_all(&entry.data)?;
        }
        // Build the whole archive before touching the file on disk.
        let bytes = zip.finish()?.into_inner();
        std::fs::write(path, bytes)?;
        Ok(())
    }

    pub(crate) fn part(&self, name: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|e| !e.is_dir && e.name == name)
            .map(|e| e.data.as_slice())
    }

    pub(crate) fn set_part(&mut self, name: &str, data: Vec<u8>) {
        match self.entries.iter_mut().find(|e| !e.is_dir && e.name == name) {
            Some(entry) => entry.data = data,
            None => self.entries.push(Entry {
                name: name.to_string(),
                data,
                compression: CompressionMethod::Deflated,
                is_dir: false,
            }),
        }
    }

    pub(crate) fn part_xml(&self, name: &str) -> Result<Element, Error> {
        let data = self
            .part(name)
            .ok_or_else(|| Error::InvalidDocx(format!("missing part {name}")))?;
        let text = std::str::from_utf8(data)
            .map_err(|e| Error::InvalidDocx(format!("{name} is not UTF-8: {e}")))?;
        Element::parse(text)
    }

    /// Resolves the main document part through the package relationships.
    pub(crate) fn main_document_part(&self) -> Result<String, Error> {
        let from_rels = match self.part("_rels/.rels") {
            Some(_) => self
                .part_xml("_rels/.rels")?
                .elements()
                .find(|r| {
                    r.is(PKG_REL_NS, "Relationship")
                        && r.attr(None, "Type") == Some(OFFICE_DOCUMENT_REL)
                })
                .and_then(|r| r.attr(None, "Target"))
                .map(|t| t.trim_start_matches('/').to_string()),
            None => None,
        };
        let name = from_rels.unwrap_or_else(|| DEFAULT_MAIN_PART.to_string());
        if self.part(&name).is_none() {
            return Err(Error::InvalidDocx(format!("missing main document part {name}")));
        }
        Ok(name)
    }

    /// Adds a relationship from `source_part` and returns its id.
    pub(crate) fn add_relationship(
        &mut self,
        source_part: &str,
        rel_type: &str,
        target: &str,
    ) -> Result<String, Error> {
        let rels_name = rels_part_name(source_part);
        let mut root = match self.part(&rels_name) {
            Some(_) => self.part_xml(&rels_name)?,
            None => {
                let mut root = Element::new(PKG_REL_NS, "Relationships");
                root.namespaces.push(Namespace { prefix: None, uri: PKG_REL_NS.to_string() });
                root
            }
        };

        let taken: Vec<&str> = root.elements().filter_map(|r| r.attr(None, "Id")).collect();
        let next = taken
            .iter()
            .filter_map(|id| id.strip_prefix("rId"))
            .filter_map(|n| n.parse::<u32>().ok())
            .max()
            .unwrap_or(0)
            + 1;
        let id = (next..)
            .map(|n| format!("rId{n}"))
            .find(|candidate| !taken.contains(&candidate.as_str()))
            .unwrap_or_else(|| format!("rId{next}"));

        root.children.push(Node::Element(
            Element::new(PKG_REL_NS, "Relationship")
                .with_attr(None, "Id", id.as_str())
                .with_attr(None, "Type", rel_type)
                .with_attr(None, "Target", target),
        ));
        self.set_part(&rels_name, root.to_xml()?);
        Ok(id)
    }

    /// Registers a `Default` content type for `extension` unless one exists.
    pub(crate) fn ensure_default_content_type(
        &mut self,
        extension: &str,
        content_type: &str,
    ) -> Result<(), Error> {
        let mut root = self.part_xml(CONTENT_TYPES_PART)?;
        let known = root.elements().any(|d| {
            d.is(CONTENT_TYPES_NS, "Default")
                && d.attr(None, "Extension")
                    .is_some_and(|e| e.eq_ignore_ascii_case(extension))
        });
        if known {
            return Ok(());
        }
        root.children.insert(
            0,
            Node::Element(
                Element::new(CONTENT_TYPES_NS, "Default")
                    .with_attr(None, "Extension", extension)
                    .with_attr(None, "ContentType", content_type),
            ),
        );
        self.set_part(CONTENT_TYPES_PART, root.to_xml()?);
        Ok(())
    }

    /// First `{dir}/{stem}{n}.{ext}` name that is not already a part.
    pub(crate) fn unused_part_name(&self, dir: &str, stem: &str, ext: &str) -> String {
        (1..)
            .map(|n| format!("{dir}/{stem}{n}.{ext}"))
            .find(|name| self.part(name).is_none())
            .unwrap_or_else(|| format!("{dir}/{stem}.{ext}"))
    }
}

/// `word/document.xml` -> `word/_rels/document.xml.rels`
pub(crate) fn rels_part_name(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{dir}/_rels/{file}.rels"),
        None => format!("_rels/{part}.rels"),
    }
}

/// Directory of a part name, empty for parts at the package root.
pub(crate) fn part_dir(part: &str) -> &str {
    part.rsplit_once('/').map_or("", |(dir, _)| dir)
}
