use std::path::Path;

use crate::error::Error;
use crate::model::{Alignment, Paragraph, Run, RunStyle};
use crate::package::Package;
use crate::xml::{Element, Node, XML_NS};

pub(crate) const WML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
pub(crate) const DML_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
pub(crate) const WPD_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing";
pub(crate) const PIC_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/picture";
pub(crate) const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// `wp:docPr` name that marks the logo paragraph.
pub(crate) const LOGO_NAME: &str = "docxside logo";

const EMU_PER_INCH: f64 = 914_400.0;

// CT_PPr and CT_RPr child sequences (ECMA-376 part 1, 17.3.1.26 / 17.3.2.28).
const PPR_ORDER: &[&str] = &[
    "pStyle", "keepNext", "keepLines", "pageBreakBefore", "framePr", "widowControl", "numPr",
    "suppressLineNumbers", "pBdr", "shd", "tabs", "suppressAutoHyphens", "kinsoku", "wordWrap",
    "overflowPunct", "topLinePunct", "autoSpaceDE", "autoSpaceDN", "bidi", "adjustRightInd",
    "snapToGrid", "spacing", "ind", "contextualSpacing", "mirrorIndents", "suppressOverlap", "jc",
    "textDirection", "textAlignment", "textboxTightWrap", "outlineLvl", "divId", "cnfStyle", "rPr",
    "sectPr", "pPrChange",
];
const RPR_ORDER: &[&str] = &[
    "rStyle", "rFonts", "b", "bCs", "i", "iCs", "caps", "smallCaps", "strike", "dstrike",
    "outline", "shadow", "emboss", "imprint", "noProof", "snapToGrid", "vanish", "webHidden",
    "color", "spacing", "w", "kern", "position", "sz", "szCs", "highlight", "u", "effect", "bdr",
    "shd", "fitText", "vertAlign", "rtl", "cs", "em", "lang", "eastAsianLayout", "specVanish",
    "oMath",
];

fn wml<'a>(node: &'a Element, name: &str) -> Option<&'a Element> {
    node.child(WML_NS, name)
}

fn wml_attr<'a>(node: &'a Element, child: &str) -> Option<&'a str> {
    wml(node, child).and_then(|n| n.attr(Some(WML_NS), "val"))
}

fn is_on(toggle: &Element) -> bool {
    !matches!(toggle.attr(Some(WML_NS), "val"), Some("0" | "false" | "off"))
}

/// The main document part of a DOCX file, parsed and ready to edit.
pub(crate) struct Document {
    package: Package,
    part_name: String,
    root: Element,
}

impl Document {
    pub(crate) fn open(path: &Path) -> Result<Document, Error> {
        let package = Package::open(path)?;
        let part_name = package.main_document_part()?;
        let root = package.part_xml(&part_name)?;
        if wml(&root, "body").is_none() {
            return Err(Error::InvalidDocx("missing w:body".into()));
        }
        Ok(Document { package, part_name, root })
    }

    pub(crate) fn save(&mut self, path: &Path) -> Result<(), Error> {
        let xml = self.root.to_xml()?;
        self.package.set_part(&self.part_name, xml);
        self.package.save(path)
    }

    pub(crate) fn package_mut(&mut self) -> &mut Package {
        &mut self.package
    }

    pub(crate) fn part_name(&self) -> &str {
        &self.part_name
    }

    pub(crate) fn body(&self) -> Result<&Element, Error> {
        wml(&self.root, "body").ok_or_else(|| Error::InvalidDocx("missing w:body".into()))
    }

    pub(crate) fn body_mut(&mut self) -> Result<&mut Element, Error> {
        self.root
            .child_mut(WML_NS, "body")
            .ok_or_else(|| Error::InvalidDocx("missing w:body".into()))
    }

    /// Body-level paragraphs with their child index in `w:body`.
    pub(crate) fn paragraphs(&self) -> Result<Vec<(usize, &Element)>, Error> {
        Ok(self
            .body()?
            .children
            .iter()
            .enumerate()
            .filter_map(|(i, n)| match n {
                Node::Element(e) if e.is(WML_NS, "p") => Some((i, e)),
                _ => None,
            })
            .collect())
    }

    /// Like [`Document::paragraphs`], minus a leading logo paragraph.
    pub(crate) fn content_paragraphs(&self) -> Result<Vec<(usize, &Element)>, Error> {
        Ok(self
            .paragraphs()?
            .into_iter()
            .skip_while(|(_, p)| is_logo_paragraph(p))
            .collect())
    }

    pub(crate) fn has_logo(&self) -> Result<bool, Error> {
        Ok(self.paragraphs()?.iter().any(|(_, p)| is_logo_paragraph(p)))
    }

    /// Body child at `index`, which must be an element.
    pub(crate) fn element_mut(&mut self, index: usize) -> Result<&mut Element, Error> {
        match self.body_mut()?.children.get_mut(index) {
            Some(Node::Element(e)) => Ok(e),
            _ => Err(Error::InvalidDocx(format!("no body element at {index}"))),
        }
    }

    pub(crate) fn insert(&mut self, index: usize, element: Element) -> Result<(), Error> {
        let body = self.body_mut()?;
        let index = index.min(body.children.len());
        body.children.insert(index, Node::Element(element));
        Ok(())
    }

    /// Largest `wp:docPr` id in use.
    pub(crate) fn max_drawing_id(&self) -> u32 {
        let mut max = 0u32;
        self.root.for_each_descendant(&mut |e| {
            if e.is(WPD_NS, "docPr")
                && let Some(id) = e.attr(None, "id").and_then(|v| v.parse::<u32>().ok())
            {
                max = max.max(id);
            }
        });
        max
    }

    pub(crate) fn snapshot(&self) -> Result<Vec<Paragraph>, Error> {
        Ok(self
            .paragraphs()?
            .into_iter()
            .map(|(_, p)| snapshot_paragraph(p))
            .collect())
    }
}

fn snapshot_paragraph(p: &Element) -> Paragraph {
    let alignment = wml(p, "pPr")
        .and_then(|ppr| wml_attr(ppr, "jc"))
        .map(Alignment::parse);

    let runs = paragraph_runs(p)
        .into_iter()
        .map(|run| {
            let rpr = wml(run, "rPr");
            let font_name = rpr
                .and_then(|n| wml(n, "rFonts"))
                .and_then(|n| n.attr(Some(WML_NS), "ascii"))
                .map(str::to_string);
            let font_size = rpr
                .and_then(|n| wml_attr(n, "sz"))
                .and_then(|v| v.parse::<f32>().ok())
                .map(|hp| hp / 2.0);
            let bold = rpr.and_then(|n| wml(n, "b")).is_some_and(is_on);
            let shaded = rpr.and_then(|n| wml(n, "shd")).is_some();
            Run { text: run_text(run), font_name, font_size, bold, shaded }
        })
        .collect();

    Paragraph {
        text: paragraph_text(p),
        alignment,
        runs,
        has_image: p.find_descendant(&|e| e.is(WML_NS, "drawing")).is_some(),
    }
}

pub(crate) fn is_paragraph(e: &Element) -> bool {
    e.is(WML_NS, "p")
}

pub(crate) fn is_logo_paragraph(p: &Element) -> bool {
    p.find_descendant(&|e| e.is(WPD_NS, "docPr") && e.attr(None, "name") == Some(LOGO_NAME))
        .is_some()
}

/// Runs of a paragraph in document order, including hyperlink runs.
pub(crate) fn paragraph_runs(p: &Element) -> Vec<&Element> {
    let mut runs = Vec::new();
    for child in p.elements() {
        if child.is(WML_NS, "r") {
            runs.push(child);
        } else if child.is(WML_NS, "hyperlink") {
            runs.extend(child.elements().filter(|r| r.is(WML_NS, "r")));
        }
    }
    runs
}

pub(crate) fn for_each_run_mut(p: &mut Element, f: &mut dyn FnMut(&mut Element)) {
    for child in p.elements_mut() {
        if child.is(WML_NS, "r") {
            f(child);
        } else if child.is(WML_NS, "hyperlink") {
            for run in child.elements_mut().filter(|r| r.is(WML_NS, "r")) {
                f(run);
            }
        }
    }
}

fn content_text(content: &Element) -> String {
    if content.namespace.as_deref() != Some(WML_NS) {
        return String::new();
    }
    match content.name.as_str() {
        "t" => content.text(),
        "tab" => "\t".to_string(),
        "br" | "cr" => "\n".to_string(),
        _ => String::new(),
    }
}

pub(crate) fn run_text(run: &Element) -> String {
    run.elements().map(content_text).collect()
}

pub(crate) fn paragraph_text(p: &Element) -> String {
    paragraph_runs(p).into_iter().map(run_text).collect()
}

/// Replaces the byte range `start..end` of [`paragraph_text`] in place.
///
/// Only `w:t` content is rewritten, so the runs keep their formatting. The
/// replacement lands in the first `w:t` the range touches.
pub(crate) fn replace_text(p: &mut Element, start: usize, end: usize, replacement: &str) {
    let mut offset = 0;
    let mut inserted = false;
    for_each_run_mut(p, &mut |run| {
        for content in run.elements_mut() {
            if !content.is(WML_NS, "t") {
                offset += content_text(content).len();
                continue;
            }
            let text = content.text();
            let (seg_start, seg_end) = (offset, offset + text.len());
            offset = seg_end;
            if seg_end <= start || seg_start >= end {
                continue;
            }
            let cut_start = start.saturating_sub(seg_start);
            let cut_end = (end - seg_start).min(text.len());
            let mut rewritten = String::with_capacity(text.len() + replacement.len());
            rewritten.push_str(&text[..cut_start]);
            if !inserted {
                rewritten.push_str(replacement);
                inserted = true;
            }
            rewritten.push_str(&text[cut_end..]);
            content.set_text(rewritten);
            content.set_attr(Some(XML_NS), "space", "preserve");
        }
    });
}

pub(crate) fn set_alignment(p: &mut Element, alignment: Alignment) {
    let jc = p
        .ensure_child(WML_NS, "pPr", &["pPr"])
        .and_then(|ppr| ppr.ensure_child(WML_NS, "jc", PPR_ORDER));
    if let Some(jc) = jc {
        jc.set_attr(Some(WML_NS), "val", alignment.as_wml());
    }
}

pub(crate) fn apply_run_style(run: &mut Element, style: &RunStyle) {
    let Some(rpr) = run.ensure_child(WML_NS, "rPr", &["rPr"]) else {
        return;
    };

    if let Some(fonts) = rpr.ensure_child(WML_NS, "rFonts", RPR_ORDER) {
        fonts.set_attr(Some(WML_NS), "ascii", style.font_name.as_str());
        fonts.set_attr(Some(WML_NS), "hAnsi", style.font_name.as_str());
        // Theme fonts win over explicit names, so drop them.
        fonts.remove_attr(Some(WML_NS), "asciiTheme");
        fonts.remove_attr(Some(WML_NS), "hAnsiTheme");
    }

    if let Some(bold) = rpr.ensure_child(WML_NS, "b", RPR_ORDER) {
        bold.attributes.clear();
        if !style.bold {
            bold.set_attr(Some(WML_NS), "val", "0");
        }
    }

    let half_points = (style.font_size * 2.0).round() as u32;
    if let Some(size) = rpr.ensure_child(WML_NS, "sz", RPR_ORDER) {
        size.set_attr(Some(WML_NS), "val", half_points.to_string());
    }
}

/// Removes `w:shd` from the run properties, returning whether one was there.
pub(crate) fn remove_run_shading(run: &mut Element) -> bool {
    run.child_mut(WML_NS, "rPr")
        .is_some_and(|rpr| rpr.remove_children(WML_NS, "shd") > 0)
}

/// A new paragraph holding a single styled text run.
pub(crate) fn text_paragraph(text: &str, style: &RunStyle, alignment: Alignment) -> Element {
    let t = Element::new(WML_NS, "t").with_text(text);
    let mut run = Element::new(WML_NS, "r").with_child(t);
    apply_run_style(&mut run, style);
    let mut p = Element::new(WML_NS, "p").with_child(run);
    set_alignment(&mut p, alignment);
    p
}

/// Inline picture placement for [`picture_paragraph`].
pub(crate) struct Picture<'a> {
    pub(crate) rel_id: &'a str,
    pub(crate) drawing_id: u32,
    pub(crate) file_name: &'a str,
    pub(crate) width_inches: f32,
    pub(crate) pixel_width: u32,
    pub(crate) pixel_height: u32,
}

impl Picture<'_> {
    /// Display size in EMU, height following the image's aspect ratio.
    pub(crate) fn extent(&self) -> (u64, u64) {
        let cx = (f64::from(self.width_inches) * EMU_PER_INCH).round() as u64;
        let ratio = f64::from(self.pixel_height) / f64::from(self.pixel_width.max(1));
        let cy = (cx as f64 * ratio).round() as u64;
        (cx, cy)
    }
}

/// A centered paragraph holding one inline picture run.
pub(crate) fn picture_paragraph(picture: &Picture) -> Element {
    let (cx, cy) = picture.extent();
    let dml = |name: &str| Element::new(DML_NS, name);
    let pic = |name: &str| Element::new(PIC_NS, name);

    let pic_el = pic("pic")
        .with_child(
            pic("nvPicPr")
                .with_child(
                    pic("cNvPr")
                        .with_attr(None, "id", "0")
                        .with_attr(None, "name", picture.file_name),
                )
                .with_child(pic("cNvPicPr")),
        )
        .with_child(
            pic("blipFill")
                .with_child(dml("blip").with_attr(Some(REL_NS), "embed", picture.rel_id))
                .with_child(dml("stretch").with_child(dml("fillRect"))),
        )
        .with_child(
            pic("spPr")
                .with_child(
                    dml("xfrm")
                        .with_child(dml("off").with_attr(None, "x", "0").with_attr(None, "y", "0"))
                        .with_child(
                            dml("ext")
                                .with_attr(None, "cx", cx.to_string())
                                .with_attr(None, "cy", cy.to_string()),
                        ),
                )
                .with_child(
                    dml("prstGeom")
                        .with_attr(None, "prst", "rect")
                        .with_child(dml("avLst")),
                ),
        );

    let inline = Element::new(WPD_NS, "inline")
        .with_attr(None, "distT", "0")
        .with_attr(None, "distB", "0")
        .with_attr(None, "distL", "0")
        .with_attr(None, "distR", "0")
        .with_child(
            Element::new(WPD_NS, "extent")
                .with_attr(None, "cx", cx.to_string())
                .with_attr(None, "cy", cy.to_string()),
        )
        .with_child(
            Element::new(WPD_NS, "docPr")
                .with_attr(None, "id", picture.drawing_id.to_string())
                .with_attr(None, "name", LOGO_NAME)
                .with_attr(None, "descr", picture.file_name),
        )
        .with_child(
            Element::new(WPD_NS, "cNvGraphicFramePr")
                .with_child(dml("graphicFrameLocks").with_attr(None, "noChangeAspect", "1")),
        )
        .with_child(
            dml("graphic").with_child(
                dml("graphicData")
                    .with_attr(None, "uri", PIC_NS)
                    .with_child(pic_el),
            ),
        );

    let run = Element::new(WML_NS, "r")
        .with_child(Element::new(WML_NS, "drawing").with_child(inline));
    let mut p = Element::new(WML_NS, "p").with_child(run);
    set_alignment(&mut p, Alignment::Center);
    p
}
