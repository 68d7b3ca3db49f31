//! Owned, mutable XML tree.
//!
//! `roxmltree` only gives a read-only view, so parts that get edited are
//! copied into [`Element`] trees and written back with `quick-xml`. Namespace
//! declarations are kept on the element that declared them, which keeps
//! prefixes such as `mc:Ignorable` references valid after a save.

use std::fmt;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::error::Error;

pub(crate) const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

/// Prefixes used when a namespace is not declared anywhere in scope.
const PREFERRED_PREFIXES: &[(&str, &str)] = &[
    ("http://schemas.openxmlformats.org/wordprocessingml/2006/main", "w"),
    ("http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing", "wp"),
    ("http://schemas.openxmlformats.org/drawingml/2006/main", "a"),
    ("http://schemas.openxmlformats.org/drawingml/2006/picture", "pic"),
    ("http://schemas.openxmlformats.org/officeDocument/2006/relationships", "r"),
];

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Namespace {
    pub(crate) prefix: Option<String>,
    pub(crate) uri: String,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Attribute {
    pub(crate) namespace: Option<String>,
    pub(crate) name: String,
    pub(crate) value: String,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Node {
    Element(Element),
    Text(String),
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Element {
    pub(crate) namespace: Option<String>,
    pub(crate) name: String,
    pub(crate) namespaces: Vec<Namespace>,
    pub(crate) attributes: Vec<Attribute>,
    pub(crate) children: Vec<Node>,
}

impl Element {
    pub(crate) fn new(namespace: &str, name: &str) -> Self {
        Element {
            namespace: Some(namespace.to_string()),
            name: name.to_string(),
            namespaces: Vec::new(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub(crate) fn parse(xml: &str) -> Result<Element, Error> {
        let xml = xml.strip_prefix('\u{feff}').unwrap_or(xml);
        let doc = roxmltree::Document::parse(xml)?;
        Ok(convert(doc.root_element()))
    }

    pub(crate) fn is(&self, namespace: &str, name: &str) -> bool {
        self.name == name && self.namespace.as_deref() == Some(namespace)
    }

    pub(crate) fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    pub(crate) fn elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    pub(crate) fn child(&self, namespace: &str, name: &str) -> Option<&Element> {
        self.elements().find(|e| e.is(namespace, name))
    }

    pub(crate) fn child_mut(&mut self, namespace: &str, name: &str) -> Option<&mut Element> {
        self.elements_mut().find(|e| e.is(namespace, name))
    }

    pub(crate) fn attr(&self, namespace: Option<&str>, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name && a.namespace.as_deref() == namespace)
            .map(|a| a.value.as_str())
    }

    pub(crate) fn set_attr(
        &mut self,
        namespace: Option<&str>,
        name: &str,
        value: impl Into<String>,
    ) {
        let value = value.into();
        match self
            .attributes
            .iter_mut()
            .find(|a| a.name == name && a.namespace.as_deref() == namespace)
        {
            Some(existing) => existing.value = value,
            None => self.attributes.push(Attribute {
                namespace: namespace.map(str::to_string),
                name: name.to_string(),
                value,
            }),
        }
    }

    pub(crate) fn remove_attr(&mut self, namespace: Option<&str>, name: &str) {
        self.attributes
            .retain(|a| !(a.name == name && a.namespace.as_deref() == namespace));
    }

    /// Builder form of [`Element::set_attr`].
    pub(crate) fn with_attr(
        mut self,
        namespace: Option<&str>,
        name: &str,
        value: impl Into<String>,
    ) -> Self {
        self.set_attr(namespace, name, value);
        self
    }

    pub(crate) fn with_child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    pub(crate) fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    /// Removes every direct child with the given name, returning how many went.
    pub(crate) fn remove_children(&mut self, namespace: &str, name: &str) -> usize {
        let before = self.children.len();
        self.children
            .retain(|n| !matches!(n, Node::Element(e) if e.is(namespace, name)));
        before - self.children.len()
    }

    /// Concatenated text of the direct text children.
    pub(crate) fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|n| match n {
                Node::Text(t) => Some(t.as_str()),
                Node::Element(_) => None,
            })
            .collect()
    }

    pub(crate) fn set_text(&mut self, text: impl Into<String>) {
        self.children.retain(|n| matches!(n, Node::Element(_)));
        self.children.push(Node::Text(text.into()));
    }

    /// Returns the named child, creating it if needed.
    ///
    /// `order` lists the local names of the schema sequence the parent
    /// follows; a new child is placed after every sibling that precedes it in
    /// that sequence. Siblings missing from `order` are left where they are.
    pub(crate) fn ensure_child(
        &mut self,
        namespace: &str,
        name: &str,
        order: &[&str],
    ) -> Option<&mut Element> {
        if self.child(namespace, name).is_none() {
            let insert_at = self.schema_position(namespace, name, order);
            self.children
                .insert(insert_at, Node::Element(Element::new(namespace, name)));
        }
        self.child_mut(namespace, name)
    }

    fn schema_position(&self, namespace: &str, name: &str, order: &[&str]) -> usize {
        let Some(rank) = order.iter().position(|n| *n == name) else {
            return self.children.len();
        };
        self.children
            .iter()
            .rposition(|n| match n {
                Node::Element(e) if e.namespace.as_deref() == Some(namespace) => order
                    .iter()
                    .position(|o| *o == e.name)
                    .is_some_and(|r| r < rank),
                _ => false,
            })
            .map_or(0, |i| i + 1)
    }

    /// Depth-first search over this element and its descendants.
    pub(crate) fn find_descendant(&self, pred: &dyn Fn(&Element) -> bool) -> Option<&Element> {
        if pred(self) {
            return Some(self);
        }
        self.elements().find_map(|e| e.find_descendant(pred))
    }

    pub(crate) fn for_each_descendant(&self, f: &mut dyn FnMut(&Element)) {
        f(self);
        for child in self.elements() {
            child.for_each_descendant(f);
        }
    }

    /// Serializes the tree as a standalone XML part.
    pub(crate) fn to_xml(&self) -> Result<Vec<u8>, Error> {
        let mut writer = Writer::new(Vec::new());
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))
            .map_err(write_error)?;
        writer
            .write_event(Event::Text(BytesText::from_escaped("\r\n")))
            .map_err(write_error)?;
        let mut scope = Vec::new();
        write_element(&mut writer, self, &mut scope)?;
        Ok(writer.into_inner())
    }
}

fn write_error(e: impl fmt::Display) -> Error {
    Error::XmlWrite(e.to_string())
}

fn convert(node: roxmltree::Node) -> Element {
    let inherited: Vec<&roxmltree::Namespace> = node
        .parent_element()
        .map(|p| p.namespaces().collect())
        .unwrap_or_default();

    let namespaces = node
        .namespaces()
        .filter(|ns| ns.name() != Some("xml"))
        .filter(|ns| {
            !inherited
                .iter()
                .any(|p| p.name() == ns.name() && p.uri() == ns.uri())
        })
        .map(|ns| Namespace {
            prefix: ns.name().map(str::to_string),
            uri: ns.uri().to_string(),
        })
        .collect();

    let attributes = node
        .attributes()
        .map(|a| Attribute {
            namespace: a.namespace().map(str::to_string),
            name: a.name().to_string(),
            value: a.value().to_string(),
        })
        .collect();

    let mut children = Vec::new();
    for child in node.children() {
        if child.is_element() {
            children.push(Node::Element(convert(child)));
        } else if child.is_text()
            && let Some(text) = child.text()
        {
            children.push(Node::Text(text.to_string()));
        }
    }

    Element {
        namespace: node.tag_name().namespace().map(str::to_string),
        name: node.tag_name().name().to_string(),
        namespaces,
        attributes,
        children,
    }
}

/// Finds the prefix bound to `uri`, skipping bindings shadowed further in.
fn lookup_prefix<'s>(
    scope: &'s [Namespace],
    uri: &str,
    allow_default: bool,
) -> Option<Option<&'s str>> {
    scope
        .iter()
        .rev()
        .filter(|d| d.uri == uri && (allow_default || d.prefix.is_some()))
        .find(|d| {
            scope
                .iter()
                .rev()
                .find(|o| o.prefix == d.prefix)
                .is_some_and(|o| o.uri == uri)
        })
        .map(|d| d.prefix.as_deref())
}

fn fresh_prefix(scope: &[Namespace], uri: &str) -> String {
    let base = PREFERRED_PREFIXES
        .iter()
        .find(|(u, _)| *u == uri)
        .map_or("ns", |(_, p)| *p);
    let taken = |p: &str| scope.iter().any(|d| d.prefix.as_deref() == Some(p));
    if !taken(base) {
        return base.to_string();
    }
    (1..)
        .map(|n| format!("{base}{n}"))
        .find(|p| !taken(p))
        .unwrap_or_else(|| base.to_string())
}

fn qualify(
    scope: &mut Vec<Namespace>,
    declared: &mut Vec<Namespace>,
    uri: &str,
    local: &str,
    allow_default: bool,
) -> String {
    if uri == XML_NS {
        return format!("xml:{local}");
    }
    let found = lookup_prefix(scope, uri, allow_default).map(|p| p.map(str::to_string));
    let prefix = match found {
        Some(prefix) => prefix,
        None => {
            let prefix = fresh_prefix(scope, uri);
            let ns = Namespace { prefix: Some(prefix.clone()), uri: uri.to_string() };
            scope.push(ns.clone());
            declared.push(ns);
            Some(prefix)
        }
    };
    match prefix {
        Some(p) => format!("{p}:{local}"),
        None => local.to_string(),
    }
}

fn write_element(
    writer: &mut Writer<Vec<u8>>,
    el: &Element,
    scope: &mut Vec<Namespace>,
) -> Result<(), Error> {
    let depth = scope.len();
    scope.extend(el.namespaces.iter().cloned());
    let mut declared = el.namespaces.clone();

    let tag = match el.namespace.as_deref() {
        Some(uri) => qualify(scope, &mut declared, uri, &el.name, true),
        None => el.name.clone(),
    };
    let attributes: Vec<(String, &str)> = el
        .attributes
        .iter()
        .map(|a| {
            let key = match a.namespace.as_deref() {
                Some(uri) => qualify(scope, &mut declared, uri, &a.name, false),
                None => a.name.clone(),
            };
            (key, a.value.as_str())
        })
        .collect();

    let mut start = BytesStart::new(tag.as_str());
    for ns in &declared {
        let key = match &ns.prefix {
            Some(p) => format!("xmlns:{p}"),
            None => "xmlns".to_string(),
        };
        start.push_attribute((key.as_str(), ns.uri.as_str()));
    }
    for (key, value) in &attributes {
        start.push_attribute((key.as_str(), *value));
    }

    if el.children.is_empty() {
        writer.write_event(Event::Empty(start)).map_err(write_error)?;
    } else {
        writer.write_event(Event::Start(start)).map_err(write_error)?;
        for child in &el.children {
            match child {
                Node::Element(e) => write_element(writer, e, scope)?,
                Node::Text(t) => writer
                    .write_event(Event::Text(BytesText::new(t)))
                    .map_err(write_error)?,
            }
        }
        writer
            .write_event(Event::End(BytesEnd::new(tag.as_str())))
            .map_err(write_error)?;
    }

    scope.truncate(depth);
    Ok(())
}
