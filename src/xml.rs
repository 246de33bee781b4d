//! Owned, namespace-resolved XML element tree built from quick-xml events.
//!
//! Schemas, linkbases and instances are all small enough to hold in memory,
//! so every consumer works on the same [`XmlElement`] tree instead of its
//! own event loop.

use crate::{skip_bom, Error, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::path::Path;

const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlAttribute {
    pub prefix: Option<String>,
    pub local_name: String,
    pub namespace: Option<String>,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlElement {
    pub prefix: Option<String>,
    pub local_name: String,
    pub namespace: Option<String>,
    pub attributes: Vec<XmlAttribute>,
    pub children: Vec<XmlElement>,
    /// Concatenated, trimmed character data directly inside this element.
    pub text: String,
}

impl XmlElement {
    /// Name as written in the document (`prefix:local` or `local`).
    pub fn raw_name(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}:{}", prefix, self.local_name),
            None => self.local_name.clone(),
        }
    }

    pub fn is(&self, namespace: &str, local_name: &str) -> bool {
        self.local_name == local_name && self.namespace.as_deref() == Some(namespace)
    }

    /// Unqualified attribute lookup (`name="..."`).
    pub fn attr(&self, local_name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.namespace.is_none() && a.local_name == local_name)
            .map(|a| a.value.as_str())
    }

    pub fn attr_ns(&self, namespace: &str, local_name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.local_name == local_name && a.namespace.as_deref() == Some(namespace))
            .map(|a| a.value.as_str())
    }

    pub fn child(&self, namespace: &str, local_name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.is(namespace, local_name))
    }

    pub fn children_named<'a>(
        &'a self,
        namespace: &'a str,
        local_name: &'a str,
    ) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.children
            .iter()
            .filter(move |c| c.is(namespace, local_name))
    }

    /// First matching descendant in document order, excluding `self`.
    pub fn find_descendant(&self, namespace: &str, local_name: &str) -> Option<&XmlElement> {
        for child in &self.children {
            if child.is(namespace, local_name) {
                return Some(child);
            }
            if let Some(found) = child.find_descendant(namespace, local_name) {
                return Some(found);
            }
        }
        None
    }

    /// All matching descendants in document order, excluding `self`.
    pub fn descendants_named<'a>(
        &'a self,
        namespace: &'a str,
        local_name: &'a str,
    ) -> Vec<&'a XmlElement> {
        let mut found = Vec::new();
        let mut stack: Vec<&XmlElement> = self.children.iter().rev().collect();
        while let Some(element) = stack.pop() {
            if element.is(namespace, local_name) {
                found.push(element);
            }
            stack.extend(element.children.iter().rev());
        }
        found
    }
}

pub fn parse_file(path: &Path) -> Result<XmlElement> {
    let content = std::fs::read(path)?;
    parse_bytes(&content, path)
}

/// Parses `data` into its root element. `path` only labels errors.
pub fn parse_bytes(data: &[u8], path: &Path) -> Result<XmlElement> {
    let data = skip_bom(data);

    let mut reader = Reader::from_reader(data);
    reader.config_mut().trim_text(true);

    let mut builder = TreeBuilder::default();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let element = builder.open(e).map_err(|message| {
                    Error::malformed(path, reader.buffer_position() as u64, message)
                })?;
                builder.stack.push(element);
            }
            Ok(Event::Empty(ref e)) => {
                let element = builder.open(e).map_err(|message| {
                    Error::malformed(path, reader.buffer_position() as u64, message)
                })?;
                builder.close(element);
            }
            Ok(Event::End(_)) => match builder.stack.pop() {
                Some(element) => builder.close(element),
                None => {
                    return Err(Error::malformed(
                        path,
                        reader.buffer_position() as u64,
                        "unbalanced end tag",
                    ))
                }
            },
            Ok(Event::Text(ref t)) => {
                let text = t.unescape().map_err(|e| {
                    Error::malformed(path, reader.buffer_position() as u64, e.to_string())
                })?;
                builder.push_text(&text);
            }
            Ok(Event::CData(t)) => {
                let bytes = t.into_inner();
                builder.push_text(&String::from_utf8_lossy(&bytes));
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::malformed(
                    path,
                    reader.error_position() as u64,
                    e.to_string(),
                ));
            }
            _ => {}
        }
        buf.clear();
    }

    if !builder.stack.is_empty() {
        return Err(Error::malformed(
            path,
            reader.buffer_position() as u64,
            "unexpected end of document",
        ));
    }
    builder
        .root
        .ok_or_else(|| Error::malformed(path, 0, "document has no root element"))
}

#[derive(Default)]
struct TreeBuilder {
    stack: Vec<XmlElement>,
    /// One frame of `(prefix, uri)` declarations per open element; the
    /// default namespace uses the empty prefix.
    scopes: Vec<Vec<(String, String)>>,
    root: Option<XmlElement>,
}

impl TreeBuilder {
    fn open(&mut self, e: &BytesStart<'_>) -> std::result::Result<XmlElement, String> {
        let name = std::str::from_utf8(e.name().as_ref())
            .map_err(|err| format!("invalid tag name: {err}"))?
            .to_string();

        let mut declarations = Vec::new();
        let mut raw_attributes = Vec::new();
        for attr_result in e.attributes() {
            let attr = attr_result.map_err(|err| format!("attribute error: {err}"))?;
            let key = std::str::from_utf8(attr.key.as_ref())
                .map_err(|err| format!("attribute key error: {err}"))?
                .to_string();
            let value = attr
                .unescape_value()
                .map_err(|err| format!("attribute value error: {err}"))?
                .to_string();

            if key == "xmlns" {
                declarations.push((String::new(), value));
            } else if let Some(prefix) = key.strip_prefix("xmlns:") {
                declarations.push((prefix.to_string(), value));
            } else {
                raw_attributes.push((key, value));
            }
        }
        self.scopes.push(declarations);

        let (prefix, local_name) = split_qname(&name);
        let namespace = self.resolve(prefix.unwrap_or(""));
        let attributes = raw_attributes
            .into_iter()
            .map(|(key, value)| {
                let (prefix, local_name) = split_qname(&key);
                // Unprefixed attributes carry no namespace.
                let namespace = prefix.and_then(|p| self.resolve(p));
                XmlAttribute {
                    prefix: prefix.map(str::to_string),
                    local_name: local_name.to_string(),
                    namespace,
                    value,
                }
            })
            .collect();

        Ok(XmlElement {
            prefix: prefix.map(str::to_string),
            local_name: local_name.to_string(),
            namespace,
            attributes,
            children: Vec::new(),
            text: String::new(),
        })
    }

    fn close(&mut self, mut element: XmlElement) {
        self.scopes.pop();
        element.text = element.text.trim().to_string();
        match self.stack.last_mut() {
            Some(parent) => parent.children.push(element),
            None => {
                if self.root.is_none() {
                    self.root = Some(element);
                }
            }
        }
    }

    fn push_text(&mut self, text: &str) {
        if let Some(current) = self.stack.last_mut() {
            current.text.push_str(text);
        }
    }

    fn resolve(&self, prefix: &str) -> Option<String> {
        if prefix == "xml" {
            return Some(XML_NS.to_string());
        }
        self.scopes
            .iter()
            .rev()
            .flat_map(|frame| frame.iter())
            .find(|(p, _)| p == prefix)
            .map(|(_, uri)| uri.clone())
            .filter(|uri| !uri.is_empty())
    }
}

fn split_qname(name: &str) -> (Option<&str>, &str) {
    match name.split_once(':') {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, name),
    }
}
