//! Minimal owned XML tree for navigation-document rewriting.
//!
//! The navigation fix-up has to round-trip whole files while rewriting one
//! subtree, so instead of streaming events it parses the document into a
//! small owned tree, rewrites the tree functionally, and serializes it
//! back. Declarations, doctypes, comments, and CDATA are carried through
//! verbatim as raw nodes.

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::Result;

/// One node in a parsed XML document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    Element(Element),
    /// Character data, stored unescaped.
    Text(String),
    /// Prolog/comment/CDATA content serialized verbatim.
    Raw(String),
}

/// An element with its attributes (document order, values kept in their
/// source-escaped form) and children.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Local name, with any namespace prefix stripped.
    pub fn local_name(&self) -> &str {
        self.name
            .rsplit_once(':')
            .map(|(_, local)| local)
            .unwrap_or(&self.name)
    }

    /// Get an attribute value by name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Set an attribute, replacing any existing value.
    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        for (key, existing) in &mut self.attrs {
            if key == name {
                *existing = value;
                return;
            }
        }
        self.attrs.push((name.to_string(), value));
    }

    /// Child elements by local name (direct children only).
    pub fn child_elements(&self, name: &str) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(move |node| match node {
            XmlNode::Element(e) if e.local_name() == name => Some(e),
            _ => None,
        })
    }

    /// First descendant element with the given local name, depth-first.
    pub fn find_first(&self, name: &str) -> Option<&Element> {
        for node in &self.children {
            if let XmlNode::Element(e) = node {
                if e.local_name() == name {
                    return Some(e);
                }
                if let Some(found) = e.find_first(name) {
                    return Some(found);
                }
            }
        }
        None
    }

    /// Mutable variant of [`find_first`](Self::find_first).
    pub fn find_first_mut(&mut self, name: &str) -> Option<&mut Element> {
        for node in &mut self.children {
            if let XmlNode::Element(e) = node {
                if e.local_name() == name {
                    return Some(e);
                }
                if let Some(found) = e.find_first_mut(name) {
                    return Some(found);
                }
            }
        }
        None
    }

    /// Concatenated descendant text, trimmed.
    pub fn text_content(&self) -> String {
        let mut text = String::new();
        collect_text(self, &mut text);
        text.trim().to_string()
    }
}

fn collect_text(element: &Element, out: &mut String) {
    for node in &element.children {
        match node {
            XmlNode::Text(s) => out.push_str(s),
            XmlNode::Element(e) => collect_text(e, out),
            XmlNode::Raw(_) => {}
        }
    }
}

/// Parse a whole XML document into a list of top-level nodes.
pub fn parse_document(content: &str) -> Result<Vec<XmlNode>> {
    let mut reader = Reader::from_str(content);
    let mut top: Vec<XmlNode> = Vec::new();
    let mut stack: Vec<Element> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                stack.push(element_from_start(&e));
            }
            Ok(Event::Empty(e)) => {
                append(&mut top, &mut stack, XmlNode::Element(element_from_start(&e)));
            }
            Ok(Event::End(_)) => {
                if let Some(element) = stack.pop() {
                    append(&mut top, &mut stack, XmlNode::Element(element));
                }
            }
            Ok(Event::Text(e)) => {
                append_text(&mut top, &mut stack, &String::from_utf8_lossy(e.as_ref()));
            }
            Ok(Event::GeneralRef(e)) => {
                let entity = String::from_utf8_lossy(e.as_ref());
                let resolved =
                    resolve_entity(&entity).unwrap_or_else(|| format!("&{entity};"));
                append_text(&mut top, &mut stack, &resolved);
            }
            Ok(Event::Decl(e)) => {
                let inner = String::from_utf8_lossy(e.as_ref()).into_owned();
                append(&mut top, &mut stack, XmlNode::Raw(format!("<?{inner}?>")));
            }
            Ok(Event::PI(e)) => {
                let inner = String::from_utf8_lossy(e.as_ref()).into_owned();
                append(&mut top, &mut stack, XmlNode::Raw(format!("<?{inner}?>")));
            }
            Ok(Event::DocType(e)) => {
                let inner = String::from_utf8_lossy(e.as_ref()).into_owned();
                append(&mut top, &mut stack, XmlNode::Raw(format!("<!DOCTYPE {inner}>")));
            }
            Ok(Event::Comment(e)) => {
                let inner = String::from_utf8_lossy(e.as_ref()).into_owned();
                append(&mut top, &mut stack, XmlNode::Raw(format!("<!--{inner}-->")));
            }
            Ok(Event::CData(e)) => {
                let inner = String::from_utf8_lossy(e.as_ref()).into_owned();
                append(&mut top, &mut stack, XmlNode::Raw(format!("<![CDATA[{inner}]]>")));
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
        }
    }

    // Unclosed elements are tolerated rather than lost.
    while let Some(element) = stack.pop() {
        append(&mut top, &mut stack, XmlNode::Element(element));
    }

    Ok(top)
}

fn element_from_start(e: &quick_xml::events::BytesStart<'_>) -> Element {
    let mut element = Element::new(String::from_utf8_lossy(e.name().as_ref()).into_owned());
    for attr in e.attributes().flatten() {
        element.attrs.push((
            String::from_utf8_lossy(attr.key.as_ref()).into_owned(),
            String::from_utf8_lossy(&attr.value).into_owned(),
        ));
    }
    element
}

fn append(top: &mut Vec<XmlNode>, stack: &mut [Element], node: XmlNode) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => top.push(node),
    }
}

/// Append text, merging with a preceding text node so entity references do
/// not split labels into fragments.
fn append_text(top: &mut Vec<XmlNode>, stack: &mut [Element], text: &str) {
    let siblings = match stack.last_mut() {
        Some(parent) => &mut parent.children,
        None => top,
    };
    if let Some(XmlNode::Text(existing)) = siblings.last_mut() {
        existing.push_str(text);
    } else {
        siblings.push(XmlNode::Text(text.to_string()));
    }
}

/// Resolve XML entity references.
fn resolve_entity(entity: &str) -> Option<String> {
    match entity {
        "apos" => return Some("'".to_string()),
        "quot" => return Some("\"".to_string()),
        "lt" => return Some("<".to_string()),
        "gt" => return Some(">".to_string()),
        "amp" => return Some("&".to_string()),
        _ => {}
    }

    if let Some(hex) = entity.strip_prefix("#x") {
        if let Ok(code) = u32::from_str_radix(hex, 16)
            && let Some(c) = char::from_u32(code)
        {
            return Some(c.to_string());
        }
    } else if let Some(dec) = entity.strip_prefix('#')
        && let Ok(code) = dec.parse::<u32>()
        && let Some(c) = char::from_u32(code)
    {
        return Some(c.to_string());
    }

    None
}

/// Serialize a document back to a string.
pub fn serialize_document(nodes: &[XmlNode]) -> String {
    let mut out = String::new();
    for node in nodes {
        serialize_node(node, &mut out);
    }
    out
}

fn serialize_node(node: &XmlNode, out: &mut String) {
    match node {
        XmlNode::Raw(raw) => out.push_str(raw),
        XmlNode::Text(text) => out.push_str(&escape_text(text)),
        XmlNode::Element(element) => {
            out.push('<');
            out.push_str(&element.name);
            for (key, value) in &element.attrs {
                out.push(' ');
                out.push_str(key);
                out.push_str("=\"");
                out.push_str(value);
                out.push('"');
            }
            if element.children.is_empty() {
                out.push_str(" />");
            } else {
                out.push('>');
                for child in &element.children {
                    serialize_node(child, out);
                }
                out.push_str("</");
                out.push_str(&element.name);
                out.push('>');
            }
        }
    }
}

/// Escape character data for serialization.
fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
