//! Post-compilation navigation fix-up for unpacked ebook packages.
//!
//! The external compiler emits a table of contents that includes an entry
//! for every top-level heading, including the bare book-title entries the
//! front matter produces and the empty entries left by forced page breaks.
//! [`normalize_navigation`] rewrites both TOC encodings in place:
//!
//! - `EPUB/toc.ncx` (numbered-entry encoding, `navPoint-N` identifiers)
//! - `EPUB/nav.xhtml` (nested-list encoding, `toc-li-N` identifiers)
//!
//! and retitles every chapter file to the book title. The caller unpacks
//! the package first and repacks it afterwards; a failure mid-pass leaves
//! the directory in an indeterminate state and the package must be
//! discarded.

mod xml;

use std::fs;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::error::{Error, Result};
use xml::{Element, XmlNode};

/// One table-of-contents entry, as parsed from either encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavEntry {
    pub id: String,
    pub label: String,
    pub href: String,
}

impl NavEntry {
    /// Survivor predicate: entries with empty labels, and entries that
    /// merely repeat the book title, are dropped.
    pub fn survives(&self, book_title: &str) -> bool {
        !self.label.is_empty() && self.label != book_title
    }
}

static TITLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^(.*<title>).*(</title>).*$").expect("title pattern"));

/// Normalize the navigation structures of an unpacked ebook package.
///
/// Either TOC file may be absent (older packages only carry one encoding);
/// an absent file is skipped. A present but malformed file is fatal.
pub fn normalize_navigation(scratch_dir: &Path, book_title: &str) -> Result<()> {
    let ncx = scratch_dir.join("EPUB").join("toc.ncx");
    if ncx.is_file() {
        fix_numbered_toc(&ncx, book_title)?;
    } else {
        debug!(path = %ncx.display(), "no numbered TOC file, skipping");
    }

    let nav = scratch_dir.join("EPUB").join("nav.xhtml");
    if nav.is_file() {
        fix_nested_toc(&nav, book_title)?;
    } else {
        debug!(path = %nav.display(), "no nested-list TOC file, skipping");
    }

    rewrite_chapter_titles(&scratch_dir.join("EPUB").join("text"), book_title)
}

/// Rewrite the numbered-entry encoding (`toc.ncx`).
fn fix_numbered_toc(path: &Path, book_title: &str) -> Result<()> {
    debug!(path = %path.display(), "adjusting numbered table of contents");
    let content = fs::read_to_string(path)?;
    let mut nodes = xml::parse_document(&content)?;

    let nav_map = document_element_mut(&mut nodes, "navMap")
        .ok_or_else(|| Error::MalformedNavigation("no <navMap>".to_string()))?;

    let children = std::mem::take(&mut nav_map.children);
    nav_map.children = children
        .into_iter()
        .filter(|node| match node {
            XmlNode::Element(e) if e.local_name() == "navPoint" => {
                ncx_entry(e).survives(book_title)
            }
            // Strip stray text nodes directly under the entry-list root.
            XmlNode::Text(_) => false,
            _ => true,
        })
        .collect();

    let mut next = 1;
    renumber(nav_map, "navPoint", "navPoint-", &mut next);

    fs::write(path, xml::serialize_document(&nodes))?;
    Ok(())
}

/// Rewrite the nested-list encoding (`nav.xhtml`).
fn fix_nested_toc(path: &Path, book_title: &str) -> Result<()> {
    debug!(path = %path.display(), "adjusting nested-list table of contents");
    let content = fs::read_to_string(path)?;
    let mut nodes = xml::parse_document(&content)?;

    let nav = find_toc_nav(&mut nodes)
        .ok_or_else(|| Error::MalformedNavigation("no TOC <nav>".to_string()))?;
    let list = nav
        .find_first_mut("ol")
        .ok_or_else(|| Error::MalformedNavigation("no list in <nav>".to_string()))?;

    // An item without a link is structurally broken, not just droppable.
    for node in &list.children {
        if let XmlNode::Element(e) = node
            && e.local_name() == "li"
            && e.find_first("a").is_none()
        {
            return Err(Error::MalformedNavigation("no <a> in <li>".to_string()));
        }
    }

    let children = std::mem::take(&mut list.children);
    list.children = children
        .into_iter()
        .filter(|node| match node {
            XmlNode::Element(e) if e.local_name() == "li" => {
                list_entry(e).survives(book_title)
            }
            XmlNode::Text(_) => false,
            _ => true,
        })
        .collect();

    let mut next = 1;
    renumber(list, "li", "toc-li-", &mut next);

    fs::write(path, xml::serialize_document(&nodes))?;
    Ok(())
}

/// Parse a `navPoint` element into a [`NavEntry`].
fn ncx_entry(nav_point: &Element) -> NavEntry {
    NavEntry {
        id: nav_point.attr("id").unwrap_or_default().to_string(),
        label: nav_point
            .find_first("text")
            .map(|text| text.text_content())
            .unwrap_or_default(),
        href: nav_point
            .find_first("content")
            .and_then(|content| content.attr("src"))
            .unwrap_or_default()
            .to_string(),
    }
}

/// Parse an `li` element into a [`NavEntry`].
fn list_entry(item: &Element) -> NavEntry {
    let link = item.find_first("a");
    NavEntry {
        id: item.attr("id").unwrap_or_default().to_string(),
        label: link.map(|a| a.text_content()).unwrap_or_default(),
        href: link
            .and_then(|a| a.attr("href"))
            .unwrap_or_default()
            .to_string(),
    }
}

/// Densely renumber surviving entries in document order, `prefix1`,
/// `prefix2`, ... including nested entries.
fn renumber(parent: &mut Element, entry_name: &str, prefix: &str, next: &mut usize) {
    for node in &mut parent.children {
        if let XmlNode::Element(e) = node {
            if e.local_name() == entry_name {
                e.set_attr("id", format!("{prefix}{next}"));
                *next += 1;
            }
            renumber(e, entry_name, prefix, next);
        }
    }
}

/// Find the navigation container identified by `id="toc"`.
fn find_toc_nav(nodes: &mut [XmlNode]) -> Option<&mut Element> {
    for node in nodes {
        if let XmlNode::Element(e) = node
            && let Some(found) = find_toc_nav_in(e)
        {
            return Some(found);
        }
    }
    None
}

fn find_toc_nav_in(element: &mut Element) -> Option<&mut Element> {
    if element.local_name() == "nav" && element.attr("id") == Some("toc") {
        return Some(element);
    }
    for node in &mut element.children {
        if let XmlNode::Element(e) = node
            && let Some(found) = find_toc_nav_in(e)
        {
            return Some(found);
        }
    }
    None
}

/// Find the first element with the given local name anywhere in the
/// document.
fn document_element_mut<'a>(nodes: &'a mut [XmlNode], name: &str) -> Option<&'a mut Element> {
    for node in nodes {
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

/// Rewrite `<title>…</title>` in every chapter file to the book title.
fn rewrite_chapter_titles(text_dir: &Path, book_title: &str) -> Result<()> {
    if !text_dir.is_dir() {
        debug!(path = %text_dir.display(), "no chapter directory, skipping title rewrite");
        return Ok(());
    }

    for entry in fs::read_dir(text_dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if !name.starts_with("ch") || !name.ends_with(".xhtml") {
            continue;
        }

        let path = entry.path();
        debug!(path = %path.display(), "rewriting chapter title");
        let content = fs::read_to_string(&path)?;
        let fixed = TITLE_RE.replace_all(&content, |caps: &regex::Captures<'_>| {
            format!("{}{}{}", &caps[1], book_title, &caps[2])
        });
        fs::write(&path, fixed.as_ref())?;
    }

    Ok(())
}
