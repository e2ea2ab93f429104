//! Generic document tree model.
//!
//! A [`DocumentTree`] is the format-agnostic representation of a parsed
//! manuscript, handed to [`transform`](crate::transform) once per target
//! format. The node set is deliberately closed: every variant is matched
//! exhaustively by the transform engine, so adding a node kind forces
//! explicit handling everywhere.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Key/value attributes attached to a [`Block::Container`].
///
/// Order is irrelevant; `class` and `custom-style` are the keys the
/// downstream renderers care about.
pub type Attributes = BTreeMap<String, String>;

/// Inline (within-paragraph) content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Inline {
    /// A run of plain text.
    Str(String),
    /// A hard line break.
    LineBreak,
    /// Literal text passed through untouched to one output format.
    RawInline { format: String, text: String },
}

/// Block-level content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Block {
    /// A heading with level 1-6.
    Heading { level: u8, content: Vec<Inline> },
    /// A paragraph of inline content.
    Paragraph(Vec<Inline>),
    /// A generic container (rendered as `<div>`, styled span, etc.).
    Container {
        attrs: Attributes,
        children: Vec<Block>,
    },
    /// Literal text passed through untouched to one output format.
    RawBlock { format: String, text: String },
}

/// An ordered forest of blocks representing one parsed manuscript.
///
/// Built fresh by the external parser for every compile run; never contains
/// cycles and is exclusively owned by the caller for the duration of a
/// transform.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DocumentTree {
    pub blocks: Vec<Block>,
}

impl Inline {
    /// Create a text inline.
    pub fn str(text: impl Into<String>) -> Self {
        Inline::Str(text.into())
    }

    /// Create a raw inline for the given output format.
    pub fn raw(format: impl Into<String>, text: impl Into<String>) -> Self {
        Inline::RawInline {
            format: format.into(),
            text: text.into(),
        }
    }

    /// Returns the text of a [`Inline::Str`], or `None` for other variants.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Inline::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl Block {
    /// Create a paragraph from inline content.
    pub fn paragraph(content: impl Into<Vec<Inline>>) -> Self {
        Block::Paragraph(content.into())
    }

    /// Create a heading.
    pub fn heading(level: u8, content: impl Into<Vec<Inline>>) -> Self {
        Block::Heading {
            level,
            content: content.into(),
        }
    }

    /// Create a container with a single attribute.
    pub fn container_with_attr(
        key: impl Into<String>,
        value: impl Into<String>,
        children: Vec<Block>,
    ) -> Self {
        let mut attrs = Attributes::new();
        attrs.insert(key.into(), value.into());
        Block::Container { attrs, children }
    }

    /// Create an unattributed container.
    pub fn container(children: Vec<Block>) -> Self {
        Block::Container {
            attrs: Attributes::new(),
            children,
        }
    }

    /// Create a raw block for the given output format.
    pub fn raw(format: impl Into<String>, text: impl Into<String>) -> Self {
        Block::RawBlock {
            format: format.into(),
            text: text.into(),
        }
    }
}

impl DocumentTree {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self { blocks }
    }
}

impl From<Vec<Block>> for DocumentTree {
    fn from(blocks: Vec<Block>) -> Self {
        Self { blocks }
    }
}
