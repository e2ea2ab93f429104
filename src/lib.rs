//! # folio
//!
//! The transformation core of a batch book-publishing pipeline: everything
//! that rewrites a parsed manuscript between the external compiler's parser
//! and its writers.
//!
//! ## Features
//!
//! - Format-aware rewriting of a parsed [`DocumentTree`] (justification
//!   markers, section separators, forced page breaks, metadata placeholders)
//! - Metadata loading from YAML front matter, with dotted-path lookup and
//!   pre-traversal validation
//! - Post-compilation fix-up of an unpacked EPUB package's navigation
//!   structures, in both standard TOC encodings
//!
//! ## Quick Start
//!
//! ```
//! use folio::{transform, DocumentTree, Block, Inline, FormatContext, Metadata};
//!
//! let metadata = Metadata::from_front_matter(
//!     "---\n\
//!      title: My Book\n\
//!      author: Anne Author\n\
//!      copyright:\n  owner: Anne Author\n  year: 2024\n\
//!      publisher: Fictitious Books, Ltd.\n",
//! ).unwrap();
//!
//! let tree = DocumentTree::new(vec![
//!     Block::paragraph(vec![Inline::str("{-}"), Inline::str("%title%")]),
//! ]);
//!
//! let rewritten = transform(tree, FormatContext::Html, &metadata).unwrap();
//! ```
//!
//! The transform runs once per target format over a caller-owned tree; the
//! metadata snapshot is shared immutably across all passes. After the
//! external compiler produces an ebook package and the caller unpacks it,
//! [`normalize_navigation`] rewrites its tables of contents in place.

pub mod ast;
pub mod error;
pub mod format;
pub mod markers;
pub mod metadata;
pub mod nav;
pub mod transform;

pub use ast::{Attributes, Block, DocumentTree, Inline};
pub use error::{Error, Result};
pub use format::FormatContext;
pub use metadata::{MetaValue, Metadata};
pub use nav::{normalize_navigation, NavEntry};
pub use transform::transform;
