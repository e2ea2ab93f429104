//! Format-aware document tree rewriting.
//!
//! [`transform`] is the filter hook the build pipeline runs once per target
//! format, between parsing and final compilation. It is a pure function: one
//! depth-first pass over a caller-owned tree, producing a new tree with
//! markers resolved for the active [`FormatContext`]. Sibling order is
//! preserved except where a matched node is replaced, and every subtree is
//! fully resolved before being attached to its parent.

use crate::ast::{Block, DocumentTree, Inline};
use crate::error::{Error, Result};
use crate::format::FormatContext;
use crate::markers::{self, Justification, NEWPAGE_MARKER};
use crate::metadata::Metadata;

/// Glyph sequence emitted for the `+++` section separator.
pub const SECTION_SEPARATOR_GLYPH: &str = "• • •";

/// Rewrite `tree` for the given target format.
///
/// Validates the metadata before visiting any node: a missing required key
/// fails the whole pass. Mid-traversal, the only fatal condition is the
/// deprecated `%newpage%` marker.
pub fn transform(
    tree: DocumentTree,
    format: FormatContext,
    metadata: &Metadata,
) -> Result<DocumentTree> {
    metadata.validate()?;
    let blocks = transform_blocks(tree.blocks, format, metadata)?;
    Ok(DocumentTree::new(blocks))
}

fn transform_blocks(
    blocks: Vec<Block>,
    format: FormatContext,
    metadata: &Metadata,
) -> Result<Vec<Block>> {
    let mut out = Vec::with_capacity(blocks.len());
    for block in blocks {
        out.extend(transform_block(block, format, metadata)?);
    }
    Ok(out)
}

/// Rewrite a single block. A match may expand to zero or more replacement
/// blocks; unmatched blocks are passed through with their children
/// transformed.
fn transform_block(
    block: Block,
    format: FormatContext,
    metadata: &Metadata,
) -> Result<Vec<Block>> {
    match block {
        Block::Paragraph(content) => {
            if markers::contains_newpage(&content) {
                return Err(Error::UnsupportedMarker(NEWPAGE_MARKER.to_string()));
            }
            if let Some(just) = markers::justification(&content) {
                return justify(content, just, format, metadata);
            }
            // The AST dump keeps separator paragraphs as written.
            if markers::contains_separator(&content) && format != FormatContext::AstDump {
                return Ok(section_separator(format));
            }
            Ok(vec![Block::Paragraph(substitute_inlines(
                content, metadata,
            )?)])
        }

        Block::Heading { level: 1, content } if content.is_empty() => {
            Ok(empty_heading(format))
        }

        Block::Heading { level, content } => Ok(vec![Block::Heading {
            level,
            content: substitute_inlines(content, metadata)?,
        }]),

        Block::Container { attrs, children } => Ok(vec![Block::Container {
            attrs,
            children: transform_blocks(children, format, metadata)?,
        }]),

        raw @ Block::RawBlock { .. } => Ok(vec![raw]),
    }
}

/// An empty level-1 heading is the manuscript's way of forcing a page
/// break. Word-processor and print formats get the break itself; ebook
/// readers already paginate per top-level heading, so the heading is left
/// alone; everything else gets both, wrapped in a container.
fn empty_heading(format: FormatContext) -> Vec<Block> {
    match format {
        FormatContext::Docx | FormatContext::HtmlPdf => page_break(format),
        FormatContext::Epub => vec![Block::heading(1, vec![])],
        FormatContext::Html | FormatContext::Latex | FormatContext::AstDump => {
            let mut children = page_break(format);
            children.push(Block::heading(1, vec![]));
            vec![Block::container(children)]
        }
    }
}

/// A forced page break, rendered per format.
fn page_break(format: FormatContext) -> Vec<Block> {
    match format {
        FormatContext::Latex => vec![Block::raw("latex", r"\newpage")],
        FormatContext::Html | FormatContext::HtmlPdf | FormatContext::Epub => {
            vec![Block::raw(
                "html",
                r#"<div style="page-break-before:always"></div>"#,
            )]
        }
        FormatContext::Docx => vec![Block::container_with_attr(
            "custom-style",
            "NewPage",
            vec![Block::paragraph(vec![Inline::str("")])],
        )],
        FormatContext::AstDump => vec![],
    }
}

/// Re-emit a justification paragraph for the target format.
///
/// The marker leaf and the line breaks adjacent to it on the marker side
/// are stripped; line breaks ahead of the marker are preserved (except in
/// raw markup, where a leading break has no TeX rendering).
fn justify(
    content: Vec<Inline>,
    just: Justification,
    format: FormatContext,
    metadata: &Metadata,
) -> Result<Vec<Block>> {
    let (leading, rest) = split_marker(content, just.marker());
    let rest = substitute_inlines(rest, metadata)?;

    if format.is_styled_markup() {
        return Ok(vec![styled_split(just.css_class(), "class", leading, rest)]);
    }

    match format {
        FormatContext::Docx => Ok(vec![styled_split(
            just.named_style(),
            "custom-style",
            leading,
            rest,
        )]),
        FormatContext::Latex => {
            let mut inlines = vec![Inline::raw("latex", format!(r"\begin{{{}}}", just.latex_env()))];
            inlines.extend(rest);
            inlines.push(Inline::raw("latex", format!(r"\end{{{}}}", just.latex_env())));
            inlines.push(Inline::raw("latex", r"\bigskip"));
            Ok(vec![Block::Paragraph(inlines)])
        }
        FormatContext::AstDump => {
            let mut inlines = leading;
            inlines.extend(rest);
            Ok(vec![Block::Paragraph(inlines)])
        }
        _ => unreachable!("styled markup handled above"),
    }
}

/// Container with a style attribute, holding the preserved leading breaks
/// (when any) and the remaining content as separate paragraphs.
fn styled_split(
    style: &str,
    attr_key: &str,
    leading: Vec<Inline>,
    rest: Vec<Inline>,
) -> Block {
    let mut children = Vec::with_capacity(2);
    if !leading.is_empty() {
        children.push(Block::Paragraph(leading));
    }
    children.push(Block::Paragraph(rest));
    Block::container_with_attr(attr_key, style, children)
}

/// Split a paragraph's children around a justification marker: the line
/// breaks before it, and everything after it with the marker-side breaks
/// dropped.
fn split_marker(content: Vec<Inline>, marker: &str) -> (Vec<Inline>, Vec<Inline>) {
    let mut leading = Vec::new();
    let mut rest = Vec::new();
    let mut iter = content.into_iter();

    for inline in iter.by_ref() {
        if matches!(inline, Inline::LineBreak) {
            leading.push(inline);
        } else {
            // The matcher guarantees this is the marker leaf.
            debug_assert_eq!(inline.as_str(), Some(marker));
            break;
        }
    }

    let mut past_marker_breaks = false;
    for inline in iter {
        if !past_marker_breaks {
            if matches!(inline, Inline::LineBreak) {
                continue;
            }
            past_marker_breaks = true;
        }
        rest.push(inline);
    }

    (leading, rest)
}

/// Replace a `+++` paragraph with a centered separator glyph sequence.
fn section_separator(format: FormatContext) -> Vec<Block> {
    if format.is_styled_markup() {
        return vec![Block::raw(
            "html",
            format!(r#"<div class="sep">{SECTION_SEPARATOR_GLYPH}</div>"#),
        )];
    }

    match format {
        FormatContext::Latex => vec![Block::Paragraph(vec![
            Inline::raw("latex", r"\bigskip"),
            Inline::raw("latex", r"\begin{center}"),
            Inline::str(SECTION_SEPARATOR_GLYPH),
            Inline::raw("latex", r"\end{center}"),
            Inline::raw("latex", r"\bigskip"),
        ])],
        FormatContext::Docx => vec![Block::container_with_attr(
            "custom-style",
            Justification::Center.named_style(),
            vec![Block::paragraph(vec![Inline::str(SECTION_SEPARATOR_GLYPH)])],
        )],
        _ => unreachable!("styled markup and ast dump handled above"),
    }
}

/// Apply placeholder substitution to every text leaf, rejecting the
/// deprecated `%newpage%` marker wherever it appears.
fn substitute_inlines(content: Vec<Inline>, metadata: &Metadata) -> Result<Vec<Inline>> {
    content
        .into_iter()
        .map(|inline| match inline {
            Inline::Str(s) => {
                if s.contains(NEWPAGE_MARKER) {
                    return Err(Error::UnsupportedMarker(NEWPAGE_MARKER.to_string()));
                }
                Ok(Inline::Str(metadata.substitute(&s)))
            }
            other => Ok(other),
        })
        .collect()
}
