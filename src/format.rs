//! Target format identification.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies which target renderer a transform pass tailors output for.
///
/// The labels match the names the external compiler uses for its writers,
/// which is how the filter hook receives them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatContext {
    /// Standalone web page.
    Html,
    /// PDF produced by rendering the HTML output with a print engine.
    HtmlPdf,
    /// Word-processor document (no automatic pagination per heading).
    Docx,
    /// Reflowable ebook package (paginates per top-level heading).
    Epub,
    /// Raw TeX markup.
    Latex,
    /// JSON dump of the document tree, for debugging the pipeline.
    AstDump,
}

impl FormatContext {
    /// All contexts, in no particular order. Handy for exercising every
    /// format pass in tests and in the `all` build target.
    pub const ALL: [FormatContext; 6] = [
        FormatContext::Html,
        FormatContext::HtmlPdf,
        FormatContext::Docx,
        FormatContext::Epub,
        FormatContext::Latex,
        FormatContext::AstDump,
    ];

    /// Formats whose output is HTML-like markup styled via CSS classes.
    pub fn is_styled_markup(self) -> bool {
        matches!(
            self,
            FormatContext::Html | FormatContext::HtmlPdf | FormatContext::Epub
        )
    }

    /// Formats whose output is raw markup (TeX environments, no CSS).
    pub fn is_raw_markup(self) -> bool {
        matches!(self, FormatContext::Latex)
    }

    /// Parse a format label as supplied by the external compiler.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "html" => Some(FormatContext::Html),
            "html-pdf" | "pdf" => Some(FormatContext::HtmlPdf),
            "docx" | "word" => Some(FormatContext::Docx),
            "epub" => Some(FormatContext::Epub),
            "latex" => Some(FormatContext::Latex),
            "ast" => Some(FormatContext::AstDump),
            _ => None,
        }
    }

    /// The label the external compiler uses for this format.
    pub fn name(self) -> &'static str {
        match self {
            FormatContext::Html => "html",
            FormatContext::HtmlPdf => "html-pdf",
            FormatContext::Docx => "docx",
            FormatContext::Epub => "epub",
            FormatContext::Latex => "latex",
            FormatContext::AstDump => "ast",
        }
    }
}

impl fmt::Display for FormatContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name_round_trip() {
        for format in FormatContext::ALL {
            assert_eq!(FormatContext::from_name(format.name()), Some(format));
        }
        assert_eq!(FormatContext::from_name("word"), Some(FormatContext::Docx));
        assert_eq!(FormatContext::from_name("troff"), None);
    }
}
