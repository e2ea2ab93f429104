//! Marker detection.
//!
//! Authors request special formatting by embedding literal marker tokens in
//! the manuscript text. Everything here is a stateless predicate over
//! borrowed nodes; the transform engine decides what to do with a match.
//!
//! The pattern literals live here so the matcher and the metadata
//! substitutor agree on exactly one definition of each token.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::ast::Inline;

/// Paragraph justification markers. Must be the first non-break inline
/// child of a paragraph to count.
pub const LEFT_JUSTIFY: &str = "{<}";
pub const CENTER_JUSTIFY: &str = "{-}";
pub const RIGHT_JUSTIFY: &str = "{>}";

/// Section separator marker, recognized anywhere among a paragraph's
/// children.
pub const SECTION_SEPARATOR: &str = "+++";

/// Deprecated page-break marker. Recognized so the transform can reject it
/// with a useful error instead of passing it through silently.
pub const NEWPAGE_MARKER: &str = "%newpage%";

/// Placeholder tokens look like `%key%` and may appear as substrings inside
/// any text leaf.
pub static PLACEHOLDER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"%([a-z][a-z-]*)%").expect("placeholder pattern"));

/// Justification requested by a paragraph marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Justification {
    Left,
    Center,
    Right,
}

impl Justification {
    /// The literal marker token.
    pub fn marker(self) -> &'static str {
        match self {
            Justification::Left => LEFT_JUSTIFY,
            Justification::Center => CENTER_JUSTIFY,
            Justification::Right => RIGHT_JUSTIFY,
        }
    }

    /// CSS class used by the HTML-like formats (defined in the book's
    /// stylesheet).
    pub fn css_class(self) -> &'static str {
        match self {
            Justification::Left => "left",
            Justification::Center => "center",
            Justification::Right => "right",
        }
    }

    /// TeX environment name for raw-markup output.
    pub fn latex_env(self) -> &'static str {
        match self {
            Justification::Left => "flushleft",
            Justification::Center => "center",
            Justification::Right => "flushright",
        }
    }

    /// Named paragraph style for word-processor output (defined in the
    /// reference document).
    pub fn named_style(self) -> &'static str {
        match self {
            Justification::Left => "JustifyLeft",
            Justification::Center => "Centered",
            Justification::Right => "JustifyRight",
        }
    }
}

/// Metadata placeholder tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    Author,
    Title,
    Subtitle,
    CopyrightOwner,
    CopyrightYear,
    Publisher,
    Language,
}

impl Placeholder {
    /// The token between the `%` delimiters.
    pub fn token(self) -> &'static str {
        match self {
            Placeholder::Author => "author",
            Placeholder::Title => "title",
            Placeholder::Subtitle => "subtitle",
            Placeholder::CopyrightOwner => "copyright-owner",
            Placeholder::CopyrightYear => "copyright-year",
            Placeholder::Publisher => "publisher",
            Placeholder::Language => "language",
        }
    }

    /// Dotted path of the metadata value this placeholder expands to.
    pub fn metadata_path(self) -> &'static str {
        match self {
            Placeholder::Author => "author",
            Placeholder::Title => "title",
            Placeholder::Subtitle => "subtitle",
            Placeholder::CopyrightOwner => "copyright.owner",
            Placeholder::CopyrightYear => "copyright.year",
            Placeholder::Publisher => "publisher",
            Placeholder::Language => "language",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "author" => Some(Placeholder::Author),
            "title" => Some(Placeholder::Title),
            "subtitle" => Some(Placeholder::Subtitle),
            "copyright-owner" => Some(Placeholder::CopyrightOwner),
            "copyright-year" => Some(Placeholder::CopyrightYear),
            "publisher" => Some(Placeholder::Publisher),
            "language" => Some(Placeholder::Language),
            _ => None,
        }
    }
}

/// True if `inline` is a text leaf equal to `token` exactly
/// (case-sensitive).
pub fn matches_text(inline: &Inline, token: &str) -> bool {
    inline.as_str() == Some(token)
}

/// Detect a justification marker: the first non-LineBreak inline must be
/// exactly the marker token. Leading line breaks are skipped here but
/// preserved by the transform.
pub fn justification(content: &[Inline]) -> Option<Justification> {
    let first = content
        .iter()
        .find(|inline| !matches!(inline, Inline::LineBreak))?;
    for just in [
        Justification::Left,
        Justification::Center,
        Justification::Right,
    ] {
        if matches_text(first, just.marker()) {
            return Some(just);
        }
    }
    None
}

/// True if any child of the paragraph is the section separator token.
pub fn contains_separator(content: &[Inline]) -> bool {
    content
        .iter()
        .any(|inline| matches_text(inline, SECTION_SEPARATOR))
}

/// True if any text leaf contains the deprecated `%newpage%` marker,
/// either as the whole leaf or as a substring.
pub fn contains_newpage(content: &[Inline]) -> bool {
    content.iter().any(|inline| match inline {
        Inline::Str(s) => s.contains(NEWPAGE_MARKER),
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_justification_first_child() {
        let para = vec![Inline::str("{-}"), Inline::str("Hello")];
        assert_eq!(justification(&para), Some(Justification::Center));

        let not_first = vec![Inline::str("Hello"), Inline::str("{-}")];
        assert_eq!(justification(&not_first), None);
    }

    #[test]
    fn test_justification_skips_leading_breaks() {
        let para = vec![
            Inline::LineBreak,
            Inline::LineBreak,
            Inline::str("{>}"),
            Inline::str("The End"),
        ];
        assert_eq!(justification(&para), Some(Justification::Right));
    }

    #[test]
    fn test_justification_requires_exact_token() {
        // The token must be its own text leaf, not a prefix of one.
        let para = vec![Inline::str("{-}Hello")];
        assert_eq!(justification(&para), None);
    }

    #[test]
    fn test_separator_anywhere() {
        let para = vec![Inline::str("a"), Inline::str("+++"), Inline::str("b")];
        assert!(contains_separator(&para));
        assert!(!contains_separator(&[Inline::str("a +++ b")]));
    }

    #[test]
    fn test_newpage_substring() {
        assert!(contains_newpage(&[Inline::str("before %newpage% after")]));
        assert!(contains_newpage(&[Inline::str("%newpage%")]));
        assert!(!contains_newpage(&[Inline::str("%new page%")]));
    }

    #[test]
    fn test_placeholder_tokens_round_trip() {
        for p in [
            Placeholder::Author,
            Placeholder::Title,
            Placeholder::Subtitle,
            Placeholder::CopyrightOwner,
            Placeholder::CopyrightYear,
            Placeholder::Publisher,
            Placeholder::Language,
        ] {
            assert_eq!(Placeholder::from_token(p.token()), Some(p));
            assert!(PLACEHOLDER_RE.is_match(&format!("%{}%", p.token())));
        }
    }
}
