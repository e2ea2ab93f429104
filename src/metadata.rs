//! Book metadata: loading, dotted-path lookup, validation, and placeholder
//! substitution.
//!
//! Metadata is assembled once per build from the manuscript's front-matter
//! blocks and shared immutably across every format pass.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::markers::{Placeholder, PLACEHOLDER_RE};

/// A metadata value: a scalar string, a list, or a nested mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetaValue {
    Scalar(String),
    List(Vec<String>),
    Map(BTreeMap<String, MetaValue>),
}

/// Read-only mapping from dotted key paths (e.g. `copyright.owner`) to
/// metadata values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    root: BTreeMap<String, MetaValue>,
}

/// Metadata keys that every manuscript must supply with non-empty values.
const REQUIRED_KEYS: [&str; 6] = [
    "title",
    "author",
    "copyright.owner",
    "copyright.year",
    "publisher",
    "language",
];

impl Metadata {
    pub fn new(root: BTreeMap<String, MetaValue>) -> Self {
        Self { root }
    }

    /// Parse metadata from one or more concatenated YAML front-matter
    /// blocks (`---` fenced). Later blocks override earlier ones. If no
    /// block supplies a language, `en` is filled in.
    pub fn from_front_matter(source: &str) -> Result<Self> {
        let mut root: BTreeMap<String, MetaValue> = BTreeMap::new();
        for document in serde_yaml::Deserializer::from_str(source) {
            let value = serde_yaml::Value::deserialize(document)?;
            if let Some(MetaValue::Map(map)) = convert_yaml(&value) {
                for (key, val) in map {
                    root.insert(key, val);
                }
            }
        }

        root.entry("language".to_string())
            .or_insert_with(|| MetaValue::Scalar("en".to_string()));

        Ok(Self { root })
    }

    /// Look up a value by dotted key path.
    pub fn get(&self, path: &str) -> Option<&MetaValue> {
        let mut segments = path.split('.');
        let mut current = self.root.get(segments.next()?)?;
        for segment in segments {
            match current {
                MetaValue::Map(map) => current = map.get(segment)?,
                _ => return None,
            }
        }
        Some(current)
    }

    /// Look up a scalar by dotted key path.
    pub fn get_scalar(&self, path: &str) -> Option<&str> {
        match self.get(path)? {
            MetaValue::Scalar(s) => Some(s),
            _ => None,
        }
    }

    /// Look up a list by dotted key path. A scalar is treated as a
    /// one-element list, which is how single-author books are written.
    pub fn get_list(&self, path: &str) -> Option<Vec<String>> {
        match self.get(path)? {
            MetaValue::Scalar(s) => Some(vec![s.clone()]),
            MetaValue::List(items) => Some(items.clone()),
            MetaValue::Map(_) => None,
        }
    }

    /// Check that every required key is present and non-empty. The first
    /// missing key aborts; the error names its dotted path.
    pub fn validate(&self) -> Result<()> {
        for key in REQUIRED_KEYS {
            let present = match self.get(key) {
                Some(MetaValue::Scalar(s)) => !s.trim().is_empty(),
                Some(MetaValue::List(items)) => {
                    items.iter().any(|item| !item.trim().is_empty())
                }
                Some(MetaValue::Map(_)) | None => false,
            };
            if !present {
                return Err(Error::MissingMetadata {
                    key: key.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Render a metadata value as plain text for placeholder substitution.
    /// Lists are joined as a name list; missing keys and nested maps render
    /// as the empty string.
    pub fn as_text(&self, path: &str) -> String {
        match self.get(path) {
            Some(MetaValue::Scalar(s)) => s.clone(),
            Some(MetaValue::List(items)) => join_names(items),
            Some(MetaValue::Map(_)) | None => String::new(),
        }
    }

    /// Replace every placeholder token in `text` with its metadata value.
    /// Unknown keys substitute as empty strings; tokens that are not part
    /// of the placeholder set pass through untouched.
    pub fn substitute(&self, text: &str) -> String {
        PLACEHOLDER_RE
            .replace_all(text, |caps: &regex::Captures<'_>| {
                match Placeholder::from_token(&caps[1]) {
                    Some(placeholder) => self.as_text(placeholder.metadata_path()),
                    None => caps[0].to_string(),
                }
            })
            .into_owned()
    }
}

/// Join a list of names: `A`; `A and B`; `A, B, and C`.
pub fn join_names(names: &[String]) -> String {
    match names {
        [] => String::new(),
        [only] => only.clone(),
        [first, second] => format!("{first} and {second}"),
        [init @ .., last] => format!("{}, and {last}", init.join(", ")),
    }
}

fn convert_yaml(value: &serde_yaml::Value) -> Option<MetaValue> {
    match value {
        serde_yaml::Value::String(s) => Some(MetaValue::Scalar(s.clone())),
        serde_yaml::Value::Number(n) => Some(MetaValue::Scalar(n.to_string())),
        serde_yaml::Value::Bool(b) => Some(MetaValue::Scalar(b.to_string())),
        serde_yaml::Value::Sequence(items) => {
            let mut list = Vec::with_capacity(items.len());
            for item in items {
                match convert_yaml(item)? {
                    MetaValue::Scalar(s) => list.push(s),
                    _ => return None,
                }
            }
            Some(MetaValue::List(list))
        }
        serde_yaml::Value::Mapping(mapping) => {
            let mut map = BTreeMap::new();
            for (key, val) in mapping {
                let key = key.as_str()?.to_string();
                if let Some(converted) = convert_yaml(val) {
                    map.insert(key, converted);
                }
            }
            Some(MetaValue::Map(map))
        }
        serde_yaml::Value::Null | serde_yaml::Value::Tagged(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Metadata {
        Metadata::from_front_matter(
            "---\n\
             title: The Lost Chord\n\
             subtitle: A Mystery\n\
             author:\n  - Anne Author\n  - Bob Binder\n\
             copyright:\n  owner: Anne Author\n  year: 2023\n\
             publisher: Fictitious Books, Ltd.\n\
             language: en\n",
        )
        .unwrap()
    }

    #[test]
    fn test_dotted_lookup() {
        let meta = sample();
        assert_eq!(meta.get_scalar("copyright.owner"), Some("Anne Author"));
        assert_eq!(meta.get_scalar("copyright.year"), Some("2023"));
        assert_eq!(meta.get_scalar("copyright"), None);
        assert_eq!(meta.get_scalar("copyright.missing"), None);
    }

    #[test]
    fn test_validate_ok() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn test_validate_names_missing_key() {
        let meta = Metadata::from_front_matter("---\ntitle: T\n").unwrap();
        let err = meta.validate().unwrap_err();
        match err {
            Error::MissingMetadata { key } => assert_eq!(key, "author"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_empty_scalar_fails_validation() {
        let meta = Metadata::from_front_matter(
            "---\n\
             title: \"  \"\n\
             author: A\n\
             copyright:\n  owner: A\n  year: 2020\n\
             publisher: P\n",
        )
        .unwrap();
        let err = meta.validate().unwrap_err();
        match err {
            Error::MissingMetadata { key } => assert_eq!(key, "title"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_join_names() {
        let one = vec!["A".to_string()];
        let two = vec!["A".to_string(), "B".to_string()];
        let three = vec!["A".to_string(), "B".to_string(), "C".to_string()];
        assert_eq!(join_names(&one), "A");
        assert_eq!(join_names(&two), "A and B");
        assert_eq!(join_names(&three), "A, B, and C");
    }

    #[test]
    fn test_substitute() {
        let meta = sample();
        assert_eq!(
            meta.substitute("%title% by %author%"),
            "The Lost Chord by Anne Author and Bob Binder"
        );
        assert_eq!(
            meta.substitute("© %copyright-year% %copyright-owner%"),
            "© 2023 Anne Author"
        );
        // Missing keys substitute as empty strings.
        let sparse = Metadata::from_front_matter("---\ntitle: T\n").unwrap();
        assert_eq!(sparse.substitute("by %author%."), "by .");
        // Tokens outside the placeholder set pass through.
        assert_eq!(meta.substitute("50% of %nonsense%"), "50% of %nonsense%");
    }

    #[test]
    fn test_later_front_matter_blocks_win() {
        let meta = Metadata::from_front_matter(
            "---\ntitle: First\n...\n---\ntitle: Second\n",
        )
        .unwrap();
        assert_eq!(meta.get_scalar("title"), Some("Second"));
    }

    #[test]
    fn test_language_defaults_to_en() {
        let meta = Metadata::from_front_matter("---\ntitle: T\n").unwrap();
        assert_eq!(meta.get_scalar("language"), Some("en"));
    }
}
