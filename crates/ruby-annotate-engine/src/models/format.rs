use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

/// Character-level formatting attributes a text leaf can carry.
///
/// The discriminant doubles as the row index into [`FORMATS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Bold = 0,
    Italic = 1,
    Underline = 2,
}

/// One row of the format table: everything the editor needs to know about a
/// format lives here, so toggling, querying and serializing stay generic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatSpec {
    pub format: Format,
    /// Name used in documents, config files and commands
    pub name: &'static str,
    /// Markup tag emitted by the serializer
    pub tag: &'static str,
    /// Toolbar label for hosts that render a button
    pub label: &'static str,
    /// Default chorded key combination
    pub hotkey: &'static str,
}

/// The format table, ordered outermost to innermost in serialized markup.
pub const FORMATS: &[FormatSpec] = &[
    FormatSpec {
        format: Format::Bold,
        name: "bold",
        tag: "strong",
        label: "Bold",
        hotkey: "mod+b",
    },
    FormatSpec {
        format: Format::Italic,
        name: "italic",
        tag: "em",
        label: "Italic",
        hotkey: "mod+i",
    },
    FormatSpec {
        format: Format::Underline,
        name: "underline",
        tag: "u",
        label: "Underline",
        hotkey: "mod+u",
    },
];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown format: {0}")]
pub struct UnknownFormat(pub String);

impl Format {
    pub fn spec(self) -> &'static FormatSpec {
        &FORMATS[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.spec().name
    }

    pub fn tag(self) -> &'static str {
        self.spec().tag
    }

    /// All formats in table order
    pub fn all() -> impl Iterator<Item = Format> {
        FORMATS.iter().map(|spec| spec.format)
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Format {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FORMATS
            .iter()
            .find(|spec| spec.name.eq_ignore_ascii_case(s))
            .map(|spec| spec.format)
            .ok_or_else(|| UnknownFormat(s.to_string()))
    }
}

/// The set of formats active on a leaf (or pending at a collapsed cursor).
///
/// Serializes as a map of `format: true` entries so a leaf flattens into the
/// `{ "text": "...", "bold": true }` shape. Flags set to `false` on input are
/// treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Marks(BTreeSet<Format>);

impl Marks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, format: Format) -> bool {
        self.0.contains(&format)
    }

    pub fn insert(&mut self, format: Format) -> bool {
        self.0.insert(format)
    }

    pub fn remove(&mut self, format: Format) -> bool {
        self.0.remove(&format)
    }

    pub fn with(mut self, format: Format) -> Self {
        self.0.insert(format);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Format> + '_ {
        self.0.iter().copied()
    }

    /// Formats present in both sets
    pub fn intersection(&self, other: &Marks) -> Marks {
        Marks(self.0.intersection(&other.0).copied().collect())
    }
}

impl FromIterator<Format> for Marks {
    fn from_iter<I: IntoIterator<Item = Format>>(iter: I) -> Self {
        Marks(iter.into_iter().collect())
    }
}

impl Serialize for Marks {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|format| (format, true)))
    }
}

impl<'de> Deserialize<'de> for Marks {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let flags = std::collections::BTreeMap::<Format, bool>::deserialize(deserializer)?;
        Ok(flags
            .into_iter()
            .filter_map(|(format, set)| set.then_some(format))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_rows_match_discriminants() {
        for (index, spec) in FORMATS.iter().enumerate() {
            assert_eq!(spec.format as usize, index, "row {index} out of order");
            assert_eq!(spec.format.spec(), spec);
        }
    }

    #[test]
    fn test_format_from_str_uses_table_names() {
        assert_eq!("bold".parse::<Format>(), Ok(Format::Bold));
        assert_eq!("Italic".parse::<Format>(), Ok(Format::Italic));
        assert_eq!("underline".parse::<Format>(), Ok(Format::Underline));
        assert_eq!(
            "strike".parse::<Format>(),
            Err(UnknownFormat("strike".to_string()))
        );
    }

    #[test]
    fn test_marks_intersection() {
        let a = Marks::new().with(Format::Bold).with(Format::Italic);
        let b = Marks::new().with(Format::Italic).with(Format::Underline);

        let shared = a.intersection(&b);
        assert!(shared.contains(Format::Italic));
        assert!(!shared.contains(Format::Bold));
        assert!(!shared.contains(Format::Underline));
    }

    #[test]
    fn test_marks_false_flags_are_dropped() {
        let marks: Marks = serde_json::from_str(r#"{"bold": true, "italic": false}"#).unwrap();
        assert_eq!(marks, Marks::new().with(Format::Bold));

        let json = serde_json::to_string(&marks).unwrap();
        assert_eq!(json, r#"{"bold":true}"#);
    }
}
