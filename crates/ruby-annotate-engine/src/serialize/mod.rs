//! Tree-to-markup serialization.
//!
//! Leaves are escaped and wrapped in one tag per set format, outermost first in
//! [`FORMATS`](crate::models::FORMATS) order. Paragraphs become `<p>`. A ruby
//! becomes `<ruby>BASE<rt>READING</rt></ruby>`, where BASE is either the stored
//! `kanji` (the default, passed through verbatim like `kana`) or its serialized
//! children, per [`RubyContent`].

pub mod fixup;

use serde::{Deserialize, Serialize};

pub use fixup::{Fixup, fix_ruby_paragraphs, strip_paragraphs};

use crate::editing::Document;
use crate::models::{Element, ElementKind, Format, Leaf, Node};

/// What goes between `<ruby>` and `<rt>`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RubyContent {
    /// The element's `kanji` field, verbatim. Formatting inside the ruby is lost.
    #[default]
    Kanji,
    /// The element's children, serialized. Block elements inside a ruby
    /// contribute their content without a `<p>` wrapper.
    Children,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SerializeOptions {
    pub ruby_content: RubyContent,
    /// Pass applied to produce [`Rendered::fixed`]
    pub fixup: Fixup,
}

/// Output of [`Serializer::render`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub raw: String,
    pub fixed: String,
}

#[derive(Debug, Clone, Default)]
pub struct Serializer {
    options: SerializeOptions,
}

impl Serializer {
    pub fn new(options: SerializeOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> SerializeOptions {
        self.options
    }

    /// Concatenated markup of every block
    pub fn serialize(&self, doc: &Document) -> String {
        self.serialize_nodes(doc.children())
    }

    pub fn serialize_nodes(&self, nodes: &[Node]) -> String {
        let mut out = String::new();
        for node in nodes {
            self.write_node(node, false, &mut out);
        }
        out
    }

    pub fn serialize_node(&self, node: &Node) -> String {
        let mut out = String::new();
        self.write_node(node, false, &mut out);
        out
    }

    /// Serialize, then run the configured fixup pass
    pub fn render(&self, doc: &Document) -> Rendered {
        let raw = self.serialize(doc);
        let fixed = self.options.fixup.apply(&raw);
        log::debug!(
            "rendered version {} ({} bytes raw, {} bytes fixed)",
            doc.version(),
            raw.len(),
            fixed.len()
        );
        Rendered { raw, fixed }
    }

    fn write_node(&self, node: &Node, in_ruby: bool, out: &mut String) {
        match node {
            Node::Text(leaf) => write_leaf(leaf, out),
            Node::Element(element) => self.write_element(element, in_ruby, out),
        }
    }

    fn write_element(&self, element: &Element, in_ruby: bool, out: &mut String) {
        match &element.kind {
            ElementKind::Ruby { kanji, kana } => {
                out.push_str("<ruby>");
                match self.options.ruby_content {
                    RubyContent::Kanji => out.push_str(kanji),
                    RubyContent::Children => {
                        for child in &element.children {
                            self.write_node(child, true, out);
                        }
                    }
                }
                out.push_str("<rt>");
                out.push_str(kana);
                out.push_str("</rt></ruby>");
            }
            ElementKind::Paragraph { .. } if in_ruby => {
                for child in &element.children {
                    self.write_node(child, true, out);
                }
            }
            ElementKind::Paragraph { .. } => {
                out.push_str("<p>");
                for child in &element.children {
                    self.write_node(child, false, out);
                }
                out.push_str("</p>");
            }
        }
    }
}

fn write_leaf(leaf: &Leaf, out: &mut String) {
    let formats: Vec<Format> = Format::all()
        .filter(|format| leaf.marks.contains(*format))
        .collect();

    for format in &formats {
        out.push('<');
        out.push_str(format.tag());
        out.push('>');
    }
    out.push_str(&html_escape::encode_quoted_attribute(&leaf.text));
    for format in formats.iter().rev() {
        out.push_str("</");
        out.push_str(format.tag());
        out.push('>');
    }
}

/// Serialize with default options
pub fn serialize(doc: &Document) -> String {
    Serializer::default().serialize(doc)
}

pub fn serialize_node(node: &Node) -> String {
    Serializer::default().serialize_node(node)
}
