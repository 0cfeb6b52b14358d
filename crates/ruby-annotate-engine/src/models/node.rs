use serde::{Deserialize, Serialize};

use crate::models::format::Marks;

/// An atomic run of text carrying zero or more formatting flags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leaf {
    pub text: String,
    #[serde(flatten)]
    pub marks: Marks,
}

impl Leaf {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            marks: Marks::new(),
        }
    }

    pub fn with_marks(text: impl Into<String>, marks: Marks) -> Self {
        Self {
            text: text.into(),
            marks,
        }
    }

    /// Length in characters; offsets into a leaf are character offsets
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// What kind of element a node is, plus the attributes that kind carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ElementKind {
    Paragraph {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        align: Option<String>,
    },
    /// Ruby annotation: `kanji` is the base text as it was when the span was
    /// annotated, `kana` the phonetic reading shown above it.
    Ruby {
        #[serde(default)]
        kanji: String,
        #[serde(default)]
        kana: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    #[serde(flatten)]
    pub kind: ElementKind,
    #[serde(default)]
    pub children: Vec<Node>,
}

impl Element {
    pub fn paragraph(children: Vec<Node>) -> Self {
        Self {
            kind: ElementKind::Paragraph { align: None },
            children,
        }
    }

    pub fn ruby(kanji: impl Into<String>, kana: impl Into<String>, children: Vec<Node>) -> Self {
        Self {
            kind: ElementKind::Ruby {
                kanji: kanji.into(),
                kana: kana.into(),
            },
            children,
        }
    }

    pub fn is_ruby(&self) -> bool {
        matches!(self.kind, ElementKind::Ruby { .. })
    }

    /// Block elements hold inline content; everything else is inline.
    pub fn is_block(&self) -> bool {
        matches!(self.kind, ElementKind::Paragraph { .. })
    }

    /// A copy of this element with its children dropped, used as a wrapper template
    pub fn shell(&self) -> Self {
        Self {
            kind: self.kind.clone(),
            children: Vec::new(),
        }
    }
}

/// A node of the document tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Element(Element),
    Text(Leaf),
}

impl Node {
    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(Leaf::new(text))
    }

    pub fn paragraph(children: Vec<Node>) -> Self {
        Node::Element(Element::paragraph(children))
    }

    /// A paragraph holding a single empty leaf, the smallest valid block
    pub fn empty_paragraph() -> Self {
        Self::paragraph(vec![Node::text("")])
    }

    pub fn as_leaf(&self) -> Option<&Leaf> {
        match self {
            Node::Text(leaf) => Some(leaf),
            Node::Element(_) => None,
        }
    }

    pub fn as_leaf_mut(&mut self) -> Option<&mut Leaf> {
        match self {
            Node::Text(leaf) => Some(leaf),
            Node::Element(_) => None,
        }
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        }
    }

    pub fn children(&self) -> Option<&Vec<Node>> {
        self.as_element().map(|element| &element.children)
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Node::Element(element) => Some(&mut element.children),
            Node::Text(_) => None,
        }
    }

    pub fn is_ruby(&self) -> bool {
        self.as_element().is_some_and(Element::is_ruby)
    }

    /// Concatenated text of every leaf below this node
    pub fn text_content(&self) -> String {
        match self {
            Node::Text(leaf) => leaf.text.clone(),
            Node::Element(element) => element.children.iter().map(Node::text_content).collect(),
        }
    }
}
