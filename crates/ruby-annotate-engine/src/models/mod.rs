pub mod format;
pub mod node;

pub use format::{FORMATS, Format, FormatSpec, Marks, UnknownFormat};
pub use node::{Element, ElementKind, Leaf, Node};
