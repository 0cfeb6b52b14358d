use crate::editing::selection::{Edge, Path, Selection};
use crate::models::{Element, Format, Marks, Node};

/// The structured-editing primitives the mark and ruby models are written against.
///
/// [`Document`](crate::editing::Document) is the in-crate implementation; a host
/// editor can implement this trait over its own tree and selection types instead.
pub trait StructuredEditor {
    type Error: std::error::Error;

    /// Current selection, `None` when focus is outside the document
    fn selection(&self) -> Option<&Selection>;

    /// Formatting state at the selection, `None` when there is no selection
    fn marks(&self) -> Option<Marks>;

    fn add_mark(&mut self, format: Format) -> Result<(), Self::Error>;

    fn remove_mark(&mut self, format: Format) -> Result<(), Self::Error>;

    /// Paths of the nodes the selection touches (ancestors of either edge and
    /// everything between them) that match `predicate`, in document order
    fn nodes(&self, predicate: impl Fn(&Node) -> bool) -> Vec<Path>;

    /// Insert `node` at the selection start, splitting the text there; the
    /// cursor lands at the end of the inserted node
    fn insert_node(&mut self, node: Node) -> Result<(), Self::Error>;

    /// Wrap the selected content in copies of `element`, splitting leaves at the
    /// selection edges so exactly the selected text is wrapped
    fn wrap_nodes(&mut self, element: Element) -> Result<(), Self::Error>;

    /// Lift the children of every element the selection touches that matches `predicate`
    fn unwrap_nodes(&mut self, predicate: impl Fn(&Node) -> bool) -> Result<(), Self::Error>;

    fn collapse(&mut self, edge: Edge) -> Result<(), Self::Error>;

    /// Text covered by the selection
    fn selected_text(&self) -> String;
}
