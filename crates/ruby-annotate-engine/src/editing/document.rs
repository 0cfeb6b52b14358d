use std::collections::BTreeSet;

use crate::annotations::ruby::CollapsedRubySeed;
use crate::editing::editor::StructuredEditor;
use crate::editing::ops::{self, Op};
use crate::editing::selection::{Edge, Path, Point, Selection};
use crate::editing::{Cmd, Patch, commands};
use crate::models::{Element, Format, Leaf, Marks, Node};

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("Invalid document JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Inline node at root position {0}; root children must be paragraphs")]
    InlineAtRoot(usize),
    #[error("Paragraph at '{0}' is nested inside another element")]
    NestedBlock(Path),
    #[error("Ruby at '{0}' is nested inside another ruby")]
    NestedRuby(Path),
    #[error("Point {0} does not address a text leaf")]
    InvalidPoint(Point),
    #[error("Edit could not be applied at path '{0}'")]
    InvalidEdit(Path),
}

/// Rich-text document: a tree of block elements, the current selection, and
/// the pending marks a collapsed cursor carries into the next typed text.
///
/// The tree is only ever changed through [`Op`]s, and every op transforms the
/// selection, so points stay attached to the text they addressed. After each
/// command the tree is normalized:
///
/// - adjacent sibling leaves with identical marks are merged
/// - empty leaves are dropped when they have siblings
/// - an element left without children gets one empty leaf
/// - a document left without blocks gets one empty paragraph
///
/// ```rust
/// # use ruby_annotate_engine::editing::{Cmd, Document, Point, Selection};
/// # use ruby_annotate_engine::serialize::serialize;
/// let json = r#"[{"type": "paragraph", "children": [{"text": "犬"}]}]"#;
/// let mut doc = Document::from_json(json).unwrap();
/// doc.apply(Cmd::Select {
///     selection: Selection::new(Point::new(vec![0, 0], 0), Point::new(vec![0, 0], 1)),
/// })
/// .unwrap();
/// doc.apply(Cmd::AddRuby { kana: "いぬ".to_string() }).unwrap();
///
/// assert_eq!(serialize(&doc), "<p><ruby>犬<rt>いぬ</rt></ruby></p>");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub(crate) children: Vec<Node>,
    pub(crate) selection: Option<Selection>,
    /// Formatting to apply to the next inserted text at a collapsed cursor
    pub(crate) marks: Option<Marks>,
    pub(crate) version: u64,
    pub(crate) ruby_seed: CollapsedRubySeed,
    /// Top-level blocks touched by the command being applied
    touched: BTreeSet<usize>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// One paragraph holding one empty leaf, no selection
    pub fn new() -> Self {
        Self {
            children: vec![Node::empty_paragraph()],
            selection: None,
            marks: None,
            version: 0,
            ruby_seed: CollapsedRubySeed::default(),
            touched: BTreeSet::new(),
        }
    }

    /// Build a document from block nodes. Root children must be paragraphs,
    /// paragraphs never nest, and rubies never nest.
    pub fn from_nodes(children: Vec<Node>) -> Result<Self, DocumentError> {
        if let Some(index) = children
            .iter()
            .position(|node| !node.as_element().is_some_and(Element::is_block))
        {
            return Err(DocumentError::InlineAtRoot(index));
        }
        for (index, block) in children.iter().enumerate() {
            if let Some(inline) = block.children() {
                check_inline(inline, &Path::new(vec![index]), false)?;
            }
        }

        let mut doc = Self {
            children,
            ..Self::new()
        };
        doc.normalize()?;
        doc.touched.clear();
        Ok(doc)
    }

    /// Build a document from a JSON array of block nodes
    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        let children: Vec<Node> = serde_json::from_str(json)?;
        Self::from_nodes(children)
    }

    pub fn to_json(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string_pretty(&self.children)?)
    }

    pub fn with_ruby_seed(mut self, seed: CollapsedRubySeed) -> Self {
        self.ruby_seed = seed;
        self
    }

    pub fn ruby_seed(&self) -> CollapsedRubySeed {
        self.ruby_seed
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn pending_marks(&self) -> Option<&Marks> {
        self.marks.as_ref()
    }

    pub fn node(&self, path: &Path) -> Option<&Node> {
        ops::node(&self.children, path)
    }

    pub fn leaf(&self, path: &Path) -> Option<&Leaf> {
        self.node(path).and_then(Node::as_leaf)
    }

    /// Every node with its path, in document order
    pub fn descendants(&self) -> Vec<(Path, &Node)> {
        let mut out = Vec::new();
        collect_descendants(&self.children, &Path::root(), &mut out);
        out
    }

    /// Every text leaf with its path, in document order
    pub fn leaves(&self) -> Vec<(Path, &Leaf)> {
        self.descendants()
            .into_iter()
            .filter_map(|(path, node)| node.as_leaf().map(|leaf| (path, leaf)))
            .collect()
    }

    /// Replace the selection. Both points must address text leaves, with offsets
    /// inside the leaf. Pending marks do not survive a selection change.
    pub fn select(&mut self, selection: Selection) -> Result<(), DocumentError> {
        for point in [&selection.anchor, &selection.focus] {
            let valid = self
                .leaf(&point.path)
                .is_some_and(|leaf| point.offset <= leaf.len());
            if !valid {
                return Err(DocumentError::InvalidPoint(point.clone()));
            }
        }
        self.selection = Some(selection);
        self.marks = None;
        Ok(())
    }

    /// Focus left the document
    pub fn deselect(&mut self) {
        self.selection = None;
        self.marks = None;
    }

    /// Plain text, one line per block
    pub fn text(&self) -> String {
        self.children
            .iter()
            .map(Node::text_content)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Text between two points, offsets clamped to their leaves
    pub fn string(&self, start: &Point, end: &Point) -> String {
        self.leaves()
            .into_iter()
            .filter(|(path, _)| *path >= start.path && *path <= end.path)
            .map(|(path, leaf)| {
                let len = leaf.len();
                let from = if path == start.path {
                    start.offset.min(len)
                } else {
                    0
                };
                let to = if path == end.path {
                    end.offset.min(len)
                } else {
                    len
                };
                leaf.text
                    .chars()
                    .skip(from)
                    .take(to.saturating_sub(from))
                    .collect::<String>()
            })
            .collect()
    }

    /// Apply a user command, normalize, and report what changed.
    ///
    /// No-op commands (removing a ruby that is not there, inserting without a
    /// selection) still bump the version but report no changed blocks. A
    /// command that fails restores the tree, selection and pending marks it
    /// started from.
    pub fn apply(&mut self, cmd: Cmd) -> Result<Patch, DocumentError> {
        log::debug!("applying {cmd:?} at version {}", self.version);

        let children = self.children.clone();
        let selection = self.selection.clone();
        let marks = self.marks.clone();

        let outcome = commands::execute(self, &cmd).and_then(|()| self.normalize());
        let touched = std::mem::take(&mut self.touched);
        if let Err(err) = outcome {
            log::warn!("{cmd:?} failed, restoring version {}: {err}", self.version);
            self.children = children;
            self.selection = selection;
            self.marks = marks;
            return Err(err);
        }

        self.version += 1;
        let changed = touched
            .into_iter()
            .map(|block| Path::new(vec![block]))
            .collect();

        Ok(Patch {
            changed,
            new_selection: self.selection.clone(),
            version: self.version,
        })
    }

    /// Insert text at the cursor. When the formatting in effect at the cursor
    /// differs from the leaf under it (pending marks, or the previous leaf's
    /// marks at a leaf start) the text goes into a new leaf with that formatting.
    pub fn insert_text(&mut self, text: &str) -> Result<(), DocumentError> {
        if text.is_empty() {
            return Ok(());
        }
        let Some((start, _)) = self.selection_edges() else {
            log::debug!("insert_text ignored: no selection");
            return Ok(());
        };
        self.selection = Some(Selection::collapsed(start.clone()));

        let leaf_marks = self
            .leaf(&start.path)
            .map(|leaf| leaf.marks.clone())
            .ok_or_else(|| DocumentError::InvalidPoint(start.clone()))?;
        let marks = StructuredEditor::marks(self).unwrap_or_default();
        self.marks = None;

        if marks == leaf_marks {
            self.apply_op(Op::InsertText {
                point: start,
                text: text.to_string(),
            })
        } else {
            self.insert_node(Node::Text(Leaf::with_marks(text, marks)))
        }
    }

    /// Apply one primitive op and carry the selection through it
    pub(crate) fn apply_op(&mut self, op: Op) -> Result<(), DocumentError> {
        log::trace!("op {op:?}");

        // a removed leaf hands its points to the end of the leaf before it
        let previous = match &op {
            Op::RemoveNode { path } => self.leaf_before(path),
            _ => None,
        };

        ops::apply(&mut self.children, &op)
            .ok_or_else(|| DocumentError::InvalidEdit(op.path().clone()))?;

        let block = match &op {
            Op::Wrap { parent, start, .. } if parent.is_empty() => Some(*start),
            _ => op.path().indices().first().copied(),
        };
        if let Some(block) = block {
            self.touched.insert(block);
        }

        if let Some(selection) = self.selection.take() {
            self.selection = self.transform_selection(selection, &op, previous);
        }
        Ok(())
    }

    fn transform_selection(
        &self,
        mut selection: Selection,
        op: &Op,
        previous: Option<Point>,
    ) -> Option<Selection> {
        for point in selection.points_mut() {
            *point = match ops::transform_point(point, op) {
                Some(next) => next,
                None => previous
                    .clone()
                    .or_else(|| self.first_point_from(op.path()))?,
            };
        }
        Some(selection)
    }

    pub(crate) fn normalize(&mut self) -> Result<(), DocumentError> {
        if self.children.is_empty() {
            self.apply_op(Op::InsertNode {
                path: Path::new(vec![0]),
                node: Node::empty_paragraph(),
            })?;
        }

        let mut index = 0;
        while index < self.children.len() {
            self.normalize_element(&Path::new(vec![index]))?;
            index += 1;
        }
        Ok(())
    }

    fn normalize_element(&mut self, path: &Path) -> Result<(), DocumentError> {
        let mut index = 0;
        while index < self.child_count(path) {
            let child = path.child(index);
            if matches!(self.node(&child), Some(Node::Element(_))) {
                self.normalize_element(&child)?;
            }
            index += 1;
        }

        let mut index = self.child_count(path);
        while index > 0 {
            index -= 1;
            let child = path.child(index);
            if self.child_count(path) > 1 && self.leaf(&child).is_some_and(Leaf::is_empty) {
                self.apply_op(Op::RemoveNode { path: child })?;
            }
        }

        let mut index = 1;
        while index < self.child_count(path) {
            let previous = self.leaf(&path.child(index - 1));
            let current = self.leaf(&path.child(index));
            match (previous, current) {
                (Some(previous), Some(current)) if previous.marks == current.marks => {
                    let position = previous.len();
                    self.apply_op(Op::MergeText {
                        path: path.child(index),
                        position,
                    })?;
                }
                _ => index += 1,
            }
        }

        if self.child_count(path) == 0 {
            self.apply_op(Op::InsertNode {
                path: path.child(0),
                node: Node::text(""),
            })?;
        }
        Ok(())
    }

    fn child_count(&self, path: &Path) -> usize {
        self.node(path).and_then(Node::children).map_or(0, Vec::len)
    }

    /// Selection edges in document order
    pub(crate) fn selection_edges(&self) -> Option<(Point, Point)> {
        let (start, end) = self.selection.as_ref()?.edges();
        Some((start.clone(), end.clone()))
    }

    /// Nearest block element strictly above `path`
    fn block_of(&self, path: &Path) -> Option<Path> {
        (1..path.len())
            .rev()
            .map(|len| Path::from(&path.indices()[..len]))
            .find(|prefix| {
                self.node(prefix)
                    .and_then(Node::as_element)
                    .is_some_and(Element::is_block)
            })
    }

    fn previous_leaf(&self, path: &Path) -> Option<(Path, &Leaf)> {
        self.leaves()
            .into_iter()
            .take_while(|(leaf_path, _)| leaf_path < path)
            .last()
    }

    fn leaf_before(&self, path: &Path) -> Option<Point> {
        self.previous_leaf(path)
            .map(|(leaf_path, leaf)| Point::new(leaf_path, leaf.len()))
    }

    fn first_point_from(&self, path: &Path) -> Option<Point> {
        self.leaves()
            .into_iter()
            .find(|(leaf_path, _)| leaf_path >= path)
            .map(|(leaf_path, _)| Point::new(leaf_path, 0))
    }

    /// End of the last leaf at or below `path`
    fn last_point_in(&self, path: &Path) -> Option<Point> {
        self.leaves()
            .into_iter()
            .filter(|(leaf_path, _)| leaf_path == path || path.is_ancestor_of(leaf_path))
            .last()
            .map(|(leaf_path, leaf)| Point::new(leaf_path, leaf.len()))
    }

    /// Leaves with at least one selected character between `start` and `end`
    fn covered_leaves(&self, start: &Point, end: &Point) -> Vec<Path> {
        self.leaves()
            .into_iter()
            .filter(|(path, leaf)| {
                if *path < start.path || *path > end.path {
                    return false;
                }
                if start.path == end.path {
                    return true;
                }
                let ends_before = *path == start.path && start.offset >= leaf.len();
                let starts_after = *path == end.path && end.offset == 0;
                !ends_before && !starts_after
            })
            .map(|(path, _)| path)
            .collect()
    }

    /// Split the leaf under `point` and return the path where a node placed at
    /// the point should be inserted
    fn split_leaf_at(&mut self, point: &Point) -> Result<Path, DocumentError> {
        let invalid = || DocumentError::InvalidPoint(point.clone());
        let len = self.leaf(&point.path).ok_or_else(invalid)?.len();
        let index = point.path.last().ok_or_else(invalid)?;

        if point.offset == 0 {
            return Ok(point.path.clone());
        }
        if point.offset < len {
            self.apply_op(Op::SplitText {
                path: point.path.clone(),
                offset: point.offset,
            })?;
        }
        Ok(point.path.with_last(index + 1))
    }

    /// Split the leaves under both selection edges so the selection covers
    /// whole leaves, and return those leaves
    fn split_selection_edges(&mut self) -> Result<Vec<Path>, DocumentError> {
        let Some((_, end)) = self.selection_edges() else {
            return Ok(Vec::new());
        };
        self.split_leaf_at(&end)?;

        let Some((start, _)) = self.selection_edges() else {
            return Ok(Vec::new());
        };
        self.split_leaf_at(&start)?;

        Ok(self
            .selection_edges()
            .map(|(start, end)| self.covered_leaves(&start, &end))
            .unwrap_or_default())
    }

    fn set_mark(&mut self, format: Format, active: bool) -> Result<(), DocumentError> {
        let Some(selection) = self.selection.as_ref() else {
            return Ok(());
        };

        if selection.is_collapsed() {
            let mut marks = StructuredEditor::marks(self).unwrap_or_default();
            if active {
                marks.insert(format);
            } else {
                marks.remove(format);
            }
            self.marks = Some(marks);
            return Ok(());
        }

        for path in self.split_selection_edges()? {
            let Some(leaf) = self.leaf(&path) else {
                continue;
            };
            let mut marks = leaf.marks.clone();
            let changed = if active {
                marks.insert(format)
            } else {
                marks.remove(format)
            };
            if changed {
                self.apply_op(Op::SetMarks { path, marks })?;
            }
        }
        Ok(())
    }
}

/// Inline content may hold leaves and rubies; rubies may not hold rubies
fn check_inline(nodes: &[Node], parent: &Path, in_ruby: bool) -> Result<(), DocumentError> {
    for (index, node) in nodes.iter().enumerate() {
        let Some(element) = node.as_element() else {
            continue;
        };
        let path = parent.child(index);
        if element.is_block() {
            return Err(DocumentError::NestedBlock(path));
        }
        if element.is_ruby() && in_ruby {
            return Err(DocumentError::NestedRuby(path));
        }
        check_inline(&element.children, &path, in_ruby || element.is_ruby())?;
    }
    Ok(())
}

fn collect_descendants<'a>(nodes: &'a [Node], parent: &Path, out: &mut Vec<(Path, &'a Node)>) {
    for (index, node) in nodes.iter().enumerate() {
        let path = parent.child(index);
        if let Some(children) = node.children() {
            out.push((path.clone(), node));
            collect_descendants(children, &path, out);
        } else {
            out.push((path, node));
        }
    }
}

impl StructuredEditor for Document {
    type Error = DocumentError;

    fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    /// Pending marks win. A cursor reports the leaf under it, except at the
    /// very start of a leaf where the previous leaf of the same block is used,
    /// so typing continues the formatting to its left. A range reports only
    /// the marks every covered leaf shares.
    fn marks(&self) -> Option<Marks> {
        let selection = self.selection.as_ref()?;
        if let Some(marks) = &self.marks {
            return Some(marks.clone());
        }

        if selection.is_collapsed() {
            let anchor = &selection.anchor;
            let mut leaf = self.leaf(&anchor.path)?;
            if anchor.offset == 0
                && let Some((previous_path, previous)) = self.previous_leaf(&anchor.path)
                && self.block_of(&previous_path) == self.block_of(&anchor.path)
            {
                leaf = previous;
            }
            return Some(leaf.marks.clone());
        }

        let (start, end) = selection.edges();
        let mut covered = self
            .covered_leaves(start, end)
            .into_iter()
            .filter_map(|path| self.leaf(&path).map(|leaf| leaf.marks.clone()));
        let first = covered.next().unwrap_or_default();
        Some(covered.fold(first, |shared, marks| shared.intersection(&marks)))
    }

    fn add_mark(&mut self, format: Format) -> Result<(), DocumentError> {
        self.set_mark(format, true)
    }

    fn remove_mark(&mut self, format: Format) -> Result<(), DocumentError> {
        self.set_mark(format, false)
    }

    fn nodes(&self, predicate: impl Fn(&Node) -> bool) -> Vec<Path> {
        let Some((start, end)) = self.selection_edges() else {
            return Vec::new();
        };
        self.descendants()
            .into_iter()
            .filter(|(path, node)| {
                let touched =
                    path.is_ancestor_of(&start.path) || (*path >= start.path && *path <= end.path);
                touched && predicate(*node)
            })
            .map(|(path, _)| path)
            .collect()
    }

    fn insert_node(&mut self, node: Node) -> Result<(), DocumentError> {
        let Some((start, _)) = self.selection_edges() else {
            log::debug!("insert_node ignored: no selection");
            return Ok(());
        };
        let at = self.split_leaf_at(&start)?;
        self.apply_op(Op::InsertNode {
            path: at.clone(),
            node,
        })?;
        if let Some(end) = self.last_point_in(&at) {
            self.selection = Some(Selection::collapsed(end));
        }
        Ok(())
    }

    fn wrap_nodes(&mut self, element: Element) -> Result<(), DocumentError> {
        let Some(selection) = self.selection.clone() else {
            return Ok(());
        };
        if selection.is_collapsed() {
            log::debug!("wrap_nodes ignored: collapsed selection");
            return Ok(());
        }

        let covered = self.split_selection_edges()?;
        let (Some(first), Some(last)) = (covered.first(), covered.last()) else {
            return Ok(());
        };
        let start = Point::new(first.clone(), 0);
        let end = Point::new(last.clone(), self.leaf(last).map_or(0, Leaf::len));
        self.selection = Some(if selection.is_backward() {
            Selection::new(end, start)
        } else {
            Selection::new(start, end)
        });

        // one wrapper per block, spanning the block children that hold covered leaves
        let mut groups: Vec<(Path, usize, usize)> = Vec::new();
        for path in &covered {
            let block = self
                .block_of(path)
                .unwrap_or_else(|| Path::from(&path.indices()[..1]));
            let index = path.indices()[block.len()];
            match groups.last_mut() {
                Some((parent, _, end)) if *parent == block => *end = index + 1,
                _ => groups.push((block, index, index + 1)),
            }
        }

        for (parent, start, end) in groups.into_iter().rev() {
            self.apply_op(Op::Wrap {
                parent,
                start,
                end,
                element: element.shell(),
            })?;
        }
        Ok(())
    }

    fn unwrap_nodes(&mut self, predicate: impl Fn(&Node) -> bool) -> Result<(), DocumentError> {
        let targets = self.nodes(|node| node.as_element().is_some() && predicate(node));
        // later and deeper first, so earlier paths stay valid
        for path in targets.into_iter().rev() {
            let len = self.child_count(&path);
            self.apply_op(Op::Unwrap { path, len })?;
        }
        Ok(())
    }

    fn collapse(&mut self, edge: Edge) -> Result<(), DocumentError> {
        if let Some(selection) = self.selection.as_mut() {
            let point = selection.edge(edge).clone();
            *selection = Selection::collapsed(point);
        }
        Ok(())
    }

    /// Within one leaf both offsets are clamped to the leaf; across leaves the
    /// covered text is concatenated.
    fn selected_text(&self) -> String {
        let Some((start, end)) = self.selection_edges() else {
            return String::new();
        };
        if start.path == end.path {
            let Some(leaf) = self.leaf(&start.path) else {
                return String::new();
            };
            let len = leaf.len();
            let (a, b) = (start.offset.min(len), end.offset.min(len));
            let (from, to) = (a.min(b), a.max(b));
            return leaf.text.chars().skip(from).take(to - from).collect();
        }
        self.string(&start, &end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn bold(text: &str) -> Node {
        Node::Text(Leaf::with_marks(text, Marks::new().with(Format::Bold)))
    }

    fn doc_with(children: Vec<Node>) -> Document {
        Document::from_nodes(vec![Node::paragraph(children)]).unwrap()
    }

    fn cursor(path: &[usize], offset: usize) -> Selection {
        Selection::collapsed(Point::new(path.to_vec(), offset))
    }

    fn range(anchor: (&[usize], usize), focus: (&[usize], usize)) -> Selection {
        Selection::new(
            Point::new(anchor.0.to_vec(), anchor.1),
            Point::new(focus.0.to_vec(), focus.1),
        )
    }

    // ============ Construction ============

    #[test]
    fn test_new_document_is_never_empty() {
        let doc = Document::new();
        assert_eq!(doc.children(), &[Node::empty_paragraph()]);
        assert!(doc.selection().is_none());
        assert_eq!(doc.version(), 0);
    }

    #[test]
    fn test_from_json_empty_array_gets_paragraph() {
        let doc = Document::from_json("[]").unwrap();
        assert_eq!(doc.children(), &[Node::empty_paragraph()]);
    }

    #[test]
    fn test_from_json_rejects_text_at_root() {
        let result = Document::from_json(r#"[{"text": "loose"}]"#);
        assert!(matches!(result, Err(DocumentError::InlineAtRoot(0))));
    }

    #[test]
    fn test_from_json_rejects_ruby_at_root() {
        let json = r#"[
            {"type": "paragraph", "children": [{"text": "a"}]},
            {"type": "ruby", "kanji": "犬", "kana": "いぬ", "children": [{"text": "犬"}]}
        ]"#;
        let result = Document::from_json(json);
        assert!(matches!(result, Err(DocumentError::InlineAtRoot(1))));
    }

    #[test]
    fn test_from_json_rejects_nested_ruby() {
        let json = r#"[{"type": "paragraph", "children": [
            {"type": "ruby", "kanji": "a", "kana": "b", "children": [
                {"type": "ruby", "kanji": "c", "kana": "d", "children": [{"text": "c"}]}
            ]}
        ]}]"#;
        let result = Document::from_json(json);
        assert!(matches!(
            result,
            Err(DocumentError::NestedRuby(path)) if path == Path::new(vec![0, 0, 0])
        ));
    }

    #[test]
    fn test_from_json_rejects_paragraph_inside_ruby() {
        let json = r#"[{"type": "paragraph", "children": [
            {"type": "ruby", "kanji": "犬", "kana": "いぬ", "children": [
                {"type": "paragraph", "children": [{"text": "犬"}]}
            ]}
        ]}]"#;
        let result = Document::from_json(json);
        assert!(matches!(
            result,
            Err(DocumentError::NestedBlock(path)) if path == Path::new(vec![0, 0, 0])
        ));
    }

    #[test]
    fn test_from_nodes_rejects_nested_paragraph() {
        let result = Document::from_nodes(vec![Node::paragraph(vec![Node::empty_paragraph()])]);
        assert!(matches!(
            result,
            Err(DocumentError::NestedBlock(path)) if path == Path::new(vec![0, 0])
        ));
    }

    #[test]
    fn test_failed_command_restores_document() {
        let mut doc = doc_with(vec![Node::text("ab"), bold("cd")]);
        // the end edge splits "cd" before the start edge fails to resolve
        doc.selection = Some(range((&[0, 0, 5], 0), (&[0, 1], 1)));
        let before = doc.clone();

        let result = doc.apply(Cmd::ToggleMark {
            format: Format::Italic,
        });

        assert!(matches!(result, Err(DocumentError::InvalidPoint(_))));
        assert_eq!(doc, before);
    }

    #[test]
    fn test_failed_normalize_restores_document() {
        let mut doc = Document::new();
        let ruby = Element::ruby("犬", "いぬ", vec![Node::text("犬")]);
        doc.children = vec![Node::Element(ruby)];
        doc.select(cursor(&[0, 0], 0)).unwrap();
        let before = doc.clone();

        let result = doc.apply(Cmd::RemoveRuby);

        assert!(matches!(result, Err(DocumentError::InvalidEdit(_))));
        assert_eq!(doc, before);
        assert_eq!(doc.version(), 0);
    }

    #[test]
    fn test_from_json_rejects_malformed_json() {
        assert!(matches!(
            Document::from_json("[{"),
            Err(DocumentError::Json(_))
        ));
    }

    #[test]
    fn test_from_nodes_normalizes() {
        let doc = doc_with(vec![
            Node::text("a"),
            Node::text(""),
            Node::text("b"),
            bold("c"),
            bold("d"),
        ]);
        assert_eq!(
            doc.children(),
            &[Node::paragraph(vec![Node::text("ab"), bold("cd")])]
        );
    }

    #[test]
    fn test_empty_ruby_gets_a_leaf() {
        let doc = doc_with(vec![
            Node::text("a"),
            Node::Element(Element::ruby("犬", "いぬ", vec![])),
        ]);
        assert_eq!(
            doc.node(&Path::new(vec![0, 1])),
            Some(&Node::Element(Element::ruby(
                "犬",
                "いぬ",
                vec![Node::text("")]
            )))
        );
    }

    // ============ Selection ============

    #[test]
    fn test_select_validates_points() {
        let mut doc = doc_with(vec![Node::text("abc")]);

        assert!(doc.select(cursor(&[0, 0], 3)).is_ok());
        assert!(matches!(
            doc.select(cursor(&[0, 0], 4)),
            Err(DocumentError::InvalidPoint(_))
        ));
        assert!(matches!(
            doc.select(cursor(&[0], 0)),
            Err(DocumentError::InvalidPoint(_))
        ));
        assert!(matches!(
            doc.select(cursor(&[1, 0], 0)),
            Err(DocumentError::InvalidPoint(_))
        ));
    }

    #[test]
    fn test_select_clears_pending_marks() {
        let mut doc = doc_with(vec![Node::text("abc")]);
        doc.select(cursor(&[0, 0], 1)).unwrap();
        doc.add_mark(Format::Bold).unwrap();
        assert!(doc.pending_marks().is_some());

        doc.select(cursor(&[0, 0], 2)).unwrap();
        assert!(doc.pending_marks().is_none());
    }

    #[test]
    fn test_selected_text_within_leaf_is_clamped() {
        let mut doc = doc_with(vec![Node::text("漢字です")]);
        doc.selection = Some(range((&[0, 0], 3), (&[0, 0], 10)));
        assert_eq!(doc.selected_text(), "す");

        doc.selection = Some(range((&[0, 0], 2), (&[0, 0], 0)));
        assert_eq!(doc.selected_text(), "漢字");
    }

    #[test]
    fn test_selected_text_across_leaves() {
        let mut doc = doc_with(vec![Node::text("ab"), bold("cd"), Node::text("ef")]);
        doc.select(range((&[0, 0], 1), (&[0, 2], 1))).unwrap();
        assert_eq!(doc.selected_text(), "bcde");
    }

    // ============ Marks ============

    #[test]
    fn test_marks_none_without_selection() {
        let doc = doc_with(vec![bold("a")]);
        assert_eq!(StructuredEditor::marks(&doc), None);
    }

    #[test]
    fn test_marks_at_leaf_start_use_previous_leaf() {
        let mut doc = doc_with(vec![bold("ab"), Node::text("cd")]);
        doc.select(cursor(&[0, 1], 0)).unwrap();
        assert_eq!(
            StructuredEditor::marks(&doc),
            Some(Marks::new().with(Format::Bold))
        );

        doc.select(cursor(&[0, 1], 1)).unwrap();
        assert_eq!(StructuredEditor::marks(&doc), Some(Marks::new()));
    }

    #[test]
    fn test_marks_of_range_are_shared_marks() {
        let mut doc = doc_with(vec![
            Node::Text(Leaf::with_marks(
                "ab",
                Marks::new().with(Format::Bold).with(Format::Italic),
            )),
            bold("cd"),
        ]);
        doc.select(range((&[0, 0], 0), (&[0, 1], 2))).unwrap();
        assert_eq!(
            StructuredEditor::marks(&doc),
            Some(Marks::new().with(Format::Bold))
        );

        // a range ending at the start of a leaf does not cover it
        doc.select(range((&[0, 0], 0), (&[0, 1], 0))).unwrap();
        assert_eq!(
            StructuredEditor::marks(&doc),
            Some(Marks::new().with(Format::Bold).with(Format::Italic))
        );
    }

    #[test]
    fn test_add_mark_splits_partial_leaves() {
        let mut doc = doc_with(vec![Node::text("abcdef")]);
        doc.select(range((&[0, 0], 2), (&[0, 0], 4))).unwrap();
        doc.add_mark(Format::Bold).unwrap();
        doc.normalize().unwrap();

        assert_eq!(
            doc.children(),
            &[Node::paragraph(vec![
                Node::text("ab"),
                bold("cd"),
                Node::text("ef"),
            ])]
        );
        assert_eq!(doc.selected_text(), "cd");
    }

    #[test]
    fn test_remove_mark_merges_back() {
        let mut doc = doc_with(vec![Node::text("ab"), bold("cd"), Node::text("ef")]);
        doc.select(range((&[0, 1], 0), (&[0, 1], 2))).unwrap();
        doc.remove_mark(Format::Bold).unwrap();
        doc.normalize().unwrap();

        assert_eq!(
            doc.children(),
            &[Node::paragraph(vec![Node::text("abcdef")])]
        );
        assert_eq!(doc.selection(), Some(&range((&[0, 0], 2), (&[0, 0], 4))));
    }

    // ============ Text insertion ============

    #[test]
    fn test_insert_text_with_pending_marks_creates_leaf() {
        let mut doc = doc_with(vec![Node::text("ab")]);
        doc.select(cursor(&[0, 0], 1)).unwrap();
        doc.add_mark(Format::Bold).unwrap();
        doc.insert_text("X").unwrap();
        doc.normalize().unwrap();

        assert_eq!(
            doc.children(),
            &[Node::paragraph(vec![
                Node::text("a"),
                bold("X"),
                Node::text("b"),
            ])]
        );
        assert!(doc.pending_marks().is_none());
        assert_eq!(doc.selection(), Some(&cursor(&[0, 1], 1)));
    }

    #[test]
    fn test_insert_text_plain() {
        let mut doc = doc_with(vec![Node::text("ab")]);
        doc.select(cursor(&[0, 0], 1)).unwrap();
        doc.insert_text("漢").unwrap();

        assert_eq!(doc.text(), "a漢b");
        assert_eq!(doc.selection(), Some(&cursor(&[0, 0], 2)));
    }

    // ============ Structure ============

    #[test]
    fn test_removed_leaf_hands_cursor_to_previous_leaf() {
        let mut doc = doc_with(vec![Node::text("ab"), bold("cd")]);
        doc.selection = Some(cursor(&[0, 1], 1));
        doc.apply_op(Op::RemoveNode {
            path: Path::new(vec![0, 1]),
        })
        .unwrap();

        assert_eq!(doc.selection(), Some(&cursor(&[0, 0], 2)));
    }

    #[test]
    fn test_insert_node_moves_cursor_to_end_of_node() {
        let mut doc = doc_with(vec![Node::text("abcd")]);
        doc.select(cursor(&[0, 0], 2)).unwrap();
        doc.insert_node(Node::Element(Element::ruby(
            "x",
            "y",
            vec![Node::text("xyz")],
        )))
        .unwrap();

        assert_eq!(
            doc.children(),
            &[Node::paragraph(vec![
                Node::text("ab"),
                Node::Element(Element::ruby("x", "y", vec![Node::text("xyz")])),
                Node::text("cd"),
            ])]
        );
        assert_eq!(doc.selection(), Some(&cursor(&[0, 1, 0], 3)));
    }

    #[test]
    fn test_wrap_nodes_across_blocks_wraps_each_block() {
        let mut doc = Document::from_nodes(vec![
            Node::paragraph(vec![Node::text("abc")]),
            Node::paragraph(vec![Node::text("def")]),
        ])
        .unwrap();
        doc.select(range((&[0, 0], 1), (&[1, 0], 2))).unwrap();
        doc.wrap_nodes(Element::ruby("k", "r", vec![])).unwrap();

        assert_eq!(
            doc.children(),
            &[
                Node::paragraph(vec![
                    Node::text("a"),
                    Node::Element(Element::ruby("k", "r", vec![Node::text("bc")])),
                ]),
                Node::paragraph(vec![
                    Node::Element(Element::ruby("k", "r", vec![Node::text("de")])),
                    Node::text("f"),
                ]),
            ]
        );
        assert_eq!(
            doc.selection(),
            Some(&range((&[0, 1, 0], 0), (&[1, 0, 0], 2)))
        );
    }

    #[test]
    fn test_nodes_reports_ancestors_and_covered() {
        let mut doc = doc_with(vec![
            Node::text("a"),
            Node::Element(Element::ruby("b", "x", vec![Node::text("b")])),
            Node::text("c"),
        ]);

        doc.select(cursor(&[0, 0], 1)).unwrap();
        assert!(doc.nodes(Node::is_ruby).is_empty());

        doc.select(cursor(&[0, 1, 0], 0)).unwrap();
        assert_eq!(doc.nodes(Node::is_ruby), vec![Path::new(vec![0, 1])]);

        doc.select(range((&[0, 0], 0), (&[0, 2], 1))).unwrap();
        assert_eq!(doc.nodes(Node::is_ruby), vec![Path::new(vec![0, 1])]);
    }

    #[test]
    fn test_text_joins_blocks() {
        let doc = Document::from_nodes(vec![
            Node::paragraph(vec![Node::text("ab")]),
            Node::paragraph(vec![Node::text("cd")]),
        ])
        .unwrap();
        assert_eq!(doc.text(), "ab\ncd");
    }
}
