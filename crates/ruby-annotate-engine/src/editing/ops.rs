use crate::editing::selection::{Path, Point};
use crate::models::{Element, Leaf, Marks, Node};

/// Primitive tree edits. Every structural command compiles down to these.
///
/// Each op carries whatever it needs to transform points through it, so a
/// selection can be kept in sync without looking at the tree again.
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    InsertNode {
        path: Path,
        node: Node,
    },
    RemoveNode {
        path: Path,
    },
    /// Split the leaf at `path` at character `offset`; the tail becomes the next sibling
    SplitText {
        path: Path,
        offset: usize,
    },
    /// Merge the leaf at `path` into its previous sibling, which is `position` characters long
    MergeText {
        path: Path,
        position: usize,
    },
    InsertText {
        point: Point,
        text: String,
    },
    SetMarks {
        path: Path,
        marks: Marks,
    },
    /// Move children `start..end` of `parent` into a new `element` placed at `start`
    Wrap {
        parent: Path,
        start: usize,
        end: usize,
        element: Element,
    },
    /// Replace the element at `path` with its `len` children
    Unwrap {
        path: Path,
        len: usize,
    },
}

impl Op {
    /// The node path this op is anchored on
    pub fn path(&self) -> &Path {
        match self {
            Op::InsertNode { path, .. }
            | Op::RemoveNode { path }
            | Op::SplitText { path, .. }
            | Op::MergeText { path, .. }
            | Op::SetMarks { path, .. }
            | Op::Unwrap { path, .. } => path,
            Op::InsertText { point, .. } => &point.path,
            Op::Wrap { parent, .. } => parent,
        }
    }
}

/// Apply an op to the root child list. Returns `None` when a path does not
/// resolve to a node of the expected kind.
pub(crate) fn apply(root: &mut Vec<Node>, op: &Op) -> Option<()> {
    match op {
        Op::InsertNode { path, node } => {
            let (siblings, index) = siblings_mut(root, path)?;
            if index > siblings.len() {
                return None;
            }
            siblings.insert(index, node.clone());
        }
        Op::RemoveNode { path } => {
            let (siblings, index) = siblings_mut(root, path)?;
            if index >= siblings.len() {
                return None;
            }
            siblings.remove(index);
        }
        Op::SplitText { path, offset } => {
            let (siblings, index) = siblings_mut(root, path)?;
            let leaf = siblings.get_mut(index)?.as_leaf_mut()?;
            let at = byte_index(&leaf.text, *offset)?;
            let tail = Leaf::with_marks(leaf.text.split_off(at), leaf.marks.clone());
            siblings.insert(index + 1, Node::Text(tail));
        }
        Op::MergeText { path, .. } => {
            let (siblings, index) = siblings_mut(root, path)?;
            if index == 0 {
                return None;
            }
            let text = siblings.get(index)?.as_leaf()?.text.clone();
            let previous = siblings.get_mut(index - 1)?.as_leaf_mut()?;
            previous.text.push_str(&text);
            siblings.remove(index);
        }
        Op::InsertText { point, text } => {
            let leaf = node_mut(root, &point.path)?.as_leaf_mut()?;
            let at = byte_index(&leaf.text, point.offset)?;
            leaf.text.insert_str(at, text);
        }
        Op::SetMarks { path, marks } => {
            node_mut(root, path)?.as_leaf_mut()?.marks = marks.clone();
        }
        Op::Wrap {
            parent,
            start,
            end,
            element,
        } => {
            let siblings = children_mut(root, parent)?;
            if start > end || *end > siblings.len() {
                return None;
            }
            let mut wrapper = element.shell();
            wrapper.children = siblings.drain(*start..*end).collect();
            siblings.insert(*start, Node::Element(wrapper));
        }
        Op::Unwrap { path, .. } => {
            let (siblings, index) = siblings_mut(root, path)?;
            if !matches!(siblings.get(index), Some(Node::Element(_))) {
                return None;
            }
            if let Node::Element(element) = siblings.remove(index) {
                siblings.splice(index..index, element.children);
            }
        }
    }
    Some(())
}

/// Transform a path through an op. `None` means the node it addressed was removed.
pub(crate) fn transform_path(path: &Path, op: &Op) -> Option<Path> {
    let mut result = path.clone();
    match op {
        Op::InsertNode { path: at, .. } | Op::SplitText { path: at, .. } => {
            let Some((depth, index)) = level_of(at) else {
                return Some(result);
            };
            // a split keeps the original leaf in place; only later siblings shift
            let threshold = match op {
                Op::SplitText { .. } => index + 1,
                _ => index,
            };
            if shares_parent_level(&result, at) && result.indices()[depth] >= threshold {
                result.indices_mut()[depth] += 1;
            }
        }
        Op::RemoveNode { path: at } => {
            if result.starts_with(at) {
                return None;
            }
            if let Some((depth, index)) = level_of(at)
                && shares_parent_level(&result, at)
                && result.indices()[depth] > index
            {
                result.indices_mut()[depth] -= 1;
            }
        }
        Op::MergeText { path: at, .. } => {
            if let Some((depth, index)) = level_of(at)
                && shares_parent_level(&result, at)
            {
                let current = result.indices()[depth];
                if current >= index && index > 0 {
                    result.indices_mut()[depth] -= 1;
                }
            }
        }
        Op::Wrap {
            parent, start, end, ..
        } => {
            let depth = parent.len();
            if result.starts_with(parent) && result.len() > depth {
                let index = result.indices()[depth];
                if index >= *start && index < *end {
                    let mut indices = parent.indices().to_vec();
                    indices.push(*start);
                    indices.push(index - start);
                    indices.extend_from_slice(&result.indices()[depth + 1..]);
                    result = Path::new(indices);
                } else if index >= *end {
                    result.indices_mut()[depth] = index + 1 - (end - start);
                }
            }
        }
        Op::Unwrap { path: at, len } => {
            let Some((depth, index)) = level_of(at) else {
                return Some(result);
            };
            if at.is_ancestor_of(&result) {
                let inner = result.indices()[depth + 1];
                let mut indices = at.indices()[..depth].to_vec();
                indices.push(index + inner);
                indices.extend_from_slice(&result.indices()[depth + 2..]);
                result = Path::new(indices);
            } else if shares_parent_level(&result, at) && result.indices()[depth] > index {
                // len may be zero, in which case later siblings move up by one
                result.indices_mut()[depth] = result.indices()[depth] + len - 1;
            }
        }
        Op::InsertText { .. } | Op::SetMarks { .. } => {}
    }
    Some(result)
}

/// Transform a point through an op. `None` means its leaf was removed.
pub(crate) fn transform_point(point: &Point, op: &Op) -> Option<Point> {
    match op {
        Op::SplitText { path, offset } if &point.path == path && point.offset > *offset => {
            Some(Point::new(path.with_last(path.last()? + 1), point.offset - offset))
        }
        Op::MergeText { path, position } if &point.path == path => Some(Point::new(
            path.with_last(path.last()?.checked_sub(1)?),
            point.offset + position,
        )),
        Op::InsertText { point: at, text }
            if point.path == at.path && point.offset >= at.offset =>
        {
            Some(Point::new(point.path.clone(), point.offset + text.chars().count()))
        }
        _ => Some(Point::new(transform_path(&point.path, op)?, point.offset)),
    }
}

pub(crate) fn node<'a>(root: &'a [Node], path: &Path) -> Option<&'a Node> {
    let (first, rest) = path.indices().split_first()?;
    let mut current = root.get(*first)?;
    for index in rest {
        current = current.children()?.get(*index)?;
    }
    Some(current)
}

pub(crate) fn node_mut<'a>(root: &'a mut [Node], path: &Path) -> Option<&'a mut Node> {
    let (first, rest) = path.indices().split_first()?;
    let mut current = root.get_mut(*first)?;
    for index in rest {
        current = current.children_mut()?.get_mut(*index)?;
    }
    Some(current)
}

/// Child list of the node at `path`; the empty path is the root list
pub(crate) fn children_mut<'a>(root: &'a mut Vec<Node>, path: &Path) -> Option<&'a mut Vec<Node>> {
    if path.is_empty() {
        return Some(root);
    }
    node_mut(root, path)?.children_mut()
}

fn siblings_mut<'a>(root: &'a mut Vec<Node>, path: &Path) -> Option<(&'a mut Vec<Node>, usize)> {
    let index = path.last()?;
    let parent = path.parent()?;
    Some((children_mut(root, &parent)?, index))
}

/// (depth of the final index, final index)
fn level_of(path: &Path) -> Option<(usize, usize)> {
    Some((path.len().checked_sub(1)?, path.last()?))
}

/// True when `path` runs through the parent of `at` and so has an index at `at`'s level
fn shares_parent_level(path: &Path, at: &Path) -> bool {
    let depth = at.len() - 1;
    path.len() > depth && path.indices()[..depth] == at.indices()[..depth]
}

/// Byte index of character `offset`; `None` when past the end
fn byte_index(text: &str, offset: usize) -> Option<usize> {
    if offset == text.chars().count() {
        return Some(text.len());
    }
    text.char_indices().nth(offset).map(|(index, _)| index)
}
