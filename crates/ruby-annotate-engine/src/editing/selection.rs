use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Position of a node in the tree: child indices walked down from the root.
///
/// Paths compare lexicographically, which is document (pre-order) order:
/// an ancestor sorts before its descendants, and earlier siblings before later ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Path(Vec<usize>);

impl Path {
    pub fn new(indices: Vec<usize>) -> Self {
        Self(indices)
    }

    /// The empty path addresses the document root
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn last(&self) -> Option<usize> {
        self.0.last().copied()
    }

    pub fn parent(&self) -> Option<Path> {
        let (_, parent) = self.0.split_last()?;
        Some(Path(parent.to_vec()))
    }

    pub fn child(&self, index: usize) -> Path {
        let mut indices = self.0.clone();
        indices.push(index);
        Path(indices)
    }

    /// Same parent, different final index
    pub fn with_last(&self, index: usize) -> Path {
        let mut indices = self.0.clone();
        if let Some(last) = indices.last_mut() {
            *last = index;
        }
        Path(indices)
    }

    /// Strict prefix test
    pub fn is_ancestor_of(&self, other: &Path) -> bool {
        self.0.len() < other.0.len() && other.0.starts_with(&self.0)
    }

    pub fn starts_with(&self, prefix: &Path) -> bool {
        self.0.starts_with(&prefix.0)
    }

    pub(crate) fn indices_mut(&mut self) -> &mut Vec<usize> {
        &mut self.0
    }
}

impl From<Vec<usize>> for Path {
    fn from(indices: Vec<usize>) -> Self {
        Self(indices)
    }
}

impl From<&[usize]> for Path {
    fn from(indices: &[usize]) -> Self {
        Self(indices.to_vec())
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        f.write_str(&parts.join("."))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PositionParseError {
    #[error("Invalid path segment '{0}'")]
    InvalidPath(String),
    #[error("Expected PATH:OFFSET, got '{0}'")]
    MissingOffset(String),
    #[error("Invalid offset '{0}'")]
    InvalidOffset(String),
}

impl FromStr for Path {
    type Err = PositionParseError;

    /// Parses dotted indices, e.g. `0.2.1`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split('.')
            .map(|segment| {
                segment
                    .trim()
                    .parse::<usize>()
                    .map_err(|_| PositionParseError::InvalidPath(segment.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Path)
    }
}

/// A location inside a text leaf: the leaf's path plus a character offset.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Point {
    pub path: Path,
    pub offset: usize,
}

impl Point {
    pub fn new(path: impl Into<Path>, offset: usize) -> Self {
        Self {
            path: path.into(),
            offset,
        }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.path, self.offset)
    }
}

impl FromStr for Point {
    type Err = PositionParseError;

    /// Parses `PATH:OFFSET`, e.g. `0.0:3`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (path, offset) = s
            .rsplit_once(':')
            .ok_or_else(|| PositionParseError::MissingOffset(s.to_string()))?;
        let offset = offset
            .trim()
            .parse()
            .map_err(|_| PositionParseError::InvalidOffset(offset.to_string()))?;
        Ok(Point::new(path.parse::<Path>()?, offset))
    }
}

/// Which end of a selection an operation refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Anchor,
    Focus,
    Start,
    End,
}

/// A selection is a pair of points. `anchor` is where it began, `focus` where
/// it ends up; either can come first in document order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Selection {
    pub anchor: Point,
    pub focus: Point,
}

impl Selection {
    pub fn new(anchor: Point, focus: Point) -> Self {
        Self { anchor, focus }
    }

    /// A cursor: both ends at the same point
    pub fn collapsed(point: Point) -> Self {
        Self {
            anchor: point.clone(),
            focus: point,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    pub fn is_backward(&self) -> bool {
        self.focus < self.anchor
    }

    /// (start, end) in document order
    pub fn edges(&self) -> (&Point, &Point) {
        if self.is_backward() {
            (&self.focus, &self.anchor)
        } else {
            (&self.anchor, &self.focus)
        }
    }

    pub fn start(&self) -> &Point {
        self.edges().0
    }

    pub fn end(&self) -> &Point {
        self.edges().1
    }

    pub fn edge(&self, edge: Edge) -> &Point {
        match edge {
            Edge::Anchor => &self.anchor,
            Edge::Focus => &self.focus,
            Edge::Start => self.start(),
            Edge::End => self.end(),
        }
    }

    pub(crate) fn points_mut(&mut self) -> [&mut Point; 2] {
        [&mut self.anchor, &mut self.focus]
    }
}

impl FromStr for Selection {
    type Err = PositionParseError;

    /// Parses `ANCHOR` (a cursor) or `ANCHOR-FOCUS`, e.g. `0.0:0-0.0:2`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('-') {
            Some((anchor, focus)) => Ok(Selection::new(anchor.parse()?, focus.parse()?)),
            None => Ok(Selection::collapsed(s.parse()?)),
        }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_collapsed() {
            write!(f, "{}", self.anchor)
        } else {
            write!(f, "{}-{}", self.anchor, self.focus)
        }
    }
}
