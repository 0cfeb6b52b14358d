use crate::editing::selection::{Path, Selection};

/// What a command changed, for hosts that redraw incrementally
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patch {
    /// Top-level blocks whose content or structure changed, in document order
    pub changed: Vec<Path>,
    pub new_selection: Option<Selection>,
    /// Document version after the command
    pub version: u64,
}

impl Patch {
    pub fn is_noop(&self) -> bool {
        self.changed.is_empty()
    }
}
