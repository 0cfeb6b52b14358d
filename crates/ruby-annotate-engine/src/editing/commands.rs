use crate::annotations::{marks, ruby};
use crate::editing::document::{Document, DocumentError};
use crate::editing::selection::Selection;
use crate::models::Format;

/// User-level editing commands
#[derive(Debug, Clone, PartialEq)]
pub enum Cmd {
    Select { selection: Selection },
    Deselect,
    InsertText { text: String },
    ToggleMark { format: Format },
    /// Annotate the current selection with a reading; the base text is the
    /// selected text
    AddRuby { kana: String },
    InsertRuby { kanji: String, kana: String },
    /// Unwrap every ruby the selection touches
    RemoveRuby,
}

pub(crate) fn execute(doc: &mut Document, cmd: &Cmd) -> Result<(), DocumentError> {
    let seed = doc.ruby_seed();
    match cmd {
        Cmd::Select { selection } => doc.select(selection.clone()),
        Cmd::Deselect => {
            doc.deselect();
            Ok(())
        }
        Cmd::InsertText { text } => doc.insert_text(text),
        Cmd::ToggleMark { format } => marks::toggle_mark(doc, *format),
        Cmd::AddRuby { kana } => ruby::add_ruby_with(doc, kana, seed).map(|_| ()),
        Cmd::InsertRuby { kanji, kana } => ruby::insert_ruby_with(doc, kanji, kana, seed),
        Cmd::RemoveRuby => ruby::unwrap_ruby(doc),
    }
}
