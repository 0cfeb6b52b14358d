use std::collections::BTreeMap;

use crate::editing::StructuredEditor;
use crate::models::{FORMATS, Format};

/// Whether `format` is set across the current selection (or pending at the
/// cursor). `false` when there is no selection.
pub fn is_mark_active<E: StructuredEditor>(editor: &E, format: Format) -> bool {
    editor.marks().is_some_and(|marks| marks.contains(format))
}

/// Clear `format` if it is active, set it otherwise
pub fn toggle_mark<E: StructuredEditor>(editor: &mut E, format: Format) -> Result<(), E::Error> {
    if is_mark_active(editor, format) {
        log::debug!("removing mark {format}");
        editor.remove_mark(format)
    } else {
        log::debug!("adding mark {format}");
        editor.add_mark(format)
    }
}

/// Hotkey → format bindings from the format table
pub fn default_hotkeys() -> BTreeMap<String, Format> {
    FORMATS
        .iter()
        .map(|spec| (spec.hotkey.to_string(), spec.format))
        .collect()
}

/// Canonical spelling of a key combination: lowercase, no spaces
pub fn normalize_hotkey(hotkey: &str) -> String {
    hotkey
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

pub fn format_for_hotkey(hotkeys: &BTreeMap<String, Format>, hotkey: &str) -> Option<Format> {
    let wanted = normalize_hotkey(hotkey);
    hotkeys
        .iter()
        .find(|(bound, _)| normalize_hotkey(bound) == wanted)
        .map(|(_, format)| *format)
}
