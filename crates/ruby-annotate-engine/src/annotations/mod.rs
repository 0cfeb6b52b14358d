//! Annotation models built on [`StructuredEditor`](crate::editing::StructuredEditor):
//! character formatting marks and ruby (reading) annotations.

pub mod marks;
pub mod ruby;

pub use marks::{default_hotkeys, format_for_hotkey, is_mark_active, normalize_hotkey, toggle_mark};
pub use ruby::{
    CollapsedRubySeed, add_ruby, add_ruby_with, insert_ruby, insert_ruby_with, is_ruby_active,
    unwrap_ruby, wrap_ruby, wrap_ruby_with,
};
