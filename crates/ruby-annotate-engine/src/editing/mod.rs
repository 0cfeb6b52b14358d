/*!
 * # Editing Core Module
 *
 * ## Architecture Overview
 *
 * ### 1. Block Tree as the Single Source of Truth
 * - A [`Document`] owns a tree of block elements (paragraphs) holding text
 *   leaves and inline elements (rubies)
 * - Leaves carry formatting as a set of marks; there is no separate style layer
 * - The tree round-trips through JSON in the `{ "text": ..., "bold": true }` shape
 *
 * ### 2. Command-Based Editing
 * - User intent is a **Command** (`Cmd`), applied with `Document::apply`
 * - Commands compile to primitive **Ops** (`Op`): insert, remove, split, merge,
 *   set marks, wrap, unwrap
 * - Every applied command normalizes the tree and increments the version
 *
 * ### 3. Selection Follows the Text
 * - A selection is an anchor/focus pair of `Point`s (leaf path + character offset)
 * - Each op transforms both points, so a selection survives splits, merges,
 *   wraps and unwraps without being recomputed from scratch
 *
 * ### 4. Editor Primitives Behind a Trait
 * - The mark and ruby models in [`crate::annotations`] only use
 *   [`StructuredEditor`], so a host editor with its own tree can adopt them
 *
 * ## Example
 *
 * ```rust
 * use ruby_annotate_engine::editing::{Cmd, Document};
 * use ruby_annotate_engine::models::Format;
 *
 * let mut doc = Document::new();
 * doc.apply(Cmd::Select { selection: "0.0:0".parse().unwrap() }).unwrap();
 * doc.apply(Cmd::ToggleMark { format: Format::Italic }).unwrap();
 * let patch = doc.apply(Cmd::InsertText { text: "hello".to_string() }).unwrap();
 *
 * assert_eq!(patch.version, doc.version());
 * assert_eq!(doc.text(), "hello");
 * ```
 */

pub mod commands;
pub mod document;
pub mod editor;
pub mod ops;
pub mod patch;
pub mod selection;

pub use commands::Cmd;
pub use document::{Document, DocumentError};
pub use editor::StructuredEditor;
pub use ops::Op;
pub use patch::Patch;
pub use selection::{Edge, Path, Point, PositionParseError, Selection};
