pub mod annotations;
pub mod editing;
pub mod io;
pub mod models;
pub mod serialize;

// Re-export key types for easier usage
pub use annotations::*;
pub use editing::{
    Cmd, Document, DocumentError, Edge, Patch, Path, Point, Selection, StructuredEditor,
};
pub use io::*;
pub use models::*;
pub use serialize::{Fixup, Rendered, RubyContent, SerializeOptions, Serializer, serialize};
