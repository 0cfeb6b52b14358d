use std::fs;
use std::path::{Path, PathBuf};

use crate::editing::{Document, DocumentError};

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid document in {path}: {source}")]
    InvalidDocument {
        path: PathBuf,
        #[source]
        source: DocumentError,
    },
}

/// Load a document tree from a JSON file
pub fn read_document(path: &Path) -> Result<Document, IoError> {
    if !path.exists() {
        return Err(IoError::NotFound(path.to_path_buf()));
    }
    let json = fs::read_to_string(path)?;
    Document::from_json(&json).map_err(|source| IoError::InvalidDocument {
        path: path.to_path_buf(),
        source,
    })
}

/// Write the document tree as pretty-printed JSON
pub fn write_document(path: &Path, doc: &Document) -> Result<(), IoError> {
    let json = doc.to_json().map_err(|source| IoError::InvalidDocument {
        path: path.to_path_buf(),
        source,
    })?;
    write_string(path, &json)
}

/// Write serialized markup (or any text), creating parent directories
pub fn write_string(path: &Path, content: &str) -> Result<(), IoError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    Ok(())
}
