#![forbid(unsafe_code)]

//! Layout persistence.
//!
//! Layouts are stored as pretty-printed JSON [`LayoutTree`] documents. Reads
//! validate the document structure before returning it.

use std::fmt;
use std::path::Path;

use panedock_layout::{LayoutTree, LayoutTreeError};

/// Errors reading or writing a layout file.
#[derive(Debug)]
pub enum PersistError {
    Io(std::io::Error),
    Json(serde_json::Error),
    Layout(LayoutTreeError),
}

impl fmt::Display for PersistError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "layout I/O error: {err}"),
            Self::Json(err) => write!(f, "layout JSON error: {err}"),
            Self::Layout(err) => write!(f, "invalid layout: {err}"),
        }
    }
}

impl std::error::Error for PersistError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Json(err) => Some(err),
            Self::Layout(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for PersistError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for PersistError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

impl From<LayoutTreeError> for PersistError {
    fn from(err: LayoutTreeError) -> Self {
        Self::Layout(err)
    }
}

/// Parse and validate a layout document.
pub fn layout_from_json(text: &str) -> Result<LayoutTree, PersistError> {
    let layout: LayoutTree = serde_json::from_str(text)?;
    layout.validate()?;
    Ok(layout)
}

/// Render a layout document.
pub fn layout_to_json(layout: &LayoutTree) -> Result<String, PersistError> {
    Ok(serde_json::to_string_pretty(layout)?)
}

/// Read and validate a layout file.
pub fn read_layout(path: impl AsRef<Path>) -> Result<LayoutTree, PersistError> {
    let text = std::fs::read_to_string(path.as_ref())?;
    layout_from_json(&text)
}

/// Write a layout file, replacing any existing one.
pub fn write_layout(path: impl AsRef<Path>, layout: &LayoutTree) -> Result<(), PersistError> {
    std::fs::write(path.as_ref(), layout_to_json(layout)?)?;
    Ok(())
}
