//! Loading of assembly source files.
//!
//! The loader keeps the raw text around so it can be shown back to the user,
//! and exposes the lines with their 1-based line numbers so that every
//! instruction (and every trace entry) can point back at the line it came
//! from.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

const BOM: char = '\u{feff}';

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("File path cannot be empty")]
    PathInvalid,

    #[error("Cannot read source file `{path}`: {reason}")]
    SourceUnreadable { path: PathBuf, reason: String },
}

/// The text of an assembly program, split into lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    path: Option<PathBuf>,
    text: String,
    lines: Vec<String>,
}

impl SourceFile {
    /// Reads the file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        if path.as_os_str().to_string_lossy().trim().is_empty() {
            return Err(LoadError::PathInvalid);
        }

        let text = fs::read_to_string(path).map_err(|err| LoadError::SourceUnreadable {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;
        debug!(path = %path.display(), bytes = text.len(), "loaded source file");

        let mut source = Self::from_text(text);
        source.path = Some(path.to_path_buf());
        Ok(source)
    }

    /// Builds a source from in-memory text. A leading byte order mark is
    /// dropped.
    pub fn from_text(text: impl Into<String>) -> Self {
        let mut text = text.into();
        if text.starts_with(BOM) {
            text.drain(..BOM.len_utf8());
        }
        let lines = text.lines().map(str::to_string).collect();
        Self {
            path: None,
            text,
            lines,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// The full source text.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Returns the line with the given 1-based number.
    pub fn line(&self, line_num: usize) -> Option<&str> {
        line_num
            .checked_sub(1)
            .and_then(|idx| self.lines.get(idx))
            .map(String::as_str)
    }

    /// Iterates over `(line_num, text)` pairs, numbering from 1.
    pub fn lines(&self) -> impl Iterator<Item = (usize, &str)> {
        self.lines
            .iter()
            .enumerate()
            .map(|(idx, line)| (idx + 1, line.as_str()))
    }
}
