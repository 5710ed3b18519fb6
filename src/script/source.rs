//! Named script sources.
//!
//! A source is either a file on disk, resolved when the run reaches it, or
//! inline text. A missing file is a distinct outcome from an unreadable one.

use humansize::{DECIMAL, format_size};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Where a script's text comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceOrigin {
    File(PathBuf),
    Inline(String),
}

/// Result of loading a source.
#[derive(Debug)]
pub enum SourceText {
    Loaded(String),
    /// The file does not exist.
    Missing(PathBuf),
    /// The file exists but reading it failed.
    Unreadable(PathBuf, std::io::Error),
}

/// A named script in the run's ordered list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptSource {
    name: String,
    origin: SourceOrigin,
}

impl ScriptSource {
    /// Script backed by a file.
    pub fn file(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            origin: SourceOrigin::File(path.into()),
        }
    }

    /// Script backed by text already in memory.
    pub fn inline(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            origin: SourceOrigin::Inline(text.into()),
        }
    }

    /// Resolve script names against a directory, keeping their order.
    pub fn from_dir<S: AsRef<str>>(dir: &Path, names: &[S]) -> Vec<Self> {
        names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                Self::file(name, dir.join(name))
            })
            .collect()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn origin(&self) -> &SourceOrigin {
        &self.origin
    }

    /// Path of a file-backed source.
    pub fn path(&self) -> Option<&Path> {
        match &self.origin {
            SourceOrigin::File(path) => Some(path),
            SourceOrigin::Inline(_) => None,
        }
    }

    /// Read the whole script into memory.
    pub async fn load(&self) -> SourceText {
        let path = match &self.origin {
            SourceOrigin::Inline(text) => return SourceText::Loaded(text.clone()),
            SourceOrigin::File(path) => path,
        };

        match tokio::fs::read_to_string(path).await {
            Ok(text) => {
                debug!(
                    script = %self.name,
                    path = %path.display(),
                    size = %format_size(text.len(), DECIMAL),
                    "Loaded script"
                );
                SourceText::Loaded(text)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => SourceText::Missing(path.clone()),
            Err(e) => SourceText::Unreadable(path.clone(), e),
        }
    }
}
