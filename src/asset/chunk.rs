//! Chunks and the compilation they belong to.

use thiserror::Error;

use super::AssetSet;
use crate::render::RenderError;

/// A named group of output files rendered as one unit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Chunk {
    pub name: String,
    /// Asset identifiers, in bundler order.
    pub files: Vec<String>,
    /// Fingerprint of the chunk's compiled content.
    pub hash: String,
}

impl Chunk {
    pub fn new(name: impl Into<String>, files: Vec<String>, hash: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            files,
            hash: hash.into(),
        }
    }

    /// The script to render: the first file containing `<name>.js` that is
    /// not a source map.
    pub fn entry_file(&self) -> Option<&str> {
        let needle = format!("{}.js", self.name);
        self.files
            .iter()
            .map(String::as_str)
            .find(|file| file.contains(&needle) && !file.ends_with(".map"))
    }

    /// Swap `old` for `new` in the file list. `new` is appended.
    pub fn replace_file(&mut self, old: &str, new: String) {
        self.files.push(new);
        if let Some(pos) = self.files.iter().position(|f| f == old) {
            self.files.remove(pos);
        }
    }
}

/// A unit that failed to render.
#[derive(Debug, Error)]
#[error("chunk `{chunk}`: {error}")]
pub struct UnitError {
    pub chunk: String,
    pub asset: String,
    pub error: RenderError,
}

/// Everything a pass reads and rewrites.
#[derive(Debug, Default)]
pub struct Compilation {
    pub assets: AssetSet,
    pub chunks: Vec<Chunk>,
    /// Build-visible unit failures.
    pub errors: Vec<UnitError>,
}

impl Compilation {
    pub fn new(assets: AssetSet, chunks: Vec<Chunk>) -> Self {
        Self {
            assets,
            chunks,
            errors: Vec::new(),
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}
