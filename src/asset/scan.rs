//! Building a compilation from a bare output directory.
//!
//! Without a manifest every script is its own chunk, named after its file
//! stem and fingerprinted by its content.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use jwalk::WalkDir;

use super::{Asset, AssetSet, Chunk, Compilation};
use crate::utils::hash::content_hash;

/// Scan `output` recursively.
///
/// Every file is loaded into the asset set; every `*.js` file also becomes
/// a chunk.
pub fn scan_output(output: &Path) -> Result<Compilation> {
    if !output.is_dir() {
        anyhow::bail!("output directory {} does not exist", output.display());
    }

    let mut files: Vec<_> = WalkDir::new(output)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path())
        .collect();
    files.sort();

    let mut assets = AssetSet::new();
    let mut chunks = Vec::new();

    for path in files {
        let Some(name) = relative_name(output, &path) else {
            continue;
        };
        let bytes = fs::read(&path).with_context(|| format!("failed to read {}", path.display()))?;

        if name.ends_with(".js") {
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            chunks.push(Chunk::new(stem, vec![name.clone()], content_hash(&bytes)));
        }

        assets.insert(&name, Asset::from_bytes(bytes));
    }

    Ok(Compilation::new(assets, chunks))
}

/// `path` relative to `root`, `/`-separated.
fn relative_name(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<_> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect();
    (!parts.is_empty()).then(|| parts.join("/"))
}
