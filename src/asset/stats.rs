//! Loading a compilation from a bundler stats manifest.
//!
//! Understands the `chunks` array of webpack's `stats.json`:
//!
//! ```json
//! { "chunks": [{ "id": 0, "names": ["main"], "files": ["main.js"], "hash": "3f2a…" }] }
//! ```

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;

use super::{Asset, AssetSet, Chunk, Compilation};
use crate::debug;
use crate::utils::hash::hex_digest;

#[derive(Debug, Deserialize)]
struct Stats {
    #[serde(default)]
    chunks: Vec<StatsChunk>,
}

#[derive(Debug, Deserialize)]
struct StatsChunk {
    #[serde(default)]
    id: Value,
    #[serde(default)]
    names: Vec<String>,
    #[serde(default)]
    files: Vec<String>,
    #[serde(default)]
    hash: Option<String>,
}

impl StatsChunk {
    /// First name, or the id for anonymous chunks.
    fn name(&self) -> String {
        match (self.names.first(), &self.id) {
            (Some(name), _) => name.clone(),
            (None, Value::String(id)) => id.clone(),
            (None, Value::Null) => String::new(),
            (None, id) => id.to_string(),
        }
    }
}

/// Load chunks from `stats` and their files from `output`.
///
/// Files the manifest lists but the directory lacks are left out of the
/// asset set; the pass reports them per chunk.
pub fn load_stats(output: &Path, stats: &Path) -> Result<Compilation> {
    let content = fs::read_to_string(stats)
        .with_context(|| format!("failed to read {}", stats.display()))?;
    let parsed: Stats = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse {}", stats.display()))?;

    let mut assets = AssetSet::new();
    let mut chunks = Vec::with_capacity(parsed.chunks.len());

    for chunk in parsed.chunks {
        let name = chunk.name();
        for file in &chunk.files {
            if assets.contains(file) {
                continue;
            }
            match fs::read(output.join(file)) {
                Ok(bytes) => {
                    assets.insert(file, Asset::from_bytes(bytes));
                }
                Err(err) => debug!("stats"; "skipping {}: {}", file, err),
            }
        }

        let hash = match chunk.hash {
            Some(hash) => hash,
            None => chunk_hash(&assets, &chunk.files),
        };
        chunks.push(Chunk::new(name, chunk.files, hash));
    }

    Ok(Compilation::new(assets, chunks))
}

/// Content hash over a chunk's loaded files, for manifests without one.
fn chunk_hash(assets: &AssetSet, files: &[String]) -> String {
    let mut hasher = blake3::Hasher::new();
    for file in files {
        if let Some(asset) = assets.get(file) {
            hasher.update(file.as_bytes());
            hasher.update(asset.source());
        }
    }
    hex_digest(&hasher)
}
