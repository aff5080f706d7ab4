//! Writing pass results back to the output directory.

use std::fs;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result, bail};

use super::AssetSet;
use crate::debug;

/// Files touched by [`write_changes`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WriteStats {
    pub written: usize,
    pub removed: usize,
}

/// Make `output` match `after`, given it held `before`.
///
/// Only added or changed assets are written; assets missing from `after`
/// are deleted.
pub fn write_changes(output: &Path, before: &AssetSet, after: &AssetSet) -> Result<WriteStats> {
    let diff = after.diff_from(before);
    let mut stats = WriteStats::default();

    for (name, asset) in diff.written {
        let path = output_path(output, name)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        fs::write(&path, asset.source())
            .with_context(|| format!("failed to write {}", path.display()))?;
        debug!("write"; "{}", name);
        stats.written += 1;
    }

    for name in &diff.removed {
        let path = output_path(output, name)?;
        match fs::remove_file(&path) {
            Ok(()) => stats.removed += 1,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => {
                return Err(err).with_context(|| format!("failed to remove {}", path.display()));
            }
        }
    }

    Ok(stats)
}

/// Resolve an asset identifier under `output`, refusing to leave it.
fn output_path(output: &Path, name: &str) -> Result<PathBuf> {
    let rel = Path::new(name);
    if rel
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
    {
        bail!("asset `{name}` escapes the output directory");
    }
    Ok(output.join(rel))
}
