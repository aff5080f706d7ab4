//! `prerender build`: render a bundler output directory in place.
//!
//! Phases:
//! - **Load** - chunks from the stats manifest, or a directory scan
//! - **Render** - one pass over every eligible chunk
//! - **Write** - added/changed files written, removed scripts deleted
//! - **Report** - unit failures fail the command after everything else is written

use std::path::Path;

use anyhow::{Result, bail};

use crate::asset::{Compilation, load_stats, scan_output, write_changes};
use crate::config::PrerenderConfig;
use crate::pipeline::Prerender;
use crate::utils::plural_count;
use crate::{debug, debug_do, log};

/// Run one render pass over `config.build.output`.
pub async fn build(config: &PrerenderConfig) -> Result<()> {
    let output = config.build.output.as_path();
    let mut compilation = load_compilation(output, &config.build.stats_path())?;
    let before = compilation.assets.clone();
    debug_do! {
        for chunk in &compilation.chunks {
            debug!("build"; "chunk `{}`: {}", chunk.name, chunk.files.join(", "));
        }
    }

    let prerender = Prerender::from_config(config)?;
    let report = prerender
        .additional_assets(&mut compilation, |report| {
            let mut summary = format!("{} rendered", plural_count(report.succeeded(), "chunk"));
            if report.cached > 0 {
                summary.push_str(&format!(" ({} cached)", report.cached));
            }
            log!("render"; "{}", summary);
        })
        .await;

    let written = write_changes(output, &before, &compilation.assets)?;
    debug!("build"; "{} written, {} removed", plural_count(written.written, "file"), written.removed);

    if compilation.has_errors() {
        bail!("{} failed to render", plural_count(report.failed, "chunk"));
    }
    Ok(())
}

/// Chunks from the stats manifest when present, else one chunk per script.
fn load_compilation(output: &Path, stats: &Path) -> Result<Compilation> {
    if stats.is_file() {
        debug!("build"; "loading {}", stats.display());
        load_stats(output, stats)
    } else {
        debug!("build"; "{} not found, scanning {}", stats.display(), output.display());
        scan_output(output)
    }
}
