//! `prerender render`: render one script and print its markup.

use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use crate::cache::RenderCache;
use crate::config::PrerenderConfig;
use crate::pipeline::RenderOptions;
use crate::render::{Evaluate, IsolatedEvaluator, RenderError};
use crate::utils::hash::combined_hash;

/// Render `file` through the configured evaluator and cache.
pub async fn render_file(config: &PrerenderConfig, file: &Path) -> Result<()> {
    let source =
        fs::read_to_string(file).with_context(|| format!("failed to read {}", file.display()))?;
    let asset = asset_name(config.get_root(), file);

    let options = RenderOptions::from_config(config)?;
    let evaluator = IsolatedEvaluator::from_config(config)?;
    let context = options.context();
    let hash = combined_hash(&[source.as_str(), options.fingerprint().as_str()]);

    let render = async {
        let markup = evaluator.evaluate(&asset, source, &context).await?;
        Ok::<_, RenderError>(options.finish(markup))
    };
    let markup = if options.cache {
        let cache = RenderCache::new(&config.cache.dir, config.cache.ttl());
        cache.get_or_compute(&asset, &hash, || render).await?
    } else {
        render.await?
    };

    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{markup}")?;
    Ok(())
}

/// `file` relative to the project root when inside it, `/`-separated.
fn asset_name(root: &Path, file: &Path) -> String {
    let rel = file.strip_prefix(root).unwrap_or(file);
    rel.to_string_lossy().replace('\\', "/")
}
