//! `prerender cache`: manual cache maintenance.

use anyhow::{Context, Result};

use crate::cache::RenderCache;
use crate::cli::CacheAction;
use crate::config::PrerenderConfig;
use crate::log;
use crate::utils::plural_count;

pub async fn run(config: &PrerenderConfig, action: CacheAction) -> Result<()> {
    let cache = RenderCache::new(&config.cache.dir, config.cache.ttl());
    let dir = cache.dir().display().to_string();

    match action {
        CacheAction::Prune => {
            let stats = cache
                .prune()
                .await
                .with_context(|| format!("failed to prune {dir}"))?;
            log!(
                "cache";
                "removed {}, kept {}",
                plural_count(stats.removed, "artifact"),
                stats.kept
            );
        }
        CacheAction::Clear => {
            if cache
                .clear()
                .await
                .with_context(|| format!("failed to clear {dir}"))?
            {
                log!("cache"; "cleared {}", dir);
            } else {
                log!("cache"; "nothing to clear at {}", dir);
            }
        }
    }
    Ok(())
}
