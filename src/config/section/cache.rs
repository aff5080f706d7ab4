//! `[cache]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [cache]
//! dir = "node_modules/.cache/prerender"   # Relative to the project root
//! expire = 86400000                       # ms, 0 = two weeks
//! ```
//!
//! `CACHE_EXPIRE_TIME_IN_MILLISECONDS` in the environment overrides `expire`.

use crate::cache::{TTL_ENV, resolve_ttl};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Content cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Directory holding one JSON artifact per asset.
    pub dir: PathBuf,

    /// Entry lifetime in milliseconds (0 = default).
    pub expire: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("node_modules/.cache/prerender"),
            expire: 0,
        }
    }
}

impl CacheConfig {
    /// Effective entry lifetime, honoring the environment override.
    pub fn ttl(&self) -> Duration {
        resolve_ttl(std::env::var(TTL_ENV).ok().as_deref(), self.expire)
    }
}
