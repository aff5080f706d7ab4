//! `[build]` section configuration.
//!
//! Where `prerender build` finds the bundler output.
//!
//! # Example
//!
//! ```toml
//! [build]
//! output = "dist"          # Bundler output directory
//! stats = "stats.json"     # Chunk manifest, relative to output
//! ```
//!
//! Without a manifest every `*.js` file under `output` becomes its own chunk.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Build input settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Bundler output directory.
    pub output: PathBuf,

    /// Chunk manifest path. Relative paths resolve against `output`.
    pub stats: PathBuf,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            output: PathBuf::from("dist"),
            stats: PathBuf::from("stats.json"),
        }
    }
}

impl BuildConfig {
    /// Absolute manifest path.
    pub fn stats_path(&self) -> PathBuf {
        self.output.join(&self.stats)
    }
}

#[cfg(test)]
mod tests {
    use crate::config::test_parse_config;
    use std::path::Path;

    #[test]
    fn test_build_config_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.build.output, Path::new("dist"));
        assert_eq!(config.build.stats_path(), Path::new("dist/stats.json"));
    }

    #[test]
    fn test_absolute_stats_path_wins() {
        let config = test_parse_config("[build]\noutput = \"out\"\nstats = \"/tmp/stats.json\"");
        assert_eq!(config.build.stats_path(), Path::new("/tmp/stats.json"));
    }
}
