//! Configuration management for `prerender.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── build      # [build]
//! │   ├── cache      # [cache]
//! │   ├── render     # [render]
//! │   └── worker     # [worker]
//! ├── types/         # Utility types
//! │   ├── error      # ConfigError, ConfigDiagnostics
//! │   └── field      # FieldPath
//! └── mod.rs         # PrerenderConfig (this file)
//! ```
//!
//! The file is optional: without one, every section uses its defaults and
//! the current directory is the project root.

pub mod section;
pub mod types;
mod util;

use util::find_config_file;

pub use section::{BuildConfig, CacheConfig, PostRenderRule, RenderConfig, WorkerConfig};
pub use types::{ConfigDiagnostic, ConfigDiagnostics, ConfigError, FieldPath};

use crate::{
    cli::{BuildArgs, Cli, Commands, RenderArgs},
    debug, log,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing prerender.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PrerenderConfig {
    /// Absolute path to the config file, empty when none was found
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root directory - parent of config file
    #[serde(skip)]
    pub root: PathBuf,

    /// Chunk selection and markup settings
    #[serde(default)]
    pub render: RenderConfig,

    /// Worker process settings
    #[serde(default)]
    pub worker: WorkerConfig,

    /// Content cache settings
    #[serde(default)]
    pub cache: CacheConfig,

    /// Bundler output settings
    #[serde(default)]
    pub build: BuildConfig,
}

impl PrerenderConfig {
    /// Load configuration for a CLI invocation.
    ///
    /// Searches upward from cwd for the config file. The project root is the
    /// config file's parent directory, or cwd when there is no config file.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;

        let mut config = match find_config_file(&cli.config) {
            Some(path) => {
                let mut config = Self::from_path(&path)?;
                config.root = path.parent().map(Path::to_path_buf).unwrap_or(cwd);
                config.config_path = path;
                config
            }
            None => {
                debug!("config"; "{} not found, using defaults", cli.config.display());
                Self {
                    root: cwd,
                    ..Self::default()
                }
            }
        };

        config.apply_command_options(cli);
        config.normalize_paths();
        config.validate()?;

        Ok(config)
    }

    /// Parse configuration from a TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    /// Print warning about unknown fields.
    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring:", display_path);
        for field in fields {
            eprintln!("- {field}");
        }
    }

    /// Get the root directory path
    pub fn get_root(&self) -> &Path {
        &self.root
    }

    // ========================================================================
    // cli configuration updates
    // ========================================================================

    /// Apply command-specific configuration options.
    fn apply_command_options(&mut self, cli: &Cli) {
        match &cli.command {
            Commands::Build { build_args } => self.apply_build_args(build_args),
            Commands::Render { args } => self.apply_render_args(args),
            Commands::Cache { .. } => {}
        }
    }

    /// Apply build arguments from CLI.
    fn apply_build_args(&mut self, args: &BuildArgs) {
        Self::update_option(&mut self.build.output, args.output.as_ref());
        Self::update_option(&mut self.build.stats, args.stats.as_ref());

        if !args.chunks.is_empty() {
            self.render.chunks = args.chunks.clone();
        }
        self.render
            .excluded_chunks
            .extend(args.excluded.iter().cloned());

        if args.keep_js {
            self.render.keep_js_file = true;
        }
        if args.no_cache {
            self.render.cache = false;
        }
    }

    /// Apply render arguments from CLI.
    fn apply_render_args(&mut self, args: &RenderArgs) {
        if args.no_cache {
            self.render.cache = false;
        }
    }

    /// Update config option if CLI value is provided.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    // ========================================================================
    // path normalization
    // ========================================================================

    /// Resolve relative paths against the project root.
    fn normalize_paths(&mut self) {
        self.build.output = self.root.join(&self.build.output);
        self.cache.dir = self.root.join(&self.cache.dir);
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Validate configuration.
    ///
    /// Collects all validation errors and returns them at once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut diag = ConfigDiagnostics::new();

        self.render.validate(&mut diag);
        self.worker.validate(&mut diag);

        diag.print_warnings();
        diag.into_result().map_err(ConfigError::Diagnostics)
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse config, panicking on unknown fields to catch typos in tests.
#[cfg(test)]
pub fn test_parse_config(content: &str) -> PrerenderConfig {
    let (parsed, ignored) = PrerenderConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

// ============================================================================
// tests
// ============================================================================
