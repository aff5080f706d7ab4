//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Render bundled component chunks to static HTML
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: prerender.toml)
    #[arg(short = 'C', long, global = true, default_value = "prerender.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Render the chunks of a bundler output directory in place
    #[command(visible_alias = "b")]
    Build {
        #[command(flatten)]
        build_args: BuildArgs,
    },

    /// Render a single script and print the markup
    #[command(visible_alias = "r")]
    Render {
        #[command(flatten)]
        args: RenderArgs,
    },

    /// Maintain the content cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

/// Build command arguments.
#[derive(clap::Args, Debug, Clone)]
pub struct BuildArgs {
    /// Bundler output directory (relative to project root)
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub output: Option<PathBuf>,

    /// Stats manifest, relative to the output directory
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub stats: Option<PathBuf>,

    /// Only render these chunks (repeatable, replaces `render.chunks`)
    #[arg(long = "chunk", value_name = "NAME")]
    pub chunks: Vec<String>,

    /// Never render these chunks (repeatable, adds to `render.excluded_chunks`)
    #[arg(long = "exclude", value_name = "NAME")]
    pub excluded: Vec<String>,

    /// Keep the original scripts next to the rendered markup
    #[arg(long)]
    pub keep_js: bool,

    /// Bypass the content cache
    #[arg(long)]
    pub no_cache: bool,

    /// Enable verbose output for debugging
    #[arg(short = 'V', long)]
    pub verbose: bool,
}

/// Render command arguments.
#[derive(clap::Args, Debug, Clone)]
pub struct RenderArgs {
    /// Script to render
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub file: PathBuf,

    /// Bypass the content cache
    #[arg(long)]
    pub no_cache: bool,

    /// Enable verbose output for debugging
    #[arg(short = 'V', long)]
    pub verbose: bool,
}

/// Cache maintenance actions
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheAction {
    /// Remove expired and unreadable entries
    Prune,
    /// Remove the whole cache directory
    Clear,
}

impl Cli {
    pub const fn verbose(&self) -> bool {
        match &self.command {
            Commands::Build { build_args } => build_args.verbose,
            Commands::Render { args } => args.verbose,
            Commands::Cache { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_args() {
        let cli = Cli::parse_from([
            "prerender", "build", "-V", "--chunk", "home", "--chunk", "about", "--exclude", "admin",
        ]);
        assert!(cli.verbose());
        let Commands::Build { build_args } = cli.command else {
            panic!("expected build");
        };
        assert_eq!(build_args.chunks, ["home", "about"]);
        assert_eq!(build_args.excluded, ["admin"]);
        assert!(build_args.output.is_none());
        assert!(!build_args.keep_js);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["prerender", "render", "dist/home.js", "-C", "site.toml", "--verbose"]);
        assert_eq!(cli.config, PathBuf::from("site.toml"));
        assert!(cli.verbose());
        assert!(matches!(cli.command, Commands::Render { .. }));
    }

    #[test]
    fn test_cache_actions() {
        let cli = Cli::parse_from(["prerender", "cache", "prune"]);
        assert!(matches!(cli.command, Commands::Cache { action: CacheAction::Prune }));
        let cli = Cli::parse_from(["prerender", "cache", "clear"]);
        assert!(matches!(cli.command, Commands::Cache { action: CacheAction::Clear }));
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
