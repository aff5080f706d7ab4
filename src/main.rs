//! Prerender - render bundled component chunks to static HTML.

use anyhow::Result;
use clap::{ColorChoice, Parser};
use prerender::cli::{self, Cli, Commands};
use prerender::config::PrerenderConfig;
use prerender::logger;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose());

    let config = PrerenderConfig::load(&cli)?;

    match &cli.command {
        Commands::Build { .. } => cli::build::build(&config).await,
        Commands::Render { args } => cli::render::render_file(&config, &args.file).await,
        Commands::Cache { action } => cli::cache::run(&config, *action).await,
    }
}
