//! Command-line interface module.

mod args;
pub mod build;
pub mod cache;
pub mod render;

pub use args::{BuildArgs, CacheAction, Cli, Commands, RenderArgs};
