//! Prerender - render bundled component chunks to static HTML.
//!
//! A pass takes a [`Compilation`](asset::Compilation) (assets plus chunks),
//! renders each eligible chunk's entry script in an isolated worker process,
//! memoizes the markup in an on-disk [`RenderCache`](cache::RenderCache), and
//! swaps the markup into the asset set.

pub mod logger;

pub mod asset;
pub mod cache;
pub mod cli;
pub mod config;
pub mod embed;
pub mod pipeline;
pub mod render;
pub mod utils;
