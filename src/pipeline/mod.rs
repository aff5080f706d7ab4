//! Chunk render orchestration.
//!
//! ```text
//! Compilation ─► Selection ─► per-unit task ─► RenderCache ─► Evaluate
//!      ▲                                                          │
//!      └──────────── markup swapped in, chunk order ◄─────────────┘
//! ```
//!
//! - [`Selection`]: which chunks are eligible
//! - [`RenderOptions`]: library options, from code or `[render]` config
//! - [`Prerender`]: runs a pass and reports a [`PassReport`]

mod options;
mod pass;
mod select;

pub use options::RenderOptions;
pub use pass::{PassReport, PassState, Prerender, html_name};
pub use select::{RUNTIME_CHUNK, Selection};
