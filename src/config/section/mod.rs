//! Configuration section definitions.
//!
//! Each module corresponds to a section in `prerender.toml`:
//!
//! | Module   | TOML Section | Purpose                                 |
//! |----------|--------------|-----------------------------------------|
//! | `build`  | `[build]`    | Bundler output and chunk manifest       |
//! | `cache`  | `[cache]`    | Content cache directory and lifetime    |
//! | `render` | `[render]`   | Chunk selection, globals, post-render   |
//! | `worker` | `[worker]`   | Worker process command and limits       |

mod build;
mod cache;
mod render;
mod worker;

pub use build::BuildConfig;
pub use cache::CacheConfig;
pub use render::{PostRenderRule, RenderConfig};
pub use worker::WorkerConfig;
