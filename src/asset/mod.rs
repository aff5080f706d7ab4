//! Build output: assets, chunks, and the compilation that groups them.
//!
//! | Module  | Purpose                                         |
//! |---------|-------------------------------------------------|
//! | `set`   | Asset contents keyed by identifier              |
//! | `chunk` | Chunks, unit errors, the compilation            |
//! | `stats` | Load a compilation from a bundler manifest      |
//! | `scan`  | Load a compilation from a bare directory        |
//! | `write` | Write pass results back to disk                 |

mod chunk;
mod scan;
mod set;
mod stats;
mod write;

pub use chunk::{Chunk, Compilation, UnitError};
pub use scan::scan_output;
pub use set::{Asset, AssetDiff, AssetSet, normalize_name};
pub use stats::load_stats;
pub use write::{WriteStats, write_changes};
