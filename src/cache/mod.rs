//! Persistent content cache for rendered markup.
//!
//! One JSON artifact per key under the cache directory:
//!
//! ```json
//! { "createdAt": "2024-06-15T14:30:45.123Z", "hash": "9f2c…", "data": "<div>…</div>" }
//! ```
//!
//! An artifact is reused only while it is younger than the TTL *and* was
//! produced from the same content hash. Nothing is evicted automatically;
//! `prune` and `clear` are explicit.

mod entry;
mod store;
mod ttl;

pub use entry::{CacheEntry, cache_file_name};
pub use store::{PruneStats, RenderCache};
pub use ttl::{DEFAULT_TTL, TTL_ENV, resolve_ttl};
