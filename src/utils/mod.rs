//! Shared helpers: timestamps, fingerprints, pluralization.

pub mod date;
pub mod hash;
mod plural;

pub use plural::{plural_count, plural_s};
