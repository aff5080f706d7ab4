//! Cache artifact format.

use crate::utils::date::DateTimeUtc;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A persisted cache artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry<T> {
    #[serde(alias = "createdDate")]
    pub created_at: DateTimeUtc,
    pub hash: String,
    pub data: T,
}

impl<T> CacheEntry<T> {
    /// New entry stamped with the current time.
    pub fn new(hash: impl Into<String>, data: T) -> Self {
        Self {
            created_at: DateTimeUtc::now(),
            hash: hash.into(),
            data,
        }
    }

    /// Whether the entry is older than `ttl` at `now`.
    pub fn is_expired(&self, ttl: Duration, now: DateTimeUtc) -> bool {
        let age = self.created_at.millis_until(now);
        i128::from(age) > ttl.as_millis() as i128
    }

    /// Usable for `hash` at `now`: fresh and produced from the same content.
    pub fn is_valid(&self, hash: &str, ttl: Duration, now: DateTimeUtc) -> bool {
        !self.is_expired(ttl, now) && self.hash == hash
    }
}

/// File name of the artifact for `key`.
///
/// Path separators are flattened so every key maps to a single file
/// directly inside the cache directory.
pub fn cache_file_name(key: &str) -> String {
    let mut name = key.replace(['/', '\\'], "_");
    name.push_str(".json");
    name
}
