//! On-disk cache store with per-key de-duplication.

use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::fs;
use tokio::sync::Mutex;

use super::{CacheEntry, cache_file_name};
use crate::utils::date::DateTimeUtc;
use crate::{debug, log};

/// Result of [`RenderCache::prune`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PruneStats {
    pub removed: usize,
    pub kept: usize,
}

/// Key → artifact store backed by one JSON file per key.
///
/// I/O and parse failures are logged and behave as misses; they never
/// reach the caller.
pub struct RenderCache {
    dir: PathBuf,
    ttl: Duration,
    /// Keys currently being computed → lock held for the computation
    in_flight: DashMap<String, Arc<Mutex<()>>>,
}

impl RenderCache {
    pub fn new(dir: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            dir: dir.into(),
            ttl,
            in_flight: DashMap::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Artifact path for `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(cache_file_name(key))
    }

    /// Read the artifact for `key`, valid or not.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<CacheEntry<T>> {
        let path = self.path_for(key);
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return None,
            Err(err) => {
                log!("cache"; "failed to read {}: {}", path.display(), err);
                return None;
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(entry) => Some(entry),
            Err(err) => {
                log!("cache"; "ignoring unreadable {}: {}", path.display(), err);
                None
            }
        }
    }

    /// Persist `entry` under `key`, replacing any previous artifact.
    pub async fn put<T: Serialize>(&self, key: &str, entry: &CacheEntry<T>) {
        if let Err(err) = self.write(key, entry).await {
            log!("cache"; "failed to write {}: {}", self.path_for(key).display(), err);
        }
    }

    async fn write<T: Serialize>(&self, key: &str, entry: &CacheEntry<T>) -> io::Result<()> {
        let json = serde_json::to_vec_pretty(entry)?;
        fs::create_dir_all(&self.dir).await?;

        // Write-then-rename so readers never observe a partial artifact.
        let path = self.path_for(key);
        let tmp = path.with_extension(format!("json.{}.tmp", std::process::id()));
        fs::write(&tmp, json).await?;
        fs::rename(&tmp, &path).await
    }

    /// Payload for `key` if the artifact is valid for `hash`.
    async fn lookup<T: DeserializeOwned>(&self, key: &str, hash: &str) -> Option<T> {
        let entry = self.get::<T>(key).await?;
        if entry.is_valid(hash, self.ttl, DateTimeUtc::now()) {
            debug!("cache"; "hit {}", key);
            Some(entry.data)
        } else {
            debug!("cache"; "stale {}", key);
            None
        }
    }

    /// Return the cached payload for (`key`, `hash`) or compute and store it.
    ///
    /// Concurrent calls for the same key run `compute` once: later callers
    /// wait for the first and then read its artifact. Errors from `compute`
    /// are returned as-is and nothing is stored for them.
    pub async fn get_or_compute<T, E, F, Fut>(&self, key: &str, hash: &str, compute: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(hit) = self.lookup(key, hash).await {
            return Ok(hit);
        }

        let in_flight = InFlight {
            cache: self,
            key,
            lock: self.in_flight.entry(key.to_owned()).or_default().clone(),
        };
        let _guard = in_flight.lock.lock().await;

        if let Some(hit) = self.lookup(key, hash).await {
            return Ok(hit);
        }

        debug!("cache"; "miss {}", key);
        let result = compute().await;
        if let Ok(value) = &result {
            self.put(key, &CacheEntry::new(hash, value)).await;
        }
        result
    }

    /// Forget the in-flight lock for `key` once nobody else holds it.
    fn release(&self, key: &str, lock: &Arc<Mutex<()>>) {
        // One reference in the map, one held by the caller.
        self.in_flight
            .remove_if(key, |_, held| Arc::ptr_eq(held, lock) && Arc::strong_count(held) <= 2);
    }

    // ========================================================================
    // maintenance
    // ========================================================================

    /// Delete expired and unreadable artifacts.
    ///
    /// Files that are not `.json` artifacts (such as worker scripts) are left
    /// alone.
    pub async fn prune(&self) -> io::Result<PruneStats> {
        let mut stats = PruneStats::default();
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(stats),
            Err(err) => return Err(err),
        };

        let now = DateTimeUtc::now();
        while let Some(item) = entries.next_entry().await? {
            let path = item.path();
            if path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }

            let stale = match fs::read(&path).await {
                Ok(bytes) => serde_json::from_slice::<CacheEntry<serde_json::Value>>(&bytes)
                    .map_or(true, |entry| entry.is_expired(self.ttl, now)),
                Err(_) => true,
            };

            if stale {
                debug!("cache"; "prune {}", path.display());
                fs::remove_file(&path).await?;
                stats.removed += 1;
            } else {
                stats.kept += 1;
            }
        }

        Ok(stats)
    }

    /// Remove the whole cache directory. Returns whether it existed.
    pub async fn clear(&self) -> io::Result<bool> {
        match fs::remove_dir_all(&self.dir).await {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err),
        }
    }
}

/// A caller's hold on a key's in-flight lock.
///
/// Dropping it releases the key, including when `compute` panics or the
/// caller's future is cancelled.
struct InFlight<'a> {
    cache: &'a RenderCache,
    key: &'a str,
    lock: Arc<Mutex<()>>,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.cache.release(self.key, &self.lock);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    const HOUR: Duration = Duration::from_secs(3600);

    fn cache(dir: &TempDir) -> RenderCache {
        RenderCache::new(dir.path().join("cache"), HOUR)
    }

    async fn render(calls: &AtomicUsize, markup: &str) -> Result<String, String> {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(markup.to_owned())
    }

    #[tokio::test]
    async fn test_get_missing_is_none() {
        let dir = TempDir::new().unwrap();
        assert!(cache(&dir).get::<String>("main.js").await.is_none());
    }

    #[tokio::test]
    async fn test_miss_computes_then_hit_skips() {
        let dir = TempDir::new().unwrap();
        let cache = cache(&dir);
        let calls = AtomicUsize::new(0);

        let first = cache
            .get_or_compute("pages/home.js", "h1", || render(&calls, "<main/>"))
            .await;
        let second = cache
            .get_or_compute("pages/home.js", "h1", || render(&calls, "<other/>"))
            .await;

        assert_eq!(first.unwrap(), "<main/>");
        assert_eq!(second.unwrap(), "<main/>");
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let raw = std::fs::read_to_string(dir.path().join("cache/pages_home.js.json")).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["hash"], "h1");
        assert_eq!(json["data"], "<main/>");
        assert!(json["createdAt"].as_str().unwrap().ends_with('Z'));
    }

    #[tokio::test]
    async fn test_hash_change_recomputes() {
        let dir = TempDir::new().unwrap();
        let cache = cache(&dir);
        let calls = AtomicUsize::new(0);

        cache.get_or_compute("a.js", "old", || render(&calls, "v1")).await.unwrap();
        let out = cache.get_or_compute("a.js", "new", || render(&calls, "v2")).await;

        assert_eq!(out.unwrap(), "v2");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.get::<String>("a.js").await.unwrap().hash, "new");
    }

    #[tokio::test]
    async fn test_expired_entry_recomputes() {
        let dir = TempDir::new().unwrap();
        let cache = cache(&dir);
        let calls = AtomicUsize::new(0);

        let old = CacheEntry {
            created_at: DateTimeUtc::from_unix_millis(0),
            hash: "h".to_owned(),
            data: "ancient".to_owned(),
        };
        cache.put("a.js", &old).await;

        let out = cache.get_or_compute("a.js", "h", || render(&calls, "fresh")).await;
        assert_eq!(out.unwrap(), "fresh");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_error_is_not_stored() {
        let dir = TempDir::new().unwrap();
        let cache = cache(&dir);

        let out: Result<String, &str> = cache
            .get_or_compute("a.js", "h", || async { Err("boom") })
            .await;

        assert_eq!(out.unwrap_err(), "boom");
        assert!(!cache.path_for("a.js").exists());
    }

    #[tokio::test]
    async fn test_corrupt_artifact_is_a_miss() {
        let dir = TempDir::new().unwrap();
        let cache = cache(&dir);
        let calls = AtomicUsize::new(0);

        std::fs::create_dir_all(cache.dir()).unwrap();
        std::fs::write(cache.path_for("a.js"), "{ not json").unwrap();

        assert!(cache.get::<String>("a.js").await.is_none());
        let out = cache.get_or_compute("a.js", "h", || render(&calls, "ok")).await;
        assert_eq!(out.unwrap(), "ok");
        assert_eq!(cache.get::<String>("a.js").await.unwrap().data, "ok");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_same_key_computes_once() {
        let dir = TempDir::new().unwrap();
        let cache = Arc::new(cache(&dir));
        let calls = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let calls = Arc::clone(&calls);
                tokio::spawn(async move {
                    cache
                        .get_or_compute("main.js", "h", || async {
                            calls.fetch_add(1, Ordering::SeqCst);
                            tokio::time::sleep(Duration::from_millis(50)).await;
                            Ok::<_, String>("<div/>".to_owned())
                        })
                        .await
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), "<div/>");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(cache.in_flight.is_empty());
    }

    async fn crash() -> Result<String, String> {
        panic!("render crashed")
    }

    #[tokio::test]
    async fn test_panicking_compute_releases_key() {
        let dir = TempDir::new().unwrap();
        let cache = Arc::new(cache(&dir));

        let task = {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move { cache.get_or_compute("a.js", "h", crash).await })
        };
        assert!(task.await.unwrap_err().is_panic());
        assert!(cache.in_flight.is_empty());

        let calls = AtomicUsize::new(0);
        let out = cache.get_or_compute("a.js", "h", || render(&calls, "ok")).await;
        assert_eq!(out.unwrap(), "ok");
        assert!(cache.in_flight.is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_caller_releases_key() {
        let dir = TempDir::new().unwrap();
        let cache = cache(&dir);

        let slow = cache.get_or_compute("a.js", "h", || async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok::<_, String>("never".to_owned())
        });
        let timed_out = tokio::time::timeout(Duration::from_millis(20), slow).await;
        assert!(timed_out.is_err());
        assert!(cache.in_flight.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_distinct_keys_do_not_block() {
        let dir = TempDir::new().unwrap();
        let cache = Arc::new(cache(&dir));
        let calls = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = ["a.js", "b.js", "c.js"]
            .into_iter()
            .map(|key| {
                let cache = Arc::clone(&cache);
                let calls = Arc::clone(&calls);
                tokio::spawn(async move {
                    cache
                        .get_or_compute(key, "h", || async {
                            calls.fetch_add(1, Ordering::SeqCst);
                            Ok::<_, String>(key.to_owned())
                        })
                        .await
                })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_prune_removes_expired_and_corrupt() {
        let dir = TempDir::new().unwrap();
        let cache = cache(&dir);

        cache.put("fresh.js", &CacheEntry::new("h", "ok")).await;
        let expired = CacheEntry {
            created_at: DateTimeUtc::from_unix_millis(0),
            hash: "h".to_owned(),
            data: "old",
        };
        cache.put("expired.js", &expired).await;
        std::fs::write(cache.path_for("broken.js"), "nope").unwrap();
        std::fs::write(cache.dir().join("worker-0000.js"), "// worker").unwrap();

        let stats = cache.prune().await.unwrap();
        assert_eq!(stats, PruneStats { removed: 2, kept: 1 });
        assert!(cache.path_for("fresh.js").exists());
        assert!(!cache.path_for("expired.js").exists());
        assert!(cache.dir().join("worker-0000.js").exists());
    }

    #[tokio::test]
    async fn test_prune_and_clear_missing_dir() {
        let dir = TempDir::new().unwrap();
        let cache = cache(&dir);

        assert_eq!(cache.prune().await.unwrap(), PruneStats::default());
        assert!(!cache.clear().await.unwrap());

        cache.put("a.js", &CacheEntry::new("h", 1u32)).await;
        assert!(cache.clear().await.unwrap());
        assert!(!cache.dir().exists());
    }
}
