//! Entry lifetime resolution.

use std::time::Duration;

/// Environment variable overriding the configured lifetime (milliseconds).
pub const TTL_ENV: &str = "CACHE_EXPIRE_TIME_IN_MILLISECONDS";

/// Two weeks.
pub const DEFAULT_TTL: Duration = Duration::from_millis(14 * 24 * 60 * 60 * 1000);

/// Pick the effective TTL: environment, then config, then [`DEFAULT_TTL`].
///
/// Absent, non-numeric and zero values fall through to the next source.
pub fn resolve_ttl(env: Option<&str>, configured_ms: u64) -> Duration {
    env.and_then(|raw| raw.trim().parse::<u64>().ok())
        .filter(|&ms| ms > 0)
        .or((configured_ms > 0).then_some(configured_ms))
        .map_or(DEFAULT_TTL, Duration::from_millis)
}
