//! Configuration utility functions.

use std::path::{Path, PathBuf};

/// Find config file by searching upward from current directory
///
/// Returns the absolute path to the config file if found
///
/// # Example
/// ```text
/// /home/user/app/dist/assets/   ← cwd
/// /home/user/app/prerender.toml ← found!
/// ```
pub fn find_config_file(config_name: &Path) -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    find_config_from(&cwd, config_name)
}

/// Walk up from `start` looking for `config_name`.
fn find_config_from(start: &Path, config_name: &Path) -> Option<PathBuf> {
    if config_name.is_absolute() {
        return config_name.exists().then(|| config_name.to_path_buf());
    }

    let mut current = start;
    loop {
        let candidate = current.join(config_name);
        if candidate.is_file() {
            return Some(candidate);
        }

        match current.parent() {
            Some(parent) => current = parent,
            None => return None,
        }
    }
}

// ============================================================================
// tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_find_config_walks_upward() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("dist/assets");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join("prerender.toml"), "").unwrap();

        let found = find_config_from(&nested, Path::new("prerender.toml")).unwrap();
        assert_eq!(found, dir.path().join("prerender.toml"));
    }

    #[test]
    fn test_find_config_ignores_directories() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("prerender.toml")).unwrap();
        let found = find_config_from(dir.path(), Path::new("prerender.toml"));
        assert_ne!(found, Some(dir.path().join("prerender.toml")));
    }

    #[test]
    fn test_find_config_absolute_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.toml");
        assert_eq!(find_config_from(dir.path(), &path), None);

        fs::write(&path, "").unwrap();
        assert_eq!(find_config_from(Path::new("/"), &path), Some(path));
    }
}
