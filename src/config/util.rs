//! Configuration utility functions.

use std::path::{Path, PathBuf};

/// Find config file by searching upward from `start`
///
/// Walks up parent directories until finding `config_name`.
/// Returns the absolute path to the config file if found
///
/// # Example
/// ```text
/// /home/user/site/src/scss/   ← start
/// /home/user/site/kiln.toml   ← found!
/// ```
pub fn find_config_file(config_name: &Path, start: &Path) -> Option<PathBuf> {
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

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_find_in_start_dir() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("kiln.toml"), "").unwrap();

        let found = find_config_file(Path::new("kiln.toml"), temp.path());
        assert_eq!(found, Some(temp.path().join("kiln.toml")));
    }

    #[test]
    fn test_find_in_ancestor() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("kiln.toml"), "").unwrap();
        let nested = temp.path().join("src/scss/partials");
        std::fs::create_dir_all(&nested).unwrap();

        let found = find_config_file(Path::new("kiln.toml"), &nested);
        assert_eq!(found, Some(temp.path().join("kiln.toml")));
    }

    #[test]
    fn test_directory_with_config_name_is_skipped() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("a");
        std::fs::create_dir_all(nested.join("kiln.toml")).unwrap();
        std::fs::write(temp.path().join("kiln.toml"), "").unwrap();

        let found = find_config_file(Path::new("kiln.toml"), &nested);
        assert_eq!(found, Some(temp.path().join("kiln.toml")));
    }

    #[test]
    fn test_absolute_missing() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope.toml");
        assert_eq!(find_config_file(&missing, temp.path()), None);
    }
}
