//! URL to filesystem path resolution.

use std::path::{Path, PathBuf};

/// Resolve URL to filesystem path, handling index.html for directories
pub fn resolve_path(url: &str, serve_root: &Path) -> Option<PathBuf> {
    let clean = normalize_url(url);

    // Reject paths with suspicious patterns early
    if clean.split('/').any(|segment| segment == "..") {
        return None;
    }

    let local = serve_root.join(&clean);

    // Canonicalize to resolve symlinks and verify path is under serve_root
    let canonical = local.canonicalize().ok()?;
    let root_canonical = serve_root.canonicalize().ok()?;

    if !canonical.starts_with(&root_canonical) {
        return None;
    }

    if canonical.is_file() {
        return Some(canonical);
    }

    if canonical.is_dir() {
        let index = canonical.join("index.html");
        if index.is_file() {
            return Some(index);
        }
    }

    None
}

/// Normalize URL: strip query string and fragment, decode, trim slashes
pub fn normalize_url(url: &str) -> String {
    use percent_encoding::percent_decode_str;

    let path = url.split(['?', '#']).next().unwrap_or(url);
    let decoded = percent_decode_str(path)
        .decode_utf8()
        .map(std::borrow::Cow::into_owned)
        .unwrap_or_default();

    decoded.trim_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn site() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("css")).unwrap();
        fs::create_dir_all(dir.path().join("docs")).unwrap();
        fs::write(dir.path().join("index.html"), "<p>home</p>").unwrap();
        fs::write(dir.path().join("css/main.css"), "a{}").unwrap();
        fs::write(dir.path().join("docs/index.html"), "<p>docs</p>").unwrap();
        fs::write(dir.path().join("my page.html"), "").unwrap();
        dir
    }

    #[test]
    fn test_resolves_files_and_indexes() {
        let dir = site();
        let root = dir.path().canonicalize().unwrap();

        assert_eq!(resolve_path("/", dir.path()), Some(root.join("index.html")));
        assert_eq!(resolve_path("/docs/", dir.path()), Some(root.join("docs/index.html")));
        assert_eq!(
            resolve_path("/css/main.css?v=3", dir.path()),
            Some(root.join("css/main.css"))
        );
        assert_eq!(
            resolve_path("/my%20page.html", dir.path()),
            Some(root.join("my page.html"))
        );
    }

    #[test]
    fn test_missing_is_none() {
        let dir = site();
        assert_eq!(resolve_path("/nope.html", dir.path()), None);
        assert_eq!(resolve_path("/css/", dir.path()), None);
    }

    #[test]
    fn test_traversal_rejected() {
        let outer = TempDir::new().unwrap();
        let root = outer.path().join("dist");
        fs::create_dir_all(&root).unwrap();
        fs::write(outer.path().join("secret.txt"), "x").unwrap();

        assert_eq!(resolve_path("/../secret.txt", &root), None);
        assert_eq!(resolve_path("/%2e%2e/secret.txt", &root), None);
        assert_eq!(resolve_path("/css/..%2f..%2fsecret.txt", &root), None);
    }

    #[test]
    fn test_normalize_url() {
        assert_eq!(normalize_url("/a/b/?x=1#top"), "a/b");
        assert_eq!(normalize_url("/"), "");
    }
}
