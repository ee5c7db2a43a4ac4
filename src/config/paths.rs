//! `[paths]` section configuration.
//!
//! Maps each asset category to its source and destination directory.
//!
//! # Example
//!
//! ```toml
//! [paths.src]
//! html = "src/html"
//! styles = "src/scss"
//! images = "src/images"
//!
//! [paths.dist]
//! root = "dist"
//! css = "dist/css"
//! images = "dist/assets/images"
//! ```
//!
//! All paths are relative to the project root (the directory holding
//! `kiln.toml`). Destination directories must live inside `paths.dist.root`
//! so that cleaning and serving cover them.

use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::ConfigDiagnostics;
use crate::utils::path::normalize_path;

/// Raw `[paths]` table as written in the config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub src: SourcePaths,
    pub dist: DestPaths,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcePaths {
    /// Markup sources, copied verbatim.
    pub html: PathBuf,
    /// Sass sources; top-level files are entry points.
    pub styles: PathBuf,
    /// Image sources.
    pub images: PathBuf,
}

impl Default for SourcePaths {
    fn default() -> Self {
        Self {
            html: "src/html".into(),
            styles: "src/scss".into(),
            images: "src/images".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DestPaths {
    /// Output root: cleaned before every build and served by the dev server.
    pub root: PathBuf,
    /// Compiled stylesheets and source maps.
    pub css: PathBuf,
    /// Optimized images.
    pub images: PathBuf,
}

impl Default for DestPaths {
    fn default() -> Self {
        Self {
            root: "dist".into(),
            css: "dist/css".into(),
            images: "dist/assets/images".into(),
        }
    }
}

/// Resolved, absolute directory layout of a project.
///
/// Built once from [`PathsConfig`] at load time and never mutated. The image
/// pair is `None` when image optimization is disabled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathConfig {
    pub source_html: PathBuf,
    pub source_styles: PathBuf,
    pub source_images: Option<PathBuf>,
    pub dest_root: PathBuf,
    pub dest_css: PathBuf,
    pub dest_images: Option<PathBuf>,
}

impl PathsConfig {
    /// Check raw paths before they are joined with the root.
    pub fn validate(&self, images: bool, diag: &mut ConfigDiagnostics) {
        let relative = [
            ("paths.src.html", &self.src.html),
            ("paths.src.styles", &self.src.styles),
            ("paths.src.images", &self.src.images),
            ("paths.dist.root", &self.dist.root),
            ("paths.dist.css", &self.dist.css),
            ("paths.dist.images", &self.dist.images),
        ];
        for (field, path) in relative {
            if path.as_os_str().is_empty() {
                diag.error(field, "must not be empty");
            } else if path.is_absolute() || escapes_root(path) {
                diag.error_with_hint(
                    field,
                    format!("`{}` is not inside the project root", path.display()),
                    "use a path relative to the directory containing kiln.toml",
                );
            }
        }

        if !is_within(&self.dist.css, &self.dist.root) {
            diag.error("paths.dist.css", "must be inside paths.dist.root");
        }
        if images && !is_within(&self.dist.images, &self.dist.root) {
            diag.error("paths.dist.images", "must be inside paths.dist.root");
        }

        let mut sources = vec![
            ("paths.src.html", &self.src.html),
            ("paths.src.styles", &self.src.styles),
        ];
        if images {
            sources.push(("paths.src.images", &self.src.images));
        }
        for (field, source) in sources {
            if is_within(source, &self.dist.root) || is_within(&self.dist.root, source) {
                diag.error_with_hint(
                    field,
                    "source and output directories overlap",
                    "cleaning the output would delete sources",
                );
            }
        }
    }

    /// Join every path with `root`.
    pub fn resolve(&self, root: &Path, images: bool) -> PathConfig {
        let join = |p: &Path| normalize_path(&root.join(p));
        PathConfig {
            source_html: join(&self.src.html),
            source_styles: join(&self.src.styles),
            source_images: images.then(|| join(&self.src.images)),
            dest_root: join(&self.dist.root),
            dest_css: join(&self.dist.css),
            dest_images: images.then(|| join(&self.dist.images)),
        }
    }
}

impl PathConfig {
    /// Source directories that must exist before a build.
    pub fn sources(&self) -> impl Iterator<Item = (&'static str, &Path)> {
        [
            Some(("html", self.source_html.as_path())),
            Some(("styles", self.source_styles.as_path())),
            self.source_images.as_deref().map(|p| ("images", p)),
        ]
        .into_iter()
        .flatten()
    }

    /// URL path of an output file relative to the destination root
    /// (e.g. `css/main.css`).
    pub fn href_for(&self, output: &Path) -> Option<String> {
        let rel = output.strip_prefix(&self.dest_root).ok()?;
        let parts: Vec<_> = rel
            .components()
            .filter_map(|c| match c {
                Component::Normal(s) => s.to_str(),
                _ => None,
            })
            .collect();
        (!parts.is_empty()).then(|| parts.join("/"))
    }
}

/// Lexical containment on relative paths (`dist/css` is within `dist`).
fn is_within(path: &Path, parent: &Path) -> bool {
    let path: Vec<_> = normal_components(path);
    let parent: Vec<_> = normal_components(parent);
    path.len() >= parent.len() && path[..parent.len()] == parent[..]
}

fn normal_components(path: &Path) -> Vec<&std::ffi::OsStr> {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s),
            _ => None,
        })
        .collect()
}

fn escapes_root(path: &Path) -> bool {
    path.components().any(|c| matches!(c, Component::ParentDir))
}
