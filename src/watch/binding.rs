//! Which source changes trigger which steps.
//!
//! | category | glob                                 | steps  | action      |
//! |----------|--------------------------------------|--------|-------------|
//! | styles   | `<src.styles>/**/*.scss`             | style  | StyleInject |
//! | html     | `<src.html>/**/*.html`               | markup | FullReload  |
//! | images   | `<src.images>/**/*.{png,jpg,svg}`    | image  | FullReload  |
//!
//! Globs are matched against paths relative to the project root, with `/`
//! separators.

use std::fmt;
use std::path::{Component, Path};
use std::sync::Arc;

use anyhow::{Context, Result};
use globset::{GlobBuilder, GlobMatcher};

use super::types::{Category, ReloadAction};
use crate::config::KilnConfig;
use crate::step::{BuildStep, ImageStep, MarkupStep, StyleStep};

/// One row of the binding table.
pub struct WatchBinding {
    pub category: Category,
    pub glob: GlobMatcher,
    pub steps: Vec<Arc<dyn BuildStep>>,
    pub action: ReloadAction,
}

impl fmt::Debug for WatchBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchBinding")
            .field("category", &self.category)
            .field("glob", &self.glob.glob().glob())
            .field("action", &self.action)
            .finish_non_exhaustive()
    }
}

/// Binding table, built once from the config.
#[derive(Debug)]
pub struct BindingTable {
    bindings: Vec<Arc<WatchBinding>>,
}

impl BindingTable {
    pub fn from_config(config: &KilnConfig) -> Result<Self> {
        let layout = config.layout();
        let root = &config.root;

        let mut bindings = vec![
            WatchBinding {
                category: Category::Styles,
                glob: compile_glob(root, &layout.source_styles, "*.scss")?,
                steps: vec![Arc::new(StyleStep::new(&layout, &config.styles))],
                action: ReloadAction::StyleInject,
            },
            WatchBinding {
                category: Category::Html,
                glob: compile_glob(root, &layout.source_html, "*.html")?,
                steps: vec![Arc::new(MarkupStep::new(&layout))],
                action: ReloadAction::FullReload,
            },
        ];

        if let (Some(source), Some(step)) = (
            layout.source_images.as_deref(),
            ImageStep::new(&layout, &config.images),
        ) {
            bindings.push(WatchBinding {
                category: Category::Images,
                glob: compile_glob(root, source, "*.{png,jpg,svg}")?,
                steps: vec![Arc::new(step)],
                action: ReloadAction::FullReload,
            });
        }

        Ok(Self {
            bindings: bindings.into_iter().map(Arc::new).collect(),
        })
    }

    pub fn bindings(&self) -> &[Arc<WatchBinding>] {
        &self.bindings
    }

    /// First binding whose glob matches `rel_path`.
    pub fn find(&self, rel_path: &str) -> Option<&Arc<WatchBinding>> {
        self.bindings.iter().find(|b| b.glob.is_match(rel_path))
    }
}

/// `<dir relative to root>/**/<file_glob>`
fn compile_glob(root: &Path, dir: &Path, file_glob: &str) -> Result<GlobMatcher> {
    let rel = dir.strip_prefix(root).unwrap_or(dir);
    let prefix = to_slash(rel);
    let pattern = if prefix.is_empty() {
        format!("**/{file_glob}")
    } else {
        format!("{}/**/{file_glob}", globset::escape(&prefix))
    };

    let glob = GlobBuilder::new(&pattern)
        .literal_separator(true)
        .build()
        .with_context(|| format!("invalid watch pattern `{pattern}`"))?;
    Ok(glob.compile_matcher())
}

/// Path as a `/`-separated string of its normal components.
pub fn to_slash(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(s) => s.to_str(),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    fn table(extra: &str) -> BindingTable {
        let mut config = test_parse_config(extra);
        config.root = "/project".into();
        BindingTable::from_config(&config).unwrap()
    }

    fn category(table: &BindingTable, rel: &str) -> Option<Category> {
        table.find(rel).map(|b| b.category)
    }

    #[test]
    fn test_default_table() {
        let table = table("");
        let rows: Vec<_> = table
            .bindings()
            .iter()
            .map(|b| (b.category, b.action, b.steps.len()))
            .collect();
        assert_eq!(
            rows,
            [
                (Category::Styles, ReloadAction::StyleInject, 1),
                (Category::Html, ReloadAction::FullReload, 1),
                (Category::Images, ReloadAction::FullReload, 1),
            ]
        );
        assert_eq!(table.bindings()[0].steps[0].name(), "style");
    }

    #[test]
    fn test_matching() {
        let table = table("");
        assert_eq!(category(&table, "src/scss/main.scss"), Some(Category::Styles));
        assert_eq!(category(&table, "src/scss/partials/_a.scss"), Some(Category::Styles));
        assert_eq!(category(&table, "src/html/index.html"), Some(Category::Html));
        assert_eq!(category(&table, "src/html/blog/post.html"), Some(Category::Html));
        assert_eq!(category(&table, "src/images/a/b.svg"), Some(Category::Images));
        assert_eq!(category(&table, "src/images/photo.jpg"), Some(Category::Images));

        assert_eq!(category(&table, "src/images/photo.jpeg"), None);
        assert_eq!(category(&table, "src/scss/main.css"), None);
        assert_eq!(category(&table, "src/html/main.scss"), None);
        assert_eq!(category(&table, "dist/index.html"), None);
        assert_eq!(category(&table, "other/src/html/index.html"), None);
    }

    #[test]
    fn test_images_disabled() {
        let table = table("[images]\nenable = false");
        assert_eq!(table.bindings().len(), 2);
        assert_eq!(category(&table, "src/images/a.png"), None);
    }

    #[test]
    fn test_custom_paths() {
        let table = table("[paths.src]\nstyles = \"assets/sass [v2]\"");
        assert_eq!(
            category(&table, "assets/sass [v2]/main.scss"),
            Some(Category::Styles)
        );
    }

    #[test]
    fn test_to_slash() {
        assert_eq!(to_slash(Path::new("src/scss/main.scss")), "src/scss/main.scss");
        assert_eq!(to_slash(Path::new("./a/b")), "a/b");
    }
}
