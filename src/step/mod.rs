//! Build steps.
//!
//! Each step reads one source category and writes into the destination tree.
//! Steps hold only their resolved paths and options, so a step value can be
//! run any number of times (initial build, then once per watch trigger).
//!
//! ```text
//! clean   dest_root            → (removed)
//! style   source_styles/*.scss → dest_css/*.css + *.css.map
//! markup  source_html/*.html   → dest_root/*.html
//! image   source_images/**     → dest_images/**
//! ```

mod clean;
mod error;
mod images;
mod markup;
mod style;

pub use clean::CleanStep;
pub use error::{AssetError, BuildError, StyleError};
pub use images::ImageStep;
pub use markup::MarkupStep;
pub use style::StyleStep;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use jwalk::{Parallelism, WalkDir};

/// A unit of build work.
pub trait BuildStep: Send + Sync {
    /// Short name used in log prefixes.
    fn name(&self) -> &'static str;

    fn run(&self) -> Result<StepReport, BuildError>;
}

/// What one step run produced.
#[derive(Debug, Default)]
pub struct StepReport {
    /// Files written (or overwritten) in the destination tree.
    pub written: Vec<PathBuf>,
    /// Paths deleted by a clean.
    pub removed: Vec<PathBuf>,
    /// Stylesheets compiled in this run, for CSS injection.
    pub styles: Vec<CompiledStyle>,
    /// Inputs skipped because of a recoverable error.
    pub failures: usize,
}

impl StepReport {
    pub fn merge(&mut self, other: StepReport) {
        self.written.extend(other.written);
        self.removed.extend(other.removed);
        self.styles.extend(other.styles);
        self.failures += other.failures;
    }
}

/// A freshly written stylesheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledStyle {
    /// URL path relative to the served root, e.g. `css/main.css`.
    pub href: String,
    /// Full stylesheet text as written.
    pub content: String,
}

/// Fail with `MissingSource` unless `dir` is an existing directory.
pub fn ensure_source(category: &'static str, dir: &Path) -> Result<(), BuildError> {
    if dir.is_dir() {
        Ok(())
    } else {
        Err(BuildError::MissingSource {
            category,
            path: dir.to_path_buf(),
        })
    }
}

/// Files directly inside `dir` with extension `ext`, sorted.
///
/// `MissingSource` when the directory is gone.
pub(crate) fn collect_top_level(
    category: &'static str,
    dir: &Path,
    ext: &str,
) -> Result<Vec<PathBuf>, BuildError> {
    ensure_source(category, dir)?;
    let walk_err = |source| BuildError::Walk {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(walk_err)? {
        let entry = entry.map_err(walk_err)?;
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|e| e == ext) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Every file under `dir`, recursively, in sorted order.
pub(crate) fn collect_recursive(
    category: &'static str,
    dir: &Path,
) -> Result<Vec<PathBuf>, BuildError> {
    ensure_source(category, dir)?;

    let mut files = Vec::new();
    // Serial: this runs inside rayon tasks, where jwalk's pool would deadlock.
    let walk = WalkDir::new(dir)
        .sort(true)
        .parallelism(Parallelism::Serial);
    for entry in walk {
        let entry = entry.map_err(|e| BuildError::Walk {
            path: dir.to_path_buf(),
            source: io::Error::other(e.to_string()),
        })?;
        if entry.file_type().is_file() {
            files.push(entry.path());
        }
    }
    Ok(files)
}

/// Write `contents` to `path`, creating parent directories.
pub(crate) fn write_file(path: &Path, contents: impl AsRef<[u8]>) -> Result<(), BuildError> {
    let write_err = |source| BuildError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    fs::write(path, contents).map_err(write_err)
}
