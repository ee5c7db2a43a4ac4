//! Output directory removal.

use std::fs;
use std::path::PathBuf;

use jwalk::{Parallelism, WalkDir};

use super::{BuildError, BuildStep, StepReport};
use crate::debug;

/// Removes the destination root and everything beneath it.
pub struct CleanStep {
    dest_root: PathBuf,
}

impl CleanStep {
    pub fn new(dest_root: impl Into<PathBuf>) -> Self {
        Self {
            dest_root: dest_root.into(),
        }
    }
}

impl BuildStep for CleanStep {
    fn name(&self) -> &'static str {
        "clean"
    }

    fn run(&self) -> Result<StepReport, BuildError> {
        let root = &self.dest_root;
        let clean_err = |source| BuildError::Clean {
            path: root.clone(),
            source,
        };

        let metadata = match fs::symlink_metadata(root) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("clean"; "{} does not exist", root.display());
                return Ok(StepReport::default());
            }
            Err(e) => return Err(clean_err(e)),
        };

        if !metadata.is_dir() {
            fs::remove_file(root).map_err(clean_err)?;
            return Ok(StepReport {
                removed: vec![root.clone()],
                ..StepReport::default()
            });
        }

        // Deepest entries first, root last.
        let mut removed: Vec<PathBuf> = WalkDir::new(root)
            .skip_hidden(false)
            .parallelism(Parallelism::Serial)
            .into_iter()
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .collect();
        removed.sort_by(|a, b| b.cmp(a));

        fs::remove_dir_all(root).map_err(clean_err)?;
        debug!("clean"; "removed {} entries under {}", removed.len(), root.display());

        Ok(StepReport {
            removed,
            ..StepReport::default()
        })
    }
}
