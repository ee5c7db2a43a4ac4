//! Markup copy.

use std::fs;
use std::path::PathBuf;

use super::{BuildError, BuildStep, StepReport, collect_top_level};
use crate::config::PathConfig;
use crate::debug;

/// Copies top-level `*.html` files into the destination root unchanged.
pub struct MarkupStep {
    source: PathBuf,
    dest: PathBuf,
}

impl MarkupStep {
    pub fn new(layout: &PathConfig) -> Self {
        Self {
            source: layout.source_html.clone(),
            dest: layout.dest_root.clone(),
        }
    }
}

impl BuildStep for MarkupStep {
    fn name(&self) -> &'static str {
        "markup"
    }

    fn run(&self) -> Result<StepReport, BuildError> {
        let files = collect_top_level("html", &self.source, "html")?;

        fs::create_dir_all(&self.dest).map_err(|source| BuildError::Write {
            path: self.dest.clone(),
            source,
        })?;

        let mut written = Vec::with_capacity(files.len());
        for from in files {
            let Some(name) = from.file_name() else {
                continue;
            };
            let to = self.dest.join(name);
            fs::copy(&from, &to).map_err(|source| BuildError::Copy {
                from: from.clone(),
                to: to.clone(),
                source,
            })?;
            written.push(to);
        }

        debug!("markup"; "copied {} files", written.len());
        Ok(StepReport {
            written,
            ..StepReport::default()
        })
    }
}
