//! Image optimization.
//!
//! Files under the image source directory are matched by exact extension
//! (`png`, `jpg`, `svg`) and optimized in parallel into the same relative
//! location under the image destination. Anything else is left out.
//!
//! A file that fails to optimize is logged and copied unchanged, so every
//! matched input has an output.

mod raster;
mod svg;

use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use super::{AssetError, BuildError, BuildStep, StepReport, collect_recursive, write_file};
use crate::config::{ImageConfig, PathConfig};
use crate::utils::path::rebase;
use crate::{debug, log};

/// Image formats the step handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Png,
    Jpeg,
    Svg,
}

impl ImageKind {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "png" => Some(Self::Png),
            "jpg" => Some(Self::Jpeg),
            "svg" => Some(Self::Svg),
            _ => None,
        }
    }
}

/// Optimizes png/jpg/svg files from `source_images` into `dest_images`.
pub struct ImageStep {
    source: PathBuf,
    dest: PathBuf,
    options: ImageConfig,
}

/// Result for one input file.
struct Outcome {
    /// `None` when the input could not even be read.
    output: Option<PathBuf>,
    failed: bool,
}

impl ImageStep {
    /// `None` when image optimization is disabled.
    pub fn new(layout: &PathConfig, options: &ImageConfig) -> Option<Self> {
        let source = layout.source_images.clone()?;
        let dest = layout.dest_images.clone()?;
        Some(Self {
            source,
            dest,
            options: options.clone(),
        })
    }

    fn process(&self, input: &Path) -> Result<Outcome, BuildError> {
        let Some(output) = rebase(input, &self.source, &self.dest) else {
            return Err(BuildError::Walk {
                path: input.to_path_buf(),
                source: std::io::Error::other("outside the image source directory"),
            });
        };

        let data = match fs::read(input) {
            Ok(data) => data,
            Err(source) => {
                let err = AssetError::Read {
                    path: input.to_path_buf(),
                    source,
                };
                log!("error"; "{}", err);
                return Ok(Outcome {
                    output: None,
                    failed: true,
                });
            }
        };

        let (bytes, failed) = match self.optimize(input, &data) {
            Ok(optimized) if optimized.len() < data.len() => (optimized, false),
            Ok(_) => (data, false),
            Err(err) => {
                log!("error"; "{}", err);
                (data, true)
            }
        };

        write_file(&output, &bytes)?;
        Ok(Outcome {
            output: Some(output),
            failed,
        })
    }

    fn optimize(&self, input: &Path, data: &[u8]) -> Result<Vec<u8>, AssetError> {
        match ImageKind::from_path(input) {
            Some(ImageKind::Png) => raster::optimize_png(input, data, self.options.png_level),
            Some(ImageKind::Jpeg) => raster::optimize_jpeg(input, data, self.options.jpeg_quality),
            Some(ImageKind::Svg) => svg::optimize_svg(input, data, &self.options.svg),
            None => Ok(data.to_vec()),
        }
    }
}

impl BuildStep for ImageStep {
    fn name(&self) -> &'static str {
        "image"
    }

    fn run(&self) -> Result<StepReport, BuildError> {
        let inputs: Vec<_> = collect_recursive("images", &self.source)?
            .into_iter()
            .filter(|p| ImageKind::from_path(p).is_some())
            .collect();

        let outcomes = inputs
            .par_iter()
            .map(|input| self.process(input))
            .collect::<Result<Vec<_>, _>>()?;

        let mut report = StepReport::default();
        for outcome in outcomes {
            report.failures += usize::from(outcome.failed);
            report.written.extend(outcome.output);
        }

        debug!("image"; "processed {} files, {} failed", inputs.len(), report.failures);
        Ok(report)
    }
}

#[cfg(test)]
mod tests;
