//! Sass compilation.
//!
//! ```text
//! main.scss ──grass──► css ──lightningcss──► prefixed/minified css ──► dest_css/main.css
//!                        │                         │
//!                        └── sourcesContent ───────┴──► dest_css/main.css.map
//! ```
//!
//! Only top-level files are entry points. Partials (`_name.scss`) and
//! nested files are reached through `@use`/`@import`.

use std::path::{Path, PathBuf};

use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::Targets;
use parcel_sourcemap::SourceMap;

use super::{BuildError, BuildStep, CompiledStyle, StepReport, StyleError, collect_top_level};
use crate::config::{PathConfig, StyleConfig};
use crate::{debug, log};

/// Compiles top-level Sass entry points into `dest_css`.
pub struct StyleStep {
    layout: PathConfig,
    options: StyleConfig,
    targets: Targets,
}

/// Output of one stylesheet, before it is written.
#[derive(Debug)]
struct Compiled {
    css: String,
    map: Option<String>,
}

impl StyleStep {
    pub fn new(layout: &PathConfig, options: &StyleConfig) -> Self {
        Self {
            layout: layout.clone(),
            options: options.clone(),
            targets: options.targets(),
        }
    }

    /// Entry points: top-level `*.scss` that are not partials.
    fn entries(&self) -> Result<Vec<PathBuf>, BuildError> {
        let files = collect_top_level("styles", &self.layout.source_styles, "scss")?;
        Ok(files.into_iter().filter(|p| !is_partial(p)).collect())
    }

    fn compile(&self, path: &Path, css_name: &str) -> Result<Compiled, StyleError> {
        let options = grass::Options::default().load_path(&self.layout.source_styles);
        let source = grass::from_path(path, &options).map_err(|e| StyleError::Compile {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        self.transform(path, css_name, &source)
    }

    /// Prefix, minify and print `source` (plain CSS).
    fn transform(&self, path: &Path, css_name: &str, source: &str) -> Result<Compiled, StyleError> {
        let transform_err = |message: String| StyleError::Transform {
            path: path.to_path_buf(),
            message,
        };

        let mut sheet = StyleSheet::parse(
            source,
            ParserOptions {
                filename: css_name.to_string(),
                ..ParserOptions::default()
            },
        )
        .map_err(|e| transform_err(e.to_string()))?;

        if self.options.prefix || self.options.minify {
            sheet
                .minify(MinifyOptions {
                    targets: self.targets,
                    ..MinifyOptions::default()
                })
                .map_err(|e| transform_err(e.to_string()))?;
        }

        let mut source_map = if self.options.source_map {
            let mut map = SourceMap::new("/");
            let index = map.add_source(css_name);
            map.set_source_content(index as usize, source)
                .map_err(|e| transform_err(e.to_string()))?;
            Some(map)
        } else {
            None
        };

        let printed = sheet
            .to_css(PrinterOptions {
                minify: self.options.minify,
                source_map: source_map.as_mut(),
                targets: self.targets,
                ..PrinterOptions::default()
            })
            .map_err(|e| transform_err(e.to_string()))?;

        let mut css = printed.code;
        let map = match source_map {
            Some(mut map) => {
                let json = map
                    .to_json(None)
                    .map_err(|e| transform_err(e.to_string()))?;
                if !css.ends_with('\n') {
                    css.push('\n');
                }
                css.push_str(&format!("/*# sourceMappingURL={css_name}.map */\n"));
                Some(json)
            }
            None => None,
        };

        Ok(Compiled { css, map })
    }
}

impl BuildStep for StyleStep {
    fn name(&self) -> &'static str {
        "style"
    }

    fn run(&self) -> Result<StepReport, BuildError> {
        let mut report = StepReport::default();

        for entry in self.entries()? {
            let Some(stem) = entry.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let css_name = format!("{stem}.css");

            let compiled = match self.compile(&entry, &css_name) {
                Ok(compiled) => compiled,
                Err(e) => {
                    log!("error"; "{}", e);
                    report.failures += 1;
                    continue;
                }
            };

            let css_path = self.layout.dest_css.join(&css_name);
            super::write_file(&css_path, &compiled.css)?;
            if let Some(map) = &compiled.map {
                let map_path = self.layout.dest_css.join(format!("{css_name}.map"));
                super::write_file(&map_path, map)?;
                report.written.push(map_path);
            }

            debug!("style"; "compiled {}", css_name);
            if let Some(href) = self.layout.href_for(&css_path) {
                report.styles.push(CompiledStyle {
                    href,
                    content: compiled.css,
                });
            }
            report.written.push(css_path);
        }

        Ok(report)
    }
}

fn is_partial(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('_'))
}
