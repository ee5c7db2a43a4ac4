//! `[styles]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [styles]
//! browsers = ["defaults"]     # browserslist queries used for vendor prefixes
//! prefix = true               # insert vendor prefixes
//! minify = true               # minify compiled CSS
//! source_map = true           # write <name>.css.map next to each stylesheet
//! ```

use lightningcss::targets::{Browsers, Targets};
use serde::{Deserialize, Serialize};

use super::ConfigDiagnostics;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    /// Browserslist queries that decide which prefixes are needed.
    pub browsers: Vec<String>,
    /// Insert vendor prefixes for `browsers`.
    pub prefix: bool,
    /// Minify the output.
    pub minify: bool,
    /// Emit a source map next to each stylesheet.
    pub source_map: bool,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            browsers: vec!["defaults".into()],
            prefix: true,
            minify: true,
            source_map: true,
        }
    }
}

impl StyleConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if !self.prefix {
            return;
        }
        if self.browsers.is_empty() {
            diag.error_with_hint(
                "styles.browsers",
                "no browsers to prefix for",
                "set `prefix = false` to skip vendor prefixes",
            );
            return;
        }
        if let Err(e) = Browsers::from_browserslist(&self.browsers) {
            diag.error("styles.browsers", format!("invalid browserslist query: {e}"));
        }
    }

    /// Compilation targets for lightningcss.
    ///
    /// Empty targets (no prefixing) when `prefix` is off or the query
    /// resolves to nothing.
    pub fn targets(&self) -> Targets {
        if !self.prefix {
            return Targets::default();
        }
        match Browsers::from_browserslist(&self.browsers) {
            Ok(Some(browsers)) => Targets::from(browsers),
            _ => Targets::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    #[test]
    fn test_style_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.styles.browsers, vec!["defaults".to_string()]);
        assert!(config.styles.prefix);
        assert!(config.styles.minify);
        assert!(config.styles.source_map);
    }

    #[test]
    fn test_style_override() {
        let config =
            test_parse_config("[styles]\nbrowsers = [\"last 2 versions\"]\nsource_map = false");
        assert_eq!(config.styles.browsers, vec!["last 2 versions".to_string()]);
        assert!(!config.styles.source_map);
        assert!(config.styles.minify);
    }

    #[test]
    fn test_default_query_has_targets() {
        let targets = StyleConfig::default().targets();
        assert!(targets.browsers.is_some());
    }

    #[test]
    fn test_no_prefix_no_targets() {
        let config = StyleConfig {
            prefix: false,
            ..StyleConfig::default()
        };
        assert!(config.targets().browsers.is_none());
    }

    #[test]
    fn test_invalid_query_reported() {
        let config = StyleConfig {
            browsers: vec!["definitely not a browser 99".into()],
            ..StyleConfig::default()
        };
        let mut diag = ConfigDiagnostics::new();
        config.validate(&mut diag);
        assert!(diag.fields().any(|f| f == "styles.browsers"));
    }

    #[test]
    fn test_empty_browsers_with_prefix_reported() {
        let config = StyleConfig {
            browsers: Vec::new(),
            ..StyleConfig::default()
        };
        let mut diag = ConfigDiagnostics::new();
        config.validate(&mut diag);
        assert_eq!(diag.len(), 1);
    }
}
