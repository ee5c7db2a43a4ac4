//! `[images]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [images]
//! enable = true            # set false to skip image optimization entirely
//! jpeg_quality = 75        # 1-100, lossy
//! png_level = 5            # 0-7, lossless
//!
//! [images.svg]
//! remove_view_box = true   # drop a viewBox that repeats width/height
//! precision = 3            # decimal places kept for coordinates
//! ```

use serde::{Deserialize, Serialize};

use super::ConfigDiagnostics;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// Run the image step at all.
    pub enable: bool,
    /// JPEG re-encode quality.
    pub jpeg_quality: u8,
    /// PNG optimization level, higher is slower and smaller.
    pub png_level: u8,
    pub svg: SvgConfig,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            enable: true,
            jpeg_quality: 75,
            png_level: 5,
            svg: SvgConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SvgConfig {
    pub remove_view_box: bool,
    pub precision: u8,
}

impl Default for SvgConfig {
    fn default() -> Self {
        Self {
            remove_view_box: true,
            precision: 3,
        }
    }
}

/// Highest accepted `png_level`.
pub const MAX_PNG_LEVEL: u8 = 7;

impl ImageConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if !self.enable {
            return;
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            diag.error_with_hint(
                "images.jpeg_quality",
                format!("{} is out of range", self.jpeg_quality),
                "use a value between 1 and 100",
            );
        }
        if self.png_level > MAX_PNG_LEVEL {
            diag.error_with_hint(
                "images.png_level",
                format!("{} is out of range", self.png_level),
                format!("use a value between 0 and {MAX_PNG_LEVEL}"),
            );
        }
        if self.svg.precision > 8 {
            diag.error("images.svg.precision", "at most 8 decimal places");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    #[test]
    fn test_image_defaults() {
        let config = test_parse_config("");
        assert!(config.images.enable);
        assert_eq!(config.images.jpeg_quality, 75);
        assert_eq!(config.images.png_level, 5);
        assert!(config.images.svg.remove_view_box);
        assert_eq!(config.images.svg.precision, 3);
    }

    #[test]
    fn test_image_nested_svg() {
        let config = test_parse_config("[images.svg]\nremove_view_box = false");
        assert!(!config.images.svg.remove_view_box);
        assert_eq!(config.images.svg.precision, 3);
    }

    #[test]
    fn test_out_of_range_values() {
        let config = ImageConfig {
            jpeg_quality: 0,
            png_level: 9,
            ..ImageConfig::default()
        };
        let mut diag = ConfigDiagnostics::new();
        config.validate(&mut diag);
        assert_eq!(diag.len(), 2);
    }

    #[test]
    fn test_disabled_skips_validation() {
        let config = ImageConfig {
            enable: false,
            jpeg_quality: 0,
            ..ImageConfig::default()
        };
        let mut diag = ConfigDiagnostics::new();
        config.validate(&mut diag);
        assert!(!diag.has_errors());
    }
}
