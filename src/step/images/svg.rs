//! SVG optimization using usvg.
//!
//! usvg resolves styles, drops editor metadata and comments, and writes a
//! normalized tree. Coordinates are rounded to the configured precision.
//!
//! usvg renders rather than rewrites: text, embedded images, links,
//! animation and accessibility elements do not survive it. Files that
//! contain any of those are passed through unchanged.

use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::config::SvgConfig;
use crate::step::AssetError;

/// Optimize SVG bytes.
pub fn optimize_svg(path: &Path, data: &[u8], options: &SvgConfig) -> Result<Vec<u8>, AssetError> {
    if let Some(element) = find_unsupported_element(data) {
        crate::debug!("image"; "{}: keeping as is, contains <{}>", path.display(), element);
        return Ok(data.to_vec());
    }

    let tree = usvg::Tree::from_data(data, &usvg::Options::default()).map_err(|e| {
        AssetError::Decode {
            path: path.to_path_buf(),
            message: e.to_string(),
        }
    })?;

    let write_options = usvg::WriteOptions {
        indent: usvg::Indent::None,
        attributes_indent: usvg::Indent::None,
        coordinates_precision: options.precision,
        transforms_precision: options.precision,
        ..Default::default()
    };

    let mut optimized = tree.to_string(&write_options);
    if options.remove_view_box {
        optimized = strip_redundant_view_box(&optimized);
    }

    Ok(optimized.into_bytes())
}

/// Elements usvg would drop or flatten.
const UNSUPPORTED_ELEMENTS: &[&str] = &[
    "text",
    "tspan",
    "textPath",
    "image",
    "title",
    "desc",
    "a",
    "foreignObject",
    "script",
    "animate",
    "animateMotion",
    "animateTransform",
    "set",
];

/// First element in `data` that usvg cannot round-trip.
///
/// Malformed input returns `None` and is left to usvg to report.
fn find_unsupported_element(data: &[u8]) -> Option<String> {
    let mut reader = Reader::from_reader(data);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e) | Event::Empty(e)) => {
                let name = e.local_name();
                let name = std::str::from_utf8(name.as_ref()).unwrap_or_default();
                if UNSUPPORTED_ELEMENTS.contains(&name) {
                    return Some(name.to_string());
                }
            }
            Ok(Event::Eof) | Err(_) => return None,
            Ok(_) => {}
        }
    }
}

/// Drop the root `viewBox` when it is exactly `0 0 width height`.
fn strip_redundant_view_box(svg: &str) -> String {
    let Some(start) = svg.find("<svg") else {
        return svg.to_string();
    };
    let Some(len) = svg[start..].find('>') else {
        return svg.to_string();
    };
    let root = &svg[start..start + len];

    let number = |prefix: &str| -> Option<f64> { extract_attr(root, prefix)?.parse().ok() };
    let (Some(width), Some(height)) = (number(r#" width=""#), number(r#" height=""#)) else {
        return svg.to_string();
    };
    let Some(view_box) = extract_attr(root, r#" viewBox=""#) else {
        return svg.to_string();
    };

    let values: Vec<f64> = view_box
        .split([' ', ','])
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse().ok())
        .collect();
    if values != [0.0, 0.0, width, height] {
        return svg.to_string();
    }

    let attr = format!(r#" viewBox="{view_box}""#);
    let root_stripped = root.replacen(&attr, "", 1);
    format!("{}{}{}", &svg[..start], root_stripped, &svg[start + len..])
}

/// Extract attribute value between prefix and closing quote
#[inline]
fn extract_attr<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let start = s.find(prefix)? + prefix.len();
    let end = start + s.as_bytes()[start..].iter().position(|&b| b == b'"')?;
    Some(&s[start..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    const VERBOSE_SVG: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!-- Generator: Some Editor 1.0 -->
<svg xmlns="http://www.w3.org/2000/svg" width="100" height="50" viewBox="0 0 100 50">
    <metadata>editor junk</metadata>
    <g id="layer1">
        <rect id="box" x="10.123456" y="10.987654" width="30" height="20" style="fill:#ff0000"/>
    </g>
</svg>
"#;

    #[test]
    fn test_optimize_shrinks_and_drops_view_box() {
        let out = optimize_svg(Path::new("a.svg"), VERBOSE_SVG.as_bytes(), &SvgConfig::default())
            .unwrap();
        let out = String::from_utf8(out).unwrap();

        assert!(out.len() < VERBOSE_SVG.len());
        assert!(!out.contains("viewBox"));
        assert!(!out.contains("Generator"));
        assert!(!out.contains("10.123456"));
        assert!(out.contains(r#"width="100""#));
    }

    #[test]
    fn test_keep_view_box_when_configured() {
        let options = SvgConfig {
            remove_view_box: false,
            ..SvgConfig::default()
        };
        let kept = optimize_svg(Path::new("a.svg"), VERBOSE_SVG.as_bytes(), &options).unwrap();
        let stripped =
            optimize_svg(Path::new("a.svg"), VERBOSE_SVG.as_bytes(), &SvgConfig::default())
                .unwrap();
        assert!(kept.len() >= stripped.len());
        assert_eq!(
            strip_redundant_view_box(std::str::from_utf8(&kept).unwrap()).as_bytes(),
            stripped
        );
    }

    #[test]
    fn test_text_image_and_title_kept() {
        let svg = r##"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="200" height="100" viewBox="0 0 200 100">
    <title>Company logo</title>
    <rect width="200" height="100" fill="#ffffff"/>
    <text x="10" y="50" font-size="20">ACME Corp</text>
    <image xlink:href="photo.png" x="150" y="10" width="40" height="40"/>
</svg>"##;

        let out = optimize_svg(Path::new("logo.svg"), svg.as_bytes(), &SvgConfig::default())
            .unwrap();
        let out = String::from_utf8(out).unwrap();

        assert!(out.contains("ACME Corp"));
        assert!(out.contains("<title>Company logo</title>"));
        assert!(out.contains(r#"xlink:href="photo.png""#));
    }

    #[test]
    fn test_find_unsupported_element() {
        assert_eq!(
            find_unsupported_element(br#"<svg><g><text>x</text></g></svg>"#).as_deref(),
            Some("text")
        );
        assert_eq!(
            find_unsupported_element(br#"<svg:svg xmlns:svg="http://www.w3.org/2000/svg"><svg:desc/></svg:svg>"#)
                .as_deref(),
            Some("desc")
        );
        assert_eq!(find_unsupported_element(VERBOSE_SVG.as_bytes()), None);
        assert_eq!(find_unsupported_element(b"<svg"), None);
    }

    #[test]
    fn test_invalid_svg() {
        let err = optimize_svg(Path::new("x.svg"), b"<svg", &SvgConfig::default()).unwrap_err();
        assert!(matches!(err, AssetError::Decode { .. }));
    }

    #[test]
    fn test_strip_only_redundant_view_box() {
        let redundant = r#"<svg width="24" height="24" viewBox="0 0 24 24"><path/></svg>"#;
        assert_eq!(
            strip_redundant_view_box(redundant),
            r#"<svg width="24" height="24"><path/></svg>"#
        );

        let offset = r#"<svg width="24" height="24" viewBox="2 2 20 20"><path/></svg>"#;
        assert_eq!(strip_redundant_view_box(offset), offset);

        let scaled = r#"<svg width="48" height="48" viewBox="0 0 24 24"/>"#;
        assert_eq!(strip_redundant_view_box(scaled), scaled);
    }

    #[test]
    fn test_extract_attr() {
        let s = r#"<svg width="100" height="50" class="icon">"#;
        assert_eq!(extract_attr(s, r#" width=""#), Some("100"));
        assert_eq!(extract_attr(s, r#" id=""#), None);
    }
}
