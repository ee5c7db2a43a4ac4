use super::*;
use crate::config::PathsConfig;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{DynamicImage, Rgba, RgbaImage};
use tempfile::TempDir;

fn setup() -> (TempDir, PathConfig, ImageStep) {
    let dir = TempDir::new().unwrap();
    let layout = PathsConfig::default().resolve(dir.path(), true);
    let source = layout.source_images.clone().unwrap();
    fs::create_dir_all(&source).unwrap();
    let step = ImageStep::new(&layout, &ImageConfig::default()).unwrap();
    (dir, layout, step)
}

fn source_dir(layout: &PathConfig) -> &Path {
    layout.source_images.as_deref().unwrap()
}

fn dest_dir(layout: &PathConfig) -> &Path {
    layout.dest_images.as_deref().unwrap()
}

/// A gradient PNG written without compression, so re-encoding shrinks it.
fn write_png(path: &Path) {
    let img = RgbaImage::from_fn(48, 48, |x, y| Rgba([(x * 5) as u8, (y * 5) as u8, 128, 255]));
    let mut out = Vec::new();
    let encoder = PngEncoder::new_with_quality(&mut out, CompressionType::Fast, FilterType::NoFilter);
    DynamicImage::ImageRgba8(img).write_with_encoder(encoder).unwrap();
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, out).unwrap();
}

const SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10" viewBox="0 0 10 10">

    <!-- comment that usvg drops -->
    <rect x="1.0000000" y="1.0000000" width="8.0000000" height="8.0000000" fill="#000000"/>
</svg>"##;

#[test]
fn test_disabled_step() {
    let dir = TempDir::new().unwrap();
    let layout = PathsConfig::default().resolve(dir.path(), false);
    assert!(ImageStep::new(&layout, &ImageConfig::default()).is_none());
}

#[test]
fn test_kind_matches_exact_extension() {
    assert_eq!(ImageKind::from_path(Path::new("a.png")), Some(ImageKind::Png));
    assert_eq!(ImageKind::from_path(Path::new("a.jpg")), Some(ImageKind::Jpeg));
    assert_eq!(ImageKind::from_path(Path::new("a.svg")), Some(ImageKind::Svg));
    assert_eq!(ImageKind::from_path(Path::new("a.jpeg")), None);
    assert_eq!(ImageKind::from_path(Path::new("a.PNG")), None);
    assert_eq!(ImageKind::from_path(Path::new("a.gif")), None);
}

#[test]
fn test_output_preserves_structure_and_count() {
    let (_dir, layout, step) = setup();
    let src = source_dir(&layout);
    write_png(&src.join("logo.png"));
    write_png(&src.join("icons/nested/badge.png"));
    fs::write(src.join("icons/arrow.svg"), SVG).unwrap();
    fs::write(src.join("anim.gif"), b"GIF89a").unwrap();
    fs::write(src.join("notes.txt"), b"x").unwrap();

    let report = step.run().unwrap();
    let dest = dest_dir(&layout);

    assert_eq!(report.written.len(), 3);
    assert_eq!(report.failures, 0);
    assert!(dest.join("logo.png").is_file());
    assert!(dest.join("icons/nested/badge.png").is_file());
    assert!(dest.join("icons/arrow.svg").is_file());
    assert!(!dest.join("anim.gif").exists());
    assert!(!dest.join("notes.txt").exists());
}

#[test]
fn test_outputs_never_grow() {
    let (_dir, layout, step) = setup();
    let src = source_dir(&layout);
    write_png(&src.join("logo.png"));
    fs::write(src.join("arrow.svg"), SVG).unwrap();

    step.run().unwrap();
    let dest = dest_dir(&layout);

    for name in ["logo.png", "arrow.svg"] {
        let before = fs::metadata(src.join(name)).unwrap().len();
        let after = fs::metadata(dest.join(name)).unwrap().len();
        assert!(after <= before, "{name}: {after} > {before}");
    }
    let svg = fs::read_to_string(dest.join("arrow.svg")).unwrap();
    assert!(!svg.contains("comment that usvg drops"));
}

#[test]
fn test_svg_with_text_copied_unchanged() {
    let (_dir, layout, step) = setup();
    let svg = r##"<svg xmlns="http://www.w3.org/2000/svg" width="120" height="40" viewBox="0 0 120 40">
    <!-- brand -->
    <rect width="120" height="40" fill="#222222"/>
    <text x="8" y="28" fill="#ffffff">ACME Corp</text>
</svg>"##;
    fs::write(source_dir(&layout).join("brand.svg"), svg).unwrap();

    let report = step.run().unwrap();

    assert_eq!(report.failures, 0);
    assert_eq!(
        fs::read_to_string(dest_dir(&layout).join("brand.svg")).unwrap(),
        svg
    );
}

#[test]
fn test_corrupt_file_is_copied_and_batch_continues() {
    let (_dir, layout, step) = setup();
    let src = source_dir(&layout);
    fs::write(src.join("broken.png"), b"definitely not a png").unwrap();
    fs::write(src.join("broken.jpg"), b"nor a jpeg").unwrap();
    write_png(&src.join("ok.png"));

    let report = step.run().unwrap();
    let dest = dest_dir(&layout);

    assert_eq!(report.failures, 2);
    assert_eq!(report.written.len(), 3);
    assert_eq!(
        fs::read(dest.join("broken.png")).unwrap(),
        b"definitely not a png"
    );
    assert!(dest.join("ok.png").is_file());
}

#[test]
fn test_unreadable_input_has_no_output() {
    let (_dir, layout, step) = setup();
    let vanished = source_dir(&layout).join("gone.png");

    let outcome = step.process(&vanished).unwrap();

    assert!(outcome.failed);
    assert!(outcome.output.is_none());
    assert!(!dest_dir(&layout).join("gone.png").exists());
}

#[test]
fn test_missing_source() {
    let dir = TempDir::new().unwrap();
    let layout = PathsConfig::default().resolve(dir.path(), true);
    let step = ImageStep::new(&layout, &ImageConfig::default()).unwrap();
    assert!(matches!(
        step.run(),
        Err(BuildError::MissingSource { category: "images", .. })
    ));
}
