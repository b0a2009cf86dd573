//! File round trips through the built-in PNM codecs.

use std::path::PathBuf;

use enough::Unstoppable;
use zenplanes::*;

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("zenplanes-{}-{name}", std::process::id()))
}

fn pattern(format: PixelFormat, w: u32, h: u32) -> Image {
    let mut img = Image::new(w, h, format, Orientation::Normal).unwrap();
    let mut plane = img.plane_mut(0).unwrap();
    for y in 0..plane.rows() {
        for (x, b) in plane.row_mut(y).iter_mut().enumerate() {
            *b = (x as u32 * 31 + y * 17) as u8;
        }
    }
    img
}

#[test]
fn imwrite_then_imread() {
    for (format, ext) in [
        (PixelFormat::Gray8, "pgm"),
        (PixelFormat::Rgb888, "ppm"),
        (PixelFormat::Rgba8888, "pam"),
    ] {
        let img = pattern(format, 7, 5);
        let path = temp_path(&format!("roundtrip.{ext}"));
        imwrite(&path, &img.as_view()).unwrap();
        let back = imread(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert!(back.is_equal(&img), "{format} via .{ext}");
    }
}

#[test]
fn decoded_channel_count_picks_the_format() {
    let registry = CodecRegistry::default();
    let bgra = pattern(PixelFormat::Bgra8888, 3, 3);
    let encoded = registry.encode("pam", &bgra.as_view(), &Unstoppable).unwrap();
    let decoded = registry.decode(&encoded, &Unstoppable).unwrap();
    assert_eq!(decoded.format(), PixelFormat::Rgba8888);
    assert_eq!(decoded.convert(PixelFormat::Bgra8888).unwrap(), bgra);

    let bgr = pattern(PixelFormat::Bgr888, 3, 3);
    let encoded = registry.encode("ppm", &bgr.as_view(), &Unstoppable).unwrap();
    let decoded = registry.decode(&encoded, &Unstoppable).unwrap();
    assert_eq!(decoded.format(), PixelFormat::Rgb888);
}

#[test]
fn unknown_extension_is_an_error() {
    let img = pattern(PixelFormat::Gray8, 2, 2);
    let path = temp_path("image.jpg");
    assert!(matches!(
        imwrite(&path, &img.as_view()),
        Err(CodecError::NoEncoder(ext)) if ext == "jpg"
    ));
    assert!(!path.exists());
}

#[test]
fn missing_file_is_an_io_error() {
    assert!(matches!(
        imread(temp_path("does-not-exist.pgm")),
        Err(CodecError::Io(_))
    ));
}

#[test]
fn registry_limits_apply_to_files() {
    let img = pattern(PixelFormat::Rgb888, 20, 20);
    let path = temp_path("limited.ppm");
    imwrite(&path, &img.as_view()).unwrap();
    let registry = CodecRegistry::default().with_limits(Limits::none().with_max_width(10));
    let result = registry.read(&path);
    std::fs::remove_file(&path).unwrap();
    assert!(matches!(
        result,
        Err(CodecError::Limit(LimitExceeded::Width { actual: 20, max: 10 }))
    ));
}

#[test]
fn cropped_views_encode_packed() {
    let img = pattern(PixelFormat::Gray8, 8, 8);
    let roi = img.region(2, 3, 4, 2);
    let registry = CodecRegistry::default();
    let encoded = registry.encode("pgm", &roi, &Unstoppable).unwrap();
    let decoded = registry.decode(&encoded, &Unstoppable).unwrap();
    assert!(decoded.as_view().is_equal(&roi));
}
