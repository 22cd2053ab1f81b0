//! Capture stage tests using files on disk

mod common;

use std::io::Write;

use common::png_bytes;
use photo_poetry::capture::{FileSource, ImageSource, capture_image};
use tempfile::NamedTempFile;

fn png_file(w: u32, h: u32) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".png")
        .tempfile()
        .expect("create temp file");
    file.write_all(&png_bytes(w, h)).expect("write temp png");
    file
}

#[tokio::test]
async fn test_file_source_reads_bytes() {
    let file = png_file(4, 4);
    let mut source = FileSource::new(file.path());

    let bytes = source.grab().await.unwrap();

    assert_eq!(bytes, png_bytes(4, 4));
    assert!(source.describe().contains(&file.path().display().to_string()));
}

#[tokio::test]
async fn test_capture_encodes_png_data_uri() {
    let file = png_file(12, 8);
    let mut source = FileSource::new(file.path());

    let image = capture_image(&mut source, None).await.unwrap();

    assert_eq!(image.mime(), "image/png");
    assert!(image.as_str().starts_with("data:image/png;base64,"));
    assert_eq!(image.to_bytes().unwrap(), png_bytes(12, 8));
}

#[tokio::test]
async fn test_capture_downscales_large_images() {
    let file = png_file(400, 100);
    let mut source = FileSource::new(file.path());

    let image = capture_image(&mut source, Some(100)).await.unwrap();

    let decoded = image::load_from_memory(&image.to_bytes().unwrap()).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (100, 25));
}

#[tokio::test]
async fn test_capture_leaves_small_images_untouched() {
    let file = png_file(40, 30);
    let mut source = FileSource::new(file.path());

    let image = capture_image(&mut source, Some(1024)).await.unwrap();

    assert_eq!(image.to_bytes().unwrap(), png_bytes(40, 30));
}

#[tokio::test]
async fn test_missing_file_is_io_error_with_path() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.png");
    let mut source = FileSource::new(&missing);

    let err = capture_image(&mut source, None).await.unwrap_err();

    assert_eq!(err.category(), "io");
    assert!(err.to_string().contains("nope.png"));
}

#[tokio::test]
async fn test_non_image_file_is_rejected() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(b"just some text, not a picture").unwrap();
    let mut source = FileSource::new(file.path());

    let err = capture_image(&mut source, None).await.unwrap_err();

    assert_eq!(err.category(), "image");
}
