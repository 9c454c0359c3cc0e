mod common;

use std::io::Cursor as IoCursor;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use bizdoc_pdf::{AssetLoader, DocumentRenderer, ImageSource, LayoutConfig, PixelData};
use common::{FailingImages, widget_invoice};

fn png_bytes(width: u32, height: u32, alpha: u8) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([200, 40, 40, alpha]));
    let mut out = IoCursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}

fn loader() -> AssetLoader {
    AssetLoader::new(Duration::from_secs(2)).unwrap()
}

#[tokio::test]
async fn unreachable_logo_is_skipped() {
    let mut doc = widget_invoice();
    doc.business.business_logo_url = Some("https://unreachable.invalid/logo.png".to_string());

    let images = FailingImages::new();
    let renderer = DocumentRenderer::with_images(LayoutConfig::default(), images);
    let page = renderer.compose(&doc).await.unwrap();

    assert_eq!(page.images().count(), 0);
    assert!(page.find_text("Date: 2024-05-01").is_some());
    assert!(page.find_text("INVOICE").is_some());
    assert!(renderer.render_bytes(&doc).await.unwrap().starts_with(b"%PDF"));
}

#[tokio::test]
async fn each_image_is_attempted_once() {
    let mut doc = widget_invoice();
    doc.business.business_logo_url = Some("logo".to_string());
    doc.business.signature_url = Some("sig".to_string());

    let images = Arc::new(FailingImages::new());
    let renderer = DocumentRenderer::with_images(LayoutConfig::default(), Arc::clone(&images));
    let page = renderer.compose(&doc).await.unwrap();
    assert_eq!(page.images().count(), 0);
    assert_eq!(images.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn absent_urls_are_not_fetched() {
    let mut doc = widget_invoice();
    doc.business.business_logo_url = Some(String::new());
    let images = Arc::new(FailingImages::new());
    let renderer = DocumentRenderer::with_images(LayoutConfig::default(), Arc::clone(&images));
    let page = renderer.compose(&doc).await.unwrap();
    assert_eq!(page.images().count(), 0);
    assert_eq!(images.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn logo_from_file_is_placed_in_its_slot() {
    let cfg = LayoutConfig::default();
    let dir = tempfile::tempdir().unwrap();
    let logo = dir.path().join("logo.png");
    std::fs::write(&logo, png_bytes(8, 8, 255)).unwrap();

    let mut doc = widget_invoice();
    doc.business.business_logo_url = Some(logo.display().to_string());
    let renderer = DocumentRenderer::with_images(cfg.clone(), loader());
    let page = renderer.compose(&doc).await.unwrap();

    let (image, rect) = page.images().next().expect("logo drawn");
    assert_eq!((image.width, image.height), (8, 8));
    assert_eq!((rect.x, rect.y), (cfg.logo_x, cfg.logo_y));
    assert_eq!((rect.w, rect.h), (cfg.logo_size, cfg.logo_size));

    let bytes = renderer.render_bytes(&doc).await.unwrap();
    let text = String::from_utf8_lossy(&bytes);
    assert!(text.contains("/Subtype /Image"));
}

#[tokio::test]
async fn file_url_and_data_url_load_the_same_pixels() {
    let png = png_bytes(3, 2, 128);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sig.png");
    std::fs::write(&path, &png).unwrap();

    let from_file = loader()
        .load(&format!("file://{}", path.display()))
        .await
        .unwrap();
    let from_data = loader()
        .load(&format!("data:image/png;base64,{}", BASE64.encode(&png)))
        .await
        .unwrap();

    assert_eq!((from_file.width, from_file.height), (3, 2));
    match (&from_file.data, &from_data.data) {
        (PixelData::Rgba(a), PixelData::Rgba(b)) => {
            assert_eq!(a, b);
            assert_eq!(a.len(), 3 * 2 * 4);
            assert_eq!(a[3], 128);
        }
        _ => panic!("PNG should decode to RGBA"),
    }
}

#[tokio::test]
async fn jpeg_is_passed_through() {
    let img = image::RgbImage::from_pixel(4, 4, image::Rgb([10, 120, 200]));
    let mut out = IoCursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Jpeg).unwrap();
    let jpeg = out.into_inner();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("logo.jpg");
    std::fs::write(&path, &jpeg).unwrap();

    let loaded = loader().load(path.to_str().unwrap()).await.unwrap();
    match loaded.data {
        PixelData::Jpeg(bytes) => assert_eq!(bytes, jpeg),
        PixelData::Rgba(_) => panic!("RGB JPEG should be embedded unchanged"),
    }
}

#[tokio::test]
async fn unreadable_sources_are_errors() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.png");
    assert!(loader().load(missing.to_str().unwrap()).await.is_err());

    let garbage = dir.path().join("garbage.png");
    std::fs::write(&garbage, b"definitely not a png").unwrap();
    assert!(loader().load(garbage.to_str().unwrap()).await.is_err());

    assert!(loader().load("data:image/png;base64,!!!").await.is_err());
}

#[tokio::test]
async fn translucent_signature_renders() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sig.png");
    std::fs::write(&path, png_bytes(6, 3, 100)).unwrap();

    let mut doc = widget_invoice();
    doc.business.signature_url = Some(path.display().to_string());
    let renderer = DocumentRenderer::with_images(LayoutConfig::default(), loader());
    let page = renderer.compose(&doc).await.unwrap();
    assert_eq!(page.images().count(), 1);
    assert!(page.find_text(bizdoc_pdf::layout::SIGNATURE_CAPTION).is_some());

    let bytes = renderer.render_bytes(&doc).await.unwrap();
    let text = String::from_utf8_lossy(&bytes);
    assert!(text.contains("/SMask"));
}
