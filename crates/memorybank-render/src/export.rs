//! Page export and note thumbnails.

use crate::renderer::RenderResult;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use image::imageops::{self, FilterType};
use image::{ImageFormat, Rgba, RgbaImage};
use memorybank_core::annotation::PageRasterStore;
use memorybank_core::raster::RasterSnapshot;
use std::io::Cursor;
use std::path::Path;

/// Thumbnail size sent with an annotation save.
pub const THUMBNAIL_WIDTH: u32 = 800;
pub const THUMBNAIL_HEIGHT: u32 = 600;

/// Thumbnail size sent when a note is created.
pub const PLACEHOLDER_WIDTH: u32 = 400;
pub const PLACEHOLDER_HEIGHT: u32 = 300;

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Flatten a page raster over an opaque white page.
pub fn flatten_page(snapshot: &RasterSnapshot) -> RenderResult<RgbaImage> {
    let ink = snapshot.decode()?;
    let mut page = RgbaImage::from_pixel(ink.width(), ink.height(), WHITE);
    imageops::overlay(&mut page, &ink, 0, 0);
    Ok(page)
}

/// Write a page raster, flattened over white, as a PNG file.
pub fn export_page_png(snapshot: &RasterSnapshot, path: &Path) -> RenderResult<()> {
    let page = flatten_page(snapshot)?;
    page.save_with_format(path, ImageFormat::Png)?;
    log::info!(
        "Exported {}x{} page to {}",
        page.width(),
        page.height(),
        path.display()
    );
    Ok(())
}

fn encode_base64_png(image: &RgbaImage) -> RenderResult<String> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(BASE64.encode(bytes))
}

/// Thumbnail for a saved note: the first annotated page fitted onto an
/// 800x600 white canvas.
///
/// Returned as plain base64 PNG, without a data-URL prefix.
pub fn generate_thumbnail(store: &PageRasterStore) -> RenderResult<String> {
    let mut canvas = RgbaImage::from_pixel(THUMBNAIL_WIDTH, THUMBNAIL_HEIGHT, WHITE);

    if let Some((page, snapshot)) = store.iter().next() {
        match snapshot.decode() {
            Ok(ink) if ink.width() > 0 && ink.height() > 0 => {
                let scale = (THUMBNAIL_WIDTH as f64 / ink.width() as f64)
                    .min(THUMBNAIL_HEIGHT as f64 / ink.height() as f64);
                let width = ((ink.width() as f64 * scale).round() as u32).max(1);
                let height = ((ink.height() as f64 * scale).round() as u32).max(1);
                let fitted = imageops::resize(&ink, width, height, FilterType::Triangle);
                let x = (THUMBNAIL_WIDTH - width) / 2;
                let y = (THUMBNAIL_HEIGHT - height) / 2;
                imageops::overlay(&mut canvas, &fitted, x as i64, y as i64);
                log::debug!("Thumbnail drawn from page {}", page);
            }
            Ok(_) => {}
            Err(e) => log::warn!("Skipping thumbnail preview for page {}: {}", page, e),
        }
    }

    encode_base64_png(&canvas)
}

/// Blank 400x300 white thumbnail for a new note, plain base64 PNG.
pub fn placeholder_thumbnail() -> RenderResult<String> {
    let canvas = RgbaImage::from_pixel(PLACEHOLDER_WIDTH, PLACEHOLDER_HEIGHT, WHITE);
    encode_base64_png(&canvas)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Point;
    use memorybank_core::raster::Surface;

    fn inked_store() -> PageRasterStore {
        let mut surface = Surface::new(40.0, 30.0, 1.0);
        surface.set_line_width(4.0);
        surface.begin_path();
        surface.move_to(Point::new(0.0, 15.0));
        surface.line_to(Point::new(40.0, 15.0));
        surface.stroke();
        let mut store = PageRasterStore::new();
        store.flush(2, &surface).unwrap();
        store
    }

    fn decode_base64(data: &str) -> RgbaImage {
        let bytes = BASE64.decode(data).unwrap();
        image::load_from_memory_with_format(&bytes, ImageFormat::Png)
            .unwrap()
            .to_rgba8()
    }

    #[test]
    fn test_flatten_page_is_opaque() {
        let store = inked_store();
        let page = flatten_page(store.get(2).unwrap()).unwrap();
        assert_eq!(page.dimensions(), (40, 30));
        assert_eq!(*page.get_pixel(20, 15), Rgba([0, 0, 0, 255]));
        assert_eq!(*page.get_pixel(20, 2), WHITE);
    }

    #[test]
    fn test_export_page_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page-2.png");
        let store = inked_store();
        export_page_png(store.get(2).unwrap(), &path).unwrap();
        let written = image::open(&path).unwrap().to_rgba8();
        assert_eq!(written.dimensions(), (40, 30));
    }

    #[test]
    fn test_thumbnail_fits_first_page() {
        let thumbnail = generate_thumbnail(&inked_store()).unwrap();
        assert!(!thumbnail.starts_with("data:"));
        let image = decode_base64(&thumbnail);
        assert_eq!(image.dimensions(), (THUMBNAIL_WIDTH, THUMBNAIL_HEIGHT));
        // 40x30 page scales by 20 to fill the canvas; stroke runs across the middle
        assert_eq!(image.get_pixel(400, 300).0[0], 0);
        assert_eq!(*image.get_pixel(400, 20), WHITE);
    }

    #[test]
    fn test_thumbnail_without_annotations_is_white() {
        let image = decode_base64(&generate_thumbnail(&PageRasterStore::new()).unwrap());
        assert!(image.pixels().all(|p| *p == WHITE));
    }

    #[test]
    fn test_placeholder_size() {
        let image = decode_base64(&placeholder_thumbnail().unwrap());
        assert_eq!(image.dimensions(), (PLACEHOLDER_WIDTH, PLACEHOLDER_HEIGHT));
    }
}
