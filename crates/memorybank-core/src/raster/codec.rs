//! PNG encoding of raster pixels, wrapped in a data URL.

use super::{RasterError, RasterResult};
use base64::{Engine, engine::general_purpose::STANDARD};
use image::{ImageFormat, RgbaImage};
use std::io::Cursor;

/// Prefix of the data URLs produced by [`encode_data_url`].
pub const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// Encode straight-alpha RGBA8 pixels as PNG.
pub fn encode_png(image: &RgbaImage) -> RasterResult<Vec<u8>> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

/// Decode a PNG of any colour type into RGBA8.
pub fn decode_png(bytes: &[u8]) -> RasterResult<RgbaImage> {
    Ok(image::load_from_memory_with_format(bytes, ImageFormat::Png)?.to_rgba8())
}

/// Encode pixels as a `data:image/png;base64,...` URL.
pub fn encode_data_url(image: &RgbaImage) -> RasterResult<String> {
    let png = encode_png(image)?;
    Ok(format!("{}{}", PNG_DATA_URL_PREFIX, STANDARD.encode(png)))
}

/// Decode a base64 data URL (any image media type) holding a PNG.
///
/// A bare base64 payload without the `data:` header is accepted too.
pub fn decode_data_url(url: &str) -> RasterResult<RgbaImage> {
    let payload = if let Some(rest) = url.strip_prefix("data:") {
        let (header, payload) = rest.split_once(',').ok_or(RasterError::InvalidDataUrl)?;
        if !header.ends_with(";base64") {
            return Err(RasterError::InvalidDataUrl);
        }
        payload
    } else {
        url
    };
    let bytes = STANDARD.decode(payload.trim())?;
    decode_png(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgba};

    #[test]
    fn test_data_url_prefix() {
        let image = RgbaImage::from_pixel(1, 1, Rgba([1, 2, 3, 4]));
        let url = encode_data_url(&image).unwrap();
        assert!(url.starts_with(PNG_DATA_URL_PREFIX));
        let decoded = decode_data_url(&url).unwrap();
        assert_eq!(decoded.as_raw(), &vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_bare_base64_accepted() {
        let image = RgbaImage::from_raw(2, 1, vec![0, 0, 0, 255, 255, 255, 255, 0]).unwrap();
        let png = encode_png(&image).unwrap();
        let decoded = decode_data_url(&STANDARD.encode(png)).unwrap();
        assert_eq!(decoded.dimensions(), (2, 1));
    }

    #[test]
    fn test_gray_png_expands_to_opaque_rgba() {
        let mut bytes = Vec::new();
        GrayImage::from_pixel(2, 2, Luma([90]))
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        let decoded = decode_png(&bytes).unwrap();
        assert_eq!(*decoded.get_pixel(1, 1), Rgba([90, 90, 90, 255]));
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(matches!(
            decode_data_url("data:image/png,notbase64"),
            Err(RasterError::InvalidDataUrl)
        ));
        assert!(matches!(
            decode_data_url("data:image/png;base64,!!!"),
            Err(RasterError::Base64(_))
        ));
        assert!(matches!(
            decode_data_url(&STANDARD.encode(b"not a png")),
            Err(RasterError::Image(_))
        ));
    }
}
