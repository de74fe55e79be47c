//! PNG serializers for masks and copied-out pixels.
//!
//! Pure functions: they encode into an in-memory byte vector and never
//! touch the filesystem.

use image::ExtendedColorType;
use image::ImageEncoder;
use image::codecs::png::PngEncoder;

use marquee_engine::{MaskBuffer, SelectedPixels};

use crate::ExportError;

/// Encode a mask as an 8-bit grayscale PNG (white = selected).
///
/// # Errors
///
/// Returns [`ExportError::Png`] if encoding fails.
pub fn mask_to_png(mask: &MaskBuffer) -> Result<Vec<u8>, ExportError> {
    encode(mask.as_raw(), mask.width(), mask.height(), ExtendedColorType::L8)
}

/// Encode a copied-out patch as an RGBA PNG.
///
/// The patch origin is not stored in the file; callers that need to
/// place the patch again keep [`SelectedPixels::origin_x`] and
/// [`SelectedPixels::origin_y`] alongside it.
///
/// # Errors
///
/// Returns [`ExportError::Png`] if encoding fails.
pub fn selected_pixels_to_png(pixels: &SelectedPixels) -> Result<Vec<u8>, ExportError> {
    let image = &pixels.image;
    encode(image.as_raw(), image.width(), image.height(), ExtendedColorType::Rgba8)
}

fn encode(
    data: &[u8],
    width: u32,
    height: u32,
    color: ExtendedColorType,
) -> Result<Vec<u8>, ExportError> {
    let mut png_bytes = Vec::new();
    PngEncoder::new(&mut png_bytes).write_image(data, width, height, color)?;
    Ok(png_bytes)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use marquee_engine::{Dimensions, RgbaImage};

    #[test]
    fn mask_png_decodes_to_same_alpha() {
        let mut mask = MaskBuffer::new(Dimensions::new(12, 7));
        mask.fill_span(3, 2, 9, 255);
        mask.set_alpha(0, 0, 77);

        let bytes = mask_to_png(&mask).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");

        let decoded = image::load_from_memory(&bytes).unwrap().to_luma8();
        assert_eq!(decoded.dimensions(), (12, 7));
        assert_eq!(decoded.as_raw(), mask.as_raw());
    }

    #[test]
    fn patch_png_keeps_rgba() {
        let pixels = SelectedPixels {
            origin_x: 3,
            origin_y: 4,
            image: RgbaImage::from_pixel(5, 2, image::Rgba([1, 2, 3, 128])),
        };
        let bytes = selected_pixels_to_png(&pixels).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (5, 2));
        assert_eq!(decoded.get_pixel(4, 1).0, [1, 2, 3, 128]);
    }
}
