use image::{DynamicImage, GenericImage, ImageBuffer, ImageResult, Pixel};

use crate::error::{AtlasError, Result};

/// Smallest power of two `>= n`. `pow2(0) == 1`.
///
/// Panics when the result exceeds `u32::MAX` (`n > 2^31`); see [`checked_pow2`].
pub fn pow2(n: u32) -> u32 {
    n.next_power_of_two()
}

/// Like [`pow2`], but `None` when the result does not fit in a `u32`.
pub fn checked_pow2(n: u32) -> Option<u32> {
    n.checked_next_power_of_two()
}

/// `0` is not a power of two.
pub fn is_pow2(n: u32) -> bool {
    n.is_power_of_two()
}

/// Pads `src` to power-of-two dimensions, keeping its pixel format and
/// placing the original content at the top-left. Returns a clone when the
/// dimensions already qualify.
pub fn pow2_image(src: &DynamicImage) -> Result<DynamicImage> {
    let (w, h) = (src.width(), src.height());
    if is_pow2(w) && is_pow2(h) {
        return Ok(src.clone());
    }
    let (Some(pw), Some(ph)) = (checked_pow2(w), checked_pow2(h)) else {
        return Err(AtlasError::InvalidDimensions {
            width: w,
            height: h,
        });
    };

    let out = match src {
        DynamicImage::ImageLuma8(img) => DynamicImage::ImageLuma8(pad_to(img, pw, ph)?),
        DynamicImage::ImageLumaA8(img) => DynamicImage::ImageLumaA8(pad_to(img, pw, ph)?),
        DynamicImage::ImageRgb8(img) => DynamicImage::ImageRgb8(pad_to(img, pw, ph)?),
        DynamicImage::ImageRgba8(img) => DynamicImage::ImageRgba8(pad_to(img, pw, ph)?),
        DynamicImage::ImageLuma16(img) => DynamicImage::ImageLuma16(pad_to(img, pw, ph)?),
        DynamicImage::ImageLumaA16(img) => DynamicImage::ImageLumaA16(pad_to(img, pw, ph)?),
        DynamicImage::ImageRgb16(img) => DynamicImage::ImageRgb16(pad_to(img, pw, ph)?),
        DynamicImage::ImageRgba16(img) => DynamicImage::ImageRgba16(pad_to(img, pw, ph)?),
        DynamicImage::ImageRgb32F(img) => DynamicImage::ImageRgb32F(pad_to(img, pw, ph)?),
        DynamicImage::ImageRgba32F(img) => DynamicImage::ImageRgba32F(pad_to(img, pw, ph)?),
        other => DynamicImage::ImageRgba8(pad_to(&other.to_rgba8(), pw, ph)?),
    };
    Ok(out)
}

fn pad_to<P: Pixel>(
    img: &ImageBuffer<P, Vec<P::Subpixel>>,
    width: u32,
    height: u32,
) -> ImageResult<ImageBuffer<P, Vec<P::Subpixel>>> {
    let mut dst = ImageBuffer::new(width, height);
    dst.copy_from(img, 0, 0)?;
    Ok(dst)
}
