use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use image::codecs::png::PngEncoder;
use image::{DynamicImage, ExtendedColorType, GrayAlphaImage, ImageEncoder, RgbImage, RgbaImage};

use crate::config::PixelDepth;
use crate::error::{AtlasError, Result};
use crate::surface::PixelSurface;

/// Converts an image to tightly packed bytes of the given depth.
///
/// Depth 1 keeps coverage: the alpha channel when the image has one,
/// luminance otherwise.
pub fn pixels_from_image(img: &DynamicImage, depth: PixelDepth) -> Vec<u8> {
    match depth {
        PixelDepth::Alpha => {
            if img.color().has_alpha() {
                img.to_rgba8().pixels().map(|p| p[3]).collect()
            } else {
                img.to_luma8().into_raw()
            }
        }
        PixelDepth::Rgb => img.to_rgb8().into_raw(),
        PixelDepth::Rgba => img.to_rgba8().into_raw(),
    }
}

/// Single-channel surfaces become white with the byte as alpha.
fn alpha_to_gray_alpha(pixels: &[u8]) -> Vec<u8> {
    pixels.iter().flat_map(|&a| [255, a]).collect()
}

/// Wraps a copy of the surface pixels in an `image` buffer.
pub fn surface_to_image(surface: &PixelSurface) -> Result<DynamicImage> {
    let (w, h) = (surface.width(), surface.height());
    let bytes = surface.pixels().to_vec();
    let malformed = || AtlasError::Encode(format!("pixel buffer does not match {w}x{h}"));
    let img = match surface.depth() {
        PixelDepth::Alpha => DynamicImage::ImageLumaA8(
            GrayAlphaImage::from_raw(w, h, alpha_to_gray_alpha(&bytes)).ok_or_else(malformed)?,
        ),
        PixelDepth::Rgb => {
            DynamicImage::ImageRgb8(RgbImage::from_raw(w, h, bytes).ok_or_else(malformed)?)
        }
        PixelDepth::Rgba => {
            DynamicImage::ImageRgba8(RgbaImage::from_raw(w, h, bytes).ok_or_else(malformed)?)
        }
    };
    Ok(img)
}

/// Encodes the surface as PNG into `writer`.
pub fn write_png<W: Write>(surface: &PixelSurface, writer: W) -> Result<()> {
    let (w, h) = (surface.width(), surface.height());
    let encoder = PngEncoder::new(writer);
    match surface.depth() {
        PixelDepth::Alpha => {
            let la = alpha_to_gray_alpha(surface.pixels());
            encoder.write_image(&la, w, h, ExtendedColorType::La8)?
        }
        PixelDepth::Rgb => encoder.write_image(surface.pixels(), w, h, ExtendedColorType::Rgb8)?,
        PixelDepth::Rgba => {
            encoder.write_image(surface.pixels(), w, h, ExtendedColorType::Rgba8)?
        }
    }
    Ok(())
}

pub fn save_png(surface: &PixelSurface, path: impl AsRef<Path>) -> Result<()> {
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    write_png(surface, &mut writer)?;
    writer.flush()?;
    Ok(())
}
