use tracing::trace;

use crate::config::PixelDepth;
use crate::error::{AtlasError, Result};
use crate::model::Region;

/// Flat, row-major pixel buffer mirroring the packed atlas.
///
/// `depth` bytes per pixel; the buffer is `width * height * depth` long and
/// starts zeroed.
#[derive(Debug, Clone)]
pub struct PixelSurface {
    width: u32,
    height: u32,
    depth: PixelDepth,
    pixels: Vec<u8>,
}

impl PixelSurface {
    pub fn new(width: u32, height: u32, depth: PixelDepth) -> Self {
        let len = width as usize * height as usize * depth.channels();
        Self {
            width,
            height,
            depth,
            pixels: vec![0; len],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn depth(&self) -> PixelDepth {
        self.depth
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    /// Bytes in one full atlas row.
    pub fn row_bytes(&self) -> usize {
        self.width as usize * self.depth.channels()
    }

    pub fn clear(&mut self) {
        trace!(bytes = self.pixels.len(), "zeroing pixel surface");
        self.pixels.fill(0);
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * self.depth.channels()
    }

    fn check_region(&self, region: &Region) -> Result<()> {
        let inside = region.x.checked_add(region.w).is_some_and(|r| r <= self.width)
            && region.y.checked_add(region.h).is_some_and(|b| b <= self.height);
        if inside {
            Ok(())
        } else {
            Err(AtlasError::RegionOutOfBounds {
                region: *region,
                width: self.width,
                height: self.height,
            })
        }
    }

    /// Copies `region.h` rows of `src` into the buffer at `region`.
    ///
    /// `stride` is the byte distance between consecutive source rows; each row
    /// contributes its first `region.w * depth` bytes. Nothing is written when
    /// the region, stride or source length is inconsistent.
    pub fn set(&mut self, region: &Region, src: &[u8], stride: usize) -> Result<()> {
        self.check_region(region)?;
        if region.is_empty() {
            return Ok(());
        }
        let row_bytes = region.w as usize * self.depth.channels();
        if stride < row_bytes {
            return Err(AtlasError::InvalidStride { stride, row_bytes });
        }
        let needed = (region.h as usize - 1) * stride + row_bytes;
        if src.len() < needed {
            return Err(AtlasError::SourceTooShort {
                needed,
                actual: src.len(),
            });
        }

        for row in 0..region.h {
            let dst = self.offset(region.x, region.y + row);
            let sp = row as usize * stride;
            self.pixels[dst..dst + row_bytes].copy_from_slice(&src[sp..sp + row_bytes]);
        }
        Ok(())
    }

    /// Returns the tightly packed bytes of `region` (stride `region.w * depth`).
    pub fn read_region(&self, region: &Region) -> Result<Vec<u8>> {
        self.check_region(region)?;
        let row_bytes = region.w as usize * self.depth.channels();
        let mut out = Vec::with_capacity(row_bytes * region.h as usize);
        for row in 0..region.h {
            let sp = self.offset(region.x, region.y + row);
            out.extend_from_slice(&self.pixels[sp..sp + row_bytes]);
        }
        Ok(out)
    }
}
