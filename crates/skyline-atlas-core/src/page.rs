use crate::config::{AtlasConfig, PixelDepth};
use crate::error::Result;
use crate::model::{AtlasStats, Node, Region};
use crate::skyline::SkylineAllocator;
use crate::surface::PixelSurface;

/// A skyline allocator and the pixel surface it describes.
///
/// Both halves are indexed by the same `width`/`height`; the allocator never
/// reads pixels and `set` never consults the skyline.
#[derive(Debug, Clone)]
pub struct AtlasPage {
    allocator: SkylineAllocator,
    surface: PixelSurface,
}

impl AtlasPage {
    /// Fails on an unsupported depth or dimensions below 3x3.
    pub fn new(width: u32, height: u32, depth: u32) -> Result<Self> {
        let depth = PixelDepth::try_from(depth)?;
        Self::from_config(&AtlasConfig {
            width,
            height,
            depth,
            power_of_two: false,
        })
    }

    pub fn from_config(cfg: &AtlasConfig) -> Result<Self> {
        cfg.validate()?;
        let (width, height) = cfg.effective_dimensions()?;
        Ok(Self {
            allocator: SkylineAllocator::new(width, height),
            surface: PixelSurface::new(width, height, cfg.depth),
        })
    }

    pub fn allocate(&mut self, w: u32, h: u32) -> Option<Region> {
        self.allocator.allocate(w, h)
    }

    pub fn can_allocate(&self, w: u32, h: u32) -> bool {
        self.allocator.can_allocate(w, h)
    }

    pub fn set(&mut self, region: &Region, src: &[u8], stride: usize) -> Result<()> {
        self.surface.set(region, src, stride)
    }

    /// Resets the skyline and zero-fills the pixels.
    pub fn clear(&mut self) {
        self.allocator.clear();
        self.surface.clear();
    }

    pub fn width(&self) -> u32 {
        self.surface.width()
    }

    pub fn height(&self) -> u32 {
        self.surface.height()
    }

    pub fn depth(&self) -> PixelDepth {
        self.surface.depth()
    }

    pub fn used(&self) -> u64 {
        self.allocator.used()
    }

    pub fn nodes(&self) -> &[Node] {
        self.allocator.nodes()
    }

    pub fn regions(&self) -> &[Region] {
        self.allocator.regions()
    }

    pub fn pixels(&self) -> &[u8] {
        self.surface.pixels()
    }

    pub fn surface(&self) -> &PixelSurface {
        &self.surface
    }

    pub fn allocator(&self) -> &SkylineAllocator {
        &self.allocator
    }

    pub fn stats(&self) -> AtlasStats {
        AtlasStats {
            width: self.width(),
            height: self.height(),
            depth: self.depth(),
            num_regions: self.allocator.regions().len(),
            num_nodes: self.allocator.nodes().len(),
            used_area: self.allocator.used(),
            usable_area: self.allocator.usable_area(),
            occupancy: self.allocator.occupancy(),
        }
    }
}
