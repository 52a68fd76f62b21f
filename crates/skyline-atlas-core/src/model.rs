use serde::{Deserialize, Serialize};

use crate::config::PixelDepth;

/// One skyline segment: the span `[x, x + w)` is free from `y` upward.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Node {
    pub x: u32,
    pub y: u32,
    pub w: u32,
}

impl Node {
    pub fn new(x: u32, y: u32, w: u32) -> Self {
        Self { x, y, w }
    }
    /// Exclusive right edge.
    #[inline]
    pub fn right(&self) -> u32 {
        self.x + self.w
    }
}

/// An allocated rectangle in atlas pixel coordinates. `x,y` is top-left.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Region {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }
    /// Exclusive right edge (`x + w`).
    pub fn right(&self) -> u32 {
        self.x + self.w
    }
    /// Exclusive bottom edge (`y + h`).
    pub fn bottom(&self) -> u32 {
        self.y + self.h
    }
    pub fn area(&self) -> u64 {
        (self.w as u64) * (self.h as u64)
    }
    pub fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }
    /// True if the two rectangles share at least one pixel.
    pub fn intersects(&self, other: &Region) -> bool {
        !(self.x >= other.right()
            || other.x >= self.right()
            || self.y >= other.bottom()
            || other.y >= self.bottom())
    }
    /// Normalised texture coordinates `[u0, v0, u1, v1]` for an atlas of the given size.
    pub fn tex_coords(&self, atlas_width: u32, atlas_height: u32) -> [f32; 4] {
        let aw = atlas_width.max(1) as f32;
        let ah = atlas_height.max(1) as f32;
        [
            self.x as f32 / aw,
            self.y as f32 / ah,
            self.right() as f32 / aw,
            self.bottom() as f32 / ah,
        ]
    }
}

/// A region tagged with the caller's key, as recorded by a session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NamedRegion {
    pub key: String,
    pub region: Region,
}

/// Fill statistics for a single atlas page.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AtlasStats {
    pub width: u32,
    pub height: u32,
    pub depth: PixelDepth,
    /// Regions handed out since the last clear.
    pub num_regions: usize,
    /// Current skyline segment count.
    pub num_nodes: usize,
    pub used_area: u64,
    /// Area inside the 1px border.
    pub usable_area: u64,
    /// used_area / usable_area (0.0 to 1.0).
    pub occupancy: f64,
}

impl AtlasStats {
    pub fn wasted_area(&self) -> u64 {
        self.usable_area.saturating_sub(self.used_area)
    }

    /// Returns a human-readable summary of the statistics.
    pub fn summary(&self) -> String {
        format!(
            "{}x{} {}: {} regions, {} skyline nodes, Occupancy: {:.2}%, Used: {} px², Free: {} px²",
            self.width,
            self.height,
            self.depth,
            self.num_regions,
            self.num_nodes,
            self.occupancy * 100.0,
            self.used_area,
            self.wasted_area(),
        )
    }
}

/// Aggregated statistics across all pages of a session.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SessionStats {
    pub num_pages: usize,
    pub num_regions: usize,
    pub total_usable_area: u64,
    pub used_area: u64,
    pub occupancy: f64,
}

impl SessionStats {
    pub fn summary(&self) -> String {
        format!(
            "Pages: {}, Regions: {}, Occupancy: {:.2}%, Used Area: {} px², Usable Area: {} px²",
            self.num_pages,
            self.num_regions,
            self.occupancy * 100.0,
            self.used_area,
            self.total_usable_area,
        )
    }
}

/// Serializable record of one page's layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AtlasSnapshot {
    pub id: usize,
    pub width: u32,
    pub height: u32,
    pub depth: PixelDepth,
    pub used: u64,
    pub regions: Vec<NamedRegion>,
}

/// Metadata written next to exported pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AtlasMeta {
    /// Schema version of the JSON layout; current: "1".
    pub schema_version: String,
    pub app: String,
    pub version: String,
    pub format: String,
    pub power_of_two: bool,
}

impl AtlasMeta {
    pub fn new(depth: PixelDepth, power_of_two: bool) -> Self {
        let format = match depth {
            PixelDepth::Alpha => "A8",
            PixelDepth::Rgb => "RGB888",
            PixelDepth::Rgba => "RGBA8888",
        };
        Self {
            schema_version: "1".into(),
            app: "skyline-atlas".into(),
            version: env!("CARGO_PKG_VERSION").into(),
            format: format.into(),
            power_of_two,
        }
    }
}
