//! Texture atlas packing with an incremental Skyline Bottom-Left allocator.
//!
//! - Allocator: `SkylineAllocator` keeps the skyline and hands out `Region`s
//! - Pixels: `PixelSurface` mirrors the atlas as one flat `width * height * depth` buffer
//! - `TextureAtlas` pairs both with a rendering-backend surface (`SurfaceBackend`)
//! - `AtlasSession` opens further pages when one fills up
//! - PNG and JSON export helpers for diagnostics and engine pipelines
//!
//! Quick example:
//! ```
//! use skyline_atlas_core::prelude::*;
//! # fn main() -> skyline_atlas_core::Result<()> {
//! let cfg = AtlasConfig::builder()
//!     .with_dimensions(64, 64)
//!     .depth(PixelDepth::Alpha)
//!     .build();
//! let mut atlas = TextureAtlas::new(cfg, HeadlessBackend::new())?;
//! let glyph = [255u8; 8 * 8];
//! if let Some(region) = atlas.allocate(8, 8) {
//!     atlas.set(&region, &glyph, 8)?;
//! }
//! atlas.commit();
//! # Ok(()) }
//! ```

pub mod atlas;
pub mod backend;
pub mod config;
pub mod element;
pub mod error;
pub mod export;
pub mod imaging;
pub mod model;
pub mod page;
pub mod pow2;
pub mod session;
pub mod skyline;
pub mod surface;

pub use atlas::*;
pub use backend::*;
pub use config::*;
pub use error::*;
pub use export::*;
pub use imaging::*;
pub use model::*;
pub use page::*;
pub use pow2::*;
pub use session::*;
pub use skyline::*;
pub use surface::*;

/// Convenience prelude for common types and functions.
/// Importing `skyline_atlas_core::prelude::*` brings the primary APIs into scope.
pub mod prelude {
    pub use crate::atlas::TextureAtlas;
    pub use crate::backend::{HeadlessBackend, SurfaceBackend, SurfaceCache, SurfaceHandle};
    pub use crate::config::{AtlasConfig, AtlasConfigBuilder, PixelDepth};
    pub use crate::element::{ElementBuffer, ElementKind};
    pub use crate::model::{
        AtlasMeta, AtlasSnapshot, AtlasStats, NamedRegion, Node, Region, SessionStats,
    };
    pub use crate::page::AtlasPage;
    pub use crate::session::AtlasSession;
    pub use crate::skyline::SkylineAllocator;
    pub use crate::surface::PixelSurface;
}
