use tracing::debug;

use crate::backend::{HeadlessBackend, SurfaceBackend, SurfaceHandle};
use crate::config::{AtlasConfig, PixelDepth};
use crate::error::Result;
use crate::model::{AtlasStats, Node, Region};
use crate::page::AtlasPage;
use crate::surface::PixelSurface;

/// Texture atlas backed by a rendering-backend surface.
///
/// Pack small images with [`allocate`](Self::allocate) + [`set`](Self::set),
/// then [`commit`](Self::commit) the pixels to the backend. The surface handle
/// is released exactly once, by [`release`](Self::release) or on drop.
pub struct TextureAtlas<B: SurfaceBackend = HeadlessBackend> {
    page: AtlasPage,
    backend: B,
    handle: SurfaceHandle,
    released: bool,
}

impl<B: SurfaceBackend> TextureAtlas<B> {
    pub fn new(cfg: AtlasConfig, mut backend: B) -> Result<Self> {
        let page = AtlasPage::from_config(&cfg)?;
        let handle = backend.create_surface(page.width(), page.height(), page.depth());
        debug!(
            width = page.width(),
            height = page.height(),
            depth = %page.depth(),
            ?handle,
            "texture atlas created"
        );
        Ok(Self {
            page,
            backend,
            handle,
            released: false,
        })
    }

    /// Returns `None` when the rectangle does not fit; start another atlas then.
    pub fn allocate(&mut self, w: u32, h: u32) -> Option<Region> {
        self.page.allocate(w, h)
    }

    pub fn can_allocate(&self, w: u32, h: u32) -> bool {
        self.page.can_allocate(w, h)
    }

    /// Copies a sub-image into the pixel buffer at `region`.
    pub fn set(&mut self, region: &Region, src: &[u8], stride: usize) -> Result<()> {
        self.page.set(region, src, stride)
    }

    /// Removes all regions and zeroes the pixels. Previously returned
    /// regions must not be reused.
    pub fn clear(&mut self) {
        self.page.clear();
    }

    /// Uploads the pixel buffer to the backend surface.
    pub fn commit(&mut self) {
        let page = &self.page;
        self.backend.upload(
            self.handle,
            page.pixels(),
            page.width(),
            page.height(),
            page.depth(),
        );
    }

    pub fn bind(&mut self) {
        self.backend.bind(self.handle);
    }

    /// Unbinds the current surface. Backends may unbind whatever is bound,
    /// not necessarily this atlas.
    pub fn unbind(&mut self) {
        self.backend.unbind(self.handle);
    }

    /// Releases the backend surface and drops the pixel buffer.
    pub fn release(mut self) {
        self.release_surface();
    }

    fn release_surface(&mut self) {
        if !self.released {
            self.released = true;
            debug!(handle = ?self.handle, "releasing atlas surface");
            self.backend.release_surface(self.handle);
        }
    }

    pub fn handle(&self) -> SurfaceHandle {
        self.handle
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn page(&self) -> &AtlasPage {
        &self.page
    }

    pub fn surface(&self) -> &PixelSurface {
        self.page.surface()
    }

    pub fn pixels(&self) -> &[u8] {
        self.page.pixels()
    }

    pub fn width(&self) -> u32 {
        self.page.width()
    }

    pub fn height(&self) -> u32 {
        self.page.height()
    }

    pub fn depth(&self) -> PixelDepth {
        self.page.depth()
    }

    pub fn used(&self) -> u64 {
        self.page.used()
    }

    pub fn nodes(&self) -> &[Node] {
        self.page.nodes()
    }

    pub fn regions(&self) -> &[Region] {
        self.page.regions()
    }

    pub fn stats(&self) -> AtlasStats {
        self.page.stats()
    }
}

impl<B: SurfaceBackend> Drop for TextureAtlas<B> {
    fn drop(&mut self) {
        self.release_surface();
    }
}
