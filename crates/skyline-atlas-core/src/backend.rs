//! Boundary to the rendering backend that owns the real texture objects.
//!
//! The atlas core only asks a backend for a fresh handle when it is built,
//! hands it pixels on `commit`, and gives the handle back exactly once.

use std::collections::HashMap;

use tracing::debug;

use crate::config::PixelDepth;

/// Opaque identifier of a backend surface (e.g. a GPU texture name).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceHandle(pub u64);

pub trait SurfaceBackend {
    fn create_surface(&mut self, width: u32, height: u32, depth: PixelDepth) -> SurfaceHandle;
    /// Replaces the surface contents with `pixels` (`width * height * depth` bytes).
    fn upload(
        &mut self,
        handle: SurfaceHandle,
        pixels: &[u8],
        width: u32,
        height: u32,
        depth: PixelDepth,
    );
    fn bind(&mut self, handle: SurfaceHandle);
    fn unbind(&mut self, handle: SurfaceHandle);
    fn release_surface(&mut self, handle: SurfaceHandle);
}

impl<B: SurfaceBackend + ?Sized> SurfaceBackend for &mut B {
    fn create_surface(&mut self, width: u32, height: u32, depth: PixelDepth) -> SurfaceHandle {
        (**self).create_surface(width, height, depth)
    }
    fn upload(
        &mut self,
        handle: SurfaceHandle,
        pixels: &[u8],
        width: u32,
        height: u32,
        depth: PixelDepth,
    ) {
        (**self).upload(handle, pixels, width, height, depth)
    }
    fn bind(&mut self, handle: SurfaceHandle) {
        (**self).bind(handle)
    }
    fn unbind(&mut self, handle: SurfaceHandle) {
        (**self).unbind(handle)
    }
    fn release_surface(&mut self, handle: SurfaceHandle) {
        (**self).release_surface(handle)
    }
}

/// Contents of a headless surface.
#[derive(Debug, Clone)]
pub struct HeadlessSurface {
    pub width: u32,
    pub height: u32,
    pub depth: PixelDepth,
    /// Last uploaded pixels; empty until the first upload.
    pub pixels: Vec<u8>,
    pub uploads: usize,
}

/// In-memory backend. Keeps a copy of every upload so tools and tests can
/// inspect what a real renderer would have received.
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    next_id: u64,
    surfaces: HashMap<SurfaceHandle, HeadlessSurface>,
    bound: Option<SurfaceHandle>,
    released: usize,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn surface(&self, handle: SurfaceHandle) -> Option<&HeadlessSurface> {
        self.surfaces.get(&handle)
    }

    /// Handles created and not yet released.
    pub fn live_surfaces(&self) -> usize {
        self.surfaces.len()
    }

    pub fn released_surfaces(&self) -> usize {
        self.released
    }

    pub fn bound(&self) -> Option<SurfaceHandle> {
        self.bound
    }
}

impl SurfaceBackend for HeadlessBackend {
    fn create_surface(&mut self, width: u32, height: u32, depth: PixelDepth) -> SurfaceHandle {
        self.next_id += 1;
        let handle = SurfaceHandle(self.next_id);
        self.surfaces.insert(
            handle,
            HeadlessSurface {
                width,
                height,
                depth,
                pixels: Vec::new(),
                uploads: 0,
            },
        );
        handle
    }

    fn upload(
        &mut self,
        handle: SurfaceHandle,
        pixels: &[u8],
        width: u32,
        height: u32,
        depth: PixelDepth,
    ) {
        if let Some(s) = self.surfaces.get_mut(&handle) {
            s.width = width;
            s.height = height;
            s.depth = depth;
            s.pixels.clear();
            s.pixels.extend_from_slice(pixels);
            s.uploads += 1;
        }
    }

    fn bind(&mut self, handle: SurfaceHandle) {
        self.bound = Some(handle);
    }

    fn unbind(&mut self, _handle: SurfaceHandle) {
        // Like the GL call it stands in for, this clears whatever is bound.
        self.bound = None;
    }

    fn release_surface(&mut self, handle: SurfaceHandle) {
        assert!(
            self.surfaces.remove(&handle).is_some(),
            "surface {handle:?} released twice or never created"
        );
        if self.bound == Some(handle) {
            self.bound = None;
        }
        self.released += 1;
    }
}

/// One backend surface per distinct `(width, height, depth)`, created on
/// first use.
///
/// Owned by the caller; nothing is shared process-wide. Call `release_all`
/// with the same backend before dropping it.
#[derive(Debug, Default)]
pub struct SurfaceCache {
    entries: HashMap<(u32, u32, PixelDepth), SurfaceHandle>,
}

impl SurfaceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_create<B: SurfaceBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        width: u32,
        height: u32,
        depth: PixelDepth,
    ) -> SurfaceHandle {
        *self.entries.entry((width, height, depth)).or_insert_with(|| {
            debug!(width, height, %depth, "creating cached surface");
            backend.create_surface(width, height, depth)
        })
    }

    pub fn get(&self, width: u32, height: u32, depth: PixelDepth) -> Option<SurfaceHandle> {
        self.entries.get(&(width, height, depth)).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Releases every cached surface; returns how many were released.
    pub fn release_all<B: SurfaceBackend + ?Sized>(&mut self, backend: &mut B) -> usize {
        let n = self.entries.len();
        for (_, handle) in self.entries.drain() {
            backend.release_surface(handle);
        }
        n
    }
}
