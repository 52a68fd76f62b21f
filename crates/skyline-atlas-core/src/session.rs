use std::collections::HashMap;

use image::DynamicImage;
use tracing::{debug, instrument};

use crate::config::{AtlasConfig, PixelDepth};
use crate::error::{AtlasError, Result};
use crate::imaging::pixels_from_image;
use crate::model::{AtlasSnapshot, NamedRegion, Region, SessionStats};
use crate::page::AtlasPage;

/// Keyed packing across as many pages as needed.
///
/// Every page is an independent skyline atlas built from the same config.
/// When no existing page can take a rectangle a new page is opened; only a
/// rectangle that would not fit an empty page is an error.
pub struct AtlasSession {
    cfg: AtlasConfig,
    pages: Vec<AtlasPage>,
    entries: HashMap<String, (usize, Region)>,
    // insertion order for stable snapshots
    order: Vec<String>,
}

impl AtlasSession {
    pub fn new(cfg: AtlasConfig) -> Result<Self> {
        cfg.validate()?;
        Ok(Self {
            cfg,
            pages: Vec::new(),
            entries: HashMap::new(),
            order: Vec::new(),
        })
    }

    pub fn config(&self) -> &AtlasConfig {
        &self.cfg
    }

    pub fn depth(&self) -> PixelDepth {
        self.cfg.depth
    }

    /// Reserves a `w x h` region for `key`. Returns `(page_id, region)`.
    pub fn append(&mut self, key: String, w: u32, h: u32) -> Result<(usize, Region)> {
        if self.entries.contains_key(&key) {
            return Err(AtlasError::DuplicateKey(key));
        }
        if w == 0 || h == 0 {
            return Err(AtlasError::InvalidInput(format!(
                "'{key}' has an empty size {w}x{h}"
            )));
        }
        let (page_id, region) = self.place(w, h)?;
        self.entries.insert(key.clone(), (page_id, region));
        self.order.push(key);
        Ok((page_id, region))
    }

    /// Reserves a region and copies `src` (rows `stride` bytes apart) into it.
    pub fn append_pixels(
        &mut self,
        key: String,
        w: u32,
        h: u32,
        src: &[u8],
        stride: usize,
    ) -> Result<(usize, Region)> {
        let row_bytes = w as usize * self.cfg.depth.channels();
        if stride < row_bytes {
            return Err(AtlasError::InvalidStride { stride, row_bytes });
        }
        let needed = (h as usize).saturating_sub(1) * stride + row_bytes;
        if src.len() < needed {
            return Err(AtlasError::SourceTooShort {
                needed,
                actual: src.len(),
            });
        }
        let (page_id, region) = self.append(key, w, h)?;
        self.pages[page_id].set(&region, src, stride)?;
        Ok((page_id, region))
    }

    /// Converts `image` to the session depth and packs it under `key`.
    #[instrument(skip_all, fields(key = %key))]
    pub fn append_image(&mut self, key: String, image: &DynamicImage) -> Result<(usize, Region)> {
        let (w, h) = (image.width(), image.height());
        let bytes = pixels_from_image(image, self.cfg.depth);
        let stride = w as usize * self.cfg.depth.channels();
        self.append_pixels(key, w, h, &bytes, stride)
    }

    fn place(&mut self, w: u32, h: u32) -> Result<(usize, Region)> {
        for (id, page) in self.pages.iter_mut().enumerate() {
            if let Some(region) = page.allocate(w, h) {
                return Ok((id, region));
            }
        }
        let mut page = AtlasPage::from_config(&self.cfg)?;
        let Some(region) = page.allocate(w, h) else {
            return Err(AtlasError::OutOfSpace { w, h });
        };
        let id = self.pages.len();
        debug!(id, width = page.width(), height = page.height(), "opened atlas page");
        self.pages.push(page);
        Ok((id, region))
    }

    pub fn get(&self, key: &str) -> Option<(usize, Region)> {
        self.entries.get(key).copied()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> Vec<&str> {
        self.order.iter().map(String::as_str).collect()
    }

    pub fn texture_count(&self) -> usize {
        self.entries.len()
    }

    pub fn num_pages(&self) -> usize {
        self.pages.len()
    }

    pub fn page(&self, id: usize) -> Option<&AtlasPage> {
        self.pages.get(id)
    }

    pub fn pages(&self) -> &[AtlasPage] {
        &self.pages
    }

    /// Drops every page and key.
    pub fn clear(&mut self) {
        self.pages.clear();
        self.entries.clear();
        self.order.clear();
    }

    pub fn stats(&self) -> SessionStats {
        let total_usable_area: u64 = self.pages.iter().map(|p| p.stats().usable_area).sum();
        let used_area: u64 = self.pages.iter().map(|p| p.used()).sum();
        let occupancy = if total_usable_area > 0 {
            used_area as f64 / total_usable_area as f64
        } else {
            0.0
        };
        SessionStats {
            num_pages: self.pages.len(),
            num_regions: self.entries.len(),
            total_usable_area,
            used_area,
            occupancy,
        }
    }

    pub fn snapshot(&self) -> Vec<AtlasSnapshot> {
        let mut snaps: Vec<AtlasSnapshot> = self
            .pages
            .iter()
            .enumerate()
            .map(|(id, p)| AtlasSnapshot {
                id,
                width: p.width(),
                height: p.height(),
                depth: p.depth(),
                used: p.used(),
                regions: Vec::new(),
            })
            .collect();
        for key in &self.order {
            if let Some(&(page_id, region)) = self.entries.get(key) {
                snaps[page_id].regions.push(NamedRegion {
                    key: key.clone(),
                    region,
                });
            }
        }
        snaps
    }
}
