//! Skyline Bottom-Left allocator.
//!
//! Based on Jukka Jylänki, "A Thousand Ways to Pack the Bin - A Practical
//! Approach to Two-Dimensional Rectangle Bin Packing" (2010). The skyline is a
//! list of segments sorted by `x` that exactly tiles `[1, width - 1)`; a one
//! pixel border is kept free on every edge so bilinear sampling never picks up
//! a neighbour.

use tracing::debug;

use crate::model::{Node, Region};

/// Width of the reserved frame around the page.
pub const BORDER: u32 = 1;

#[derive(Debug, Clone)]
pub struct SkylineAllocator {
    width: u32,
    height: u32,
    nodes: Vec<Node>,
    regions: Vec<Region>,
    used: u64,
}

impl SkylineAllocator {
    /// # Panics
    ///
    /// When `width` or `height` is below 3; `AtlasConfig::validate` reports
    /// the same condition as an error.
    pub fn new(width: u32, height: u32) -> Self {
        assert!(
            width >= 3 && height >= 3,
            "skyline atlas needs at least 3x3 pixels, got {width}x{height}"
        );
        Self {
            width,
            height,
            nodes: vec![Self::initial_node(width)],
            regions: Vec::new(),
            used: 0,
        }
    }

    fn initial_node(width: u32) -> Node {
        Node::new(BORDER, BORDER, width.saturating_sub(2 * BORDER))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Current skyline, sorted by `x`.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Regions handed out since construction or the last `clear`.
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Total allocated area in pixels.
    pub fn used(&self) -> u64 {
        self.used
    }

    /// Area available inside the border.
    pub fn usable_area(&self) -> u64 {
        let w = self.width.saturating_sub(2 * BORDER) as u64;
        let h = self.height.saturating_sub(2 * BORDER) as u64;
        w * h
    }

    pub fn occupancy(&self) -> f64 {
        let usable = self.usable_area();
        if usable == 0 {
            0.0
        } else {
            self.used as f64 / usable as f64
        }
    }

    /// Drops every allocation. Previously returned regions become invalid.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.nodes.push(Self::initial_node(self.width));
        self.regions.clear();
        self.used = 0;
    }

    /// Reports whether `allocate(w, h)` would succeed, without mutating.
    pub fn can_allocate(&self, w: u32, h: u32) -> bool {
        w > 0 && h > 0 && self.find_bottom_left(w, h).is_some()
    }

    /// Places a `w x h` rectangle, or returns `None` when nothing fits.
    pub fn allocate(&mut self, w: u32, h: u32) -> Option<Region> {
        if w == 0 || h == 0 {
            debug!(w, h, "rejecting empty allocation");
            return None;
        }
        let Some((index, region)) = self.find_bottom_left(w, h) else {
            debug!(w, h, nodes = self.nodes.len(), "atlas full");
            return None;
        };
        self.split(index, &region);
        self.merge();
        self.used += region.area();
        self.regions.push(region);
        Some(region)
    }

    /// Height at which a `w`-wide rectangle rests when its left edge sits on
    /// node `index`: the tallest segment it spans. `None` if it would cross
    /// the right border or the `h`-tall rectangle would cross the bottom one.
    fn fit(&self, index: usize, w: u32, h: u32) -> Option<u32> {
        let node = self.nodes[index];
        if node.x.saturating_add(w) > self.width - BORDER {
            return None;
        }
        let mut y = node.y;
        let mut width_left = w;
        let mut i = index;
        while width_left > 0 {
            let seg = self.nodes.get(i)?;
            y = y.max(seg.y);
            if y.saturating_add(h) > self.height - BORDER {
                return None;
            }
            width_left = width_left.saturating_sub(seg.w);
            i += 1;
        }
        Some(y)
    }

    /// Lowest resulting top edge wins; ties go to the narrower originating
    /// node, then to the first one encountered.
    fn find_bottom_left(&self, w: u32, h: u32) -> Option<(usize, Region)> {
        let mut best_top = u32::MAX;
        let mut best_width = u32::MAX;
        let mut best: Option<(usize, Region)> = None;

        for (i, node) in self.nodes.iter().enumerate() {
            let Some(y) = self.fit(i, w, h) else {
                continue;
            };
            let top = y + h;
            if top < best_top || (top == best_top && node.w < best_width) {
                best_top = top;
                best_width = node.w;
                best = Some((i, Region::new(node.x, y, w, h)));
            }
        }
        best
    }

    /// Raises the skyline over `region` and trims the segments it now covers.
    fn split(&mut self, index: usize, region: &Region) {
        let raised = Node::new(region.x, region.bottom(), region.w);
        debug_assert!(raised.right() <= self.width - BORDER);
        self.nodes.insert(index, raised);

        let i = index + 1;
        while i < self.nodes.len() {
            let prev_right = self.nodes[i - 1].right();
            let curr = self.nodes[i];
            if curr.x >= prev_right {
                break;
            }
            let shrink = prev_right - curr.x;
            if curr.w <= shrink {
                self.nodes.remove(i);
            } else {
                self.nodes[i].x += shrink;
                self.nodes[i].w -= shrink;
                break;
            }
        }
    }

    /// Fuses neighbouring segments of equal height.
    fn merge(&mut self) {
        let mut i = 1;
        while i < self.nodes.len() {
            if self.nodes[i - 1].y == self.nodes[i].y {
                let w = self.nodes[i].w;
                self.nodes[i - 1].w += w;
                self.nodes.remove(i);
            } else {
                i += 1;
            }
        }
    }
}
