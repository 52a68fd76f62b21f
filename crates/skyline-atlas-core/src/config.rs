use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{AtlasError, Result};
use crate::pow2::checked_pow2;

/// Channel layout of the atlas pixel buffer.
///
/// The discriminant is the number of bytes per pixel.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PixelDepth {
    /// Single channel (glyph coverage / alpha masks).
    Alpha = 1,
    Rgb = 3,
    Rgba = 4,
}

impl PixelDepth {
    /// Bytes per pixel.
    pub fn channels(self) -> usize {
        self as usize
    }
}

impl TryFrom<u32> for PixelDepth {
    type Error = AtlasError;
    fn try_from(depth: u32) -> Result<Self> {
        match depth {
            1 => Ok(Self::Alpha),
            3 => Ok(Self::Rgb),
            4 => Ok(Self::Rgba),
            other => Err(AtlasError::UnsupportedDepth(other)),
        }
    }
}

impl FromStr for PixelDepth {
    type Err = AtlasError;
    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "1" | "alpha" | "a" => Ok(Self::Alpha),
            "3" | "rgb" => Ok(Self::Rgb),
            "4" | "rgba" => Ok(Self::Rgba),
            other => Err(AtlasError::InvalidConfig(format!(
                "unknown pixel depth '{other}' (expected 1|alpha, 3|rgb, 4|rgba)"
            ))),
        }
    }
}

impl fmt::Display for PixelDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Alpha => "alpha",
            Self::Rgb => "rgb",
            Self::Rgba => "rgba",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AtlasConfig {
    /// Atlas width in pixels, including the 1px border.
    pub width: u32,
    /// Atlas height in pixels, including the 1px border.
    pub height: u32,
    #[serde(default = "default_depth")]
    pub depth: PixelDepth,
    /// Round width/height up to the next power of two before building pages.
    #[serde(default)]
    pub power_of_two: bool,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            width: 512,
            height: 512,
            depth: default_depth(),
            power_of_two: false,
        }
    }
}

fn default_depth() -> PixelDepth {
    PixelDepth::Rgba
}

impl AtlasConfig {
    /// Create a fluent builder for `AtlasConfig`.
    pub fn builder() -> AtlasConfigBuilder {
        AtlasConfigBuilder::new()
    }

    /// Page dimensions after applying `power_of_two`.
    ///
    /// Fails with `InvalidDimensions` when rounding up would exceed `u32::MAX`.
    pub fn effective_dimensions(&self) -> Result<(u32, u32)> {
        if !self.power_of_two {
            return Ok((self.width, self.height));
        }
        match (checked_pow2(self.width), checked_pow2(self.height)) {
            (Some(w), Some(h)) => Ok((w, h)),
            _ => Err(AtlasError::InvalidDimensions {
                width: self.width,
                height: self.height,
            }),
        }
    }

    /// Validates the configuration parameters.
    ///
    /// A page needs at least one usable pixel inside the 1px border, so both
    /// dimensions must be 3 or more.
    pub fn validate(&self) -> Result<()> {
        let (width, height) = self.effective_dimensions()?;
        if width < 3 || height < 3 {
            return Err(AtlasError::InvalidDimensions { width, height });
        }
        let bytes = (width as u64)
            .checked_mul(height as u64)
            .and_then(|n| n.checked_mul(self.depth.channels() as u64));
        match bytes {
            Some(n) if n <= isize::MAX as u64 => Ok(()),
            _ => Err(AtlasError::InvalidConfig(format!(
                "pixel buffer for {width}x{height}x{} does not fit in memory",
                self.depth.channels()
            ))),
        }
    }
}

/// Builder for `AtlasConfig`.
#[derive(Debug, Default, Clone)]
pub struct AtlasConfigBuilder {
    cfg: AtlasConfig,
}

impl AtlasConfigBuilder {
    pub fn new() -> Self {
        Self {
            cfg: AtlasConfig::default(),
        }
    }
    pub fn with_dimensions(mut self, w: u32, h: u32) -> Self {
        self.cfg.width = w;
        self.cfg.height = h;
        self
    }
    pub fn depth(mut self, v: PixelDepth) -> Self {
        self.cfg.depth = v;
        self
    }
    pub fn pow2(mut self, v: bool) -> Self {
        self.cfg.power_of_two = v;
        self
    }
    pub fn build(self) -> AtlasConfig {
        self.cfg
    }
}
