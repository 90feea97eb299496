use crate::config::CacheConfig;
use crate::foundation::core::PixelSize;
use serde::{Deserialize, Serialize};

/// Resolution cached frames are kept at, relative to the scene's frame size.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameCacheScale {
    /// Scene resolution.
    #[default]
    Full,
    /// Half width and height.
    Half,
    /// Quarter width and height.
    Quarter,
}

impl FrameCacheScale {
    /// Integer divisor applied to each dimension.
    pub fn divisor(self) -> u32 {
        match self {
            Self::Full => 1,
            Self::Half => 2,
            Self::Quarter => 4,
        }
    }

    /// Scaled size; each dimension is at least one pixel.
    pub fn apply(self, size: PixelSize) -> PixelSize {
        let d = self.divisor();
        PixelSize::new((size.width / d).max(1), (size.height / d).max(1))
    }
}

/// Pixel format cached frames are stored in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameCacheColorType {
    /// Premultiplied RGBA, 8 bits per channel.
    #[default]
    Rgba8888,
    /// Opaque 5-6-5 RGB, half the memory of [`FrameCacheColorType::Rgba8888`].
    Rgb565,
}

impl FrameCacheColorType {
    /// Stored bytes per pixel.
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Rgba8888 => 4,
            Self::Rgb565 => 2,
        }
    }
}

/// How frames are stored. Frames stored under one value cannot be served under another.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameCacheOptions {
    /// Stored resolution.
    pub scale: FrameCacheScale,
    /// Stored pixel format.
    pub color_type: FrameCacheColorType,
}

impl FrameCacheOptions {
    /// Derive options from the application configuration.
    pub fn from_config(config: &CacheConfig) -> Self {
        Self {
            scale: config.frame_cache_scale,
            color_type: config.frame_cache_color_type,
        }
    }

    /// Size of a stored frame for a scene of `frame_size`.
    pub fn output_size(&self, frame_size: PixelSize) -> PixelSize {
        self.scale.apply(frame_size)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/frame_cache/options.rs"]
mod tests;
