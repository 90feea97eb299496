//! Application-level cache configuration.
//!
//! Neither cache reads this directly: [`crate::RenderCacheOptions::from_config`] and
//! [`crate::FrameCacheOptions::from_config`] derive the values each cache works with, and
//! [`crate::Composer::apply_config`] pushes them whenever the configuration changes.

use crate::foundation::error::{CacheError, CacheResult};
use crate::frame_cache::options::{FrameCacheColorType, FrameCacheScale};
use crate::render::surface::DEFAULT_MAX_SURFACE_BYTES;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Cache settings. Every field has a default, so a partial JSON object is valid.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    /// Enable per-node render caching.
    pub node_cache_enabled: bool,
    /// Max branch of the size rules, applied to both dimensions.
    pub node_cache_max_pixels: u32,
    /// Min branch of the size rules, applied to both dimensions.
    pub node_cache_min_pixels: u32,
    /// Enable whole-frame caching.
    pub frame_cache_enabled: bool,
    /// Resolution cached frames are stored at.
    pub frame_cache_scale: FrameCacheScale,
    /// Pixel format cached frames are stored in.
    pub frame_cache_color_type: FrameCacheColorType,
    /// Largest single surface the renderer may allocate.
    pub max_surface_bytes: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            node_cache_enabled: true,
            node_cache_max_pixels: u32::MAX,
            node_cache_min_pixels: 0,
            frame_cache_enabled: true,
            frame_cache_scale: FrameCacheScale::Full,
            frame_cache_color_type: FrameCacheColorType::Rgba8888,
            max_surface_bytes: DEFAULT_MAX_SURFACE_BYTES,
        }
    }
}

impl CacheConfig {
    /// Parse a configuration from a JSON reader and validate it.
    pub fn from_reader<R: std::io::Read>(r: R) -> CacheResult<Self> {
        let config: Self = serde_json::from_reader(r)
            .map_err(|e| CacheError::serde(format!("parse cache config JSON: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a configuration from a JSON file on disk and validate it.
    pub fn from_path(path: impl AsRef<Path>) -> CacheResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            CacheError::validation(format!("open cache config '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Reject values no cache can work with.
    ///
    /// Overlapping size rule branches are accepted; the rules are an inclusive OR.
    pub fn validate(&self) -> CacheResult<()> {
        if self.max_surface_bytes < 4 {
            return Err(CacheError::validation(
                "max_surface_bytes must allow at least one pixel",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
