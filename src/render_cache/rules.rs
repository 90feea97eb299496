use crate::config::CacheConfig;
use crate::foundation::core::PixelSize;
use serde::{Deserialize, Serialize};

/// Size admissibility for node caches.
///
/// A candidate surface is admissible when it fits within the max bounds **or** reaches the min
/// bounds. Either branch alone admits the size, so "only small", "only large", or both can be
/// expressed with one value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RenderCacheRules {
    /// Largest admissible width on the max branch (inclusive).
    pub max_width: u32,
    /// Largest admissible height on the max branch (inclusive).
    pub max_height: u32,
    /// Smallest admissible width on the min branch (inclusive).
    pub min_width: u32,
    /// Smallest admissible height on the min branch (inclusive).
    pub min_height: u32,
}

impl Default for RenderCacheRules {
    fn default() -> Self {
        Self {
            max_width: u32::MAX,
            max_height: u32::MAX,
            min_width: 0,
            min_height: 0,
        }
    }
}

impl RenderCacheRules {
    /// Admit only sizes up to `max_width x max_height`.
    pub fn max_only(max_width: u32, max_height: u32) -> Self {
        Self {
            max_width,
            max_height,
            min_width: u32::MAX,
            min_height: u32::MAX,
        }
    }

    /// Admit only sizes of at least `min_width x min_height`.
    pub fn min_only(min_width: u32, min_height: u32) -> Self {
        Self {
            max_width: 0,
            max_height: 0,
            min_width,
            min_height,
        }
    }

    /// Return `true` when `size` is admissible.
    pub fn matches(&self, size: PixelSize) -> bool {
        (size.width <= self.max_width && size.height <= self.max_height)
            || (size.width >= self.min_width && size.height >= self.min_height)
    }
}

/// Node cache configuration pushed by the application.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderCacheOptions {
    /// Master switch for node caching.
    pub enabled: bool,
    /// Size admissibility.
    pub rules: RenderCacheRules,
}

impl Default for RenderCacheOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            rules: RenderCacheRules::default(),
        }
    }
}

impl RenderCacheOptions {
    /// Options with caching switched off.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Derive options from the application configuration.
    pub fn from_config(config: &CacheConfig) -> Self {
        Self {
            enabled: config.node_cache_enabled,
            rules: RenderCacheRules {
                max_width: config.node_cache_max_pixels,
                max_height: config.node_cache_max_pixels,
                min_width: config.node_cache_min_pixels,
                min_height: config.node_cache_min_pixels,
            },
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render_cache/rules.rs"]
mod tests;
