use crate::foundation::core::{PixelSize, Rect};
use crate::foundation::error::{CacheError, CacheResult};
use crate::render::surface::Surface;
use crate::render_cache::rules::RenderCacheRules;
use crate::scene::graph::Node;

/// Cached rasterization of one node.
///
/// The entry owns its surface; invalidating or disposing the entry releases the pixels. A cached
/// entry always holds a surface of `ceil(bounds.width) x ceil(bounds.height)`.
#[derive(Debug, Default)]
pub struct RenderCacheEntry {
    surface: Option<Surface>,
    bounds: Rect,
}

impl RenderCacheEntry {
    /// Empty, uncached entry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return `true` when a valid surface is held.
    pub fn is_cached(&self) -> bool {
        self.surface.is_some()
    }

    /// Cached surface, if any.
    pub fn surface(&self) -> Option<&Surface> {
        self.surface.as_ref()
    }

    /// Scene-space bounds the surface was rasterized at.
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Bytes held by the cached surface.
    pub fn retained_bytes(&self) -> usize {
        self.surface.as_ref().map_or(0, Surface::byte_len)
    }

    /// Node-local eligibility: the node declares itself cacheable and a surface at `bounds`
    /// would be non-empty and admitted by `rules`.
    pub fn can_cache(&self, node: &Node, bounds: Rect, rules: &RenderCacheRules) -> bool {
        let size = PixelSize::from_rect_ceil(bounds);
        node.capability().cacheable && !size.is_empty() && rules.matches(size)
    }

    /// Eligibility as a collapse point for the node's whole subtree.
    pub fn can_cache_boundary(&self, node: &Node, bounds: Rect, rules: &RenderCacheRules) -> bool {
        node.capability().boundary && self.can_cache(node, bounds, rules)
    }

    /// Take ownership of `surface` as the cached rasterization at `bounds`, releasing any
    /// previous one.
    pub fn store_cache(&mut self, surface: Surface, bounds: Rect) -> CacheResult<()> {
        let expected = PixelSize::from_rect_ceil(bounds);
        if surface.size() != expected {
            return Err(CacheError::validation(format!(
                "cache surface is {}x{}, bounds need {}x{}",
                surface.size().width,
                surface.size().height,
                expected.width,
                expected.height
            )));
        }
        self.surface = Some(surface);
        self.bounds = bounds;
        Ok(())
    }

    /// Release the surface. Idempotent.
    pub fn invalidate(&mut self) {
        self.surface = None;
    }

    /// Release everything; the entry is being dropped from its context.
    pub fn dispose(&mut self) {
        self.invalidate();
        self.bounds = Rect::ZERO;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render_cache/entry.rs"]
mod tests;
