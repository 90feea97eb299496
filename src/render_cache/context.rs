use crate::foundation::error::CacheResult;
use crate::render::raster::rasterize_subtree;
use crate::render::surface::CanvasFactory;
use crate::render_cache::entry::RenderCacheEntry;
use crate::render_cache::rules::RenderCacheOptions;
use crate::scene::graph::{NodeId, SceneGraph};
use std::collections::HashMap;

/// Node cache counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderCacheStats {
    /// Entries associated with nodes.
    pub entries: usize,
    /// Entries currently holding a surface.
    pub cached: usize,
    /// Bytes held by cached surfaces.
    pub retained_bytes: usize,
    /// Subtree rasterizations performed since creation.
    pub rasterizations: u64,
}

/// Per-node render cache.
///
/// Entries are keyed by [`NodeId`] and never keep a node alive. A render pass calls
/// [`RenderCacheContext::make_cache`] on each subtree root before drawing it; edits call
/// [`RenderCacheContext::clear_cache`] on the changed node.
#[derive(Debug, Default)]
pub struct RenderCacheContext {
    entries: HashMap<NodeId, RenderCacheEntry>,
    options: RenderCacheOptions,
    rasterizations: u64,
}

impl RenderCacheContext {
    /// Empty context with the given options.
    pub fn new(options: RenderCacheOptions) -> Self {
        Self {
            entries: HashMap::new(),
            options,
            rasterizations: 0,
        }
    }

    /// Active options.
    pub fn options(&self) -> RenderCacheOptions {
        self.options
    }

    /// Replace the active options. A different value drops every cached surface, since content
    /// admitted under the old policy must not survive the change.
    pub fn set_options(&mut self, options: RenderCacheOptions) {
        if self.options != options {
            tracing::debug!(?options, "render cache options changed");
            self.clear();
        }
        self.options = options;
    }

    /// Entry for `node`, created empty on first access.
    pub fn get_cache(&mut self, node: NodeId) -> &mut RenderCacheEntry {
        self.entries.entry(node).or_default()
    }

    /// Entry for `node` without creating one.
    pub fn peek(&self, node: NodeId) -> Option<&RenderCacheEntry> {
        self.entries.get(&node)
    }

    /// Return `true` when `node` has a cached surface.
    pub fn is_cached(&self, node: NodeId) -> bool {
        self.peek(node).is_some_and(RenderCacheEntry::is_cached)
    }

    /// `node` and every node below it are individually cacheable.
    pub fn can_cache_recursive(&mut self, graph: &SceneGraph, node: NodeId) -> bool {
        let Some(n) = graph.get(node) else {
            return false;
        };
        let rules = self.options.rules;
        if !self.get_cache(node).can_cache(n, graph.bounds(node), &rules) {
            return false;
        }
        self.can_cache_recursive_children_only(graph, node)
    }

    /// Every node strictly below `node` is individually cacheable; `node` itself is not checked.
    pub fn can_cache_recursive_children_only(&mut self, graph: &SceneGraph, node: NodeId) -> bool {
        graph
            .children(node)
            .iter()
            .all(|&child| self.can_cache_recursive(graph, child))
    }

    /// Invalidate the entries of `node` and all of its descendants.
    pub fn invalidate(&mut self, graph: &SceneGraph, node: NodeId) {
        if let Some(entry) = self.entries.get_mut(&node) {
            entry.invalidate();
        }
        for &child in graph.children(node) {
            self.invalidate(graph, child);
        }
    }

    /// React to a property change on `node`: its subtree is invalidated, and so is each
    /// ancestor's own entry, whose bitmap contains the changed node.
    pub fn clear_cache(&mut self, graph: &SceneGraph, node: NodeId) {
        self.invalidate(graph, node);
        for ancestor in graph.ancestors(node) {
            if let Some(entry) = self.entries.get_mut(&ancestor) {
                entry.invalidate();
            }
        }
    }

    /// Populate caches for the subtree at `node`.
    ///
    /// The largest admissible subtree is collapsed into one surface. When `node` cannot be a
    /// collapse point, or something below it is not cacheable, each child is considered on its
    /// own. Rasterization failures are returned after the remaining siblings were processed; the
    /// failed node is left uncached.
    #[tracing::instrument(level = "trace", skip(self, graph, factory))]
    pub fn make_cache(
        &mut self,
        graph: &SceneGraph,
        node: NodeId,
        factory: &dyn CanvasFactory,
    ) -> CacheResult<()> {
        if !self.options.enabled {
            return Ok(());
        }
        let Some(n) = graph.get(node) else {
            return Ok(());
        };

        let bounds = graph.bounds(node);
        let rules = self.options.rules;
        let boundary = self.get_cache(node).can_cache_boundary(n, bounds, &rules);
        if boundary && self.can_cache_recursive_children_only(graph, node) {
            let entry = self.get_cache(node);
            if entry.is_cached() && entry.bounds() == bounds {
                return Ok(());
            }
            return self.make_cache_core(graph, node, factory);
        }

        if n.is_container() {
            self.get_cache(node).invalidate();
            let mut first_err = None;
            for &child in n.children() {
                if let Err(e) = self.make_cache(graph, child, factory) {
                    first_err.get_or_insert(e);
                }
            }
            return first_err.map_or(Ok(()), Err);
        }

        Ok(())
    }

    fn make_cache_core(
        &mut self,
        graph: &SceneGraph,
        node: NodeId,
        factory: &dyn CanvasFactory,
    ) -> CacheResult<()> {
        self.invalidate(graph, node);

        let (surface, bounds) = rasterize_subtree(graph, node, factory)?;
        let size = surface.size();
        self.get_cache(node).store_cache(surface, bounds)?;
        self.rasterizations += 1;

        tracing::debug!(
            ?node,
            width = size.width,
            height = size.height,
            "render cache created"
        );
        Ok(())
    }

    /// Drop the entry of a destroyed node.
    pub fn forget(&mut self, node: NodeId) {
        if let Some(mut entry) = self.entries.remove(&node) {
            entry.dispose();
        }
    }

    /// Drop every entry whose node no longer exists in `graph`.
    pub fn retain_live(&mut self, graph: &SceneGraph) {
        self.entries.retain(|&id, entry| {
            let live = graph.contains(id);
            if !live {
                entry.dispose();
            }
            live
        });
    }

    /// Dispose every surface and forget all node associations.
    pub fn clear(&mut self) {
        for entry in self.entries.values_mut() {
            entry.dispose();
        }
        self.entries.clear();
        tracing::debug!("render cache cleared");
    }

    /// Tear the context down, releasing everything it holds.
    pub fn dispose(mut self) {
        self.clear();
    }

    /// Current counters.
    pub fn stats(&self) -> RenderCacheStats {
        RenderCacheStats {
            entries: self.entries.len(),
            cached: self.entries.values().filter(|e| e.is_cached()).count(),
            retained_bytes: self.entries.values().map(RenderCacheEntry::retained_bytes).sum(),
            rasterizations: self.rasterizations,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render_cache/context.rs"]
mod tests;
