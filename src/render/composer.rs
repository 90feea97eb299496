use crate::config::CacheConfig;
use crate::foundation::core::{FrameIndex, PixelSize};
use crate::foundation::error::{CacheError, CacheResult};
use crate::frame_cache::manager::FrameCacheManager;
use crate::frame_cache::options::FrameCacheOptions;
use crate::render::raster::draw_node;
use crate::render::surface::{CanvasFactory, CpuCanvasFactory, FrameRGBA};
use crate::render_cache::context::RenderCacheContext;
use crate::render_cache::rules::RenderCacheOptions;
use crate::scene::model::Scene;
use std::sync::Arc;

/// Render pass counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ComposerStats {
    /// Frames requested through [`Composer::render_frame`].
    pub frames_requested: u64,
    /// Requests served from the frame cache.
    pub frame_cache_hits: u64,
    /// Frames composited from the scene graph.
    pub frames_rendered: u64,
    /// Element trees whose cache could not be built and were drawn live.
    pub live_fallbacks: u64,
}

/// Renders scene frames through the node cache and the frame cache.
///
/// A composer is bound to one scene at a time; the render pass is sequential. The frame cache is
/// shared (`Arc`) so edit commands can invalidate it from other threads.
pub struct Composer {
    node_cache: RenderCacheContext,
    frames: Arc<FrameCacheManager>,
    factory: Box<dyn CanvasFactory>,
    max_frame_bytes: usize,
    stats: ComposerStats,
}

impl std::fmt::Debug for Composer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Composer")
            .field("node_cache", &self.node_cache)
            .field("frames", &self.frames)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl Composer {
    /// Composer for `scene` configured from `config`.
    pub fn new(scene: &Scene, config: &CacheConfig) -> CacheResult<Self> {
        config.validate()?;
        check_frame_size(scene.frame_size(), config.max_surface_bytes)?;
        let frames = FrameCacheManager::new(
            scene.frame_size(),
            FrameCacheOptions::from_config(config),
        );
        frames.set_enabled(config.frame_cache_enabled);
        Ok(Self {
            node_cache: RenderCacheContext::new(RenderCacheOptions::from_config(config)),
            frames: Arc::new(frames),
            factory: Box::new(CpuCanvasFactory::new(config.max_surface_bytes)),
            max_frame_bytes: config.max_surface_bytes,
            stats: ComposerStats::default(),
        })
    }

    /// Replace the surface allocator.
    pub fn with_factory(mut self, factory: impl CanvasFactory + 'static) -> Self {
        self.factory = Box::new(factory);
        self
    }

    /// Push changed configuration to both caches.
    ///
    /// Changed node cache options or frame cache options drop the affected cache's content.
    /// Disabling the frame cache also releases its frames.
    pub fn apply_config(&mut self, config: &CacheConfig) -> CacheResult<()> {
        config.validate()?;
        self.node_cache
            .set_options(RenderCacheOptions::from_config(config));
        self.frames
            .set_options(FrameCacheOptions::from_config(config));
        if config.frame_cache_enabled {
            self.frames.set_enabled(true);
        } else if self.frames.is_enabled() {
            self.frames.set_enabled(false);
            self.frames.clear();
        }
        Ok(())
    }

    /// Node cache state.
    pub fn node_cache(&self) -> &RenderCacheContext {
        &self.node_cache
    }

    /// Mutable node cache, for pushing options directly.
    pub fn node_cache_mut(&mut self) -> &mut RenderCacheContext {
        &mut self.node_cache
    }

    /// Shared frame cache handle.
    pub fn frame_cache(&self) -> &Arc<FrameCacheManager> {
        &self.frames
    }

    /// Render pass counters.
    pub fn stats(&self) -> ComposerStats {
        self.stats
    }

    /// Bring the caches in line with edits made to `scene` since the last pass.
    ///
    /// Destroyed nodes lose their entries; changed nodes are cleared along with their ancestors'
    /// bitmaps. A changed frame size re-targets the frame cache.
    pub fn sync_scene(&mut self, scene: &mut Scene) {
        let removed = scene.graph_mut().take_removed();
        for id in &removed {
            self.node_cache.forget(*id);
        }
        let dirty = scene.graph_mut().take_dirty();
        for id in &dirty {
            self.node_cache.clear_cache(scene.graph(), *id);
        }
        if !removed.is_empty() || !dirty.is_empty() {
            tracing::debug!(
                removed = removed.len(),
                dirty = dirty.len(),
                "node cache synced with scene edits"
            );
        }

        if self.frames.scene_size() != scene.frame_size() {
            self.frames
                .configure(scene.frame_size(), self.frames.options());
        }
    }

    /// Produce `frame`, from the frame cache when possible.
    ///
    /// While the frame cache is enabled, results come back in its representation (scale and
    /// pixel format), whether they were hits or freshly rendered.
    #[tracing::instrument(skip(self, scene), fields(frame = frame.0))]
    pub fn render_frame(&mut self, scene: &mut Scene, frame: FrameIndex) -> CacheResult<FrameRGBA> {
        self.stats.frames_requested += 1;
        self.sync_scene(scene);

        if let Some(hit) = self.frames.get(frame) {
            self.stats.frame_cache_hits += 1;
            return Ok(hit);
        }

        let t = scene.time_of(frame);
        let rendered = self.render_elements(scene, t)?;
        if !self.frames.is_enabled() {
            return Ok(rendered);
        }
        match self.frames.encode(&rendered) {
            Ok(cached) => {
                let out = cached.to_rgba();
                self.frames.store(frame, cached);
                Ok(out)
            }
            Err(e) => {
                tracing::warn!(frame = frame.0, error = %e, "frame not cached");
                Ok(rendered)
            }
        }
    }

    /// Composite the scene at `t` seconds at full resolution, bypassing the frame cache.
    #[tracing::instrument(skip(self, scene))]
    pub fn render_at(&mut self, scene: &mut Scene, t: f64) -> CacheResult<FrameRGBA> {
        self.sync_scene(scene);
        self.render_elements(scene, t)
    }

    fn render_elements(&mut self, scene: &Scene, t: f64) -> CacheResult<FrameRGBA> {
        check_frame_size(scene.frame_size(), self.max_frame_bytes)?;
        let graph = scene.graph();
        let factory = &*self.factory;
        let mut target = factory.create_surface(scene.frame_size())?;
        target.clear(scene.background().premultiplied());

        for element in scene.active_elements(t) {
            if let Err(e) = self.node_cache.make_cache(graph, element.root, factory) {
                if !e.is_recoverable() {
                    return Err(e);
                }
                self.stats.live_fallbacks += 1;
                tracing::warn!(element = %element.name, error = %e, "rendering element live");
            }
            draw_node(
                graph,
                element.root,
                Some(&self.node_cache),
                factory,
                &mut target,
                (0, 0),
            )?;
        }

        self.stats.frames_rendered += 1;
        Ok(target.to_frame())
    }
}

fn check_frame_size(frame_size: PixelSize, max_surface_bytes: usize) -> CacheResult<()> {
    if frame_size.rgba8_byte_len() > max_surface_bytes {
        return Err(CacheError::validation(format!(
            "frame size {}x{} exceeds max_surface_bytes {max_surface_bytes}",
            frame_size.width, frame_size.height
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/render/composer.rs"]
mod tests;
