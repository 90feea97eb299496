use crate::foundation::core::{FrameIndex, FrameRange, PixelSize};
use crate::foundation::error::CacheResult;
use crate::frame_cache::block::{FrameBlock, FrameCacheStore};
use crate::frame_cache::frame::CachedFrame;
use crate::frame_cache::options::FrameCacheOptions;
use crate::render::surface::FrameRGBA;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Frame cache counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameCacheStats {
    /// Cached frames.
    pub frames: usize,
    /// Runs of consecutive cached frames.
    pub blocks: usize,
    /// Bytes held by cached frames.
    pub bytes: usize,
}

#[derive(Debug)]
struct Inner {
    store: FrameCacheStore,
    scene_size: PixelSize,
    options: FrameCacheOptions,
}

impl Inner {
    fn output_size(&self) -> PixelSize {
        self.options.output_size(self.scene_size)
    }
}

/// Thread-safe cache of composited frames, grouped into runs of consecutive frame numbers.
///
/// Render passes read and fill it; edit commands invalidate frame ranges from background
/// threads. All block mutation happens under one lock, and pixel conversion happens outside it.
#[derive(Debug)]
pub struct FrameCacheManager {
    inner: Mutex<Inner>,
    enabled: AtomicBool,
}

impl FrameCacheManager {
    /// Enabled, empty cache for a scene rendered at `scene_size`.
    pub fn new(scene_size: PixelSize, options: FrameCacheOptions) -> Self {
        Self {
            inner: Mutex::new(Inner {
                store: FrameCacheStore::new(),
                scene_size,
                options,
            }),
            enabled: AtomicBool::new(true),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // Block operations leave the store consistent at every step.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Re-target the cache at a scene size and options. Stored frames are dropped when either
    /// changes.
    pub fn configure(&self, scene_size: PixelSize, options: FrameCacheOptions) {
        let mut inner = self.lock();
        if inner.scene_size == scene_size && inner.options == options {
            return;
        }
        inner.store.clear();
        inner.scene_size = scene_size;
        inner.options = options;
        tracing::debug!(
            width = scene_size.width,
            height = scene_size.height,
            ?options,
            "frame cache reconfigured"
        );
    }

    /// Scene frame size the cache was configured for.
    pub fn scene_size(&self) -> PixelSize {
        self.lock().scene_size
    }

    /// Size of stored frames.
    pub fn frame_size(&self) -> PixelSize {
        self.lock().output_size()
    }

    /// Active options.
    pub fn options(&self) -> FrameCacheOptions {
        self.lock().options
    }

    /// Replace the options, dropping stored frames when they differ.
    pub fn set_options(&self, options: FrameCacheOptions) {
        let mut inner = self.lock();
        if inner.options != options {
            inner.store.clear();
            inner.options = options;
            tracing::debug!(?options, "frame cache options changed");
        }
    }

    /// Return `true` when lookups and stores are served.
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Switch serving on or off. Stored frames are kept; call [`FrameCacheManager::clear`] to
    /// release them.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
    }

    /// Cached frame, decoded to premultiplied RGBA8 at the cache's frame size. Misses while
    /// disabled.
    pub fn get(&self, frame: FrameIndex) -> Option<FrameRGBA> {
        if !self.is_enabled() {
            return None;
        }
        let cached = self.lock().store.get(frame).cloned()?;
        Some(cached.to_rgba())
    }

    /// Return `true` when `frame` is stored, regardless of the enabled flag.
    pub fn contains(&self, frame: FrameIndex) -> bool {
        self.lock().store.contains(frame)
    }

    /// Convert a full-size rendered frame into the cache's current representation.
    pub fn encode(&self, frame: &FrameRGBA) -> CacheResult<CachedFrame> {
        let options = self.options();
        CachedFrame::encode(frame, &options)
    }

    /// Convert and store a full-size rendered frame. Returns whether it was stored.
    pub fn set(&self, frame: FrameIndex, rendered: &FrameRGBA) -> CacheResult<bool> {
        if !self.is_enabled() {
            return Ok(false);
        }
        let cached = self.encode(rendered)?;
        Ok(self.store(frame, cached))
    }

    /// Store an already converted frame. A frame converted under options that have since changed
    /// is discarded.
    pub fn store(&self, frame: FrameIndex, cached: CachedFrame) -> bool {
        if !self.is_enabled() {
            return false;
        }
        let mut inner = self.lock();
        if cached.size() != inner.output_size() || cached.color_type() != inner.options.color_type
        {
            tracing::debug!(frame = frame.0, "discarding frame encoded under stale options");
            return false;
        }
        inner.store.set(frame, cached);
        true
    }

    /// Drop every stored frame inside each half-open range, splitting blocks as needed. Returns
    /// the number of frames dropped.
    pub fn delete_and_update_blocks(&self, ranges: &[FrameRange]) -> usize {
        let mut inner = self.lock();
        let dropped: usize = ranges.iter().map(|r| inner.store.delete_range(*r)).sum();
        tracing::debug!(
            ranges = ranges.len(),
            dropped,
            blocks = inner.store.block_count(),
            "frame cache blocks updated"
        );
        dropped
    }

    /// Drop every stored frame.
    pub fn clear(&self) {
        self.lock().store.clear();
        tracing::debug!("frame cache cleared");
    }

    /// Current runs of consecutive cached frames.
    pub fn blocks(&self) -> Vec<FrameBlock> {
        self.lock().store.blocks()
    }

    /// Current counters.
    pub fn stats(&self) -> FrameCacheStats {
        let inner = self.lock();
        FrameCacheStats {
            frames: inner.store.frame_count(),
            blocks: inner.store.block_count(),
            bytes: inner.store.byte_len(),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/frame_cache/manager.rs"]
mod tests;
