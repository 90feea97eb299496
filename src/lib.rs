//! Scenecache keeps two caches in front of a scene graph renderer.
//!
//! - A per-node **render cache** collapses the largest cacheable subtree under each element into
//!   a single bitmap and reuses it until the subtree changes.
//! - A per-frame **frame cache** keeps composited frames in runs of consecutive frame numbers and
//!   drops exactly the frames an edit touched.
//!
//! The entry points are:
//!
//! - Build a [`Scene`] (in code or from JSON)
//! - Create a [`Composer`] from a [`CacheConfig`] and render frames through it
//! - Route edits through a [`CommandRecorder`] sharing the composer's [`FrameCacheManager`]
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

pub(crate) mod config;
pub(crate) mod edit;
pub(crate) mod frame_cache;
pub(crate) mod render;
pub(crate) mod render_cache;
pub(crate) mod scene;

pub use crate::config::CacheConfig;
pub use crate::edit::command::{Command, CommandRecorder, PendingInvalidation};
pub use crate::foundation::core::{
    Affine, BezPath, Fps, FrameIndex, FrameRange, PixelSize, Point, Rect, Rgba8, TimeRange, Vec2,
};
pub use crate::foundation::error::{CacheError, CacheResult};
pub use crate::frame_cache::block::{FrameBlock, FrameCacheStore};
pub use crate::frame_cache::frame::CachedFrame;
pub use crate::frame_cache::manager::{FrameCacheManager, FrameCacheStats};
pub use crate::frame_cache::options::{FrameCacheColorType, FrameCacheOptions, FrameCacheScale};
pub use crate::render::composer::{Composer, ComposerStats};
pub use crate::render::surface::{
    CanvasFactory, CpuCanvasFactory, DEFAULT_MAX_SURFACE_BYTES, FrameRGBA, Surface,
};
pub use crate::render_cache::context::{RenderCacheContext, RenderCacheStats};
pub use crate::render_cache::entry::RenderCacheEntry;
pub use crate::render_cache::rules::{RenderCacheOptions, RenderCacheRules};
pub use crate::scene::graph::{
    CacheCapability, Container, Leaf, Node, NodeId, NodeKind, SceneGraph, Shape,
};
pub use crate::scene::model::{Element, ElementId, Scene};
