//! Recorded scene edits and the frame invalidation they trigger.
//!
//! Node-level invalidation is not done here: graph edits mark nodes dirty and the composer drains
//! them before its next pass. What an edit changes on the timeline is only known to the edit, so
//! the recorder converts each command's affected time ranges to frame ranges and drops those
//! frames from the frame cache in the background.

use crate::foundation::core::{Affine, FrameRange, Rgba8, TimeRange};
use crate::foundation::error::CacheResult;
use crate::frame_cache::manager::FrameCacheManager;
use crate::scene::graph::NodeId;
use crate::scene::model::{ElementId, Scene};
use std::sync::{Arc, mpsc};

/// A reversible scene edit.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Replace a leaf's fill color.
    SetFill {
        /// Target leaf.
        node: NodeId,
        /// New fill.
        fill: Rgba8,
    },
    /// Replace a leaf's transform.
    SetTransform {
        /// Target leaf.
        node: NodeId,
        /// New transform.
        transform: Affine,
    },
    /// Replace a container's group opacity.
    SetOpacity {
        /// Target container.
        node: NodeId,
        /// New opacity in `[0, 1]`.
        opacity: f32,
    },
    /// Move or resize an element on the timeline.
    SetElementRange {
        /// Target element.
        element: ElementId,
        /// New time range.
        range: TimeRange,
    },
    /// Attach a detached node to a container.
    AttachChild {
        /// Container.
        parent: NodeId,
        /// Position among the container's children.
        index: usize,
        /// Node to attach.
        child: NodeId,
    },
    /// Detach a node from its container, keeping it alive.
    DetachChild {
        /// Container.
        parent: NodeId,
        /// Node to detach.
        child: NodeId,
    },
}

impl Command {
    fn element_ranges(scene: &Scene, node: NodeId) -> Vec<TimeRange> {
        scene
            .elements_containing(node)
            .into_iter()
            .filter_map(|id| scene.element(id).map(|e| e.range))
            .collect()
    }

    /// Apply the edit. Returns its inverse and the time ranges whose frames it changed.
    pub fn apply(self, scene: &mut Scene) -> CacheResult<(Command, Vec<TimeRange>)> {
        match self {
            Self::SetFill { node, fill } => {
                let old = scene.graph_mut().set_fill(node, fill)?;
                let affected = Self::element_ranges(scene, node);
                Ok((Self::SetFill { node, fill: old }, affected))
            }
            Self::SetTransform { node, transform } => {
                let old = scene.graph_mut().set_transform(node, transform)?;
                let affected = Self::element_ranges(scene, node);
                Ok((
                    Self::SetTransform {
                        node,
                        transform: old,
                    },
                    affected,
                ))
            }
            Self::SetOpacity { node, opacity } => {
                let old = scene.graph_mut().set_opacity(node, opacity)?;
                let affected = Self::element_ranges(scene, node);
                Ok((Self::SetOpacity { node, opacity: old }, affected))
            }
            Self::SetElementRange { element, range } => {
                let old = scene.set_element_range(element, range)?;
                Ok((
                    Self::SetElementRange {
                        element,
                        range: old,
                    },
                    vec![old, range],
                ))
            }
            Self::AttachChild {
                parent,
                index,
                child,
            } => {
                scene.graph_mut().insert_child(parent, index, child)?;
                let affected = Self::element_ranges(scene, parent);
                Ok((Self::DetachChild { parent, child }, affected))
            }
            Self::DetachChild { parent, child } => {
                let affected = Self::element_ranges(scene, parent);
                let index = scene.graph_mut().detach_child(parent, child)?;
                Ok((
                    Self::AttachChild {
                        parent,
                        index,
                        child,
                    },
                    affected,
                ))
            }
        }
    }
}

/// Handle to a background frame invalidation.
#[derive(Debug)]
pub struct PendingInvalidation {
    ranges: Vec<FrameRange>,
    done: mpsc::Receiver<usize>,
}

impl PendingInvalidation {
    /// Frame ranges being dropped.
    pub fn ranges(&self) -> &[FrameRange] {
        &self.ranges
    }

    /// Block until the invalidation finished. Returns the number of frames dropped.
    pub fn wait(self) -> usize {
        self.done.recv().unwrap_or(0)
    }
}

/// Executes commands against a scene with undo/redo, invalidating cached frames after each one.
#[derive(Debug)]
pub struct CommandRecorder {
    frames: Arc<FrameCacheManager>,
    undo: Vec<Command>,
    redo: Vec<Command>,
}

impl CommandRecorder {
    /// Recorder invalidating `frames`.
    pub fn new(frames: Arc<FrameCacheManager>) -> Self {
        Self {
            frames,
            undo: Vec::new(),
            redo: Vec::new(),
        }
    }

    /// Apply `command`, record its inverse, and start invalidating the frames it changed.
    pub fn execute(
        &mut self,
        scene: &mut Scene,
        command: Command,
    ) -> CacheResult<PendingInvalidation> {
        let (inverse, affected) = command.apply(scene)?;
        self.undo.push(inverse);
        self.redo.clear();
        Ok(self.invalidate(scene, &affected))
    }

    /// Revert the most recent command. `None` when there is nothing to undo.
    pub fn undo(&mut self, scene: &mut Scene) -> CacheResult<Option<PendingInvalidation>> {
        let Some(command) = self.undo.pop() else {
            return Ok(None);
        };
        let (inverse, affected) = command.apply(scene)?;
        self.redo.push(inverse);
        Ok(Some(self.invalidate(scene, &affected)))
    }

    /// Re-apply the most recently undone command. `None` when there is nothing to redo.
    pub fn redo(&mut self, scene: &mut Scene) -> CacheResult<Option<PendingInvalidation>> {
        let Some(command) = self.redo.pop() else {
            return Ok(None);
        };
        let (inverse, affected) = command.apply(scene)?;
        self.undo.push(inverse);
        Ok(Some(self.invalidate(scene, &affected)))
    }

    /// Return `true` when [`CommandRecorder::undo`] has something to revert.
    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    /// Return `true` when [`CommandRecorder::redo`] has something to re-apply.
    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    fn invalidate(&self, scene: &Scene, affected: &[TimeRange]) -> PendingInvalidation {
        let fps = scene.fps();
        let ranges: Vec<FrameRange> = affected
            .iter()
            .map(|r| r.to_frame_range(fps))
            .filter(|r| !r.is_empty())
            .collect();

        let (tx, done) = mpsc::channel();
        let frames = Arc::clone(&self.frames);
        let work = ranges.clone();
        rayon::spawn(move || {
            let dropped = frames.delete_and_update_blocks(&work);
            let _ = tx.send(dropped);
        });

        PendingInvalidation { ranges, done }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/edit/command.rs"]
mod tests;
