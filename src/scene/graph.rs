//! Arena-backed scene graph.
//!
//! Nodes live in generational slots and are addressed by [`NodeId`]. A removed node's slot is
//! recycled with a bumped generation, so any handle kept by a cache for a destroyed node can never
//! alias the node that later reuses the slot.

use crate::foundation::core::{Affine, BezPath, Rect, Rgba8};
use crate::foundation::error::{CacheError, CacheResult};
use kurbo::Shape as _;
use std::collections::BTreeSet;

/// Stable handle to a node in a [`SceneGraph`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    /// Slot index (not unique across removals; pair with the generation for identity).
    pub fn index(self) -> u32 {
        self.index
    }
}

/// Per-node declaration of how the render cache may treat the node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CacheCapability {
    /// The node may be part of a cached bitmap.
    pub cacheable: bool,
    /// The node may be the root of a cached bitmap (a collapse point).
    pub boundary: bool,
}

impl CacheCapability {
    /// Cacheable and usable as a collapse point.
    pub const BOUNDARY: Self = Self {
        cacheable: true,
        boundary: true,
    };
    /// Cacheable inside an ancestor's bitmap, never a collapse point itself.
    pub const CONTRIBUTOR: Self = Self {
        cacheable: true,
        boundary: false,
    };
    /// Always rendered live.
    pub const NEVER: Self = Self {
        cacheable: false,
        boundary: false,
    };
}

/// Drawable geometry of a leaf, in the leaf's local coordinates.
#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    /// Axis-aligned rectangle.
    Rect(Rect),
    /// Ellipse inscribed in the rectangle.
    Ellipse(Rect),
    /// Arbitrary filled path.
    Path(BezPath),
}

impl Shape {
    /// Bounding box in local coordinates.
    pub fn local_bounds(&self) -> Rect {
        match self {
            Self::Rect(r) | Self::Ellipse(r) => *r,
            Self::Path(p) => p.bounding_box(),
        }
    }

    /// Capability a leaf of this shape declares by default.
    ///
    /// Paths hit-test against their exact outline, so they only contribute to an ancestor's
    /// bitmap.
    pub fn default_capability(&self) -> CacheCapability {
        match self {
            Self::Rect(_) | Self::Ellipse(_) => CacheCapability::BOUNDARY,
            Self::Path(_) => CacheCapability::CONTRIBUTOR,
        }
    }
}

/// A node that draws directly.
#[derive(Clone, Debug, PartialEq)]
pub struct Leaf {
    /// Geometry to fill.
    pub shape: Shape,
    /// Straight-alpha fill color.
    pub fill: Rgba8,
    /// Local-to-scene transform.
    pub transform: Affine,
}

impl Leaf {
    /// Leaf with an identity transform.
    pub fn new(shape: Shape, fill: Rgba8) -> Self {
        Self {
            shape,
            fill,
            transform: Affine::IDENTITY,
        }
    }

    /// Return the leaf with `transform` applied.
    pub fn with_transform(mut self, transform: Affine) -> Self {
        self.transform = transform;
        self
    }

    /// Scene-space bounding box.
    pub fn bounds(&self) -> Rect {
        self.transform.transform_rect_bbox(self.shape.local_bounds())
    }
}

/// A node that groups an ordered list of children.
#[derive(Clone, Debug, PartialEq)]
pub struct Container {
    children: Vec<NodeId>,
    opacity: f32,
}

impl Container {
    /// Children in paint order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Group opacity applied when the composited children are drawn.
    pub fn opacity(&self) -> f32 {
        self.opacity
    }
}

/// Node payload.
#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    /// Drawing node.
    Leaf(Leaf),
    /// Grouping node.
    Container(Container),
}

/// A scene graph node.
#[derive(Clone, Debug)]
pub struct Node {
    kind: NodeKind,
    capability: CacheCapability,
    parent: Option<NodeId>,
}

impl Node {
    /// Node payload.
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Declared cache capability.
    pub fn capability(&self) -> CacheCapability {
        self.capability
    }

    /// Owning container, if attached.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Return `true` for container nodes.
    pub fn is_container(&self) -> bool {
        matches!(self.kind, NodeKind::Container(_))
    }

    /// Children in paint order; empty for leaves.
    pub fn children(&self) -> &[NodeId] {
        match &self.kind {
            NodeKind::Container(c) => c.children(),
            NodeKind::Leaf(_) => &[],
        }
    }

    /// Group opacity; leaves report `1.0`.
    pub fn opacity(&self) -> f32 {
        match &self.kind {
            NodeKind::Container(c) => c.opacity,
            NodeKind::Leaf(_) => 1.0,
        }
    }

    /// Leaf payload, if this is a leaf.
    pub fn as_leaf(&self) -> Option<&Leaf> {
        match &self.kind {
            NodeKind::Leaf(l) => Some(l),
            NodeKind::Container(_) => None,
        }
    }
}

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// Arena of scene graph nodes with parent links and change tracking.
///
/// Property and structural edits are recorded as dirty node ids, removals as removed ids. The
/// render pass drains both to keep its caches in sync.
#[derive(Debug, Default)]
pub struct SceneGraph {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
    dirty: BTreeSet<NodeId>,
    removed: Vec<NodeId>,
}

impl SceneGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.live
    }

    /// Return `true` when the graph holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Add a detached leaf with its shape's default capability.
    pub fn add_leaf(&mut self, leaf: Leaf) -> NodeId {
        let capability = leaf.shape.default_capability();
        self.insert(NodeKind::Leaf(leaf), capability)
    }

    /// Add a detached, empty, fully opaque container.
    pub fn add_container(&mut self) -> NodeId {
        self.insert(
            NodeKind::Container(Container {
                children: Vec::new(),
                opacity: 1.0,
            }),
            CacheCapability::BOUNDARY,
        )
    }

    fn insert(&mut self, kind: NodeKind, capability: CacheCapability) -> NodeId {
        let node = Node {
            kind,
            capability,
            parent: None,
        };
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            return NodeId {
                index,
                generation: slot.generation,
            };
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            node: Some(node),
        });
        NodeId {
            index,
            generation: 0,
        }
    }

    /// Look up a live node.
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.slots
            .get(id.index as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.node.as_ref())
    }

    fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.node.as_mut())
    }

    fn node_or_err(&self, id: NodeId) -> CacheResult<&Node> {
        self.get(id)
            .ok_or_else(|| CacheError::validation(format!("unknown node {id:?}")))
    }

    fn node_mut_or_err(&mut self, id: NodeId) -> CacheResult<&mut Node> {
        self.get_mut(id)
            .ok_or_else(|| CacheError::validation(format!("unknown node {id:?}")))
    }

    /// Return `true` when `id` refers to a live node.
    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Children of `id` in paint order; empty for leaves and unknown ids.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(Node::children).unwrap_or(&[])
    }

    /// Owning container of `id`.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(Node::parent)
    }

    /// Ancestors of `id`, nearest first.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut cur = self.parent(id);
        while let Some(p) = cur {
            out.push(p);
            cur = self.parent(p);
        }
        out
    }

    /// Topmost ancestor of `id` (or `id` itself when detached).
    pub fn root_of(&self, id: NodeId) -> NodeId {
        self.ancestors(id).last().copied().unwrap_or(id)
    }

    /// Scene-space bounds. Containers report the union of their children's non-empty bounds.
    pub fn bounds(&self, id: NodeId) -> Rect {
        let Some(node) = self.get(id) else {
            return Rect::ZERO;
        };
        match &node.kind {
            NodeKind::Leaf(leaf) => leaf.bounds(),
            NodeKind::Container(c) => {
                let mut acc: Option<Rect> = None;
                for &child in &c.children {
                    let b = self.bounds(child);
                    if b.is_zero_area() {
                        continue;
                    }
                    acc = Some(match acc {
                        Some(a) => a.union(b),
                        None => b,
                    });
                }
                acc.unwrap_or(Rect::ZERO)
            }
        }
    }

    /// Attach `child` as the last child of `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> CacheResult<()> {
        let at = self.children(parent).len();
        self.insert_child(parent, at, child)
    }

    /// Attach `child` to `parent` at position `index` (clamped to the child count).
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) -> CacheResult<()> {
        if !self.node_or_err(parent)?.is_container() {
            return Err(CacheError::validation("parent node is not a container"));
        }
        if self.node_or_err(child)?.parent.is_some() {
            return Err(CacheError::validation("child node is already attached"));
        }
        if child == parent || self.ancestors(parent).contains(&child) {
            return Err(CacheError::validation("attaching node would create a cycle"));
        }

        if let NodeKind::Container(c) = &mut self.node_mut_or_err(parent)?.kind {
            let at = index.min(c.children.len());
            c.children.insert(at, child);
        }
        self.node_mut_or_err(child)?.parent = Some(parent);
        self.dirty.insert(parent);
        Ok(())
    }

    /// Detach `child` from `parent`, returning the position it occupied.
    pub fn detach_child(&mut self, parent: NodeId, child: NodeId) -> CacheResult<usize> {
        if self.node_or_err(child)?.parent != Some(parent) {
            return Err(CacheError::validation("node is not a child of the given parent"));
        }
        let NodeKind::Container(c) = &mut self.node_mut_or_err(parent)?.kind else {
            return Err(CacheError::validation("parent node is not a container"));
        };
        let Some(at) = c.children.iter().position(|&x| x == child) else {
            return Err(CacheError::validation("node is not a child of the given parent"));
        };
        c.children.remove(at);
        self.node_mut_or_err(child)?.parent = None;
        self.dirty.insert(parent);
        Ok(at)
    }

    /// Destroy `id` and its whole subtree. Handles to destroyed nodes never resolve again.
    pub fn remove(&mut self, id: NodeId) -> CacheResult<()> {
        if let Some(parent) = self.node_or_err(id)?.parent {
            self.detach_child(parent, id)?;
        }

        let mut stack = vec![id];
        while let Some(cur) = stack.pop() {
            stack.extend_from_slice(self.children(cur));
            let slot = &mut self.slots[cur.index as usize];
            slot.node = None;
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(cur.index);
            self.live -= 1;
            self.dirty.remove(&cur);
            self.removed.push(cur);
        }
        Ok(())
    }

    /// Mutate a leaf in place, returning the closure's result.
    pub fn update_leaf<R>(&mut self, id: NodeId, f: impl FnOnce(&mut Leaf) -> R) -> CacheResult<R> {
        let NodeKind::Leaf(leaf) = &mut self.node_mut_or_err(id)?.kind else {
            return Err(CacheError::validation("node is not a leaf"));
        };
        let out = f(leaf);
        self.dirty.insert(id);
        Ok(out)
    }

    /// Replace a leaf's fill, returning the previous value.
    pub fn set_fill(&mut self, id: NodeId, fill: Rgba8) -> CacheResult<Rgba8> {
        self.update_leaf(id, |leaf| std::mem::replace(&mut leaf.fill, fill))
    }

    /// Replace a leaf's transform, returning the previous value.
    pub fn set_transform(&mut self, id: NodeId, transform: Affine) -> CacheResult<Affine> {
        self.update_leaf(id, |leaf| std::mem::replace(&mut leaf.transform, transform))
    }

    /// Replace a container's opacity, returning the previous value.
    pub fn set_opacity(&mut self, id: NodeId, opacity: f32) -> CacheResult<f32> {
        if !opacity.is_finite() || !(0.0..=1.0).contains(&opacity) {
            return Err(CacheError::validation("opacity must be within [0, 1]"));
        }
        let NodeKind::Container(c) = &mut self.node_mut_or_err(id)?.kind else {
            return Err(CacheError::validation("node is not a container"));
        };
        let old = std::mem::replace(&mut c.opacity, opacity);
        self.dirty.insert(id);
        Ok(old)
    }

    /// Override the node's declared cache capability.
    pub fn set_capability(&mut self, id: NodeId, capability: CacheCapability) -> CacheResult<()> {
        self.node_mut_or_err(id)?.capability = capability;
        self.dirty.insert(id);
        Ok(())
    }

    /// Drain ids of nodes whose properties or children changed since the last call, each once,
    /// in id order. Nodes destroyed in the meantime are reported by
    /// [`SceneGraph::take_removed`] instead.
    pub fn take_dirty(&mut self) -> Vec<NodeId> {
        std::mem::take(&mut self.dirty).into_iter().collect()
    }

    /// Drain ids of nodes destroyed since the last call.
    pub fn take_removed(&mut self) -> Vec<NodeId> {
        std::mem::take(&mut self.removed)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/graph.rs"]
mod tests;
