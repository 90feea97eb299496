use crate::foundation::core::{Affine, BezPath, Fps, FrameIndex, PixelSize, Rect, Rgba8, TimeRange};
use crate::foundation::error::{CacheError, CacheResult};
use crate::scene::graph::{CacheCapability, Leaf, NodeId, SceneGraph, Shape};
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Index of an element within its [`Scene`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub u32);

/// A timeline item: a node tree shown during a time range.
#[derive(Clone, Debug)]
pub struct Element {
    /// Display name.
    pub name: String,
    /// When the element is visible.
    pub range: TimeRange,
    /// Root node of the element's tree.
    pub root: NodeId,
}

/// A time-based scene: frame geometry, frame rate, and elements over a node graph.
#[derive(Debug)]
pub struct Scene {
    graph: SceneGraph,
    elements: Vec<Element>,
    frame_size: PixelSize,
    fps: Fps,
    background: Rgba8,
}

impl Scene {
    /// Create an empty scene.
    pub fn new(frame_size: PixelSize, fps: Fps) -> CacheResult<Self> {
        validate_frame_size(frame_size)?;
        Ok(Self {
            graph: SceneGraph::new(),
            elements: Vec::new(),
            frame_size,
            fps,
            background: Rgba8::transparent(),
        })
    }

    /// Parse and build a scene from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> CacheResult<Self> {
        let def: SceneDef = serde_json::from_reader(r)
            .map_err(|e| CacheError::serde(format!("parse scene JSON: {e}")))?;
        Self::from_def(def)
    }

    /// Parse and build a scene from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> CacheResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            CacheError::validation(format!("open scene JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    fn from_def(def: SceneDef) -> CacheResult<Self> {
        let fps = Fps::new(def.fps.num, def.fps.den)?;
        let mut scene = Self::new(def.frame_size, fps)?;
        scene.background = def.background;
        for el in def.elements {
            let root = build_node(&mut scene.graph, el.root)?;
            scene.add_element(el.name, TimeRange::new(el.start, el.end)?, root)?;
        }
        // Construction is not an edit.
        scene.graph.take_dirty();
        Ok(scene)
    }

    /// Node graph.
    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    /// Mutable node graph. Edits are tracked by the graph itself.
    pub fn graph_mut(&mut self) -> &mut SceneGraph {
        &mut self.graph
    }

    /// Output frame size at full resolution.
    pub fn frame_size(&self) -> PixelSize {
        self.frame_size
    }

    /// Change the output frame size.
    pub fn set_frame_size(&mut self, frame_size: PixelSize) -> CacheResult<()> {
        validate_frame_size(frame_size)?;
        self.frame_size = frame_size;
        Ok(())
    }

    /// Frame rate.
    pub fn fps(&self) -> Fps {
        self.fps
    }

    /// Color every frame is cleared to before drawing.
    pub fn background(&self) -> Rgba8 {
        self.background
    }

    /// Set the clear color.
    pub fn set_background(&mut self, background: Rgba8) {
        self.background = background;
    }

    /// Register a detached node tree as a new element.
    pub fn add_element(
        &mut self,
        name: impl Into<String>,
        range: TimeRange,
        root: NodeId,
    ) -> CacheResult<ElementId> {
        let Some(node) = self.graph.get(root) else {
            return Err(CacheError::validation("element root node does not exist"));
        };
        if node.parent().is_some() {
            return Err(CacheError::validation("element root must be a detached node"));
        }
        if self.elements.iter().any(|e| e.root == root) {
            return Err(CacheError::validation("node is already an element root"));
        }
        let id = ElementId(self.elements.len() as u32);
        self.elements.push(Element {
            name: name.into(),
            range,
            root,
        });
        Ok(id)
    }

    /// Look up an element.
    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(id.0 as usize)
    }

    /// All elements in paint order.
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Replace an element's time range, returning the previous one.
    pub fn set_element_range(&mut self, id: ElementId, range: TimeRange) -> CacheResult<TimeRange> {
        let el = self
            .elements
            .get_mut(id.0 as usize)
            .ok_or_else(|| CacheError::validation(format!("unknown element {id:?}")))?;
        Ok(std::mem::replace(&mut el.range, range))
    }

    /// Elements visible at `t` seconds, in paint order.
    pub fn active_elements(&self, t: f64) -> impl Iterator<Item = &Element> {
        self.elements.iter().filter(move |e| e.range.contains(t))
    }

    /// Elements whose tree contains `node`.
    pub fn elements_containing(&self, node: NodeId) -> Vec<ElementId> {
        let root = self.graph.root_of(node);
        self.elements
            .iter()
            .enumerate()
            .filter(|(_, e)| e.root == root)
            .map(|(i, _)| ElementId(i as u32))
            .collect()
    }

    /// Scene time of a frame, in seconds.
    pub fn time_of(&self, frame: FrameIndex) -> f64 {
        self.fps.frames_to_secs(frame.0)
    }

    /// Number of frames up to the end of the last element.
    pub fn duration_frames(&self) -> u64 {
        let end = self
            .elements
            .iter()
            .map(|e| e.range.end)
            .fold(0.0_f64, f64::max);
        self.fps.secs_to_frames_ceil(end)
    }
}

/// Frames are rasterized into a single surface, so each side must fit one.
fn validate_frame_size(frame_size: PixelSize) -> CacheResult<()> {
    if frame_size.is_empty() {
        return Err(CacheError::validation("scene frame size must be non-zero"));
    }
    let max = u32::from(u16::MAX);
    if frame_size.width > max || frame_size.height > max {
        return Err(CacheError::validation(format!(
            "scene frame size {}x{} exceeds {max} pixels per side",
            frame_size.width, frame_size.height
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct FpsDef {
    num: u32,
    den: u32,
}

fn default_background() -> Rgba8 {
    Rgba8::transparent()
}

fn default_opacity() -> f32 {
    1.0
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct SceneDef {
    frame_size: PixelSize,
    fps: FpsDef,
    #[serde(default = "default_background")]
    background: Rgba8,
    #[serde(default)]
    elements: Vec<ElementDef>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct ElementDef {
    name: String,
    start: f64,
    end: f64,
    root: NodeDef,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
enum CapabilityDef {
    Boundary,
    Contributor,
    Never,
}

impl From<CapabilityDef> for CacheCapability {
    fn from(v: CapabilityDef) -> Self {
        match v {
            CapabilityDef::Boundary => Self::BOUNDARY,
            CapabilityDef::Contributor => Self::CONTRIBUTOR,
            CapabilityDef::Never => Self::NEVER,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum NodeDef {
    Rect {
        rect: [f64; 4],
        fill: Rgba8,
        #[serde(default)]
        translate: [f64; 2],
        #[serde(default)]
        capability: Option<CapabilityDef>,
    },
    Ellipse {
        rect: [f64; 4],
        fill: Rgba8,
        #[serde(default)]
        translate: [f64; 2],
        #[serde(default)]
        capability: Option<CapabilityDef>,
    },
    Path {
        d: String,
        fill: Rgba8,
        #[serde(default)]
        translate: [f64; 2],
        #[serde(default)]
        capability: Option<CapabilityDef>,
    },
    Group {
        #[serde(default = "default_opacity")]
        opacity: f32,
        #[serde(default)]
        children: Vec<NodeDef>,
        #[serde(default)]
        capability: Option<CapabilityDef>,
    },
}

fn rect_from_def(r: [f64; 4]) -> CacheResult<Rect> {
    if r.iter().any(|v| !v.is_finite()) {
        return Err(CacheError::validation("rect coordinates must be finite"));
    }
    Ok(Rect::new(r[0], r[1], r[2], r[3]))
}

fn build_node(graph: &mut SceneGraph, def: NodeDef) -> CacheResult<NodeId> {
    let (id, capability) = match def {
        NodeDef::Rect {
            rect,
            fill,
            translate,
            capability,
        } => {
            let leaf = Leaf::new(Shape::Rect(rect_from_def(rect)?), fill)
                .with_transform(Affine::translate((translate[0], translate[1])));
            (graph.add_leaf(leaf), capability)
        }
        NodeDef::Ellipse {
            rect,
            fill,
            translate,
            capability,
        } => {
            let leaf = Leaf::new(Shape::Ellipse(rect_from_def(rect)?), fill)
                .with_transform(Affine::translate((translate[0], translate[1])));
            (graph.add_leaf(leaf), capability)
        }
        NodeDef::Path {
            d,
            fill,
            translate,
            capability,
        } => {
            let path = BezPath::from_svg(&d)
                .map_err(|e| CacheError::validation(format!("invalid path data: {e}")))?;
            let leaf = Leaf::new(Shape::Path(path), fill)
                .with_transform(Affine::translate((translate[0], translate[1])));
            (graph.add_leaf(leaf), capability)
        }
        NodeDef::Group {
            opacity,
            children,
            capability,
        } => {
            let id = graph.add_container();
            graph.set_opacity(id, opacity)?;
            for child in children {
                let child = build_node(graph, child)?;
                graph.append_child(id, child)?;
            }
            (id, capability)
        }
    };
    if let Some(cap) = capability {
        graph.set_capability(id, cap.into())?;
    }
    Ok(id)
}

#[cfg(test)]
#[path = "../../tests/unit/scene/model.rs"]
mod tests;
