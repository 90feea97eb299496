//! Node drawing shared by live rendering and cache rasterization.
//!
//! Every node is drawn into a surface anchored at the rounded origin of its bounds and then
//! composited at an integer offset. Live rendering and cached rendering therefore place identical
//! pixels, whichever path a subtree takes.

use crate::foundation::core::{Affine, PixelSize, Point, Rect};
use crate::foundation::error::CacheResult;
use crate::render::surface::{CanvasFactory, Surface};
use crate::render_cache::context::RenderCacheContext;
use crate::scene::graph::{Leaf, NodeId, NodeKind, SceneGraph, Shape};
use vello_cpu::kurbo::Shape as _;

/// Integer scene-pixel position of a bounds' top-left corner.
pub(crate) fn pixel_origin(bounds: Rect) -> (i32, i32) {
    (bounds.x0.round() as i32, bounds.y0.round() as i32)
}

/// Part of a node's pixel footprint that lands on a target of `target` size placed at scene
/// pixel `origin`, as `(x, y, size)` in scene pixels. `None` when nothing is visible.
fn visible_footprint(
    bounds: Rect,
    origin: (i32, i32),
    target: PixelSize,
) -> Option<(i32, i32, PixelSize)> {
    let (px, py) = pixel_origin(bounds);
    let full = PixelSize::from_rect_ceil(bounds);

    let x0 = i64::from(px).max(i64::from(origin.0));
    let y0 = i64::from(py).max(i64::from(origin.1));
    let x1 = (i64::from(px) + i64::from(full.width))
        .min(i64::from(origin.0) + i64::from(target.width));
    let y1 = (i64::from(py) + i64::from(full.height))
        .min(i64::from(origin.1) + i64::from(target.height));
    if x0 >= x1 || y0 >= y1 {
        return None;
    }
    Some((
        x0 as i32,
        y0 as i32,
        PixelSize::new((x1 - x0) as u32, (y1 - y0) as u32),
    ))
}

/// Draw `id` and its subtree into `target`, whose top-left sits at scene pixel `origin`.
///
/// With `cache`, any node holding a valid cached bitmap is composited from the cache instead of
/// being redrawn.
pub(crate) fn draw_node(
    graph: &SceneGraph,
    id: NodeId,
    cache: Option<&RenderCacheContext>,
    factory: &dyn CanvasFactory,
    target: &mut Surface,
    origin: (i32, i32),
) -> CacheResult<()> {
    let Some(node) = graph.get(id) else {
        return Ok(());
    };
    let bounds = graph.bounds(id);
    if bounds.is_zero_area() {
        return Ok(());
    }
    let (px, py) = pixel_origin(bounds);
    let (x, y) = (px - origin.0, py - origin.1);

    if let Some(entry) = cache.and_then(|c| c.peek(id))
        && let Some(surface) = entry.surface()
        && entry.bounds() == bounds
    {
        target.draw_surface(surface, x, y, node.opacity());
        return Ok(());
    }

    // Live drawing allocates only the part of a node that lands on the target.
    match node.kind() {
        NodeKind::Leaf(leaf) => {
            let Some((vx, vy, size)) = visible_footprint(bounds, origin, target.size()) else {
                return Ok(());
            };
            let mut tmp = factory.create_surface(size)?;
            let top_left = Point::new(
                bounds.x0 + f64::from(vx - px),
                bounds.y0 + f64::from(vy - py),
            );
            rasterize_leaf(leaf, top_left, &mut tmp);
            target.draw_surface(&tmp, vx - origin.0, vy - origin.1, 1.0);
        }
        NodeKind::Container(c) if c.opacity() >= 1.0 => {
            for &child in c.children() {
                draw_node(graph, child, cache, factory, target, origin)?;
            }
        }
        NodeKind::Container(c) => {
            let Some((vx, vy, size)) = visible_footprint(bounds, origin, target.size()) else {
                return Ok(());
            };
            let mut layer = factory.create_surface(size)?;
            for &child in c.children() {
                draw_node(graph, child, cache, factory, &mut layer, (vx, vy))?;
            }
            target.draw_surface(&layer, vx - origin.0, vy - origin.1, c.opacity());
        }
    }
    Ok(())
}

/// Rasterize `id` and everything below it into one new surface sized to its bounds.
///
/// Group opacity is not baked in; it is applied when the surface is composited. Cached
/// descendants are ignored.
pub(crate) fn rasterize_subtree(
    graph: &SceneGraph,
    id: NodeId,
    factory: &dyn CanvasFactory,
) -> CacheResult<(Surface, Rect)> {
    let bounds = graph.bounds(id);
    let mut surface = factory.create_surface(PixelSize::from_rect_ceil(bounds))?;
    match graph.get(id).map(|n| n.kind()) {
        Some(NodeKind::Leaf(leaf)) => rasterize_leaf(leaf, bounds.origin(), &mut surface),
        Some(NodeKind::Container(c)) => {
            let origin = pixel_origin(bounds);
            for &child in c.children() {
                draw_node(graph, child, None, factory, &mut surface, origin)?;
            }
        }
        None => {}
    }
    Ok((surface, bounds))
}

/// Fill a leaf's shape into `surface`, mapping scene point `top_left` to the surface's top-left.
pub(crate) fn rasterize_leaf(leaf: &Leaf, top_left: Point, surface: &mut Surface) {
    let size = surface.size();
    let mut ctx = vello_cpu::RenderContext::new(size.width as u16, size.height as u16);

    let tr = Affine::translate((-top_left.x, -top_left.y)) * leaf.transform;
    ctx.set_transform(affine_to_cpu(tr));
    let c = leaf.fill;
    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a));

    match &leaf.shape {
        Shape::Rect(r) => ctx.fill_rect(&rect_to_cpu(*r)),
        Shape::Ellipse(r) => {
            let path = vello_cpu::kurbo::Ellipse::from_rect(rect_to_cpu(*r)).to_path(0.1);
            ctx.fill_path(&path);
        }
        Shape::Path(p) => ctx.fill_path(&bezpath_to_cpu(p)),
    }

    ctx.flush();
    ctx.render_to_pixmap(surface.pixmap_mut());
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn rect_to_cpu(r: Rect) -> vello_cpu::kurbo::Rect {
    vello_cpu::kurbo::Rect::new(r.x0, r.y0, r.x1, r.y1)
}

fn bezpath_to_cpu(path: &crate::foundation::core::BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::LineTo(p) => out.line_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::QuadTo(p1, p2) => out.quad_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
            ),
            PathEl::CurveTo(p1, p2, p3) => out.curve_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
                vello_cpu::kurbo::Point::new(p3.x, p3.y),
            ),
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/render/raster.rs"]
mod tests;
