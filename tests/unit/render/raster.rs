use super::*;
use crate::foundation::core::Rgba8;
use crate::render::surface::CpuCanvasFactory;

fn rect(x: f64, y: f64, w: f64, h: f64, fill: Rgba8) -> Leaf {
    Leaf::new(Shape::Rect(Rect::new(x, y, x + w, y + h)), fill)
}

fn frame(factory: &CpuCanvasFactory, w: u32, h: u32) -> Surface {
    let mut s = factory.create_surface(PixelSize::new(w, h)).unwrap();
    s.clear([0, 0, 0, 255]);
    s
}

#[test]
fn rasterize_leaf_fills_integer_rect_exactly() {
    let leaf = rect(2.0, 3.0, 4.0, 2.0, Rgba8::new(255, 0, 0, 255));
    let bounds = leaf.bounds();
    let mut s = CpuCanvasFactory::default()
        .create_surface(PixelSize::from_rect_ceil(bounds))
        .unwrap();
    rasterize_leaf(&leaf, bounds.origin(), &mut s);

    assert_eq!(s.size(), PixelSize::new(4, 2));
    assert!(
        s.data()
            .chunks_exact(4)
            .all(|px| px == [255, 0, 0, 255])
    );
}

#[test]
fn draw_node_places_leaves_in_scene_space() {
    let factory = CpuCanvasFactory::default();
    let mut g = SceneGraph::new();
    let root = g.add_container();
    let a = g.add_leaf(rect(1.0, 1.0, 2.0, 2.0, Rgba8::new(255, 0, 0, 255)));
    let b = g.add_leaf(rect(4.0, 0.0, 1.0, 1.0, Rgba8::new(0, 0, 255, 255)));
    g.append_child(root, a).unwrap();
    g.append_child(root, b).unwrap();

    let mut target = frame(&factory, 6, 4);
    draw_node(&g, root, None, &factory, &mut target, (0, 0)).unwrap();
    let out = target.to_frame();

    assert_eq!(out.pixel(0, 0), Some([0, 0, 0, 255]));
    assert_eq!(out.pixel(1, 1), Some([255, 0, 0, 255]));
    assert_eq!(out.pixel(2, 2), Some([255, 0, 0, 255]));
    assert_eq!(out.pixel(3, 3), Some([0, 0, 0, 255]));
    assert_eq!(out.pixel(4, 0), Some([0, 0, 255, 255]));
}

#[test]
fn subtree_raster_matches_live_drawing() {
    let factory = CpuCanvasFactory::default();
    let mut g = SceneGraph::new();
    let root = g.add_container();
    for i in 0..3 {
        let leaf = g.add_leaf(rect(
            f64::from(i) * 3.0 + 1.0,
            2.0,
            2.0,
            2.0,
            Rgba8::new(40 * i as u8, 200, 10, 255),
        ));
        g.append_child(root, leaf).unwrap();
    }

    let mut live = frame(&factory, 12, 8);
    draw_node(&g, root, None, &factory, &mut live, (0, 0)).unwrap();

    let (surface, bounds) = rasterize_subtree(&g, root, &factory).unwrap();
    assert_eq!(surface.size(), PixelSize::from_rect_ceil(bounds));
    let mut composed = frame(&factory, 12, 8);
    let (x, y) = pixel_origin(bounds);
    composed.draw_surface(&surface, x, y, 1.0);

    assert_eq!(live.to_frame(), composed.to_frame());
}

#[test]
fn translucent_container_is_drawn_as_a_group() {
    let factory = CpuCanvasFactory::default();
    let mut g = SceneGraph::new();
    let root = g.add_container();
    let a = g.add_leaf(rect(0.0, 0.0, 2.0, 1.0, Rgba8::new(255, 255, 255, 255)));
    let b = g.add_leaf(rect(1.0, 0.0, 2.0, 1.0, Rgba8::new(255, 255, 255, 255)));
    g.append_child(root, a).unwrap();
    g.append_child(root, b).unwrap();
    g.set_opacity(root, 0.5).unwrap();

    let mut target = factory.create_surface(PixelSize::new(3, 1)).unwrap();
    draw_node(&g, root, None, &factory, &mut target, (0, 0)).unwrap();
    let out = target.to_frame();

    // The overlap is not double-blended.
    assert_eq!(out.pixel(0, 0), out.pixel(1, 0));
    assert_eq!(out.pixel(1, 0), Some([128, 128, 128, 128]));
}

#[test]
fn missing_or_empty_nodes_draw_nothing() {
    let factory = CpuCanvasFactory::default();
    let mut g = SceneGraph::new();
    let empty = g.add_container();
    let gone = g.add_container();
    g.remove(gone).unwrap();

    let mut target = frame(&factory, 2, 2);
    let before = target.to_frame();
    draw_node(&g, empty, None, &factory, &mut target, (0, 0)).unwrap();
    draw_node(&g, gone, None, &factory, &mut target, (0, 0)).unwrap();
    assert_eq!(target.to_frame(), before);
}

#[test]
fn leaf_wider_than_any_surface_is_drawn_clipped() {
    let factory = CpuCanvasFactory::default();
    let mut g = SceneGraph::new();
    let wide = g.add_leaf(rect(-100.0, 1.0, 70_000.0, 2.0, Rgba8::new(0, 255, 0, 255)));
    assert!(
        factory
            .create_surface(PixelSize::from_rect_ceil(g.bounds(wide)))
            .is_err()
    );

    let mut target = frame(&factory, 8, 4);
    draw_node(&g, wide, None, &factory, &mut target, (0, 0)).unwrap();
    let out = target.to_frame();

    for x in 0..8 {
        assert_eq!(out.pixel(x, 0), Some([0, 0, 0, 255]));
        assert_eq!(out.pixel(x, 1), Some([0, 255, 0, 255]));
        assert_eq!(out.pixel(x, 2), Some([0, 255, 0, 255]));
        assert_eq!(out.pixel(x, 3), Some([0, 0, 0, 255]));
    }
}

#[test]
fn clipped_drawing_matches_full_surface_drawing() {
    let factory = CpuCanvasFactory::default();
    let mut g = SceneGraph::new();
    let root = g.add_container();
    // Hangs off the top-left corner of the target.
    let corner = g.add_leaf(rect(-3.25, -2.5, 10.0, 8.0, Rgba8::new(200, 40, 90, 255)));
    let square = g.add_leaf(rect(4.5, 2.0, 6.0, 6.0, Rgba8::new(20, 90, 220, 200)));
    g.append_child(root, corner).unwrap();
    g.append_child(root, square).unwrap();
    g.set_opacity(root, 0.75).unwrap();

    let mut clipped = frame(&factory, 8, 6);
    draw_node(&g, root, None, &factory, &mut clipped, (0, 0)).unwrap();

    let (surface, bounds) = rasterize_subtree(&g, root, &factory).unwrap();
    let mut composed = frame(&factory, 8, 6);
    let (x, y) = pixel_origin(bounds);
    composed.draw_surface(&surface, x, y, 0.75);

    assert_eq!(clipped.to_frame(), composed.to_frame());
}

#[test]
fn nodes_outside_the_target_allocate_nothing() {
    struct NoSurfaces;
    impl CanvasFactory for NoSurfaces {
        fn create_surface(&self, _: PixelSize) -> CacheResult<Surface> {
            Err(crate::foundation::error::CacheError::allocation("none left"))
        }
    }

    let factory = CpuCanvasFactory::default();
    let mut g = SceneGraph::new();
    let root = g.add_container();
    let far = g.add_leaf(rect(50.0, 50.0, 4.0, 4.0, Rgba8::new(255, 0, 0, 255)));
    g.append_child(root, far).unwrap();
    g.set_opacity(root, 0.5).unwrap();

    let mut target = frame(&factory, 4, 4);
    draw_node(&g, root, None, &NoSurfaces, &mut target, (0, 0)).unwrap();
}
