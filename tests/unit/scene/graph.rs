use super::*;

fn rect_leaf(x: f64, y: f64, w: f64, h: f64) -> Leaf {
    Leaf::new(Shape::Rect(Rect::new(x, y, x + w, y + h)), Rgba8::new(255, 0, 0, 255))
}

#[test]
fn container_bounds_are_union_of_children() {
    let mut g = SceneGraph::new();
    let root = g.add_container();
    let a = g.add_leaf(rect_leaf(0.0, 0.0, 10.0, 10.0));
    let b = g.add_leaf(rect_leaf(20.0, 5.0, 10.0, 30.0));
    g.append_child(root, a).unwrap();
    g.append_child(root, b).unwrap();

    assert_eq!(g.bounds(root), Rect::new(0.0, 0.0, 30.0, 35.0));
    assert_eq!(g.children(root), &[a, b]);
    assert_eq!(g.parent(a), Some(root));
}

#[test]
fn empty_container_has_zero_bounds() {
    let mut g = SceneGraph::new();
    let root = g.add_container();
    assert_eq!(g.bounds(root), Rect::ZERO);
}

#[test]
fn leaf_bounds_follow_transform() {
    let leaf = rect_leaf(0.0, 0.0, 10.0, 4.0).with_transform(Affine::translate((5.0, 6.0)));
    assert_eq!(leaf.bounds(), Rect::new(5.0, 6.0, 15.0, 10.0));
}

#[test]
fn path_leaves_are_contributors_only() {
    let mut path = BezPath::new();
    path.move_to((0.0, 0.0));
    path.line_to((10.0, 0.0));
    path.line_to((10.0, 10.0));
    path.close_path();

    let mut g = SceneGraph::new();
    let id = g.add_leaf(Leaf::new(Shape::Path(path), Rgba8::new(0, 0, 0, 255)));
    assert_eq!(g.get(id).unwrap().capability(), CacheCapability::CONTRIBUTOR);
}

#[test]
fn attach_rejects_cycles_and_double_parenting() {
    let mut g = SceneGraph::new();
    let a = g.add_container();
    let b = g.add_container();
    let leaf = g.add_leaf(rect_leaf(0.0, 0.0, 1.0, 1.0));

    g.append_child(a, b).unwrap();
    assert!(g.append_child(b, a).is_err());
    assert!(g.append_child(a, a).is_err());

    g.append_child(b, leaf).unwrap();
    assert!(g.append_child(a, leaf).is_err());
    assert!(g.append_child(leaf, a).is_err());
}

#[test]
fn detach_and_reinsert_preserves_position() {
    let mut g = SceneGraph::new();
    let root = g.add_container();
    let ids: Vec<_> = (0..3)
        .map(|i| g.add_leaf(rect_leaf(f64::from(i), 0.0, 1.0, 1.0)))
        .collect();
    for &id in &ids {
        g.append_child(root, id).unwrap();
    }

    let at = g.detach_child(root, ids[1]).unwrap();
    assert_eq!(at, 1);
    assert_eq!(g.children(root), &[ids[0], ids[2]]);
    assert_eq!(g.parent(ids[1]), None);

    g.insert_child(root, at, ids[1]).unwrap();
    assert_eq!(g.children(root), ids.as_slice());
}

#[test]
fn removed_ids_never_resolve_after_slot_reuse() {
    let mut g = SceneGraph::new();
    let root = g.add_container();
    let child = g.add_leaf(rect_leaf(0.0, 0.0, 1.0, 1.0));
    g.append_child(root, child).unwrap();

    g.remove(root).unwrap();
    assert!(!g.contains(root));
    assert!(!g.contains(child));
    assert!(g.is_empty());

    let mut removed = g.take_removed();
    removed.sort();
    let mut expected = vec![root, child];
    expected.sort();
    assert_eq!(removed, expected);

    let fresh = g.add_leaf(rect_leaf(0.0, 0.0, 1.0, 1.0));
    assert!(fresh.index() == root.index() || fresh.index() == child.index());
    assert_ne!(fresh, root);
    assert_ne!(fresh, child);
    assert!(g.contains(fresh));
    assert_eq!(g.len(), 1);
}

#[test]
fn edits_are_recorded_as_dirty() {
    let mut g = SceneGraph::new();
    let root = g.add_container();
    let leaf = g.add_leaf(rect_leaf(0.0, 0.0, 1.0, 1.0));
    g.append_child(root, leaf).unwrap();
    assert_eq!(g.take_dirty(), vec![root]);

    let old = g.set_fill(leaf, Rgba8::new(0, 255, 0, 255)).unwrap();
    assert_eq!(old, Rgba8::new(255, 0, 0, 255));
    let old = g.set_opacity(root, 0.5).unwrap();
    assert_eq!(old, 1.0);
    assert_eq!(g.take_dirty(), vec![root, leaf]);
    assert!(g.take_dirty().is_empty());
}

#[test]
fn setters_validate_node_kind_and_values() {
    let mut g = SceneGraph::new();
    let root = g.add_container();
    let leaf = g.add_leaf(rect_leaf(0.0, 0.0, 1.0, 1.0));

    assert!(g.set_opacity(leaf, 0.5).is_err());
    assert!(g.set_fill(root, Rgba8::transparent()).is_err());
    assert!(g.set_opacity(root, 1.5).is_err());
    assert!(g.set_opacity(root, f32::NAN).is_err());
}

#[test]
fn ancestors_and_root_walk_up_the_tree() {
    let mut g = SceneGraph::new();
    let a = g.add_container();
    let b = g.add_container();
    let c = g.add_leaf(rect_leaf(0.0, 0.0, 1.0, 1.0));
    g.append_child(a, b).unwrap();
    g.append_child(b, c).unwrap();

    assert_eq!(g.ancestors(c), vec![b, a]);
    assert_eq!(g.root_of(c), a);
    assert_eq!(g.root_of(a), a);
}

#[test]
fn repeated_edits_record_a_node_once() {
    let mut g = SceneGraph::new();
    let root = g.add_container();
    let leaf = g.add_leaf(rect_leaf(0.0, 0.0, 1.0, 1.0));
    g.append_child(root, leaf).unwrap();
    for i in 0..1000u32 {
        g.set_fill(leaf, Rgba8::new((i % 256) as u8, 0, 0, 255))
            .unwrap();
        g.set_opacity(root, 0.5).unwrap();
    }
    assert_eq!(g.take_dirty(), vec![root, leaf]);
}

#[test]
fn removed_nodes_leave_the_dirty_set() {
    let mut g = SceneGraph::new();
    let root = g.add_container();
    let leaf = g.add_leaf(rect_leaf(0.0, 0.0, 1.0, 1.0));
    g.append_child(root, leaf).unwrap();
    g.set_fill(leaf, Rgba8::new(0, 0, 255, 255)).unwrap();
    g.remove(leaf).unwrap();

    assert_eq!(g.take_dirty(), vec![root]);
    assert_eq!(g.take_removed(), vec![leaf]);
}
