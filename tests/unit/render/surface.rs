use super::*;

fn solid(size: PixelSize, premul: [u8; 4]) -> Surface {
    let mut s = CpuCanvasFactory::default().create_surface(size).unwrap();
    s.clear(premul);
    s
}

#[test]
fn new_surfaces_are_transparent_and_sized() {
    let s = CpuCanvasFactory::default()
        .create_surface(PixelSize::new(3, 2))
        .unwrap();
    assert_eq!(s.size(), PixelSize::new(3, 2));
    assert_eq!(s.byte_len(), 24);
    assert!(s.data().iter().all(|&b| b == 0));
}

#[test]
fn factory_reports_allocation_failures() {
    let f = CpuCanvasFactory::new(64);
    assert!(matches!(
        f.create_surface(PixelSize::new(0, 4)),
        Err(CacheError::Allocation(_))
    ));
    assert!(matches!(
        f.create_surface(PixelSize::new(70_000, 1)),
        Err(CacheError::Allocation(_))
    ));
    assert!(matches!(
        f.create_surface(PixelSize::new(5, 4)),
        Err(CacheError::Allocation(_))
    ));
    assert!(f.create_surface(PixelSize::new(4, 4)).is_ok());
}

#[test]
fn draw_surface_places_and_clips() {
    let mut dst = solid(PixelSize::new(4, 4), [0, 0, 0, 255]);
    let src = solid(PixelSize::new(2, 2), [255, 0, 0, 255]);

    dst.draw_surface(&src, 3, -1, 1.0);
    let frame = dst.to_frame();
    assert_eq!(frame.pixel(3, 0), Some([255, 0, 0, 255]));
    assert_eq!(frame.pixel(2, 0), Some([0, 0, 0, 255]));
    assert_eq!(frame.pixel(3, 1), Some([0, 0, 0, 255]));
    assert_eq!(frame.pixel(4, 0), None);
}

#[test]
fn draw_surface_outside_destination_is_a_no_op() {
    let mut dst = solid(PixelSize::new(4, 4), [0, 0, 0, 255]);
    let before = dst.to_frame();
    let src = solid(PixelSize::new(2, 2), [255, 0, 0, 255]);
    dst.draw_surface(&src, 10, 10, 1.0);
    dst.draw_surface(&src, -2, 0, 1.0);
    assert_eq!(dst.to_frame(), before);
}

#[test]
fn draw_surface_applies_opacity() {
    let mut dst = solid(PixelSize::new(1, 1), [0, 0, 0, 0]);
    let src = solid(PixelSize::new(1, 1), [255, 255, 255, 255]);
    dst.draw_surface(&src, 0, 0, 0.5);
    assert_eq!(dst.to_frame().pixel(0, 0), Some([128, 128, 128, 128]));
}
