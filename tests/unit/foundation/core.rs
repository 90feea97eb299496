use super::*;

#[test]
fn frame_range_contains_boundaries() {
    let r = FrameRange::new(FrameIndex(2), FrameIndex(5)).unwrap();
    assert!(!r.contains(FrameIndex(1)));
    assert!(r.contains(FrameIndex(2)));
    assert!(r.contains(FrameIndex(4)));
    assert!(!r.contains(FrameIndex(5)));
    assert_eq!(r.len_frames(), 3);
    assert!(FrameRange::new(FrameIndex(5), FrameIndex(2)).is_err());
}

#[test]
fn fps_frames_secs_roundtrip_floor() {
    let fps = Fps::new(30000, 1001).unwrap();
    let secs = fps.frames_to_secs(123);
    assert_eq!(fps.secs_to_frames_floor(secs), 123);
    assert!(Fps::new(30, 0).is_err());
    assert!(Fps::new(0, 1).is_err());
}

#[test]
fn time_range_to_frames_covers_partial_frames() {
    let fps = Fps::new(30, 1).unwrap();
    let r = TimeRange::new(1.0, 2.0).unwrap().to_frame_range(fps);
    assert_eq!(r.start, FrameIndex(30));
    assert_eq!(r.end, FrameIndex(60));

    // 0.51s..0.52s sits inside frame 15.
    let r = TimeRange::new(0.51, 0.52).unwrap().to_frame_range(fps);
    assert_eq!(r.start, FrameIndex(15));
    assert_eq!(r.end, FrameIndex(16));

    let r = TimeRange::new(-1.0, 0.0).unwrap().to_frame_range(fps);
    assert!(r.is_empty());
}

#[test]
fn time_range_rejects_inverted_and_non_finite() {
    assert!(TimeRange::new(2.0, 1.0).is_err());
    assert!(TimeRange::new(f64::NAN, 1.0).is_err());
    assert!(TimeRange::new(0.0, f64::INFINITY).is_err());
    assert!(TimeRange::new(0.0, 1.0).unwrap().contains(0.0));
    assert!(!TimeRange::new(0.0, 1.0).unwrap().contains(1.0));
}

#[test]
fn pixel_size_ceils_fractional_bounds() {
    let s = PixelSize::from_rect_ceil(Rect::new(0.5, 0.5, 10.6, 3.0));
    assert_eq!(s, PixelSize::new(11, 3));
    assert!(PixelSize::from_rect_ceil(Rect::ZERO).is_empty());
    assert_eq!(PixelSize::new(2, 3).rgba8_byte_len(), 24);
}

#[test]
fn rgba8_premultiplies_with_rounding() {
    assert_eq!(Rgba8::new(255, 128, 0, 255).premultiplied(), [255, 128, 0, 255]);
    assert_eq!(Rgba8::new(255, 255, 255, 128).premultiplied(), [128, 128, 128, 128]);
    assert_eq!(Rgba8::transparent().premultiplied(), [0, 0, 0, 0]);
}
