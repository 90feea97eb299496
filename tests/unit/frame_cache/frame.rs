use super::*;
use crate::frame_cache::options::FrameCacheScale;

fn solid(w: u32, h: u32, px: [u8; 4]) -> FrameRGBA {
    FrameRGBA {
        width: w,
        height: h,
        data: px.repeat((w * h) as usize),
        premultiplied: true,
    }
}

#[test]
fn full_rgba_is_stored_verbatim() {
    let f = solid(4, 2, [10, 20, 30, 255]);
    let c = CachedFrame::encode(&f, &FrameCacheOptions::default()).unwrap();
    assert_eq!(c.size(), PixelSize::new(4, 2));
    assert_eq!(c.byte_len(), 4 * 2 * 4);
    assert_eq!(c.to_rgba(), f);
}

#[test]
fn half_scale_downsizes_solid_frames_exactly() {
    let f = solid(8, 6, [0, 128, 255, 255]);
    let options = FrameCacheOptions {
        scale: FrameCacheScale::Half,
        ..FrameCacheOptions::default()
    };
    let c = CachedFrame::encode(&f, &options).unwrap();
    assert_eq!(c.size(), PixelSize::new(4, 3));
    assert_eq!(c.to_rgba(), solid(4, 3, [0, 128, 255, 255]));
}

#[test]
fn rgb565_halves_memory_and_keeps_extremes() {
    let f = solid(3, 3, [255, 0, 255, 255]);
    let options = FrameCacheOptions {
        color_type: FrameCacheColorType::Rgb565,
        ..FrameCacheOptions::default()
    };
    let c = CachedFrame::encode(&f, &options).unwrap();
    assert_eq!(c.byte_len(), 3 * 3 * 2);
    assert_eq!(c.to_rgba(), f);
}

#[test]
fn rgb565_quantizes_and_drops_alpha() {
    let f = solid(1, 1, [100, 50, 25, 128]);
    let options = FrameCacheOptions {
        color_type: FrameCacheColorType::Rgb565,
        ..FrameCacheOptions::default()
    };
    let px = CachedFrame::encode(&f, &options)
        .unwrap()
        .to_rgba()
        .pixel(0, 0)
        .unwrap();
    assert_eq!(px[3], 255);
    for (got, want) in px[..3].iter().zip([100u8, 50, 25]) {
        assert!(got.abs_diff(want) <= 8, "{got} vs {want}");
    }
}

#[test]
fn mismatched_buffer_is_rejected_when_resizing() {
    let mut f = solid(4, 4, [0, 0, 0, 255]);
    f.data.truncate(8);
    let options = FrameCacheOptions {
        scale: FrameCacheScale::Half,
        ..FrameCacheOptions::default()
    };
    assert!(CachedFrame::encode(&f, &options).is_err());
}
