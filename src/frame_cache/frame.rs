use crate::foundation::core::PixelSize;
use crate::foundation::error::{CacheError, CacheResult};
use crate::frame_cache::options::{FrameCacheColorType, FrameCacheOptions};
use crate::render::surface::FrameRGBA;
use std::sync::Arc;

/// A rendered frame held by the frame cache, already converted to the cache's scale and pixel
/// format. Clones share the pixel buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CachedFrame {
    size: PixelSize,
    color_type: FrameCacheColorType,
    data: Arc<[u8]>,
}

impl CachedFrame {
    /// Convert a premultiplied RGBA8 frame into the representation selected by `options`.
    pub fn encode(frame: &FrameRGBA, options: &FrameCacheOptions) -> CacheResult<Self> {
        let target = options.output_size(frame.size());
        let rgba = if target == frame.size() {
            std::borrow::Cow::Borrowed(frame.data.as_slice())
        } else {
            std::borrow::Cow::Owned(downscale(frame, target)?)
        };

        let data: Arc<[u8]> = match options.color_type {
            FrameCacheColorType::Rgba8888 => Arc::from(&*rgba),
            FrameCacheColorType::Rgb565 => rgba
                .chunks_exact(4)
                .flat_map(|px| pack_rgb565(px[0], px[1], px[2]).to_le_bytes())
                .collect(),
        };

        Ok(Self {
            size: target,
            color_type: options.color_type,
            data,
        })
    }

    /// Stored dimensions.
    pub fn size(&self) -> PixelSize {
        self.size
    }

    /// Stored pixel format.
    pub fn color_type(&self) -> FrameCacheColorType {
        self.color_type
    }

    /// Bytes held.
    pub fn byte_len(&self) -> usize {
        self.data.len()
    }

    /// Expand back to premultiplied RGBA8 at the stored size.
    ///
    /// `Rgb565` frames come back opaque; their color is what the premultiplied source showed over
    /// black.
    pub fn to_rgba(&self) -> FrameRGBA {
        let data = match self.color_type {
            FrameCacheColorType::Rgba8888 => self.data.to_vec(),
            FrameCacheColorType::Rgb565 => self
                .data
                .chunks_exact(2)
                .flat_map(|px| {
                    let [r, g, b] = unpack_rgb565(u16::from_le_bytes([px[0], px[1]]));
                    [r, g, b, 255]
                })
                .collect(),
        };
        FrameRGBA {
            width: self.size.width,
            height: self.size.height,
            data,
            premultiplied: true,
        }
    }
}

fn downscale(frame: &FrameRGBA, target: PixelSize) -> CacheResult<Vec<u8>> {
    let img = image::RgbaImage::from_raw(frame.width, frame.height, frame.data.clone())
        .ok_or_else(|| {
            CacheError::validation(format!(
                "frame buffer does not match {}x{}",
                frame.width, frame.height
            ))
        })?;
    // Premultiplied channels filter correctly as-is.
    let out = image::imageops::resize(
        &img,
        target.width,
        target.height,
        image::imageops::FilterType::Triangle,
    );
    Ok(out.into_raw())
}

fn pack_rgb565(r: u8, g: u8, b: u8) -> u16 {
    (u16::from(r >> 3) << 11) | (u16::from(g >> 2) << 5) | u16::from(b >> 3)
}

fn unpack_rgb565(v: u16) -> [u8; 3] {
    let r = ((v >> 11) & 0x1f) as u8;
    let g = ((v >> 5) & 0x3f) as u8;
    let b = (v & 0x1f) as u8;
    [(r << 3) | (r >> 2), (g << 2) | (g >> 4), (b << 3) | (b >> 2)]
}

#[cfg(test)]
#[path = "../../tests/unit/frame_cache/frame.rs"]
mod tests;
