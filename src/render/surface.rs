use crate::foundation::core::PixelSize;
use crate::foundation::error::{CacheError, CacheResult};
use crate::foundation::math::over;

/// A rendered frame as RGBA8 pixels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    /// Whether the `data` is premultiplied alpha.
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// Frame dimensions.
    pub fn size(&self) -> PixelSize {
        PixelSize::new(self.width, self.height)
    }

    /// Premultiplied RGBA8 pixel at `(x, y)`, or `None` outside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        self.data
            .get(i..i + 4)
            .map(|px| [px[0], px[1], px[2], px[3]])
    }
}

/// An owned premultiplied RGBA8 raster.
///
/// Dropping a surface releases its pixels; cache entries own their surfaces outright.
pub struct Surface {
    pixmap: vello_cpu::Pixmap,
}

impl std::fmt::Debug for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Surface")
            .field("width", &self.pixmap.width())
            .field("height", &self.pixmap.height())
            .finish()
    }
}

impl Surface {
    fn new(width: u16, height: u16) -> Self {
        let mut pixmap = vello_cpu::Pixmap::new(width, height);
        pixmap.data_as_u8_slice_mut().fill(0);
        Self { pixmap }
    }

    /// Pixel dimensions.
    pub fn size(&self) -> PixelSize {
        PixelSize::new(u32::from(self.pixmap.width()), u32::from(self.pixmap.height()))
    }

    /// Bytes held by the surface.
    pub fn byte_len(&self) -> usize {
        self.size().rgba8_byte_len()
    }

    /// Premultiplied RGBA8 bytes, row-major.
    pub fn data(&self) -> &[u8] {
        self.pixmap.data_as_u8_slice()
    }

    pub(crate) fn pixmap_mut(&mut self) -> &mut vello_cpu::Pixmap {
        &mut self.pixmap
    }

    /// Fill every pixel with a premultiplied color.
    pub fn clear(&mut self, premul: [u8; 4]) {
        for px in self.pixmap.data_as_u8_slice_mut().chunks_exact_mut(4) {
            px.copy_from_slice(&premul);
        }
    }

    /// Composite `src` over this surface with its top-left corner at `(x, y)`, clipped to the
    /// destination.
    pub fn draw_surface(&mut self, src: &Surface, x: i32, y: i32, opacity: f32) {
        let dst_size = self.size();
        let src_size = src.size();
        let (dw, dh) = (i64::from(dst_size.width), i64::from(dst_size.height));
        let (sw, sh) = (i64::from(src_size.width), i64::from(src_size.height));
        let (x, y) = (i64::from(x), i64::from(y));

        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = (x + sw).min(dw);
        let y1 = (y + sh).min(dh);
        if x0 >= x1 || y0 >= y1 {
            return;
        }

        let src_bytes = src.data();
        let dst_bytes = self.pixmap.data_as_u8_slice_mut();
        let row_px = (x1 - x0) as usize;
        for dy in y0..y1 {
            let sy = dy - y;
            let s_start = ((sy * sw + (x0 - x)) * 4) as usize;
            let d_start = ((dy * dw + x0) * 4) as usize;
            let s_row = &src_bytes[s_start..s_start + row_px * 4];
            let d_row = &mut dst_bytes[d_start..d_start + row_px * 4];
            for (d, s) in d_row.chunks_exact_mut(4).zip(s_row.chunks_exact(4)) {
                let out = over([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]], opacity);
                d.copy_from_slice(&out);
            }
        }
    }

    /// Copy the pixels out into a frame.
    pub fn to_frame(&self) -> FrameRGBA {
        let size = self.size();
        FrameRGBA {
            width: size.width,
            height: size.height,
            data: self.data().to_vec(),
            premultiplied: true,
        }
    }
}

/// Allocates render targets for rasterization.
///
/// Implementations report exhaustion as [`CacheError::Allocation`]; callers treat that as a
/// cache miss rather than a fatal error.
pub trait CanvasFactory {
    /// Allocate a transparent surface of `size`.
    fn create_surface(&self, size: PixelSize) -> CacheResult<Surface>;
}

/// Default byte budget for a single surface.
pub const DEFAULT_MAX_SURFACE_BYTES: usize = 256 * 1024 * 1024;

/// CPU surface allocator backed by `vello_cpu` pixmaps.
#[derive(Debug, Clone, Copy)]
pub struct CpuCanvasFactory {
    max_surface_bytes: usize,
}

impl Default for CpuCanvasFactory {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SURFACE_BYTES)
    }
}

impl CpuCanvasFactory {
    /// Factory refusing any single surface larger than `max_surface_bytes`.
    pub fn new(max_surface_bytes: usize) -> Self {
        Self { max_surface_bytes }
    }

    /// Per-surface byte limit.
    pub fn max_surface_bytes(&self) -> usize {
        self.max_surface_bytes
    }
}

impl CanvasFactory for CpuCanvasFactory {
    fn create_surface(&self, size: PixelSize) -> CacheResult<Surface> {
        if size.is_empty() {
            return Err(CacheError::allocation(format!(
                "empty surface {}x{}",
                size.width, size.height
            )));
        }
        let w: u16 = size.width.try_into().map_err(|_| {
            CacheError::allocation(format!("surface width exceeds u16: {}", size.width))
        })?;
        let h: u16 = size.height.try_into().map_err(|_| {
            CacheError::allocation(format!("surface height exceeds u16: {}", size.height))
        })?;
        if size.rgba8_byte_len() > self.max_surface_bytes {
            return Err(CacheError::allocation(format!(
                "surface {}x{} exceeds {} byte limit",
                size.width, size.height, self.max_surface_bytes
            )));
        }
        Ok(Surface::new(w, h))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/surface.rs"]
mod tests;
