use bitflags::bitflags;
use rgb::RGBA8;

use crate::error::EgaError;
use crate::image::RgbaImage;
use crate::palette::{Palette, PaletteIndex};
use crate::region::{Point, Rect};

/// Pixel byte for "nothing here".
pub const TRANSPARENT: u8 = 0xFF;

bitflags! {
    /// Cached state that must be rebuilt before use.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Dirty: u8 {
        /// Pixels or palette changed since the last decode.
        const DECODE = 1 << 0;
        /// Geometry changed. Reserved for plane/offset caches.
        const LAYOUT = 1 << 1;
        const ALL = Self::DECODE.bits() | Self::LAYOUT.bits();
    }
}

/// One byte per pixel: a palette index in `0..16`, or [`TRANSPARENT`].
///
/// Decoding to RGBA is memoized until the pixels or the palette change.
#[derive(Debug)]
pub struct IndexedBitmap {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    /// RGBA output of the last decode, same length as `pixels`.
    decoded: Option<Vec<RGBA8>>,
    /// Palette `decoded` was built with.
    decoded_palette: Option<Palette>,
    dirty: Dirty,
}

impl IndexedBitmap {
    /// Fully transparent bitmap. Either dimension may be zero.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![TRANSPARENT; width as usize * height as usize],
            decoded: None,
            decoded_palette: None,
            dirty: Dirty::ALL,
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.pixels.len()
    }

    /// The whole bitmap as a clip region; what draw calls use when given none.
    pub fn full_region(&self) -> Rect {
        Rect::from_size(self.width, self.height)
    }

    /// Raw row-major pixel bytes.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn dirty(&self) -> Dirty {
        self.dirty
    }

    /// Mutable pixel access for drawing. Invalidates every cache.
    pub(crate) fn pixels_mut(&mut self) -> &mut [u8] {
        self.dirty = Dirty::ALL;
        &mut self.pixels
    }

    /// Buffer offset of a bitmap-space point, `None` outside the bitmap.
    #[inline]
    pub(crate) fn offset_of(&self, p: Point) -> Option<usize> {
        if p.x < 0 || p.y < 0 {
            return None;
        }
        let (x, y) = (p.x as u32, p.y as u32);
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    /// Change dimensions in place.
    ///
    /// The top-left overlap of the old content survives, new area is
    /// transparent, and the decode cache is dropped.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == self.width && height == self.height {
            return;
        }

        let copy_width = width.min(self.width) as usize;
        let copy_height = height.min(self.height) as usize;
        let mut resized = vec![TRANSPARENT; width as usize * height as usize];

        if copy_width > 0 {
            let old_stride = self.width as usize;
            let new_stride = width as usize;
            for (dst, src) in resized
                .chunks_exact_mut(new_stride)
                .zip(self.pixels.chunks_exact(old_stride))
                .take(copy_height)
            {
                dst[..copy_width].copy_from_slice(&src[..copy_width]);
            }
        }

        self.width = width;
        self.height = height;
        self.pixels = resized;
        self.decoded = None;
        self.dirty = Dirty::ALL;
    }

    /// Palette index at a region-local position.
    ///
    /// `None` when the position falls outside the region or the bitmap, or
    /// when the pixel is transparent.
    pub fn get_color_at(&self, x: i32, y: i32, region: Option<&Rect>) -> Option<PaletteIndex> {
        let full = self.full_region();
        let region = region.unwrap_or(&full);
        let local = Point::new(x, y);
        if !region.contains_local(local) {
            return None;
        }
        let p = Point::new(x.checked_add(region.x)?, y.checked_add(region.y)?);
        let offset = self.offset_of(p)?;
        PaletteIndex::new(self.pixels[offset])
    }

    /// Write the bitmap, colored through `palette`, into `target`.
    ///
    /// The RGBA result is cached and only rebuilt after the pixels or the
    /// palette change. Transparent pixels decode to all-zero RGBA.
    pub fn decode(&mut self, target: &mut RgbaImage, palette: &Palette) -> Result<(), EgaError> {
        if target.size() != self.size() {
            return Err(EgaError::ShapeMismatch {
                expected: self.size(),
                actual: target.size(),
            });
        }

        if self.decoded.is_none() {
            self.dirty |= Dirty::DECODE;
        }
        if self.decoded_palette.as_ref() != Some(palette) {
            self.decoded_palette = Some(*palette);
            self.dirty |= Dirty::DECODE;
        }

        let pixel_count = self.pixels.len();
        let decoded = self
            .decoded
            .get_or_insert_with(|| vec![RGBA8::default(); pixel_count]);

        if self.dirty.contains(Dirty::DECODE) {
            log::debug!("rebuilding decode cache for {}x{} bitmap", self.width, self.height);
            for (out, &p) in decoded.iter_mut().zip(self.pixels.iter()) {
                *out = match PaletteIndex::new(p) {
                    Some(index) => {
                        let c = palette.rgb(index);
                        RGBA8::new(c.r, c.g, c.b, 255)
                    }
                    None => RGBA8::default(),
                };
            }
            self.dirty.remove(Dirty::DECODE);
        }

        target.pixels_mut().copy_from_slice(decoded.as_slice());
        Ok(())
    }

    /// Reserved for a `(width, height)` header followed by the raw index bytes.
    pub fn serialize(&self) -> Result<Vec<u8>, EgaError> {
        Err(EgaError::SerializationUnsupported)
    }

    /// Counterpart of [`serialize`](Self::serialize).
    pub fn deserialize(_bytes: &[u8]) -> Result<Self, EgaError> {
        Err(EgaError::SerializationUnsupported)
    }
}

/// Copies pixel data only; the copy starts with no decode cache.
impl Clone for IndexedBitmap {
    fn clone(&self) -> Self {
        Self {
            width: self.width,
            height: self.height,
            pixels: self.pixels.clone(),
            decoded: None,
            decoded_palette: None,
            dirty: Dirty::ALL,
        }
    }
}
