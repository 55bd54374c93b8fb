use rgb::RGBA8;

use crate::error::EgaError;

/// A plain RGBA8 image: the quantizer's input and the target of
/// [`IndexedBitmap::decode`](crate::IndexedBitmap::decode).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbaImage {
    width: u32,
    height: u32,
    pixels: Vec<RGBA8>,
}

impl RgbaImage {
    /// Fully transparent black image.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![RGBA8::default(); width as usize * height as usize],
        }
    }

    /// Wrap row-major pixels. Fails if the length is not `width * height`.
    pub fn from_pixels(pixels: Vec<RGBA8>, width: u32, height: u32) -> Result<Self, EgaError> {
        if pixels.len() != width as usize * height as usize {
            return Err(EgaError::DimensionMismatch {
                len: pixels.len(),
                width,
                height,
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
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

    pub fn pixels(&self) -> &[RGBA8] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [RGBA8] {
        &mut self.pixels
    }

    /// `None` outside the image.
    pub fn pixel(&self, x: u32, y: u32) -> Option<RGBA8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    pub fn into_pixels(self) -> Vec<RGBA8> {
        self.pixels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_pixels_checks_length() {
        let err = RgbaImage::from_pixels(vec![RGBA8::default(); 5], 2, 3).unwrap_err();
        assert_eq!(
            err,
            EgaError::DimensionMismatch {
                len: 5,
                width: 2,
                height: 3
            }
        );
        assert!(RgbaImage::from_pixels(vec![RGBA8::default(); 6], 2, 3).is_ok());
    }

    #[test]
    fn pixel_lookup() {
        let mut img = RgbaImage::new(3, 2);
        img.pixels_mut()[4] = RGBA8::new(1, 2, 3, 4);
        assert_eq!(img.pixel(1, 1), Some(RGBA8::new(1, 2, 3, 4)));
        assert_eq!(img.pixel(3, 0), None);
        assert_eq!(img.pixel(0, 2), None);
    }

    #[test]
    fn empty_image() {
        let img = RgbaImage::new(0, 0);
        assert!(img.pixels().is_empty());
        assert_eq!(img.size(), (0, 0));
    }
}
