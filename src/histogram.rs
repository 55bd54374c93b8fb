use rgb::{RGB8, RGBA8};

use crate::color::DistanceMetric;
use crate::hardware::{nearest_hardware_color, HardwareColor, HARDWARE_COLORS};

/// How an image's opaque pixels fall onto the hardware gamut.
#[derive(Debug, Clone)]
pub struct HardwareHistogram {
    /// Distinct opaque colors, packed `0xRRGGBB`, ascending.
    distinct: Vec<u32>,
    /// Nearest hardware color for each entry of `distinct`.
    nearest: Vec<HardwareColor>,
    /// Nearest hardware color per pixel, `None` for anything not fully opaque.
    pixel_map: Vec<Option<HardwareColor>>,
    /// Opaque pixel count per hardware code.
    usage: [u32; HARDWARE_COLORS],
}

#[inline]
fn pack(p: RGBA8) -> u32 {
    (p.r as u32) << 16 | (p.g as u32) << 8 | p.b as u32
}

#[inline]
fn unpack(key: u32) -> RGB8 {
    RGB8 {
        r: (key >> 16) as u8,
        g: (key >> 8) as u8,
        b: key as u8,
    }
}

/// Map every fully opaque pixel to its nearest hardware color and count usage.
///
/// The nearest-color search runs once per distinct color, not per pixel.
/// Pixels with alpha below 255 never contribute.
pub fn build_hardware_histogram(pixels: &[RGBA8], metric: DistanceMetric) -> HardwareHistogram {
    let mut distinct: Vec<u32> = pixels
        .iter()
        .filter(|p| p.a == 255)
        .map(|&p| pack(p))
        .collect();
    distinct.sort_unstable();
    distinct.dedup();

    let nearest: Vec<HardwareColor> = distinct
        .iter()
        .map(|&key| nearest_hardware_color(unpack(key), metric))
        .collect();

    let mut usage = [0u32; HARDWARE_COLORS];
    let pixel_map = pixels
        .iter()
        .map(|&p| {
            if p.a != 255 {
                return None;
            }
            let i = distinct.binary_search(&pack(p)).ok()?;
            let hw = nearest[i];
            usage[hw.code() as usize] += 1;
            Some(hw)
        })
        .collect();

    HardwareHistogram {
        distinct,
        nearest,
        pixel_map,
        usage,
    }
}

impl HardwareHistogram {
    /// Number of distinct opaque colors in the image.
    pub fn distinct_len(&self) -> usize {
        self.distinct.len()
    }

    /// Nearest hardware color of an opaque color present in the image.
    pub fn nearest_for(&self, c: RGB8) -> Option<HardwareColor> {
        self.distinct
            .binary_search(&pack(RGBA8::new(c.r, c.g, c.b, 255)))
            .ok()
            .map(|i| self.nearest[i])
    }

    pub fn pixel_map(&self) -> &[Option<HardwareColor>] {
        &self.pixel_map
    }

    pub fn usage(&self) -> &[u32; HARDWARE_COLORS] {
        &self.usage
    }

    #[inline]
    pub fn usage_of(&self, color: HardwareColor) -> u32 {
        self.usage[color.code() as usize]
    }
}
