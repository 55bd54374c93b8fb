use rgb::RGB8;

use crate::color::DistanceMetric;

/// Native graphics resolution.
pub const RES_WIDTH: u32 = 320;
pub const RES_HEIGHT: u32 = 200;
pub const TEXT_CHAR_WIDTH: u32 = 8;
pub const TEXT_CHAR_HEIGHT: u32 = 8;
pub const TEXT_RES_WIDTH: u32 = RES_WIDTH / TEXT_CHAR_WIDTH;
pub const TEXT_RES_HEIGHT: u32 = RES_HEIGHT / TEXT_CHAR_HEIGHT;
/// Displayed pixels are taller than they are wide.
pub const PIXEL_HEIGHT: f32 = 1.2;
pub const PIXEL_WIDTH: f32 = 1.0;
pub const PLANES: u32 = 4;

/// Size of the hardware gamut.
pub const HARDWARE_COLORS: usize = 64;
/// Number of palette slots a bitmap can reference at once.
pub const PALETTE_COLORS: usize = 16;

/// Channel intensities for the (high, low) bit pair: 00, 01, 10, 11.
const LEVELS: [u8; 4] = [0, 85, 170, 255];

/// Every hardware code's RGB value, indexed by code.
///
/// Bits 5..3 carry the low-intensity r, g, b bits and bits 2..0 the high ones.
pub const HARDWARE_PALETTE: [RGB8; HARDWARE_COLORS] = build_table();

const fn build_table() -> [RGB8; HARDWARE_COLORS] {
    let mut table = [RGB8 { r: 0, g: 0, b: 0 }; HARDWARE_COLORS];
    let mut i = 0;
    while i < HARDWARE_COLORS {
        let code = i as u8;
        table[i] = RGB8 {
            r: LEVELS[channel_level(code, 5, 2)],
            g: LEVELS[channel_level(code, 4, 1)],
            b: LEVELS[channel_level(code, 3, 0)],
        };
        i += 1;
    }
    table
}

const fn channel_level(code: u8, low_bit: u8, high_bit: u8) -> usize {
    let low = (code >> low_bit) & 1;
    let high = (code >> high_bit) & 1;
    ((high << 1) | low) as usize
}

/// One of the 64 colors the hardware can display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct HardwareColor(u8);

impl HardwareColor {
    pub const BLACK: Self = Self(0);

    /// `None` if `code` is outside `0..64`.
    pub const fn new(code: u8) -> Option<Self> {
        if (code as usize) < HARDWARE_COLORS {
            Some(Self(code))
        } else {
            None
        }
    }

    #[inline]
    pub const fn code(self) -> u8 {
        self.0
    }

    #[inline]
    pub const fn rgb(self) -> RGB8 {
        HARDWARE_PALETTE[self.0 as usize]
    }

    /// All 64 codes in ascending order.
    pub fn all() -> impl Iterator<Item = Self> {
        (0..HARDWARE_COLORS as u8).map(Self)
    }
}

/// `None` if `code` is outside `0..64`.
pub fn hardware_color_to_rgb(code: u8) -> Option<RGB8> {
    HardwareColor::new(code).map(HardwareColor::rgb)
}

/// Closest hardware color by linear scan. Ties keep the lowest code.
pub fn nearest_hardware_color(c: RGB8, metric: DistanceMetric) -> HardwareColor {
    let mut best = HardwareColor::BLACK;
    let mut best_dist = f32::MAX;

    for candidate in HardwareColor::all() {
        let d = metric.distance_sq(c, candidate.rgb());
        if d < best_dist {
            best_dist = d;
            best = candidate;
        }
    }

    best
}
