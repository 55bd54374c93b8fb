use std::sync::OnceLock;

use rgb::RGB8;

/// Exponent of the approximate gamma curve behind [`distance_sq`].
const GAMMA: f32 = 2.2;

/// Below this normalized value the transfer curve is linear.
const LINEAR_THRESHOLD: f32 = 0.003_130_8;

/// Which distance function to use when comparing colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DistanceMetric {
    /// Table-driven `(c / 255)^2.2` per channel. Fast, and what palettes are tuned for.
    #[default]
    GammaTable,
    /// Squared distance after [`gamma_expand`] on each channel.
    Linear,
}

impl DistanceMetric {
    /// Squared distance between two colors under this metric.
    #[inline]
    pub fn distance_sq(self, a: RGB8, b: RGB8) -> f32 {
        match self {
            Self::GammaTable => distance_sq(a, b),
            Self::Linear => distance_linear_sq(a, b),
        }
    }
}

/// Hue in degrees [0, 360), saturation and value in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Hsv {
    pub h: f32,
    pub s: f32,
    pub v: f32,
}

/// sRGB-style transfer curve for one 8-bit channel, output in [0, 1].
pub fn gamma_expand(c: u8) -> f32 {
    let x = c as f32 / 255.0;
    if x <= LINEAR_THRESHOLD {
        12.92 * x
    } else {
        1.055 * x.powf(1.0 / 2.4) - 0.055
    }
}

/// Run every channel through [`gamma_expand`].
pub fn srgb_to_linear(c: RGB8) -> [f32; 3] {
    [gamma_expand(c.r), gamma_expand(c.g), gamma_expand(c.b)]
}

/// Hexagonal HSV. Hue stays 0 for grays.
pub fn srgb_to_hsv(c: RGB8) -> Hsv {
    let r = c.r as f32 / 255.0;
    let g = c.g as f32 / 255.0;
    let b = c.b as f32 / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let mut out = Hsv {
        h: 0.0,
        s: 0.0,
        v: max,
    };

    if delta > 0.0 {
        let sector = if max == r {
            ((g - b) / delta).rem_euclid(6.0)
        } else if max == g {
            (b - r) / delta + 2.0
        } else {
            (r - g) / delta + 4.0
        };
        out.h = 60.0 * sector;
    }

    if max > 0.0001 {
        out.s = delta / max;
    }

    out
}

/// `(i / 255)^2.2` for every byte value, built on first use.
fn gamma_table() -> &'static [f32; 256] {
    static TABLE: OnceLock<[f32; 256]> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut table = [0.0f32; 256];
        for (i, v) in table.iter_mut().enumerate() {
            *v = (i as f32 / 255.0).powf(GAMMA);
        }
        table
    })
}

/// Squared channel distance through the gamma lookup table.
///
/// Not a true linear-light distance, but cheap and monotonic per channel,
/// which is all the quantizer needs to rank candidates.
pub fn distance_sq(a: RGB8, b: RGB8) -> f32 {
    let table = gamma_table();
    let dr = table[a.r as usize] - table[b.r as usize];
    let dg = table[a.g as usize] - table[b.g as usize];
    let db = table[a.b as usize] - table[b.b as usize];
    dr * dr + dg * dg + db * db
}

/// Squared distance between the [`srgb_to_linear`] values of two colors.
pub fn distance_linear_sq(a: RGB8, b: RGB8) -> f32 {
    let la = srgb_to_linear(a);
    let lb = srgb_to_linear(b);
    la.iter()
        .zip(lb.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum()
}
