#![forbid(unsafe_code)]

pub mod affinity;
pub mod bitmap;
pub mod color;
pub mod error;
pub mod hardware;
pub mod histogram;
pub mod image;
pub mod palette;
mod quantize;
pub mod raster;
pub mod region;

pub use bitmap::{Dirty, IndexedBitmap, TRANSPARENT};
pub use color::DistanceMetric;
pub use error::EgaError;
pub use hardware::{hardware_color_to_rgb, nearest_hardware_color, HardwareColor};
pub use image::RgbaImage;
pub use palette::{Palette, PaletteConstraints, PaletteIndex, PaletteSlot};
pub use region::{Point, Rect};

use hardware::PALETTE_COLORS;

/// Configuration for palette quantization.
#[derive(Debug, Clone)]
pub struct QuantizeConfig {
    /// Distance used to snap source colors to the gamut and to rank candidates.
    pub metric: DistanceMetric,
    /// Drop unlocked candidates that no used color relies on, even when the
    /// budget is already met.
    pub trim_unused: bool,
}

impl Default for QuantizeConfig {
    fn default() -> Self {
        Self {
            metric: DistanceMetric::GammaTable,
            trim_unused: true,
        }
    }
}

impl QuantizeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn metric(mut self, metric: DistanceMetric) -> Self {
        self.metric = metric;
        self
    }

    pub fn trim_unused(mut self, trim: bool) -> Self {
        self.trim_unused = trim;
        self
    }
}

/// Quantization result.
#[derive(Debug, Clone)]
pub struct QuantizeResult {
    bitmap: IndexedBitmap,
    slots: [Option<HardwareColor>; PALETTE_COLORS],
}

impl QuantizeResult {
    /// The indexed image, transparent wherever the source was not fully opaque.
    pub fn bitmap(&self) -> &IndexedBitmap {
        &self.bitmap
    }

    pub fn into_bitmap(self) -> IndexedBitmap {
        self.bitmap
    }

    /// Chosen color per slot; `None` for slots nothing was assigned to.
    pub fn slots(&self) -> &[Option<HardwareColor>; PALETTE_COLORS] {
        &self.slots
    }

    /// Number of slots holding a color.
    pub fn color_count(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    /// Ready-to-decode palette. Unassigned slots hold black.
    pub fn palette(&self) -> Palette {
        let mut colors = [HardwareColor::BLACK; PALETTE_COLORS];
        for (out, slot) in colors.iter_mut().zip(self.slots.iter()) {
            if let Some(c) = slot {
                *out = *c;
            }
        }
        Palette::new(colors)
    }
}

/// Quantize an RGBA image to at most 16 hardware colors with the default config.
///
/// Pixels with alpha below 255 become transparent.
pub fn quantize(
    image: &RgbaImage,
    constraints: &PaletteConstraints,
) -> Result<QuantizeResult, EgaError> {
    quantize_with(image, constraints, &QuantizeConfig::default())
}

/// Quantize an RGBA image to at most 16 hardware colors.
pub fn quantize_with(
    image: &RgbaImage,
    constraints: &PaletteConstraints,
    config: &QuantizeConfig,
) -> Result<QuantizeResult, EgaError> {
    if constraints.budget() == 0 {
        return Err(EgaError::EmptyBudget);
    }

    // 1. Snap distinct opaque colors to the gamut and count usage
    let hist = histogram::build_hardware_histogram(image.pixels(), config.metric);

    // 2. Pick the palette
    let selection = quantize::select_palette(&hist, constraints, config)?;

    // 3. Index every pixel
    let bitmap = quantize::rasterize(&hist, &selection, image.width(), image.height());

    Ok(QuantizeResult {
        bitmap,
        slots: selection.slots,
    })
}
