use rgb::RGB8;

use crate::hardware::{HardwareColor, PALETTE_COLORS};

/// A slot in a 16-entry palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct PaletteIndex(u8);

impl PaletteIndex {
    /// `None` if `index` is outside `0..16`.
    pub const fn new(index: u8) -> Option<Self> {
        if (index as usize) < PALETTE_COLORS {
            Some(Self(index))
        } else {
            None
        }
    }

    #[inline]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// All 16 slots in order.
    pub fn all() -> impl Iterator<Item = Self> {
        (0..PALETTE_COLORS as u8).map(Self)
    }
}

/// Sixteen hardware colors, one per [`PaletteIndex`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Palette {
    colors: [HardwareColor; PALETTE_COLORS],
}

impl Palette {
    pub const fn new(colors: [HardwareColor; PALETTE_COLORS]) -> Self {
        Self { colors }
    }

    #[inline]
    pub fn get(&self, index: PaletteIndex) -> HardwareColor {
        self.colors[index.0 as usize]
    }

    pub fn set(&mut self, index: PaletteIndex, color: HardwareColor) {
        self.colors[index.0 as usize] = color;
    }

    pub fn colors(&self) -> &[HardwareColor; PALETTE_COLORS] {
        &self.colors
    }

    /// RGB value of the color in `index`.
    #[inline]
    pub fn rgb(&self, index: PaletteIndex) -> RGB8 {
        self.get(index).rgb()
    }
}

/// What the quantizer may put in one palette slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PaletteSlot {
    /// This exact color must end up in this slot.
    Locked(HardwareColor),
    /// Free for the quantizer to fill.
    #[default]
    Undefined,
    /// Must stay empty.
    Unusable,
}

/// Per-slot constraints handed to the quantizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PaletteConstraints {
    slots: [PaletteSlot; PALETTE_COLORS],
}

impl PaletteConstraints {
    /// Every slot [`PaletteSlot::Undefined`].
    pub fn unconstrained() -> Self {
        Self::default()
    }

    pub const fn new(slots: [PaletteSlot; PALETTE_COLORS]) -> Self {
        Self { slots }
    }

    /// Lock every slot to the matching color of `palette`.
    pub fn from_palette(palette: &Palette) -> Self {
        let mut slots = [PaletteSlot::Undefined; PALETTE_COLORS];
        for (slot, color) in slots.iter_mut().zip(palette.colors.iter()) {
            *slot = PaletteSlot::Locked(*color);
        }
        Self { slots }
    }

    pub fn lock(mut self, index: PaletteIndex, color: HardwareColor) -> Self {
        self.slots[index.0 as usize] = PaletteSlot::Locked(color);
        self
    }

    pub fn exclude(mut self, index: PaletteIndex) -> Self {
        self.slots[index.0 as usize] = PaletteSlot::Unusable;
        self
    }

    #[inline]
    pub fn slot(&self, index: PaletteIndex) -> PaletteSlot {
        self.slots[index.0 as usize]
    }

    pub fn slots(&self) -> &[PaletteSlot; PALETTE_COLORS] {
        &self.slots
    }

    /// Number of slots that are not [`PaletteSlot::Unusable`].
    pub fn budget(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| !matches!(s, PaletteSlot::Unusable))
            .count()
    }
}
