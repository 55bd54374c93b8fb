//! Greedy palette selection from the 64-color gamut.
//!
//! Every hardware color starts as a candidate. Candidates are removed one at
//! a time, always the one whose loss adds the least usage-weighted error,
//! until the survivors fit the slot budget. Locked candidates are never
//! removed.

use crate::affinity::AffinityChains;
use crate::bitmap::IndexedBitmap;
use crate::error::EgaError;
use crate::hardware::{HardwareColor, HARDWARE_COLORS, PALETTE_COLORS};
use crate::histogram::HardwareHistogram;
use crate::palette::{PaletteConstraints, PaletteIndex, PaletteSlot};
use crate::QuantizeConfig;

/// Outcome of palette selection.
#[derive(Debug, Clone)]
pub(crate) struct Selection {
    /// Chosen color per slot. Unusable and leftover slots stay `None`.
    pub(crate) slots: [Option<HardwareColor>; PALETTE_COLORS],
    /// Slot each hardware color maps to.
    pub(crate) lut: [Option<PaletteIndex>; HARDWARE_COLORS],
}

/// Slot masks per hardware color, plus the number of free slots.
fn read_constraints(constraints: &PaletteConstraints) -> ([u16; HARDWARE_COLORS], usize) {
    let mut locked = [0u16; HARDWARE_COLORS];
    let mut undefined = 0;
    for (i, slot) in constraints.slots().iter().enumerate() {
        match slot {
            PaletteSlot::Locked(c) => locked[c.code() as usize] |= 1 << i,
            PaletteSlot::Undefined => undefined += 1,
            PaletteSlot::Unusable => {}
        }
    }
    (locked, undefined)
}

pub(crate) fn select_palette(
    hist: &HardwareHistogram,
    constraints: &PaletteConstraints,
    config: &QuantizeConfig,
) -> Result<Selection, EgaError> {
    if constraints.budget() == 0 {
        return Err(EgaError::EmptyBudget);
    }

    let (locked, undefined) = read_constraints(constraints);
    let is_locked = |c: HardwareColor| locked[c.code() as usize] != 0;
    // a color locked into several slots is still one candidate
    let budget = undefined + locked.iter().filter(|&&mask| mask != 0).count();

    let usage = hist.usage();
    let mut chains = AffinityChains::build(config.metric);

    while chains.alive_count() > budget {
        let mut cheapest: Option<(HardwareColor, f32)> = None;
        for c in HardwareColor::all().filter(|&c| chains.is_alive(c) && !is_locked(c)) {
            let cost = chains.removal_cost(c, usage);
            if cheapest.map_or(true, |(_, best)| cost < best) {
                cheapest = Some((c, cost));
            }
        }
        let Some((victim, cost)) = cheapest else {
            break;
        };
        log::trace!("eliminating candidate {} (cost {cost})", victim.code());
        chains.remove(victim);
    }

    if config.trim_unused {
        for c in HardwareColor::all() {
            if chains.is_alive(c) && !is_locked(c) && chains.removal_cost(c, usage) == 0.0 {
                log::trace!("trimming unused candidate {}", c.code());
                chains.remove(c);
            }
        }
    }

    let mut survivors: Vec<(HardwareColor, f32)> = HardwareColor::all()
        .filter(|&c| chains.is_alive(c))
        .map(|c| (c, chains.removal_cost(c, usage)))
        .collect();
    // most expensive to lose first; stable so equal costs keep code order
    survivors.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(core::cmp::Ordering::Equal));

    let mut slots = [None; PALETTE_COLORS];
    let mut slot_of: [Option<PaletteIndex>; HARDWARE_COLORS] = [None; HARDWARE_COLORS];

    for &(c, _) in survivors.iter().filter(|(c, _)| is_locked(*c)) {
        let mask = locked[c.code() as usize];
        for index in PaletteIndex::all().filter(|i| mask & (1 << i.get()) != 0) {
            slots[index.get() as usize] = Some(c);
            slot_of[c.code() as usize].get_or_insert(index);
        }
    }

    let mut free = PaletteIndex::all().filter(|&i| constraints.slot(i) == PaletteSlot::Undefined);
    for &(c, _) in survivors.iter().filter(|(c, _)| !is_locked(*c)) {
        if let Some(index) = free.next() {
            slots[index.get() as usize] = Some(c);
            slot_of[c.code() as usize] = Some(index);
        }
    }

    let mut lut = [None; HARDWARE_COLORS];
    for (entry, matched) in lut.iter_mut().zip(HardwareColor::all()) {
        *entry = chains
            .closest(matched)
            .and_then(|c| slot_of[c.code() as usize]);
    }

    log::debug!(
        "selected {} of {} slots from {} distinct colors",
        survivors.len(),
        budget,
        hist.distinct_len()
    );

    Ok(Selection { slots, lut })
}

/// Paint every opaque pixel with its slot; everything else stays transparent.
pub(crate) fn rasterize(
    hist: &HardwareHistogram,
    selection: &Selection,
    width: u32,
    height: u32,
) -> IndexedBitmap {
    let mut bitmap = IndexedBitmap::new(width, height);
    crate::raster::clear_to_transparent(&mut bitmap);

    for (out, hw) in bitmap.pixels_mut().iter_mut().zip(hist.pixel_map()) {
        if let Some(index) = hw.and_then(|c| selection.lut[c.code() as usize]) {
            *out = index.get();
        }
    }
    bitmap
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::DistanceMetric;
    use crate::histogram::build_hardware_histogram;
    use rgb::RGBA8;

    fn hw(code: u8) -> HardwareColor {
        HardwareColor::new(code).unwrap()
    }

    fn idx(i: u8) -> PaletteIndex {
        PaletteIndex::new(i).unwrap()
    }

    fn gamut_pixels(codes: &[u8], repeat: usize) -> Vec<RGBA8> {
        codes
            .iter()
            .flat_map(|&c| {
                let rgb = hw(c).rgb();
                std::iter::repeat(RGBA8::new(rgb.r, rgb.g, rgb.b, 255)).take(repeat)
            })
            .collect()
    }

    fn used(selection: &Selection) -> Vec<HardwareColor> {
        selection.slots.iter().flatten().copied().collect()
    }

    #[test]
    fn exact_gamut_colors_survive() {
        let hist = build_hardware_histogram(&gamut_pixels(&[0, 7, 36, 63], 3), DistanceMetric::GammaTable);
        let sel = select_palette(&hist, &PaletteConstraints::unconstrained(), &QuantizeConfig::default())
            .unwrap();
        let mut colors = used(&sel);
        colors.sort();
        assert_eq!(colors, vec![hw(0), hw(7), hw(36), hw(63)]);
        for code in [0u8, 7, 36, 63] {
            let slot = sel.lut[code as usize].unwrap();
            assert_eq!(sel.slots[slot.get() as usize], Some(hw(code)));
        }
    }

    #[test]
    fn slots_fill_from_zero_by_cost() {
        // 63 dominates, so it is the most costly to lose and lands in slot 0
        let mut pixels = gamut_pixels(&[63], 50);
        pixels.extend(gamut_pixels(&[1], 1));
        let hist = build_hardware_histogram(&pixels, DistanceMetric::GammaTable);
        let sel = select_palette(&hist, &PaletteConstraints::unconstrained(), &QuantizeConfig::default())
            .unwrap();
        assert_eq!(sel.slots[0], Some(hw(63)));
        assert_eq!(sel.slots[1], Some(hw(1)));
        assert!(sel.slots[2..].iter().all(Option::is_none));
    }

    #[test]
    fn budget_limits_survivors() {
        let codes: Vec<u8> = (0..64).collect();
        let hist = build_hardware_histogram(&gamut_pixels(&codes, 1), DistanceMetric::GammaTable);
        let constraints = PaletteConstraints::unconstrained()
            .exclude(idx(0))
            .exclude(idx(5))
            .exclude(idx(15));
        let sel = select_palette(&hist, &constraints, &QuantizeConfig::default()).unwrap();
        assert_eq!(used(&sel).len(), 13);
        assert_eq!(sel.slots[0], None);
        assert_eq!(sel.slots[5], None);
        assert_eq!(sel.slots[15], None);
        assert!(sel.lut.iter().all(Option::is_some));
    }

    #[test]
    fn locked_color_kept_in_place() {
        let mut pixels = gamut_pixels(&[63], 20);
        pixels.extend(gamut_pixels(&[36], 10));
        let hist = build_hardware_histogram(&pixels, DistanceMetric::GammaTable);
        let constraints = PaletteConstraints::unconstrained()
            .lock(idx(3), hw(9))
            .lock(idx(12), hw(9));
        let sel = select_palette(&hist, &constraints, &QuantizeConfig::default()).unwrap();
        assert_eq!(sel.slots[3], Some(hw(9)));
        assert_eq!(sel.slots[12], Some(hw(9)));
        assert_eq!(sel.lut[9], Some(idx(3)));
        // unlocked picks skip the locked slots, costliest first
        assert_eq!(sel.slots[0], Some(hw(63)));
        assert_eq!(sel.slots[1], Some(hw(36)));
        assert_eq!(used(&sel).len(), 4);
    }

    #[test]
    fn equal_cost_removes_lowest_code_first() {
        // white and red are equally far from each other, so losing either
        // costs the same and the lower code goes
        let mut pixels = gamut_pixels(&[63], 10);
        pixels.extend(gamut_pixels(&[36], 10));
        let hist = build_hardware_histogram(&pixels, DistanceMetric::GammaTable);
        let mut slots = [PaletteSlot::Unusable; PALETTE_COLORS];
        slots[4] = PaletteSlot::Undefined;
        let sel = select_palette(&hist, &PaletteConstraints::new(slots), &QuantizeConfig::default())
            .unwrap();
        assert_eq!(used(&sel), vec![hw(63)]);
        assert_eq!(sel.lut[36], Some(idx(4)));
        assert_eq!(sel.lut[63], Some(idx(4)));
    }

    #[test]
    fn unused_candidates_leave_in_code_order() {
        let hist = build_hardware_histogram(&[], DistanceMetric::GammaTable);
        let config = QuantizeConfig::new().trim_unused(false);
        let sel = select_palette(&hist, &PaletteConstraints::unconstrained(), &config).unwrap();
        for (i, slot) in sel.slots.iter().enumerate() {
            assert_eq!(*slot, Some(hw(48 + i as u8)));
        }
    }

    #[test]
    fn fully_locked_palette() {
        let hist = build_hardware_histogram(&gamut_pixels(&[63], 4), DistanceMetric::GammaTable);
        let mut constraints = PaletteConstraints::unconstrained();
        for i in PaletteIndex::all() {
            constraints = constraints.lock(i, hw(i.get()));
        }
        let sel = select_palette(&hist, &constraints, &QuantizeConfig::default()).unwrap();
        for i in 0..16u8 {
            assert_eq!(sel.slots[i as usize], Some(hw(i)));
        }
        // white maps onto whichever locked color is closest
        let white_slot = sel.lut[63].unwrap();
        assert!(white_slot.get() < 16);
    }

    #[test]
    fn empty_budget_fails() {
        let hist = build_hardware_histogram(&gamut_pixels(&[1], 1), DistanceMetric::GammaTable);
        let constraints = PaletteConstraints::new([PaletteSlot::Unusable; PALETTE_COLORS]);
        let err = select_palette(&hist, &constraints, &QuantizeConfig::default()).unwrap_err();
        assert_eq!(err, EgaError::EmptyBudget);
    }

    #[test]
    fn empty_image_selects_nothing() {
        let hist = build_hardware_histogram(&[], DistanceMetric::GammaTable);
        let sel = select_palette(&hist, &PaletteConstraints::unconstrained(), &QuantizeConfig::default())
            .unwrap();
        assert!(used(&sel).is_empty());
    }

    #[test]
    fn without_trim_budget_is_filled() {
        let hist = build_hardware_histogram(&gamut_pixels(&[63], 4), DistanceMetric::GammaTable);
        let config = QuantizeConfig::new().trim_unused(false);
        let sel = select_palette(&hist, &PaletteConstraints::unconstrained(), &config).unwrap();
        assert_eq!(used(&sel).len(), 16);
        assert_eq!(sel.lut[63].map(|i| sel.slots[i.get() as usize]), Some(Some(hw(63))));
    }

    #[test]
    fn rasterize_keeps_transparency() {
        let rgb = hw(63).rgb();
        let pixels = vec![
            RGBA8::new(rgb.r, rgb.g, rgb.b, 255),
            RGBA8::new(rgb.r, rgb.g, rgb.b, 128),
        ];
        let hist = build_hardware_histogram(&pixels, DistanceMetric::GammaTable);
        let sel = select_palette(&hist, &PaletteConstraints::unconstrained(), &QuantizeConfig::default())
            .unwrap();
        let bmp = rasterize(&hist, &sel, 2, 1);
        assert_eq!(bmp.pixels()[0], 0);
        assert_eq!(bmp.pixels()[1], crate::bitmap::TRANSPARENT);
    }
}
