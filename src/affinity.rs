use crate::color::DistanceMetric;
use crate::hardware::{HardwareColor, HARDWARE_COLORS};

type Link = Option<u8>;

#[derive(Debug, Clone)]
struct Chain {
    head: Link,
    next: [Link; HARDWARE_COLORS],
    prev: [Link; HARDWARE_COLORS],
    distance: [f32; HARDWARE_COLORS],
}

impl Chain {
    fn new() -> Self {
        Self {
            head: None,
            next: [None; HARDWARE_COLORS],
            prev: [None; HARDWARE_COLORS],
            distance: [0.0; HARDWARE_COLORS],
        }
    }

    /// Link `node` in front of the first entry that is not strictly closer.
    fn insert(&mut self, node: u8, distance: f32) {
        let n = node as usize;
        self.distance[n] = distance;

        let mut prev: Link = None;
        let mut cursor = self.head;
        while let Some(c) = cursor {
            if distance <= self.distance[c as usize] {
                break;
            }
            prev = cursor;
            cursor = self.next[c as usize];
        }

        self.prev[n] = prev;
        self.next[n] = cursor;
        if let Some(c) = cursor {
            self.prev[c as usize] = Some(node);
        }
        match prev {
            Some(p) => self.next[p as usize] = Some(node),
            None => self.head = Some(node),
        }
    }

    fn unlink(&mut self, node: u8) {
        let n = node as usize;
        let (prev, next) = (self.prev[n], self.next[n]);
        match prev {
            Some(p) => self.next[p as usize] = next,
            None => self.head = next,
        }
        if let Some(nx) = next {
            self.prev[nx as usize] = prev;
        }
        self.prev[n] = None;
        self.next[n] = None;
    }
}

/// Candidate affinities for the whole gamut.
///
/// One list per hardware color, linking every surviving candidate by
/// ascending distance, so the head is that color's closest survivor.
#[derive(Debug, Clone)]
pub struct AffinityChains {
    /// Indexed by the hardware color being matched.
    chains: Vec<Chain>,
    /// Bit `i` set while candidate `i` is still linked.
    alive: u64,
}

impl AffinityChains {
    /// Link every hardware color as a candidate for every other.
    ///
    /// Candidates are inserted in ascending code order, and a later
    /// candidate goes in front of an earlier one at equal distance.
    pub fn build(metric: DistanceMetric) -> Self {
        let mut chains = vec![Chain::new(); HARDWARE_COLORS];
        for candidate in HardwareColor::all() {
            for (matched, chain) in HardwareColor::all().zip(chains.iter_mut()) {
                let d = metric.distance_sq(matched.rgb(), candidate.rgb()).sqrt();
                chain.insert(candidate.code(), d);
            }
        }
        Self {
            chains,
            alive: u64::MAX,
        }
    }

    #[inline]
    pub fn is_alive(&self, candidate: HardwareColor) -> bool {
        self.alive & (1 << candidate.code()) != 0
    }

    pub fn alive_count(&self) -> usize {
        self.alive.count_ones() as usize
    }

    /// Closest surviving candidate for `matched`.
    #[inline]
    pub fn closest(&self, matched: HardwareColor) -> Option<HardwareColor> {
        self.chains[matched.code() as usize]
            .head
            .and_then(HardwareColor::new)
    }

    /// Survivors for `matched` in ascending distance order.
    pub fn ranked(&self, matched: HardwareColor) -> Vec<(HardwareColor, f32)> {
        let chain = &self.chains[matched.code() as usize];
        let mut out = Vec::new();
        let mut cursor = chain.head;
        while let Some(c) = cursor {
            if let Some(hw) = HardwareColor::new(c) {
                out.push((hw, chain.distance[c as usize]));
            }
            cursor = chain.next[c as usize];
        }
        out
    }

    /// Unlink `candidate` from every chain.
    pub fn remove(&mut self, candidate: HardwareColor) {
        if !self.is_alive(candidate) {
            return;
        }
        for chain in &mut self.chains {
            chain.unlink(candidate.code());
        }
        self.alive &= !(1 << candidate.code());
    }

    /// Usage-weighted error added if `candidate` were removed.
    ///
    /// Sums, over every hardware color whose closest survivor is `candidate`,
    /// the usage of that color times the step to its next-closest survivor.
    /// Losing the last survivor of a used color costs infinity.
    pub fn removal_cost(&self, candidate: HardwareColor, usage: &[u32; HARDWARE_COLORS]) -> f32 {
        let code = candidate.code();
        let mut cost = 0.0f32;
        for (chain, &count) in self.chains.iter().zip(usage.iter()) {
            if chain.head != Some(code) || count == 0 {
                continue;
            }
            let own = chain.distance[code as usize];
            match chain.next[code as usize] {
                Some(next) => cost += count as f32 * (chain.distance[next as usize] - own),
                None => return f32::INFINITY,
            }
        }
        cost
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hw(code: u8) -> HardwareColor {
        HardwareColor::new(code).unwrap()
    }

    #[test]
    fn every_color_is_its_own_closest() {
        let chains = AffinityChains::build(DistanceMetric::GammaTable);
        assert_eq!(chains.alive_count(), 64);
        for c in HardwareColor::all() {
            assert_eq!(chains.closest(c), Some(c));
        }
    }

    #[test]
    fn chains_sorted_ascending() {
        let chains = AffinityChains::build(DistanceMetric::Linear);
        for c in HardwareColor::all() {
            let ranked = chains.ranked(c);
            assert_eq!(ranked.len(), 64);
            assert!(ranked.windows(2).all(|w| w[0].1 <= w[1].1));
            assert_eq!(ranked[0].1, 0.0);
        }
    }

    #[test]
    fn equal_distance_later_candidate_first() {
        let chains = AffinityChains::build(DistanceMetric::GammaTable);
        for c in HardwareColor::all() {
            for w in chains.ranked(c).windows(2) {
                if w[0].1 == w[1].1 {
                    assert!(w[0].0 > w[1].0, "tie order wrong for {c:?}");
                }
            }
        }
    }

    #[test]
    fn removal_promotes_next() {
        let mut chains = AffinityChains::build(DistanceMetric::GammaTable);
        let target = hw(36);
        let second = chains.ranked(target)[1].0;

        chains.remove(target);
        assert!(!chains.is_alive(target));
        assert_eq!(chains.alive_count(), 63);
        assert_eq!(chains.closest(target), Some(second));
        for c in HardwareColor::all() {
            assert!(chains.ranked(c).iter().all(|(k, _)| *k != target));
        }

        // removing twice is harmless
        chains.remove(target);
        assert_eq!(chains.alive_count(), 63);
    }

    #[test]
    fn removal_cost_weights_usage() {
        let chains = AffinityChains::build(DistanceMetric::GammaTable);
        let mut usage = [0u32; HARDWARE_COLORS];
        assert_eq!(chains.removal_cost(hw(5), &usage), 0.0);

        usage[5] = 3;
        let step = chains.ranked(hw(5))[1].1;
        let cost = chains.removal_cost(hw(5), &usage);
        assert!((cost - 3.0 * step).abs() < 1e-5);
        // another candidate is not closest for color 5
        assert_eq!(chains.removal_cost(hw(6), &usage), 0.0);
    }

    #[test]
    fn last_survivor_of_used_color_is_priceless() {
        let mut chains = AffinityChains::build(DistanceMetric::GammaTable);
        for c in HardwareColor::all().filter(|c| c.code() != 9) {
            chains.remove(c);
        }
        let mut usage = [0u32; HARDWARE_COLORS];
        assert_eq!(chains.removal_cost(hw(9), &usage), 0.0);
        usage[0] = 1;
        assert_eq!(chains.removal_cost(hw(9), &usage), f32::INFINITY);
        assert_eq!(chains.closest(hw(0)), Some(hw(9)));
    }
}
