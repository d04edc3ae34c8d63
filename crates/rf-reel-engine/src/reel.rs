//! Reel strips: weighted construction, position sampling and window extraction

use indexmap::IndexMap;
use log::debug;
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::error::{ReelError, ReelResult};
use crate::symbols::{SymbolCatalog, SymbolId};

/// Number of reels on the machine
pub const REEL_COUNT: usize = 3;

/// Visible symbols per reel
pub const WINDOW_SIZE: usize = 3;

/// The visible symbols of one reel, top to bottom
pub type Window = [SymbolId; WINDOW_SIZE];

/// A reel strip. Always holds at least [`WINDOW_SIZE`] symbols.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reel {
    /// Reel index (0 = leftmost)
    index: u8,
    /// Symbol IDs in strip order
    symbols: Vec<SymbolId>,
}

impl Reel {
    /// Create a reel from an explicit strip
    pub fn from_symbols(index: u8, symbols: Vec<SymbolId>) -> ReelResult<Self> {
        if symbols.is_empty() {
            return Err(ReelError::EmptyReel);
        }
        if symbols.len() < WINDOW_SIZE {
            return Err(ReelError::ReelTooShort {
                len: symbols.len(),
                min: WINDOW_SIZE,
            });
        }
        Ok(Self { index, symbols })
    }

    /// Expand a frequency table and shuffle it.
    ///
    /// The strip holds exactly `count` copies of each keyed symbol; the order
    /// is a uniform random permutation (Fisher–Yates) drawn from `rng`.
    pub fn build<R: Rng + ?Sized>(
        index: u8,
        catalog: &SymbolCatalog,
        frequencies: &IndexMap<String, u32>,
        rng: &mut R,
    ) -> ReelResult<Self> {
        let total: usize = frequencies.values().map(|&c| c as usize).sum();
        let mut symbols = Vec::with_capacity(total);

        for (key, &count) in frequencies {
            let id = catalog
                .id_of(key)
                .ok_or_else(|| ReelError::UnknownSymbol(key.clone()))?;
            symbols.extend(std::iter::repeat_n(id, count as usize));
        }

        symbols.shuffle(rng);
        Self::from_symbols(index, symbols)
    }

    pub fn index(&self) -> u8 {
        self.index
    }

    pub fn symbols(&self) -> &[SymbolId] {
        &self.symbols
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Symbol at position (wraps around)
    pub fn symbol_at(&self, position: usize) -> SymbolId {
        self.symbols[position % self.symbols.len()]
    }

    /// The three symbols at `position`, `position + 1`, `position + 2`,
    /// wrapping past the end of the strip
    pub fn window(&self, position: usize) -> Window {
        std::array::from_fn(|row| self.symbol_at(position + row))
    }

    /// Count of each catalog symbol on this strip, in catalog order
    pub fn counts(&self, catalog: &SymbolCatalog) -> Vec<(SymbolId, usize)> {
        catalog
            .iter()
            .map(|(id, _)| (id, self.symbols.iter().filter(|&&s| s == id).count()))
            .collect()
    }
}

/// How a start position is drawn for each spin
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplingMode {
    /// Uniform over `[0, len - 3]`; a window never wraps
    #[default]
    Bounded,
    /// Uniform over `[0, len)`; windows near the end wrap to the start
    Circular,
}

impl SamplingMode {
    /// Draw a start position for `reel`
    pub fn sample<R: Rng + ?Sized>(self, reel: &Reel, rng: &mut R) -> usize {
        match self {
            SamplingMode::Bounded => rng.random_range(0..=reel.len() - WINDOW_SIZE),
            SamplingMode::Circular => rng.random_range(0..reel.len()),
        }
    }
}

/// One reel per column, built together at machine start
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReelSet {
    reels: [Reel; REEL_COUNT],
}

impl ReelSet {
    /// Build every reel from the same frequency table with independent shuffles
    pub fn build<R: Rng + ?Sized>(
        catalog: &SymbolCatalog,
        frequencies: &IndexMap<String, u32>,
        rng: &mut R,
    ) -> ReelResult<Self> {
        let reels = (0..REEL_COUNT as u8)
            .map(|index| Reel::build(index, catalog, frequencies, rng))
            .collect::<ReelResult<Vec<_>>>()?;

        for reel in &reels {
            debug!("Reel {} built: {} symbols", reel.index() + 1, reel.len());
        }

        Self::from_reels(reels)
    }

    pub fn from_reels(reels: Vec<Reel>) -> ReelResult<Self> {
        let count = reels.len();
        let reels: [Reel; REEL_COUNT] = reels.try_into().map_err(|_| {
            ReelError::InvalidConfig(format!("expected {REEL_COUNT} reels, got {count}"))
        })?;
        Ok(Self { reels })
    }

    pub fn reels(&self) -> &[Reel; REEL_COUNT] {
        &self.reels
    }

    pub fn get(&self, index: usize) -> Option<&Reel> {
        self.reels.get(index)
    }

    /// Draw one start position per reel
    pub fn sample_positions<R: Rng + ?Sized>(
        &self,
        mode: SamplingMode,
        rng: &mut R,
    ) -> [usize; REEL_COUNT] {
        std::array::from_fn(|i| mode.sample(&self.reels[i], rng))
    }

    /// Visible windows for the given start positions
    pub fn windows_at(&self, positions: &[usize; REEL_COUNT]) -> [Window; REEL_COUNT] {
        std::array::from_fn(|i| self.reels[i].window(positions[i]))
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::symbols::reference_reel_frequencies;

    fn ids(raw: &[u32]) -> Vec<SymbolId> {
        raw.iter().map(|&i| SymbolId(i)).collect()
    }

    #[test]
    fn test_build_preserves_frequencies() {
        let catalog = SymbolCatalog::reference();
        let frequencies = reference_reel_frequencies();

        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let reel = Reel::build(0, &catalog, &frequencies, &mut rng).unwrap();
            assert_eq!(reel.len(), 90);

            for (id, count) in reel.counts(&catalog) {
                let key = &catalog.get(id).unwrap().key;
                let expected = frequencies.get(key).copied().unwrap_or(0) as usize;
                assert_eq!(count, expected, "count mismatch for {key}");
            }
        }
    }

    #[test]
    fn test_reels_are_shuffled_independently() {
        let catalog = SymbolCatalog::reference();
        let mut rng = StdRng::seed_from_u64(7);
        let set = ReelSet::build(&catalog, &reference_reel_frequencies(), &mut rng).unwrap();
        let [a, b, c] = set.reels();
        assert!(a.symbols() != b.symbols() || b.symbols() != c.symbols());
        assert_eq!(
            set.reels().iter().map(Reel::index).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
    }

    #[test]
    fn test_build_rejects_unknown_key() {
        let catalog = SymbolCatalog::reference();
        let mut frequencies = reference_reel_frequencies();
        frequencies.insert("bell".into(), 4);

        let mut rng = StdRng::seed_from_u64(1);
        let err = Reel::build(0, &catalog, &frequencies, &mut rng).unwrap_err();
        assert!(matches!(err, ReelError::UnknownSymbol(key) if key == "bell"));
    }

    #[test]
    fn test_short_and_empty_reels_rejected() {
        assert!(matches!(Reel::from_symbols(0, vec![]), Err(ReelError::EmptyReel)));
        assert!(matches!(
            Reel::from_symbols(0, ids(&[1, 2])),
            Err(ReelError::ReelTooShort { len: 2, min: 3 })
        ));
    }

    #[test]
    fn test_window_wraps() {
        let reel = Reel::from_symbols(0, ids(&[1, 2, 3, 4])).unwrap();
        assert_eq!(reel.window(0), [SymbolId(1), SymbolId(2), SymbolId(3)]);
        assert_eq!(reel.window(3), [SymbolId(4), SymbolId(1), SymbolId(2)]);
        assert_eq!(reel.symbol_at(9), SymbolId(2));
    }

    #[test]
    fn test_bounded_sampling_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(42);
        for len in 3..=40u32 {
            let reel = Reel::from_symbols(0, (0..len).map(SymbolId).collect()).unwrap();
            for _ in 0..1000 {
                let p = SamplingMode::Bounded.sample(&reel, &mut rng);
                assert!(p <= reel.len() - WINDOW_SIZE, "len {len} sampled {p}");
                assert_eq!(reel.window(p).len(), WINDOW_SIZE);
                // Bounded windows are contiguous, never wrapped
                assert_eq!(reel.window(p)[2], SymbolId((p + 2) as u32));
            }
        }
    }

    #[test]
    fn test_circular_sampling_reaches_wrapped_windows() {
        let mut rng = StdRng::seed_from_u64(3);
        let reel = Reel::from_symbols(0, ids(&[0, 1, 2, 3])).unwrap();
        let mut saw_wrap = false;
        for _ in 0..1000 {
            let p = SamplingMode::Circular.sample(&reel, &mut rng);
            assert!(p < reel.len());
            saw_wrap |= p > reel.len() - WINDOW_SIZE;
        }
        assert!(saw_wrap);
    }

    #[test]
    fn test_reel_set_requires_three_reels() {
        let reel = Reel::from_symbols(0, ids(&[1, 2, 3])).unwrap();
        assert!(ReelSet::from_reels(vec![reel.clone(), reel.clone()]).is_err());
        assert!(ReelSet::from_reels(vec![reel.clone(), reel.clone(), reel]).is_ok());
    }
}
