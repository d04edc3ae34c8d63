//! Symbol definitions and the symbol catalog

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::credits::Multiplier;
use crate::error::{ReelError, ReelResult};

/// Position of a symbol in its catalog. Catalog order is also the
/// tie-break order used by the payline evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SymbolId(pub u32);

impl SymbolId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A symbol definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symbol {
    /// Stable value key (e.g., "diamond", "cherries")
    pub key: String,
    /// Display name (e.g., "DIAMOND", "CHERRY")
    pub name: String,
    /// Payout multiplier for a winning line on this symbol
    pub multiplier: Multiplier,
    /// Wild - substitutes for any other symbol on a line
    #[serde(default)]
    pub wild: bool,
}

impl Symbol {
    /// Create a regular paying symbol
    pub fn regular(key: impl Into<String>, name: impl Into<String>, multiplier: Multiplier) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            multiplier,
            wild: false,
        }
    }

    /// Create a wild symbol
    pub fn wild(key: impl Into<String>, name: impl Into<String>, multiplier: Multiplier) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            multiplier,
            wild: true,
        }
    }
}

/// The two highest-paying non-wild symbols
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PremiumTiers {
    pub top: Option<SymbolId>,
    pub second: Option<SymbolId>,
}

impl PremiumTiers {
    pub fn contains(&self, id: SymbolId) -> bool {
        self.top == Some(id) || self.second == Some(id)
    }
}

/// Ordered set of unique symbols with exactly one wild
#[derive(Debug, Clone)]
pub struct SymbolCatalog {
    symbols: Vec<Symbol>,
    wild_id: SymbolId,
    premium: PremiumTiers,
}

impl SymbolCatalog {
    /// Validate and index a list of symbols
    pub fn new(symbols: Vec<Symbol>) -> ReelResult<Self> {
        if symbols.is_empty() {
            return Err(ReelError::EmptyCatalog);
        }

        for (i, symbol) in symbols.iter().enumerate() {
            if symbols[..i].iter().any(|s| s.key == symbol.key) {
                return Err(ReelError::DuplicateSymbol(symbol.key.clone()));
            }
        }

        let wilds: Vec<usize> = symbols
            .iter()
            .enumerate()
            .filter(|(_, s)| s.wild)
            .map(|(i, _)| i)
            .collect();
        let wild_id = match wilds.as_slice() {
            [only] => SymbolId(*only as u32),
            _ => return Err(ReelError::WildCount(wilds.len())),
        };

        let premium = rank_premium(&symbols);

        Ok(Self {
            symbols,
            wild_id,
            premium,
        })
    }

    /// The seven-symbol catalog of the classic three-reel machine
    pub fn reference() -> Self {
        let symbols = reference_symbols();
        let premium = rank_premium(&symbols);
        Self {
            symbols,
            wild_id: SymbolId(0),
            premium,
        }
    }

    pub fn get(&self, id: SymbolId) -> Option<&Symbol> {
        self.symbols.get(id.index())
    }

    pub fn id_of(&self, key: &str) -> Option<SymbolId> {
        self.symbols
            .iter()
            .position(|s| s.key == key)
            .map(|i| SymbolId(i as u32))
    }

    /// The single wild symbol
    pub fn wild_id(&self) -> SymbolId {
        self.wild_id
    }

    pub fn is_wild(&self, id: SymbolId) -> bool {
        id == self.wild_id
    }

    pub fn premium_tiers(&self) -> PremiumTiers {
        self.premium
    }

    /// Symbols with their ids, in catalog order
    pub fn iter(&self) -> impl Iterator<Item = (SymbolId, &Symbol)> {
        self.symbols
            .iter()
            .enumerate()
            .map(|(i, s)| (SymbolId(i as u32), s))
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Display name for an id, `"?"` when the id is not in the catalog
    pub fn name_of(&self, id: SymbolId) -> &str {
        self.get(id).map(|s| s.name.as_str()).unwrap_or("?")
    }
}

impl Default for SymbolCatalog {
    fn default() -> Self {
        Self::reference()
    }
}

/// Highest multiplier first; equal multipliers keep catalog order
fn rank_premium(symbols: &[Symbol]) -> PremiumTiers {
    let mut regular: Vec<(SymbolId, Multiplier)> = symbols
        .iter()
        .enumerate()
        .filter(|(_, s)| !s.wild)
        .map(|(i, s)| (SymbolId(i as u32), s.multiplier))
        .collect();
    regular.sort_by(|a, b| b.1.cmp(&a.1));

    PremiumTiers {
        top: regular.first().map(|(id, _)| *id),
        second: regular.get(1).map(|(id, _)| *id),
    }
}

/// Symbol list of the classic machine, wild first, then by descending payout
pub fn reference_symbols() -> Vec<Symbol> {
    vec![
        Symbol::wild("diamond", "DIAMOND", Multiplier::whole(100)),
        Symbol::regular("triple-sevens", "TRIPLE SEVENS", Multiplier::whole(75)),
        Symbol::regular("seven", "SEVEN", Multiplier::whole(50)),
        Symbol::regular("lemon", "LEMON", Multiplier::from_hundredths(150)),
        Symbol::regular("watermelon", "WATERMELON", Multiplier::from_hundredths(120)),
        Symbol::regular("plum", "PLUM", Multiplier::whole(1)),
        Symbol::regular("cherries", "CHERRY", Multiplier::from_hundredths(50)),
    ]
}

/// Per-reel symbol counts of the classic machine (90 stops per reel).
/// SEVEN is catalogued but never placed on a reel.
pub fn reference_reel_frequencies() -> IndexMap<String, u32> {
    [
        ("cherries", 25),
        ("lemon", 20),
        ("watermelon", 15),
        ("plum", 20),
        ("diamond", 5),
        ("triple-sevens", 5),
    ]
    .into_iter()
    .map(|(key, count)| (key.to_string(), count))
    .collect()
}
