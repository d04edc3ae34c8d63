//! Paylines, line evaluation and payout calculation

use log::{debug, error};
use serde::{Deserialize, Serialize};

use crate::credits::{Credits, Multiplier};
use crate::error::{ReelError, ReelResult};
use crate::reel::{REEL_COUNT, WINDOW_SIZE, Window};
use crate::symbols::{PremiumTiers, SymbolCatalog, SymbolId};

/// A payline definition: the row (0 = top, 1 = middle, 2 = bottom) read on each reel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payline {
    pub rows: [u8; REEL_COUNT],
}

impl Payline {
    pub const fn new(rows: [u8; REEL_COUNT]) -> Self {
        Self { rows }
    }

    /// Same row across all reels
    pub const fn straight(row: u8) -> Self {
        Self {
            rows: [row; REEL_COUNT],
        }
    }

    /// The symbols this line reads from a set of windows
    pub fn select(&self, windows: &[Window; REEL_COUNT]) -> [SymbolId; REEL_COUNT] {
        std::array::from_fn(|reel| windows[reel][self.rows[reel] as usize])
    }
}

/// The five lines of the classic machine
pub fn standard_paylines() -> Vec<Payline> {
    vec![
        Payline::straight(0),        // Top
        Payline::straight(1),        // Middle
        Payline::straight(2),        // Bottom
        Payline::new([0, 1, 2]),     // Diagonal down
        Payline::new([2, 1, 0]),     // Diagonal up
    ]
}

/// Fixed multipliers for the all-wild line and the two premium tiers.
/// These replace the catalog multiplier for those outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PremiumOverrides {
    pub all_wild: Multiplier,
    pub top_tier: Multiplier,
    pub second_tier: Multiplier,
}

impl Default for PremiumOverrides {
    fn default() -> Self {
        Self {
            all_wild: Multiplier::whole(100),
            top_tier: Multiplier::whole(75),
            second_tier: Multiplier::whole(50),
        }
    }
}

/// Evaluation of a single payline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineResult {
    /// Payline index (0-based)
    pub line_index: u8,
    pub is_win: bool,
    /// Symbol the line pays on
    pub matched: Option<SymbolId>,
    /// Wilds on the line (0-3)
    pub wild_count: u8,
    /// All-wild line or a premium-tier match
    pub is_special: bool,
}

impl LineResult {
    fn no_win(line_index: u8, wild_count: u8) -> Self {
        Self {
            line_index,
            is_win: false,
            matched: None,
            wild_count,
            is_special: false,
        }
    }
}

/// A paid line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineWin {
    /// Payline number (1-based, for display)
    pub line: u8,
    pub symbol_id: SymbolId,
    pub symbol_key: String,
    pub symbol_name: String,
    /// Symbols read by the line, reel order
    pub symbols: [SymbolId; REEL_COUNT],
    /// Multiplier actually applied
    pub multiplier: Multiplier,
    /// Win amount (bet × multiplier)
    pub amount: Credits,
    pub wild_count: u8,
    pub is_special: bool,
}

/// Result of evaluating all paylines for one spin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// Every line, winning or not, in payline order
    pub lines: Vec<LineResult>,
    /// Winning lines only
    pub wins: Vec<LineWin>,
    /// Sum of all line wins
    pub total_win: Credits,
}

impl EvaluationResult {
    pub fn is_win(&self) -> bool {
        !self.wins.is_empty()
    }

    pub fn win_count(&self) -> usize {
        self.wins.len()
    }

    /// True when any line landed three wilds
    pub fn has_all_wild_line(&self) -> bool {
        self.wins.iter().any(|w| w.wild_count as usize == REEL_COUNT)
    }
}

/// Complete paytable
#[derive(Debug, Clone)]
pub struct PayTable {
    catalog: SymbolCatalog,
    paylines: Vec<Payline>,
    premium: PremiumTiers,
    overrides: PremiumOverrides,
}

impl PayTable {
    pub fn new(
        catalog: SymbolCatalog,
        paylines: Vec<Payline>,
        overrides: PremiumOverrides,
    ) -> ReelResult<Self> {
        validate_paylines(&paylines)?;
        let premium = catalog.premium_tiers();
        Ok(Self {
            catalog,
            paylines,
            premium,
            overrides,
        })
    }

    /// Reference catalog, five standard lines, 100/75/50 overrides
    pub fn reference() -> Self {
        let catalog = SymbolCatalog::reference();
        let premium = catalog.premium_tiers();
        Self {
            catalog,
            paylines: standard_paylines(),
            premium,
            overrides: PremiumOverrides::default(),
        }
    }

    pub fn catalog(&self) -> &SymbolCatalog {
        &self.catalog
    }

    pub fn paylines(&self) -> &[Payline] {
        &self.paylines
    }

    pub fn overrides(&self) -> &PremiumOverrides {
        &self.overrides
    }

    /// Evaluate one line of symbols.
    ///
    /// A line wins when one non-wild identity plus the wilds covers every
    /// position, or when every position is wild. The most frequent non-wild
    /// symbol is chosen, ties going to the earlier catalog entry. Lines of
    /// the wrong length or with ids missing from the catalog never win.
    pub fn evaluate_line(&self, line_index: u8, symbols: &[SymbolId]) -> LineResult {
        if symbols.len() != REEL_COUNT {
            error!(
                "Line {}: malformed line with {} symbols: {:?}",
                line_index + 1,
                symbols.len(),
                symbols
            );
            return LineResult::no_win(line_index, 0);
        }
        if let Some(unknown) = symbols.iter().find(|&&id| self.catalog.get(id).is_none()) {
            error!(
                "Line {}: symbol {:?} not in catalog: {:?}",
                line_index + 1,
                unknown,
                symbols
            );
            return LineResult::no_win(line_index, 0);
        }

        let wild_count = symbols.iter().filter(|&&id| self.catalog.is_wild(id)).count();

        if wild_count == symbols.len() {
            return LineResult {
                line_index,
                is_win: true,
                matched: Some(symbols[0]),
                wild_count: wild_count as u8,
                is_special: true,
            };
        }

        let mut counts = vec![0usize; self.catalog.len()];
        for &id in symbols.iter().filter(|&&id| !self.catalog.is_wild(id)) {
            counts[id.index()] += 1;
        }

        // Strictly greater keeps the first catalog entry on ties
        let mut best: Option<(SymbolId, usize)> = None;
        for (i, &count) in counts.iter().enumerate() {
            if count > best.map_or(0, |(_, c)| c) {
                best = Some((SymbolId(i as u32), count));
            }
        }

        match best {
            Some((id, count)) if count + wild_count == symbols.len() => LineResult {
                line_index,
                is_win: true,
                matched: Some(id),
                wild_count: wild_count as u8,
                is_special: self.premium.contains(id),
            },
            _ => LineResult::no_win(line_index, wild_count as u8),
        }
    }

    /// Multiplier paid for a winning line: the override for all-wild and
    /// premium-tier wins, the catalog multiplier otherwise
    pub fn line_multiplier(&self, result: &LineResult) -> Option<Multiplier> {
        let id = result.matched.filter(|_| result.is_win)?;
        let symbol = self.catalog.get(id)?;

        if result.is_special {
            if self.catalog.is_wild(id) && result.wild_count as usize == REEL_COUNT {
                return Some(self.overrides.all_wild);
            }
            if self.premium.top == Some(id) {
                return Some(self.overrides.top_tier);
            }
            if self.premium.second == Some(id) {
                return Some(self.overrides.second_tier);
            }
        }
        Some(symbol.multiplier)
    }

    /// Evaluate every payline against the windows and price the wins at `bet`.
    /// Line wins are additive even when lines share positions.
    pub fn evaluate(&self, windows: &[Window; REEL_COUNT], bet: Credits) -> EvaluationResult {
        let mut lines = Vec::with_capacity(self.paylines.len());
        let mut wins = Vec::new();
        let mut total_win = Credits::ZERO;

        for (index, payline) in self.paylines.iter().enumerate() {
            let symbols = payline.select(windows);
            let result = self.evaluate_line(index as u8, &symbols);

            if let (Some(multiplier), Some(id)) = (self.line_multiplier(&result), result.matched) {
                let amount = bet.scaled_by(multiplier);
                total_win = total_win.saturating_add(amount);

                let symbol = self.catalog.get(id);
                let win = LineWin {
                    line: index as u8 + 1,
                    symbol_id: id,
                    symbol_key: symbol.map(|s| s.key.clone()).unwrap_or_default(),
                    symbol_name: symbol.map(|s| s.name.clone()).unwrap_or_default(),
                    symbols,
                    multiplier,
                    amount,
                    wild_count: result.wild_count,
                    is_special: result.is_special,
                };
                debug!(
                    "Line {} {} win: {} x{} = {} ({} wilds)",
                    win.line,
                    if win.is_special { "PREMIUM" } else { "REGULAR" },
                    win.symbol_name,
                    win.multiplier,
                    win.amount,
                    win.wild_count
                );
                wins.push(win);
            }
            lines.push(result);
        }

        EvaluationResult {
            lines,
            wins,
            total_win,
        }
    }
}

impl Default for PayTable {
    fn default() -> Self {
        Self::reference()
    }
}

pub(crate) fn validate_paylines(paylines: &[Payline]) -> ReelResult<()> {
    if paylines.is_empty() {
        return Err(ReelError::InvalidConfig("no paylines defined".into()));
    }
    if paylines.len() > u8::MAX as usize {
        return Err(ReelError::InvalidConfig(format!(
            "too many paylines: {}",
            paylines.len()
        )));
    }
    for (index, payline) in paylines.iter().enumerate() {
        if let Some(&row) = payline.rows.iter().find(|&&r| r as usize >= WINDOW_SIZE) {
            return Err(ReelError::InvalidPayline {
                index,
                reason: format!("row {row} outside the {WINDOW_SIZE}-row window"),
            });
        }
    }
    Ok(())
}
