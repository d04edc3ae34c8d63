//! Session statistics

use serde::{Deserialize, Serialize};

use crate::credits::Credits;
use crate::paytable::{EvaluationResult, PayTable};

/// Session statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    pub total_spins: u64,
    pub total_wagered: Credits,
    pub total_won: Credits,
    pub winning_spins: u64,
    /// Largest single-spin total
    pub best_win: Credits,
    /// Spins with at least one all-wild line
    pub all_wild_hits: u64,
    /// Wins per payline, payline order
    pub line_hits: Vec<u64>,
    /// Line wins per matched symbol, catalog order
    pub symbol_hits: Vec<u64>,
}

impl SessionStats {
    /// Empty stats sized for a paytable
    pub fn for_paytable(paytable: &PayTable) -> Self {
        Self {
            line_hits: vec![0; paytable.paylines().len()],
            symbol_hits: vec![0; paytable.catalog().len()],
            ..Default::default()
        }
    }

    /// Record one settled spin
    pub fn record(&mut self, stake: Credits, evaluation: &EvaluationResult) {
        self.total_spins += 1;
        self.total_wagered = self.total_wagered.saturating_add(stake);
        self.total_won = self.total_won.saturating_add(evaluation.total_win);

        if evaluation.is_win() {
            self.winning_spins += 1;
        }
        if evaluation.has_all_wild_line() {
            self.all_wild_hits += 1;
        }
        self.best_win = self.best_win.max(evaluation.total_win);

        for win in &evaluation.wins {
            bump(&mut self.line_hits, win.line as usize - 1);
            bump(&mut self.symbol_hits, win.symbol_id.index());
        }
    }

    /// Fold another session into this one
    pub fn merge(&mut self, other: &SessionStats) {
        self.total_spins += other.total_spins;
        self.total_wagered = self.total_wagered.saturating_add(other.total_wagered);
        self.total_won = self.total_won.saturating_add(other.total_won);
        self.winning_spins += other.winning_spins;
        self.all_wild_hits += other.all_wild_hits;
        self.best_win = self.best_win.max(other.best_win);

        for (i, &hits) in other.line_hits.iter().enumerate() {
            add_at(&mut self.line_hits, i, hits);
        }
        for (i, &hits) in other.symbol_hits.iter().enumerate() {
            add_at(&mut self.symbol_hits, i, hits);
        }
    }

    /// Calculate RTP
    pub fn rtp(&self) -> f64 {
        if self.total_wagered.is_zero() {
            0.0
        } else {
            (self.total_won.to_f64() / self.total_wagered.to_f64()) * 100.0
        }
    }

    /// Calculate hit rate
    pub fn hit_rate(&self) -> f64 {
        if self.total_spins > 0 {
            (self.winning_spins as f64 / self.total_spins as f64) * 100.0
        } else {
            0.0
        }
    }
}

fn bump(counts: &mut Vec<u64>, index: usize) {
    add_at(counts, index, 1);
}

fn add_at(counts: &mut Vec<u64>, index: usize, amount: u64) {
    if counts.len() <= index {
        counts.resize(index + 1, 0);
    }
    counts[index] += amount;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn winning_evaluation(table: &PayTable, bet: Credits) -> EvaluationResult {
        let ts = table.catalog().id_of("triple-sevens").unwrap();
        let plum = table.catalog().id_of("plum").unwrap();
        let cherry = table.catalog().id_of("cherries").unwrap();
        // Top line only: TRIPLE SEVENS at 75x
        let windows = [[ts, plum, cherry], [ts, cherry, plum], [ts, plum, plum]];
        table.evaluate(&windows, bet)
    }

    #[test]
    fn test_empty_stats() {
        let stats = SessionStats::for_paytable(&PayTable::reference());
        assert_eq!(stats.rtp(), 0.0);
        assert_eq!(stats.hit_rate(), 0.0);
        assert_eq!(stats.line_hits, vec![0; 5]);
        assert_eq!(stats.symbol_hits, vec![0; 7]);
    }

    #[test]
    fn test_record_and_ratios() {
        let table = PayTable::reference();
        let bet = Credits::from_cents(5);
        let mut stats = SessionStats::for_paytable(&table);

        let win = winning_evaluation(&table, bet);
        assert_eq!(win.win_count(), 1);
        stats.record(bet, &win);

        let c = table.catalog().id_of("cherries").unwrap();
        let l = table.catalog().id_of("lemon").unwrap();
        let p = table.catalog().id_of("plum").unwrap();
        let loss = table.evaluate(&[[c, l, p], [l, p, c], [c, l, p]], bet);
        assert!(!loss.is_win());
        stats.record(bet, &loss);

        assert_eq!(stats.total_spins, 2);
        assert_eq!(stats.winning_spins, 1);
        assert_eq!(stats.total_wagered, Credits::from_cents(10));
        assert_eq!(stats.total_won, Credits::from_units(37_500));
        assert_eq!(stats.best_win, Credits::from_units(37_500));
        assert_eq!(stats.line_hits[0], 1);
        assert_eq!(stats.symbol_hits[1], 1);
        assert!((stats.hit_rate() - 50.0).abs() < 1e-9);
        assert!((stats.rtp() - 3750.0).abs() < 1e-9);
    }

    #[test]
    fn test_merge() {
        let table = PayTable::reference();
        let bet = Credits::from_cents(5);
        let mut a = SessionStats::for_paytable(&table);
        let mut b = SessionStats::default();
        a.record(bet, &winning_evaluation(&table, bet));
        b.record(bet, &winning_evaluation(&table, bet));
        b.record(bet, &winning_evaluation(&table, bet));

        a.merge(&b);
        assert_eq!(a.total_spins, 3);
        assert_eq!(a.winning_spins, 3);
        assert_eq!(a.line_hits[0], 3);
        assert_eq!(a.line_hits.len(), 5);
        assert_eq!(a.symbol_hits[1], 3);
    }
}
