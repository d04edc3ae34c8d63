//! Spin tickets, spin results and the rejection values of a spin round

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::credits::Credits;
use crate::paytable::{EvaluationResult, LineResult, LineWin};
use crate::reel::{REEL_COUNT, Window};
use crate::symbols::SymbolId;

/// An accepted spin whose outcome is fixed but not yet disclosed.
///
/// Returned by `request_spin` and consumed by `settle`. Not `Clone`: each
/// ticket settles at most once.
#[derive(Debug, PartialEq, Eq)]
pub struct PendingSpin {
    machine_id: u64,
    id: u64,
    stake: Credits,
    positions: [usize; REEL_COUNT],
    windows: [Window; REEL_COUNT],
    reveal_after: Duration,
}

impl PendingSpin {
    pub(crate) fn new(
        machine_id: u64,
        id: u64,
        stake: Credits,
        positions: [usize; REEL_COUNT],
        windows: [Window; REEL_COUNT],
        reveal_after: Duration,
    ) -> Self {
        Self {
            machine_id,
            id,
            stake,
            positions,
            windows,
            reveal_after,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub(crate) fn machine_id(&self) -> u64 {
        self.machine_id
    }

    /// Bet deducted when the spin was accepted; the payout is priced at this
    pub fn stake(&self) -> Credits {
        self.stake
    }

    /// Sampled start position on each reel
    pub fn positions(&self) -> &[usize; REEL_COUNT] {
        &self.positions
    }

    /// Visible windows, already decided
    pub fn windows(&self) -> &[Window; REEL_COUNT] {
        &self.windows
    }

    /// How long the host should animate before settling
    pub fn reveal_after(&self) -> Duration {
        self.reveal_after
    }
}

/// Why a spin request was refused. The machine is left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum SpinRejection {
    #[error("a spin is already in progress")]
    AlreadySpinning,

    #[error("insufficient balance: {balance} available, bet is {bet}")]
    InsufficientBalance { balance: Credits, bet: Credits },
}

/// Why a ticket could not be settled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SettleError {
    #[error("ticket was issued by another machine")]
    ForeignTicket,

    #[error("spin {spin_id} is no longer in flight")]
    StaleTicket { spin_id: u64 },
}

/// A disclosed spin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpinResult {
    /// Spin ID (per machine, starting at 1)
    pub spin_id: u64,
    /// Start position on each reel
    pub positions: [usize; REEL_COUNT],
    /// Visible windows (reel × row)
    pub windows: [Window; REEL_COUNT],
    /// Every payline, in table order
    pub lines: Vec<LineResult>,
    /// Winning lines
    pub wins: Vec<LineWin>,
    /// Stake the spin was priced at
    pub bet: Credits,
    /// Total win
    pub total_win: Credits,
    /// Balance after the payout
    pub new_balance: Credits,
}

impl SpinResult {
    pub(crate) fn from_evaluation(
        ticket: &PendingSpin,
        evaluation: EvaluationResult,
        new_balance: Credits,
    ) -> Self {
        Self {
            spin_id: ticket.id,
            positions: ticket.positions,
            windows: ticket.windows,
            lines: evaluation.lines,
            wins: evaluation.wins,
            bet: ticket.stake,
            total_win: evaluation.total_win,
            new_balance,
        }
    }

    pub fn is_win(&self) -> bool {
        !self.wins.is_empty()
    }

    /// Win-to-bet ratio
    pub fn win_ratio(&self) -> f64 {
        if self.bet.is_zero() {
            0.0
        } else {
            self.total_win.to_f64() / self.bet.to_f64()
        }
    }

    /// Symbol shown at (reel, row)
    pub fn symbol_at(&self, reel: usize, row: usize) -> Option<SymbolId> {
        self.windows.get(reel).and_then(|w| w.get(row)).copied()
    }
}
