//! Slot machine: balance, bet and the two-phase spin round

use std::sync::atomic::{AtomicU64, Ordering};

use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::MachineConfig;
use crate::credits::{CreditDelta, Credits};
use crate::error::{ReelError, ReelResult};
use crate::paytable::{PayTable, Payline};
use crate::reel::{REEL_COUNT, ReelSet, Window};
use crate::spin::{PendingSpin, SettleError, SpinRejection, SpinResult};
use crate::stats::SessionStats;
use crate::symbols::SymbolCatalog;

static NEXT_MACHINE_ID: AtomicU64 = AtomicU64::new(1);

/// Snapshot of the player-facing machine state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineState {
    pub balance: Credits,
    pub bet: Credits,
    /// Total of the last settled spin, zero while a spin is in flight
    pub last_win: Credits,
    pub spinning: bool,
}

impl MachineState {
    fn initial(config: &MachineConfig) -> Self {
        Self {
            balance: config.starting_balance,
            bet: config.default_bet,
            last_win: Credits::ZERO,
            spinning: false,
        }
    }
}

/// Why a bet adjustment was refused. The previous bet is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum BetRejection {
    #[error("bet would fall below the minimum of {min}")]
    BelowMinimum { min: Credits },

    #[error("bet would exceed the balance of {balance}")]
    ExceedsBalance { balance: Credits },

    #[error("bet steps must be whole cents")]
    SubCentStep,
}

/// Symbol count on one reel
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SymbolCount {
    pub key: String,
    pub name: String,
    pub count: usize,
}

/// Composition of one reel strip
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReelStatistics {
    /// Reel number (1-based, for display)
    pub reel: u8,
    pub length: usize,
    /// Counts in catalog order, including symbols absent from the strip
    pub counts: Vec<SymbolCount>,
}

/// A three-reel slot machine.
///
/// Owns its reels, its random source and the session state. The outcome of
/// a spin is decided by [`SlotMachine::request_spin`] and disclosed by
/// [`SlotMachine::settle`]; the host owns the delay in between.
#[derive(Debug)]
pub struct SlotMachine<R = StdRng> {
    id: u64,
    config: MachineConfig,
    paytable: PayTable,
    reels: ReelSet,
    rng: R,
    state: MachineState,
    /// Start positions of the last accepted spin
    positions: [usize; REEL_COUNT],
    in_flight: Option<u64>,
    spin_count: u64,
    stats: SessionStats,
}

impl SlotMachine<StdRng> {
    /// Create a machine seeded from the operating system
    pub fn new(config: MachineConfig) -> ReelResult<Self> {
        Self::with_rng(config, StdRng::from_os_rng())
    }

    /// Create a reproducible machine
    pub fn seeded(config: MachineConfig, seed: u64) -> ReelResult<Self> {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> SlotMachine<R> {
    /// Validate the config and build the reels from `rng`
    pub fn with_rng(config: MachineConfig, mut rng: R) -> ReelResult<Self> {
        config.validate()?;
        let catalog = config.catalog()?;
        let reels = ReelSet::build(&catalog, &config.reel_frequencies, &mut rng)?;
        Self::assemble(config, reels, rng)
    }

    /// Create a machine around prebuilt reels
    pub fn from_parts(config: MachineConfig, reels: ReelSet, rng: R) -> ReelResult<Self> {
        config.validate()?;
        let catalog_len = config.symbols.len();
        for reel in reels.reels() {
            if let Some(id) = reel.symbols().iter().find(|id| id.index() >= catalog_len) {
                return Err(ReelError::InvalidConfig(format!(
                    "reel {} holds symbol id {} outside the catalog",
                    reel.index() + 1,
                    id.0
                )));
            }
        }
        Self::assemble(config, reels, rng)
    }

    fn assemble(config: MachineConfig, reels: ReelSet, rng: R) -> ReelResult<Self> {
        let paytable = config.pay_table()?;
        let id = NEXT_MACHINE_ID.fetch_add(1, Ordering::Relaxed);
        let state = MachineState::initial(&config);

        info!(
            "Machine {} '{}' ready: reels {:?}, {} paylines, balance {}, bet {}",
            id,
            config.name,
            reels.reels().iter().map(|r| r.len()).collect::<Vec<_>>(),
            paytable.paylines().len(),
            state.balance,
            state.bet
        );

        Ok(Self {
            id,
            stats: SessionStats::for_paytable(&paytable),
            config,
            paytable,
            reels,
            rng,
            state,
            positions: [0; REEL_COUNT],
            in_flight: None,
            spin_count: 0,
        })
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // SPIN ROUND
    // ═══════════════════════════════════════════════════════════════════════════

    /// Decide a spin.
    ///
    /// Checks the guard, deducts the bet, clears the last win, samples one
    /// position per reel and extracts the windows. On rejection nothing
    /// changes.
    pub fn request_spin(&mut self) -> Result<PendingSpin, SpinRejection> {
        if self.state.spinning {
            warn!("Spin rejected: spin {:?} still in flight", self.in_flight);
            return Err(SpinRejection::AlreadySpinning);
        }

        let bet = self.state.bet;
        let Some(balance) = self.state.balance.checked_sub(bet) else {
            warn!(
                "Spin rejected: balance {} below bet {}",
                self.state.balance, bet
            );
            return Err(SpinRejection::InsufficientBalance {
                balance: self.state.balance,
                bet,
            });
        };

        self.state.balance = balance;
        self.state.last_win = Credits::ZERO;
        self.state.spinning = true;

        let positions = self
            .reels
            .sample_positions(self.config.sampling, &mut self.rng);
        let windows = self.reels.windows_at(&positions);
        self.positions = positions;

        self.spin_count += 1;
        let spin_id = self.spin_count;
        self.in_flight = Some(spin_id);

        debug!(
            "Spin {} accepted: bet {}, balance {}, positions {:?}",
            spin_id, bet, balance, positions
        );

        Ok(PendingSpin::new(
            self.id,
            spin_id,
            bet,
            positions,
            windows,
            self.config.timing.reveal_delay(),
        ))
    }

    /// Disclose a decided spin: evaluate, pay and clear the spinning flag
    pub fn settle(&mut self, ticket: PendingSpin) -> Result<SpinResult, SettleError> {
        if ticket.machine_id() != self.id {
            return Err(SettleError::ForeignTicket);
        }
        if self.in_flight != Some(ticket.id()) {
            warn!("Settle rejected: spin {} is stale", ticket.id());
            return Err(SettleError::StaleTicket {
                spin_id: ticket.id(),
            });
        }
        Ok(self.disclose(&ticket))
    }

    /// Request and settle in one call, for hosts without a reveal delay
    pub fn spin(&mut self) -> Result<SpinResult, SpinRejection> {
        let ticket = self.request_spin()?;
        Ok(self.disclose(&ticket))
    }

    fn disclose(&mut self, ticket: &PendingSpin) -> SpinResult {
        let evaluation = self.paytable.evaluate(ticket.windows(), ticket.stake());

        self.state.balance = self.state.balance.saturating_add(evaluation.total_win);
        self.state.last_win = evaluation.total_win;
        self.state.spinning = false;
        self.in_flight = None;
        self.stats.record(ticket.stake(), &evaluation);

        if evaluation.is_win() {
            debug!(
                "Spin {} won {} on {} line(s), balance {}",
                ticket.id(),
                evaluation.total_win,
                evaluation.win_count(),
                self.state.balance
            );
        } else {
            debug!("Spin {} lost, balance {}", ticket.id(), self.state.balance);
        }

        SpinResult::from_evaluation(ticket, evaluation, self.state.balance)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // BALANCE & BET
    // ═══════════════════════════════════════════════════════════════════════════

    /// Add a positive amount to the balance, returning the new balance
    pub fn add_funds(&mut self, amount: Credits) -> ReelResult<Credits> {
        if amount.is_zero() {
            return Err(ReelError::InvalidAmount(
                "funds to add must be positive".into(),
            ));
        }
        self.state.balance = self
            .state
            .balance
            .checked_add(amount)
            .ok_or(ReelError::AmountOverflow)?;
        debug!("Added {}, balance {}", amount, self.state.balance);
        Ok(self.state.balance)
    }

    /// Change the bet by a signed amount, returning the new bet.
    ///
    /// The step must be whole cents. The result must be at least the
    /// configured minimum and no more than the balance.
    pub fn adjust_bet(&mut self, delta: CreditDelta) -> Result<Credits, BetRejection> {
        let min = self.config.min_bet;
        let balance = self.state.balance;

        let rejection = if !delta.is_whole_cents() {
            Some(BetRejection::SubCentStep)
        } else {
            match self.state.bet.checked_apply(delta) {
                Some(bet) if bet < min => Some(BetRejection::BelowMinimum { min }),
                Some(bet) if bet > balance => Some(BetRejection::ExceedsBalance { balance }),
                Some(bet) => {
                    self.state.bet = bet;
                    None
                }
                None if delta.is_negative() => Some(BetRejection::BelowMinimum { min }),
                None => Some(BetRejection::ExceedsBalance { balance }),
            }
        };

        match rejection {
            Some(rejection) => {
                warn!("Bet change {} rejected: {}", delta, rejection);
                Err(rejection)
            }
            None => {
                debug!("Bet set to {}", self.state.bet);
                Ok(self.state.bet)
            }
        }
    }

    /// Restore balance, bet, last win and the spinning flag to their
    /// configured defaults. Reels are kept; an in-flight ticket goes stale.
    pub fn reset_game(&mut self) -> MachineState {
        if let Some(spin_id) = self.in_flight.take() {
            info!("Reset discards in-flight spin {}", spin_id);
        }
        self.state = MachineState::initial(&self.config);
        info!(
            "Machine {} reset: balance {}, bet {}",
            self.id, self.state.balance, self.state.bet
        );
        self.state
    }
}

impl<R> SlotMachine<R> {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn state(&self) -> MachineState {
        self.state
    }

    pub fn balance(&self) -> Credits {
        self.state.balance
    }

    pub fn bet(&self) -> Credits {
        self.state.bet
    }

    pub fn last_win(&self) -> Credits {
        self.state.last_win
    }

    pub fn is_spinning(&self) -> bool {
        self.state.spinning
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    pub fn catalog(&self) -> &SymbolCatalog {
        self.paytable.catalog()
    }

    pub fn paytable(&self) -> &PayTable {
        &self.paytable
    }

    pub fn reels(&self) -> &ReelSet {
        &self.reels
    }

    /// Payline table, for display
    pub fn paylines(&self) -> &[Payline] {
        self.paytable.paylines()
    }

    /// Get session stats
    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Reset session stats
    pub fn reset_stats(&mut self) {
        self.stats = SessionStats::for_paytable(&self.paytable);
    }

    /// Start positions of the last accepted spin (all zero before the first)
    pub fn positions(&self) -> [usize; REEL_COUNT] {
        self.positions
    }

    /// Windows at the last sampled positions
    pub fn current_windows(&self) -> [Window; REEL_COUNT] {
        self.reels.windows_at(&self.positions)
    }

    /// Per-reel symbol counts
    pub fn reel_statistics(&self) -> Vec<ReelStatistics> {
        let catalog = self.paytable.catalog();
        self.reels
            .reels()
            .iter()
            .map(|reel| ReelStatistics {
                reel: reel.index() + 1,
                length: reel.len(),
                counts: reel
                    .counts(catalog)
                    .into_iter()
                    .filter_map(|(id, count)| {
                        catalog.get(id).map(|s| SymbolCount {
                            key: s.key.clone(),
                            name: s.name.clone(),
                            count,
                        })
                    })
                    .collect(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reel::Reel;
    use crate::symbols::SymbolId;
    use crate::timing::RevealTiming;

    fn machine() -> SlotMachine {
        SlotMachine::seeded(MachineConfig::instant(), 42).unwrap()
    }

    /// Every reel shows only `key`
    fn uniform_machine(key: &str) -> SlotMachine {
        let config = MachineConfig::instant();
        let id = config.catalog().unwrap().id_of(key).unwrap();
        let reels = (0..REEL_COUNT as u8)
            .map(|i| Reel::from_symbols(i, vec![id; 4]).unwrap())
            .collect();
        let reels = ReelSet::from_reels(reels).unwrap();
        SlotMachine::from_parts(config, reels, StdRng::seed_from_u64(1)).unwrap()
    }

    #[test]
    fn test_initial_state() {
        let m = machine();
        assert_eq!(
            m.state(),
            MachineState {
                balance: Credits::from_whole(100),
                bet: Credits::from_cents(5),
                last_win: Credits::ZERO,
                spinning: false,
            }
        );
        assert_eq!(m.positions(), [0, 0, 0]);
        assert_eq!(m.paylines().len(), 5);
    }

    #[test]
    fn test_request_deducts_and_locks() {
        let mut m = machine();
        let ticket = m.request_spin().unwrap();
        assert!(m.is_spinning());
        assert_eq!(m.balance(), Credits::from_units(1_000_000 - 500));
        assert_eq!(ticket.stake(), Credits::from_cents(5));
        assert_eq!(ticket.windows(), &m.current_windows());
        assert_eq!(m.request_spin().unwrap_err(), SpinRejection::AlreadySpinning);

        let result = m.settle(ticket).unwrap();
        assert!(!m.is_spinning());
        assert_eq!(m.last_win(), result.total_win);
        assert_eq!(m.balance(), result.new_balance);
        assert_eq!(m.stats().total_spins, 1);
    }

    #[test]
    fn test_request_resets_last_win() {
        let mut m = uniform_machine("plum");
        m.spin().unwrap();
        assert!(!m.last_win().is_zero());
        let ticket = m.request_spin().unwrap();
        assert_eq!(m.last_win(), Credits::ZERO);
        m.settle(ticket).unwrap();
    }

    #[test]
    fn test_payout_uses_stake_at_request() {
        let mut m = uniform_machine("plum");
        let ticket = m.request_spin().unwrap();
        m.adjust_bet(CreditDelta::from_cents(5)).unwrap();
        let result = m.settle(ticket).unwrap();
        // Five lines of PLUM at 1x on the 0.05 stake placed at request
        assert_eq!(result.bet, Credits::from_cents(5));
        assert_eq!(result.total_win, Credits::from_cents(25));
        assert_eq!(m.bet(), Credits::from_cents(10));
    }

    #[test]
    fn test_settle_rejects_foreign_and_stale_tickets() {
        let mut a = machine();
        let mut b = machine();
        let ticket = a.request_spin().unwrap();
        assert_eq!(b.settle(ticket).unwrap_err(), SettleError::ForeignTicket);

        let mut m = machine();
        let ticket = m.request_spin().unwrap();
        let spin_id = ticket.id();
        m.reset_game();
        assert_eq!(
            m.settle(ticket).unwrap_err(),
            SettleError::StaleTicket { spin_id }
        );
        assert_eq!(m.balance(), Credits::from_whole(100));
    }

    #[test]
    fn test_add_funds() {
        let mut m = machine();
        assert_eq!(
            m.add_funds(Credits::from_whole(10)).unwrap(),
            Credits::from_whole(110)
        );
        assert!(matches!(
            m.add_funds(Credits::ZERO),
            Err(ReelError::InvalidAmount(_))
        ));
        assert!(matches!(
            m.add_funds(Credits::MAX),
            Err(ReelError::AmountOverflow)
        ));
        assert_eq!(m.balance(), Credits::from_whole(110));
    }

    #[test]
    fn test_adjust_bet_limits() {
        let mut m = machine();
        assert_eq!(
            m.adjust_bet(CreditDelta::from_cents(5)).unwrap(),
            Credits::from_cents(10)
        );
        assert_eq!(
            m.adjust_bet(CreditDelta::from_cents(-9)).unwrap(),
            Credits::from_cents(1)
        );
        assert_eq!(
            m.adjust_bet(CreditDelta::from_cents(-1)).unwrap_err(),
            BetRejection::BelowMinimum {
                min: Credits::from_cents(1)
            }
        );
        assert_eq!(
            m.adjust_bet(CreditDelta::from_whole(100)).unwrap_err(),
            BetRejection::ExceedsBalance {
                balance: Credits::from_whole(100)
            }
        );
        assert_eq!(
            m.adjust_bet(CreditDelta::from_whole(i64::MAX)).unwrap_err(),
            BetRejection::ExceedsBalance {
                balance: Credits::from_whole(100)
            }
        );
        assert_eq!(m.bet(), Credits::from_cents(1));
    }

    #[test]
    fn test_adjust_bet_rejects_sub_cent_steps() {
        let mut m = machine();
        assert_eq!(
            m.adjust_bet(CreditDelta::from_units(1)).unwrap_err(),
            BetRejection::SubCentStep
        );
        assert_eq!(
            m.adjust_bet(CreditDelta::from_units(-101)).unwrap_err(),
            BetRejection::SubCentStep
        );
        assert_eq!(m.bet(), Credits::from_cents(5));
        assert_eq!(
            m.adjust_bet(CreditDelta::from_units(100)).unwrap(),
            Credits::from_cents(6)
        );
    }

    #[test]
    fn test_reset_keeps_reels_and_stats() {
        let mut m = machine();
        let reels = m.reels().clone();
        m.add_funds(Credits::from_whole(10)).unwrap();
        m.adjust_bet(CreditDelta::from_whole(1)).unwrap();
        m.spin().unwrap();

        let state = m.reset_game();
        assert_eq!(state, MachineState::initial(m.config()));
        assert_eq!(m.reels(), &reels);
        assert_eq!(m.stats().total_spins, 1);

        m.reset_stats();
        assert_eq!(m.stats().total_spins, 0);
    }

    #[test]
    fn test_seeded_machines_agree() {
        let mut a = machine();
        let mut b = machine();
        assert_eq!(a.reels(), b.reels());
        for _ in 0..50 {
            let ra = a.spin().unwrap();
            let rb = b.spin().unwrap();
            assert_eq!(ra.positions, rb.positions);
            assert_eq!(ra.total_win, rb.total_win);
        }
        assert_eq!(a.balance(), b.balance());
    }

    #[test]
    fn test_reveal_delay_from_config() {
        let config = MachineConfig {
            timing: RevealTiming::turbo(),
            ..Default::default()
        };
        let mut m = SlotMachine::seeded(config, 5).unwrap();
        let ticket = m.request_spin().unwrap();
        assert_eq!(ticket.reveal_after().as_millis(), 800);
    }

    #[test]
    fn test_reel_statistics_match_frequencies() {
        let m = machine();
        let stats = m.reel_statistics();
        assert_eq!(stats.len(), 3);
        for reel in &stats {
            assert_eq!(reel.length, 90);
            assert_eq!(reel.counts.len(), 7);
            let seven = reel.counts.iter().find(|c| c.key == "seven").unwrap();
            assert_eq!(seven.count, 0);
            let cherries = reel.counts.iter().find(|c| c.key == "cherries").unwrap();
            assert_eq!(cherries.count, 25);
        }
    }

    #[test]
    fn test_from_parts_rejects_foreign_ids() {
        let reel = Reel::from_symbols(0, vec![SymbolId(99); 3]).unwrap();
        let reels = ReelSet::from_reels(vec![reel.clone(), reel.clone(), reel]).unwrap();
        assert!(matches!(
            SlotMachine::from_parts(MachineConfig::instant(), reels, StdRng::seed_from_u64(0)),
            Err(ReelError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_invalid_config_refuses_to_start() {
        let mut config = MachineConfig::instant();
        config.reel_frequencies.insert("bell".into(), 2);
        assert!(SlotMachine::seeded(config, 0).is_err());
    }
}
