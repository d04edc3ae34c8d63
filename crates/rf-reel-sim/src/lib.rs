//! # rf-reel-sim — Batch Spin Simulator
//!
//! Runs millions of spins over one reel set to measure return-to-player,
//! hit rate and the win distribution per symbol and payline.
//!
//! ## Architecture
//!
//! ```text
//! MachineConfig + seed
//!     │
//!     v
//! Simulator (ReelSet built once from the seed, PayTable)
//!     │
//!     ├── worker 0: ChaCha8Rng stream 1 ──> SessionStats
//!     ├── worker 1: ChaCha8Rng stream 2 ──> SessionStats
//!     └── ...                                   │
//!                                               v
//!                                   merge ──> SimReport
//! ```
//!
//! Workers run the decide/evaluate path only; there is no balance to
//! exhaust. Results are deterministic for a given seed, spin count and
//! worker count.

use std::time::Instant;

use log::{debug, info};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use rf_reel_engine::{
    Credits, MachineConfig, PayTable, ReelError, ReelSet, SamplingMode, SessionStats,
};

/// Simulator errors
#[derive(Error, Debug)]
pub enum SimError {
    #[error("Machine configuration error: {0}")]
    Config(#[from] ReelError),

    #[error("Bet must be positive")]
    ZeroBet,

    #[error("Failed to build worker pool: {0}")]
    ThreadPool(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type SimResult<T> = Result<T, SimError>;

/// Batch run parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimConfig {
    pub spins: u64,
    pub seed: u64,
    /// Worker count, 0 = one per CPU
    pub threads: usize,
    pub bet: Credits,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            spins: 1_000_000,
            seed: 0,
            threads: 0,
            bet: Credits::from_cents(5),
        }
    }
}

impl SimConfig {
    /// Resolved worker count
    pub fn worker_count(&self) -> usize {
        if self.threads == 0 {
            num_cpus::get().max(1)
        } else {
            self.threads
        }
    }
}

/// Wins attributed to one symbol
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolTally {
    pub key: String,
    pub name: String,
    /// Winning lines paid on this symbol
    pub line_wins: u64,
}

/// Aggregated outcome of a batch run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimReport {
    pub machine: String,
    pub seed: u64,
    pub threads: usize,
    pub spins: u64,
    pub bet: Credits,
    pub wagered: Credits,
    pub won: Credits,
    /// Return to player, percent
    pub rtp: f64,
    /// Spins with at least one winning line, percent
    pub hit_rate: f64,
    /// Largest single-spin total
    pub max_win: Credits,
    pub all_wild_hits: u64,
    /// Wins per payline (1-based line = index + 1)
    pub line_hits: Vec<u64>,
    pub symbols: Vec<SymbolTally>,
    pub elapsed_ms: u64,
}

impl SimReport {
    fn from_stats(
        paytable: &PayTable,
        machine: &str,
        config: &SimConfig,
        threads: usize,
        stats: &SessionStats,
        elapsed_ms: u64,
    ) -> Self {
        let symbols = paytable
            .catalog()
            .iter()
            .map(|(id, symbol)| SymbolTally {
                key: symbol.key.clone(),
                name: symbol.name.clone(),
                line_wins: stats.symbol_hits.get(id.index()).copied().unwrap_or(0),
            })
            .collect();

        Self {
            machine: machine.to_string(),
            seed: config.seed,
            threads,
            spins: stats.total_spins,
            bet: config.bet,
            wagered: stats.total_wagered,
            won: stats.total_won,
            rtp: stats.rtp(),
            hit_rate: stats.hit_rate(),
            max_win: stats.best_win,
            all_wild_hits: stats.all_wild_hits,
            line_hits: stats.line_hits.clone(),
            symbols,
            elapsed_ms,
        }
    }

    pub fn to_json(&self) -> SimResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Batch simulator over one fixed reel set
pub struct Simulator {
    name: String,
    paytable: PayTable,
    reels: ReelSet,
    sampling: SamplingMode,
}

impl Simulator {
    /// Validate the machine and build its reels from `seed`
    pub fn new(config: MachineConfig, seed: u64) -> SimResult<Self> {
        config.validate()?;
        let catalog = config.catalog()?;
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let reels = ReelSet::build(&catalog, &config.reel_frequencies, &mut rng)?;
        let paytable = config.pay_table()?;

        Ok(Self {
            name: config.name,
            paytable,
            reels,
            sampling: config.sampling,
        })
    }

    pub fn reels(&self) -> &ReelSet {
        &self.reels
    }

    pub fn paytable(&self) -> &PayTable {
        &self.paytable
    }

    /// Run `config.spins` spins split across the workers
    pub fn run(&self, config: &SimConfig) -> SimResult<SimReport> {
        if config.bet.is_zero() {
            return Err(SimError::ZeroBet);
        }

        let threads = config.worker_count();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|e| SimError::ThreadPool(e.to_string()))?;

        info!(
            "Simulating {} spins of '{}' on {} workers (seed {}, bet {})",
            config.spins, self.name, threads, config.seed, config.bet
        );
        let start = Instant::now();

        let per_worker = config.spins / threads as u64;
        let remainder = config.spins % threads as u64;

        let partials: Vec<SessionStats> = pool.install(|| {
            (0..threads)
                .into_par_iter()
                .map(|worker| {
                    let spins = per_worker + u64::from((worker as u64) < remainder);
                    self.run_worker(config, worker, spins)
                })
                .collect()
        });

        let mut total = SessionStats::for_paytable(&self.paytable);
        for partial in &partials {
            total.merge(partial);
        }

        let elapsed_ms = start.elapsed().as_millis() as u64;
        let report = SimReport::from_stats(
            &self.paytable,
            &self.name,
            config,
            threads,
            &total,
            elapsed_ms,
        );
        info!(
            "Simulation done in {} ms: RTP {:.2}%, hit rate {:.2}%",
            elapsed_ms, report.rtp, report.hit_rate
        );
        Ok(report)
    }

    fn run_worker(&self, config: &SimConfig, worker: usize, spins: u64) -> SessionStats {
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        rng.set_stream(worker as u64 + 1);

        let mut stats = SessionStats::for_paytable(&self.paytable);
        for _ in 0..spins {
            let positions = self.reels.sample_positions(self.sampling, &mut rng);
            let windows = self.reels.windows_at(&positions);
            let evaluation = self.paytable.evaluate(&windows, config.bet);
            stats.record(config.bet, &evaluation);
        }

        debug!(
            "Worker {} finished {} spins, won {}",
            worker, spins, stats.total_won
        );
        stats
    }
}
