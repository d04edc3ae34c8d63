//! # rf-reel-engine — Classic Three-Reel Slot Engine
//!
//! Weighted reel strips, windowed sampling, wild-substituting payline
//! evaluation and a session state machine for a three-reel, five-line slot.
//!
//! ## Features
//!
//! - **Reel Builder**: Frequency table expanded and shuffled per reel
//! - **Payline Evaluator**: Wild substitution, premium tiers, catalog-order tie-break
//! - **Fixed-Point Money**: Exact bet × multiplier payouts
//! - **Two-Phase Spin**: Outcome decided on request, disclosed on settle
//! - **Config**: JSON / YAML machine definitions, validated at startup
//!
//! ## Architecture
//!
//! ```text
//! MachineConfig ──validate──> SlotMachine
//!                                 │
//!                                 ├── ReelSet (3 × Reel, shuffled from frequencies)
//!                                 ├── PayTable (SymbolCatalog, Paylines, PremiumOverrides)
//!                                 ├── MachineState (balance, bet, last win, spinning)
//!                                 └── SessionStats
//!                                       │
//!     request_spin() ──> PendingSpin ───┤ (host waits reveal_after)
//!                                       v
//!     settle(ticket) ──> SpinResult (windows, wins, total, new balance)
//! ```

pub mod config;
pub mod credits;
pub mod engine;
pub mod error;
pub mod paytable;
pub mod reel;
pub mod shared;
pub mod spin;
pub mod stats;
pub mod symbols;
pub mod timing;

pub use config::*;
pub use credits::*;
pub use engine::*;
pub use error::*;
pub use paytable::*;
pub use reel::*;
pub use shared::*;
pub use spin::*;
pub use stats::*;
pub use symbols::*;
pub use timing::*;
