//! Error types for the reel engine
//!
//! Only configuration problems are errors. Rejected spins, rejected bet
//! adjustments and stale settle tickets are ordinary return values
//! (see [`crate::spin`] and [`crate::engine`]).

use thiserror::Error;

/// Core error type
#[derive(Error, Debug)]
pub enum ReelError {
    #[error("Symbol catalog is empty")]
    EmptyCatalog,

    #[error("Duplicate symbol key in catalog: {0}")]
    DuplicateSymbol(String),

    #[error("Catalog must contain exactly one wild symbol, found {0}")]
    WildCount(usize),

    #[error("Unknown symbol key: {0}")]
    UnknownSymbol(String),

    #[error("Reel is empty")]
    EmptyReel,

    #[error("Reel has {len} symbols, need at least {min}")]
    ReelTooShort { len: usize, min: usize },

    #[error("Invalid payline {index}: {reason}")]
    InvalidPayline { index: usize, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Config parse error: {0}")]
    ConfigParse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Amount overflow")]
    AmountOverflow,
}

/// Result type alias
pub type ReelResult<T> = Result<T, ReelError>;
