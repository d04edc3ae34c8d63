//! Machine configuration
//!
//! [`MachineConfig::default`] is the classic three-reel machine. Configs can
//! also be loaded from JSON or YAML; every loaded config is validated before
//! it is returned, and a machine refuses to start from an invalid one.

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::credits::Credits;
use crate::error::{ReelError, ReelResult};
use crate::paytable::{PayTable, Payline, PremiumOverrides, standard_paylines, validate_paylines};
use crate::reel::{SamplingMode, WINDOW_SIZE};
use crate::symbols::{Symbol, SymbolCatalog, reference_reel_frequencies, reference_symbols};
use crate::timing::RevealTiming;

/// Complete machine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    /// Machine name
    pub name: String,
    /// Symbol catalog, in tie-break order
    pub symbols: Vec<Symbol>,
    /// Copies of each symbol key placed on every reel
    pub reel_frequencies: IndexMap<String, u32>,
    /// Payline definitions
    pub paylines: Vec<Payline>,
    /// Multipliers for all-wild and premium-tier lines
    pub premium_overrides: PremiumOverrides,
    /// Balance at start and after reset
    pub starting_balance: Credits,
    /// Bet at start and after reset
    pub default_bet: Credits,
    /// Smallest allowed bet
    pub min_bet: Credits,
    /// Reel position sampling
    pub sampling: SamplingMode,
    /// Reveal delay handed to the host with every pending spin
    pub timing: RevealTiming,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            name: "Classic Three Reel".into(),
            symbols: reference_symbols(),
            reel_frequencies: reference_reel_frequencies(),
            paylines: standard_paylines(),
            premium_overrides: PremiumOverrides::default(),
            starting_balance: Credits::from_whole(100),
            default_bet: Credits::from_cents(5),
            min_bet: Credits::from_cents(1),
            sampling: SamplingMode::Bounded,
            timing: RevealTiming::normal(),
        }
    }
}

impl MachineConfig {
    /// Headless variant with no reveal delay
    pub fn instant() -> Self {
        Self {
            timing: RevealTiming::instant(),
            ..Default::default()
        }
    }

    /// Parse and validate a JSON config
    pub fn from_json_str(json: &str) -> ReelResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ReelError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a YAML config
    pub fn from_yaml_str(yaml: &str) -> ReelResult<Self> {
        let config: Self =
            serde_yml::from_str(yaml).map_err(|e| ReelError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file, choosing the format by extension
    pub fn load(path: impl AsRef<Path>) -> ReelResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&text),
            Some("yaml") | Some("yml") => Self::from_yaml_str(&text),
            _ => Err(ReelError::InvalidConfig(format!(
                "unsupported config format: {}",
                path.display()
            ))),
        }
    }

    pub fn to_json(&self) -> ReelResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| ReelError::ConfigParse(e.to_string()))
    }

    /// Validate config
    pub fn validate(&self) -> ReelResult<()> {
        let catalog = self.catalog()?;

        if let Some(symbol) = self.symbols.iter().find(|s| s.multiplier.is_zero()) {
            return Err(ReelError::InvalidConfig(format!(
                "symbol {} has a zero multiplier",
                symbol.key
            )));
        }
        let overrides = &self.premium_overrides;
        if overrides.all_wild.is_zero()
            || overrides.top_tier.is_zero()
            || overrides.second_tier.is_zero()
        {
            return Err(ReelError::InvalidConfig(
                "premium overrides must be positive".into(),
            ));
        }

        if let Some(key) = self.reel_frequencies.keys().find(|k| catalog.id_of(k).is_none()) {
            return Err(ReelError::UnknownSymbol(key.clone()));
        }
        let reel_len: usize = self.reel_frequencies.values().map(|&c| c as usize).sum();
        if reel_len == 0 {
            return Err(ReelError::EmptyReel);
        }
        if reel_len < WINDOW_SIZE {
            return Err(ReelError::ReelTooShort {
                len: reel_len,
                min: WINDOW_SIZE,
            });
        }

        validate_paylines(&self.paylines)?;

        if self.min_bet.is_zero() {
            return Err(ReelError::InvalidConfig("min_bet must be positive".into()));
        }
        if self.default_bet < self.min_bet {
            return Err(ReelError::InvalidConfig(format!(
                "default_bet {} is below min_bet {}",
                self.default_bet, self.min_bet
            )));
        }

        Ok(())
    }

    /// Build the symbol catalog
    pub fn catalog(&self) -> ReelResult<SymbolCatalog> {
        SymbolCatalog::new(self.symbols.clone())
    }

    /// Build the paytable
    pub fn pay_table(&self) -> ReelResult<PayTable> {
        PayTable::new(self.catalog()?, self.paylines.clone(), self.premium_overrides)
    }
}
