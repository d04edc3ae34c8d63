//! Reveal timing between deciding a spin and disclosing it
//!
//! The engine never sleeps. A pending spin carries the delay from the active
//! profile and the host decides when to settle it.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Timing profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimingProfile {
    /// Normal gameplay timing
    Normal,
    /// Fast/Turbo mode
    Turbo,
    /// No delay (tests, simulation, headless hosts)
    Instant,
    /// Custom delay
    Custom,
}

impl Default for TimingProfile {
    fn default() -> Self {
        Self::Normal
    }
}

/// Delay the presentation layer waits before settling a spin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealTiming {
    pub profile: TimingProfile,
    pub reveal_delay_ms: u64,
}

impl RevealTiming {
    /// Normal gameplay timing (two-second reel spin)
    pub fn normal() -> Self {
        Self {
            profile: TimingProfile::Normal,
            reveal_delay_ms: 2000,
        }
    }

    /// Turbo mode
    pub fn turbo() -> Self {
        Self {
            profile: TimingProfile::Turbo,
            reveal_delay_ms: 800,
        }
    }

    pub fn instant() -> Self {
        Self {
            profile: TimingProfile::Instant,
            reveal_delay_ms: 0,
        }
    }

    pub fn custom(reveal_delay_ms: u64) -> Self {
        Self {
            profile: TimingProfile::Custom,
            reveal_delay_ms,
        }
    }

    /// Get timing for profile; `Custom` starts from the normal delay
    pub fn from_profile(profile: TimingProfile) -> Self {
        match profile {
            TimingProfile::Normal => Self::normal(),
            TimingProfile::Turbo => Self::turbo(),
            TimingProfile::Instant => Self::instant(),
            TimingProfile::Custom => Self::custom(Self::normal().reveal_delay_ms),
        }
    }

    /// Scale timing by factor (< 1.0 = faster)
    pub fn scaled(&self, factor: f64) -> Self {
        let factor = if factor.is_finite() { factor.max(0.0) } else { 1.0 };
        Self::custom((self.reveal_delay_ms as f64 * factor).round() as u64)
    }

    pub fn reveal_delay(&self) -> Duration {
        Duration::from_millis(self.reveal_delay_ms)
    }
}

impl Default for RevealTiming {
    fn default() -> Self {
        Self::normal()
    }
}
