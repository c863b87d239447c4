//! Engine policy configuration.
//!
//! The warning threshold and the either-area rule are locale/currency
//! policy, not behavior, so they are injected rather than hard-coded.
//! The defaults reproduce the production form's values.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default advisory threshold for the unit price, in currency units per
/// tsubo. An `Ok` result above this carries a non-blocking warning.
pub const DEFAULT_UNIT_PRICE_WARNING_THRESHOLD: i64 = 10_000_000;

/// Default memo-cache capacity (entries).
pub const DEFAULT_CACHE_CAPACITY: usize = 100;

/// Default debounce window for field-edit bursts, in milliseconds.
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

/// Default settle delay applied after a visibility transition before the
/// derived values are recomputed, in milliseconds.
pub const DEFAULT_SETTLE_MS: u64 = 50;

/// Tunable policy for one form engine instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Unit prices above this value get an advisory warning.
    pub unit_price_warning_threshold: i64,

    /// Maximum number of memoized calculation results.
    pub cache_capacity: usize,

    /// Debounce window for per-field recompute/validate timers.
    pub debounce_ms: u64,

    /// Delay before recomputing derived values after a transition.
    pub settle_ms: u64,

    /// Whether owned types require at least one of the two area fields.
    pub require_either_area: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            unit_price_warning_threshold: DEFAULT_UNIT_PRICE_WARNING_THRESHOLD,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            settle_ms: DEFAULT_SETTLE_MS,
            require_either_area: true,
        }
    }
}

impl EngineConfig {
    /// Debounce window as a `Duration`.
    pub fn debounce_delay(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Settle delay as a `Duration`.
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}
