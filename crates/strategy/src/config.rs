use serde::{Deserialize, Serialize};

use common::Result;

use crate::indicators::IndicatorParams;
use crate::signal::SignalParams;

/// Strategy parameter file (TOML).
///
/// Example `config/strategy.toml`:
/// ```toml
/// [indicators]
/// ema_fast = 9
/// ema_slow = 21
/// volume_period = 20
///
/// [signal]
/// volume_threshold = 1.5
/// momentum_threshold = 0.1
/// trend_strength_threshold = 0.05
/// risk_pct = 0.01
/// reward_ratio = 3.0
/// ```
/// Missing sections and fields fall back to the defaults above.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StrategyFileConfig {
    #[serde(default)]
    pub indicators: IndicatorParams,
    #[serde(default)]
    pub signal: SignalParams,
}

impl StrategyFileConfig {
    /// Load from a TOML file. Exits process on error.
    pub fn load(path: &str) -> Self {
        let content = std::fs::read_to_string(path)
            .unwrap_or_else(|e| panic!("Failed to read strategy config at '{path}': {e}"));
        let cfg: Self = toml::from_str(&content)
            .unwrap_or_else(|e| panic!("Failed to parse strategy config at '{path}': {e}"));
        cfg.validate()
            .unwrap_or_else(|e| panic!("Invalid strategy config at '{path}': {e}"));
        cfg
    }

    pub fn validate(&self) -> Result<()> {
        self.indicators.validate()
    }
}
