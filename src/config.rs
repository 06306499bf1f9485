// 11.0: trade validation bounds. one struct, one place to tune. the
// defaults mirror what the public API has always enforced, so changing them
// silently changes which orders are accepted.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeLimits {
    /// Smallest accepted margin in USDC minor units ($1.00).
    pub min_margin: i64,
    pub min_leverage: u32,
    pub max_leverage: u32,
    pub min_slippage_bps: u32,
    pub max_slippage_bps: u32,
}

impl Default for TradeLimits {
    fn default() -> Self {
        Self {
            min_margin: 100,
            min_leverage: 1,
            max_leverage: 100,
            min_slippage_bps: 10,     // 0.1%
            max_slippage_bps: 10_000, // 100%
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid trade limits: {reason}")]
    InvalidLimits { reason: String },
}

impl TradeLimits {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_margin <= 0 {
            return Err(ConfigError::InvalidLimits {
                reason: "min margin must be positive".to_string(),
            });
        }
        if self.min_leverage == 0 || self.min_leverage > self.max_leverage {
            return Err(ConfigError::InvalidLimits {
                reason: "leverage bounds must satisfy 1 <= min <= max".to_string(),
            });
        }
        if self.min_slippage_bps > self.max_slippage_bps {
            return Err(ConfigError::InvalidLimits {
                reason: "slippage bounds inverted".to_string(),
            });
        }
        Ok(())
    }

    pub fn margin_ok(&self, margin: i64) -> bool {
        margin >= self.min_margin
    }

    pub fn leverage_ok(&self, leverage: u32) -> bool {
        (self.min_leverage..=self.max_leverage).contains(&leverage)
    }

    pub fn slippage_ok(&self, slippage_bps: u32) -> bool {
        (self.min_slippage_bps..=self.max_slippage_bps).contains(&slippage_bps)
    }
}
