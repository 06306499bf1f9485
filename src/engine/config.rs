//! Engine runtime configuration.

use crate::config::TradeLimits;
use std::time::Duration;

/// Knobs for the engine actor. `limits` governs command validation; the
/// rest shapes the event loop itself.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// How often the actor captures a snapshot.
    pub snapshot_interval: Duration,
    /// Bound on the inbound event queue; senders back-pressure past this.
    pub channel_capacity: usize,
    pub limits: TradeLimits,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            snapshot_interval: Duration::from_secs(60),
            channel_capacity: 1024,
            limits: TradeLimits::default(),
        }
    }
}

impl EngineConfig {
    /// Defaults overridden by `SNAPSHOT_INTERVAL_SECS` and
    /// `ENGINE_QUEUE_CAPACITY` where set and parseable. Unparseable values
    /// fall back silently; validation of limits stays with [`TradeLimits`].
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(secs) = env_parse::<u64>("SNAPSHOT_INTERVAL_SECS") {
            config.snapshot_interval = Duration::from_secs(secs.max(1));
        }
        if let Some(capacity) = env_parse::<usize>("ENGINE_QUEUE_CAPACITY") {
            config.channel_capacity = capacity.max(1);
        }
        config
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.snapshot_interval, Duration::from_secs(60));
        assert_eq!(config.channel_capacity, 1024);
        assert!(config.limits.validate().is_ok());
    }
}
