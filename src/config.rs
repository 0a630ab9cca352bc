use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Limits applied by a [`Session`](crate::runtime::Session).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Nested block and method calls allowed before `CallDepthExceeded`.
    pub max_call_depth: usize,
    /// Upper bound on timer ticks fired by one `advance_timers` call.
    pub max_timer_ticks_per_advance: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_call_depth: 64,
            max_timer_ticks_per_advance: 10_000,
        }
    }
}

impl EngineConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).context("failed to parse engine config")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_use_defaults() {
        let config = EngineConfig::from_yaml_str("max_call_depth: 8").expect("config");
        assert_eq!(config.max_call_depth, 8);
        assert_eq!(config.max_timer_ticks_per_advance, 10_000);
    }

    #[test]
    fn rejects_unknown_keys() {
        let err = EngineConfig::from_yaml_str("max_depth: 8").expect_err("unknown key");
        assert!(format!("{err:#}").contains("failed to parse engine config"));
    }
}
