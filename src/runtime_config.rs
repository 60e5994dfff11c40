// =============================================================================
// Runtime Configuration - service settings
// =============================================================================
//
// Loaded from a JSON file at startup; environment variables override the file.
// All fields carry `#[serde(default)]` so that adding new fields never breaks
// loading an older config file.
// =============================================================================

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub const CONFIG_PATH: &str = "coin_lens.json";

const ENV_BIND_ADDR: &str = "COIN_LENS_BIND_ADDR";
const ENV_RATE_LIMIT_MS: &str = "COIN_LENS_RATE_LIMIT_MS";

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_bind_addr() -> String {
    "0.0.0.0:3001".to_string()
}

fn default_rate_limit_interval_ms() -> u64 {
    1500
}

fn default_gate_retention_multiplier() -> u32 {
    40
}

fn default_gate_sweep_interval_secs() -> u64 {
    30
}

fn default_max_request_points() -> usize {
    10_000
}

// =============================================================================
// RuntimeConfig
// =============================================================================

/// Top-level configuration for the Coin Lens service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Socket address the HTTP API binds to.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Minimum spacing between two admitted requests of one caller.
    #[serde(default = "default_rate_limit_interval_ms")]
    pub rate_limit_interval_ms: u64,

    /// Idle callers are forgotten after this many intervals.
    #[serde(default = "default_gate_retention_multiplier")]
    pub gate_retention_multiplier: u32,

    /// How often the admission table is swept.
    #[serde(default = "default_gate_sweep_interval_secs")]
    pub gate_sweep_interval_secs: u64,

    /// Upper bound on prices or candles accepted in one request.
    #[serde(default = "default_max_request_points")]
    pub max_request_points: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            rate_limit_interval_ms: default_rate_limit_interval_ms(),
            gate_retention_multiplier: default_gate_retention_multiplier(),
            gate_sweep_interval_secs: default_gate_sweep_interval_secs(),
            max_request_points: default_max_request_points(),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read runtime config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse runtime config from {}", path.display()))?;

        info!(
            path = %path.display(),
            bind_addr = %config.bind_addr,
            rate_limit_interval_ms = config.rate_limit_interval_ms,
            "runtime config loaded"
        );

        Ok(config)
    }

    /// Apply `COIN_LENS_*` environment overrides. Unparseable values are
    /// ignored with a warning.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(addr) = lookup(ENV_BIND_ADDR).filter(|a| !a.trim().is_empty()) {
            self.bind_addr = addr.trim().to_string();
        }
        if let Some(raw) = lookup(ENV_RATE_LIMIT_MS) {
            match raw.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => self.rate_limit_interval_ms = ms,
                _ => warn!(value = %raw, "ignoring invalid COIN_LENS_RATE_LIMIT_MS"),
            }
        }
    }

    pub fn rate_limit_interval(&self) -> Duration {
        Duration::from_millis(self.rate_limit_interval_ms)
    }

    pub fn gate_retention(&self) -> Duration {
        self.rate_limit_interval() * self.gate_retention_multiplier.max(1)
    }

    pub fn gate_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.gate_sweep_interval_secs.max(1))
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn default_config_has_expected_values() {
        let cfg = RuntimeConfig::default();
        assert_eq!(cfg.bind_addr, "0.0.0.0:3001");
        assert_eq!(cfg.rate_limit_interval(), Duration::from_millis(1500));
        assert_eq!(cfg.gate_retention(), Duration::from_secs(60));
        assert_eq!(cfg.gate_sweep_interval(), Duration::from_secs(30));
        assert_eq!(cfg.max_request_points, 10_000);
    }

    #[test]
    fn deserialise_empty_json_uses_defaults() {
        let cfg: RuntimeConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.rate_limit_interval_ms, 1500);
        assert_eq!(cfg.gate_retention_multiplier, 40);
    }

    #[test]
    fn deserialise_partial_json_fills_defaults() {
        let json = r#"{ "rate_limit_interval_ms": 2000 }"#;
        let cfg: RuntimeConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.rate_limit_interval_ms, 2000);
        assert_eq!(cfg.bind_addr, "0.0.0.0:3001");
    }

    #[test]
    fn env_overrides_apply_and_ignore_garbage() {
        let env: HashMap<&str, &str> = [
            (ENV_BIND_ADDR, "127.0.0.1:9000"),
            (ENV_RATE_LIMIT_MS, "not-a-number"),
        ]
        .into_iter()
        .collect();

        let mut cfg = RuntimeConfig::default();
        cfg.apply_overrides(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(cfg.bind_addr, "127.0.0.1:9000");
        assert_eq!(cfg.rate_limit_interval_ms, 1500);

        cfg.apply_overrides(|k| (k == ENV_RATE_LIMIT_MS).then(|| "250".to_string()));
        assert_eq!(cfg.rate_limit_interval_ms, 250);
    }

    #[test]
    fn load_from_disk() {
        let path = std::env::temp_dir().join(format!("coin_lens_{}.json", uuid::Uuid::new_v4()));
        std::fs::write(&path, r#"{ "max_request_points": 42 }"#).unwrap();

        let loaded = RuntimeConfig::load(&path).unwrap();
        assert_eq!(loaded.max_request_points, 42);
        assert_eq!(loaded.rate_limit_interval_ms, 1500);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn load_missing_file_errors() {
        assert!(RuntimeConfig::load("/definitely/not/here/coin_lens.json").is_err());
    }
}
