//! Configuration loaded from `checkgate.toml`.
//!
//! Missing keys fall back to defaults. The `CHECKGATE_ON_CALL` environment
//! variable takes precedence over the file for the on-call address.

use anyhow::Result;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Decision policy knobs consumed by the validator.
#[derive(Debug, Clone, Deserialize)]
pub struct DecisionPolicy {
    /// Whether rejecting a control list requires a non-empty note. Policy
    /// choice, not a derived invariant, hence configurable.
    #[serde(default = "default_require_rejection_note")]
    pub require_rejection_note: bool,
}

impl Default for DecisionPolicy {
    fn default() -> Self {
        Self {
            require_rejection_note: default_require_rejection_note(),
        }
    }
}

/// Top-level configuration loaded from `checkgate.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckgateConfig {
    #[serde(default)]
    pub decision_policy: DecisionPolicy,

    /// Designated on-call address included on every emergency alert.
    #[serde(default = "default_on_call_address")]
    pub on_call_address: String,

    /// Requests allowed per actor per window; 0 disables the limiter.
    #[serde(default = "default_rate_limit_max_requests")]
    pub rate_limit_max_requests: u32,

    /// Rate limit window length in seconds.
    #[serde(default = "default_rate_limit_window_secs")]
    pub rate_limit_window_secs: u64,
}

fn default_require_rejection_note() -> bool {
    true
}

fn default_on_call_address() -> String {
    "oncall@checkgate.local".to_string()
}

fn default_rate_limit_max_requests() -> u32 {
    60
}

fn default_rate_limit_window_secs() -> u64 {
    60
}

impl Default for CheckgateConfig {
    fn default() -> Self {
        Self {
            decision_policy: DecisionPolicy::default(),
            on_call_address: default_on_call_address(),
            rate_limit_max_requests: default_rate_limit_max_requests(),
            rate_limit_window_secs: default_rate_limit_window_secs(),
        }
    }
}

impl CheckgateConfig {
    /// Loads configuration from `checkgate.toml` in the current directory,
    /// falling back to defaults if the file does not exist.
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("checkgate.toml"))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str::<CheckgateConfig>(&contents)?
        } else {
            Self::default()
        };

        // Environment variable takes precedence over the file.
        if let Ok(address) = std::env::var("CHECKGATE_ON_CALL")
            && !address.is_empty()
        {
            config.on_call_address = address;
        }

        Ok(config)
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }
}
