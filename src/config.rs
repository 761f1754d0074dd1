//! Runtime configuration.
//!
//! All knobs are read once at startup from the environment and never
//! mutated afterwards, so the config can be shared across concurrent
//! requests without synchronization.
//!
//! | Variable                   | Default       |
//! |----------------------------|---------------|
//! | `KUBEPILOT_SECURITY_MODE`  | `strict`      |
//! | `KUBEPILOT_NAMESPACE`      | `default`     |
//! | `KUBEPILOT_TIMEOUT_SECS`   | `30`          |
//! | `KUBEPILOT_SIMULATE`       | `false`       |
//! | `KUBEPILOT_MODEL`          | `gpt-4o-mini` |

use std::time::Duration;

use tracing::warn;

use crate::security::SecurityMode;

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub security_mode: SecurityMode,
    pub default_namespace: String,
    pub exec_timeout: Duration,
    pub simulate: bool,
    pub model: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            security_mode: SecurityMode::Strict,
            default_namespace: "default".to_string(),
            exec_timeout: Duration::from_secs(30),
            simulate: false,
            model: "gpt-4o-mini".to_string(),
        }
    }
}

impl RuntimeConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        // An unrecognized mode falls back to strict, never to permissive.
        let security_mode = match lookup("KUBEPILOT_SECURITY_MODE") {
            Some(raw) => raw.parse().unwrap_or_else(|err| {
                warn!(%err, "invalid KUBEPILOT_SECURITY_MODE, staying strict");
                SecurityMode::Strict
            }),
            None => defaults.security_mode,
        };

        let exec_timeout = lookup("KUBEPILOT_TIMEOUT_SECS")
            .and_then(|raw| raw.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.exec_timeout);

        let simulate = lookup("KUBEPILOT_SIMULATE")
            .map(|raw| matches!(raw.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(defaults.simulate);

        Self {
            security_mode,
            default_namespace: lookup("KUBEPILOT_NAMESPACE")
                .unwrap_or(defaults.default_namespace),
            exec_timeout,
            simulate,
            model: lookup("KUBEPILOT_MODEL").unwrap_or(defaults.model),
        }
    }
}
