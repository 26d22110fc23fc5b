//! Session configuration

use attune_core::{AttuneError, AttuneResult};
use attune_engagement::EngagementConfig;
use attune_select::SelectorConfig;
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

/// Log output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` overrides it
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
    pub with_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            with_target: true,
        }
    }
}

impl LoggingConfig {
    /// Structured output for log shippers
    pub fn production() -> Self {
        Self {
            level: "info".to_string(),
            json: true,
            with_target: true,
        }
    }

    /// Verbose output for local debugging
    pub fn debug() -> Self {
        Self {
            level: "attune_runtime=debug,attune_select=debug,attune_engagement=debug".to_string(),
            json: false,
            with_target: true,
        }
    }

    pub fn validate(&self) -> AttuneResult<()> {
        EnvFilter::try_new(&self.level)
            .map(|_| ())
            .map_err(|e| AttuneError::InvalidConfig(format!("log level {:?}: {e}", self.level)))
    }
}

/// Everything a session coordinator is configured with
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub selector: SelectorConfig,
    pub engagement: EngagementConfig,
    /// Whether frames are scored from the start (opt-in)
    pub engagement_analytics: bool,
    pub logging: LoggingConfig,
}

impl SessionConfig {
    /// Parse and validate a JSON document; missing fields take defaults
    pub fn from_json_str(json: &str) -> AttuneResult<Self> {
        let config: SessionConfig =
            serde_json::from_str(json).map_err(|e| AttuneError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_string(&self) -> AttuneResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| AttuneError::InvalidConfig(e.to_string()))
    }

    pub fn validate(&self) -> AttuneResult<()> {
        self.selector.validate()?;
        self.engagement.validate()?;
        self.logging.validate()
    }
}
