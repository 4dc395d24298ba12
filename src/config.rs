use crate::error::{BridgeError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

/// Poll interval used when the configuration file does not specify one.
const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

/// Load environment variables from .env file with robust parsing.
/// Handles values with spaces without requiring quotes.
pub fn load_dotenv() {
    let env_path = Path::new(".env");
    if !env_path.exists() {
        return;
    }

    let content = match fs::read_to_string(env_path) {
        Ok(c) => c,
        Err(_) => return,
    };

    for line in content.lines() {
        let line = line.trim();

        // Skip empty lines and comments
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        // Find the first '=' and split there
        if let Some(eq_pos) = line.find('=') {
            let key = line[..eq_pos].trim();
            let mut value = line[eq_pos + 1..].trim();

            // Remove surrounding quotes if present
            if (value.starts_with('"') && value.ends_with('"'))
                || (value.starts_with('\'') && value.ends_with('\''))
            {
                value = &value[1..value.len() - 1];
            }

            // Only set if not already set (env vars take precedence)
            if std::env::var(key).is_err() {
                // SAFETY: We're single-threaded at this point (called before any async runtime)
                unsafe { std::env::set_var(key, value) };
            }
        }
    }
}

/// Identifier of the GPIO pin a sensor is attached to.
///
/// Configuration files may use either a bare pin number (`4`) or a
/// platform-specific name (`"GPIO4"`); both forms are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Pin {
    Number(u32),
    Name(String),
}

impl fmt::Display for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pin::Number(n) => write!(f, "{}", n),
            Pin::Name(s) => write!(f, "{}", s),
        }
    }
}

impl From<u32> for Pin {
    fn from(n: u32) -> Self {
        Pin::Number(n)
    }
}

impl From<&str> for Pin {
    fn from(s: &str) -> Self {
        Pin::Name(s.to_string())
    }
}

/// Per-sensor configuration. Immutable after load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorConfig {
    pub pin: Pin,
    /// Additive correction applied to every raw temperature reading.
    #[serde(default)]
    pub temperature_offset: f64,
    /// Additive correction applied to every raw humidity reading.
    #[serde(default)]
    pub humidity_offset: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    #[serde(default)]
    pub sensors: Vec<SensorConfig>,
}

fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

impl Config {
    /// Load the configuration file, then apply environment overrides.
    ///
    /// A missing or empty sensor list is reported as
    /// [`BridgeError::ConfigurationMissing`] so the registry never
    /// starts without anything to poll.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(BridgeError::ConfigurationMissing);
        }

        let content = fs::read_to_string(path)?;
        let mut config: Config = serde_json::from_str(&content)?;
        config.apply_env_overrides();

        if config.sensors.is_empty() {
            return Err(BridgeError::ConfigurationMissing);
        }

        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(interval) = std::env::var("POLL_INTERVAL_SECS")
            && let Ok(secs) = interval.parse()
        {
            self.poll_interval_secs = secs;
        }
    }

    pub fn poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.poll_interval_secs)
    }
}
