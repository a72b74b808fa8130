// Configuration management with environment variables, TOML files, and validation

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{CheckSignalError, ErrorCode, Result};
use crate::state::Voltage;
use crate::validation;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Tuner selection
    #[serde(default)]
    pub tuner: TunerConfig,

    /// Sampling loop configuration
    #[serde(default)]
    pub monitor: MonitorConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Metrics export
    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TunerConfig {
    /// Adapter index; unset picks the first free adapter
    pub device: Option<u32>,
    /// LNB supply; unset leaves the frontend alone. Accepts the same values
    /// as `--lnb` (11, 15, anything else is off) as well as low/high/off.
    #[serde(deserialize_with = "deserialize_lnb")]
    pub lnb: Option<Voltage>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LnbValue {
    Volts(i64),
    Name(String),
}

fn deserialize_lnb<'de, D>(deserializer: D) -> std::result::Result<Option<Voltage>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<LnbValue>::deserialize(deserializer)?;
    Ok(value.map(|value| match value {
        LnbValue::Volts(volts) => Voltage::from_arg(&volts.to_string()),
        LnbValue::Name(name) => match name.trim().to_ascii_lowercase().as_str() {
            "low" => Voltage::Low,
            "high" => Voltage::High,
            _ => Voltage::from_arg(&name),
        },
    }))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub interval_ms: u64,
    pub bell: bool,
    pub json: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Prometheus textfile written when the session closes
    pub textfile: Option<PathBuf>,
}

// Default implementations
impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval_ms: 1000,
            bell: false,
            json: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file. Values are validated only after
    /// environment and command-line overrides have been merged in.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())
            .map_err(|e| CheckSignalError::Config {
                message: format!("Failed to read config file: {}", e),
                code: ErrorCode::ConfigFileNotFound,
                source: Some(Box::new(e)),
            })?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| CheckSignalError::Config {
                message: format!("Failed to parse config file: {}", e),
                code: ErrorCode::ConfigParseFailed,
                source: Some(Box::new(e)),
            })?;

        Ok(config)
    }

    /// Apply environment variables to the configuration
    pub fn apply_env_vars(&mut self) {
        if let Ok(dev) = env::var("CHECKSIGNAL_DEVICE") {
            if let Ok(d) = dev.parse() {
                self.tuner.device = Some(d);
            }
        }
        if let Ok(lnb) = env::var("CHECKSIGNAL_LNB") {
            self.tuner.lnb = Some(Voltage::from_arg(&lnb));
        }

        if let Ok(interval) = env::var("CHECKSIGNAL_INTERVAL_MS") {
            if let Ok(i) = interval.parse() {
                self.monitor.interval_ms = i;
            }
        }
        if let Ok(bell) = env::var("CHECKSIGNAL_BELL") {
            self.monitor.bell = bell.parse().unwrap_or(false);
        }

        if let Ok(level) = env::var("CHECKSIGNAL_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = env::var("CHECKSIGNAL_LOG_FORMAT") {
            if format == "json" {
                self.logging.format = LogFormat::Json;
            }
        }

        if let Ok(path) = env::var("CHECKSIGNAL_METRICS_FILE") {
            self.metrics.textfile = Some(PathBuf::from(path));
        }
    }

    /// Validate all configuration values
    pub fn validate(&self) -> Result<()> {
        validation::validate_interval_ms(self.monitor.interval_ms)?;
        validation::validate_log_level(&self.logging.level)?;
        if let Some(device) = self.tuner.device {
            validation::validate_device(device)?;
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.monitor.interval_ms)
    }

    /// Generate an example TOML configuration file
    pub fn example_toml() -> String {
        r#"# checksignal configuration file

[tuner]
# device = 0         # /dev/dvb/adapterN; omit to use the first free adapter
# lnb = 11           # 11, 15 or 0 (off); "low"/"high"/"off" also work

[monitor]
interval_ms = 1000
bell = false
json = false

[logging]
level = "info"       # trace, debug, info, warn, error
format = "text"      # text or json

[metrics]
# textfile = "/var/lib/node_exporter/textfile/checksignal.prom"
"#.to_string()
    }
}
