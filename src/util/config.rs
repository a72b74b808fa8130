// src/util/config.rs
//
// Merging command-line overrides into the loaded configuration

use std::path::PathBuf;

use crate::config::{Config, LogFormat};
use crate::errors::Result;
use crate::report::ReportFormat;
use crate::state::Voltage;
use crate::supervisor::MonitorSettings;

/// Command-line values that override the file and environment
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub device: Option<u32>,
    pub lnb: Option<Voltage>,
    pub bell: bool,
    pub json: bool,
    pub interval_ms: Option<u64>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
    pub metrics_file: Option<PathBuf>,
}

/// Load the configuration: defaults, then the optional TOML file, then
/// CHECKSIGNAL_* variables, then command-line flags.
pub fn load(path: Option<&PathBuf>, overrides: &Overrides) -> Result<Config> {
    let mut config = match path {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    config.apply_env_vars();
    apply_overrides(&mut config, overrides);
    config.validate()?;
    Ok(config)
}

/// Apply command-line flags on top of `config`
pub fn apply_overrides(config: &mut Config, overrides: &Overrides) {
    if overrides.device.is_some() {
        config.tuner.device = overrides.device;
    }
    if overrides.lnb.is_some() {
        config.tuner.lnb = overrides.lnb;
    }
    if overrides.bell {
        config.monitor.bell = true;
    }
    if overrides.json {
        config.monitor.json = true;
    }
    if let Some(interval) = overrides.interval_ms {
        config.monitor.interval_ms = interval;
    }
    if let Some(level) = &overrides.log_level {
        config.logging.level = level.clone();
    }
    if let Some(format) = overrides.log_format {
        config.logging.format = format;
    }
    if overrides.metrics_file.is_some() {
        config.metrics.textfile = overrides.metrics_file.clone();
    }
}

/// Settings for the supervisory loop
pub fn monitor_settings(config: &Config, channel: Option<String>, count: Option<u64>) -> MonitorSettings {
    MonitorSettings {
        channel,
        device: config.tuner.device,
        voltage: config.tuner.lnb,
        interval: config.interval(),
        bell: config.monitor.bell,
        count,
    }
}

pub fn report_format(config: &Config) -> ReportFormat {
    if config.monitor.json {
        ReportFormat::Json
    } else {
        ReportFormat::Text
    }
}
