// Input validation for configuration values

pub mod validators;

use crate::errors::{CheckSignalError, Result};

/// Highest adapter index accepted for `--dev`
pub const MAX_DEVICE_INDEX: u32 = 255;

/// Validate the sampling interval
pub fn validate_interval_ms(millis: u64) -> Result<()> {
    if millis == 0 {
        return Err(CheckSignalError::invalid_interval(millis));
    }
    Ok(())
}

/// Validate a log level name
pub fn validate_log_level(level: &str) -> Result<()> {
    match level {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        other => Err(CheckSignalError::invalid_log_level(other)),
    }
}

/// Validate an adapter index
pub fn validate_device(device: u32) -> Result<()> {
    if device > MAX_DEVICE_INDEX {
        return Err(CheckSignalError::invalid_device(device));
    }
    Ok(())
}

/// A channel argument must be present and non-blank
pub fn validate_channel(channel: Option<&str>) -> Result<&str> {
    match channel.map(str::trim) {
        Some(c) if !c.is_empty() => Ok(c),
        _ => Err(CheckSignalError::missing_channel()),
    }
}
