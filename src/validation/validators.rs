// src/validation/validators.rs
//
// Value parsers for command-line arguments

use crate::state::Voltage;

/// Parse `--lnb`. Never fails: anything other than 11 or 15 is OFF.
pub fn parse_voltage(s: &str) -> Result<Voltage, String> {
    Ok(Voltage::from_arg(s))
}

/// Parse `--dev`
pub fn parse_device(s: &str) -> Result<u32, String> {
    let device = s
        .parse::<u32>()
        .map_err(|_| "Device must be a non-negative adapter number".to_string())?;
    super::validate_device(device).map_err(|e| e.to_string())?;
    Ok(device)
}

/// Validate a log level string
pub fn validate_log_level(s: &str) -> Result<String, String> {
    super::validate_log_level(s)
        .map(|()| s.to_string())
        .map_err(|_| "Log level must be one of: trace, debug, info, warn, error".to_string())
}

/// Validate a positive number
pub fn validate_positive_number(s: &str) -> Result<u64, String> {
    match s.parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err("Value must be a positive number".to_string()),
    }
}
