// Error types for checksignal with error codes for programmatic handling

use std::fmt;
use std::io;
use thiserror::Error;

/// Error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Configuration errors (1000-1999)
    MissingChannel = 1001,
    UnknownChannel = 1002,
    InvalidInterval = 1003,
    InvalidLogLevel = 1004,
    InvalidDevice = 1005,
    ConfigFileNotFound = 1006,
    ConfigParseFailed = 1007,

    /// Hardware errors (2000-2999)
    DeviceOpenFailed = 2000,
    NoDeviceAvailable = 2001,
    SetVoltageFailed = 2002,
    TuneFailed = 2003,
    ReadStatusFailed = 2004,
    CloseFailed = 2005,

    /// I/O errors (3000-3999)
    MetricsWriteFailed = 3000,

    /// Internal errors (5000-5999)
    SignalMaskFailed = 5000,
    WatcherPanic = 5001,

    /// Generic error
    Unknown = 9999,
}

impl ErrorCode {
    pub fn as_u32(self) -> u32 {
        self as u32
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u32())
    }
}

/// Main error type for checksignal operations
#[derive(Error, Debug)]
pub enum CheckSignalError {
    #[error("Invalid configuration: {message} (code: {code})")]
    Config {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Hardware error: {message} (code: {code})")]
    Hardware {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<io::Error>,
    },

    #[error("I/O error: {message} (code: {code})")]
    Io {
        message: String,
        code: ErrorCode,
        #[source]
        source: io::Error,
    },

    #[error("Internal error: {message} (code: {code})")]
    Internal {
        message: String,
        code: ErrorCode,
    },
}

impl CheckSignalError {
    pub fn error_code(&self) -> ErrorCode {
        match self {
            CheckSignalError::Config { code, .. } => *code,
            CheckSignalError::Hardware { code, .. } => *code,
            CheckSignalError::Io { code, .. } => *code,
            CheckSignalError::Internal { code, .. } => *code,
        }
    }

    /// Process exit status for a run that ended with this error.
    pub fn exit_status(&self) -> u8 {
        1
    }

    pub fn suggestion(&self) -> Option<&str> {
        match self {
            CheckSignalError::Config { code: ErrorCode::MissingChannel, .. } => {
                Some("Pass a channel as the last argument, e.g. 'checksignal 27'. Use --list to see known channels")
            }
            CheckSignalError::Config { code: ErrorCode::UnknownChannel, .. } => {
                Some("Run with --list to print the known channel identifiers")
            }
            CheckSignalError::Config { code: ErrorCode::InvalidInterval, .. } => {
                Some("The sampling interval must be at least 1 millisecond")
            }
            CheckSignalError::Hardware { code: ErrorCode::DeviceOpenFailed, .. } => {
                Some("Check that the adapter exists under /dev/dvb and that you are in the 'video' group")
            }
            CheckSignalError::Hardware { code: ErrorCode::NoDeviceAvailable, .. } => {
                Some("Every adapter is busy or missing. Stop other recorders or pass --dev explicitly")
            }
            CheckSignalError::Hardware { code: ErrorCode::SetVoltageFailed, .. } => {
                Some("The frontend rejected the LNB voltage. Terrestrial tuners usually need --lnb to be omitted")
            }
            _ => None,
        }
    }
}

// Helper functions for creating errors
impl CheckSignalError {
    pub fn missing_channel() -> Self {
        CheckSignalError::Config {
            message: "channel must be specified".to_string(),
            code: ErrorCode::MissingChannel,
            source: None,
        }
    }

    pub fn unknown_channel(channel: &str) -> Self {
        CheckSignalError::Config {
            message: format!("Unknown channel: {}", channel),
            code: ErrorCode::UnknownChannel,
            source: None,
        }
    }

    pub fn invalid_interval(millis: u64) -> Self {
        CheckSignalError::Config {
            message: format!("Invalid sampling interval: {} ms", millis),
            code: ErrorCode::InvalidInterval,
            source: None,
        }
    }

    pub fn invalid_log_level(level: &str) -> Self {
        CheckSignalError::Config {
            message: format!("Invalid log level: {}", level),
            code: ErrorCode::InvalidLogLevel,
            source: None,
        }
    }

    pub fn invalid_device(device: u32) -> Self {
        CheckSignalError::Config {
            message: format!("Invalid adapter index: {}", device),
            code: ErrorCode::InvalidDevice,
            source: None,
        }
    }

    pub fn device_open_failed(path: &str, source: io::Error) -> Self {
        CheckSignalError::Hardware {
            message: format!("Failed to open {}", path),
            code: ErrorCode::DeviceOpenFailed,
            source: Some(source),
        }
    }

    pub fn no_device_available() -> Self {
        CheckSignalError::Hardware {
            message: "No usable DVB adapter found".to_string(),
            code: ErrorCode::NoDeviceAvailable,
            source: None,
        }
    }

    pub fn ioctl_failed(code: ErrorCode, what: &str, errno: nix::errno::Errno) -> Self {
        CheckSignalError::Hardware {
            message: format!("{} failed", what),
            code,
            source: Some(io::Error::from(errno)),
        }
    }

    pub fn close_failed(what: &str, errno: nix::errno::Errno) -> Self {
        Self::ioctl_failed(ErrorCode::CloseFailed, what, errno)
    }

    pub fn metrics_write_failed(path: &str, source: io::Error) -> Self {
        CheckSignalError::Io {
            message: format!("Failed to write metrics file: {}", path),
            code: ErrorCode::MetricsWriteFailed,
            source,
        }
    }

    pub fn signal_mask_failed(errno: nix::errno::Errno) -> Self {
        CheckSignalError::Internal {
            message: format!("pthread_sigmask() failed: {}", errno),
            code: ErrorCode::SignalMaskFailed,
        }
    }

    pub fn watcher_panicked() -> Self {
        CheckSignalError::Internal {
            message: "Signal watcher thread panicked".to_string(),
            code: ErrorCode::WatcherPanic,
        }
    }
}

/// Result type alias for checksignal operations
pub type Result<T> = std::result::Result<T, CheckSignalError>;
