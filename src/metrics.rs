// Metrics for the signal monitor, exported as a Prometheus textfile

use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::Once;

use lazy_static::lazy_static;
use prometheus::{Encoder, Gauge, IntCounter, IntGauge, Registry, TextEncoder};

use crate::errors::{CheckSignalError, Result};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    pub static ref SAMPLES_TOTAL: IntCounter = IntCounter::new(
        "checksignal_samples_total",
        "Total number of signal quality samples taken"
    ).unwrap();

    pub static ref SAMPLE_ERRORS: IntCounter = IntCounter::new(
        "checksignal_sample_errors_total",
        "Total number of failed frontend reads"
    ).unwrap();

    pub static ref SHUTDOWN_SIGNALS: IntCounter = IntCounter::new(
        "checksignal_shutdown_signals_total",
        "Number of SIGINT/SIGTERM notifications handled"
    ).unwrap();

    pub static ref SNR_DB: Gauge = Gauge::new(
        "checksignal_snr_db",
        "Last measured signal to noise ratio in dB"
    ).unwrap();

    pub static ref SIGNAL_STRENGTH: Gauge = Gauge::new(
        "checksignal_signal_strength_percent",
        "Last measured signal strength as a percentage of full scale"
    ).unwrap();

    pub static ref LOCKED: IntGauge = IntGauge::new(
        "checksignal_locked",
        "Whether the frontend reported lock on the last sample (0/1)"
    ).unwrap();
}

static INIT: Once = Once::new();

/// Register all metrics with the registry. Safe to call more than once.
pub fn init_metrics() {
    INIT.call_once(|| {
        REGISTRY.register(Box::new(SAMPLES_TOTAL.clone())).unwrap();
        REGISTRY.register(Box::new(SAMPLE_ERRORS.clone())).unwrap();
        REGISTRY.register(Box::new(SHUTDOWN_SIGNALS.clone())).unwrap();
        REGISTRY.register(Box::new(SNR_DB.clone())).unwrap();
        REGISTRY.register(Box::new(SIGNAL_STRENGTH.clone())).unwrap();
        REGISTRY.register(Box::new(LOCKED.clone())).unwrap();
    });
}

/// Get metrics as text in Prometheus format
pub fn get_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if encoder.encode(&metric_families, &mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Write the current metrics to `path` for a node-exporter textfile
/// collector. The file is replaced atomically.
pub fn write_textfile(path: &Path) -> Result<()> {
    let display = path.display().to_string();
    let tmp = path.with_extension("prom.tmp");

    let mut file = fs::File::create(&tmp)
        .map_err(|e| CheckSignalError::metrics_write_failed(&display, e))?;
    file.write_all(get_metrics().as_bytes())
        .and_then(|_| file.sync_all())
        .map_err(|e| CheckSignalError::metrics_write_failed(&display, e))?;
    fs::rename(&tmp, path).map_err(|e| CheckSignalError::metrics_write_failed(&display, e))?;

    Ok(())
}
