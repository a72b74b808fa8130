// src/supervisor.rs
//
// Supervisory loop: owns the hardware session and samples it until shutdown

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::errors::{CheckSignalError, Result};
use crate::metrics;
use crate::report::Report;
use crate::state::{SessionState, StopCause, Voltage};
use crate::tuner::{SignalSample, TuneRequest, Tuner, TunerSession};
use crate::util::signals::SignalWatcher;
use crate::validation;

/// Default time between samples
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

/// Already-validated settings handed over by the command line layer
#[derive(Debug, Clone)]
pub struct MonitorSettings {
    pub channel: Option<String>,
    pub device: Option<u32>,
    pub voltage: Option<Voltage>,
    pub interval: Duration,
    pub bell: bool,
    /// Stop on our own after this many samples.
    pub count: Option<u64>,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            channel: None,
            device: None,
            voltage: None,
            interval: DEFAULT_INTERVAL,
            bell: false,
            count: None,
        }
    }
}

/// Lifecycle of one run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    ConfigChecked,
    SessionOpening,
    Sampling,
    ShuttingDown,
    SessionClosed,
    FatalExit,
}

/// What a completed run did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub samples: u64,
    pub stop_cause: Option<StopCause>,
}

pub struct Supervisor<T: Tuner, R: Report> {
    tuner: T,
    reporter: R,
    settings: MonitorSettings,
    state: Arc<SessionState>,
    phase: Phase,
}

impl<T: Tuner, R: Report> Supervisor<T, R> {
    pub fn new(tuner: T, reporter: R, settings: MonitorSettings) -> Self {
        let mut state = SessionState::new(settings.voltage);
        // Continuous monitoring keeps the tuner locked instead of re-tuning
        // for every sample.
        state.persistent_tuning = true;

        Self {
            tuner,
            reporter,
            settings,
            state: Arc::new(state),
            phase: Phase::Idle,
        }
    }

    pub fn state(&self) -> Arc<SessionState> {
        Arc::clone(&self.state)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    fn enter(&mut self, phase: Phase) {
        debug!(from = ?self.phase, to = ?phase, "phase change");
        self.phase = phase;
    }

    /// Every failed run ends here, whatever step it failed at.
    fn fatal<V>(&mut self, err: CheckSignalError) -> Result<V> {
        self.enter(Phase::FatalExit);
        Err(err)
    }

    /// Run one monitoring session to completion.
    ///
    /// The watcher is started before the session opens and is always joined
    /// before the session is closed.
    pub fn run(&mut self) -> Result<RunSummary> {
        let channel = match validation::validate_channel(self.settings.channel.as_deref()) {
            Ok(channel) => channel.to_string(),
            Err(e) => return self.fatal(e),
        };
        self.enter(Phase::ConfigChecked);

        let watcher = match SignalWatcher::spawn(self.state()) {
            Ok(watcher) => watcher,
            Err(e) => return self.fatal(e),
        };

        self.enter(Phase::SessionOpening);
        let request = TuneRequest {
            channel,
            device: self.settings.device,
            voltage: self.state.voltage,
            persistent: self.state.persistent_tuning,
        };
        let mut session = match self.tuner.open(&request) {
            Ok(session) => session,
            Err(e) => {
                if let Err(join_err) = watcher.shutdown() {
                    warn!("{}", join_err);
                }
                return self.fatal(e);
            }
        };
        info!(channel = %request.channel, modulation = %session.modulation(), "session open");

        self.enter(Phase::Sampling);
        let samples = self.sample_until_shutdown(&mut session);

        self.enter(Phase::ShuttingDown);
        match watcher.shutdown() {
            Ok(handled) => debug!(?handled, "signal watcher joined"),
            Err(e) => warn!("{}", e),
        }

        if let Err(e) = session.close() {
            return self.fatal(e);
        }
        self.enter(Phase::SessionClosed);

        Ok(RunSummary {
            samples,
            stop_cause: self.state.shutdown.cause(),
        })
    }

    fn sample_until_shutdown(&mut self, session: &mut T::Session) -> u64 {
        let modulation = session.modulation();
        let mut samples = 0u64;

        loop {
            if self.state.shutdown.is_requested() {
                break;
            }

            match session.sample() {
                Ok(sample) => {
                    record(&sample);
                    self.reporter.report(&sample, modulation, self.settings.bell);
                }
                Err(e) => {
                    metrics::SAMPLE_ERRORS.inc();
                    warn!("Failed to read signal quality: {}", e);
                }
            }
            samples += 1;

            if self.settings.count.is_some_and(|count| samples >= count) {
                self.state.shutdown.request(StopCause::NormalExit);
                continue;
            }

            thread::sleep(self.settings.interval);
        }

        samples
    }
}

fn record(sample: &SignalSample) {
    metrics::SAMPLES_TOTAL.inc();
    metrics::SNR_DB.set(sample.snr_db);
    metrics::SIGNAL_STRENGTH.set(sample.strength_percent);
    metrics::LOCKED.set(i64::from(sample.locked));
}

/// Log a failed run the way an operator expects to see it.
pub fn log_failure(err: &CheckSignalError) {
    error!("{}", err);
    if let Some(hint) = err.suggestion() {
        info!("{}", hint);
    }
}
