// Integration tests for the supervisory loop against a mock tuner

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::thread;
use std::time::{Duration, Instant};

use checksignal::channels::Modulation;
use checksignal::errors::{CheckSignalError, ErrorCode, Result};
use checksignal::report::Report;
use checksignal::state::{SessionState, StopCause, Voltage};
use checksignal::supervisor::{MonitorSettings, Phase, Supervisor};
use checksignal::tuner::{SignalSample, TuneRequest, Tuner, TunerSession};

use super::wait_until;

#[derive(Default)]
struct Calls {
    opens: AtomicUsize,
    samples: AtomicUsize,
    closes: AtomicUsize,
    sampled_after_shutdown: AtomicBool,
    watcher_exited_at_close: AtomicBool,
    request: Mutex<Option<TuneRequest>>,
}

#[derive(Default, Clone)]
struct Behaviour {
    fail_open: bool,
    fail_close: bool,
    /// Simulate an external stop request arriving during this sample.
    stop_during_sample: Option<usize>,
    /// Every other sample fails.
    flaky: bool,
}

struct MockTuner {
    calls: Arc<Calls>,
    behaviour: Behaviour,
    state: Arc<OnceLock<Arc<SessionState>>>,
}

struct MockSession {
    calls: Arc<Calls>,
    behaviour: Behaviour,
    state: Arc<SessionState>,
}

impl Tuner for MockTuner {
    type Session = MockSession;

    fn open(&self, request: &TuneRequest) -> Result<MockSession> {
        self.calls.opens.fetch_add(1, Ordering::SeqCst);
        *self.calls.request.lock().unwrap() = Some(request.clone());
        if self.behaviour.fail_open {
            return Err(CheckSignalError::no_device_available());
        }
        Ok(MockSession {
            calls: self.calls.clone(),
            behaviour: self.behaviour.clone(),
            state: self.state.get().expect("state registered").clone(),
        })
    }
}

impl TunerSession for MockSession {
    fn modulation(&self) -> Modulation {
        Modulation::Terrestrial
    }

    fn sample(&mut self) -> Result<SignalSample> {
        if self.state.shutdown.is_requested() {
            self.calls.sampled_after_shutdown.store(true, Ordering::SeqCst);
        }
        let n = self.calls.samples.fetch_add(1, Ordering::SeqCst) + 1;

        if self.behaviour.stop_during_sample == Some(n) {
            self.state.shutdown.request(StopCause::Terminate);
        }
        if self.behaviour.flaky && n % 2 == 0 {
            return Err(CheckSignalError::ioctl_failed(
                ErrorCode::ReadStatusFailed,
                "FE_READ_SNR",
                nix::errno::Errno::EIO,
            ));
        }

        Ok(SignalSample {
            snr_db: 20.0,
            strength_percent: 80.0,
            locked: true,
        })
    }

    fn close(self) -> Result<()> {
        self.calls.closes.fetch_add(1, Ordering::SeqCst);
        self.calls
            .watcher_exited_at_close
            .store(self.state.watcher_exited(), Ordering::SeqCst);
        if self.behaviour.fail_close {
            return Err(CheckSignalError::close_failed("close(frontend)", nix::errno::Errno::EIO));
        }
        Ok(())
    }
}

#[derive(Default)]
struct RecordingReporter {
    lines: Vec<(SignalSample, Modulation, bool)>,
}

impl Report for RecordingReporter {
    fn report(&mut self, sample: &SignalSample, modulation: Modulation, bell: bool) {
        self.lines.push((*sample, modulation, bell));
    }
}

fn settings(channel: Option<&str>) -> MonitorSettings {
    MonitorSettings {
        channel: channel.map(str::to_string),
        interval: Duration::from_millis(5),
        ..Default::default()
    }
}

fn supervisor(
    behaviour: Behaviour,
    settings: MonitorSettings,
) -> (Supervisor<MockTuner, RecordingReporter>, Arc<Calls>) {
    let calls = Arc::new(Calls::default());
    let cell = Arc::new(OnceLock::new());
    let tuner = MockTuner {
        calls: calls.clone(),
        behaviour,
        state: cell.clone(),
    };
    let supervisor = Supervisor::new(tuner, RecordingReporter::default(), settings);
    cell.set(supervisor.state()).unwrap();
    (supervisor, calls)
}

#[test]
fn test_missing_channel_touches_nothing() {
    let (mut sup, calls) = supervisor(Behaviour::default(), settings(None));

    let err = sup.run().unwrap_err();
    assert_eq!(err.error_code(), ErrorCode::MissingChannel);
    assert_eq!(err.exit_status(), 1);
    assert_eq!(calls.opens.load(Ordering::SeqCst), 0);
    assert_eq!(sup.phase(), Phase::FatalExit);
    assert!(!sup.state().watcher_exited());
}

#[test]
fn test_blank_channel_is_missing() {
    let (mut sup, calls) = supervisor(Behaviour::default(), settings(Some("   ")));

    assert!(sup.run().is_err());
    assert_eq!(calls.opens.load(Ordering::SeqCst), 0);
}

#[test]
fn test_open_request_uses_configuration() {
    let behaviour = Behaviour {
        stop_during_sample: Some(1),
        ..Default::default()
    };
    let (mut sup, calls) = supervisor(behaviour, settings(Some("CH1")));

    sup.run().unwrap();

    let request = calls.request.lock().unwrap().clone().unwrap();
    assert_eq!(request.channel, "CH1");
    assert_eq!(request.device, None);
    assert_eq!(request.voltage, None);
    assert!(request.persistent);
    assert!(sup.state().persistent_tuning);
}

#[test]
fn test_voltage_and_device_are_forwarded() {
    let behaviour = Behaviour {
        stop_during_sample: Some(1),
        ..Default::default()
    };
    let mut s = settings(Some("BS1"));
    s.device = Some(1);
    s.voltage = Some(Voltage::Low);
    let (mut sup, calls) = supervisor(behaviour, s);

    sup.run().unwrap();

    let request = calls.request.lock().unwrap().clone().unwrap();
    assert_eq!(request.device, Some(1));
    assert_eq!(request.voltage, Some(Voltage::Low));
    assert_eq!(sup.state().voltage, Some(Voltage::Low));
}

#[test]
fn test_external_stop_ends_loop_without_extra_samples() {
    let behaviour = Behaviour {
        stop_during_sample: Some(3),
        ..Default::default()
    };
    let (mut sup, calls) = supervisor(behaviour, settings(Some("27")));

    let summary = sup.run().unwrap();

    assert_eq!(summary.samples, 3);
    assert_eq!(summary.stop_cause, Some(StopCause::Terminate));
    assert_eq!(calls.samples.load(Ordering::SeqCst), 3);
    assert!(!calls.sampled_after_shutdown.load(Ordering::SeqCst));
    assert_eq!(sup.reporter().lines.len(), 3);
    assert_eq!(sup.phase(), Phase::SessionClosed);
}

#[test]
fn test_session_closed_exactly_once_after_watcher_joined() {
    let behaviour = Behaviour {
        stop_during_sample: Some(2),
        ..Default::default()
    };
    let (mut sup, calls) = supervisor(behaviour, settings(Some("27")));

    sup.run().unwrap();

    assert_eq!(calls.opens.load(Ordering::SeqCst), 1);
    assert_eq!(calls.closes.load(Ordering::SeqCst), 1);
    assert!(calls.watcher_exited_at_close.load(Ordering::SeqCst));
}

#[test]
fn test_sample_count_triggers_normal_exit() {
    let mut s = settings(Some("27"));
    s.count = Some(4);
    s.bell = true;
    let (mut sup, calls) = supervisor(Behaviour::default(), s);

    let summary = sup.run().unwrap();

    assert_eq!(summary.samples, 4);
    assert_eq!(summary.stop_cause, Some(StopCause::NormalExit));
    assert_eq!(calls.closes.load(Ordering::SeqCst), 1);
    assert!(calls.watcher_exited_at_close.load(Ordering::SeqCst));
    assert!(sup.reporter().lines.iter().all(|(_, m, bell)| *m == Modulation::Terrestrial && *bell));
}

#[test]
fn test_sample_errors_do_not_stop_loop() {
    let mut s = settings(Some("27"));
    s.count = Some(4);
    let behaviour = Behaviour {
        flaky: true,
        ..Default::default()
    };
    let (mut sup, _calls) = supervisor(behaviour, s);

    let summary = sup.run().unwrap();

    assert_eq!(summary.samples, 4);
    assert_eq!(sup.reporter().lines.len(), 2);
}

#[test]
fn test_open_failure_reclaims_watcher() {
    let behaviour = Behaviour {
        fail_open: true,
        ..Default::default()
    };
    let (mut sup, calls) = supervisor(behaviour, settings(Some("27")));

    let err = sup.run().unwrap_err();

    assert_eq!(err.error_code(), ErrorCode::NoDeviceAvailable);
    assert_eq!(err.exit_status(), 1);
    assert_eq!(calls.samples.load(Ordering::SeqCst), 0);
    assert_eq!(calls.closes.load(Ordering::SeqCst), 0);
    assert!(sup.state().watcher_exited());
    assert_eq!(sup.phase(), Phase::FatalExit);
}

#[test]
fn test_close_failure_is_reported() {
    let behaviour = Behaviour {
        fail_close: true,
        stop_during_sample: Some(1),
        ..Default::default()
    };
    let (mut sup, calls) = supervisor(behaviour, settings(Some("27")));

    let err = sup.run().unwrap_err();

    assert_eq!(err.error_code(), ErrorCode::CloseFailed);
    assert_eq!(err.exit_status(), 1);
    assert_eq!(calls.closes.load(Ordering::SeqCst), 1);
    assert_eq!(sup.phase(), Phase::FatalExit);
}

#[test]
fn test_stop_request_honoured_within_one_interval() {
    let interval = Duration::from_millis(200);
    let mut s = settings(Some("27"));
    s.interval = interval;
    let (mut sup, calls) = supervisor(Behaviour::default(), s);
    let state = sup.state();

    let runner = thread::spawn(move || sup.run());

    assert!(wait_until(Duration::from_secs(5), || calls.samples.load(Ordering::SeqCst) >= 1));
    let requested_at = Instant::now();
    assert!(state.shutdown.request(StopCause::Interrupt));

    let summary = runner.join().unwrap().unwrap();
    let latency = requested_at.elapsed();

    assert!(latency < interval * 3, "took {:?}", latency);
    assert_eq!(summary.stop_cause, Some(StopCause::Interrupt));
    assert_eq!(calls.closes.load(Ordering::SeqCst), 1);
    assert!(state.watcher_exited());
}
