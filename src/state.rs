// Shared session state between the supervisory loop and the signal watcher

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;

use serde::Serialize;

/// LNB supply voltage for satellite frontends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Voltage {
    /// 11V (SEC_VOLTAGE_13; 12V on PT1/2/3)
    Low,
    /// 15V (SEC_VOLTAGE_18)
    High,
    /// SEC_VOLTAGE_OFF
    Off,
}

impl Voltage {
    /// Map a `--lnb` argument to a setting. Only 11 and 15 select a supply,
    /// everything else (including garbage) is OFF.
    pub fn from_arg(arg: &str) -> Self {
        match atoi(arg) {
            11 => Voltage::Low,
            15 => Voltage::High,
            _ => Voltage::Off,
        }
    }

    /// Value for the frontend's `FE_SET_VOLTAGE` ioctl.
    pub fn sec_voltage(self) -> i32 {
        match self {
            Voltage::Low => 0,
            Voltage::High => 1,
            Voltage::Off => 2,
        }
    }
}

impl fmt::Display for Voltage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Voltage::Low => "11V",
            Voltage::High => "15V",
            Voltage::Off => "0V",
        };
        f.write_str(label)
    }
}

/// Lenient integer parse: optional leading whitespace and sign, then as many
/// digits as are present. Anything unparseable is 0.
fn atoi(s: &str) -> i64 {
    let s = s.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let mut value: i64 = 0;
    for b in rest.bytes().take_while(u8::is_ascii_digit) {
        value = value.saturating_mul(10).saturating_add(i64::from(b - b'0'));
    }
    if negative {
        -value
    } else {
        value
    }
}

/// Why the supervisory loop stopped sampling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopCause {
    /// SIGINT from the operator
    Interrupt,
    /// SIGTERM from a process supervisor
    Terminate,
    /// Sampling ended without an external request
    NormalExit,
}

impl StopCause {
    fn encode(self) -> u8 {
        match self {
            StopCause::Interrupt => 1,
            StopCause::Terminate => 2,
            StopCause::NormalExit => 3,
        }
    }

    fn decode(raw: u8) -> Option<Self> {
        match raw {
            1 => Some(StopCause::Interrupt),
            2 => Some(StopCause::Terminate),
            3 => Some(StopCause::NormalExit),
            _ => None,
        }
    }
}

/// One-shot cancellation flag. Goes false -> true at most once and remembers
/// the cause of the request that flipped it.
#[derive(Debug, Clone, Default)]
pub struct ShutdownFlag {
    cause: Arc<AtomicU8>,
}

impl ShutdownFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request shutdown. Returns true only for the call that flipped the flag.
    pub fn request(&self, cause: StopCause) -> bool {
        self.cause
            .compare_exchange(0, cause.encode(), Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    pub fn is_requested(&self) -> bool {
        self.cause.load(Ordering::SeqCst) != 0
    }

    pub fn cause(&self) -> Option<StopCause> {
        StopCause::decode(self.cause.load(Ordering::SeqCst))
    }
}

/// State shared by the supervisory loop and the signal watcher.
///
/// Configuration fields are fixed before the session opens. The watcher only
/// ever touches `shutdown` and `watcher_exited`; the hardware handles live in
/// the tuner session owned by the loop.
#[derive(Debug)]
pub struct SessionState {
    pub shutdown: ShutdownFlag,
    pub voltage: Option<Voltage>,
    pub persistent_tuning: bool,
    watcher_exited: AtomicBool,
}

impl SessionState {
    pub fn new(voltage: Option<Voltage>) -> Self {
        Self {
            shutdown: ShutdownFlag::new(),
            voltage,
            persistent_tuning: false,
            watcher_exited: AtomicBool::new(false),
        }
    }

    /// Set by the watcher thread as the last thing it does.
    pub(crate) fn mark_watcher_exited(&self) {
        self.watcher_exited.store(true, Ordering::SeqCst);
    }

    pub fn watcher_exited(&self) -> bool {
        self.watcher_exited.load(Ordering::SeqCst)
    }
}
