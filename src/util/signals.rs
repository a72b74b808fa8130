// src/util/signals.rs
//
// Signal watcher thread for graceful shutdown

use std::os::unix::thread::JoinHandleExt;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use nix::sys::pthread::pthread_kill;
use nix::sys::signal::{SigSet, Signal};
use tracing::{debug, error, warn};

use crate::errors::{CheckSignalError, Result};
use crate::metrics;
use crate::state::{SessionState, StopCause};

/// The signals the watcher takes over from default delivery.
pub fn watched_signals() -> SigSet {
    let mut set = SigSet::empty();
    set.add(Signal::SIGINT);
    set.add(Signal::SIGTERM);
    set.add(Signal::SIGUSR1);
    set
}

/// One-shot listener that turns SIGINT, SIGTERM or SIGUSR1 into a shutdown
/// request on the shared session state.
///
/// The watched set is blocked on the spawning thread before the watcher
/// starts, so the watcher and every thread spawned afterwards inherit the
/// mask and only the watcher's `sigwait` ever sees these signals.
pub struct SignalWatcher {
    handle: JoinHandle<Option<Signal>>,
    masked: bool,
}

impl SignalWatcher {
    /// Block the watched signals on the calling thread and spawn the watcher.
    ///
    /// A failure to block is logged and the watcher is started anyway; the
    /// process then keeps running without the race-free shutdown guarantee.
    pub fn spawn(state: Arc<SessionState>) -> Result<Self> {
        let set = watched_signals();
        let masked = match set.thread_block() {
            Ok(()) => true,
            Err(errno) => {
                let err = CheckSignalError::signal_mask_failed(errno);
                warn!("{}", err);
                false
            }
        };

        let handle = thread::Builder::new()
            .name("signal-watcher".to_string())
            .spawn(move || wait_for_signal(set, &state))
            .map_err(|e| CheckSignalError::Internal {
                message: format!("Failed to spawn signal watcher: {}", e),
                code: crate::errors::ErrorCode::WatcherPanic,
            })?;

        Ok(Self { handle, masked })
    }

    /// Whether the watched signals were successfully blocked.
    pub fn is_masked(&self) -> bool {
        self.masked
    }

    /// Deliver `signal` to the watcher thread only.
    pub fn notify(&self, signal: Signal) -> Result<()> {
        pthread_kill(self.handle.as_pthread_t(), signal)
            .map_err(|errno| CheckSignalError::Internal {
                message: format!("pthread_kill({}) failed: {}", signal, errno),
                code: crate::errors::ErrorCode::Unknown,
            })
    }

    /// Normal-exit handshake: wake the watcher with SIGUSR1 in case it is
    /// still waiting, then block until it has terminated.
    ///
    /// Returns the signal the watcher handled, if any.
    pub fn shutdown(self) -> Result<Option<Signal>> {
        if !self.handle.is_finished() {
            if let Err(e) = self.notify(Signal::SIGUSR1) {
                // The thread may have exited between the check and the kill.
                debug!("Normal-exit wakeup not delivered: {}", e);
            }
        }

        self.handle
            .join()
            .map_err(|_| CheckSignalError::watcher_panicked())
    }
}

fn wait_for_signal(set: SigSet, state: &SessionState) -> Option<Signal> {
    let received = match set.wait() {
        Ok(signal) => Some(signal),
        Err(errno) => {
            error!("sigwait() failed: {}", errno);
            None
        }
    };

    match received {
        Some(Signal::SIGINT) => {
            warn!("SIGINT received. cleaning up...");
            metrics::SHUTDOWN_SIGNALS.inc();
            state.shutdown.request(StopCause::Interrupt);
        }
        Some(Signal::SIGTERM) => {
            warn!("SIGTERM received. cleaning up...");
            metrics::SHUTDOWN_SIGNALS.inc();
            state.shutdown.request(StopCause::Terminate);
        }
        // SIGUSR1 is the normal-exit wakeup; a failed wait also lands here so
        // the loop is never left running with INT/TERM blocked.
        _ => {
            state.shutdown.request(StopCause::NormalExit);
        }
    }

    state.mark_watcher_exited();
    received
}
