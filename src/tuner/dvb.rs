// src/tuner/dvb.rs
//
// Linux DVB frontend backend

use std::fs::{File, OpenOptions};
use std::os::fd::{AsRawFd, IntoRawFd};
use std::os::raw::c_int;

use nix::errno::Errno;
use tracing::{debug, info, warn};

use crate::channels::{self, Channel, Modulation};
use crate::errors::{CheckSignalError, ErrorCode, Result};
use crate::state::Voltage;
use crate::tuner::{SignalSample, TuneRequest, Tuner, TunerSession};

/// Adapters probed when no device index is given.
const MAX_ADAPTERS: u32 = 16;

const FE_HAS_LOCK: u32 = 0x10;

const DTV_TUNE: u32 = 1;
const DTV_CLEAR: u32 = 2;
const DTV_FREQUENCY: u32 = 3;
const DTV_DELIVERY_SYSTEM: u32 = 17;

const SYS_ISDBT: u32 = 8;
const SYS_ISDBS: u32 = 9;

/// `struct dtv_property` from linux/dvb/frontend.h (packed).
#[repr(C, packed)]
#[derive(Clone, Copy)]
pub struct DtvProperty {
    cmd: u32,
    reserved: [u32; 3],
    u: [u8; 56],
    result: c_int,
}

impl DtvProperty {
    fn new(cmd: u32, data: u32) -> Self {
        let mut u = [0u8; 56];
        u[..4].copy_from_slice(&data.to_ne_bytes());
        Self { cmd, reserved: [0; 3], u, result: 0 }
    }
}

/// `struct dtv_properties`
#[repr(C)]
pub struct DtvProperties {
    num: u32,
    props: *mut DtvProperty,
}

mod ioctl {
    use super::DtvProperties;

    nix::ioctl_read!(fe_read_status, b'o', 69, u32);
    nix::ioctl_read!(fe_read_signal_strength, b'o', 71, u16);
    nix::ioctl_read!(fe_read_snr, b'o', 72, u16);
    nix::ioctl_write_int_bad!(fe_set_voltage, nix::request_code_none!(b'o', 67));
    nix::ioctl_write_ptr!(fe_set_property, b'o', 82, DtvProperties);
}

/// Opens sessions on `/dev/dvb/adapterN`
#[derive(Debug, Clone, Default)]
pub struct DvbTuner;

impl DvbTuner {
    pub fn new() -> Self {
        Self
    }
}

fn adapter_path(adapter: u32, node: &str) -> String {
    format!("/dev/dvb/adapter{}/{}0", adapter, node)
}

fn open_node(adapter: u32, node: &str) -> Result<File> {
    let path = adapter_path(adapter, node);
    OpenOptions::new()
        .read(true)
        .write(true)
        .open(&path)
        .map_err(|e| CheckSignalError::device_open_failed(&path, e))
}

impl Tuner for DvbTuner {
    type Session = DvbSession;

    fn open(&self, request: &TuneRequest) -> Result<DvbSession> {
        let channel = channels::lookup(&request.channel)
            .ok_or_else(|| CheckSignalError::unknown_channel(&request.channel))?;

        let (adapter, frontend) = match request.device {
            Some(adapter) => (adapter, open_node(adapter, "frontend")?),
            None => (0..MAX_ADAPTERS)
                .find_map(|adapter| match open_node(adapter, "frontend") {
                    Ok(fe) => Some((adapter, fe)),
                    Err(e) => {
                        debug!("Skipping adapter {}: {}", adapter, e);
                        None
                    }
                })
                .ok_or_else(CheckSignalError::no_device_available)?,
        };
        info!("Using {}", adapter_path(adapter, "frontend"));

        let mut session = DvbSession {
            adapter,
            channel,
            frontend,
            demux: None,
            voltage: request.voltage,
            persistent: request.persistent,
        };

        match session.start() {
            Ok(()) => Ok(session),
            Err(e) => Err(session.abort(e)),
        }
    }
}

/// Open frontend (demodulator) and demux (filter) handles for one adapter
pub struct DvbSession {
    adapter: u32,
    channel: Channel,
    frontend: File,
    demux: Option<File>,
    voltage: Option<Voltage>,
    persistent: bool,
}

impl DvbSession {
    fn start(&mut self) -> Result<()> {
        if let Some(voltage) = self.voltage {
            self.set_voltage(voltage)?;
        }
        self.tune()?;
        self.demux = Some(open_node(self.adapter, "demux")?);
        Ok(())
    }

    /// Tear down a session whose `start` failed. Handles are dropped and the
    /// error that stopped the open is returned unchanged.
    fn abort(self, err: CheckSignalError) -> CheckSignalError {
        self.power_down();
        err
    }

    fn lnb_powered(&self) -> bool {
        matches!(self.voltage, Some(Voltage::Low) | Some(Voltage::High))
    }

    /// Switch the LNB supply off if we turned it on.
    fn power_down(&self) -> bool {
        if !self.lnb_powered() {
            return false;
        }
        if let Err(e) = self.set_voltage(Voltage::Off) {
            warn!("Failed to switch LNB off: {}", e);
        }
        true
    }

    fn set_voltage(&self, voltage: Voltage) -> Result<()> {
        // SAFETY: FE_SET_VOLTAGE takes its argument by value.
        unsafe { ioctl::fe_set_voltage(self.frontend.as_raw_fd(), voltage.sec_voltage()) }
            .map(|_| ())
            .map_err(|e| CheckSignalError::ioctl_failed(ErrorCode::SetVoltageFailed, "FE_SET_VOLTAGE", e))
    }

    fn tune(&self) -> Result<()> {
        let system = match self.channel.modulation {
            Modulation::Terrestrial => SYS_ISDBT,
            Modulation::Satellite => SYS_ISDBS,
        };
        let mut props = [
            DtvProperty::new(DTV_CLEAR, 0),
            DtvProperty::new(DTV_DELIVERY_SYSTEM, system),
            DtvProperty::new(DTV_FREQUENCY, self.channel.frequency),
            DtvProperty::new(DTV_TUNE, 0),
        ];
        let cmd = DtvProperties {
            num: props.len() as u32,
            props: props.as_mut_ptr(),
        };

        debug!(channel = %self.channel.id, frequency = self.channel.frequency, "tuning");
        // SAFETY: `props` outlives the call and `num` matches its length.
        unsafe { ioctl::fe_set_property(self.frontend.as_raw_fd(), &cmd) }
            .map(|_| ())
            .map_err(|e| CheckSignalError::ioctl_failed(ErrorCode::TuneFailed, "FE_SET_PROPERTY", e))
    }

    fn read_u16(&self, what: &str, f: unsafe fn(c_int, *mut u16) -> nix::Result<c_int>) -> Result<u16> {
        let mut value = 0u16;
        // SAFETY: the ioctl writes a single u16 into `value`.
        unsafe { f(self.frontend.as_raw_fd(), &mut value) }
            .map_err(|e| CheckSignalError::ioctl_failed(ErrorCode::ReadStatusFailed, what, e))?;
        Ok(value)
    }
}

/// Frontend SNR readings are in 0.01 dB steps on the ISDB drivers.
fn snr_to_db(raw: u16) -> f64 {
    f64::from(raw) / 100.0
}

fn strength_to_percent(raw: u16) -> f64 {
    f64::from(raw) * 100.0 / f64::from(u16::MAX)
}

fn close_fd(file: File, what: &str) -> Result<()> {
    nix::unistd::close(file.into_raw_fd()).map_err(|e: Errno| CheckSignalError::close_failed(what, e))
}

impl TunerSession for DvbSession {
    fn modulation(&self) -> Modulation {
        self.channel.modulation
    }

    fn sample(&mut self) -> Result<SignalSample> {
        if !self.persistent {
            self.tune()?;
        }

        let mut status = 0u32;
        // SAFETY: FE_READ_STATUS writes a single u32 into `status`.
        unsafe { ioctl::fe_read_status(self.frontend.as_raw_fd(), &mut status) }
            .map_err(|e| CheckSignalError::ioctl_failed(ErrorCode::ReadStatusFailed, "FE_READ_STATUS", e))?;
        let snr = self.read_u16("FE_READ_SNR", ioctl::fe_read_snr)?;
        let strength = self.read_u16("FE_READ_SIGNAL_STRENGTH", ioctl::fe_read_signal_strength)?;

        Ok(SignalSample {
            snr_db: snr_to_db(snr),
            strength_percent: strength_to_percent(strength),
            locked: status & FE_HAS_LOCK != 0,
        })
    }

    fn close(self) -> Result<()> {
        let mut first_error = None;

        self.power_down();

        if let Some(demux) = self.demux {
            if let Err(e) = close_fd(demux, "close(demux)") {
                first_error.get_or_insert(e);
            }
        }
        if let Err(e) = close_fd(self.frontend, "close(frontend)") {
            first_error.get_or_insert(e);
        }

        match first_error {
            Some(e) => Err(e),
            None => {
                debug!("Closed adapter {}", self.adapter);
                Ok(())
            }
        }
    }
}
