// Hardware session interface
//
// The supervisory loop drives any tuner through these traits; the Linux DVB
// implementation lives in `tuner::dvb`.

pub mod dvb;

use serde::Serialize;

use crate::channels::Modulation;
use crate::errors::Result;
use crate::state::Voltage;

/// Everything needed to open a hardware session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TuneRequest {
    pub channel: String,
    /// Adapter index; `None` picks the first free adapter.
    pub device: Option<u32>,
    /// LNB supply; `None` leaves the frontend's setting alone.
    pub voltage: Option<Voltage>,
    /// Keep the tune active for the whole session instead of per sample.
    pub persistent: bool,
}

/// One frontend reading
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SignalSample {
    pub snr_db: f64,
    pub strength_percent: f64,
    pub locked: bool,
}

/// Opens hardware sessions
pub trait Tuner {
    type Session: TunerSession;

    fn open(&self, request: &TuneRequest) -> Result<Self::Session>;
}

/// An open hardware session. Handles are valid until `close` consumes it.
pub trait TunerSession {
    /// Delivery system of the tuned channel.
    fn modulation(&self) -> Modulation;

    fn sample(&mut self) -> Result<SignalSample>;

    fn close(self) -> Result<()>;
}
