// Console output of signal quality samples

use std::io::{self, Write};

use serde::Serialize;
use tracing::warn;

use crate::channels::Modulation;
use crate::tuner::SignalSample;

/// Output format for sample lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

/// Receives one call per sample taken by the supervisory loop
pub trait Report {
    fn report(&mut self, sample: &SignalSample, modulation: Modulation, bell: bool);
}

#[derive(Serialize)]
struct JsonLine<'a> {
    modulation: Modulation,
    #[serde(flatten)]
    sample: &'a SignalSample,
}

/// Writes human-readable (or JSON) lines to a writer, stdout by default
pub struct ConsoleReporter<W: Write> {
    out: W,
    format: ReportFormat,
}

impl ConsoleReporter<io::Stdout> {
    pub fn stdout(format: ReportFormat) -> Self {
        Self::new(io::stdout(), format)
    }
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(out: W, format: ReportFormat) -> Self {
        Self { out, format }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_sample(&mut self, sample: &SignalSample, modulation: Modulation, bell: bool) -> io::Result<()> {
        match self.format {
            ReportFormat::Text => {
                write!(
                    self.out,
                    "{} SNR {:.2}dB  strength {:.0}%  [{}]",
                    modulation,
                    sample.snr_db,
                    sample.strength_percent,
                    if sample.locked { "locked" } else { "no lock" },
                )?;
            }
            ReportFormat::Json => {
                let line = JsonLine { modulation, sample };
                serde_json::to_writer(&mut self.out, &line)?;
            }
        }
        if bell && sample.locked {
            self.out.write_all(b"\x07")?;
        }
        writeln!(self.out)?;
        self.out.flush()
    }
}

impl<W: Write> Report for ConsoleReporter<W> {
    fn report(&mut self, sample: &SignalSample, modulation: Modulation, bell: bool) {
        if let Err(e) = self.write_sample(sample, modulation, bell) {
            warn!("Failed to write report line: {}", e);
        }
    }
}
