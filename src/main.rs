// src/main.rs
//
// Signal check utility for DVB tuners

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use checksignal::channels;
use checksignal::config::{Config, LogFormat};
use checksignal::metrics;
use checksignal::report::ConsoleReporter;
use checksignal::state::Voltage;
use checksignal::supervisor::{self, Supervisor};
use checksignal::tuner::dvb::DvbTuner;
use checksignal::util::config::{self as cli_config, Overrides};
use checksignal::util::logging;
use checksignal::validation::validators;

#[derive(Parser, Debug)]
#[command(author, version, about = "signal check utility for DVB tuner", after_help = channels::channel_summary())]
struct Args {
    /// Use DVB device /dev/dvb/adapterN
    #[arg(long, value_name = "N", value_parser = validators::parse_device)]
    dev: Option<u32>,

    /// LNB voltage (0, 11, 15)
    #[arg(long, visible_alias = "LNB", value_name = "VOLTAGE", value_parser = validators::parse_voltage)]
    lnb: Option<Voltage>,

    /// Notify signal quality by bell
    #[arg(long)]
    bell: bool,

    /// Show channel list
    #[arg(long)]
    list: bool,

    /// Configuration file (TOML)
    #[arg(long, short, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Print an example configuration file and exit
    #[arg(long)]
    example_config: bool,

    /// Logging level
    #[arg(long, value_name = "LEVEL", value_parser = validators::validate_log_level)]
    log_level: Option<String>,

    /// Log output format
    #[arg(long, value_name = "FORMAT", value_parser = ["text", "json"])]
    log_format: Option<String>,

    /// Milliseconds between samples
    #[arg(long, value_name = "MS", value_parser = validators::validate_positive_number)]
    interval_ms: Option<u64>,

    /// Stop after this many samples
    #[arg(long, value_name = "N", value_parser = validators::validate_positive_number)]
    count: Option<u64>,

    /// Write Prometheus metrics to this file when the session closes
    #[arg(long, value_name = "PATH")]
    metrics_file: Option<PathBuf>,

    /// Print samples as JSON lines
    #[arg(long)]
    json: bool,

    /// Channel to tune (e.g. 27, BS1, CS4)
    channel: Option<String>,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            device: self.dev,
            lnb: self.lnb,
            bell: self.bell,
            json: self.json,
            interval_ms: self.interval_ms,
            log_level: self.log_level.clone(),
            log_format: self.log_format.as_deref().map(|f| match f {
                "json" => LogFormat::Json,
                _ => LogFormat::Text,
            }),
            metrics_file: self.metrics_file.clone(),
        }
    }
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    if args.list {
        let mut out = io::stdout().lock();
        channels::print_known_channels(&mut out).context("writing channel list")?;
        out.flush().context("writing channel list")?;
        return Ok(ExitCode::SUCCESS);
    }

    if args.example_config {
        print!("{}", Config::example_toml());
        return Ok(ExitCode::SUCCESS);
    }

    let config = match cli_config::load(args.config.as_ref(), &args.overrides()) {
        Ok(config) => config,
        Err(e) => {
            logging::setup("info", LogFormat::Text);
            supervisor::log_failure(&e);
            return Ok(ExitCode::from(e.exit_status()));
        }
    };

    logging::setup(&config.logging.level, config.logging.format);
    info!("Starting checksignal v{}", env!("CARGO_PKG_VERSION"));
    if let Some(voltage) = config.tuner.lnb {
        info!("LNB = {}", voltage);
    }

    metrics::init_metrics();

    let settings = cli_config::monitor_settings(&config, args.channel.clone(), args.count);
    let reporter = ConsoleReporter::stdout(cli_config::report_format(&config));
    let mut supervisor = Supervisor::new(DvbTuner::new(), reporter, settings);

    let outcome = supervisor.run();

    if let Some(path) = &config.metrics.textfile {
        if let Err(e) = metrics::write_textfile(path) {
            warn!("{}", e);
        }
    }

    match outcome {
        Ok(summary) => {
            info!(samples = summary.samples, cause = ?summary.stop_cause, "Shutting down");
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            supervisor::log_failure(&e);
            Ok(ExitCode::from(e.exit_status()))
        }
    }
}
