// Known channel table for ISDB-T and ISDB-S tuners

use std::fmt;
use std::io::{self, Write};

use serde::Serialize;

/// Delivery system of a channel, used when interpreting frontend readings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Modulation {
    /// ISDB-T (OFDM)
    Terrestrial,
    /// ISDB-S (TC8PSK)
    Satellite,
}

impl fmt::Display for Modulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Modulation::Terrestrial => f.write_str("ISDB-T"),
            Modulation::Satellite => f.write_str("ISDB-S"),
        }
    }
}

/// A tunable channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub id: String,
    pub modulation: Modulation,
    /// In the units the DVB API expects: Hz for terrestrial, kHz (IF after
    /// the LNB) for satellite.
    pub frequency: u32,
}

const UHF_FIRST: u32 = 13;
const UHF_LAST: u32 = 62;
const BS_LAST: u32 = 23;
const CS_LAST: u32 = 24;

fn uhf(n: u32) -> Option<Channel> {
    if !(UHF_FIRST..=UHF_LAST).contains(&n) {
        return None;
    }
    Some(Channel {
        id: n.to_string(),
        modulation: Modulation::Terrestrial,
        frequency: 473_142_857 + (n - UHF_FIRST) * 6_000_000,
    })
}

fn bs(n: u32) -> Option<Channel> {
    if n == 0 || n > BS_LAST || n % 2 == 0 {
        return None;
    }
    Some(Channel {
        id: format!("BS{}", n),
        modulation: Modulation::Satellite,
        frequency: 1_049_480 + (n - 1) / 2 * 38_360,
    })
}

fn cs(n: u32) -> Option<Channel> {
    if n < 2 || n > CS_LAST || n % 2 != 0 {
        return None;
    }
    Some(Channel {
        id: format!("CS{}", n),
        modulation: Modulation::Satellite,
        frequency: 1_613_000 + (n - 2) / 2 * 40_000,
    })
}

/// Look up a channel by identifier (`27`, `BS1`, `cs4`, ...).
pub fn lookup(id: &str) -> Option<Channel> {
    let id = id.trim().to_ascii_uppercase();
    if let Some(n) = id.strip_prefix("BS") {
        return n.parse().ok().and_then(bs);
    }
    if let Some(n) = id.strip_prefix("CS") {
        return n.parse().ok().and_then(cs);
    }
    id.parse().ok().and_then(uhf)
}

/// All known channels in display order.
pub fn known_channels() -> Vec<Channel> {
    (UHF_FIRST..=UHF_LAST)
        .filter_map(uhf)
        .chain((1..=BS_LAST).filter_map(bs))
        .chain((2..=CS_LAST).filter_map(cs))
        .collect()
}

/// Channel ranges as shown by `--list` and at the end of `--help`.
pub fn channel_summary() -> String {
    format!(
        "Available Channels:\n\
         {}-{}: UHF channels\n\
         BS1-BS{}: BS channels (odd numbers only)\n\
         CS2-CS{}: CS channels (even numbers only)\n",
        UHF_FIRST, UHF_LAST, BS_LAST, CS_LAST
    )
}

/// Print the channel list for `--list`.
pub fn print_known_channels<W: Write>(out: &mut W) -> io::Result<()> {
    out.write_all(channel_summary().as_bytes())
}
