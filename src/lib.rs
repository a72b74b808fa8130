// Library interface for checksignal
// This allows tests and external code to use checksignal modules

pub mod channels;
pub mod config;
pub mod errors;
pub mod metrics;
pub mod report;
pub mod state;
pub mod supervisor;
pub mod tuner;
pub mod util;
pub mod validation;
