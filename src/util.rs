// Utility modules for the command-line front end

pub mod config;
pub mod logging;
pub mod signals;
