//! Configuration for the Orbis planet texture pipeline.
//!
//! Settings persist to disk as RON, accept CLI overrides via clap, and
//! tolerate missing or unknown fields for forward/backward compatibility.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    Config, DebugConfig, DeviceConfig, OutputConfig, PlanetConfig, config_file,
    default_config_dir,
};
pub use error::ConfigError;
