//! Headless planet texture baker.
//!
//! Loads `config.ron` (created with defaults on first run), applies CLI
//! overrides, then runs the progressive tier sequence for one planet and
//! writes the resulting textures as PNGs. Edits to `config.ron` made while
//! the bake runs restart the sequence with the new settings.
//!
//! `cargo run -p orbis-app -- --seed 27 --out-dir textures`

mod bake;
mod export;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use orbis_config::{CliArgs, Config, ConfigError, config_file, default_config_dir};

use crate::bake::ConfigWatch;

/// The config as read from disk and as overridden by the CLI.
#[derive(Debug)]
struct LoadedConfig {
    path: PathBuf,
    created: bool,
    on_disk: Config,
    effective: Config,
}

/// Load (or create) `config.ron` and layer `args` on top. Logs nothing:
/// the subscriber is installed from the result.
fn load_config(config_dir: &Path, args: &CliArgs) -> Result<LoadedConfig, ConfigError> {
    let path = config_file(config_dir);
    let created = !path.exists();
    let on_disk = Config::load_or_create(config_dir)?;
    let mut effective = on_disk.clone();
    effective.apply_cli_overrides(args);
    Ok(LoadedConfig {
        path,
        created,
        on_disk,
        effective,
    })
}

fn main() -> ExitCode {
    let args = CliArgs::parse();

    let config_dir = match args.config.clone().map_or_else(default_config_dir, Ok) {
        Ok(dir) => dir,
        Err(err) => return fail_before_logging("Could not resolve config directory", &err),
    };

    let loaded = match load_config(&config_dir, &args) {
        Ok(loaded) => loaded,
        Err(err) => return fail_before_logging("Could not load config", &err),
    };
    let config = loaded.effective;

    let log_dir = config_dir.join("logs");
    orbis_log::init_logging(Some(&log_dir), cfg!(debug_assertions), Some(&config));
    if loaded.created {
        tracing::info!(path = %loaded.path.display(), "Wrote default config");
    } else {
        tracing::info!(path = %loaded.path.display(), "Using config");
    }

    let watch = ConfigWatch::new(config_dir, loaded.on_disk, args);
    match bake::bake(&config, Some(watch)) {
        Ok(summary) => {
            tracing::info!(
                generation = summary.generation,
                resolution = summary.final_resolution,
                files = summary.written.len(),
                released = summary.released,
                elapsed_ms = summary.elapsed.as_millis() as u64,
                directory = %config.output.directory.display(),
                "Bake finished"
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(error = %err, "Bake failed");
            ExitCode::FAILURE
        }
    }
}

/// Log `err` with a default subscriber and report failure.
fn fail_before_logging(message: &str, err: &ConfigError) -> ExitCode {
    orbis_log::init_logging(None, false, None);
    tracing::error!(error = %err, "{message}");
    ExitCode::FAILURE
}
