//! Command-line argument parsing for the Orbis texture baker.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Orbis command-line arguments.
///
/// Values given here win over `config.ron`.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "orbis", about = "Procedural planet texture baker")]
pub struct CliArgs {
    /// Terrain seed (numeric text is used verbatim).
    #[arg(long)]
    pub seed: Option<String>,

    /// Mesh subdivisions hint (3-256).
    #[arg(long)]
    pub subdivisions: Option<u32>,

    /// Treat the device as a capable GPU (2048² textures).
    #[arg(long)]
    pub capable_gpu: bool,

    /// Treat the device as mobile (512² textures).
    #[arg(long)]
    pub mobile: bool,

    /// Directory the textures are written to.
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Write every resolution tier, not only the final one.
    #[arg(long)]
    pub all_tiers: bool,

    /// Log filter, e.g. `debug` or `info,orbis_planet=trace`.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Directory holding `config.ron` instead of the platform default.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Overwrite settings with every flag the user actually passed.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(ref seed) = args.seed {
            self.planet.terrain_seed = seed.clone();
        }
        if let Some(subdivisions) = args.subdivisions {
            self.planet.subdivisions = subdivisions;
        }
        if args.capable_gpu {
            self.device.capable_gpu = true;
        }
        if args.mobile {
            self.device.mobile = true;
        }
        if let Some(ref dir) = args.out_dir {
            self.output.directory = dir.clone();
        }
        if args.all_tiers {
            self.output.write_intermediate_tiers = true;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}
