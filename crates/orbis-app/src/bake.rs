//! Drives one planet's tier sequence to completion and exports the result.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use orbis_config::{CliArgs, Config};
use orbis_planet::{DeviceTier, MaterialSettings, MaterialState, Planet};
use orbis_terrain::{ColorGradient, GradientRamp, NormalSource, TextureBuildWorker};

use crate::export::{ExportError, PngExporter};

/// Upper bound on a whole bake, largest tier included.
const BAKE_TIMEOUT: Duration = Duration::from_secs(600);

/// What a finished bake produced.
#[derive(Debug)]
pub struct BakeSummary {
    pub generation: u64,
    pub final_resolution: u32,
    pub written: Vec<PathBuf>,
    pub released: usize,
    pub elapsed: Duration,
}

/// Re-reads `config.ron` while a bake runs.
///
/// The file is compared with its last-read contents, not with the effective
/// settings, and the CLI overrides are layered on again after every change
/// so they keep winning.
#[derive(Debug)]
pub struct ConfigWatch {
    dir: PathBuf,
    on_disk: Config,
    overrides: CliArgs,
    last_check: Option<Instant>,
}

impl ConfigWatch {
    pub fn new(dir: impl Into<PathBuf>, on_disk: Config, overrides: CliArgs) -> Self {
        Self {
            dir: dir.into(),
            on_disk,
            overrides,
            last_check: None,
        }
    }

    /// The new effective config if the file changed since the last read.
    ///
    /// Checks at most once per `output.reload_interval_ms`. An unreadable
    /// file (e.g. half-saved by an editor) is logged and skipped.
    pub fn poll(&mut self) -> Option<Config> {
        let now = Instant::now();
        let interval = Duration::from_millis(self.on_disk.output.reload_interval_ms);
        if self
            .last_check
            .is_some_and(|last| now.duration_since(last) < interval)
        {
            return None;
        }
        self.last_check = Some(now);

        match self.on_disk.reload(&self.dir) {
            Ok(Some(fresh)) => {
                self.on_disk = fresh.clone();
                let mut effective = fresh;
                effective.apply_cli_overrides(&self.overrides);
                Some(effective)
            }
            Ok(None) => None,
            Err(err) => {
                tracing::warn!(error = %err, "Ignoring unreadable config");
                None
            }
        }
    }
}

pub fn device_tier(config: &Config) -> DeviceTier {
    DeviceTier::new(config.device.capable_gpu, config.device.mobile)
}

fn normal_source(config: &Config) -> NormalSource {
    config
        .planet
        .normal_source
        .clone()
        .map_or(NormalSource::Procedural, NormalSource::File)
}

pub fn material_settings(config: &Config) -> MaterialSettings {
    let planet = &config.planet;
    MaterialSettings {
        seed: planet.seed(),
        layers: planet.noise_layers.clone(),
        bump_level: planet.bump_level,
        source: normal_source(config),
        release_grace_ticks: config.output.release_grace_ticks,
        carry_previous_bump: planet.carry_previous_bump,
        minibump_seed: None,
    }
}

/// Bake the planet described by `config` with the device's tier ladder,
/// following edits to `config.ron` when `watch` is given.
pub fn bake(config: &Config, watch: Option<ConfigWatch>) -> Result<BakeSummary, ExportError> {
    bake_planet(config, watch, build_planet(config, None), BAKE_TIMEOUT)
}

/// The planet `config` describes, optionally on a custom tier ladder.
fn build_planet(config: &Config, tiers: Option<Vec<u32>>) -> Planet {
    let planet = Planet::new(
        config.planet.name.as_str(),
        config.planet.subdivisions,
        material_settings(config),
        device_tier(config),
        TextureBuildWorker::new(),
    );
    match tiers {
        Some(tiers) => planet.with_resolution_tiers(tiers),
        None => planet,
    }
}

fn final_resolution(planet: &Planet) -> u32 {
    planet
        .material()
        .resolution_tiers()
        .last()
        .copied()
        .unwrap_or_default()
}

fn bake_planet(
    config: &Config,
    watch: Option<ConfigWatch>,
    planet: Planet,
    timeout: Duration,
) -> Result<BakeSummary, ExportError> {
    let mut exporter = PngExporter::new(
        &config.output.directory,
        planet.name(),
        final_resolution(&planet),
        config.output.write_intermediate_tiers,
    )?;
    run(config, watch, planet, &mut exporter, timeout)
}

/// Tick until the last tier is applied, then write the palette strip.
///
/// The planet is disposed through `exporter` on every path, so live and
/// pending sets are released even when the bake fails.
fn run(
    config: &Config,
    watch: Option<ConfigWatch>,
    mut planet: Planet,
    exporter: &mut PngExporter,
    timeout: Duration,
) -> Result<BakeSummary, ExportError> {
    let started = Instant::now();
    tracing::info!(
        planet = planet.name(),
        seed = %config.planet.seed(),
        subdivisions = planet.mesh().subdivisions(),
        tiers = ?planet.material().resolution_tiers(),
        "Baking planet textures"
    );

    let mut current = config.clone();
    let mut outcome = drive(&mut planet, exporter, &mut current, watch, timeout);
    if outcome.is_ok() {
        let ramp = GradientRamp::from_gradient(&ColorGradient::generate(current.planet.seed()));
        outcome = exporter.write_raster("palette", &ramp.to_strip()).map(|_| ());
    }

    let generation = planet.material().generation();
    let final_resolution = final_resolution(&planet);
    planet.dispose(exporter);
    outcome?;

    Ok(BakeSummary {
        generation,
        final_resolution,
        written: exporter.written().to_vec(),
        released: exporter.released(),
        elapsed: started.elapsed(),
    })
}

fn drive(
    planet: &mut Planet,
    exporter: &mut PngExporter,
    current: &mut Config,
    mut watch: Option<ConfigWatch>,
    timeout: Duration,
) -> Result<(), ExportError> {
    let deadline = Instant::now() + timeout;
    while !planet.material().is_complete() {
        planet.tick(exporter);
        if let Some(updated) = watch.as_mut().and_then(ConfigWatch::poll) {
            apply_config_change(planet, exporter, current, &updated);
            *current = updated;
        }

        if let Some(err) = exporter.take_error() {
            return Err(err);
        }
        if let MaterialState::Stalled { applied } = planet.material().state() {
            return Err(ExportError::Stalled { applied });
        }
        if Instant::now() >= deadline {
            return Err(ExportError::TimedOut(timeout));
        }
        std::thread::sleep(Duration::from_millis(current.output.tick_interval_ms.max(1)));
    }
    Ok(())
}

/// Push the planet settings that changed into the running material.
///
/// Seed, noise layers, normal source and device restart the tier sequence.
/// Bump and release settings take effect on the next bake.
fn apply_config_change(
    planet: &mut Planet,
    exporter: &mut PngExporter,
    old: &Config,
    new: &Config,
) {
    let material = planet.material_mut();
    if new.planet.seed() != old.planet.seed() {
        material.set_seed(new.planet.seed());
    }
    if new.planet.noise_layers != old.planet.noise_layers {
        material.set_noise_layers(new.planet.noise_layers.clone());
    }
    if new.planet.normal_source != old.planet.normal_source {
        material.set_normal_source(normal_source(new));
    }
    let device = device_tier(new);
    if device != device_tier(old) {
        material.set_device(device);
    }
    if new.planet.subdivisions != old.planet.subdivisions {
        planet.set_subdivisions(new.planet.subdivisions);
    }

    exporter.set_final_resolution(final_resolution(planet));
    tracing::info!(
        generation = planet.material().generation(),
        seed = %new.planet.seed(),
        "Applied config change"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use orbis_terrain::Seed;

    fn config(dir: &std::path::Path) -> Config {
        let mut config = Config::default();
        config.output.directory = dir.to_path_buf();
        config.output.tick_interval_ms = 1;
        config.output.reload_interval_ms = 0;
        config
    }

    fn bake_tiers(
        config: &Config,
        watch: Option<ConfigWatch>,
        tiers: Vec<u32>,
    ) -> Result<BakeSummary, ExportError> {
        bake_planet(
            config,
            watch,
            build_planet(config, Some(tiers)),
            Duration::from_secs(60),
        )
    }

    #[test]
    fn test_device_tier_from_config() {
        let mut config = Config::default();
        config.device.mobile = true;
        assert_eq!(device_tier(&config).resolution_tiers(), vec![256, 512]);
    }

    #[test]
    fn test_material_settings_follow_config() {
        let mut config = Config::default();
        config.planet.terrain_seed = "31".to_string();
        config.planet.bump_level = 0.5;
        config.planet.normal_source = Some(PathBuf::from("normals.png"));
        config.output.release_grace_ticks = 7;

        let settings = material_settings(&config);
        assert_eq!(settings.seed, Seed(31));
        assert_eq!(settings.bump_level, 0.5);
        assert_eq!(settings.release_grace_ticks, 7);
        assert_eq!(settings.source, NormalSource::File(PathBuf::from("normals.png")));
    }

    #[test]
    fn test_bake_writes_final_tier_and_palette() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());

        let summary = bake_tiers(&config, None, vec![16, 32]).unwrap();
        assert_eq!(summary.generation, 0);
        assert_eq!(summary.final_resolution, 32);
        assert_eq!(summary.written.len(), 5);
        assert_eq!(summary.released, 2);
        assert!(dir.path().join("planet-32-diffuse.png").exists());
        assert!(dir.path().join("planet-palette.png").exists());
        assert!(!dir.path().join("planet-16-diffuse.png").exists());
    }

    #[test]
    fn test_bake_all_tiers() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path());
        config.output.write_intermediate_tiers = true;

        let summary = bake_tiers(&config, None, vec![16, 32]).unwrap();
        assert_eq!(summary.written.len(), 9);
        assert!(dir.path().join("planet-16-bump.png").exists());
    }

    #[test]
    fn test_bake_reports_stall() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path());
        config.planet.normal_source = Some(PathBuf::from("/nonexistent/orbis/normals.png"));

        let err = bake_tiers(&config, None, vec![16]).unwrap_err();
        assert!(matches!(err, ExportError::Stalled { applied: None }));
    }

    #[test]
    fn test_failed_export_still_releases_sets() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        // A directory where the final height map should go makes that write fail
        // after the first tier has already been applied.
        std::fs::create_dir(dir.path().join("planet-32-height.png")).unwrap();

        let mut exporter = PngExporter::new(dir.path(), "planet", 32, false).unwrap();
        let planet = build_planet(&config, Some(vec![16, 32]));
        let err = run(&config, None, planet, &mut exporter, Duration::from_secs(60)).unwrap_err();

        assert!(matches!(err, ExportError::Write { .. }));
        assert_eq!(
            exporter.released(),
            2,
            "both the live and the replaced tier must be released"
        );
    }

    #[test]
    fn test_timeout_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());

        let mut exporter = PngExporter::new(dir.path(), "planet", 32, false).unwrap();
        let planet = build_planet(&config, Some(vec![16, 32]));
        let err = run(&config, None, planet, &mut exporter, Duration::ZERO).unwrap_err();

        assert!(matches!(err, ExportError::TimedOut(_)));
        assert!(exporter.written().is_empty());
    }

    #[test]
    fn test_watch_ignores_unchanged_file() {
        let dir = tempfile::tempdir().unwrap();
        let on_disk = config(dir.path());
        on_disk.save(dir.path()).unwrap();

        let mut watch = ConfigWatch::new(dir.path(), on_disk, CliArgs::default());
        assert!(watch.poll().is_none());
    }

    #[test]
    fn test_watch_reapplies_cli_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let on_disk = config(dir.path());
        let mut edited = on_disk.clone();
        edited.planet.terrain_seed = "99".to_string();
        edited.planet.subdivisions = 64;
        edited.save(dir.path()).unwrap();

        let overrides = CliArgs {
            seed: Some("5".to_string()),
            ..Default::default()
        };
        let mut watch = ConfigWatch::new(dir.path(), on_disk, overrides);

        let effective = watch.poll().expect("edited file should be picked up");
        assert_eq!(effective.planet.terrain_seed, "5");
        assert_eq!(effective.planet.subdivisions, 64);
        assert!(watch.poll().is_none(), "the same edit must not fire twice");
    }

    #[test]
    fn test_config_edit_restarts_bake_with_new_seed() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let config = config(&out);
        let mut edited = config.clone();
        edited.planet.terrain_seed = "99".to_string();
        edited.save(dir.path()).unwrap();

        let watch = ConfigWatch::new(dir.path(), config.clone(), CliArgs::default());
        let summary = bake_tiers(&config, Some(watch), vec![16, 32]).unwrap();

        assert_eq!(summary.generation, 1, "the seed edit should supersede the first run");
        assert_eq!(summary.final_resolution, 32);
        assert_eq!(summary.written.len(), 5);

        let ramp = GradientRamp::from_gradient(&ColorGradient::generate(Seed(99)));
        let palette = image::open(out.join("planet-palette.png")).unwrap().to_rgba8();
        for x in [0u32, 100, 255] {
            assert_eq!(palette.get_pixel(x, 0).0, ramp.lookup(x as u8));
        }
    }

    #[test]
    fn test_device_edit_retargets_final_tier() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path());
        config.device.mobile = true;
        let mut edited = config.clone();
        edited.device.mobile = false;

        let mut planet = build_planet(&config, None);
        let mut exporter = PngExporter::new(dir.path(), "planet", 512, false).unwrap();
        apply_config_change(&mut planet, &mut exporter, &config, &edited);

        assert_eq!(planet.material().generation(), 1);
        assert_eq!(final_resolution(&planet), 1024);
    }
}
