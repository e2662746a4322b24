//! Progressive texture scheduling for one planet material.
//!
//! A [`PlanetMaterial`] walks its resolution ladder one tier at a time: a
//! cheap preview first, then sharper sets as they finish in the background.
//! Every settings change starts a new generation; builds from older
//! generations still finish, but their results are thrown away.

use orbis_terrain::{
    BuildHandle, BuiltTextures, BumpMap, NoiseLayer, NormalSource, Seed, TextureBuildRequest,
    TextureBuildWorker, TextureTriple, default_noise_layers,
};

use crate::device::DeviceTier;
use crate::release::ReleaseQueue;

/// One applied tier: the texture triple, its bump map, and provenance.
///
/// Sets are never mutated after construction; a new tier or a settings
/// change always produces a fresh set.
#[derive(Clone, Debug, PartialEq)]
pub struct TextureSet {
    pub generation: u64,
    pub resolution: u32,
    pub triple: TextureTriple,
    pub bump: BumpMap,
}

impl From<BuiltTextures> for TextureSet {
    fn from(built: BuiltTextures) -> Self {
        Self {
            generation: built.generation,
            resolution: built.resolution,
            triple: built.triple,
            bump: built.bump,
        }
    }
}

/// Receives texture sets as they are applied and released.
///
/// In a renderer this uploads to the GPU and binds the material; the
/// headless binary writes PNGs instead.
pub trait MaterialConsumer {
    /// A new set became live.
    fn apply(&mut self, textures: &TextureSet);

    /// A replaced set has outlived its grace period.
    fn release(&mut self, textures: TextureSet) {
        drop(textures);
    }
}

/// Inputs that determine what a material's textures look like.
#[derive(Clone, Debug)]
pub struct MaterialSettings {
    pub seed: Seed,
    pub layers: Vec<NoiseLayer>,
    pub bump_level: f32,
    pub source: NormalSource,
    /// Ticks a replaced set stays alive before it is released.
    pub release_grace_ticks: u32,
    /// Pre-blit the previous tier's bump map under the next one.
    pub carry_previous_bump: bool,
    /// Pins the minibump jitter; `None` leaves it random.
    pub minibump_seed: Option<u64>,
}

impl Default for MaterialSettings {
    fn default() -> Self {
        Self {
            seed: Seed::default(),
            layers: default_noise_layers(),
            bump_level: 1.0,
            source: NormalSource::Procedural,
            release_grace_ticks: 3,
            carry_previous_bump: false,
            minibump_seed: None,
        }
    }
}

/// Where the material is in its tier sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MaterialState {
    /// Nothing requested yet for the current generation.
    Idle,
    /// A build at `resolution` is running.
    Generating { resolution: u32 },
    /// The set at `resolution` is live.
    Applied { resolution: u32 },
    /// A build failed; the sequence stopped at the last applied tier, if any.
    Stalled { applied: Option<u32> },
}

/// What one call to [`PlanetMaterial::tick`] did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Resolution of the set applied this tick.
    pub applied: Option<u32>,
    /// Resolution submitted for building this tick.
    pub submitted: Option<u32>,
    /// Stale completions thrown away.
    pub discarded: usize,
    /// Replaced sets handed back to the consumer.
    pub released: usize,
    /// A build failed this tick.
    pub failed: bool,
}

/// Owns a planet's live textures and drives their progressive refinement.
#[derive(Debug)]
pub struct PlanetMaterial {
    name: String,
    settings: MaterialSettings,
    device: DeviceTier,
    custom_tiers: Option<Vec<u32>>,
    worker: TextureBuildWorker,
    generation: u64,
    state: MaterialState,
    /// Index into the tier ladder of the next build to submit.
    next_tier: usize,
    in_flight: Option<BuildHandle>,
    stale: Vec<BuildHandle>,
    live: Option<TextureSet>,
    releases: ReleaseQueue<TextureSet>,
}

impl PlanetMaterial {
    pub fn new(
        name: impl Into<String>,
        settings: MaterialSettings,
        device: DeviceTier,
        worker: TextureBuildWorker,
    ) -> Self {
        let releases = ReleaseQueue::new(settings.release_grace_ticks);
        Self {
            name: name.into(),
            settings,
            device,
            custom_tiers: None,
            worker,
            generation: 0,
            state: MaterialState::Idle,
            next_tier: 0,
            in_flight: None,
            stale: Vec::new(),
            live: None,
            releases,
        }
    }

    /// Replace the device-derived ladder, e.g. for thumbnails. Empty or
    /// zero entries are ignored; the ladder is sorted and deduplicated.
    pub fn with_resolution_tiers(mut self, tiers: impl IntoIterator<Item = u32>) -> Self {
        let mut tiers: Vec<u32> = tiers.into_iter().filter(|&r| r > 0).collect();
        tiers.sort_unstable();
        tiers.dedup();
        self.custom_tiers = (!tiers.is_empty()).then_some(tiers);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn settings(&self) -> &MaterialSettings {
        &self.settings
    }

    pub fn device(&self) -> DeviceTier {
        self.device
    }

    /// The resolutions this material builds, smallest first.
    pub fn resolution_tiers(&self) -> Vec<u32> {
        match &self.custom_tiers {
            Some(tiers) => tiers.clone(),
            None => self.device.resolution_tiers(),
        }
    }

    pub fn state(&self) -> MaterialState {
        self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The set currently handed to the consumer.
    pub fn live(&self) -> Option<&TextureSet> {
        self.live.as_ref()
    }

    /// Replaced sets still inside their grace period.
    pub fn pending_releases(&self) -> usize {
        self.releases.len()
    }

    /// Superseded builds that have not reported back yet.
    pub fn stale_builds(&self) -> usize {
        self.stale.len()
    }

    /// The highest tier of the current generation is live.
    pub fn is_complete(&self) -> bool {
        let top = self.resolution_tiers().last().copied();
        self.in_flight.is_none()
            && matches!(self.state, MaterialState::Applied { resolution } if Some(resolution) == top)
    }

    pub fn set_seed(&mut self, seed: Seed) {
        self.settings.seed = seed;
        self.restart("seed");
    }

    pub fn set_noise_layers(&mut self, layers: Vec<NoiseLayer>) {
        self.settings.layers = layers;
        self.restart("noise layers");
    }

    pub fn set_device(&mut self, device: DeviceTier) {
        self.device = device;
        self.restart("device");
    }

    pub fn set_normal_source(&mut self, source: NormalSource) {
        self.settings.source = source;
        self.restart("normal source");
    }

    /// Drive the sequence forward without blocking.
    ///
    /// Releases due sets, discards stale completions, applies a finished
    /// build of the current generation, and submits the next tier.
    pub fn tick<C: MaterialConsumer + ?Sized>(&mut self, consumer: &mut C) -> TickReport {
        let mut report = TickReport::default();

        for set in self.releases.advance() {
            consumer.release(set);
            report.released += 1;
        }

        report.discarded = self.collect_stale();

        if let Some(result) = self.in_flight.as_ref().and_then(BuildHandle::try_take) {
            self.in_flight = None;
            match result {
                Ok(built) if built.generation == self.generation => {
                    report.released += self.apply(built, consumer);
                    report.applied = self.live.as_ref().map(|set| set.resolution);
                }
                Ok(built) => {
                    tracing::debug!(
                        material = %self.name,
                        generation = built.generation,
                        resolution = built.resolution,
                        "Discarded stale texture tier"
                    );
                    report.discarded += 1;
                }
                Err(err) => {
                    tracing::warn!(
                        material = %self.name,
                        generation = self.generation,
                        error = %err,
                        "Texture build failed, keeping current textures"
                    );
                    self.stall();
                    report.failed = true;
                }
            }
        }

        if self.in_flight.is_none() {
            let was_stalled = matches!(self.state, MaterialState::Stalled { .. });
            report.submitted = self.submit_next();
            if !was_stalled && matches!(self.state, MaterialState::Stalled { .. }) {
                report.failed = true;
            }
        }

        report
    }

    /// Hand every remaining set back to the consumer, live one included.
    pub fn dispose<C: MaterialConsumer + ?Sized>(mut self, consumer: &mut C) {
        for set in self.releases.drain_all() {
            consumer.release(set);
        }
        if let Some(set) = self.live.take() {
            consumer.release(set);
        }
    }

    fn restart(&mut self, reason: &str) {
        self.generation += 1;
        if let Some(handle) = self.in_flight.take() {
            self.stale.push(handle);
        }
        self.next_tier = 0;
        self.state = MaterialState::Idle;
        tracing::debug!(
            material = %self.name,
            generation = self.generation,
            reason,
            "Restarting texture sequence"
        );
    }

    fn stall(&mut self) {
        let applied = self
            .live
            .as_ref()
            .filter(|set| set.generation == self.generation)
            .map(|set| set.resolution);
        self.state = MaterialState::Stalled { applied };
    }

    /// Drop stale handles whose builds have reported back.
    fn collect_stale(&mut self) -> usize {
        let name = &self.name;
        let before = self.stale.len();
        self.stale.retain(|handle| match handle.try_take() {
            Some(_) => {
                tracing::debug!(
                    material = %name,
                    generation = handle.generation(),
                    resolution = handle.resolution(),
                    "Discarded stale texture tier"
                );
                false
            }
            None => true,
        });
        before - self.stale.len()
    }

    /// Make `built` the live set. Returns how many sets were released first.
    fn apply<C: MaterialConsumer + ?Sized>(
        &mut self,
        built: BuiltTextures,
        consumer: &mut C,
    ) -> usize {
        let due = self.releases.drain_due();
        let released = due.len();
        for set in due {
            consumer.release(set);
        }

        let build_time_us = built.build_time_us;
        let set = TextureSet::from(built);
        let resolution = set.resolution;
        consumer.apply(&set);
        if let Some(previous) = self.live.replace(set) {
            self.releases.enqueue(previous);
        }

        tracing::info!(
            material = %self.name,
            generation = self.generation,
            resolution,
            build_time_us,
            "Applied texture tier"
        );
        self.state = MaterialState::Applied { resolution };
        self.next_tier += 1;
        released
    }

    /// Submit the next tier if the sequence is ready for one.
    fn submit_next(&mut self) -> Option<u32> {
        if !matches!(self.state, MaterialState::Idle | MaterialState::Applied { .. }) {
            return None;
        }
        let resolution = self.resolution_tiers().get(self.next_tier).copied()?;

        let mut request = TextureBuildRequest::new(
            self.settings.seed,
            self.settings.layers.clone(),
            resolution,
        );
        request.generation = self.generation;
        request.source = self.settings.source.clone();
        request.bump_level = self.settings.bump_level;
        request.minibump_seed = self.settings.minibump_seed;
        if self.settings.carry_previous_bump {
            request.previous_bump = self
                .live
                .as_ref()
                .filter(|set| set.generation == self.generation)
                .map(|set| set.bump.raster.clone());
        }

        match self.worker.submit(request) {
            Ok(handle) => {
                tracing::debug!(
                    material = %self.name,
                    generation = self.generation,
                    resolution,
                    "Submitted texture tier"
                );
                self.in_flight = Some(handle);
                self.state = MaterialState::Generating { resolution };
                Some(resolution)
            }
            Err(err) => {
                tracing::warn!(
                    material = %self.name,
                    resolution,
                    error = %err,
                    "Could not start texture build"
                );
                self.stall();
                None
            }
        }
    }
}
