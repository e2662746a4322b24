//! Height, specular, and diffuse raster synthesis.
//!
//! [`build_texture_triple`] is the per-pixel batch pass: every mapped texel
//! of the object-space normal source becomes an elevation, a specular mask
//! value, and a gradient-mapped diffuse color. [`build_textures`] wraps it
//! with source loading and bump map derivation for a full tier.

use std::path::PathBuf;
use std::time::Instant;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use thiserror::Error;

use crate::gradient::{ColorGradient, GradientRamp};
use crate::heightmap::{HeightSynthesizer, NoiseLayer, is_ocean};
use crate::normal_map::{BumpMap, ConvolutionError, build_bump_map};
use crate::raster::Raster;
use crate::seed::Seed;
use crate::sphere_normals::render_object_space_normals;

/// Rasters above this many pixels get the high-resolution minibump jitter.
pub const MINIBUMP_PIXEL_THRESHOLD: usize = 1_000_000;

/// Upper bound (exclusive) of the minibump channel offset.
pub const MINIBUMP_MAX: f64 = 1.5;

/// Specular value written for ocean texels.
pub const OCEAN_SPECULAR: u8 = 100;

/// Initial fill of the specular and diffuse rasters.
pub const BACKGROUND: [u8; 4] = [0, 0, 0, 255];

/// Errors produced while building a texture tier.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The object-space normal source image could not be loaded.
    #[error("failed to load normal source {}: {source}", path.display())]
    SourceLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// The three rasters of a triple must share one size.
    #[error("raster size mismatch: expected {expected:?}, found {found:?}")]
    DimensionMismatch {
        expected: (u32, u32),
        found: (u32, u32),
    },

    /// Bump map convolution failed.
    #[error("bump map convolution failed: {0}")]
    Convolution(#[from] ConvolutionError),

    /// The background thread could not be started.
    #[error("failed to spawn texture build thread: {0}")]
    Spawn(#[source] std::io::Error),

    /// The background thread exited without delivering a result.
    #[error("texture build thread exited without a result")]
    WorkerLost,
}

/// Where the object-space normal source comes from.
#[derive(Clone, Debug, PartialEq)]
pub enum NormalSource {
    /// Bake the cube-cross normal layout at the requested resolution.
    Procedural,
    /// Load an RGB-encoded normal image from disk and rescale it.
    File(PathBuf),
    /// Use a caller-supplied raster, rescaled if needed.
    Raster(Raster),
}

impl NormalSource {
    /// Produce the source raster at `resolution × resolution`.
    ///
    /// File sources are fully decoded before any sampling happens; a decode
    /// failure is reported rather than sampled partially.
    pub fn load(&self, resolution: u32) -> Result<Raster, BuildError> {
        match self {
            NormalSource::Procedural => Ok(render_object_space_normals(resolution)),
            NormalSource::File(path) => {
                let image = image::open(path).map_err(|source| BuildError::SourceLoad {
                    path: path.clone(),
                    source,
                })?;
                Ok(Raster::from_image(image.to_rgba8()).resized_nearest(resolution, resolution))
            }
            NormalSource::Raster(raster) => Ok(raster.resized_nearest(resolution, resolution)),
        }
    }
}

/// Everything one background build needs, owned.
#[derive(Clone, Debug)]
pub struct TextureBuildRequest {
    /// Generation of the material settings this request belongs to.
    pub generation: u64,
    pub seed: Seed,
    pub layers: Vec<NoiseLayer>,
    /// Edge length of the square output rasters. Zero is treated as 1.
    pub resolution: u32,
    pub source: NormalSource,
    /// Pins the minibump RNG; `None` draws a fresh seed per build.
    pub minibump_seed: Option<u64>,
    /// Intensity stored on the resulting bump map.
    pub bump_level: f32,
    /// Previous tier's bump map, pre-blitted under the new one.
    pub previous_bump: Option<Raster>,
}

impl TextureBuildRequest {
    /// A request with a procedural source and no carried bump map.
    pub fn new(seed: Seed, layers: Vec<NoiseLayer>, resolution: u32) -> Self {
        Self {
            generation: 0,
            seed,
            layers,
            resolution,
            source: NormalSource::Procedural,
            minibump_seed: None,
            bump_level: 1.0,
            previous_bump: None,
        }
    }
}

/// Three co-registered rasters of one resolution.
#[derive(Clone, Debug, PartialEq)]
pub struct TextureTriple {
    pub height: Raster,
    pub specular: Raster,
    pub diffuse: Raster,
}

/// A finished tier: the triple, its bump map, and provenance.
#[derive(Clone, Debug)]
pub struct BuiltTextures {
    pub generation: u64,
    pub resolution: u32,
    pub triple: TextureTriple,
    pub bump: BumpMap,
    /// Wall time spent in the build, for profiling.
    pub build_time_us: u64,
}

/// Run the full per-pixel pass over three equally sized rasters.
///
/// `height` carries the object-space normal source on input and the
/// elevation on output. Texels whose source is `(0, 0, 0)` are left
/// untouched in all three rasters. Above [`MINIBUMP_PIXEL_THRESHOLD`] pixels
/// the red and green inputs are jittered by up to [`MINIBUMP_MAX`].
pub fn build_texture_triple(
    seed: Seed,
    layers: &[NoiseLayer],
    mut height: Raster,
    mut specular: Raster,
    mut diffuse: Raster,
    minibump_seed: Option<u64>,
) -> Result<TextureTriple, BuildError> {
    for other in [&specular, &diffuse] {
        if other.dimensions() != height.dimensions() {
            return Err(BuildError::DimensionMismatch {
                expected: height.dimensions(),
                found: other.dimensions(),
            });
        }
    }

    let synthesizer = HeightSynthesizer::new(seed, layers.to_vec());
    let ramp = GradientRamp::from_gradient(&ColorGradient::generate(seed));
    let mut minibump = (height.pixel_count() > MINIBUMP_PIXEL_THRESHOLD).then(|| {
        ChaCha8Rng::seed_from_u64(minibump_seed.unwrap_or_else(rand::random::<u64>))
    });

    for a in (0..height.pixels.len()).step_by(4) {
        let (r, g, b) = (height.pixels[a], height.pixels[a + 1], height.pixels[a + 2]);
        if r == 0 && g == 0 && b == 0 {
            continue;
        }

        let (mut r, mut g, b) = (r as f64, g as f64, b as f64);
        if let Some(rng) = minibump.as_mut() {
            let offset = rng.random_range(0.0..MINIBUMP_MAX);
            r += offset;
            g += offset;
        }

        let value = synthesizer.elevation(r, g, b);
        if is_ocean(value) {
            height.pixels[a..a + 3].fill(0);
            specular.pixels[a..a + 3].fill(OCEAN_SPECULAR);
        } else {
            height.pixels[a..a + 3].fill(value);
        }

        let color = ramp.lookup(value);
        diffuse.pixels[a..a + 3].copy_from_slice(&color[..3]);
        diffuse.pixels[a + 3] = 255;
    }

    Ok(TextureTriple {
        height,
        specular,
        diffuse,
    })
}

/// Build one complete tier: load the source, synthesize the triple, and
/// derive the bump map.
pub fn build_textures(request: &TextureBuildRequest) -> Result<BuiltTextures, BuildError> {
    let start = Instant::now();
    let resolution = request.resolution.max(1);

    let source = request.source.load(resolution)?;
    let specular = Raster::filled(resolution, resolution, BACKGROUND);
    let diffuse = Raster::filled(resolution, resolution, BACKGROUND);
    let triple = build_texture_triple(
        request.seed,
        &request.layers,
        source,
        specular,
        diffuse,
        request.minibump_seed,
    )?;
    let bump = build_bump_map(
        &triple.height,
        request.previous_bump.as_ref(),
        request.bump_level,
    )?;

    let build_time_us = start.elapsed().as_micros() as u64;
    tracing::debug!(
        generation = request.generation,
        resolution,
        build_time_us,
        "texture tier built"
    );

    Ok(BuiltTextures {
        generation: request.generation,
        resolution,
        triple,
        bump,
        build_time_us,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sphere_normals::is_unmapped;

    fn scenario_layers() -> Vec<NoiseLayer> {
        vec![NoiseLayer {
            shift: 5.0,
            passes: 14,
            strength: 0.65,
            roughness: 0.2,
            resistance: 0.6,
            min: 0.3,
            hard: true,
        }]
    }

    #[test]
    fn test_scenario_seed_27_is_reproducible() {
        let request = TextureBuildRequest::new(Seed(27), scenario_layers(), 256);
        let a = build_textures(&request).unwrap();
        let b = build_textures(&request).unwrap();
        assert_eq!(a.triple, b.triple, "Same inputs must byte-match");
        assert_eq!(a.bump, b.bump);
        assert_eq!(a.triple.height.dimensions(), (256, 256));
        assert_eq!(a.triple.specular.dimensions(), (256, 256));
        assert_eq!(a.triple.diffuse.dimensions(), (256, 256));
    }

    #[test]
    fn test_skip_invariant_leaves_background() {
        let mut source = Raster::filled(4, 1, [0, 0, 0, 255]);
        source.set_pixel(1, 0, [200, 100, 50, 255]);
        let specular = Raster::filled(4, 1, [7, 7, 7, 7]);
        let diffuse = Raster::filled(4, 1, [9, 9, 9, 9]);
        let triple =
            build_texture_triple(Seed(3), &scenario_layers(), source, specular, diffuse, None)
                .unwrap();
        for x in [0, 2, 3] {
            assert_eq!(triple.height.pixel(x, 0), [0, 0, 0, 255]);
            assert_eq!(triple.specular.pixel(x, 0), [7, 7, 7, 7]);
            assert_eq!(triple.diffuse.pixel(x, 0), [9, 9, 9, 9]);
        }
        assert_eq!(triple.diffuse.pixel(1, 0)[3], 255);
    }

    #[test]
    fn test_ocean_land_partition() {
        let built = build_textures(&TextureBuildRequest::new(Seed(27), scenario_layers(), 128))
            .unwrap();
        let source = render_object_space_normals(128);
        let synth = HeightSynthesizer::new(Seed(27), scenario_layers());
        let (mut ocean, mut land) = (0, 0);
        for y in 0..128 {
            for x in 0..128 {
                let texel = source.pixel(x, y);
                if is_unmapped(texel) {
                    continue;
                }
                let value = synth.elevation(texel[0] as f64, texel[1] as f64, texel[2] as f64);
                let h = built.triple.height.pixel(x, y);
                let s = built.triple.specular.pixel(x, y);
                if value <= 1 {
                    ocean += 1;
                    assert_eq!(&h[..3], &[0, 0, 0]);
                    assert_eq!(&s[..3], &[100, 100, 100]);
                } else {
                    land += 1;
                    assert_eq!(&h[..3], &[value, value, value]);
                    assert_eq!(&s[..3], &[0, 0, 0]);
                }
            }
        }
        assert!(ocean + land > 0);
    }

    #[test]
    fn test_diffuse_follows_gradient_ramp() {
        let built =
            build_textures(&TextureBuildRequest::new(Seed(8), scenario_layers(), 64)).unwrap();
        let ramp = GradientRamp::from_gradient(&ColorGradient::generate(Seed(8)));
        let source = render_object_space_normals(64);
        let synth = HeightSynthesizer::new(Seed(8), scenario_layers());
        for y in 0..64 {
            for x in 0..64 {
                let texel = source.pixel(x, y);
                if is_unmapped(texel) {
                    continue;
                }
                let value = synth.elevation(texel[0] as f64, texel[1] as f64, texel[2] as f64);
                assert_eq!(built.triple.diffuse.pixel(x, y), ramp.lookup(value));
            }
        }
    }

    #[test]
    fn test_zero_layers_degrade_to_flat() {
        let built = build_textures(&TextureBuildRequest::new(Seed(1), Vec::new(), 32)).unwrap();
        let source = render_object_space_normals(32);
        for y in 0..32 {
            for x in 0..32 {
                if !is_unmapped(source.pixel(x, y)) {
                    assert_eq!(built.triple.height.pixel(x, y)[0], 128);
                }
            }
        }
    }

    #[test]
    fn test_zero_resolution_is_clamped() {
        let built = build_textures(&TextureBuildRequest::new(Seed(1), scenario_layers(), 0))
            .unwrap();
        assert_eq!(built.resolution, 1);
        assert_eq!(built.triple.height.dimensions(), (1, 1));
    }

    #[test]
    fn test_mismatched_rasters_rejected() {
        let err = build_texture_triple(
            Seed(1),
            &scenario_layers(),
            Raster::new(4, 4),
            Raster::new(4, 4),
            Raster::new(2, 2),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, BuildError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_missing_source_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut request = TextureBuildRequest::new(Seed(1), scenario_layers(), 16);
        request.source = NormalSource::File(dir.path().join("missing.png"));
        let err = build_textures(&request).unwrap_err();
        assert!(matches!(err, BuildError::SourceLoad { .. }));
    }

    #[test]
    fn test_file_source_is_rescaled() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("normals.png");
        render_object_space_normals(64).save_png(&path).unwrap();
        let raster = NormalSource::File(path).load(128).unwrap();
        assert_eq!(raster.dimensions(), (128, 128));
    }

    #[test]
    fn test_minibump_pinned_seed_is_reproducible() {
        // 1001×1001 crosses the minibump threshold.
        let mut source = Raster::filled(1001, 1001, [0, 0, 0, 255]);
        for x in 0..1001 {
            source.set_pixel(x, 500, [120, 80, 200, 255]);
        }
        let run = |seed| {
            build_texture_triple(
                Seed(4),
                &scenario_layers(),
                source.clone(),
                Raster::filled(1001, 1001, BACKGROUND),
                Raster::filled(1001, 1001, BACKGROUND),
                Some(seed),
            )
            .unwrap()
        };
        assert_eq!(run(11).height, run(11).height);
    }
}
