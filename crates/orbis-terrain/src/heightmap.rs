//! Layered noise elevation synthesis.
//!
//! Each layer composites several passes of simplex noise, doubling the
//! sampling frequency and decaying the amplitude per pass. "Hard" layers fold
//! the noise into ridges (`1 - 4|n|`, cubed) for mountain chains; soft layers
//! add plain noise. All layers accumulate into one scalar per sample, which
//! is then normalized into an 8-bit elevation.

use serde::{Deserialize, Serialize};

use crate::noise_engine::NoiseEngine;
use crate::seed::Seed;

/// Elevations at or below this value are ocean.
pub const OCEAN_LEVEL: u8 = 1;

/// Configuration for one noise layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseLayer {
    /// Offset added to the first noise coordinate, decorrelating layers
    /// that share a seed.
    pub shift: f64,
    /// Number of noise passes (octaves) composited by this layer.
    pub passes: u32,
    /// Amplitude of the first pass.
    pub strength: f64,
    /// Frequency of the first pass, in percent of a raw channel unit.
    /// Doubles every pass.
    pub roughness: f64,
    /// Amplitude multiplier between successive passes.
    pub resistance: f64,
    /// Elevation floor as a fraction of 255. Only the first layer's floor
    /// is used.
    pub min: f64,
    /// Ridged (`true`) or plain additive (`false`) noise.
    pub hard: bool,
}

impl Default for NoiseLayer {
    fn default() -> Self {
        Self {
            shift: 0.0,
            passes: 10,
            strength: 0.8,
            roughness: 0.6,
            resistance: 0.7,
            min: 0.5,
            hard: false,
        }
    }
}

/// Layer stack used when no settings are configured: soft continents with
/// a ridged mountain layer on top.
pub fn default_noise_layers() -> Vec<NoiseLayer> {
    vec![
        NoiseLayer::default(),
        NoiseLayer {
            shift: 5.0,
            passes: 14,
            strength: 0.65,
            roughness: 0.2,
            resistance: 0.6,
            min: 0.3,
            hard: true,
        },
    ]
}

/// Converts encoded sphere normals into 8-bit elevations.
pub struct HeightSynthesizer {
    noise: NoiseEngine,
    layers: Vec<NoiseLayer>,
}

impl HeightSynthesizer {
    /// Create a synthesizer for the given seed and ordered layers.
    pub fn new(seed: Seed, layers: Vec<NoiseLayer>) -> Self {
        Self {
            noise: NoiseEngine::new(seed),
            layers,
        }
    }

    /// Accumulate every layer at a raw sample position (channel units).
    pub fn raw_value(&self, r: f64, g: f64, b: f64) -> f64 {
        let mut value = 0.0;
        for layer in &self.layers {
            let mut roughness = layer.roughness / 100.0;
            let mut strength = layer.strength;
            for _ in 0..layer.passes {
                let n = self.noise.sample3d(
                    layer.shift + r * roughness,
                    g * roughness,
                    b * roughness,
                );
                value += if layer.hard {
                    let ridge = 1.0 - 4.0 * n.abs();
                    ridge * ridge * ridge * strength
                } else {
                    n * strength
                };
                roughness *= 2.0;
                strength *= layer.resistance;
            }
        }
        value
    }

    /// Normalized elevation in `[0, 255]` for a raw sample position.
    pub fn elevation(&self, r: f64, g: f64, b: f64) -> u8 {
        let floor_fraction = self.layers.first().map_or(0.0, |layer| layer.min);
        normalize_elevation(self.raw_value(r, g, b), floor_fraction)
    }
}

/// Map an accumulated noise value to `[0, 255]`.
///
/// The value is shifted into `[0, 255]`, raised to the floor `255 * min`,
/// and the remaining `[floor, 255]` band is stretched back over `[0, 255]`.
/// An empty band collapses to 0 instead of dividing by zero.
pub fn normalize_elevation(value: f64, floor_fraction: f64) -> u8 {
    let floor = 255.0 * floor_fraction;
    let band = 255.0 - floor;
    if !value.is_finite() || !band.is_finite() || band <= 0.0 {
        return 0;
    }
    let lifted = (value * 128.0 + 128.0).max(floor);
    let stretched = ((lifted - floor) / band * 255.0).round();
    stretched.clamp(0.0, 255.0) as u8
}

/// Returns `true` when an elevation is treated as ocean.
#[inline]
pub fn is_ocean(elevation: u8) -> bool {
    elevation <= OCEAN_LEVEL
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario_layer() -> NoiseLayer {
        NoiseLayer {
            shift: 5.0,
            passes: 14,
            strength: 0.65,
            roughness: 0.2,
            resistance: 0.6,
            min: 0.3,
            hard: true,
        }
    }

    #[test]
    fn test_determinism_same_seed_same_sample() {
        let a = HeightSynthesizer::new(Seed(27), vec![scenario_layer()]);
        let b = HeightSynthesizer::new(Seed(27), vec![scenario_layer()]);
        for i in 0..200 {
            let c = (i * 3 % 256) as f64;
            assert_eq!(
                a.elevation(c, 255.0 - c, 128.0),
                b.elevation(c, 255.0 - c, 128.0)
            );
        }
    }

    #[test]
    fn test_zero_layers_is_flat() {
        let synth = HeightSynthesizer::new(Seed(1), Vec::new());
        for i in 0..50 {
            let c = (i * 5) as f64;
            assert_eq!(synth.elevation(c, c, c), 128, "Zero layers must be flat");
        }
    }

    #[test]
    fn test_zero_passes_is_flat() {
        let layer = NoiseLayer {
            passes: 0,
            min: 0.0,
            ..NoiseLayer::default()
        };
        let synth = HeightSynthesizer::new(Seed(1), vec![layer]);
        assert_eq!(synth.elevation(10.0, 200.0, 30.0), 128);
    }

    #[test]
    fn test_soft_layer_matches_single_pass_formula() {
        let layer = NoiseLayer {
            shift: 2.0,
            passes: 1,
            strength: 0.5,
            roughness: 1.0,
            resistance: 0.5,
            min: 0.0,
            hard: false,
        };
        let synth = HeightSynthesizer::new(Seed(9), vec![layer]);
        let engine = NoiseEngine::new(Seed(9));
        let expected = engine.sample3d(2.0 + 100.0 * 0.01, 50.0 * 0.01, 25.0 * 0.01) * 0.5;
        assert_eq!(synth.raw_value(100.0, 50.0, 25.0), expected);
    }

    #[test]
    fn test_hard_layer_is_ridged_cube() {
        let layer = NoiseLayer {
            shift: 0.0,
            passes: 1,
            strength: 1.0,
            roughness: 1.0,
            resistance: 1.0,
            min: 0.0,
            hard: true,
        };
        let synth = HeightSynthesizer::new(Seed(3), vec![layer]);
        let engine = NoiseEngine::new(Seed(3));
        let n = engine.sample3d(0.4, 0.8, 1.2);
        let ridge = 1.0 - 4.0 * n.abs();
        let expected = ridge * ridge * ridge;
        assert!((synth.raw_value(40.0, 80.0, 120.0) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_normalize_floor_maps_to_zero() {
        // Anything at or below the floor collapses to 0.
        assert_eq!(normalize_elevation(-1.0, 0.5), 0);
        assert_eq!(normalize_elevation(-0.01, 0.5), 0);
        // Maximum noise reaches 255.
        assert_eq!(normalize_elevation(1.0, 0.5), 255);
        assert_eq!(normalize_elevation(5.0, 0.3), 255);
    }

    #[test]
    fn test_normalize_without_floor_is_affine() {
        assert_eq!(normalize_elevation(0.0, 0.0), 128);
        assert_eq!(normalize_elevation(-1.0, 0.0), 0);
    }

    #[test]
    fn test_degenerate_floor_is_flat_ocean() {
        assert_eq!(normalize_elevation(0.7, 1.0), 0);
        assert_eq!(normalize_elevation(0.7, 2.0), 0);
        assert_eq!(normalize_elevation(f64::NAN, 0.3), 0);
    }

    #[test]
    fn test_ocean_threshold() {
        assert!(is_ocean(0));
        assert!(is_ocean(1));
        assert!(!is_ocean(2));
    }

    #[test]
    fn test_layer_settings_ron_roundtrip() {
        let layers = default_noise_layers();
        let text = ron::to_string(&layers).unwrap();
        let back: Vec<NoiseLayer> = ron::from_str(&text).unwrap();
        assert_eq!(layers, back);
    }

    #[test]
    fn test_missing_layer_fields_use_defaults() {
        let layer: NoiseLayer = ron::from_str("(hard: true)").unwrap();
        assert!(layer.hard);
        assert_eq!(layer.passes, NoiseLayer::default().passes);
    }
}
