//! Seeded color gradients for elevation-to-diffuse lookup.
//!
//! A seed selects one hand-authored palette; its colors become evenly spaced
//! gradient stops whose alpha channel encodes the position in `[0, 255]`.
//! [`GradientRamp`] renders the stops into the 256-entry strip the raster
//! builder indexes by elevation.

use crate::noise_engine::NoiseEngine;
use crate::seed::Seed;

/// Palette table, each palette ordered from sea floor to peaks.
pub const PALETTES: &[&[[u8; 3]]] = &[
    &[[18, 52, 86], [214, 196, 140], [92, 128, 56], [108, 94, 78], [240, 240, 244]],
    &[[12, 40, 72], [198, 180, 120], [64, 112, 48], [40, 80, 36], [132, 120, 104]],
    &[[30, 70, 110], [230, 210, 160], [150, 160, 80], [120, 100, 70], [250, 250, 250]],
    &[[60, 20, 10], [140, 60, 30], [190, 100, 50], [220, 150, 90], [255, 220, 180]],
    &[[20, 30, 60], [70, 90, 120], [120, 140, 160], [190, 200, 210], [245, 248, 255]],
    &[[40, 10, 60], [90, 40, 110], [150, 80, 140], [210, 140, 170], [250, 210, 220]],
    &[[10, 60, 60], [40, 120, 100], [110, 170, 90], [200, 200, 110], [240, 230, 190]],
    &[[25, 25, 30], [70, 60, 55], [120, 100, 80], [170, 150, 120], [220, 210, 190]],
    &[[0, 80, 120], [240, 220, 150], [170, 120, 60], [130, 70, 40], [90, 40, 30]],
    &[[5, 30, 50], [30, 90, 70], [80, 140, 60], [160, 170, 90], [210, 190, 150]],
    &[[70, 30, 20], [160, 80, 40], [200, 130, 60], [170, 110, 70], [110, 80, 60]],
    &[[15, 45, 95], [60, 130, 160], [200, 220, 200], [120, 160, 90], [60, 90, 50]],
];

/// Sample point used to pick a palette from the seeded noise. Kept off the
/// integer lattice, where OpenSimplex stays close to zero for every seed.
const SELECTOR_POINT: [f64; 3] = [23.37, 23.71, 23.13];

/// Stretches the selector sample over `[-1, 1]`; a single OpenSimplex
/// sample rarely leaves `[-0.5, 0.5]`.
const SELECTOR_GAIN: f64 = 2.5;

/// One gradient stop: a color plus its position in the alpha channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    /// Gradient position in `[0, 255]`.
    pub a: u8,
}

/// An ordered color ramp: stops sorted by ascending position.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColorGradient {
    stops: Vec<Rgba>,
}

impl ColorGradient {
    /// Generate the gradient for `seed`.
    pub fn generate(seed: Seed) -> Self {
        let noise = NoiseEngine::new(seed);
        Self::from_palette(PALETTES[palette_index(&noise, PALETTES.len())])
    }

    /// Build evenly spaced stops from a palette: stop `i` of `n` sits at
    /// `round(i * 255 / n)`.
    pub fn from_palette(palette: &[[u8; 3]]) -> Self {
        let n = palette.len().max(1) as f64;
        let mut stops: Vec<Rgba> = palette
            .iter()
            .enumerate()
            .map(|(i, &[r, g, b])| Rgba {
                r,
                g,
                b,
                a: (i as f64 * 255.0 / n).round().min(255.0) as u8,
            })
            .collect();
        stops.sort_by_key(|stop| stop.a);
        Self { stops }
    }

    /// The sorted stops.
    pub fn stops(&self) -> &[Rgba] {
        &self.stops
    }
}

/// Select a palette: `len/2 + round(n * len/2)`, clamped to the table, where
/// `n` is the rescaled selector sample.
fn palette_index(noise: &NoiseEngine, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let [x, y, z] = SELECTOR_POINT;
    let n = (noise.sample3d(x, y, z) * SELECTOR_GAIN).clamp(-1.0, 1.0);
    let half = len as f64 * 0.5;
    let index = (len / 2) as f64 + (n * half).round();
    index.clamp(0.0, (len - 1) as f64) as usize
}

/// A gradient pre-rendered into 256 RGBA entries, indexed by elevation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GradientRamp {
    entries: Box<[[u8; 4]; 256]>,
}

impl GradientRamp {
    /// Linearly interpolate the stops across `[0, 255]`.
    ///
    /// Positions before the first stop take its color, positions after the
    /// last stop take the last color. An empty gradient renders opaque black.
    pub fn from_gradient(gradient: &ColorGradient) -> Self {
        let mut entries = Box::new([[0, 0, 0, 255]; 256]);
        let stops = gradient.stops();
        let (Some(first), Some(last)) = (stops.first(), stops.last()) else {
            return Self { entries };
        };

        for (position, entry) in entries.iter_mut().enumerate() {
            let position = position as u8;
            let color = if position <= first.a {
                [first.r, first.g, first.b]
            } else if position >= last.a {
                [last.r, last.g, last.b]
            } else {
                let upper = stops
                    .iter()
                    .position(|stop| stop.a >= position)
                    .unwrap_or(stops.len() - 1);
                let lo = stops[upper.saturating_sub(1)];
                let hi = stops[upper];
                let span = (hi.a - lo.a).max(1) as f32;
                let t = (position - lo.a) as f32 / span;
                [lerp(lo.r, hi.r, t), lerp(lo.g, hi.g, t), lerp(lo.b, hi.b, t)]
            };
            *entry = [color[0], color[1], color[2], 255];
        }

        Self { entries }
    }

    /// Color for an elevation value.
    #[inline]
    pub fn lookup(&self, value: u8) -> [u8; 4] {
        self.entries[value as usize]
    }

    /// Render the ramp as a 256×1 raster strip.
    pub fn to_strip(&self) -> crate::Raster {
        let mut strip = crate::Raster::new(256, 1);
        for (x, entry) in self.entries.iter().enumerate() {
            strip.set_pixel(x as u32, 0, *entry);
        }
        strip
    }
}

fn lerp(a: u8, b: u8, t: f32) -> u8 {
    (a as f32 + (b as f32 - a as f32) * t).round().clamp(0.0, 255.0) as u8
}
