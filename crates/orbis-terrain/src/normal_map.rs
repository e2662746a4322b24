//! Bump map synthesis by image convolution.
//!
//! Two Sobel passes over the height raster accumulate into one destination:
//! the horizontal gradient into red, the vertical gradient into green. Blue
//! keeps the flat-normal value of the neutral fill.

use thiserror::Error;

use crate::raster::Raster;

/// Horizontal gradient kernel, written into the red channel.
pub const SOBEL_HORIZONTAL: [f64; 9] = [-1.0, 0.0, 1.0, -2.0, 0.0, 2.0, -1.0, 0.0, 1.0];

/// Vertical gradient kernel, written into the green channel.
pub const SOBEL_VERTICAL: [f64; 9] = [1.0, 2.0, 1.0, 0.0, 0.0, 0.0, -1.0, -2.0, -1.0];

/// Tangent-space "straight up" normal.
pub const NEUTRAL_NORMAL: [u8; 4] = [128, 128, 255, 255];

/// Empirical intensity correction applied to every weighted sum.
const INTENSITY_DIVISOR: f64 = 3.0;

/// Errors returned by [`convolute`] and [`build_bump_map`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConvolutionError {
    /// Source and destination rasters differ in size.
    #[error("source is {source_size:?} but destination is {destination_size:?}")]
    DimensionMismatch {
        source_size: (u32, u32),
        destination_size: (u32, u32),
    },
    /// The kernel length is not a perfect square.
    #[error("kernel of length {0} is not square")]
    NonSquareKernel(usize),
}

/// Destination channels a convolution pass adds into.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Channels {
    pub red: bool,
    pub green: bool,
    pub blue: bool,
}

impl Channels {
    pub const RED: Self = Self {
        red: true,
        green: false,
        blue: false,
    };
    pub const GREEN: Self = Self {
        red: false,
        green: true,
        blue: false,
    };
    pub const RGB: Self = Self {
        red: true,
        green: true,
        blue: true,
    };
}

/// A bump map plus the intensity the consuming material applies it with.
#[derive(Clone, Debug, PartialEq)]
pub struct BumpMap {
    pub raster: Raster,
    pub level: f32,
}

/// Convolve `src` with a square kernel and add the result into `dst`.
///
/// Neighbours outside the raster are omitted rather than wrapped. Each
/// weighted sum is divided by 3 and added into the selected channels of
/// `dst`, so passes writing disjoint channels compose in any order. Alpha is
/// `a + opaque * (255 - a)` where `a` is the weighted alpha sum.
pub fn convolute(
    src: &Raster,
    dst: &mut Raster,
    kernel: &[f64],
    opaque: bool,
    channels: Channels,
) -> Result<(), ConvolutionError> {
    if src.dimensions() != dst.dimensions() {
        return Err(ConvolutionError::DimensionMismatch {
            source_size: src.dimensions(),
            destination_size: dst.dimensions(),
        });
    }
    let side = (kernel.len() as f64).sqrt().round() as usize;
    if side == 0 || side * side != kernel.len() {
        return Err(ConvolutionError::NonSquareKernel(kernel.len()));
    }

    let half = (side / 2) as i64;
    let (w, h) = (src.width as i64, src.height as i64);
    let alpha_factor = if opaque { 1.0 } else { 0.0 };

    for y in 0..h {
        for x in 0..w {
            let mut sum = [0.0f64; 4];
            for ky in 0..side as i64 {
                let sy = y + ky - half;
                if sy < 0 || sy >= h {
                    continue;
                }
                for kx in 0..side as i64 {
                    let sx = x + kx - half;
                    if sx < 0 || sx >= w {
                        continue;
                    }
                    let weight = kernel[(ky * side as i64 + kx) as usize];
                    let texel = src.pixel(sx as u32, sy as u32);
                    for (acc, value) in sum.iter_mut().zip(texel) {
                        *acc += value as f64 * weight;
                    }
                }
            }

            let off = dst.offset(x as u32, y as u32);
            let px = &mut dst.pixels[off..off + 4];
            if channels.red {
                px[0] = add_clamped(px[0], sum[0] / INTENSITY_DIVISOR);
            }
            if channels.green {
                px[1] = add_clamped(px[1], sum[1] / INTENSITY_DIVISOR);
            }
            if channels.blue {
                px[2] = add_clamped(px[2], sum[2] / INTENSITY_DIVISOR);
            }
            px[3] = to_channel(sum[3] + alpha_factor * (255.0 - sum[3]));
        }
    }

    Ok(())
}

/// Derive a tangent-space bump map from a height raster.
///
/// The destination starts neutral, or as `previous` rescaled to the new
/// resolution so a tier upgrade does not pop.
pub fn build_bump_map(
    height: &Raster,
    previous: Option<&Raster>,
    level: f32,
) -> Result<BumpMap, ConvolutionError> {
    let (w, h) = height.dimensions();
    let mut raster = match previous {
        Some(prev) => prev.resized_nearest(w, h),
        None => Raster::filled(w, h, NEUTRAL_NORMAL),
    };
    convolute(height, &mut raster, &SOBEL_HORIZONTAL, true, Channels::RED)?;
    convolute(height, &mut raster, &SOBEL_VERTICAL, true, Channels::GREEN)?;
    Ok(BumpMap { raster, level })
}

#[inline]
fn add_clamped(current: u8, delta: f64) -> u8 {
    to_channel(current as f64 + delta)
}

#[inline]
fn to_channel(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.round_ties_even().clamp(0.0, 255.0) as u8
}
