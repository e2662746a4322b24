//! Device capability hints that pick texture sizes and sampler quality.

/// First tier of every progressive sequence.
pub const PREVIEW_RESOLUTION: u32 = 256;

/// Second tier, and the ceiling on mobile devices.
pub const MOBILE_RESOLUTION: u32 = 512;

/// Ceiling for ordinary desktop devices.
pub const DEFAULT_RESOLUTION: u32 = 1024;

/// Ceiling for devices with a capable discrete GPU.
pub const CAPABLE_RESOLUTION: u32 = 2048;

/// What the host knows about the rendering device.
///
/// Hardware detection is the host's job; this only carries the answer.
/// `mobile` wins when both flags are set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DeviceTier {
    pub capable_gpu: bool,
    pub mobile: bool,
}

impl DeviceTier {
    pub fn new(capable_gpu: bool, mobile: bool) -> Self {
        Self {
            capable_gpu,
            mobile,
        }
    }

    /// Largest texture edge this device should receive.
    pub fn max_resolution(&self) -> u32 {
        if self.mobile {
            MOBILE_RESOLUTION
        } else if self.capable_gpu {
            CAPABLE_RESOLUTION
        } else {
            DEFAULT_RESOLUTION
        }
    }

    /// Resolutions built in order, smallest first, without repeats.
    pub fn resolution_tiers(&self) -> Vec<u32> {
        let mut tiers = vec![PREVIEW_RESOLUTION, MOBILE_RESOLUTION, self.max_resolution()];
        tiers.dedup();
        tiers
    }

    /// Anisotropic filtering level for the diffuse sampler.
    pub fn anisotropic_level(&self) -> u8 {
        if self.mobile {
            4
        } else if self.capable_gpu {
            16
        } else {
            8
        }
    }

    pub fn antialiasing(&self) -> bool {
        !self.mobile
    }
}
