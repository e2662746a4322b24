//! Planet composition and progressive texture scheduling.
//!
//! [`PlanetMaterial`] owns the live texture set of one planet and refines it
//! tier by tier on background threads, releasing replaced sets through a
//! tick-driven [`ReleaseQueue`]. [`Planet`] bundles the material with a mesh
//! descriptor and a scene transform.

mod device;
mod material;
mod planet;
mod release;

pub use device::{
    CAPABLE_RESOLUTION, DEFAULT_RESOLUTION, DeviceTier, MOBILE_RESOLUTION, PREVIEW_RESOLUTION,
};
pub use material::{
    MaterialConsumer, MaterialSettings, MaterialState, PlanetMaterial, TextureSet, TickReport,
};
pub use planet::{MAX_SUBDIVISIONS, MIN_SUBDIVISIONS, MeshHandle, Planet, Transform, Transformable};
pub use release::ReleaseQueue;
