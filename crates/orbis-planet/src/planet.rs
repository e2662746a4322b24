//! A planet: a mesh descriptor, its progressive material, and a transform.

use glam::{Mat4, Quat, Vec3};
use orbis_terrain::TextureBuildWorker;

use crate::device::DeviceTier;
use crate::material::{MaterialConsumer, MaterialSettings, PlanetMaterial, TickReport};

/// Fewest subdivisions a planet mesh is built with.
pub const MIN_SUBDIVISIONS: u32 = 3;

/// Most subdivisions a planet mesh is built with.
pub const MAX_SUBDIVISIONS: u32 = 256;

/// Describes the sphere mesh the host should build; construction happens
/// outside this crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MeshHandle {
    subdivisions: u32,
}

impl MeshHandle {
    /// Clamps `subdivisions` to `3..=256`.
    pub fn new(subdivisions: u32) -> Self {
        Self {
            subdivisions: subdivisions.clamp(MIN_SUBDIVISIONS, MAX_SUBDIVISIONS),
        }
    }

    pub fn subdivisions(&self) -> u32 {
        self.subdivisions
    }
}

/// Position, orientation, and size in the host's scene.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    /// Unit quaternion.
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Model matrix: scale, then rotate, then translate.
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

/// Anything placed in the scene by a [`Transform`].
pub trait Transformable {
    fn transform(&self) -> &Transform;

    fn transform_mut(&mut self) -> &mut Transform;

    fn translate(&mut self, offset: Vec3) {
        self.transform_mut().translation += offset;
    }

    /// Apply `rotation` on top of the current orientation.
    fn rotate(&mut self, rotation: Quat) {
        let transform = self.transform_mut();
        transform.rotation = (rotation * transform.rotation).normalize();
    }

    fn set_scale(&mut self, scale: Vec3) {
        self.transform_mut().scale = scale;
    }
}

/// A procedurally textured planet.
///
/// The worker and device tier are handed in by the host; nothing here
/// reaches for global state.
#[derive(Debug)]
pub struct Planet {
    name: String,
    mesh: MeshHandle,
    material: PlanetMaterial,
    transform: Transform,
}

impl Planet {
    pub fn new(
        name: impl Into<String>,
        subdivisions: u32,
        settings: MaterialSettings,
        device: DeviceTier,
        worker: TextureBuildWorker,
    ) -> Self {
        let name = name.into();
        let material = PlanetMaterial::new(format!("{name}-material"), settings, device, worker);
        Self {
            name,
            mesh: MeshHandle::new(subdivisions),
            material,
            transform: Transform::default(),
        }
    }

    /// Build the material with a custom tier ladder instead of the device's.
    pub fn with_resolution_tiers(mut self, tiers: impl IntoIterator<Item = u32>) -> Self {
        self.material = self.material.with_resolution_tiers(tiers);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mesh(&self) -> MeshHandle {
        self.mesh
    }

    /// Change the mesh density hint. Textures are unaffected.
    pub fn set_subdivisions(&mut self, subdivisions: u32) {
        self.mesh = MeshHandle::new(subdivisions);
    }

    pub fn material(&self) -> &PlanetMaterial {
        &self.material
    }

    pub fn material_mut(&mut self) -> &mut PlanetMaterial {
        &mut self.material
    }

    /// Advance the material's tier sequence.
    pub fn tick<C: MaterialConsumer + ?Sized>(&mut self, consumer: &mut C) -> TickReport {
        self.material.tick(consumer)
    }

    /// Tear down, releasing every texture set through `consumer`.
    pub fn dispose<C: MaterialConsumer + ?Sized>(self, consumer: &mut C) {
        self.material.dispose(consumer);
    }
}

impl Transformable for Planet {
    fn transform(&self) -> &Transform {
        &self.transform
    }

    fn transform_mut(&mut self) -> &mut Transform {
        &mut self.transform
    }
}
