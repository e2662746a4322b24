//! Procedural planet texture synthesis: seeded noise, layered elevation,
//! gradient-mapped diffuse, Sobel bump maps, and background tier builds.

mod async_generation;
mod cube_face;
mod gradient;
mod heightmap;
mod noise_engine;
mod normal_map;
mod raster;
mod seed;
mod sphere_normals;
mod texture;

pub use async_generation::{BuildHandle, TextureBuildWorker};
pub use cube_face::CubeFace;
pub use gradient::{ColorGradient, GradientRamp, PALETTES, Rgba};
pub use heightmap::{
    HeightSynthesizer, NoiseLayer, OCEAN_LEVEL, default_noise_layers, is_ocean,
    normalize_elevation,
};
pub use noise_engine::NoiseEngine;
pub use normal_map::{
    BumpMap, Channels, ConvolutionError, NEUTRAL_NORMAL, SOBEL_HORIZONTAL, SOBEL_VERTICAL,
    build_bump_map, convolute,
};
pub use raster::Raster;
pub use seed::Seed;
pub use sphere_normals::{
    UNMAPPED, decode_direction, encode_direction, is_unmapped, render_object_space_normals,
};
pub use texture::{
    BACKGROUND, BuildError, BuiltTextures, MINIBUMP_MAX, MINIBUMP_PIXEL_THRESHOLD, NormalSource,
    OCEAN_SPECULAR, TextureBuildRequest, TextureTriple, build_texture_triple, build_textures,
};
