//! Object-space normal source rasters.
//!
//! The texture builder samples noise at unit-sphere directions encoded as
//! texel colors. This module bakes that encoding for the cube-cross UV layout
//! used by the planet mesh: every texel inside a face tile stores the
//! direction of its cube point, `(n * 0.5 + 0.5) * 255`, and every texel
//! outside the tiles stays black so the builder skips it.

use glam::DVec3;

use crate::cube_face::CubeFace;
use crate::raster::Raster;

/// Background for texels not covered by any face.
pub const UNMAPPED: [u8; 4] = [0, 0, 0, 255];

/// Render the object-space normal source at `resolution × resolution`.
pub fn render_object_space_normals(resolution: u32) -> Raster {
    let mut raster = Raster::filled(resolution, resolution, UNMAPPED);
    let tile_w = resolution / 4;
    let tile_h = resolution / 3;
    if tile_w == 0 || tile_h == 0 {
        return raster;
    }

    for face in CubeFace::ALL {
        let (col, row) = face.cross_tile();
        let origin_x = col * tile_w;
        let origin_y = row * tile_h;
        for ty in 0..tile_h {
            let v = 1.0 - 2.0 * (ty as f64 + 0.5) / tile_h as f64;
            for tx in 0..tile_w {
                let u = 2.0 * (tx as f64 + 0.5) / tile_w as f64 - 1.0;
                let color = encode_direction(face.sphere_direction(u, v));
                raster.set_pixel(origin_x + tx, origin_y + ty, color);
            }
        }
    }

    raster
}

/// Encode a unit direction as an opaque RGB texel.
pub fn encode_direction(direction: DVec3) -> [u8; 4] {
    let c = direction * 0.5 + DVec3::splat(0.5);
    [
        channel(c.x),
        channel(c.y),
        channel(c.z),
        255,
    ]
}

/// Decode a texel back into an (approximately unit) direction.
pub fn decode_direction(texel: [u8; 4]) -> DVec3 {
    DVec3::new(
        texel[0] as f64 / 255.0 * 2.0 - 1.0,
        texel[1] as f64 / 255.0 * 2.0 - 1.0,
        texel[2] as f64 / 255.0 * 2.0 - 1.0,
    )
}

/// Returns `true` when a texel lies outside every mapped face.
#[inline]
pub fn is_unmapped(texel: [u8; 4]) -> bool {
    texel[0] == 0 && texel[1] == 0 && texel[2] == 0
}

fn channel(v: f64) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}
