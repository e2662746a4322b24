//! The six cube faces and their placement in a 4×3 cube-cross texture.

use glam::DVec3;

/// The six faces of the cube that is spherized into the planet mesh,
/// listed in cube-cross order: the four equator tiles left to right, then
/// the top and bottom caps.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CubeFace {
    NegX,
    PosZ,
    PosX,
    NegZ,
    PosY,
    NegY,
}

/// Orthonormal frame of one face: outward normal, texture-right, texture-up.
#[derive(Clone, Copy, Debug)]
struct Frame {
    normal: DVec3,
    tangent: DVec3,
    bitangent: DVec3,
}

const FRAMES: [Frame; 6] = [
    // -X
    Frame {
        normal: DVec3::NEG_X,
        tangent: DVec3::Z,
        bitangent: DVec3::Y,
    },
    // +Z
    Frame {
        normal: DVec3::Z,
        tangent: DVec3::X,
        bitangent: DVec3::Y,
    },
    // +X
    Frame {
        normal: DVec3::X,
        tangent: DVec3::NEG_Z,
        bitangent: DVec3::Y,
    },
    // -Z
    Frame {
        normal: DVec3::NEG_Z,
        tangent: DVec3::NEG_X,
        bitangent: DVec3::Y,
    },
    // +Y, above +Z
    Frame {
        normal: DVec3::Y,
        tangent: DVec3::X,
        bitangent: DVec3::NEG_Z,
    },
    // -Y, below +Z
    Frame {
        normal: DVec3::NEG_Y,
        tangent: DVec3::X,
        bitangent: DVec3::Z,
    },
];

impl CubeFace {
    pub const ALL: [CubeFace; 6] = [
        CubeFace::NegX,
        CubeFace::PosZ,
        CubeFace::PosX,
        CubeFace::NegZ,
        CubeFace::PosY,
        CubeFace::NegY,
    ];

    fn frame(self) -> &'static Frame {
        &FRAMES[self as usize]
    }

    /// `(column, row)` of this face's tile in the 4×3 cube cross.
    pub fn cross_tile(self) -> (u32, u32) {
        match self {
            CubeFace::PosY => (1, 0),
            CubeFace::NegY => (1, 2),
            equator => (equator as u32, 1),
        }
    }

    /// Unit-sphere direction for face coordinates `u, v` in `[-1, 1]`.
    pub fn sphere_direction(self, u: f64, v: f64) -> DVec3 {
        let frame = self.frame();
        (frame.normal + frame.tangent * u + frame.bitangent * v).normalize()
    }
}
