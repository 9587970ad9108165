//! The six root faces of the cube-sphere and their planar bases.

use std::fmt;

use glam::DVec3;

/// One of the six faces of the cube that is inflated into the terrain sphere.
///
/// A face is parameterised by `(u, v)` in `[0, 1]`; the cube-space point is
/// `normal + (2u - 1) * tangent + (2v - 1) * bitangent`, so `tangent x bitangent`
/// always points outward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum CubeFace {
    /// +X face
    PosX = 0,
    /// -X face
    NegX = 1,
    /// +Y face
    PosY = 2,
    /// -Y face
    NegY = 3,
    /// +Z face
    PosZ = 4,
    /// -Z face
    NegZ = 5,
}

impl CubeFace {
    /// All six faces in root order.
    pub const ALL: [CubeFace; 6] = [
        CubeFace::PosX,
        CubeFace::NegX,
        CubeFace::PosY,
        CubeFace::NegY,
        CubeFace::PosZ,
        CubeFace::NegZ,
    ];

    /// Position of this face in [`CubeFace::ALL`].
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    /// The face on the other side of the cube.
    #[must_use]
    pub fn opposite(self) -> CubeFace {
        match self {
            CubeFace::PosX => CubeFace::NegX,
            CubeFace::NegX => CubeFace::PosX,
            CubeFace::PosY => CubeFace::NegY,
            CubeFace::NegY => CubeFace::PosY,
            CubeFace::PosZ => CubeFace::NegZ,
            CubeFace::NegZ => CubeFace::PosZ,
        }
    }

    /// Outward unit normal.
    #[must_use]
    pub fn normal(self) -> DVec3 {
        match self {
            CubeFace::PosX => DVec3::X,
            CubeFace::NegX => DVec3::NEG_X,
            CubeFace::PosY => DVec3::Y,
            CubeFace::NegY => DVec3::NEG_Y,
            CubeFace::PosZ => DVec3::Z,
            CubeFace::NegZ => DVec3::NEG_Z,
        }
    }

    /// Direction of increasing `u`.
    #[must_use]
    pub fn tangent(self) -> DVec3 {
        match self {
            CubeFace::PosX => DVec3::NEG_Z,
            CubeFace::NegX => DVec3::Z,
            CubeFace::PosY => DVec3::X,
            CubeFace::NegY => DVec3::X,
            CubeFace::PosZ => DVec3::X,
            CubeFace::NegZ => DVec3::NEG_X,
        }
    }

    /// Direction of increasing `v`.
    #[must_use]
    pub fn bitangent(self) -> DVec3 {
        match self {
            CubeFace::PosX => DVec3::Y,
            CubeFace::NegX => DVec3::Y,
            CubeFace::PosY => DVec3::NEG_Z,
            CubeFace::NegY => DVec3::Z,
            CubeFace::PosZ => DVec3::Y,
            CubeFace::NegZ => DVec3::Y,
        }
    }

    /// The face whose outward normal is closest to `direction`.
    ///
    /// Ties are broken in X, Y, Z order. A zero vector maps to `PosX`.
    #[must_use]
    pub fn from_direction(direction: DVec3) -> CubeFace {
        let a = direction.abs();
        if a.x >= a.y && a.x >= a.z {
            if direction.x >= 0.0 { CubeFace::PosX } else { CubeFace::NegX }
        } else if a.y >= a.z {
            if direction.y >= 0.0 { CubeFace::PosY } else { CubeFace::NegY }
        } else if direction.z >= 0.0 {
            CubeFace::PosZ
        } else {
            CubeFace::NegZ
        }
    }
}

impl fmt::Display for CubeFace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CubeFace::PosX => "+X",
            CubeFace::NegX => "-X",
            CubeFace::PosY => "+Y",
            CubeFace::NegY => "-Y",
            CubeFace::PosZ => "+Z",
            CubeFace::NegZ => "-Z",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_matches_root_order() {
        for (i, face) in CubeFace::ALL.iter().enumerate() {
            assert_eq!(face.index(), i);
        }
    }

    #[test]
    fn test_basis_is_right_handed_and_outward() {
        for face in CubeFace::ALL {
            let cross = face.tangent().cross(face.bitangent());
            assert!(
                (cross - face.normal()).length() < 1e-12,
                "tangent x bitangent should equal the normal for {face}"
            );
            assert!(face.tangent().dot(face.normal()).abs() < 1e-12);
            assert!(face.bitangent().dot(face.normal()).abs() < 1e-12);
        }
    }

    #[test]
    fn test_opposite_normals_cancel() {
        for face in CubeFace::ALL {
            assert_eq!(face.opposite().opposite(), face);
            assert!((face.normal() + face.opposite().normal()).length() < 1e-12);
        }
    }

    #[test]
    fn test_from_direction_picks_dominant_axis() {
        for face in CubeFace::ALL {
            assert_eq!(CubeFace::from_direction(face.normal() * 3.0), face);
        }
        assert_eq!(
            CubeFace::from_direction(DVec3::new(0.2, -0.9, 0.3)),
            CubeFace::NegY
        );
    }
}
