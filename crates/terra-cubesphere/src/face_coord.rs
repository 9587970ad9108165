//! Parametric `(u, v)` position on a single cube face.

use crate::CubeFace;

/// A point on a cube face. `u` and `v` are in `[0, 1]`, `(0, 0)` being the
/// bottom-left corner when the face is viewed from outside the cube.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FaceCoord {
    /// Which cube face this coordinate lies on.
    pub face: CubeFace,
    /// Horizontal parameter in `[0, 1]`.
    pub u: f64,
    /// Vertical parameter in `[0, 1]`.
    pub v: f64,
}

impl FaceCoord {
    /// Construct a `FaceCoord`, clamping `u` and `v` into `[0, 1]`.
    #[must_use]
    pub fn new(face: CubeFace, u: f64, v: f64) -> Self {
        Self {
            face,
            u: u.clamp(0.0, 1.0),
            v: v.clamp(0.0, 1.0),
        }
    }
}
