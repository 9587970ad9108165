//! Mapping between face coordinates, cube-space points, and the unit sphere.
//!
//! Terrain nodes keep their corners in cube space and only project through
//! [`cube_to_sphere`] (plain normalization) when a surface point is needed, so
//! midpoints of dyadic corners stay exact.

use glam::DVec3;

use crate::FaceCoord;

/// Convert a [`FaceCoord`] to a point on the surface of the `[-1, 1]` cube.
#[inline]
#[must_use]
pub fn face_coord_to_cube_point(fc: &FaceCoord) -> DVec3 {
    let s = 2.0 * fc.u - 1.0;
    let t = 2.0 * fc.v - 1.0;
    fc.face.normal() + s * fc.face.tangent() + t * fc.face.bitangent()
}

/// Project a cube-space point onto the unit sphere.
///
/// The zero vector has no direction and is returned unchanged.
#[inline]
#[must_use]
pub fn cube_to_sphere(cube_point: DVec3) -> DVec3 {
    cube_point.normalize_or_zero()
}

/// Convenience: [`FaceCoord`] straight to the unit sphere.
#[inline]
#[must_use]
pub fn face_coord_to_sphere(fc: &FaceCoord) -> DVec3 {
    cube_to_sphere(face_coord_to_cube_point(fc))
}
