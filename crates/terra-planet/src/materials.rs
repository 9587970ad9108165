//! Opaque material handles and the stock material modifiers.

use terra_cubesphere::CubeFace;

use crate::{FaceInfo, MaterialModifier};

/// Host-defined material handle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialId(pub u32);

/// Assigns `material` to nodes whose depth is in `level_min..=level_max`,
/// on every face or only on `side`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LevelMaterial {
    pub material: MaterialId,
    /// `None` applies to all six faces.
    pub side: Option<CubeFace>,
    pub level_min: u8,
    pub level_max: u8,
}

impl LevelMaterial {
    #[must_use]
    pub fn applies_to(&self, face: &FaceInfo) -> bool {
        (self.level_min..=self.level_max).contains(&face.depth())
            && self.side.is_none_or(|side| side == face.face())
    }
}

impl MaterialModifier for LevelMaterial {
    fn modify_material(&self, face: &FaceInfo, material: &mut MaterialId) {
        if self.applies_to(face) {
            *material = self.material;
        }
    }
}

/// One material per cube face, indexed like [`CubeFace::ALL`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CubeMaterials {
    pub faces: [MaterialId; 6],
}

impl CubeMaterials {
    #[must_use]
    pub fn material_for(&self, face: CubeFace) -> MaterialId {
        self.faces[face.index()]
    }
}

impl MaterialModifier for CubeMaterials {
    fn modify_material(&self, face: &FaceInfo, material: &mut MaterialId) {
        *material = self.material_for(face.face());
    }
}

#[cfg(test)]
mod tests {
    use terra_cubesphere::NodeAddress;
    use terra_lod::QuadTree;

    use super::*;

    fn info(face: CubeFace, depth: u8) -> FaceInfo {
        let tree = QuadTree::new(0);
        FaceInfo::new(tree.root(face), NodeAddress::new(face, depth, 0, 0))
    }

    #[test]
    fn test_level_material_range_and_side() {
        let m = LevelMaterial {
            material: MaterialId(7),
            side: Some(CubeFace::NegZ),
            level_min: 2,
            level_max: 3,
        };
        let mut id = MaterialId(0);
        m.modify_material(&info(CubeFace::NegZ, 1), &mut id);
        assert_eq!(id, MaterialId(0));
        m.modify_material(&info(CubeFace::PosZ, 2), &mut id);
        assert_eq!(id, MaterialId(0));
        m.modify_material(&info(CubeFace::NegZ, 3), &mut id);
        assert_eq!(id, MaterialId(7));
    }

    #[test]
    fn test_level_material_all_sides() {
        let m = LevelMaterial {
            material: MaterialId(2),
            side: None,
            level_min: 0,
            level_max: 0,
        };
        for face in CubeFace::ALL {
            assert!(m.applies_to(&info(face, 0)));
            assert!(!m.applies_to(&info(face, 1)));
        }
    }

    #[test]
    fn test_cube_materials_pick_by_face() {
        let m = CubeMaterials {
            faces: [0, 1, 2, 3, 4, 5].map(MaterialId),
        };
        for face in CubeFace::ALL {
            let mut id = MaterialId(99);
            m.modify_material(&info(face, 4), &mut id);
            assert_eq!(id, MaterialId(face.index() as u32));
        }
    }
}
