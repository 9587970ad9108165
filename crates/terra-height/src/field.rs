//! Base-radius sphere deformed by an ordered modifier pipeline.

use glam::DVec3;

use crate::{HookId, HookList};

/// Adds a displacement to the running height of a surface sample.
///
/// `local_position` is the unit direction of the sample scaled to the base
/// radius. `height` holds the value accumulated so far (starting at the
/// radius) and is adjusted in place.
pub trait HeightModifier: Send + Sync {
    fn modify(&self, local_position: DVec3, height: &mut f64);
}

impl<F> HeightModifier for F
where
    F: Fn(DVec3, &mut f64) + Send + Sync,
{
    fn modify(&self, local_position: DVec3, height: &mut f64) {
        self(local_position, height)
    }
}

/// Height provider: base radius plus registered modifiers.
pub struct HeightField {
    radius: f64,
    modifiers: HookList<dyn HeightModifier>,
}

impl HeightField {
    /// A smooth sphere of `radius`. Validation of the radius is left to the
    /// owner of the field.
    #[must_use]
    pub fn new(radius: f64) -> Self {
        Self {
            radius,
            modifiers: HookList::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn set_radius(&mut self, radius: f64) {
        self.radius = radius;
    }

    /// Register a modifier; it runs after all earlier ones.
    pub fn subscribe(&mut self, modifier: Box<dyn HeightModifier>) -> HookId {
        self.modifiers.subscribe(modifier)
    }

    pub fn unsubscribe(&mut self, id: HookId) -> bool {
        self.modifiers.unsubscribe(id)
    }

    /// Swap a modifier's implementation, keeping its place in the pipeline.
    pub fn replace(&mut self, id: HookId, modifier: Box<dyn HeightModifier>) -> bool {
        self.modifiers.replace(id, modifier)
    }

    #[must_use]
    pub fn modifiers(&self) -> &HookList<dyn HeightModifier> {
        &self.modifiers
    }

    /// Surface distance from the centre along `direction` (any length).
    ///
    /// A zero direction samples the modifiers at the origin.
    #[must_use]
    pub fn height(&self, direction: DVec3) -> f64 {
        let local = direction.normalize_or_zero() * self.radius;
        let mut height = self.radius;
        for modifier in self.modifiers.iter() {
            modifier.modify(local, &mut height);
        }
        height
    }

    /// The deformed surface point above `cube_point` (or any direction).
    #[must_use]
    pub fn surface_point(&self, cube_point: DVec3) -> DVec3 {
        cube_point.normalize_or_zero() * self.height(cube_point)
    }
}

impl std::fmt::Debug for HeightField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeightField")
            .field("radius", &self.radius)
            .field("modifiers", &self.modifiers.len())
            .finish()
    }
}
