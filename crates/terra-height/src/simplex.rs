//! Fractal simplex noise modifiers.
//!
//! Both modifiers sample a stack of independently seeded 3D simplex
//! generators at the sample direction scaled by `frequency`, doubling the
//! frequency and halving the weight per octave. The weighted sum is divided
//! by the total weight so the range does not depend on the octave count.

use glam::DVec3;
use noise::{NoiseFn, Simplex};

use crate::HeightModifier;

/// Highest accepted octave count; larger values are clamped.
pub const MAX_OCTAVES: u32 = 20;

/// Seed offset between consecutive octave generators.
const OCTAVE_SEED_STRIDE: u32 = 999;

/// Shared parameters of the simplex modifiers.
#[derive(Clone, Debug, PartialEq)]
pub struct SimplexParams {
    /// Tiling of the noise over the unit sphere.
    pub frequency: f64,
    /// Peak displacement in terrain units.
    pub amplitude: f64,
    /// Number of octaves, clamped to `1..=MAX_OCTAVES`.
    pub octaves: u32,
    pub seed: u32,
}

impl Default for SimplexParams {
    fn default() -> Self {
        Self {
            frequency: 10.0,
            amplitude: 0.5,
            octaves: 5,
            seed: 0,
        }
    }
}

/// Per-octave generators plus the weight normalisation factor.
struct Octaves {
    generators: Vec<Simplex>,
    scale: f64,
}

impl Octaves {
    fn new(params: &SimplexParams) -> Self {
        let count = params.octaves.clamp(1, MAX_OCTAVES);
        let generators = (0..count)
            .map(|i| Simplex::new(params.seed.wrapping_add(i * OCTAVE_SEED_STRIDE)))
            .collect();
        let total: f64 = (0..count).map(|i| 0.5f64.powi(i as i32)).sum();
        Self {
            generators,
            scale: 1.0 / total,
        }
    }

    #[inline]
    fn sample(generator: &Simplex, p: DVec3) -> f64 {
        generator.get([p.x, p.y, p.z]).clamp(-1.0, 1.0)
    }
}

/// Fractal Brownian motion over simplex noise; contributes
/// `[-amplitude, amplitude]`.
pub struct SimplexModifier {
    params: SimplexParams,
    octaves: Octaves,
}

impl SimplexModifier {
    #[must_use]
    pub fn new(params: SimplexParams) -> Self {
        let octaves = Octaves::new(&params);
        Self { params, octaves }
    }

    #[must_use]
    pub fn params(&self) -> &SimplexParams {
        &self.params
    }

    /// Normalised noise in `[-1, 1]` for a sample position.
    #[must_use]
    pub fn noise(&self, local_position: DVec3) -> f64 {
        let mut p = local_position.normalize_or_zero() * self.params.frequency;
        let mut weight = 1.0;
        let mut sum = 0.0;
        for generator in &self.octaves.generators {
            p *= 2.0;
            sum += Octaves::sample(generator, p) * weight;
            weight *= 0.5;
        }
        sum * self.octaves.scale
    }
}

impl HeightModifier for SimplexModifier {
    fn modify(&self, local_position: DVec3, height: &mut f64) {
        *height += self.noise(local_position) * self.params.amplitude;
    }
}

/// Ridged variant: the normalised sum is stretched to `[-2, 2]` and folded
/// with `abs` into `[0, 2]`, optionally inverted, then scaled by amplitude.
pub struct RidgedSimplexModifier {
    params: SimplexParams,
    invert: bool,
    octaves: Octaves,
}

impl RidgedSimplexModifier {
    #[must_use]
    pub fn new(params: SimplexParams, invert: bool) -> Self {
        let octaves = Octaves::new(&params);
        Self {
            params,
            invert,
            octaves,
        }
    }

    #[must_use]
    pub fn params(&self) -> &SimplexParams {
        &self.params
    }

    #[must_use]
    pub fn invert(&self) -> bool {
        self.invert
    }

    /// Folded ridge value in `[0, 2]`.
    #[must_use]
    pub fn ridge(&self, local_position: DVec3) -> f64 {
        let mut p = local_position.normalize_or_zero() * self.params.frequency;
        let mut weight = 1.0;
        let mut sum = 0.0;
        for generator in &self.octaves.generators {
            sum += Octaves::sample(generator, p) * weight;
            p *= 2.0;
            weight *= 0.5;
        }
        let folded = (sum * self.octaves.scale * 2.0).abs();
        if self.invert { 2.0 - folded } else { folded }
    }
}

impl HeightModifier for RidgedSimplexModifier {
    fn modify(&self, local_position: DVec3, height: &mut f64) {
        *height += self.ridge(local_position) * self.params.amplitude;
    }
}
