//! Equirectangular heightmap displacement.

use std::f64::consts::{PI, TAU};
use std::path::Path;

use glam::DVec3;
use tracing::debug;

use crate::{HeightModifier, HeightmapError};

/// A decoded RGBA8 image held in memory for sampling.
#[derive(Clone, Debug, PartialEq)]
pub struct Heightmap {
    width: u32,
    height: u32,
    pixels: Vec<[u8; 4]>,
}

impl Heightmap {
    /// Wrap a tightly packed RGBA8 buffer, rows bottom to top in `v`.
    pub fn from_rgba8(width: u32, height: u32, data: Vec<u8>) -> Result<Self, HeightmapError> {
        if width == 0 || height == 0 {
            return Err(HeightmapError::Empty { width, height });
        }
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(HeightmapError::BufferSize {
                expected,
                actual: data.len(),
            });
        }
        let pixels = data
            .chunks_exact(4)
            .map(|c| [c[0], c[1], c[2], c[3]])
            .collect();
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Convert a decoded image. Image rows run top to bottom, so they are
    /// flipped to put `v = 0` at the south pole.
    pub fn from_image(image: &image::DynamicImage) -> Result<Self, HeightmapError> {
        let mut rgba = image.to_rgba8();
        image::imageops::flip_vertical_in_place(&mut rgba);
        let (width, height) = rgba.dimensions();
        Self::from_rgba8(width, height, rgba.into_raw())
    }

    /// Decode an image file (PNG or JPEG).
    pub fn open(path: impl AsRef<Path>) -> Result<Self, HeightmapError> {
        let path = path.as_ref();
        let image = image::open(path)?;
        let map = Self::from_image(&image)?;
        debug!(
            "Loaded heightmap {} ({}x{})",
            path.display(),
            map.width,
            map.height
        );
        Ok(map)
    }

    /// Decode an in-memory encoded image.
    pub fn decode(bytes: &[u8]) -> Result<Self, HeightmapError> {
        Self::from_image(&image::load_from_memory(bytes)?)
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    fn texel(&self, x: i64, y: i64) -> [f64; 4] {
        let w = i64::from(self.width);
        let h = i64::from(self.height);
        let x = x.rem_euclid(w) as usize;
        let y = y.clamp(0, h - 1) as usize;
        self.pixels[y * self.width as usize + x].map(|c| f64::from(c) / 255.0)
    }

    /// Bilinear RGBA sample in `[0, 1]` per channel. Texel centres sit at
    /// `(i + 0.5) / width`; `u` wraps around, `v` clamps at the poles.
    #[must_use]
    pub fn sample_bilinear(&self, u: f64, v: f64) -> [f64; 4] {
        let x = u * f64::from(self.width) - 0.5;
        let y = v * f64::from(self.height) - 0.5;
        let (x0, y0) = (x.floor(), y.floor());
        let (fx, fy) = (x - x0, y - y0);
        let (x0, y0) = (x0 as i64, y0 as i64);

        let c00 = self.texel(x0, y0);
        let c10 = self.texel(x0 + 1, y0);
        let c01 = self.texel(x0, y0 + 1);
        let c11 = self.texel(x0 + 1, y0 + 1);

        let mut out = [0.0; 4];
        for i in 0..4 {
            let bottom = c00[i] + (c10[i] - c00[i]) * fx;
            let top = c01[i] + (c11[i] - c01[i]) * fx;
            out[i] = bottom + (top - bottom) * fy;
        }
        out
    }
}

/// How a height in `[0, 1]` is stored in the heightmap pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HeightEncoding {
    /// 8-bit height in the alpha channel.
    #[default]
    Alpha,
    /// 16-bit height, red as the high byte and green as the low byte.
    RedGreen,
}

impl HeightEncoding {
    #[must_use]
    pub fn decode(self, rgba: [f64; 4]) -> f64 {
        match self {
            HeightEncoding::Alpha => rgba[3],
            HeightEncoding::RedGreen => (rgba[0] * 255.0 + rgba[1]) / 256.0,
        }
    }
}

/// Equirectangular UV of a direction: `u` follows longitude from `atan2(x, z)`,
/// `v` follows latitude from `asin(y)`.
#[must_use]
pub fn direction_to_equirect_uv(direction: DVec3) -> (f64, f64) {
    let d = direction.normalize_or_zero();
    let u = 0.5 + d.x.atan2(d.z) / TAU;
    let v = 0.5 + d.y.clamp(-1.0, 1.0).asin() / PI;
    (u, v)
}

/// Displaces the surface by a heightmap remapped into
/// `[displacement_min, displacement_max]`.
#[derive(Clone, Debug)]
pub struct HeightmapModifier {
    /// `None` contributes nothing.
    pub heightmap: Option<Heightmap>,
    pub encoding: HeightEncoding,
    /// Displacement for a stored height of 0.
    pub displacement_min: f64,
    /// Displacement for a stored height of 1.
    pub displacement_max: f64,
}

impl Default for HeightmapModifier {
    fn default() -> Self {
        Self {
            heightmap: None,
            encoding: HeightEncoding::Alpha,
            displacement_min: 0.0,
            displacement_max: 0.1,
        }
    }
}

impl HeightmapModifier {
    #[must_use]
    pub fn new(heightmap: Heightmap, encoding: HeightEncoding, min: f64, max: f64) -> Self {
        Self {
            heightmap: Some(heightmap),
            encoding,
            displacement_min: min,
            displacement_max: max,
        }
    }

    /// Displacement for a sample position, 0 without a heightmap.
    #[must_use]
    pub fn displacement(&self, local_position: DVec3) -> f64 {
        let Some(map) = &self.heightmap else {
            return 0.0;
        };
        let (u, v) = direction_to_equirect_uv(local_position);
        let h01 = self.encoding.decode(map.sample_bilinear(u, v));
        self.displacement_min + (self.displacement_max - self.displacement_min) * h01
    }
}

impl HeightModifier for HeightmapModifier {
    fn modify(&self, local_position: DVec3, height: &mut f64) {
        if self.heightmap.is_some() {
            *height += self.displacement(local_position);
        }
    }
}
