//! Heightmap loading errors.

use thiserror::Error;

/// Errors raised while loading a heightmap.
#[derive(Debug, Error)]
pub enum HeightmapError {
    #[error("failed to decode heightmap image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("heightmap buffer is {actual} bytes, expected {expected} for the given size")]
    BufferSize { expected: usize, actual: usize },
    #[error("heightmap must be at least 1x1 pixels, got {width}x{height}")]
    Empty { width: u32, height: u32 },
}

impl HeightmapError {
    /// True when the image file itself does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            HeightmapError::Decode(image::ImageError::IoError(e))
                if e.kind() == std::io::ErrorKind::NotFound
        )
    }
}
