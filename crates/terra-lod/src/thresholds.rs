//! Split distances per quadtree depth.

use terra_cubesphere::MAX_DEPTH;
use thiserror::Error;
use tracing::warn;

/// Reasons a threshold list is rejected.
#[derive(Debug, Error, PartialEq)]
pub enum ThresholdError {
    #[error("threshold {index} is not finite ({value})")]
    NonFinite { index: usize, value: f64 },
    #[error("threshold {index} must be positive, got {value}")]
    NonPositive { index: usize, value: f64 },
    #[error("threshold {index} ({value}) must be smaller than the previous one ({previous})")]
    NotDecreasing {
        index: usize,
        value: f64,
        previous: f64,
    },
    #[error("{count} thresholds given, at most {max} depths are supported")]
    TooMany { count: usize, max: usize },
}

/// Distance thresholds for splitting, one per depth.
///
/// `distances[d]` is the distance below which a node at depth `d` splits.
/// Values are strictly decreasing and positive; their squares are cached so
/// the controller can compare against squared distances. Depths past the end
/// of the list never split, so the list length is the deepest reachable level.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LodThresholds {
    distances: Vec<f64>,
    squared: Vec<f64>,
}

impl LodThresholds {
    /// Validate and cache a threshold list. An empty list is valid and means
    /// the roots never split.
    pub fn new(distances: Vec<f64>) -> Result<Self, ThresholdError> {
        if distances.len() > MAX_DEPTH as usize {
            return Err(ThresholdError::TooMany {
                count: distances.len(),
                max: MAX_DEPTH as usize,
            });
        }
        for (index, &value) in distances.iter().enumerate() {
            if !value.is_finite() {
                return Err(ThresholdError::NonFinite { index, value });
            }
            if value <= 0.0 {
                return Err(ThresholdError::NonPositive { index, value });
            }
            if index > 0 && value >= distances[index - 1] {
                return Err(ThresholdError::NotDecreasing {
                    index,
                    value,
                    previous: distances[index - 1],
                });
            }
        }
        Ok(Self::from_valid(distances))
    }

    /// Like [`LodThresholds::new`] but drops offending entries instead of
    /// failing, logging a warning for each one.
    pub fn sanitized(distances: &[f64]) -> Self {
        let mut kept: Vec<f64> = Vec::with_capacity(distances.len());
        for (index, &value) in distances.iter().enumerate() {
            let previous = kept.last().copied().unwrap_or(f64::INFINITY);
            if !value.is_finite() || value <= 0.0 || value >= previous {
                warn!("Dropping LOD threshold {index} ({value}): not a positive decreasing distance");
                continue;
            }
            if kept.len() == MAX_DEPTH as usize {
                warn!(
                    "Dropping LOD thresholds past depth {MAX_DEPTH} ({} given)",
                    distances.len()
                );
                break;
            }
            kept.push(value);
        }
        Self::from_valid(kept)
    }

    fn from_valid(distances: Vec<f64>) -> Self {
        let squared = distances.iter().map(|d| d * d).collect();
        Self { distances, squared }
    }

    /// No thresholds: the six roots never split.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Five halving levels starting at twice a unit radius.
    #[must_use]
    pub fn default_planet() -> Self {
        Self::from_valid(vec![2.0, 1.0, 0.5, 0.25, 0.125])
    }

    /// Append one more level at half the last distance (or `2.0` for an
    /// empty list). Ignored once [`MAX_DEPTH`] levels exist.
    pub fn push_level(&mut self) {
        if self.distances.len() >= MAX_DEPTH as usize {
            return;
        }
        let next = self.distances.last().map_or(2.0, |last| last * 0.5);
        self.distances.push(next);
        self.squared.push(next * next);
    }

    /// Deepest level a node can reach.
    #[must_use]
    pub fn max_depth(&self) -> u8 {
        self.distances.len() as u8
    }

    #[must_use]
    pub fn distances(&self) -> &[f64] {
        &self.distances
    }

    /// Squared split distance for `depth`, `None` past the last threshold.
    #[inline]
    #[must_use]
    pub fn squared(&self, depth: u8) -> Option<f64> {
        self.squared.get(depth as usize).copied()
    }

    /// Whether a node at `depth` whose nearest viewer is `distance_sq` away
    /// should be split.
    #[inline]
    #[must_use]
    pub fn wants_split(&self, depth: u8, distance_sq: f64) -> bool {
        self.squared(depth).is_some_and(|t| distance_sq < t)
    }
}
