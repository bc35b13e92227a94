use std::f64::consts::FRAC_PI_2;

use crate::error::{GeometryError, OperationError, PatchMergeError, Result};

/// How aggressively orphaned points are re-assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdoptMode {
    /// Only orphans explained by exactly one primitive are adopted.
    Unambiguous,
    /// Unambiguous orphans first, then the rest by proximity to already
    /// assigned points.
    Proximity,
}

impl TryFrom<u8> for AdoptMode {
    type Error = PatchMergeError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            1 => Ok(Self::Unambiguous),
            2 => Ok(Self::Proximity),
            other => Err(OperationError::InvalidInput(format!(
                "adoption mode must be 1 or 2, got {other}"
            ))
            .into()),
        }
    }
}

/// Tuning parameters for adoption and merging.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeParams {
    /// Distance tolerance for adjacency, adoption and extent estimation.
    pub scale: f64,
    /// When set, extrema farther apart than `mult * scale` never merge.
    pub spatial_threshold_mult: Option<f64>,
    /// When set, primitives from different direction groups whose directions
    /// differ by more than this angle (radians) never merge.
    pub parallel_limit: Option<f64>,
    /// Adoption pass to run before merging, if any.
    pub adopt: Option<AdoptMode>,
    /// Upper bound on merge passes before giving up. `None` bounds the run by
    /// the input primitive count, which a shrinking fusion always meets.
    pub max_passes: Option<usize>,
}

impl Default for MergeParams {
    fn default() -> Self {
        Self {
            scale: 0.05,
            spatial_threshold_mult: None,
            parallel_limit: None,
            adopt: None,
            max_passes: None,
        }
    }
}

impl MergeParams {
    /// Creates parameters with the given scale and defaults elsewhere.
    #[must_use]
    pub fn new(scale: f64) -> Self {
        Self {
            scale,
            ..Self::default()
        }
    }

    /// Enables the spatial pre-gate at `mult * scale`.
    #[must_use]
    pub fn with_spatial_threshold_mult(mut self, mult: f64) -> Self {
        self.spatial_threshold_mult = Some(mult);
        self
    }

    /// Enables the angular pre-gate.
    #[must_use]
    pub fn with_parallel_limit(mut self, radians: f64) -> Self {
        self.parallel_limit = Some(radians);
        self
    }

    /// Runs adoption in `mode` before merging.
    #[must_use]
    pub fn with_adopt(mut self, mode: AdoptMode) -> Self {
        self.adopt = Some(mode);
        self
    }

    /// Sets the merge pass cap.
    #[must_use]
    pub fn with_max_passes(mut self, max_passes: usize) -> Self {
        self.max_passes = Some(max_passes);
        self
    }

    /// Returns the pass cap for a run over `primitives` primitives.
    #[must_use]
    pub fn pass_limit(&self, primitives: usize) -> usize {
        self.max_passes.unwrap_or_else(|| primitives.max(1))
    }

    /// Returns the absolute spatial threshold, if enabled.
    #[must_use]
    pub fn spatial_threshold(&self) -> Option<f64> {
        self.spatial_threshold_mult.map(|mult| mult * self.scale)
    }

    /// Checks that every parameter is usable.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::ParameterOutOfRange` for a non-positive or
    /// non-finite scale or multiplier, or a parallel limit outside
    /// `[0, π/2]`, and `OperationError::InvalidInput` for a zero pass cap.
    pub fn validate(&self) -> Result<()> {
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(GeometryError::ParameterOutOfRange {
                parameter: "scale",
                value: self.scale,
                min: 0.0,
                max: f64::INFINITY,
            }
            .into());
        }
        if let Some(mult) = self.spatial_threshold_mult {
            if !mult.is_finite() || mult <= 0.0 {
                return Err(GeometryError::ParameterOutOfRange {
                    parameter: "spatial_threshold_mult",
                    value: mult,
                    min: 0.0,
                    max: f64::INFINITY,
                }
                .into());
            }
        }
        if let Some(limit) = self.parallel_limit {
            if !(0.0..=FRAC_PI_2).contains(&limit) {
                return Err(GeometryError::ParameterOutOfRange {
                    parameter: "parallel_limit",
                    value: limit,
                    min: 0.0,
                    max: FRAC_PI_2,
                }
                .into());
            }
        }
        if self.max_passes == Some(0) {
            return Err(
                OperationError::InvalidInput("max_passes must be at least 1".to_owned()).into(),
            );
        }
        Ok(())
    }
}
