use crate::error::{GeometryError, Result};
use crate::geometry::{Extrema, LinePrimitive};
use crate::patch::PointCloud;

/// Estimates the occupied segment of a primitive from its points.
///
/// Candidate points closer than `scale` to the primitive's line are projected
/// onto its direction; the extreme projections become the endpoints. Without
/// a population every point in the cloud is a candidate.
pub struct ExtentEstimator<'a> {
    primitive: &'a LinePrimitive,
    scale: f64,
    population: Option<&'a [usize]>,
}

impl<'a> ExtentEstimator<'a> {
    /// Creates a new `ExtentEstimator` query over the whole cloud.
    #[must_use]
    pub fn new(primitive: &'a LinePrimitive, scale: f64) -> Self {
        Self {
            primitive,
            scale,
            population: None,
        }
    }

    /// Restricts the candidates to the given point indices.
    #[must_use]
    pub fn with_population(mut self, population: &'a [usize]) -> Self {
        self.population = Some(population);
        self
    }

    /// Executes the query.
    ///
    /// Returns degenerate extrema at the primitive's origin when no candidate
    /// lies within `scale`.
    ///
    /// # Errors
    ///
    /// Returns an error if a population index is out of range or a candidate
    /// point has a non-finite position.
    pub fn execute(&self, cloud: &PointCloud) -> Result<Extrema> {
        let mut range: Option<(f64, f64)> = None;

        let mut visit = |pid: usize| -> Result<()> {
            let point = cloud.point(pid)?;
            if !point.position.coords.iter().all(|c| c.is_finite()) {
                return Err(GeometryError::Degenerate(format!(
                    "point {pid} has a non-finite position"
                ))
                .into());
            }
            if self.primitive.distance_to(&point.position) < self.scale {
                let t = self.primitive.project(&point.position);
                range = Some(range.map_or((t, t), |(lo, hi)| (lo.min(t), hi.max(t))));
            }
            Ok(())
        };

        match self.population {
            Some(pids) => {
                for &pid in pids {
                    visit(pid)?;
                }
            }
            None => {
                for pid in 0..cloud.len() {
                    visit(pid)?;
                }
            }
        }

        Ok(match range {
            Some((lo, hi)) => Extrema::new(self.primitive.point_at(lo), self.primitive.point_at(hi)),
            None => Extrema::degenerate(*self.primitive.origin()),
        })
    }
}
