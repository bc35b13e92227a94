use tracing::{info, warn};

use crate::error::{OperationError, Result};
use crate::operations::adopt::{AdoptionReport, OrphanAdopter};
use crate::operations::query::{PointLineDistance, PointPrimitiveDistance};
use crate::params::MergeParams;
use crate::patch::{PointCloud, PrimitiveMap};

use super::adjacency::AdjacencyDecider;
use super::fusion::{PairFusion, SpanningSegment};
use super::patch_merge::PatchMerger;

/// Result of a full merge run.
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    /// The primitives at the fixed point.
    pub primitives: PrimitiveMap,
    /// Merge passes executed, including the final pass that merged nothing.
    pub passes: usize,
    /// Total pairs merged across all passes.
    pub merges: usize,
    /// Adoption summary, when adoption ran.
    pub adoption: Option<AdoptionReport>,
}

/// Runs optional orphan adoption followed by merge passes until a pass
/// merges nothing.
pub struct MergeDriver {
    params: MergeParams,
    distance: Box<dyn PointPrimitiveDistance>,
    fusion: Box<dyn PairFusion>,
}

impl MergeDriver {
    /// Creates a driver with the default distance and fusion strategies.
    #[must_use]
    pub fn new(params: MergeParams) -> Self {
        Self {
            params,
            distance: Box::new(PointLineDistance),
            fusion: Box::new(SpanningSegment),
        }
    }

    /// Replaces the point-to-primitive distance used for adoption.
    #[must_use]
    pub fn with_distance(mut self, distance: impl PointPrimitiveDistance + 'static) -> Self {
        self.distance = Box::new(distance);
        self
    }

    /// Replaces the fusion policy applied to merged pairs.
    #[must_use]
    pub fn with_fusion(mut self, fusion: impl PairFusion + 'static) -> Self {
        self.fusion = Box::new(fusion);
        self
    }

    /// Returns the parameters in use.
    #[must_use]
    pub fn params(&self) -> &MergeParams {
        &self.params
    }

    /// Executes the run. `cloud` GIDs change only through adoption.
    ///
    /// # Errors
    ///
    /// Returns an error if the parameters are invalid or a pass fails, and
    /// `OperationError::NotConverged` carrying the last completed map if no
    /// fixed point is reached within the pass limit. Without an explicit
    /// `max_passes` the limit is the input primitive count.
    pub fn execute(&self, primitives: PrimitiveMap, cloud: &mut PointCloud) -> Result<MergeOutcome> {
        self.params.validate()?;

        let adoption = match self.params.adopt {
            Some(mode) => Some(
                OrphanAdopter::new(self.params.scale, mode, self.distance.as_ref())
                    .execute(cloud, &primitives)?,
            ),
            None => None,
        };

        let merger = PatchMerger::new(
            self.params.scale,
            AdjacencyDecider::from_params(&self.params),
            self.fusion.as_ref(),
        );

        let limit = self.params.pass_limit(primitives.len());
        let mut current = primitives;
        let mut merges = 0;
        for pass in 1..=limit {
            let result = merger.execute(&current, cloud)?;
            current = result.primitives;
            merges += result.merges;
            if result.merges == 0 {
                info!(passes = pass, merges, primitives = current.len(), "merging converged");
                return Ok(MergeOutcome {
                    primitives: current,
                    passes: pass,
                    merges,
                    adoption,
                });
            }
        }

        warn!(
            passes = limit,
            merges, "merging stopped before reaching a fixed point"
        );
        Err(OperationError::NotConverged {
            passes: limit,
            last: Box::new(current),
        }
        .into())
    }
}
