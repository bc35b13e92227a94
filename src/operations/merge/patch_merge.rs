use slotmap::SecondaryMap;
use tracing::{debug, info};

use crate::error::{OperationError, Result};
use crate::geometry::{Extrema, Gid};
use crate::operations::query::{ExtentEstimator, Population};
use crate::patch::{PointCloud, PrimitiveId, PrimitiveMap};

use super::adjacency::AdjacencyDecider;
use super::fusion::{Contribution, PairFusion};

/// Per-primitive bookkeeping during one pass. Each state leaves
/// `Unprocessed` at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MergeState {
    Unprocessed,
    Merged,
    Kept,
}

/// Result of a single merge pass.
#[derive(Debug, Clone)]
pub struct MergePass {
    /// The rebuilt primitive map.
    pub primitives: PrimitiveMap,
    /// Number of pairs merged during the pass.
    pub merges: usize,
}

impl MergePass {
    /// Returns whether the pass merged anything.
    #[must_use]
    pub fn changed(&self) -> bool {
        self.merges > 0
    }
}

/// One greedy merge pass over a primitive map.
///
/// Populations and extents are measured once from the cloud. Primitives are
/// then visited in ascending GID and LID order; each unprocessed reference is
/// paired with the first later unprocessed primitive the decider accepts.
/// Matched pairs go through the fusion policy, unmatched references are
/// copied through.
pub struct PatchMerger<'a> {
    scale: f64,
    decider: AdjacencyDecider,
    fusion: &'a dyn PairFusion,
}

impl<'a> PatchMerger<'a> {
    /// Creates a new `PatchMerger` operation.
    #[must_use]
    pub fn new(scale: f64, decider: AdjacencyDecider, fusion: &'a dyn PairFusion) -> Self {
        Self {
            scale,
            decider,
            fusion,
        }
    }

    /// Executes one pass over `input`.
    ///
    /// # Errors
    ///
    /// Returns an error if an extent cannot be estimated, if fusion fails, or
    /// if a primitive ends the pass neither merged nor kept.
    pub fn execute(&self, input: &PrimitiveMap, cloud: &PointCloud) -> Result<MergePass> {
        let populations = Population::from_cloud(cloud);
        let extrema = self.measure(input, cloud, &populations)?;

        let order: Vec<(Gid, usize, PrimitiveId)> =
            input.iter().map(|(gid, lid, id, _)| (gid, lid, id)).collect();
        let mut states: SecondaryMap<PrimitiveId, MergeState> = order
            .iter()
            .map(|&(_, _, id)| (id, MergeState::Unprocessed))
            .collect();

        let mut output = PrimitiveMap::new();
        let mut merges = 0;

        for (i, &(gid0, lid0, id0)) in order.iter().enumerate() {
            if states[id0] != MergeState::Unprocessed {
                continue;
            }
            let prim0 = input.get(id0)?;
            let ext0 = &extrema[id0];

            let mut partner = None;
            for &(gid1, lid1, id1) in &order[i + 1..] {
                if states[id1] != MergeState::Unprocessed {
                    continue;
                }
                let prim1 = input.get(id1)?;
                let ext1 = &extrema[id1];
                if self.decider.decide(prim0, ext0, prim1, ext1).should_merge() {
                    partner = Some((gid1, lid1, id1));
                    break;
                }
            }

            match partner {
                Some((gid1, lid1, id1)) => {
                    debug!(
                        reference = ?(gid0, lid0),
                        candidate = ?(gid1, lid1),
                        "merging"
                    );
                    states[id0] = MergeState::Merged;
                    states[id1] = MergeState::Merged;
                    let fused = self.fusion.fuse(
                        Contribution {
                            primitive: prim0,
                            extrema: ext0,
                        },
                        Contribution {
                            primitive: input.get(id1)?,
                            extrema: &extrema[id1],
                        },
                    )?;
                    for primitive in fused {
                        output.insert(primitive);
                    }
                    merges += 1;
                }
                None => {
                    debug!(reference = ?(gid0, lid0), "keeping");
                    states[id0] = MergeState::Kept;
                    output.insert(prim0.clone());
                }
            }
        }

        let merged = states.values().filter(|s| **s == MergeState::Merged).count();
        let kept = states.values().filter(|s| **s == MergeState::Kept).count();
        if merged + kept != order.len() {
            return Err(OperationError::Failed(format!(
                "{} of {} primitives left unprocessed by merge pass",
                order.len() - merged - kept,
                order.len()
            ))
            .into());
        }
        debug_assert_eq!(merged, 2 * merges);

        info!(
            input = order.len(),
            output = output.len(),
            merges,
            "merge pass finished"
        );
        Ok(MergePass {
            primitives: output,
            merges,
        })
    }

    /// Estimates the extent of every primitive from the points of its
    /// sources. A primitive whose sources own no points falls back to the
    /// whole cloud.
    fn measure(
        &self,
        input: &PrimitiveMap,
        cloud: &PointCloud,
        populations: &Population,
    ) -> Result<SecondaryMap<PrimitiveId, Extrema>> {
        let mut extrema = SecondaryMap::new();
        for (_, _, id, primitive) in input.iter() {
            let population = populations.gather(primitive.sources());
            let estimator = ExtentEstimator::new(primitive, self.scale);
            let extent = if population.is_empty() {
                estimator.execute(cloud)?
            } else {
                estimator.with_population(&population).execute(cloud)?
            };
            extrema.insert(id, extent);
        }
        Ok(extrema)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::geometry::{LinePrimitive, PointPrimitive};
    use crate::math::{Point3, Vector3};
    use crate::operations::merge::fusion::{KeepBoth, SpanningSegment};
    use proptest::prelude::*;

    /// Samples 21 evenly spaced points along a segment, tagged with `gid`.
    fn sample(cloud: &mut Vec<PointPrimitive>, from: (f64, f64), to: (f64, f64), gid: Gid) {
        let steps = 20;
        for i in 0..=steps {
            let t = f64::from(i) / f64::from(steps);
            let x = from.0 + (to.0 - from.0) * t;
            let y = from.1 + (to.1 - from.1) * t;
            cloud.push(PointPrimitive::new(Point3::new(x, y, 0.0)).with_gid(gid));
        }
    }

    fn line(from: (f64, f64), to: (f64, f64), gid: Gid, dir_gid: Gid) -> LinePrimitive {
        LinePrimitive::through(
            Point3::new(from.0, from.1, 0.0),
            Point3::new(to.0, to.1, 0.0),
            gid,
            dir_gid,
        )
        .unwrap()
    }

    fn run(map: &PrimitiveMap, cloud: &PointCloud, scale: f64) -> MergePass {
        PatchMerger::new(scale, AdjacencyDecider::new(scale), &SpanningSegment)
            .execute(map, cloud)
            .unwrap()
    }

    #[test]
    fn collinear_same_group_pair_becomes_one_representative() {
        let mut points = Vec::new();
        sample(&mut points, (0.0, 0.0), (5.0, 0.0), 0);
        sample(&mut points, (5.05, 0.0), (10.0, 0.0), 1);
        let cloud = PointCloud::new(points);
        let map: PrimitiveMap = [
            line((0.0, 0.0), (5.0, 0.0), 0, 4),
            line((5.05, 0.0), (10.0, 0.0), 1, 4),
        ]
        .into_iter()
        .collect();

        let pass = run(&map, &cloud, 0.2);
        assert_eq!(pass.merges, 1);
        assert_eq!(pass.primitives.len(), 1);
        let fused = pass.primitives.at(0, 0).unwrap();
        assert_eq!(fused.sources(), &[0, 1]);
        assert!(!pass.primitives.has_patch(1));
    }

    #[test]
    fn offset_parallel_pair_passes_through() {
        let mut points = Vec::new();
        sample(&mut points, (0.0, 0.0), (5.0, 0.0), 0);
        sample(&mut points, (0.0, 1.0), (5.0, 1.0), 1);
        let cloud = PointCloud::new(points);
        let map: PrimitiveMap = [
            line((0.0, 0.0), (5.0, 0.0), 0, 0),
            line((0.0, 1.0), (5.0, 1.0), 1, 1),
        ]
        .into_iter()
        .collect();

        let pass = run(&map, &cloud, 0.2);
        assert!(!pass.changed());
        assert_eq!(pass.primitives.len(), 2);
        assert_eq!(pass.primitives.at(0, 0), map.at(0, 0));
        assert_eq!(pass.primitives.at(1, 0), map.at(1, 0));
    }

    #[test]
    fn first_match_wins_in_gid_order() {
        // Patch 0 is adjacent to both 1 and 2; it pairs with 1, leaving 2 alone.
        let mut points = Vec::new();
        sample(&mut points, (0.0, 0.0), (5.0, 0.0), 0);
        sample(&mut points, (5.1, 0.0), (8.0, 0.0), 1);
        sample(&mut points, (-3.0, 0.0), (-0.1, 0.0), 2);
        let cloud = PointCloud::new(points);
        let map: PrimitiveMap = [
            line((0.0, 0.0), (5.0, 0.0), 0, 0),
            line((5.1, 0.0), (8.0, 0.0), 1, 0),
            line((-3.0, 0.0), (-0.1, 0.0), 2, 0),
        ]
        .into_iter()
        .collect();

        let pass = run(&map, &cloud, 0.2);
        assert_eq!(pass.merges, 1);
        assert_eq!(pass.primitives.at(0, 0).unwrap().sources(), &[0, 1]);
        assert_eq!(pass.primitives.at(2, 0), map.at(2, 0));
    }

    #[test]
    fn same_patch_primitives_can_merge() {
        let mut points = Vec::new();
        sample(&mut points, (0.0, 0.0), (3.0, 0.0), 0);
        sample(&mut points, (3.1, 0.0), (6.0, 0.0), 0);
        let cloud = PointCloud::new(points);
        let map: PrimitiveMap = [
            line((0.0, 0.0), (3.0, 0.0), 0, 0),
            line((3.1, 0.0), (6.0, 0.0), 0, 0),
        ]
        .into_iter()
        .collect();

        let pass = run(&map, &cloud, 0.2);
        assert_eq!(pass.merges, 1);
        assert_eq!(pass.primitives.len(), 1);
        assert_eq!(pass.primitives.at(0, 0).unwrap().sources(), &[0]);
    }

    #[test]
    fn keep_both_reports_merge_but_preserves_everything() {
        let mut points = Vec::new();
        sample(&mut points, (0.0, 0.0), (5.0, 0.0), 0);
        sample(&mut points, (5.05, 0.0), (10.0, 0.0), 1);
        let cloud = PointCloud::new(points);
        let map: PrimitiveMap = [
            line((0.0, 0.0), (5.0, 0.0), 0, 4),
            line((5.05, 0.0), (10.0, 0.0), 1, 4),
        ]
        .into_iter()
        .collect();

        let pass = PatchMerger::new(0.2, AdjacencyDecider::new(0.2), &KeepBoth)
            .execute(&map, &cloud)
            .unwrap();
        assert!(pass.changed());
        assert_eq!(pass.primitives.len(), 2);
        assert_eq!(pass.primitives.at(1, 0), map.at(1, 0));
    }

    #[test]
    fn unpopulated_primitive_uses_global_extent() {
        // Patch 1 owns no points, so its extent comes from every nearby point.
        let mut points = Vec::new();
        sample(&mut points, (0.0, 0.0), (5.0, 0.0), 0);
        let cloud = PointCloud::new(points);
        let map: PrimitiveMap = [
            line((0.0, 0.0), (5.0, 0.0), 0, 0),
            line((0.0, 0.0), (1.0, 0.0), 1, 1),
        ]
        .into_iter()
        .collect();

        let pass = run(&map, &cloud, 0.2);
        assert_eq!(pass.merges, 1);
    }

    fn arb_scene() -> impl Strategy<Value = (PrimitiveMap, PointCloud)> {
        prop::collection::vec(
            (0..4i32, 0..3i32, -10.0..10.0f64, -10.0..10.0f64, 0.5..6.0f64, 0..8u8),
            1..10,
        )
        .prop_map(|segments| {
            let mut points = Vec::new();
            let mut map = PrimitiveMap::new();
            for (gid, dir_gid, x, y, len, heading) in segments {
                let angle = f64::from(heading) * std::f64::consts::FRAC_PI_4;
                let to = (x + len * angle.cos(), y + len * angle.sin());
                sample(&mut points, (x, y), to, gid);
                map.insert(line((x, y), to, gid, dir_gid));
            }
            (map, PointCloud::new(points))
        })
    }

    proptest! {
        #[test]
        fn every_input_is_accounted_for_once(scene in arb_scene()) {
            let (map, cloud) = scene;
            let pass = PatchMerger::new(0.3, AdjacencyDecider::new(0.3), &KeepBoth)
                .execute(&map, &cloud)
                .unwrap();
            // KeepBoth re-emits exactly the inputs, so coverage is visible
            // as multiset equality.
            let mut before: Vec<String> = map.iter().map(|(_, _, _, p)| format!("{p:?}")).collect();
            let mut after: Vec<String> =
                pass.primitives.iter().map(|(_, _, _, p)| format!("{p:?}")).collect();
            before.sort();
            after.sort();
            prop_assert_eq!(before, after);

            let fused = PatchMerger::new(0.3, AdjacencyDecider::new(0.3), &SpanningSegment)
                .execute(&map, &cloud)
                .unwrap();
            prop_assert_eq!(fused.primitives.len() + fused.merges, map.len());
        }
    }

    #[test]
    fn direction_vectors_survive_pass_through() {
        let cloud = PointCloud::new(vec![]);
        let map: PrimitiveMap = [LinePrimitive::new(Point3::origin(), Vector3::y(), 3, 3).unwrap()]
            .into_iter()
            .collect();
        let pass = run(&map, &cloud, 0.1);
        assert_eq!(pass.primitives.at(3, 0), map.at(3, 0));
    }
}
