use tracing::debug;

use crate::geometry::{Extrema, LinePrimitive};
use crate::math::distance_3d::segment_gap;
use crate::params::MergeParams;

/// Outcome of an adjacency test, with both directional checks kept apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AdjacencyVerdict {
    /// The first primitive, as reference, accepts the second.
    pub forward: bool,
    /// The second primitive, as reference, accepts the first.
    pub backward: bool,
}

impl AdjacencyVerdict {
    /// Returns whether the pair should be merged.
    #[must_use]
    pub fn should_merge(&self) -> bool {
        self.forward || self.backward
    }

    /// Returns the verdict seen from the other primitive.
    #[must_use]
    pub fn swapped(self) -> Self {
        Self {
            forward: self.backward,
            backward: self.forward,
        }
    }
}

/// Decides whether two primitives are adjacent enough to merge.
///
/// Each primitive in turn acts as reference. A reference accepts the other
/// primitive when the two share a direction group, or when both of the
/// other's endpoints lie within `scale` of the reference's line. An accepting
/// reference additionally needs one of the other's endpoints to project onto
/// its own extent grown by `scale` at both ends.
#[derive(Debug, Clone, Copy)]
pub struct AdjacencyDecider {
    scale: f64,
    spatial_threshold: Option<f64>,
    parallel_limit: Option<f64>,
}

impl AdjacencyDecider {
    /// Creates a decider with only the directional tests enabled.
    #[must_use]
    pub fn new(scale: f64) -> Self {
        Self {
            scale,
            spatial_threshold: None,
            parallel_limit: None,
        }
    }

    /// Creates a decider with the gates configured in `params`.
    #[must_use]
    pub fn from_params(params: &MergeParams) -> Self {
        Self {
            scale: params.scale,
            spatial_threshold: params.spatial_threshold(),
            parallel_limit: params.parallel_limit,
        }
    }

    /// Evaluates both directions for the pair `a`, `b`.
    #[must_use]
    pub fn decide(
        &self,
        a: &LinePrimitive,
        a_extrema: &Extrema,
        b: &LinePrimitive,
        b_extrema: &Extrema,
    ) -> AdjacencyVerdict {
        let same_tag = a.dir_gid() == b.dir_gid();

        if !self.passes_gates(a, a_extrema, b, b_extrema, same_tag) {
            debug!(
                a = ?(a.gid(), a.dir_gid()),
                b = ?(b.gid(), b.dir_gid()),
                "pair rejected by pre-gate"
            );
            return AdjacencyVerdict::default();
        }

        let verdict = AdjacencyVerdict {
            forward: self.accepts(a, a_extrema, b_extrema, same_tag),
            backward: self.accepts(b, b_extrema, a_extrema, same_tag),
        };

        debug!(
            a = ?(a.gid(), a.dir_gid()),
            b = ?(b.gid(), b.dir_gid()),
            forward = verdict.forward,
            backward = verdict.backward,
            "adjacency tested"
        );
        verdict
    }

    /// Returns whether `reference` accepts a primitive occupying `other`.
    fn accepts(
        &self,
        reference: &LinePrimitive,
        ref_extrema: &Extrema,
        other: &Extrema,
        same_tag: bool,
    ) -> bool {
        let origin = ref_extrema.start;
        let normal = reference.normal();

        let in_slab = (normal.dot(&(other.start - origin))).abs() <= self.scale
            && (normal.dot(&(other.end - origin))).abs() <= self.scale;
        if !(same_tag || in_slab) {
            return false;
        }

        // Degenerate reference extent: parallel but unmatched.
        let axis = ref_extrema.end - ref_extrema.start;
        let length = axis.norm();
        if length < crate::math::TOLERANCE {
            return false;
        }
        let axis = axis / length;

        let reach = length + self.scale;
        let on_extent = |t: f64| t >= -self.scale && t <= reach;
        on_extent(axis.dot(&(other.start - origin))) || on_extent(axis.dot(&(other.end - origin)))
    }

    /// Optional symmetric pre-gates. Always passes when none is configured.
    fn passes_gates(
        &self,
        a: &LinePrimitive,
        a_extrema: &Extrema,
        b: &LinePrimitive,
        b_extrema: &Extrema,
        same_tag: bool,
    ) -> bool {
        if let Some(threshold) = self.spatial_threshold {
            let gap = segment_gap(&a_extrema.start, &a_extrema.end, &b_extrema.start, &b_extrema.end);
            if gap > threshold {
                return false;
            }
        }
        if let Some(limit) = self.parallel_limit {
            if !same_tag {
                let cos = a.direction().dot(b.direction()).abs().min(1.0);
                if cos.acos() > limit {
                    return false;
                }
            }
        }
        true
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::geometry::Gid;
    use crate::math::Point3;
    use proptest::prelude::*;

    fn segment(
        (x0, y0): (f64, f64),
        (x1, y1): (f64, f64),
        gid: Gid,
        dir_gid: Gid,
    ) -> (LinePrimitive, Extrema) {
        let start = Point3::new(x0, y0, 0.0);
        let end = Point3::new(x1, y1, 0.0);
        let line = LinePrimitive::through(start, end, gid, dir_gid).unwrap();
        (line, Extrema::new(start, end))
    }

    fn decide(scale: f64, a: &(LinePrimitive, Extrema), b: &(LinePrimitive, Extrema)) -> AdjacencyVerdict {
        AdjacencyDecider::new(scale).decide(&a.0, &a.1, &b.0, &b.1)
    }

    #[test]
    fn collinear_same_direction_group_merges() {
        let a = segment((0.0, 0.0), (5.0, 0.0), 0, 7);
        let b = segment((5.05, 0.0), (10.0, 0.0), 1, 7);
        let v = decide(0.2, &a, &b);
        assert!(v.should_merge());
        assert!(v.forward && v.backward);
    }

    #[test]
    fn offset_parallel_different_group_stays_apart() {
        let a = segment((0.0, 0.0), (5.0, 0.0), 0, 0);
        let b = segment((0.0, 1.0), (5.0, 1.0), 1, 1);
        assert!(!decide(0.2, &a, &b).should_merge());
    }

    #[test]
    fn offset_parallel_same_group_merges_when_overlapping() {
        // Shared direction group skips the slab test.
        let a = segment((0.0, 0.0), (5.0, 0.0), 0, 3);
        let b = segment((1.0, 1.0), (4.0, 1.0), 1, 3);
        assert!(decide(0.2, &a, &b).should_merge());
    }

    #[test]
    fn collinear_far_apart_does_not_merge() {
        let a = segment((0.0, 0.0), (5.0, 0.0), 0, 2);
        let b = segment((6.0, 0.0), (10.0, 0.0), 1, 2);
        assert!(!decide(0.2, &a, &b).should_merge());
    }

    #[test]
    fn near_parallel_within_slab_merges_across_groups() {
        let a = segment((0.0, 0.0), (5.0, 0.0), 0, 0);
        let b = segment((4.0, 0.05), (9.0, 0.1), 1, 1);
        assert!(decide(0.2, &a, &b).should_merge());
    }

    #[test]
    fn short_segment_only_accepted_one_way() {
        // The long segment's slab contains the short one, but the short one's
        // slab does not contain the long one's far endpoint.
        let a = segment((0.0, 0.0), (10.0, 0.0), 0, 0);
        let b = segment((4.0, 0.0), (5.0, 0.05), 1, 1);
        let v = decide(0.1, &a, &b);
        assert!(v.forward);
        assert!(!v.backward);
        assert!(v.should_merge());
    }

    #[test]
    fn degenerate_reference_fails_its_direction() {
        let (line, _) = segment((0.0, 0.0), (1.0, 0.0), 0, 0);
        let a = (line, Extrema::degenerate(Point3::new(2.0, 0.0, 0.0)));
        let b = segment((0.0, 0.0), (5.0, 0.0), 1, 0);
        let v = decide(0.2, &a, &b);
        assert!(!v.forward);
        assert!(v.backward);
    }

    #[test]
    fn spatial_gate_rejects_distant_same_group() {
        let a = segment((0.0, 0.0), (5.0, 0.0), 0, 3);
        let b = segment((1.0, 1.0), (4.0, 1.0), 1, 3);
        let params = MergeParams::new(0.2).with_spatial_threshold_mult(3.0);
        let decider = AdjacencyDecider::from_params(&params);
        assert!(!decider.decide(&a.0, &a.1, &b.0, &b.1).should_merge());
    }

    #[test]
    fn parallel_gate_rejects_skewed_pair() {
        let a = segment((0.0, 0.0), (5.0, 0.0), 0, 0);
        let b = segment((4.0, 0.0), (4.1, 0.15), 1, 1);
        assert!(decide(0.2, &a, &b).should_merge());
        let params = MergeParams::new(0.2).with_parallel_limit(0.1);
        let decider = AdjacencyDecider::from_params(&params);
        assert!(!decider.decide(&a.0, &a.1, &b.0, &b.1).should_merge());
    }

    fn arb_segment(gid: Gid) -> impl Strategy<Value = (LinePrimitive, Extrema)> {
        (
            -10.0..10.0f64,
            -10.0..10.0f64,
            0.1..8.0f64,
            -std::f64::consts::PI..std::f64::consts::PI,
            0..3i32,
        )
            .prop_map(move |(x, y, len, angle, dir_gid)| {
                segment((x, y), (x + len * angle.cos(), y + len * angle.sin()), gid, dir_gid)
            })
    }

    proptest! {
        #[test]
        fn decision_is_symmetric(
            a in arb_segment(0),
            b in arb_segment(1),
            scale in 0.01..2.0f64,
        ) {
            let ab = decide(scale, &a, &b);
            let ba = decide(scale, &b, &a);
            prop_assert_eq!(ab, ba.swapped());
            prop_assert_eq!(ab.should_merge(), ba.should_merge());
        }

        #[test]
        fn collinear_pairs_are_symmetric(
            x0 in -5.0..5.0f64,
            len0 in 0.5..5.0f64,
            gap in -0.4..3.0f64,
            len1 in 0.5..5.0f64,
            scale in 0.01..1.0f64,
        ) {
            let a = segment((x0, 0.0), (x0 + len0, 0.0), 0, 0);
            let start = x0 + len0 + gap;
            let b = segment((start, 0.0), (start + len1, 0.0), 1, 1);
            let ab = decide(scale, &a, &b).should_merge();
            prop_assert_eq!(ab, decide(scale, &b, &a).should_merge());
            if gap <= scale * 0.99 {
                prop_assert!(ab);
            }
        }
    }
}
