use crate::error::Result;
use crate::geometry::{Extrema, LinePrimitive};
use crate::math::{Point3, TOLERANCE};

/// A primitive taking part in a merge, with the extent measured this pass.
#[derive(Debug, Clone, Copy)]
pub struct Contribution<'a> {
    pub primitive: &'a LinePrimitive,
    pub extrema: &'a Extrema,
}

/// Turns an adjacent pair into the primitives emitted in its place.
///
/// Whatever is emitted must keep both inputs' sources reachable so the next
/// pass can rebuild populations and extents.
pub trait PairFusion {
    /// Fuses `reference` with `candidate`.
    ///
    /// # Errors
    ///
    /// Returns an error if the fused geometry is degenerate.
    fn fuse(
        &self,
        reference: Contribution<'_>,
        candidate: Contribution<'_>,
    ) -> Result<Vec<LinePrimitive>>;
}

/// Emits both primitives unchanged.
///
/// Every pass that finds an adjacent pair reports a merge, so a driver using
/// this policy only stops at its pass cap unless nothing is adjacent.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeepBoth;

impl PairFusion for KeepBoth {
    fn fuse(
        &self,
        reference: Contribution<'_>,
        candidate: Contribution<'_>,
    ) -> Result<Vec<LinePrimitive>> {
        Ok(vec![reference.primitive.clone(), candidate.primitive.clone()])
    }
}

/// Replaces the pair with one representative line under the reference's
/// tags.
///
/// The line passes through the length-weighted mean of both extent
/// midpoints. Its direction is the reference's when both share a direction
/// group, and the length-weighted mean direction otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpanningSegment;

impl PairFusion for SpanningSegment {
    fn fuse(
        &self,
        reference: Contribution<'_>,
        candidate: Contribution<'_>,
    ) -> Result<Vec<LinePrimitive>> {
        let r = reference.primitive;
        let c = candidate.primitive;

        let (mut w0, mut w1) = (reference.extrema.length(), candidate.extrema.length());
        if w0 + w1 < TOLERANCE {
            w0 = 1.0;
            w1 = 1.0;
        }

        let d0 = *r.direction();
        let d1 = if d0.dot(c.direction()) < 0.0 {
            -c.direction()
        } else {
            *c.direction()
        };
        let mean = d0 * w0 + d1 * w1;
        let direction = if r.dir_gid() == c.dir_gid() || mean.norm() < TOLERANCE {
            d0
        } else {
            mean
        };

        let anchor = Point3::from(
            (reference.extrema.midpoint().coords * w0 + candidate.extrema.midpoint().coords * w1)
                / (w0 + w1),
        );

        let fused = LinePrimitive::with_plane_normal(
            anchor,
            direction,
            *r.plane_normal(),
            r.gid(),
            r.dir_gid(),
        )?
        .with_sources(r.sources().iter().chain(c.sources()).copied());

        Ok(vec![fused])
    }
}
