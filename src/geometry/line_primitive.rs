use crate::error::{GeometryError, Result};
use crate::math::distance_3d::point_to_line_dist;
use crate::math::{Point3, Vector3, TOLERANCE};

use super::Gid;

/// An oriented line primitive fitted to a patch.
///
/// The parametric form is `P(t) = origin + t * direction`. The in-plane
/// normal is `direction × plane_normal`, so a line lying in the XY plane with
/// the default `+Z` plane normal has its normal in the XY plane as well.
#[derive(Debug, Clone, PartialEq)]
pub struct LinePrimitive {
    origin: Point3,
    direction: Vector3,
    plane_normal: Vector3,
    gid: Gid,
    dir_gid: Gid,
    sources: Vec<Gid>,
}

impl LinePrimitive {
    /// Creates a new primitive from an anchor and a direction, with the
    /// `+Z` axis as plane normal.
    ///
    /// # Errors
    ///
    /// Returns an error if the direction is zero-length or parallel to `+Z`.
    pub fn new(origin: Point3, direction: Vector3, gid: Gid, dir_gid: Gid) -> Result<Self> {
        Self::with_plane_normal(origin, direction, Vector3::z(), gid, dir_gid)
    }

    /// Creates a new primitive whose normal is taken within the plane
    /// orthogonal to `plane_normal`.
    ///
    /// # Errors
    ///
    /// Returns an error if any input is non-finite, if either vector is
    /// zero-length, or if the direction is parallel to the plane normal.
    pub fn with_plane_normal(
        origin: Point3,
        direction: Vector3,
        plane_normal: Vector3,
        gid: Gid,
        dir_gid: Gid,
    ) -> Result<Self> {
        let mut coordinates = origin
            .coords
            .iter()
            .chain(direction.iter())
            .chain(plane_normal.iter());
        if !coordinates.all(|c| c.is_finite()) {
            return Err(
                GeometryError::Degenerate("line has a non-finite coordinate".to_owned()).into(),
            );
        }
        let len = direction.norm();
        let plane_len = plane_normal.norm();
        if len < TOLERANCE || plane_len < TOLERANCE {
            return Err(GeometryError::ZeroVector.into());
        }
        let direction = direction / len;
        let plane_normal = plane_normal / plane_len;
        if direction.cross(&plane_normal).norm() < TOLERANCE {
            return Err(GeometryError::Degenerate(
                "line direction is parallel to its plane normal".to_owned(),
            )
            .into());
        }
        Ok(Self {
            origin,
            direction,
            plane_normal,
            gid,
            dir_gid,
            sources: vec![gid],
        })
    }

    /// Creates a primitive through two points.
    ///
    /// # Errors
    ///
    /// Returns an error if the points coincide.
    pub fn through(start: Point3, end: Point3, gid: Gid, dir_gid: Gid) -> Result<Self> {
        Self::new(start, end - start, gid, dir_gid)
    }

    /// Returns the anchor point.
    #[must_use]
    pub fn origin(&self) -> &Point3 {
        &self.origin
    }

    /// Returns the unit direction.
    #[must_use]
    pub fn direction(&self) -> &Vector3 {
        &self.direction
    }

    /// Returns the unit plane normal used to derive [`Self::normal`].
    #[must_use]
    pub fn plane_normal(&self) -> &Vector3 {
        &self.plane_normal
    }

    /// Returns the unit normal of the line within its plane.
    #[must_use]
    pub fn normal(&self) -> Vector3 {
        self.direction.cross(&self.plane_normal).normalize()
    }

    /// Returns the patch id.
    #[must_use]
    pub fn gid(&self) -> Gid {
        self.gid
    }

    /// Returns the direction-group id.
    #[must_use]
    pub fn dir_gid(&self) -> Gid {
        self.dir_gid
    }

    /// Returns the GIDs whose points this primitive explains, ascending.
    ///
    /// A fresh primitive explains only its own GID. A fused primitive carries
    /// the sources of everything folded into it.
    #[must_use]
    pub fn sources(&self) -> &[Gid] {
        &self.sources
    }

    /// Replaces the source list. The list is sorted and deduplicated, and
    /// always contains the primitive's own GID.
    #[must_use]
    pub fn with_sources(mut self, sources: impl IntoIterator<Item = Gid>) -> Self {
        self.sources = sources.into_iter().chain([self.gid]).collect();
        self.sources.sort_unstable();
        self.sources.dedup();
        self
    }

    /// Evaluates the line at parameter `t`.
    #[must_use]
    pub fn point_at(&self, t: f64) -> Point3 {
        self.origin + self.direction * t
    }

    /// Returns the signed axial parameter of `point`'s projection.
    #[must_use]
    pub fn project(&self, point: &Point3) -> f64 {
        (point - self.origin).dot(&self.direction)
    }

    /// Returns the distance from `point` to the infinite line.
    #[must_use]
    pub fn distance_to(&self, point: &Point3) -> f64 {
        point_to_line_dist(point, &self.origin, &self.direction)
    }
}
