use crate::math::{Point3, Vector3};

use super::{Gid, UNSET_GID};

/// A cloud point with an optional direction and the id of the patch that
/// owns it.
#[derive(Debug, Clone, PartialEq)]
pub struct PointPrimitive {
    /// The 3D position of the point.
    pub position: Point3,
    /// Local direction estimate, when the upstream stage provides one.
    pub direction: Option<Vector3>,
    /// Owning patch id. Negative values are [`UNSET_GID`] or
    /// [`super::ORPHAN_GID`].
    pub gid: Gid,
}

impl PointPrimitive {
    /// Creates an unassigned point.
    #[must_use]
    pub fn new(position: Point3) -> Self {
        Self {
            position,
            direction: None,
            gid: UNSET_GID,
        }
    }

    /// Sets the owning patch id.
    #[must_use]
    pub fn with_gid(mut self, gid: Gid) -> Self {
        self.gid = gid;
        self
    }

    /// Sets the direction estimate.
    #[must_use]
    pub fn with_direction(mut self, direction: Vector3) -> Self {
        self.direction = Some(direction);
        self
    }

    /// Returns whether the point is owned by a real patch.
    #[must_use]
    pub fn is_assigned(&self) -> bool {
        self.gid >= 0
    }
}
