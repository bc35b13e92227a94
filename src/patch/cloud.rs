use std::ops::{Index, IndexMut};

use tracing::warn;

use crate::error::{Result, StoreError};
use crate::geometry::{Gid, PointPrimitive, ORPHAN_GID, UNSET_GID};

/// The point set shared by every pass of a merge run.
///
/// Points are never added or removed once the run starts; only their GID
/// tags change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointCloud {
    points: Vec<PointPrimitive>,
}

impl PointCloud {
    /// Creates a cloud from points.
    #[must_use]
    pub fn new(points: Vec<PointPrimitive>) -> Self {
        Self { points }
    }

    /// Returns the number of points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns whether the cloud holds no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Returns the point at `index`, or an error if out of range.
    ///
    /// # Errors
    ///
    /// Returns an error if `index` is past the end of the cloud.
    pub fn point(&self, index: usize) -> Result<&PointPrimitive> {
        self.points.get(index).ok_or_else(|| {
            StoreError::PointIndexOutOfRange {
                index,
                len: self.points.len(),
            }
            .into()
        })
    }

    /// Iterates the points in index order.
    pub fn iter(&self) -> std::slice::Iter<'_, PointPrimitive> {
        self.points.iter()
    }

    /// Returns the GID tag of every point, in index order.
    #[must_use]
    pub fn gids(&self) -> Vec<Gid> {
        self.points.iter().map(|p| p.gid).collect()
    }

    /// Stores one upstream association per point.
    ///
    /// Count mismatches are not fatal: points without an association become
    /// orphans and surplus associations are dropped, both with a warning.
    /// Returns the number of points that received an association.
    pub fn apply_associations(&mut self, gids: &[Gid]) -> usize {
        if gids.len() < self.points.len() {
            warn!(
                points = self.points.len(),
                associations = gids.len(),
                "more points than associations, marking the rest as orphans"
            );
        } else if gids.len() > self.points.len() {
            warn!(
                points = self.points.len(),
                associations = gids.len(),
                "more associations than points, ignoring the surplus"
            );
        }

        for (pid, point) in self.points.iter_mut().enumerate() {
            match gids.get(pid) {
                Some(&gid) => {
                    if gid == UNSET_GID {
                        warn!(pid, "point assigned to patch with id -1");
                    }
                    point.gid = gid;
                }
                None => point.gid = ORPHAN_GID,
            }
        }
        gids.len().min(self.points.len())
    }
}

impl Index<usize> for PointCloud {
    type Output = PointPrimitive;

    fn index(&self, index: usize) -> &Self::Output {
        &self.points[index]
    }
}

impl IndexMut<usize> for PointCloud {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.points[index]
    }
}

impl FromIterator<PointPrimitive> for PointCloud {
    fn from_iter<I: IntoIterator<Item = PointPrimitive>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a PointCloud {
    type Item = &'a PointPrimitive;
    type IntoIter = std::slice::Iter<'a, PointPrimitive>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}
