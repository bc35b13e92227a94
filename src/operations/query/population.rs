use std::collections::BTreeMap;

use crate::geometry::Gid;
use crate::patch::PointCloud;

/// Point indices grouped by the GID they currently carry.
///
/// Only non-negative GIDs are indexed; unset and orphaned points belong to no
/// population. Indices within a population are ascending.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Population {
    members: BTreeMap<Gid, Vec<usize>>,
}

impl Population {
    /// Builds the population index from the cloud's current GID tags.
    #[must_use]
    pub fn from_cloud(cloud: &PointCloud) -> Self {
        let mut members: BTreeMap<Gid, Vec<usize>> = BTreeMap::new();
        for (pid, point) in cloud.iter().enumerate() {
            if point.is_assigned() {
                members.entry(point.gid).or_default().push(pid);
            }
        }
        Self { members }
    }

    /// Returns the points assigned to `gid`.
    #[must_use]
    pub fn get(&self, gid: Gid) -> &[usize] {
        self.members.get(&gid).map_or(&[], Vec::as_slice)
    }

    /// Returns the ascending union of the populations of `gids`.
    #[must_use]
    pub fn gather(&self, gids: &[Gid]) -> Vec<usize> {
        let mut merged: Vec<usize> = gids.iter().flat_map(|&gid| self.get(gid)).copied().collect();
        merged.sort_unstable();
        merged.dedup();
        merged
    }

    /// Iterates `(gid, indices)` in ascending GID order.
    pub fn iter(&self) -> impl Iterator<Item = (Gid, &[usize])> + '_ {
        self.members.iter().map(|(&gid, pids)| (gid, pids.as_slice()))
    }

    /// Returns the number of populated GIDs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns whether no GID has any point.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}
