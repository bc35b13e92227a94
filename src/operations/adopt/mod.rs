use std::collections::{BTreeSet, VecDeque};

use tracing::{debug, info, warn};

use crate::error::Result;
use crate::geometry::{Gid, ORPHAN_GID};
use crate::operations::query::PointPrimitiveDistance;
use crate::params::AdoptMode;
use crate::patch::{PointCloud, PrimitiveMap};

/// Summary of an adoption run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdoptionReport {
    /// Points found without a live patch.
    pub orphans: usize,
    /// Orphans given a new GID.
    pub adopted: usize,
    /// Orphans still tagged [`ORPHAN_GID`], ascending.
    pub unresolved: Vec<usize>,
    /// Iterations of the main loop.
    pub iterations: usize,
}

/// Re-assigns points whose patch no longer exists to primitives that
/// explain them.
///
/// The first iteration adopts every orphan explained by exactly one
/// primitive. Under [`AdoptMode::Proximity`] the following iterations
/// repeatedly adopt the orphan closest to an already assigned point, provided
/// that point's primitive explains it too. A primitive explains a point when
/// the distance strategy puts them less than `scale` apart.
pub struct OrphanAdopter<'a> {
    scale: f64,
    mode: AdoptMode,
    distance: &'a dyn PointPrimitiveDistance,
}

impl<'a> OrphanAdopter<'a> {
    /// Creates a new `OrphanAdopter` operation.
    #[must_use]
    pub fn new(scale: f64, mode: AdoptMode, distance: &'a dyn PointPrimitiveDistance) -> Self {
        Self {
            scale,
            mode,
            distance,
        }
    }

    /// Executes adoption, rewriting orphan GIDs in place.
    ///
    /// # Errors
    ///
    /// Returns an error if a primitive referenced by the map cannot be
    /// resolved.
    pub fn execute(&self, cloud: &mut PointCloud, primitives: &PrimitiveMap) -> Result<AdoptionReport> {
        let mut queue: VecDeque<usize> = VecDeque::new();
        for pid in 0..cloud.len() {
            if !primitives.has_patch(cloud[pid].gid) {
                cloud[pid].gid = ORPHAN_GID;
                queue.push_back(pid);
            }
        }
        let orphans = queue.len();
        info!(orphans, "selected unassigned points");

        let mut warned: BTreeSet<Gid> = BTreeSet::new();
        let mut adopted = 0;
        let mut iteration = 0;
        while !queue.is_empty() {
            let changed = if iteration == 0 {
                self.adopt_unambiguous(cloud, primitives, &mut queue)?
            } else if self.mode == AdoptMode::Proximity {
                self.adopt_by_proximity(cloud, primitives, &mut queue, &mut warned)?
            } else {
                0
            };
            iteration += 1;
            adopted += changed;
            info!(iteration, changed, remaining = queue.len(), "adoption iteration");

            // The proximity phase gets one chance even after a fruitless
            // first iteration.
            let proximity_pending = iteration == 1 && self.mode == AdoptMode::Proximity;
            if changed == 0 && !proximity_pending {
                break;
            }
        }

        let mut unresolved: Vec<usize> = queue.into_iter().collect();
        unresolved.sort_unstable();
        Ok(AdoptionReport {
            orphans,
            adopted,
            unresolved,
            iterations: iteration,
        })
    }

    /// Adopts every queued orphan that exactly one primitive explains.
    fn adopt_unambiguous(
        &self,
        cloud: &mut PointCloud,
        primitives: &PrimitiveMap,
        queue: &mut VecDeque<usize>,
    ) -> Result<usize> {
        let mut adopted = 0;
        let mut remaining = VecDeque::with_capacity(queue.len());

        for pid in queue.drain(..) {
            let point = cloud.point(pid)?;
            let adopters: Vec<(Gid, usize)> = primitives
                .iter()
                .filter(|(_, _, _, primitive)| self.distance.eval(point, primitive) < self.scale)
                .map(|(gid, lid, _, _)| (gid, lid))
                .collect();

            match adopters.as_slice() {
                [] => {
                    warn!(pid, "point seems to be an outlier, no primitive could adopt it");
                    remaining.push_back(pid);
                }
                [(gid, lid)] => {
                    debug!(pid, gid, lid, "adopting unambiguous orphan");
                    cloud[pid].gid = *gid;
                    adopted += 1;
                }
                _ => remaining.push_back(pid),
            }
        }

        *queue = remaining;
        Ok(adopted)
    }

    /// Repeatedly adopts the orphan closest to an assigned point whose
    /// primitive explains it, until no such pair remains.
    fn adopt_by_proximity(
        &self,
        cloud: &mut PointCloud,
        primitives: &PrimitiveMap,
        queue: &mut VecDeque<usize>,
        warned: &mut BTreeSet<Gid>,
    ) -> Result<usize> {
        let mut adopted = 0;

        while !queue.is_empty() {
            // (queue position, adopting gid, distance)
            let mut closest: Option<(usize, Gid, f64)> = None;

            for (slot, &pid) in queue.iter().enumerate() {
                let orphan = cloud.point(pid)?;
                for (pid2, other) in cloud.iter().enumerate() {
                    if pid2 == pid || !other.is_assigned() {
                        continue;
                    }
                    let dist = (orphan.position - other.position).norm();
                    if closest.is_some_and(|(_, _, best)| dist >= best) {
                        continue;
                    }
                    let Some(primitive) = primitives.at(other.gid, 0) else {
                        continue;
                    };
                    if self.distance.eval(orphan, primitive) >= self.scale {
                        continue;
                    }
                    if primitives.patch(other.gid).len() > 1 && warned.insert(other.gid) {
                        warn!(
                            gid = other.gid,
                            "patch has several primitives, adopting by its first one"
                        );
                    }
                    closest = Some((slot, other.gid, dist));
                }
            }

            let Some((slot, gid, dist)) = closest else {
                break;
            };
            if let Some(pid) = queue.remove(slot) {
                debug!(pid, gid, dist, remaining = queue.len(), "adopting closest orphan");
                cloud[pid].gid = gid;
                adopted += 1;
            }
        }

        Ok(adopted)
    }
}
