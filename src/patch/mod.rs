mod cloud;

pub use cloud::PointCloud;

use std::collections::BTreeMap;

use slotmap::SlotMap;

use crate::error::{OperationError, Result, StoreError};
use crate::geometry::{Gid, LinePrimitive};

slotmap::new_key_type! {
    /// Stable handle of a primitive inside a [`PrimitiveMap`].
    pub struct PrimitiveId;
}

/// Arena of line primitives grouped into patches by GID.
///
/// Patches are ordered handle lists keyed by GID. A primitive's position in
/// its patch is its local index (LID). Iteration visits GIDs in ascending
/// order and each patch in LID order, so any traversal is deterministic.
/// Empty patches are never stored.
#[derive(Debug, Clone, Default)]
pub struct PrimitiveMap {
    primitives: SlotMap<PrimitiveId, LinePrimitive>,
    patches: BTreeMap<Gid, Vec<PrimitiveId>>,
}

impl PrimitiveMap {
    /// Creates a new, empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a primitive to the patch named by its GID and returns its id.
    pub fn insert(&mut self, primitive: LinePrimitive) -> PrimitiveId {
        let gid = primitive.gid();
        let id = self.primitives.insert(primitive);
        self.patches.entry(gid).or_default().push(id);
        id
    }

    /// Returns a reference to the primitive, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the id does not belong to this map.
    pub fn get(&self, id: PrimitiveId) -> Result<&LinePrimitive> {
        self.primitives
            .get(id)
            .ok_or_else(|| StoreError::PrimitiveNotFound(format!("{id:?}")).into())
    }

    /// Returns the primitive at `(gid, lid)`, if present.
    #[must_use]
    pub fn at(&self, gid: Gid, lid: usize) -> Option<&LinePrimitive> {
        let id = *self.patches.get(&gid)?.get(lid)?;
        self.primitives.get(id)
    }

    /// Returns the ids of the patch `gid`, in LID order. Absent patches are
    /// empty.
    #[must_use]
    pub fn patch(&self, gid: Gid) -> &[PrimitiveId] {
        self.patches.get(&gid).map_or(&[], Vec::as_slice)
    }

    /// Returns whether `gid` names a non-empty patch.
    #[must_use]
    pub fn has_patch(&self, gid: Gid) -> bool {
        !self.patch(gid).is_empty()
    }

    /// Returns the patch GIDs in ascending order.
    pub fn gids(&self) -> impl Iterator<Item = Gid> + '_ {
        self.patches.keys().copied()
    }

    /// Iterates `(gid, lid, id, primitive)` in ascending GID then LID order.
    pub fn iter(&self) -> impl Iterator<Item = (Gid, usize, PrimitiveId, &LinePrimitive)> + '_ {
        self.patches.iter().flat_map(move |(&gid, ids)| {
            ids.iter()
                .enumerate()
                .filter_map(move |(lid, &id)| self.primitives.get(id).map(|p| (gid, lid, id, p)))
        })
    }

    /// Returns the total number of primitives.
    #[must_use]
    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    /// Returns whether the map holds no primitives.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    /// Returns the number of patches.
    #[must_use]
    pub fn patch_count(&self) -> usize {
        self.patches.len()
    }

    /// Applies `f` to every primitive in GID then LID order, stopping at the
    /// first error.
    ///
    /// The closure may move the primitive but must not change its GID: the
    /// patch layout is fixed. Updates are committed only once every primitive
    /// has been transformed, so the map is untouched when an error is returned.
    ///
    /// # Errors
    ///
    /// Returns the first error produced by `f`, or an error if `f` changed a
    /// primitive's GID.
    pub fn try_transform<F>(&mut self, mut f: F) -> Result<()>
    where
        F: FnMut(&mut LinePrimitive) -> Result<()>,
    {
        let mut updated = Vec::with_capacity(self.primitives.len());
        for (&gid, ids) in &self.patches {
            for &id in ids {
                let mut primitive = self.get(id)?.clone();
                f(&mut primitive)?;
                if primitive.gid() != gid {
                    return Err(OperationError::InvalidInput(format!(
                        "transform moved a primitive from patch {gid} to {}",
                        primitive.gid()
                    ))
                    .into());
                }
                updated.push((id, primitive));
            }
        }
        for (id, primitive) in updated {
            if let Some(slot) = self.primitives.get_mut(id) {
                *slot = primitive;
            }
        }
        Ok(())
    }
}

impl FromIterator<LinePrimitive> for PrimitiveMap {
    fn from_iter<I: IntoIterator<Item = LinePrimitive>>(iter: I) -> Self {
        let mut map = Self::new();
        for primitive in iter {
            map.insert(primitive);
        }
        map
    }
}
