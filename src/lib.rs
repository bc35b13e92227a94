pub mod error;
pub mod geometry;
pub mod math;
pub mod operations;
pub mod params;
pub mod patch;

pub use error::{PatchMergeError, Result};
pub use geometry::{Extrema, Gid, LinePrimitive, PointPrimitive, ORPHAN_GID, UNSET_GID};
pub use operations::adopt::{AdoptionReport, OrphanAdopter};
pub use operations::merge::{
    AdjacencyDecider, AdjacencyVerdict, Contribution, KeepBoth, MergeDriver, MergeOutcome, MergePass,
    PairFusion, PatchMerger, SpanningSegment,
};
pub use operations::query::{
    ExtentEstimator, PointLineDistance, PointPrimitiveDistance, Population,
};
pub use params::{AdoptMode, MergeParams};
pub use patch::{PointCloud, PrimitiveId, PrimitiveMap};
