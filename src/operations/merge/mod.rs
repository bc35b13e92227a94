mod adjacency;
mod driver;
mod fusion;
mod patch_merge;

pub use adjacency::{AdjacencyDecider, AdjacencyVerdict};
pub use driver::{MergeDriver, MergeOutcome};
pub use fusion::{Contribution, KeepBoth, PairFusion, SpanningSegment};
pub use patch_merge::{MergePass, PatchMerger};
