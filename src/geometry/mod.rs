mod extrema;
mod line_primitive;
mod point;

pub use extrema::Extrema;
pub use line_primitive::LinePrimitive;
pub use point::PointPrimitive;

/// Group id shared by a patch's primitives and the points they explain.
pub type Gid = i32;

/// GID of a point that was never assigned.
pub const UNSET_GID: Gid = -1;

/// GID of a point whose patch was dissolved, while it waits for adoption.
pub const ORPHAN_GID: Gid = -2;
