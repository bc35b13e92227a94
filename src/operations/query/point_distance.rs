use crate::geometry::{LinePrimitive, PointPrimitive};

/// Distance from a point to a primitive, used to decide whether the
/// primitive explains the point.
///
/// Any `Fn(&PointPrimitive, &LinePrimitive) -> f64` closure is a strategy.
pub trait PointPrimitiveDistance {
    /// Returns the distance from `point` to `primitive`.
    fn eval(&self, point: &PointPrimitive, primitive: &LinePrimitive) -> f64;
}

/// Orthogonal distance from the point to the primitive's infinite line.
#[derive(Debug, Clone, Copy, Default)]
pub struct PointLineDistance;

impl PointPrimitiveDistance for PointLineDistance {
    fn eval(&self, point: &PointPrimitive, primitive: &LinePrimitive) -> f64 {
        primitive.distance_to(&point.position)
    }
}

impl<F> PointPrimitiveDistance for F
where
    F: Fn(&PointPrimitive, &LinePrimitive) -> f64,
{
    fn eval(&self, point: &PointPrimitive, primitive: &LinePrimitive) -> f64 {
        self(point, primitive)
    }
}
