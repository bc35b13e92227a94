use crate::math::{Point3, TOLERANCE};

/// The two endpoints bounding the occupied part of a primitive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extrema {
    /// Endpoint with the smaller axial parameter.
    pub start: Point3,
    /// Endpoint with the larger axial parameter.
    pub end: Point3,
}

impl Extrema {
    /// Creates extrema from two endpoints.
    #[must_use]
    pub fn new(start: Point3, end: Point3) -> Self {
        Self { start, end }
    }

    /// Creates coincident extrema at `point`.
    #[must_use]
    pub fn degenerate(point: Point3) -> Self {
        Self {
            start: point,
            end: point,
        }
    }

    /// Returns the segment length.
    #[must_use]
    pub fn length(&self) -> f64 {
        (self.end - self.start).norm()
    }

    /// Returns whether both endpoints coincide.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.length() < TOLERANCE
    }

    /// Returns the segment midpoint.
    #[must_use]
    pub fn midpoint(&self) -> Point3 {
        nalgebra::center(&self.start, &self.end)
    }
}
