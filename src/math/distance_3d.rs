use super::{Point3, Vector3, TOLERANCE};

/// Returns the distance from `point` to the infinite line through `origin`
/// with unit direction `direction`.
#[must_use]
pub fn point_to_line_dist(point: &Point3, origin: &Point3, direction: &Vector3) -> f64 {
    let to_point = point - origin;
    let along = to_point.dot(direction);
    (to_point - direction * along).norm()
}

/// Returns the minimum distance from `point` to the segment `a`→`b`.
#[must_use]
pub fn point_to_segment_dist(point: &Point3, a: &Point3, b: &Point3) -> f64 {
    let ab = b - a;
    let len_sq = ab.norm_squared();

    if len_sq < TOLERANCE * TOLERANCE {
        // Degenerate segment (zero length).
        return (point - a).norm();
    }

    // Project onto the carrier line, clamp to [0, 1].
    let t = ((point - a).dot(&ab) / len_sq).clamp(0.0, 1.0);
    (point - (a + ab * t)).norm()
}

/// Returns the smallest endpoint-to-segment distance between segments
/// `a0`→`a1` and `b0`→`b1`.
///
/// Exact for non-crossing coplanar segments. Crossing segments report the
/// endpoint gap rather than zero.
#[must_use]
pub fn segment_gap(a0: &Point3, a1: &Point3, b0: &Point3, b1: &Point3) -> f64 {
    point_to_segment_dist(b0, a0, a1)
        .min(point_to_segment_dist(b1, a0, a1))
        .min(point_to_segment_dist(a0, b0, b1))
        .min(point_to_segment_dist(a1, b0, b1))
}
