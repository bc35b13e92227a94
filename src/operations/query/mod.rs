mod extent;
mod point_distance;
mod population;

pub use extent::ExtentEstimator;
pub use point_distance::{PointLineDistance, PointPrimitiveDistance};
pub use population::Population;
