//! Geometry value types: points, affine matrices and rectangles.

mod matrix;
mod point;
mod rect;

pub use matrix::Matrix;
pub use point::Point;
pub use rect::Rect;

/// Tolerance used for float equality and for the degenerate-matrix test.
pub const FLOAT_EPSILON: f32 = 1e-4;
