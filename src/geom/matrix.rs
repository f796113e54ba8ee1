use crate::error::{Error, Result};

use super::{Point, FLOAT_EPSILON};

/// A 2D affine transformation matrix.
///
/// ```text
/// | a  c  tx |
/// | b  d  ty |
/// | 0  0  1  |
/// ```
///
/// Points are transformed as `x' = a*x + c*y + tx`, `y' = b*x + d*y + ty`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Matrix {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub tx: f32,
    pub ty: f32,
}

impl Matrix {
    /// Identity matrix (no transformation)
    pub const IDENTITY: Self = Self::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);

    pub const fn new(a: f32, b: f32, c: f32, d: f32, tx: f32, ty: f32) -> Self {
        Self { a, b, c, d, tx, ty }
    }

    /// Create a translation matrix
    pub fn translation(x: f32, y: f32) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, x, y)
    }

    /// Create a non-uniform scale matrix
    pub fn scaling(sx: f32, sy: f32) -> Self {
        Self::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    /// Create a rotation matrix (radians)
    pub fn rotation(angle: f32) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self::new(cos, sin, -sin, cos, 0.0, 0.0)
    }

    pub fn set(&mut self, a: f32, b: f32, c: f32, d: f32, tx: f32, ty: f32) {
        *self = Self::new(a, b, c, d, tx, ty);
    }

    pub fn identity(&mut self) {
        *self = Self::IDENTITY;
    }

    pub fn is_identity(&self) -> bool {
        self.approx_eq(&Self::IDENTITY)
    }

    /// Component-wise equality within the crate's float epsilon.
    pub fn approx_eq(&self, other: &Matrix) -> bool {
        (self.a - other.a).abs() < FLOAT_EPSILON
            && (self.b - other.b).abs() < FLOAT_EPSILON
            && (self.c - other.c).abs() < FLOAT_EPSILON
            && (self.d - other.d).abs() < FLOAT_EPSILON
            && (self.tx - other.tx).abs() < FLOAT_EPSILON
            && (self.ty - other.ty).abs() < FLOAT_EPSILON
    }

    /// Post-multiply: the result first applies `self`, then `lhs`.
    pub fn append(&mut self, lhs: &Matrix) {
        self.set(
            lhs.a * self.a + lhs.c * self.b,
            lhs.b * self.a + lhs.d * self.b,
            lhs.a * self.c + lhs.c * self.d,
            lhs.b * self.c + lhs.d * self.d,
            lhs.a * self.tx + lhs.c * self.ty + lhs.tx,
            lhs.b * self.tx + lhs.d * self.ty + lhs.ty,
        );
    }

    /// Pre-multiply: the result first applies `rhs`, then `self`.
    ///
    /// This is how a parent matrix is combined with a child's local matrix.
    pub fn prepend(&mut self, rhs: &Matrix) {
        self.set(
            self.a * rhs.a + self.c * rhs.b,
            self.b * rhs.a + self.d * rhs.b,
            self.a * rhs.c + self.c * rhs.d,
            self.b * rhs.c + self.d * rhs.d,
            self.tx + self.a * rhs.tx + self.c * rhs.ty,
            self.ty + self.b * rhs.tx + self.d * rhs.ty,
        );
    }

    /// Copying variant of [`Matrix::append`].
    pub fn appended(&self, lhs: &Matrix) -> Matrix {
        let mut result = *self;
        result.append(lhs);
        result
    }

    /// Copying variant of [`Matrix::prepend`].
    pub fn prepended(&self, rhs: &Matrix) -> Matrix {
        let mut result = *self;
        result.prepend(rhs);
        result
    }

    pub fn translate_by(&mut self, dx: f32, dy: f32) {
        self.tx += dx;
        self.ty += dy;
    }

    pub fn scale_by(&mut self, sx: f32, sy: f32) {
        if sx != 1.0 {
            self.a *= sx;
            self.c *= sx;
            self.tx *= sx;
        }
        if sy != 1.0 {
            self.b *= sy;
            self.d *= sy;
            self.ty *= sy;
        }
    }

    pub fn scale_uniform(&mut self, scale: f32) {
        self.scale_by(scale, scale);
    }

    pub fn skew_by(&mut self, sx: f32, sy: f32) {
        let (sin_x, cos_x) = sx.sin_cos();
        let (sin_y, cos_y) = sy.sin_cos();
        self.set(
            self.a * cos_y - self.b * sin_x,
            self.a * sin_y + self.b * cos_x,
            self.c * cos_y - self.d * sin_x,
            self.c * sin_y + self.d * cos_x,
            self.tx * cos_y - self.ty * sin_x,
            self.tx * sin_y + self.ty * cos_x,
        );
    }

    pub fn rotate_by(&mut self, angle: f32) {
        if angle == 0.0 {
            return;
        }
        let (sin, cos) = angle.sin_cos();
        self.set(
            self.a * cos - self.b * sin,
            self.a * sin + self.b * cos,
            self.c * cos - self.d * sin,
            self.c * sin + self.d * cos,
            self.tx * cos - self.ty * sin,
            self.tx * sin + self.ty * cos,
        );
    }

    pub fn determinant(&self) -> f32 {
        self.a * self.d - self.c * self.b
    }

    /// A matrix is invertible unless its determinant is within epsilon of zero.
    pub fn is_invertible(&self) -> bool {
        self.determinant().abs() >= FLOAT_EPSILON
    }

    /// Invert in place.
    ///
    /// Fails with [`Error::InvalidOperation`] for a degenerate matrix; callers that
    /// cannot handle the error should check [`Matrix::is_invertible`] first.
    pub fn invert(&mut self) -> Result<()> {
        let det = self.determinant();
        if det.abs() < FLOAT_EPSILON {
            return Err(Error::InvalidOperation(format!(
                "cannot invert matrix with determinant {det}"
            )));
        }
        self.set(
            self.d / det,
            -self.b / det,
            -self.c / det,
            self.a / det,
            (self.c * self.ty - self.d * self.tx) / det,
            (self.b * self.tx - self.a * self.ty) / det,
        );
        Ok(())
    }

    /// Copying variant of [`Matrix::invert`].
    pub fn inverse(&self) -> Result<Matrix> {
        let mut result = *self;
        result.invert()?;
        Ok(result)
    }

    pub fn transform_point(&self, point: Point) -> Point {
        let (x, y) = self.transform_xy(point.x, point.y);
        Point::new(x, y)
    }

    #[inline]
    pub fn transform_xy(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.a * x + self.c * y + self.tx,
            self.b * x + self.d * y + self.ty,
        )
    }

    /// Column-major 4x4 matrix, the layout WGSL expects for `mat4x4<f32>` uniforms.
    pub fn to_mat4(&self) -> [[f32; 4]; 4] {
        [
            [self.a, self.b, 0.0, 0.0],
            [self.c, self.d, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [self.tx, self.ty, 0.0, 1.0],
        ]
    }

    /// Column-major 3x3 matrix.
    pub fn to_mat3(&self) -> [[f32; 3]; 3] {
        [
            [self.a, self.b, 0.0],
            [self.c, self.d, 0.0],
            [self.tx, self.ty, 1.0],
        ]
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}
