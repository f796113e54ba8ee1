use std::ops::{Add, Mul, Neg, Sub};

use super::FLOAT_EPSILON;

/// A 2D point or vector.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ORIGIN: Point = Point::new(0.0, 0.0);

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Create a point at `length` along the given angle (radians).
    pub fn polar(length: f32, angle: f32) -> Self {
        Self::new(angle.cos() * length, angle.sin() * length)
    }

    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    pub fn length_squared(self) -> f32 {
        self.x * self.x + self.y * self.y
    }

    /// Angle of the vector relative to the positive x axis, in radians.
    pub fn angle(self) -> f32 {
        self.y.atan2(self.x)
    }

    pub fn dot(self, other: Point) -> f32 {
        self.x * other.x + self.y * other.y
    }

    pub fn scale(self, factor: f32) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }

    /// Rotate around the origin by `angle` radians.
    pub fn rotate(self, angle: f32) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self::new(self.x * cos - self.y * sin, self.x * sin + self.y * cos)
    }

    /// Unit vector in the same direction. The zero vector stays zero.
    pub fn normalize(self) -> Self {
        let length = self.length();
        if length == 0.0 {
            return self;
        }
        self.scale(1.0 / length)
    }

    pub fn distance(self, other: Point) -> f32 {
        (self - other).length()
    }

    /// Angle between two vectors, in radians.
    pub fn angle_between(self, other: Point) -> f32 {
        let cos = self.dot(other) / (self.length() * other.length());
        if cos >= 1.0 {
            0.0
        } else {
            cos.acos()
        }
    }

    /// Linear interpolation; `ratio` 0 yields `self`, 1 yields `other`.
    pub fn lerp(self, other: Point, ratio: f32) -> Self {
        Self::new(
            self.x + (other.x - self.x) * ratio,
            self.y + (other.y - self.y) * ratio,
        )
    }

    pub fn is_origin(self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }

    pub fn approx_eq(self, other: Point) -> bool {
        (self.x - other.x).abs() < FLOAT_EPSILON && (self.y - other.y).abs() < FLOAT_EPSILON
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Neg for Point {
    type Output = Point;

    fn neg(self) -> Point {
        Point::new(-self.x, -self.y)
    }
}

impl Mul<f32> for Point {
    type Output = Point;

    fn mul(self, rhs: f32) -> Point {
        self.scale(rhs)
    }
}

impl From<(f32, f32)> for Point {
    fn from((x, y): (f32, f32)) -> Self {
        Self::new(x, y)
    }
}
