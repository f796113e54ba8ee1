use bitflags::bitflags;

use crate::blend::BlendMode;
use crate::geom::Matrix;
use crate::render::{Quad, QuadBatch};

/// Unique identifier for a node in a [`DisplayTree`](super::DisplayTree).
///
/// Generational: a slot freed by `destroy` is reused with a new generation, so old
/// ids of that slot are detected as stale instead of aliasing the new node.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct NodeId {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl NodeId {
    /// Combines generation (high bits) with index (low bits).
    pub fn as_u64(self) -> u64 {
        ((self.generation as u64) << 32) | (self.index as u64)
    }
}

/// Properties every display object has.
#[derive(Clone, Debug, PartialEq)]
pub struct DisplayProps {
    pub x: f32,
    pub y: f32,
    /// Point in local coordinates that `x`/`y` refer to and that scaling and
    /// rotation happen around.
    pub pivot_x: f32,
    pub pivot_y: f32,
    pub scale_x: f32,
    pub scale_y: f32,
    /// Radians.
    pub skew_x: f32,
    pub skew_y: f32,
    /// Radians.
    pub rotation: f32,
    pub alpha: f32,
    pub blend_mode: BlendMode,
    pub visible: bool,
    pub name: Option<String>,
}

impl Default for DisplayProps {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            pivot_x: 0.0,
            pivot_y: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            skew_x: 0.0,
            skew_y: 0.0,
            rotation: 0.0,
            alpha: 1.0,
            blend_mode: BlendMode::Auto,
            visible: true,
            name: None,
        }
    }
}

impl DisplayProps {
    /// Matrix from local coordinates to the parent's coordinates.
    pub fn transformation_matrix(&self) -> Matrix {
        if self.skew_x == 0.0 && self.skew_y == 0.0 {
            if self.rotation == 0.0 {
                return Matrix::new(
                    self.scale_x,
                    0.0,
                    0.0,
                    self.scale_y,
                    self.x - self.pivot_x * self.scale_x,
                    self.y - self.pivot_y * self.scale_y,
                );
            }
            let (sin, cos) = self.rotation.sin_cos();
            let a = self.scale_x * cos;
            let b = self.scale_x * sin;
            let c = self.scale_y * -sin;
            let d = self.scale_y * cos;
            return Matrix::new(
                a,
                b,
                c,
                d,
                self.x - self.pivot_x * a - self.pivot_y * c,
                self.y - self.pivot_x * b - self.pivot_y * d,
            );
        }

        let mut m = Matrix::IDENTITY;
        m.scale_by(self.scale_x, self.scale_y);
        m.skew_by(self.skew_x, self.skew_y);
        m.rotate_by(self.rotation);
        m.translate_by(self.x, self.y);
        if self.pivot_x != 0.0 || self.pivot_y != 0.0 {
            m.tx = self.x - m.a * self.pivot_x - m.c * self.pivot_y;
            m.ty = self.y - m.b * self.pivot_x - m.d * self.pivot_y;
        }
        m
    }

    /// Visible, not fully transparent and not collapsed on either axis.
    pub fn has_visible_area(&self) -> bool {
        self.alpha != 0.0 && self.visible && self.scale_x != 0.0 && self.scale_y != 0.0
    }
}

bitflags! {
    /// Why a flattened container's cached batches went stale.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct Invalidation: u8 {
        /// Positions or transforms changed
        const GEOMETRY   = 0b001;
        /// Colours, alpha, textures, blend modes or effects changed
        const STATE      = 0b010;
        /// Children were added, removed or reordered
        const MEMBERSHIP = 0b100;
    }
}

/// Compiled batches of a flattened container, in the container's own coordinate
/// space.
#[derive(Debug)]
pub struct FlattenCache {
    pub(crate) batches: Vec<QuadBatch>,
    pub(crate) invalidation: Invalidation,
}

impl FlattenCache {
    pub(crate) fn new() -> Self {
        Self {
            batches: Vec::new(),
            invalidation: Invalidation::all(),
        }
    }

    pub fn batches(&self) -> &[QuadBatch] {
        &self.batches
    }

    pub fn is_valid(&self) -> bool {
        self.invalidation.is_empty()
    }

    pub fn invalidation(&self) -> Invalidation {
        self.invalidation
    }
}

/// A node that only groups other nodes.
#[derive(Debug, Default)]
pub struct Container {
    pub(crate) children: Vec<NodeId>,
    pub(crate) flattened: Option<FlattenCache>,
}

impl Container {
    /// Children in paint order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn flatten_cache(&self) -> Option<&FlattenCache> {
        self.flattened.as_ref()
    }
}

/// What a node draws.
#[derive(Debug)]
pub enum NodeKind {
    Container(Container),
    Quad(Quad),
    /// A prebuilt batch drawn as a unit.
    Batch(QuadBatch),
}

impl NodeKind {
    pub fn as_container(&self) -> Option<&Container> {
        match self {
            NodeKind::Container(container) => Some(container),
            _ => None,
        }
    }

    pub(crate) fn as_container_mut(&mut self) -> Option<&mut Container> {
        match self {
            NodeKind::Container(container) => Some(container),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Point;
    use std::f32::consts::FRAC_PI_2;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn test_default_is_identity() {
        let props = DisplayProps::default();
        assert!(props.transformation_matrix().is_identity());
        assert!(props.has_visible_area());
    }

    #[test]
    fn test_translate_scale_pivot() {
        let props = DisplayProps {
            x: 10.0,
            y: 20.0,
            pivot_x: 5.0,
            pivot_y: 5.0,
            scale_x: 2.0,
            scale_y: 2.0,
            ..Default::default()
        };
        let m = props.transformation_matrix();
        // the pivot lands on (x, y)
        assert_eq!(m.transform_point(Point::new(5.0, 5.0)), Point::new(10.0, 20.0));
        assert_eq!(m.transform_point(Point::new(6.0, 5.0)), Point::new(12.0, 20.0));
    }

    #[test]
    fn test_rotation_around_pivot() {
        let props = DisplayProps {
            pivot_x: 1.0,
            rotation: FRAC_PI_2,
            ..Default::default()
        };
        let p = props.transformation_matrix().transform_point(Point::new(2.0, 0.0));
        assert!(approx_eq(p.x, 0.0));
        assert!(approx_eq(p.y, 1.0));
    }

    #[test]
    fn test_skew_path_matches_fast_path_without_skew() {
        let props = DisplayProps {
            x: 3.0,
            y: -2.0,
            pivot_x: 4.0,
            pivot_y: 1.0,
            scale_x: 1.5,
            scale_y: 0.5,
            rotation: 0.3,
            ..Default::default()
        };
        let fast = props.transformation_matrix();
        let skewed = DisplayProps {
            skew_x: 1e-7,
            ..props
        }
        .transformation_matrix();
        assert!(fast.approx_eq(&skewed));
    }

    #[test]
    fn test_visible_area() {
        for props in [
            DisplayProps {
                alpha: 0.0,
                ..Default::default()
            },
            DisplayProps {
                visible: false,
                ..Default::default()
            },
            DisplayProps {
                scale_y: 0.0,
                ..Default::default()
            },
        ] {
            assert!(!props.has_visible_area());
        }
    }
}
