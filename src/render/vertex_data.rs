//! Growable vertex storage with premultiplied-alpha bookkeeping.
//!
//! Every vertex keeps a straight (non-premultiplied) copy of its colour and alpha
//! next to the GPU-facing [`Vertex`]. Colour and alpha edits always recompute the
//! GPU channels from that copy, so alpha can be changed any number of times without
//! losing colour precision, and [`VertexData::color`] always returns the colour that
//! was set.

use crate::color::Color;
use crate::geom::{Matrix, Point, Rect};

use super::vertex::Vertex;

#[derive(Clone, Copy, Debug, PartialEq)]
struct StraightColor {
    color: Color,
    alpha: f32,
}

impl Default for StraightColor {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            alpha: 1.0,
        }
    }
}

impl StraightColor {
    fn encode(self, premultiplied_alpha: bool) -> [u8; 4] {
        let alpha = self.alpha.clamp(0.0, 1.0);
        let a = (alpha * 255.0).round() as u8;
        let Color { r, g, b } = self.color;
        if premultiplied_alpha {
            let scale = |c: u8| (c as f32 * alpha).round() as u8;
            [scale(r), scale(g), scale(b), a]
        } else {
            [r, g, b, a]
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct VertexData {
    vertices: Vec<Vertex>,
    straight: Vec<StraightColor>,
    premultiplied_alpha: bool,
}

impl VertexData {
    /// Vertices start at the origin, white and fully opaque.
    pub fn new(num_vertices: usize, premultiplied_alpha: bool) -> Self {
        let mut data = Self {
            vertices: Vec::new(),
            straight: Vec::new(),
            premultiplied_alpha,
        };
        data.set_num_vertices(num_vertices);
        data
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Grow or shrink to `count` vertices. Allocated storage is never released.
    pub fn set_num_vertices(&mut self, count: usize) {
        let white = StraightColor::default();
        let vertex = Vertex {
            color: white.encode(self.premultiplied_alpha),
            ..Vertex::default()
        };
        self.vertices.resize(count, vertex);
        self.straight.resize(count, white);
    }

    /// Make room for at least `additional` more vertices.
    pub fn reserve(&mut self, additional: usize) {
        self.vertices.reserve(additional);
        self.straight.reserve(additional);
    }

    pub fn capacity(&self) -> usize {
        self.vertices.capacity()
    }

    /// The GPU-facing vertices.
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn position(&self, index: usize) -> Point {
        let [x, y] = self.vertices[index].position;
        Point::new(x, y)
    }

    pub fn set_position(&mut self, index: usize, x: f32, y: f32) {
        self.vertices[index].position = [x, y];
    }

    pub fn tex_coords(&self, index: usize) -> Point {
        let [u, v] = self.vertices[index].tex_coords;
        Point::new(u, v)
    }

    pub fn set_tex_coords(&mut self, index: usize, u: f32, v: f32) {
        self.vertices[index].tex_coords = [u, v];
    }

    /// Straight colour of a vertex, as it was set.
    pub fn color(&self, index: usize) -> Color {
        self.straight[index].color
    }

    pub fn set_color(&mut self, index: usize, color: Color) {
        self.straight[index].color = color;
        self.sync(index);
    }

    pub fn alpha(&self, index: usize) -> f32 {
        self.straight[index].alpha
    }

    pub fn set_alpha(&mut self, index: usize, alpha: f32) {
        self.straight[index].alpha = alpha;
        self.sync(index);
    }

    pub fn set_color_and_alpha(&mut self, index: usize, color: Color, alpha: f32) {
        self.straight[index] = StraightColor { color, alpha };
        self.sync(index);
    }

    /// The colour channels as stored for the GPU: `channel * alpha` when
    /// premultiplied, the raw channel otherwise.
    pub fn stored_color(&self, index: usize) -> Color {
        let [r, g, b, _] = self.vertices[index].color;
        Color::rgb(r, g, b)
    }

    pub fn set_uniform_color(&mut self, color: Color) {
        for index in 0..self.num_vertices() {
            self.set_color(index, color);
        }
    }

    pub fn set_uniform_alpha(&mut self, alpha: f32) {
        for index in 0..self.num_vertices() {
            self.set_alpha(index, alpha);
        }
    }

    /// Multiply the alpha of `count` vertices starting at `start`.
    pub fn scale_alpha(&mut self, factor: f32, start: usize, count: usize) {
        if factor == 1.0 {
            return;
        }
        for index in start..start + count {
            self.straight[index].alpha *= factor;
            self.sync(index);
        }
    }

    /// Transform the positions of `count` vertices starting at `start`.
    pub fn transform_vertices(&mut self, matrix: &Matrix, start: usize, count: usize) {
        for vertex in &mut self.vertices[start..start + count] {
            let (x, y) = matrix.transform_xy(vertex.position[0], vertex.position[1]);
            vertex.position = [x, y];
        }
    }

    /// Axis-aligned bounds of `count` vertices starting at `start`, optionally after
    /// transformation. An empty range yields an empty rectangle at the (transformed)
    /// origin.
    pub fn bounds(&self, matrix: Option<&Matrix>, start: usize, count: usize) -> Rect {
        let transform = |p: Point| match matrix {
            Some(m) => m.transform_point(p),
            None => p,
        };
        let points = self.vertices[start..start + count]
            .iter()
            .map(|v| transform(Point::new(v.position[0], v.position[1])));
        Rect::from_points(points).unwrap_or_else(|| {
            let origin = transform(Point::ORIGIN);
            Rect::new(origin.x, origin.y, 0.0, 0.0)
        })
    }

    /// Copy every vertex into `target`, starting at `target_index`.
    pub fn copy_to(&self, target: &mut VertexData, target_index: usize) {
        self.copy_range_to(0, self.num_vertices(), target, target_index, None);
    }

    /// Copy `count` vertices starting at `start` into `target`, optionally
    /// transforming positions on the way. Colours are re-encoded for the target's
    /// premultiplied-alpha setting. `target` must already hold enough vertices.
    pub fn copy_range_to(
        &self,
        start: usize,
        count: usize,
        target: &mut VertexData,
        target_index: usize,
        matrix: Option<&Matrix>,
    ) {
        debug_assert!(target_index + count <= target.num_vertices());
        let target_pma = target.premultiplied_alpha;
        for offset in 0..count {
            let source = &self.vertices[start + offset];
            let straight = self.straight[start + offset];
            let position = match matrix {
                Some(m) => {
                    let (x, y) = m.transform_xy(source.position[0], source.position[1]);
                    [x, y]
                }
                None => source.position,
            };
            let color = if target_pma == self.premultiplied_alpha {
                source.color
            } else {
                straight.encode(target_pma)
            };
            target.vertices[target_index + offset] = Vertex {
                position,
                tex_coords: source.tex_coords,
                color,
            };
            target.straight[target_index + offset] = straight;
        }
    }

    pub fn premultiplied_alpha(&self) -> bool {
        self.premultiplied_alpha
    }

    /// Switch the storage convention, re-encoding every vertex.
    pub fn set_premultiplied_alpha(&mut self, premultiplied_alpha: bool) {
        if self.premultiplied_alpha == premultiplied_alpha {
            return;
        }
        self.premultiplied_alpha = premultiplied_alpha;
        for index in 0..self.num_vertices() {
            self.sync(index);
        }
    }

    /// True if any vertex is not opaque white.
    pub fn is_tinted(&self) -> bool {
        self.straight
            .iter()
            .any(|s| s.color != Color::WHITE || s.alpha != 1.0)
    }

    /// Like [`VertexData::is_tinted`], restricted to a range.
    pub fn is_range_tinted(&self, start: usize, count: usize) -> bool {
        self.straight[start..start + count]
            .iter()
            .any(|s| s.color != Color::WHITE || s.alpha != 1.0)
    }

    fn sync(&mut self, index: usize) {
        self.vertices[index].color = self.straight[index].encode(self.premultiplied_alpha);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let data = VertexData::new(4, true);
        assert_eq!(data.num_vertices(), 4);
        assert_eq!(data.color(3), Color::WHITE);
        assert_eq!(data.alpha(3), 1.0);
        assert_eq!(data.vertices()[3].color, [255, 255, 255, 255]);
        assert!(!data.is_tinted());
    }

    #[test]
    fn test_premultiplied_color_then_alpha() {
        let mut data = VertexData::new(1, true);
        data.set_color(0, Color::rgb(200, 100, 50));
        data.set_alpha(0, 0.5);
        assert_eq!(data.stored_color(0), Color::rgb(100, 50, 25));
        assert_eq!(data.vertices()[0].color[3], 128);
        assert_eq!(data.color(0), Color::rgb(200, 100, 50));
        assert!(data.is_tinted());
    }

    #[test]
    fn test_straight_color_then_alpha() {
        let mut data = VertexData::new(1, false);
        data.set_color(0, Color::rgb(200, 100, 50));
        data.set_alpha(0, 0.5);
        assert_eq!(data.stored_color(0), Color::rgb(200, 100, 50));
        assert_eq!(data.color(0), Color::rgb(200, 100, 50));
    }

    #[test]
    fn test_repeated_alpha_edits_keep_precision() {
        let mut data = VertexData::new(1, true);
        data.set_color(0, Color::rgb(201, 99, 7));
        for alpha in [0.01, 0.3, 0.0, 0.77] {
            data.set_alpha(0, alpha);
        }
        data.set_alpha(0, 1.0);
        assert_eq!(data.stored_color(0), Color::rgb(201, 99, 7));
    }

    #[test]
    fn test_toggle_premultiplied_alpha() {
        let mut data = VertexData::new(1, false);
        data.set_color_and_alpha(0, Color::rgb(100, 100, 100), 0.5);
        data.set_premultiplied_alpha(true);
        assert_eq!(data.stored_color(0), Color::rgb(50, 50, 50));
        data.set_premultiplied_alpha(false);
        assert_eq!(data.stored_color(0), Color::rgb(100, 100, 100));
    }

    #[test]
    fn test_scale_alpha_range() {
        let mut data = VertexData::new(4, true);
        data.scale_alpha(0.5, 2, 2);
        assert_eq!(data.alpha(1), 1.0);
        assert_eq!(data.alpha(2), 0.5);
        assert!(data.is_range_tinted(2, 2));
        assert!(!data.is_range_tinted(0, 2));
    }

    #[test]
    fn test_transform_and_bounds() {
        let mut data = VertexData::new(4, true);
        data.set_position(1, 10.0, 0.0);
        data.set_position(2, 0.0, 20.0);
        data.set_position(3, 10.0, 20.0);
        assert_eq!(data.bounds(None, 0, 4), Rect::new(0.0, 0.0, 10.0, 20.0));

        let m = Matrix::translation(5.0, 5.0);
        assert_eq!(data.bounds(Some(&m), 0, 4), Rect::new(5.0, 5.0, 10.0, 20.0));

        data.transform_vertices(&Matrix::scaling(2.0, 1.0), 0, 4);
        assert_eq!(data.position(3), Point::new(20.0, 20.0));
        assert_eq!(data.bounds(Some(&m), 0, 0), Rect::new(5.0, 5.0, 0.0, 0.0));
    }

    #[test]
    fn test_copy_reencodes_for_target() {
        let mut source = VertexData::new(1, false);
        source.set_color_and_alpha(0, Color::rgb(200, 0, 0), 0.5);
        source.set_position(0, 1.0, 2.0);

        let mut target = VertexData::new(2, true);
        source.copy_range_to(0, 1, &mut target, 1, Some(&Matrix::translation(1.0, 1.0)));
        assert_eq!(target.position(1), Point::new(2.0, 3.0));
        assert_eq!(target.color(1), Color::rgb(200, 0, 0));
        assert_eq!(target.stored_color(1), Color::rgb(100, 0, 0));
        assert_eq!(target.color(0), Color::WHITE);
    }
}
