//! Leaf geometry: a coloured rectangle or a textured image.

use std::sync::Arc;

use crate::color::Color;
use crate::effect::Effect;
use crate::geom::{Matrix, Rect};
use crate::texture::Texture;

use super::vertex_data::VertexData;

/// Four vertices laid out top-left, top-right, bottom-left, bottom-right, plus the
/// texture and custom effect they are drawn with.
#[derive(Clone, Debug)]
pub struct Quad {
    vertex_data: VertexData,
    texture: Option<Texture>,
    effect: Option<Arc<Effect>>,
}

impl Quad {
    /// An untextured quad. Uses premultiplied alpha.
    pub fn new(width: f32, height: f32, color: Color) -> Self {
        let mut quad = Self {
            vertex_data: VertexData::new(4, true),
            texture: None,
            effect: None,
        };
        quad.set_size(width, height);
        quad.vertex_data.set_uniform_color(color);
        quad
    }

    /// A quad showing `texture` at its natural size.
    pub fn from_texture(texture: Texture) -> Self {
        let mut quad = Self {
            vertex_data: VertexData::new(4, texture.premultiplied_alpha()),
            texture: None,
            effect: None,
        };
        quad.set_size(texture.width(), texture.height());
        quad.set_texture(Some(texture));
        quad
    }

    fn set_size(&mut self, width: f32, height: f32) {
        self.vertex_data.set_position(0, 0.0, 0.0);
        self.vertex_data.set_position(1, width, 0.0);
        self.vertex_data.set_position(2, 0.0, height);
        self.vertex_data.set_position(3, width, height);
    }

    pub fn vertex_data(&self) -> &VertexData {
        &self.vertex_data
    }

    /// Colour of the first vertex.
    pub fn color(&self) -> Color {
        self.vertex_data.color(0)
    }

    pub fn set_color(&mut self, color: Color) {
        self.vertex_data.set_uniform_color(color);
    }

    pub fn vertex_color(&self, vertex: usize) -> Color {
        self.vertex_data.color(vertex)
    }

    pub fn set_vertex_color(&mut self, vertex: usize, color: Color) {
        self.vertex_data.set_color(vertex, color);
    }

    /// Alpha of the first vertex.
    pub fn alpha(&self) -> f32 {
        self.vertex_data.alpha(0)
    }

    pub fn set_alpha(&mut self, alpha: f32) {
        self.vertex_data.set_uniform_alpha(alpha);
    }

    pub fn vertex_alpha(&self, vertex: usize) -> f32 {
        self.vertex_data.alpha(vertex)
    }

    pub fn set_vertex_alpha(&mut self, vertex: usize, alpha: f32) {
        self.vertex_data.set_alpha(vertex, alpha);
    }

    pub fn texture(&self) -> Option<&Texture> {
        self.texture.as_ref()
    }

    /// Swap the texture, keeping the current size. Texture coordinates and the
    /// premultiplied-alpha convention follow the new texture.
    pub fn set_texture(&mut self, texture: Option<Texture>) {
        match &texture {
            Some(tex) => {
                for (vertex, (u, v)) in [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (1.0, 1.0)]
                    .into_iter()
                    .enumerate()
                {
                    let [s, t] = tex.tex_coords(u, v);
                    self.vertex_data.set_tex_coords(vertex, s, t);
                }
                self.vertex_data
                    .set_premultiplied_alpha(tex.premultiplied_alpha());
            }
            None => {
                for vertex in 0..4 {
                    self.vertex_data.set_tex_coords(vertex, 0.0, 0.0);
                }
            }
        }
        self.texture = texture;
    }

    /// Resize to the texture's natural size.
    pub fn readjust_size(&mut self) {
        if let Some((w, h)) = self.texture.as_ref().map(|t| (t.width(), t.height())) {
            self.set_size(w, h);
        }
    }

    pub fn effect(&self) -> Option<&Arc<Effect>> {
        self.effect.as_ref()
    }

    pub fn set_effect(&mut self, effect: Option<Arc<Effect>>) {
        self.effect = effect;
    }

    /// True if any vertex is not opaque white.
    pub fn tinted(&self) -> bool {
        self.vertex_data.is_tinted()
    }

    pub fn premultiplied_alpha(&self) -> bool {
        self.vertex_data.premultiplied_alpha()
    }

    /// Only meaningful for untextured quads; textured quads follow their texture.
    pub fn set_premultiplied_alpha(&mut self, premultiplied_alpha: bool) {
        self.vertex_data.set_premultiplied_alpha(premultiplied_alpha);
    }

    pub fn width(&self) -> f32 {
        self.bounds(None).width
    }

    pub fn height(&self) -> f32 {
        self.bounds(None).height
    }

    pub fn bounds(&self, matrix: Option<&Matrix>) -> Rect {
        self.vertex_data.bounds(matrix, 0, 4)
    }
}
