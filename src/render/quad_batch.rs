//! Quad batches: quads sharing one render state, drawn with a single indexed call.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::blend::BlendMode;
use crate::color::Color;
use crate::effect::{base_effect, DrawState, Effect, EffectBinding};
use crate::error::Result;
use crate::geom::{Matrix, Rect};
use crate::texture::Texture;

use super::quad::Quad;
use super::state::{self, BatchState};
use super::vertex::{Vertex, QUAD_INDICES};
use super::vertex_data::VertexData;

/// Most quads a batch can hold: four vertices per quad must stay addressable with
/// 16-bit indices.
pub const MAX_NUM_QUADS: usize = 16383;

/// Capacity a new batch starts with.
pub const DEFAULT_CAPACITY: usize = 16;

static NEXT_BATCH_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BatchId(u64);

/// Geometry of one batch as handed to [`EffectBinding::draw`].
///
/// `generation` changes whenever the batch content changes, so a binding can keep
/// uploaded buffers per [`BatchId`] and skip uploads while the generation is unchanged.
#[derive(Clone, Copy, Debug)]
pub struct BatchGeometry<'a> {
    pub batch: BatchId,
    pub generation: u64,
    pub vertices: &'a [Vertex],
    /// Exactly six indices per quad.
    pub indices: &'a [u16],
}

impl BatchGeometry<'_> {
    pub fn num_quads(&self) -> usize {
        self.indices.len() / QUAD_INDICES.len()
    }
}

/// An ordered list of quads sharing one render state.
///
/// The batch adopts the state of the first quad or batch added while it is empty.
/// Everything added afterwards must have the same state (check with
/// [`QuadBatch::is_state_change`]); this is only asserted in debug builds.
#[derive(Debug)]
pub struct QuadBatch {
    id: BatchId,
    generation: u64,
    num_quads: usize,
    capacity: usize,
    max_quads: usize,
    vertex_data: VertexData,
    indices: Vec<u16>,
    texture: Option<Texture>,
    effect: Option<Arc<Effect>>,
    tinted: bool,
    blend_mode: BlendMode,
}

impl Default for QuadBatch {
    fn default() -> Self {
        Self::new()
    }
}

impl QuadBatch {
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_CAPACITY, MAX_NUM_QUADS)
    }

    /// A batch with room for `capacity` quads that never holds more than
    /// `max_quads` (clamped to [`MAX_NUM_QUADS`]).
    pub fn with_limits(capacity: usize, max_quads: usize) -> Self {
        let mut batch = Self {
            id: BatchId(NEXT_BATCH_ID.fetch_add(1, Ordering::Relaxed)),
            generation: 0,
            num_quads: 0,
            capacity: 0,
            max_quads: max_quads.clamp(1, MAX_NUM_QUADS),
            vertex_data: VertexData::new(0, true),
            indices: Vec::new(),
            texture: None,
            effect: None,
            tinted: false,
            blend_mode: BlendMode::Auto,
        };
        batch.set_capacity(capacity);
        batch
    }

    pub fn id(&self) -> BatchId {
        self.id
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Remove every quad and forget the adopted state. Allocated storage is kept.
    pub fn reset(&mut self) {
        self.num_quads = 0;
        self.vertex_data.set_num_vertices(0);
        self.vertex_data.set_premultiplied_alpha(true);
        self.texture = None;
        self.effect = None;
        self.tinted = false;
        self.blend_mode = BlendMode::Auto;
        self.touch();
    }

    pub fn num_quads(&self) -> usize {
        self.num_quads
    }

    pub fn is_empty(&self) -> bool {
        self.num_quads == 0
    }

    pub fn max_quads(&self) -> usize {
        self.max_quads
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Resize storage for `capacity` quads, clamped between the current quad count
    /// and the batch maximum.
    pub fn set_capacity(&mut self, capacity: usize) {
        let capacity = capacity.clamp(self.num_quads, self.max_quads);
        if capacity > self.capacity {
            self.indices.reserve_exact((capacity - self.capacity) * QUAD_INDICES.len());
            for quad in self.capacity..capacity {
                let first = (quad * 4) as u16;
                self.indices.extend(QUAD_INDICES.iter().map(|i| first + i));
            }
            let vertices = capacity * 4;
            self.vertex_data
                .reserve(vertices.saturating_sub(self.vertex_data.num_vertices()));
        } else {
            self.indices.truncate(capacity * QUAD_INDICES.len());
        }
        self.capacity = capacity;
    }

    fn ensure_capacity(&mut self, required: usize) {
        debug_assert!(
            required <= self.max_quads,
            "batch capacity exceeded: {required} > {}",
            self.max_quads
        );
        if required > self.capacity {
            let grown = (self.capacity * 2).max(required).max(DEFAULT_CAPACITY);
            self.set_capacity(grown);
        }
    }

    fn touch(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    /// The adopted render state.
    pub fn state(&self) -> BatchState {
        BatchState::new(
            self.effect.as_ref().map(|e| e.id()),
            self.texture.as_ref(),
            self.tinted,
            1.0,
            self.vertex_data.premultiplied_alpha(),
            self.blend_mode,
        )
    }

    /// State a quad would have when added with `alpha` and `blend_mode`.
    pub fn quad_state(quad: &Quad, alpha: f32, blend_mode: BlendMode) -> BatchState {
        BatchState::new(
            quad.effect().map(|e| e.id()),
            quad.texture(),
            quad.tinted(),
            alpha,
            quad.premultiplied_alpha(),
            blend_mode,
        )
    }

    /// State another batch's content would have when added with `alpha` and
    /// `blend_mode`. `Auto` keeps the other batch's own blend mode.
    pub fn batch_state(batch: &QuadBatch, alpha: f32, blend_mode: BlendMode) -> BatchState {
        BatchState::new(
            batch.effect.as_ref().map(|e| e.id()),
            batch.texture.as_ref(),
            batch.tinted,
            alpha,
            batch.premultiplied_alpha(),
            blend_mode.inherit(batch.blend_mode),
        )
    }

    /// Whether `num_quads` more quads with the given state require a new batch.
    #[allow(clippy::too_many_arguments)]
    pub fn is_state_change(
        &self,
        effect: Option<&Arc<Effect>>,
        texture: Option<&Texture>,
        tinted: bool,
        alpha: f32,
        premultiplied_alpha: bool,
        blend_mode: BlendMode,
        num_quads: usize,
    ) -> bool {
        let candidate = BatchState::new(
            effect.map(|e| e.id()),
            texture,
            tinted,
            alpha,
            premultiplied_alpha,
            blend_mode,
        );
        self.is_state_change_to(&candidate, num_quads)
    }

    pub fn is_state_change_to(&self, candidate: &BatchState, num_quads: usize) -> bool {
        state::is_state_change(
            &self.state(),
            self.num_quads,
            self.max_quads,
            candidate,
            num_quads,
        )
    }

    fn adopt(&mut self, state: &BatchState, texture: Option<&Texture>, effect: Option<&Arc<Effect>>) {
        self.vertex_data
            .set_premultiplied_alpha(state.premultiplied_alpha);
        self.tinted = state.tinted;
        self.blend_mode = state.blend_mode;
        self.texture = texture.cloned();
        self.effect = effect.cloned();
    }

    /// Append a quad, transformed by `matrix` and with its alpha multiplied by
    /// `alpha`.
    pub fn add_quad(
        &mut self,
        quad: &Quad,
        alpha: f32,
        blend_mode: BlendMode,
        matrix: Option<&Matrix>,
    ) {
        let state = Self::quad_state(quad, alpha, blend_mode);
        debug_assert!(
            !self.is_state_change_to(&state, 1),
            "quad state {state:?} does not match batch state {:?}",
            self.state()
        );
        if self.num_quads == 0 {
            self.adopt(&state, quad.texture(), quad.effect());
        }

        self.ensure_capacity(self.num_quads + 1);
        let start = self.num_quads * 4;
        self.vertex_data.set_num_vertices(start + 4);
        quad.vertex_data()
            .copy_range_to(0, 4, &mut self.vertex_data, start, matrix);
        self.vertex_data.scale_alpha(alpha, start, 4);
        self.num_quads += 1;
        self.touch();
    }

    /// [`QuadBatch::add_quad`] with full alpha, no blend override and no transform.
    pub fn append_quad(&mut self, quad: &Quad) {
        self.add_quad(quad, 1.0, BlendMode::Auto, None);
    }

    /// Append every quad of `other`, transformed by `matrix` and with alpha
    /// multiplied by `alpha`.
    pub fn add_quad_batch(
        &mut self,
        other: &QuadBatch,
        alpha: f32,
        blend_mode: BlendMode,
        matrix: Option<&Matrix>,
    ) {
        self.add_quad_range(other, 0, other.num_quads, alpha, blend_mode, matrix);
    }

    /// Append `count` quads of `other` starting at quad `first`.
    pub fn add_quad_range(
        &mut self,
        other: &QuadBatch,
        first: usize,
        count: usize,
        alpha: f32,
        blend_mode: BlendMode,
        matrix: Option<&Matrix>,
    ) {
        debug_assert!(first + count <= other.num_quads);
        if count == 0 {
            return;
        }
        let state = Self::batch_state(other, alpha, blend_mode);
        debug_assert!(
            !self.is_state_change_to(&state, count),
            "batch state {state:?} does not match batch state {:?}",
            self.state()
        );
        if self.num_quads == 0 {
            self.adopt(&state, other.texture.as_ref(), other.effect.as_ref());
        }

        let vertices = count * 4;
        self.ensure_capacity(self.num_quads + count);
        let start = self.num_quads * 4;
        self.vertex_data.set_num_vertices(start + vertices);
        other
            .vertex_data
            .copy_range_to(first * 4, vertices, &mut self.vertex_data, start, matrix);
        self.vertex_data.scale_alpha(alpha, start, vertices);
        self.num_quads += count;
        self.touch();
    }

    /// [`QuadBatch::add_quad_batch`] with full alpha, no blend override and no
    /// transform.
    pub fn append_batch(&mut self, other: &QuadBatch) {
        self.add_quad_batch(other, 1.0, BlendMode::Auto, None);
    }

    pub fn texture(&self) -> Option<&Texture> {
        self.texture.as_ref()
    }

    /// Custom effect, if any. Batches without one draw with a base effect.
    pub fn effect(&self) -> Option<&Arc<Effect>> {
        self.effect.as_ref()
    }

    /// Changing the effect changes the batch state; only do so on batches that are
    /// not being filled.
    pub fn set_effect(&mut self, effect: Option<Arc<Effect>>) {
        self.effect = effect;
        self.touch();
    }

    pub fn tinted(&self) -> bool {
        self.tinted
    }

    pub fn premultiplied_alpha(&self) -> bool {
        self.vertex_data.premultiplied_alpha()
    }

    pub fn blend_mode(&self) -> BlendMode {
        self.blend_mode
    }

    /// Changing the blend mode changes the batch state; only do so on batches that
    /// are not being filled.
    pub fn set_blend_mode(&mut self, blend_mode: BlendMode) {
        self.blend_mode = blend_mode;
        self.touch();
    }

    pub fn vertex_data(&self) -> &VertexData {
        &self.vertex_data
    }

    /// Direct mutation of the vertex data.
    ///
    /// The batch counts as changed afterwards. The closure must keep exactly four
    /// vertices per quad.
    pub fn with_vertex_data<R>(&mut self, f: impl FnOnce(&mut VertexData) -> R) -> R {
        let result = f(&mut self.vertex_data);
        debug_assert_eq!(self.vertex_data.num_vertices(), self.num_quads * 4);
        self.tinted |= self.vertex_data.is_tinted();
        self.touch();
        result
    }

    fn vertex_index(&self, quad: usize, vertex: usize) -> usize {
        debug_assert!(quad < self.num_quads && vertex < 4);
        quad * 4 + vertex
    }

    fn note_tint(&mut self, color: Color, alpha: f32) {
        self.tinted |= color != Color::WHITE || alpha != 1.0;
        self.touch();
    }

    pub fn vertex_color(&self, quad: usize, vertex: usize) -> Color {
        self.vertex_data.color(self.vertex_index(quad, vertex))
    }

    pub fn set_vertex_color(&mut self, quad: usize, vertex: usize, color: Color) {
        let index = self.vertex_index(quad, vertex);
        self.vertex_data.set_color(index, color);
        self.note_tint(color, 1.0);
    }

    pub fn vertex_alpha(&self, quad: usize, vertex: usize) -> f32 {
        self.vertex_data.alpha(self.vertex_index(quad, vertex))
    }

    pub fn set_vertex_alpha(&mut self, quad: usize, vertex: usize, alpha: f32) {
        let index = self.vertex_index(quad, vertex);
        self.vertex_data.set_alpha(index, alpha);
        self.note_tint(Color::WHITE, alpha);
    }

    /// Colour of the quad's first vertex.
    pub fn quad_color(&self, quad: usize) -> Color {
        self.vertex_color(quad, 0)
    }

    /// Set all four vertices of a quad to `color`.
    pub fn set_quad_color(&mut self, quad: usize, color: Color) {
        for vertex in 0..4 {
            let index = self.vertex_index(quad, vertex);
            self.vertex_data.set_color(index, color);
        }
        self.note_tint(color, 1.0);
    }

    /// Alpha of the quad's first vertex.
    pub fn quad_alpha(&self, quad: usize) -> f32 {
        self.vertex_alpha(quad, 0)
    }

    pub fn set_quad_alpha(&mut self, quad: usize, alpha: f32) {
        for vertex in 0..4 {
            let index = self.vertex_index(quad, vertex);
            self.vertex_data.set_alpha(index, alpha);
        }
        self.note_tint(Color::WHITE, alpha);
    }

    /// Transform a quad's vertices in place.
    pub fn transform_quad(&mut self, quad: usize, matrix: &Matrix) {
        let start = self.vertex_index(quad, 0);
        self.vertex_data.transform_vertices(matrix, start, 4);
        self.touch();
    }

    pub fn bounds_of_quad(&self, quad: usize, matrix: Option<&Matrix>) -> Rect {
        self.vertex_data
            .bounds(matrix, self.vertex_index(quad, 0), 4)
    }

    /// Bounds of all quads, optionally after transformation.
    pub fn bounds(&self, matrix: Option<&Matrix>) -> Rect {
        self.vertex_data
            .bounds(matrix, 0, self.num_quads * 4)
    }

    pub fn geometry(&self) -> BatchGeometry<'_> {
        BatchGeometry {
            batch: self.id,
            generation: self.generation,
            vertices: self.vertex_data.vertices(),
            indices: &self.indices[..self.num_quads * QUAD_INDICES.len()],
        }
    }

    /// The effect the batch is drawn with when rendered with `alpha`.
    pub fn effect_for(&self, alpha: f32) -> Arc<Effect> {
        match &self.effect {
            Some(effect) => effect.clone(),
            None => base_effect(self.texture.is_some(), self.tinted || alpha != 1.0),
        }
    }

    /// Draw every quad in one call.
    ///
    /// `blend_mode` overrides the adopted blend mode unless it is `Auto`. The binding
    /// is prepared exactly once. Empty batches draw nothing.
    pub fn render<B: EffectBinding + ?Sized>(
        &self,
        binding: &mut B,
        mvp_matrix: &Matrix,
        alpha: f32,
        blend_mode: BlendMode,
    ) -> Result<()> {
        if self.num_quads == 0 {
            return Ok(());
        }
        let premultiplied_alpha = self.premultiplied_alpha();
        let effect = self.effect_for(alpha);
        effect.program().validate()?;

        let state = DrawState {
            mvp_matrix: *mvp_matrix,
            tint_color: DrawState::tint_color_for(alpha, premultiplied_alpha),
            texture: self.texture.clone(),
            blend_mode: blend_mode.inherit(self.blend_mode).resolve(),
            premultiplied_alpha,
            tinted: self.tinted || alpha != 1.0,
        };
        binding.prepare_to_draw(&effect, &state)?;
        binding.draw(self.geometry())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::{Program, ProgramAttributes};
    use crate::error::Error;
    use crate::geom::Point;
    use crate::texture::TextureOptions;

    #[derive(Default)]
    struct Recorder {
        prepared: Vec<(String, DrawState)>,
        drawn: Vec<(BatchId, usize, usize)>,
    }

    impl EffectBinding for Recorder {
        fn prepare_to_draw(&mut self, effect: &Effect, state: &DrawState) -> Result<()> {
            self.prepared
                .push((effect.program().name().to_string(), state.clone()));
            Ok(())
        }

        fn draw(&mut self, geometry: BatchGeometry<'_>) -> Result<()> {
            self.drawn
                .push((geometry.batch, geometry.vertices.len(), geometry.indices.len()));
            Ok(())
        }
    }

    #[test]
    fn test_add_quad_adopts_state() {
        let mut batch = QuadBatch::new();
        let mut quad = Quad::new(10.0, 10.0, Color::WHITE);
        quad.set_premultiplied_alpha(false);
        batch.add_quad(&quad, 0.5, BlendMode::Add, Some(&Matrix::translation(5.0, 0.0)));

        assert_eq!(batch.num_quads(), 1);
        assert!(batch.tinted());
        assert!(!batch.premultiplied_alpha());
        assert_eq!(batch.blend_mode(), BlendMode::Add);
        assert_eq!(batch.vertex_alpha(0, 3), 0.5);
        assert_eq!(batch.vertex_data().position(0), Point::new(5.0, 0.0));
        assert_eq!(batch.bounds(None), Rect::new(5.0, 0.0, 10.0, 10.0));
    }

    #[test]
    fn test_reset_keeps_capacity() {
        let mut batch = QuadBatch::new();
        let quad = Quad::new(1.0, 1.0, Color::WHITE);
        for _ in 0..40 {
            batch.append_quad(&quad);
        }
        let capacity = batch.capacity();
        assert!(capacity >= 40);
        batch.reset();
        assert!(batch.is_empty());
        assert_eq!(batch.capacity(), capacity);
        assert_eq!(batch.bounds(None), Rect::default());
    }

    #[test]
    fn test_capacity_grows_by_doubling() {
        let mut batch = QuadBatch::with_limits(4, 100);
        let quad = Quad::new(1.0, 1.0, Color::WHITE);
        for _ in 0..5 {
            batch.append_quad(&quad);
        }
        assert_eq!(batch.capacity(), 16);
        batch.set_capacity(1000);
        assert_eq!(batch.capacity(), 100);
        batch.set_capacity(0);
        assert_eq!(batch.capacity(), 5);
    }

    #[test]
    fn test_indices_follow_quad_pattern() {
        let mut batch = QuadBatch::new();
        let quad = Quad::new(1.0, 1.0, Color::WHITE);
        batch.append_quad(&quad);
        batch.append_quad(&quad);
        let geometry = batch.geometry();
        assert_eq!(geometry.indices, &[0, 1, 2, 1, 3, 2, 4, 5, 6, 5, 7, 6]);
        assert_eq!(geometry.vertices.len(), 8);
        assert_eq!(geometry.num_quads(), 2);
    }

    #[test]
    fn test_max_capacity_indices_fit_u16() {
        let batch = QuadBatch::with_limits(MAX_NUM_QUADS, MAX_NUM_QUADS);
        assert_eq!(batch.capacity(), MAX_NUM_QUADS);
        assert_eq!(batch.indices.last().copied(), Some((MAX_NUM_QUADS * 4 - 2) as u16));
    }

    #[test]
    fn test_add_quad_batch() {
        let mut inner = QuadBatch::new();
        inner.append_quad(&Quad::new(2.0, 2.0, Color::RED));
        inner.append_quad(&Quad::new(2.0, 2.0, Color::RED));
        inner.set_blend_mode(BlendMode::Screen);

        let mut outer = QuadBatch::new();
        outer.add_quad_batch(&inner, 1.0, BlendMode::Auto, Some(&Matrix::scaling(2.0, 2.0)));
        assert_eq!(outer.num_quads(), 2);
        assert_eq!(outer.blend_mode(), BlendMode::Screen);
        assert_eq!(outer.quad_color(1), Color::RED);
        assert_eq!(outer.bounds_of_quad(1, None), Rect::new(0.0, 0.0, 4.0, 4.0));

        outer.add_quad_batch(&QuadBatch::new(), 1.0, BlendMode::Auto, None);
        assert_eq!(outer.num_quads(), 2);
    }

    #[test]
    fn test_vertex_mutation_marks_tinted_and_dirty() {
        let mut batch = QuadBatch::new();
        batch.append_quad(&Quad::new(1.0, 1.0, Color::WHITE));
        assert!(!batch.tinted());

        let generation = batch.generation();
        batch.set_vertex_color(0, 2, Color::BLUE);
        assert!(batch.tinted());
        assert_eq!(batch.vertex_color(0, 2), Color::BLUE);
        assert!(batch.generation() != generation);

        let mut plain = QuadBatch::new();
        plain.append_quad(&Quad::new(1.0, 1.0, Color::WHITE));
        let generation = plain.generation();
        plain.with_vertex_data(|data| data.set_alpha(1, 0.25));
        assert!(plain.tinted());
        assert!(plain.generation() != generation);

        plain.set_quad_alpha(0, 0.5);
        assert_eq!(plain.quad_alpha(0), 0.5);
        plain.set_quad_color(0, Color::GREEN);
        assert_eq!(plain.vertex_color(0, 3), Color::GREEN);
    }

    #[test]
    fn test_transform_quad() {
        let mut batch = QuadBatch::new();
        batch.append_quad(&Quad::new(1.0, 1.0, Color::WHITE));
        batch.transform_quad(0, &Matrix::translation(3.0, 4.0));
        assert_eq!(batch.bounds_of_quad(0, None), Rect::new(3.0, 4.0, 1.0, 1.0));
        let doubled = Matrix::scaling(2.0, 2.0);
        assert_eq!(batch.bounds(Some(&doubled)), Rect::new(6.0, 8.0, 2.0, 2.0));
    }

    #[test]
    fn test_render_prepares_once_per_batch() {
        let tex = Texture::new(8, 8, TextureOptions::default());
        let mut batch = QuadBatch::new();
        batch.append_quad(&Quad::from_texture(tex.clone()));
        batch.append_quad(&Quad::from_texture(tex));

        let mut recorder = Recorder::default();
        batch
            .render(&mut recorder, &Matrix::IDENTITY, 1.0, BlendMode::Auto)
            .unwrap();
        assert_eq!(recorder.prepared.len(), 1);
        assert_eq!(recorder.drawn, vec![(batch.id(), 8, 12)]);
        let (program, state) = &recorder.prepared[0];
        assert_eq!(program, "base_textured");
        assert_eq!(state.blend_mode, BlendMode::Normal);
        assert!(!state.tinted);

        batch
            .render(&mut recorder, &Matrix::IDENTITY, 0.5, BlendMode::Multiply)
            .unwrap();
        let (program, state) = &recorder.prepared[1];
        assert_eq!(program, "base_textured_tinted");
        assert_eq!(state.tint_color, [0.5; 4]);
        assert_eq!(state.blend_mode, BlendMode::Multiply);
    }

    #[test]
    fn test_render_empty_batch_draws_nothing() {
        let mut recorder = Recorder::default();
        QuadBatch::new()
            .render(&mut recorder, &Matrix::IDENTITY, 1.0, BlendMode::Auto)
            .unwrap();
        assert!(recorder.prepared.is_empty());
        assert!(recorder.drawn.is_empty());
    }

    #[test]
    fn test_render_rejects_program_without_position() {
        let program = Program::new("no_position", "", ProgramAttributes {
            color: Some(0),
            ..Default::default()
        });
        let mut quad = Quad::new(1.0, 1.0, Color::WHITE);
        quad.set_effect(Some(Arc::new(Effect::new(Arc::new(program)))));
        let mut batch = QuadBatch::new();
        batch.append_quad(&quad);

        let mut recorder = Recorder::default();
        let result = batch.render(&mut recorder, &Matrix::IDENTITY, 1.0, BlendMode::Auto);
        assert!(matches!(result, Err(Error::MissingPositionAttribute { .. })));
        assert!(recorder.prepared.is_empty());
    }

    #[test]
    fn test_is_state_change_by_effect() {
        let program = Arc::new(Program::new("p", "", ProgramAttributes {
            position: Some(0),
            ..Default::default()
        }));
        let effect = Arc::new(Effect::new(program.clone()));
        let other = Arc::new(Effect::new(program));

        let mut quad = Quad::new(1.0, 1.0, Color::WHITE);
        quad.set_effect(Some(effect.clone()));
        let mut batch = QuadBatch::new();
        batch.append_quad(&quad);

        assert!(!batch.is_state_change(Some(&effect), None, false, 1.0, true, BlendMode::Auto, 1));
        assert!(batch.is_state_change(Some(&other), None, false, 1.0, true, BlendMode::Auto, 1));
        assert!(batch.is_state_change(None, None, false, 1.0, true, BlendMode::Auto, 1));
    }

    #[test]
    fn test_set_blend_mode_changes_state_and_generation() {
        let mut batch = QuadBatch::new();
        batch.append_quad(&Quad::new(1.0, 1.0, Color::WHITE));
        let before = batch.generation();

        batch.set_blend_mode(BlendMode::Add);
        assert_eq!(batch.state().blend_mode, BlendMode::Add);
        assert_ne!(batch.generation(), before);
    }
}
