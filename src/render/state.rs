//! Render-state classification.
//!
//! A batch adopts the state of the first quad added to it. Every later quad must
//! match that state exactly; a single differing field starts a new batch. Quads are
//! never reordered to improve batching since that would change compositing.

use crate::blend::BlendMode;
use crate::effect::EffectId;
use crate::texture::{Texture, TextureId, TextureSmoothing};

/// Identity and sampling state of a texture.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureKey {
    pub id: TextureId,
    pub smoothing: TextureSmoothing,
    pub repeat: bool,
}

impl From<&Texture> for TextureKey {
    fn from(texture: &Texture) -> Self {
        Self {
            id: texture.id(),
            smoothing: texture.smoothing(),
            repeat: texture.repeat(),
        }
    }
}

/// The render-state tuple shared by every quad of a batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BatchState {
    /// Custom effect, `None` for the base effect.
    pub effect: Option<EffectId>,
    pub texture: Option<TextureKey>,
    pub tinted: bool,
    pub premultiplied_alpha: bool,
    pub blend_mode: BlendMode,
}

impl BatchState {
    /// State of content drawn with an extra `alpha`: anything not fully opaque
    /// counts as tinted.
    pub fn new(
        effect: Option<EffectId>,
        texture: Option<&Texture>,
        tinted: bool,
        alpha: f32,
        premultiplied_alpha: bool,
        blend_mode: BlendMode,
    ) -> Self {
        Self {
            effect,
            texture: texture.map(TextureKey::from),
            tinted: tinted || alpha != 1.0,
            premultiplied_alpha,
            blend_mode,
        }
    }
}

/// Whether adding `additional_quads` quads in state `candidate` to a batch that
/// holds `num_quads` quads in state `current` requires a new batch.
///
/// An empty batch accepts anything. A non-empty batch accepts only an identical
/// state, and only while the result stays within `max_quads`.
pub fn is_state_change(
    current: &BatchState,
    num_quads: usize,
    max_quads: usize,
    candidate: &BatchState,
    additional_quads: usize,
) -> bool {
    if num_quads == 0 {
        return false;
    }
    num_quads + additional_quads > max_quads || current != candidate
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::texture::TextureOptions;

    fn plain() -> BatchState {
        BatchState::new(None, None, false, 1.0, true, BlendMode::Auto)
    }

    #[test]
    fn test_empty_batch_accepts_anything() {
        let tex = Texture::new(4, 4, TextureOptions::default());
        let other = BatchState::new(None, Some(&tex), true, 0.5, false, BlendMode::Add);
        assert!(!is_state_change(&plain(), 0, 10, &other, 1));
    }

    #[test]
    fn test_each_field_splits() {
        let tex = Texture::new(4, 4, TextureOptions::default());
        let base = plain();
        let variants = [
            BatchState::new(None, Some(&tex), false, 1.0, true, BlendMode::Auto),
            BatchState::new(None, None, true, 1.0, true, BlendMode::Auto),
            BatchState::new(None, None, false, 0.99, true, BlendMode::Auto),
            BatchState::new(None, None, false, 1.0, false, BlendMode::Auto),
            BatchState::new(None, None, false, 1.0, true, BlendMode::Multiply),
        ];
        for candidate in &variants {
            assert!(is_state_change(&base, 1, 10, candidate, 1), "{candidate:?}");
        }
        assert!(!is_state_change(&base, 1, 10, &plain(), 1));
    }

    #[test]
    fn test_texture_identity_not_content() {
        let a = Texture::new(4, 4, TextureOptions::default());
        let b = Texture::new(4, 4, TextureOptions::default());
        let with_a = BatchState::new(None, Some(&a), false, 1.0, true, BlendMode::Auto);
        let with_b = BatchState::new(None, Some(&b), false, 1.0, true, BlendMode::Auto);
        assert!(is_state_change(&with_a, 1, 10, &with_b, 1));

        let sub = a.sub_texture(crate::geom::Rect::new(0.0, 0.0, 2.0, 2.0));
        let with_sub = BatchState::new(None, Some(&sub), false, 1.0, true, BlendMode::Auto);
        assert!(!is_state_change(&with_a, 1, 10, &with_sub, 1));
    }

    #[test]
    fn test_capacity_headroom() {
        let base = plain();
        assert!(!is_state_change(&base, 9, 10, &base, 1));
        assert!(is_state_change(&base, 10, 10, &base, 1));
        assert!(is_state_change(&base, 5, 10, &base, 6));
    }
}
