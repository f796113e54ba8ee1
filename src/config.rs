use crate::color::Color;
use crate::render::{DEFAULT_CAPACITY, MAX_NUM_QUADS};

/// Rendering settings.
///
/// ```
/// use perch::{Color, RenderConfig};
///
/// let config = RenderConfig::new()
///     .max_quads_per_batch(4096)
///     .clear_color(Color::NAVY);
/// assert_eq!(config.max_quads_per_batch, 4096);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct RenderConfig {
    /// Upper bound on quads per batch. Never above [`MAX_NUM_QUADS`].
    pub max_quads_per_batch: usize,
    /// Capacity of newly created batches, in quads.
    pub initial_batch_capacity: usize,
    pub clear_color: Color,
    pub clear_alpha: f32,
    /// Whether untextured quads created through [`RenderConfig::quad`] use
    /// premultiplied alpha.
    pub premultiplied_quads: bool,
    /// Log per-frame statistics at debug level.
    pub log_frame_stats: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            max_quads_per_batch: MAX_NUM_QUADS,
            initial_batch_capacity: DEFAULT_CAPACITY,
            clear_color: Color::BLACK,
            clear_alpha: 1.0,
            premultiplied_quads: true,
            log_frame_stats: false,
        }
    }
}

impl RenderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_quads_per_batch(mut self, max: usize) -> Self {
        self.max_quads_per_batch = max.clamp(1, MAX_NUM_QUADS);
        self
    }

    pub fn initial_batch_capacity(mut self, capacity: usize) -> Self {
        self.initial_batch_capacity = capacity;
        self
    }

    pub fn clear_color(mut self, color: Color) -> Self {
        self.clear_color = color;
        self
    }

    pub fn clear_alpha(mut self, alpha: f32) -> Self {
        self.clear_alpha = alpha;
        self
    }

    pub fn premultiplied_quads(mut self, premultiplied: bool) -> Self {
        self.premultiplied_quads = premultiplied;
        self
    }

    pub fn log_frame_stats(mut self, enabled: bool) -> Self {
        self.log_frame_stats = enabled;
        self
    }

    /// An untextured quad following this configuration's alpha convention.
    pub fn quad(&self, width: f32, height: f32, color: Color) -> crate::render::Quad {
        let mut quad = crate::render::Quad::new(width, height, color);
        quad.set_premultiplied_alpha(self.premultiplied_quads);
        quad
    }

    /// Clear colour as linear floats for `wgpu::Color`.
    pub fn clear_rgba(&self) -> [f64; 4] {
        let [r, g, b] = self.clear_color.to_f32();
        [r as f64, g as f64, b as f64, self.clear_alpha as f64]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_quads_is_clamped() {
        assert_eq!(RenderConfig::new().max_quads_per_batch(0).max_quads_per_batch, 1);
        assert_eq!(
            RenderConfig::new()
                .max_quads_per_batch(100_000)
                .max_quads_per_batch,
            MAX_NUM_QUADS
        );
    }

    #[test]
    fn test_quad_follows_alpha_convention() {
        let config = RenderConfig::new().premultiplied_quads(false);
        assert!(!config.quad(1.0, 1.0, Color::RED).premultiplied_alpha());
        assert_eq!(RenderConfig::default().clear_rgba(), [0.0, 0.0, 0.0, 1.0]);
    }
}
