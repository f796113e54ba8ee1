//! Texture handles.
//!
//! A [`Texture`] is a CPU-side description of a region of a GPU texture. Pixel data
//! lives with the graphics backend (see [`crate::gpu::WgpuBinding::upload_texture`]),
//! keyed by [`TextureId`].
//!
//! Batching compares *identity*, not content: two textures created separately are
//! different even if their pixels match, while sub-textures of one base texture (an
//! atlas) share an identity and can be drawn in a single call.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::geom::Rect;

static NEXT_TEXTURE_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a base texture.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureId(u64);

impl TextureId {
    fn next() -> Self {
        Self(NEXT_TEXTURE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// Filtering used when sampling a texture.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TextureSmoothing {
    None,
    #[default]
    Bilinear,
    Trilinear,
}

/// Creation parameters for a base texture.
#[derive(Clone, Copy, Debug)]
pub struct TextureOptions {
    /// Content scale factor; sizes in points are pixel sizes divided by this.
    pub scale: f32,
    pub premultiplied_alpha: bool,
    pub mipmaps: bool,
}

impl Default for TextureOptions {
    fn default() -> Self {
        Self {
            scale: 1.0,
            premultiplied_alpha: true,
            mipmaps: false,
        }
    }
}

#[derive(Debug)]
struct BaseTexture {
    id: TextureId,
    width_px: u32,
    height_px: u32,
    options: TextureOptions,
}

/// A (sub-)region of a base texture plus its sampling state.
#[derive(Clone, Debug)]
pub struct Texture {
    base: Arc<BaseTexture>,
    /// Region in normalized texture coordinates of the base texture.
    region: Rect,
    smoothing: TextureSmoothing,
    repeat: bool,
}

impl Texture {
    /// Describe a new base texture of the given pixel size.
    pub fn new(width_px: u32, height_px: u32, options: TextureOptions) -> Self {
        Self {
            base: Arc::new(BaseTexture {
                id: TextureId::next(),
                width_px,
                height_px,
                options,
            }),
            region: Rect::new(0.0, 0.0, 1.0, 1.0),
            smoothing: TextureSmoothing::default(),
            repeat: false,
        }
    }

    /// A texture showing part of this one. `region` is in points relative to this
    /// texture. The result shares this texture's identity.
    pub fn sub_texture(&self, region: Rect) -> Self {
        let (w, h) = (self.width(), self.height());
        let normalized = if w > 0.0 && h > 0.0 {
            Rect::new(
                self.region.x + region.x / w * self.region.width,
                self.region.y + region.y / h * self.region.height,
                region.width / w * self.region.width,
                region.height / h * self.region.height,
            )
        } else {
            self.region
        };
        Self {
            base: self.base.clone(),
            region: normalized,
            smoothing: self.smoothing,
            repeat: self.repeat,
        }
    }

    pub fn id(&self) -> TextureId {
        self.base.id
    }

    /// Width in points.
    pub fn width(&self) -> f32 {
        self.base.width_px as f32 / self.base.options.scale * self.region.width
    }

    /// Height in points.
    pub fn height(&self) -> f32 {
        self.base.height_px as f32 / self.base.options.scale * self.region.height
    }

    pub fn native_width(&self) -> u32 {
        self.base.width_px
    }

    pub fn native_height(&self) -> u32 {
        self.base.height_px
    }

    pub fn scale(&self) -> f32 {
        self.base.options.scale
    }

    pub fn premultiplied_alpha(&self) -> bool {
        self.base.options.premultiplied_alpha
    }

    pub fn mipmaps(&self) -> bool {
        self.base.options.mipmaps
    }

    pub fn region(&self) -> Rect {
        self.region
    }

    pub fn smoothing(&self) -> TextureSmoothing {
        self.smoothing
    }

    pub fn with_smoothing(mut self, smoothing: TextureSmoothing) -> Self {
        self.smoothing = smoothing;
        self
    }

    pub fn repeat(&self) -> bool {
        self.repeat
    }

    pub fn with_repeat(mut self, repeat: bool) -> Self {
        self.repeat = repeat;
        self
    }

    /// Map normalized local coordinates (0..1 across this region) to base texture
    /// coordinates.
    pub fn tex_coords(&self, u: f32, v: f32) -> [f32; 2] {
        [
            self.region.x + u * self.region.width,
            self.region.y + v * self.region.height,
        ]
    }

    /// Same base texture and sampling state, i.e. drawable in the same batch.
    pub fn is_batchable_with(&self, other: &Texture) -> bool {
        self.id() == other.id() && self.smoothing == other.smoothing && self.repeat == other.repeat
    }
}

/// Equal when showing the same region of the same base texture with the same
/// sampling state.
impl PartialEq for Texture {
    fn eq(&self, other: &Self) -> bool {
        self.is_batchable_with(other) && self.region == other.region
    }
}
