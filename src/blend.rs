//! Blend modes and their GPU blend factors.

use wgpu::{BlendComponent, BlendFactor, BlendOperation, BlendState};

/// How a display object's pixels are combined with what is already on the target.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BlendMode {
    /// Inherit the blend mode of the parent. Resolves to [`BlendMode::Normal`] at
    /// the root.
    #[default]
    Auto,
    /// Overwrite the target, ignoring alpha.
    None,
    Normal,
    Add,
    Multiply,
    Screen,
    /// Punch holes into the target using the source's alpha.
    Erase,
}

impl BlendMode {
    /// Combine with the mode inherited from an ancestor: an explicit mode wins,
    /// `Auto` keeps the inherited one.
    pub fn inherit(self, inherited: BlendMode) -> BlendMode {
        match self {
            BlendMode::Auto => inherited,
            mode => mode,
        }
    }

    /// The concrete mode used for drawing.
    pub fn resolve(self) -> BlendMode {
        match self {
            BlendMode::Auto => BlendMode::Normal,
            mode => mode,
        }
    }

    /// Source and destination factors. Depends on whether the source colour is
    /// premultiplied.
    pub fn factors(self, premultiplied_alpha: bool) -> (BlendFactor, BlendFactor) {
        use BlendFactor::*;
        match (self.resolve(), premultiplied_alpha) {
            (BlendMode::None, _) => (One, Zero),
            (BlendMode::Normal, true) => (One, OneMinusSrcAlpha),
            (BlendMode::Normal, false) => (SrcAlpha, OneMinusSrcAlpha),
            (BlendMode::Add, true) => (One, One),
            (BlendMode::Add, false) => (SrcAlpha, DstAlpha),
            (BlendMode::Multiply, _) => (Dst, OneMinusSrcAlpha),
            (BlendMode::Screen, true) => (One, OneMinusSrc),
            (BlendMode::Screen, false) => (SrcAlpha, One),
            (BlendMode::Erase, _) => (Zero, OneMinusSrcAlpha),
            (BlendMode::Auto, _) => unreachable!("resolve() never returns Auto"),
        }
    }

    pub fn blend_state(self, premultiplied_alpha: bool) -> BlendState {
        let (src_factor, dst_factor) = self.factors(premultiplied_alpha);
        let component = BlendComponent {
            src_factor,
            dst_factor,
            operation: BlendOperation::Add,
        };
        BlendState {
            color: component,
            alpha: component,
        }
    }
}
