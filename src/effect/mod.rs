//! Effects: a shader program plus the uniforms it is drawn with.
//!
//! Drawing a batch goes through an [`EffectBinding`], the graphics-API side of the
//! contract. The binding receives the effect and the batch's fully resolved
//! [`DrawState`] once per batch via [`EffectBinding::prepare_to_draw`], followed by the
//! geometry via [`EffectBinding::draw`].
//!
//! Uniform values come from three places. In order of precedence:
//! 1. built-ins derived from the draw state ([`MVP_MATRIX`], [`TINT_COLOR`],
//!    [`MAIN_TEXTURE`]),
//! 2. uniforms set on the effect itself,
//! 3. the process-wide global uniforms.
//!
//! Only uniforms the program declares are resolved.

mod base;
mod program;
mod uniform;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use crate::blend::BlendMode;
use crate::error::{Error, Result};
use crate::geom::Matrix;
use crate::render::BatchGeometry;
use crate::texture::Texture;

pub use base::base_effect;
pub use program::{Program, ProgramAttributes, ProgramId, UniformDecl};
pub use uniform::{Uniform, UniformType, UniformValue, UNIFORM_SLOT_SIZE};

pub const MVP_MATRIX: &str = "mvp_matrix";
pub const TINT_COLOR: &str = "tint_color";
pub const MAIN_TEXTURE: &str = "main_texture";

static NEXT_EFFECT_ID: AtomicU64 = AtomicU64::new(1);

static GLOBAL_UNIFORMS: RwLock<Vec<Uniform>> = RwLock::new(Vec::new());

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EffectId(u64);

/// Everything a binding needs to know about the batch it is about to draw.
#[derive(Clone, Debug)]
pub struct DrawState {
    pub mvp_matrix: Matrix,
    /// `(a, a, a, a)` for premultiplied alpha, `(1, 1, 1, a)` otherwise.
    pub tint_color: [f32; 4],
    pub texture: Option<Texture>,
    /// Never [`BlendMode::Auto`].
    pub blend_mode: BlendMode,
    pub premultiplied_alpha: bool,
    pub tinted: bool,
}

impl DrawState {
    pub fn tint_color_for(alpha: f32, premultiplied_alpha: bool) -> [f32; 4] {
        if premultiplied_alpha {
            [alpha, alpha, alpha, alpha]
        } else {
            [1.0, 1.0, 1.0, alpha]
        }
    }
}

/// Graphics-API side of effect rendering.
pub trait EffectBinding {
    /// Select the program for `effect` and upload its uniforms for `state`.
    fn prepare_to_draw(&mut self, effect: &Effect, state: &DrawState) -> Result<()>;

    /// Draw indexed triangles with the state from the last `prepare_to_draw`.
    fn draw(&mut self, geometry: BatchGeometry<'_>) -> Result<()>;
}

/// A program with its own uniform values. Effects are compared by identity.
#[derive(Debug)]
pub struct Effect {
    id: EffectId,
    program: Arc<Program>,
    uniforms: RwLock<Vec<Uniform>>,
}

impl Effect {
    pub fn new(program: Arc<Program>) -> Self {
        Self {
            id: EffectId(NEXT_EFFECT_ID.fetch_add(1, Ordering::Relaxed)),
            program,
            uniforms: RwLock::new(Vec::new()),
        }
    }

    pub fn id(&self) -> EffectId {
        self.id
    }

    pub fn program(&self) -> &Arc<Program> {
        &self.program
    }

    /// Add a uniform, or update the value of an existing one with the same name.
    pub fn add_uniform(&self, uniform: Uniform) -> Result<()> {
        let mut uniforms = self.uniforms.write().unwrap_or_else(PoisonError::into_inner);
        uniform::upsert(&mut uniforms, uniform)
    }

    pub fn set_uniform(&self, name: &str, value: UniformValue) -> Result<()> {
        self.add_uniform(Uniform::new(name, value))
    }

    pub fn uniform(&self, name: &str) -> Option<UniformValue> {
        let uniforms = self.uniforms.read().unwrap_or_else(PoisonError::into_inner);
        uniforms
            .iter()
            .find(|u| u.name() == name)
            .map(|u| u.value().clone())
    }

    pub fn remove_uniform(&self, name: &str) -> bool {
        let mut uniforms = self.uniforms.write().unwrap_or_else(PoisonError::into_inner);
        let before = uniforms.len();
        uniforms.retain(|u| u.name() != name);
        uniforms.len() != before
    }

    pub fn remove_all_uniforms(&self) {
        self.uniforms
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Resolve every uniform the program declares, in declaration order.
    ///
    /// Declared uniforms without a value anywhere are left out; a value whose type
    /// differs from the declaration is an error.
    pub fn resolve_uniforms(&self, state: &DrawState) -> Result<Vec<Uniform>> {
        let local = self.uniforms.read().unwrap_or_else(PoisonError::into_inner);
        let global = GLOBAL_UNIFORMS.read().unwrap_or_else(PoisonError::into_inner);

        let mut resolved = Vec::with_capacity(self.program.uniforms().len());
        for decl in self.program.uniforms() {
            let value = match decl.name.as_str() {
                MVP_MATRIX => Some(UniformValue::Mat4(state.mvp_matrix.to_mat4())),
                TINT_COLOR => Some(UniformValue::Vec4(state.tint_color)),
                MAIN_TEXTURE => state.texture.clone().map(UniformValue::Texture),
                name => local
                    .iter()
                    .chain(global.iter())
                    .find(|u| u.name() == name)
                    .map(|u| u.value().clone()),
            };

            let Some(value) = value else {
                log::trace!(
                    "Uniform '{}' of program '{}' has no value",
                    decl.name,
                    self.program.name()
                );
                continue;
            };
            if value.ty() != decl.ty {
                return Err(Error::UniformTypeMismatch {
                    name: decl.name.clone(),
                    expected: decl.ty,
                    found: value.ty(),
                });
            }
            resolved.push(Uniform::new(decl.name.clone(), value));
        }
        Ok(resolved)
    }
}

/// Register a uniform merged into every effect at bind time.
pub fn add_global_uniform(uniform: Uniform) -> Result<()> {
    let mut uniforms = GLOBAL_UNIFORMS.write().unwrap_or_else(PoisonError::into_inner);
    uniform::upsert(&mut uniforms, uniform)
}

pub fn global_uniform(name: &str) -> Option<UniformValue> {
    GLOBAL_UNIFORMS
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .iter()
        .find(|u| u.name() == name)
        .map(|u| u.value().clone())
}

pub fn remove_global_uniform(name: &str) -> bool {
    let mut uniforms = GLOBAL_UNIFORMS.write().unwrap_or_else(PoisonError::into_inner);
    let before = uniforms.len();
    uniforms.retain(|u| u.name() != name);
    uniforms.len() != before
}

pub fn clear_global_uniforms() {
    GLOBAL_UNIFORMS
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn program() -> Arc<Program> {
        Arc::new(
            Program::new("test", "", ProgramAttributes {
                position: Some(0),
                ..Default::default()
            })
            .with_uniform(MVP_MATRIX, UniformType::Mat4)
            .with_uniform(TINT_COLOR, UniformType::Vec4)
            .with_uniform("effect_test_local", UniformType::Float)
            .with_uniform("effect_test_shadowed", UniformType::Float)
            .with_uniform("effect_test_global", UniformType::Vec2)
            .with_uniform("effect_test_unset", UniformType::Int),
        )
    }

    fn state() -> DrawState {
        DrawState {
            mvp_matrix: Matrix::translation(1.0, 2.0),
            tint_color: DrawState::tint_color_for(0.5, true),
            texture: None,
            blend_mode: BlendMode::Normal,
            premultiplied_alpha: true,
            tinted: true,
        }
    }

    #[test]
    fn test_effects_are_unique() {
        let program = program();
        let a = Effect::new(program.clone());
        let b = Effect::new(program);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_local_uniforms() {
        let effect = Effect::new(program());
        effect.set_uniform("x", UniformValue::Float(1.0)).unwrap();
        assert!(effect.set_uniform("x", UniformValue::Int(1)).is_err());
        assert!(matches!(effect.uniform("x"), Some(UniformValue::Float(v)) if v == 1.0));
        assert!(effect.remove_uniform("x"));
        assert!(!effect.remove_uniform("x"));
        effect.set_uniform("y", UniformValue::Float(1.0)).unwrap();
        effect.remove_all_uniforms();
        assert!(effect.uniform("y").is_none());
    }

    #[test]
    fn test_resolution_precedence() {
        add_global_uniform(Uniform::new("effect_test_global", UniformValue::Vec2([3.0, 4.0])))
            .unwrap();
        add_global_uniform(Uniform::new("effect_test_shadowed", UniformValue::Float(9.0)))
            .unwrap();
        // a global with a built-in name never wins
        add_global_uniform(Uniform::new(TINT_COLOR, UniformValue::Vec4([0.0; 4]))).unwrap();

        let effect = Effect::new(program());
        effect
            .set_uniform("effect_test_local", UniformValue::Float(1.0))
            .unwrap();
        effect
            .set_uniform("effect_test_shadowed", UniformValue::Float(2.0))
            .unwrap();
        effect
            .set_uniform("effect_test_not_declared", UniformValue::Float(2.0))
            .unwrap();

        let resolved = effect.resolve_uniforms(&state()).unwrap();
        let names: Vec<&str> = resolved.iter().map(|u| u.name()).collect();
        assert_eq!(names, vec![
            MVP_MATRIX,
            TINT_COLOR,
            "effect_test_local",
            "effect_test_shadowed",
            "effect_test_global",
        ]);
        assert!(matches!(resolved[1].value(), UniformValue::Vec4(c) if *c == [0.5; 4]));
        assert!(matches!(resolved[3].value(), UniformValue::Float(v) if *v == 2.0));
        assert!(matches!(resolved[4].value(), UniformValue::Vec2(v) if *v == [3.0, 4.0]));
        assert!(matches!(resolved[0].value(), UniformValue::Mat4(m) if m[3] == [1.0, 2.0, 0.0, 1.0]));

        assert!(remove_global_uniform("effect_test_global"));
        assert!(global_uniform("effect_test_global").is_none());
        remove_global_uniform("effect_test_shadowed");
        remove_global_uniform(TINT_COLOR);
    }

    #[test]
    fn test_resolution_type_mismatch() {
        let effect = Effect::new(program());
        effect
            .set_uniform("effect_test_local", UniformValue::Int(1))
            .unwrap();
        let err = effect.resolve_uniforms(&state()).unwrap_err();
        assert!(matches!(err, Error::UniformTypeMismatch { ref name, .. } if name == "effect_test_local"));
    }
}
