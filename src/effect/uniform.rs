use crate::error::{Error, Result};
use crate::texture::Texture;

/// Size of one uniform slot in the packed uniform buffer.
pub const UNIFORM_SLOT_SIZE: usize = 16;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UniformType {
    Float,
    Int,
    Vec2,
    Vec3,
    Vec4,
    Mat2,
    Mat3,
    Mat4,
    Texture,
}

impl UniformType {
    /// Number of 16-byte slots the type occupies in the uniform buffer. Textures are
    /// bound separately and take none.
    pub fn slots(self) -> usize {
        match self {
            UniformType::Float
            | UniformType::Int
            | UniformType::Vec2
            | UniformType::Vec3
            | UniformType::Vec4
            | UniformType::Mat2 => 1,
            UniformType::Mat3 => 3,
            UniformType::Mat4 => 4,
            UniformType::Texture => 0,
        }
    }
}

/// A typed uniform value. Matrices are column-major.
#[derive(Clone, Debug, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Int(i32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    Mat2([[f32; 2]; 2]),
    Mat3([[f32; 3]; 3]),
    Mat4([[f32; 4]; 4]),
    Texture(Texture),
}

impl UniformValue {
    pub fn ty(&self) -> UniformType {
        match self {
            UniformValue::Float(_) => UniformType::Float,
            UniformValue::Int(_) => UniformType::Int,
            UniformValue::Vec2(_) => UniformType::Vec2,
            UniformValue::Vec3(_) => UniformType::Vec3,
            UniformValue::Vec4(_) => UniformType::Vec4,
            UniformValue::Mat2(_) => UniformType::Mat2,
            UniformValue::Mat3(_) => UniformType::Mat3,
            UniformValue::Mat4(_) => UniformType::Mat4,
            UniformValue::Texture(_) => UniformType::Texture,
        }
    }

    /// Append the value to `out` as whole 16-byte slots. Each matrix column takes
    /// its own slot, except for `mat2x2` whose two columns share one.
    pub fn write_slots(&self, out: &mut Vec<u8>) {
        let start = out.len();
        match self {
            UniformValue::Float(v) => out.extend_from_slice(bytemuck::bytes_of(v)),
            UniformValue::Int(v) => out.extend_from_slice(bytemuck::bytes_of(v)),
            UniformValue::Vec2(v) => out.extend_from_slice(bytemuck::cast_slice(v)),
            UniformValue::Vec3(v) => out.extend_from_slice(bytemuck::cast_slice(v)),
            UniformValue::Vec4(v) => out.extend_from_slice(bytemuck::cast_slice(v)),
            UniformValue::Mat2(m) => out.extend_from_slice(bytemuck::cast_slice(m)),
            UniformValue::Mat3(m) => {
                for column in m {
                    out.extend_from_slice(bytemuck::cast_slice(column));
                    out.extend_from_slice(&[0; 4]);
                }
            }
            UniformValue::Mat4(m) => out.extend_from_slice(bytemuck::cast_slice(m)),
            UniformValue::Texture(_) => {}
        }
        let written = out.len() - start;
        out.resize(start + self.ty().slots() * UNIFORM_SLOT_SIZE, 0);
        debug_assert!(written <= self.ty().slots() * UNIFORM_SLOT_SIZE);
    }
}

/// A named uniform. Its type is fixed by the first value it is given.
#[derive(Clone, Debug)]
pub struct Uniform {
    name: String,
    value: UniformValue,
}

impl Uniform {
    pub fn new(name: impl Into<String>, value: UniformValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &UniformValue {
        &self.value
    }

    pub fn ty(&self) -> UniformType {
        self.value.ty()
    }

    /// Replace the value. Fails if the new value has a different type.
    pub fn set_value(&mut self, value: UniformValue) -> Result<()> {
        if value.ty() != self.ty() {
            return Err(Error::UniformTypeMismatch {
                name: self.name.clone(),
                expected: self.ty(),
                found: value.ty(),
            });
        }
        self.value = value;
        Ok(())
    }
}

/// Insert `uniform` into `list`, replacing a same-named entry of the same type.
pub(crate) fn upsert(list: &mut Vec<Uniform>, uniform: Uniform) -> Result<()> {
    match list.iter_mut().find(|u| u.name == uniform.name) {
        Some(existing) => existing.set_value(uniform.value),
        None => {
            list.push(uniform);
            Ok(())
        }
    }
}
