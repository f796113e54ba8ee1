use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{Error, Result};

use super::uniform::UniformType;

static NEXT_PROGRAM_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ProgramId(u64);

/// Vertex input locations a program reads. `None` means the program ignores that
/// vertex component.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ProgramAttributes {
    pub position: Option<u32>,
    pub color: Option<u32>,
    pub tex_coords: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UniformDecl {
    pub name: String,
    pub ty: UniformType,
}

/// A WGSL shader program and the interface it exposes.
///
/// Bind group 0 layout:
/// - binding 0: a uniform buffer holding every non-texture uniform in declaration
///   order, each starting on a 16-byte boundary (use `@align(16)` for scalars),
/// - binding 1: the texture uniform, if one is declared,
/// - binding 2: its sampler.
///
/// Entry points are `vs_main` and `fs_main`.
#[derive(Debug)]
pub struct Program {
    id: ProgramId,
    name: String,
    source: String,
    attributes: ProgramAttributes,
    uniforms: Vec<UniformDecl>,
}

impl Program {
    pub fn new(
        name: impl Into<String>,
        source: impl Into<String>,
        attributes: ProgramAttributes,
    ) -> Self {
        Self {
            id: ProgramId(NEXT_PROGRAM_ID.fetch_add(1, Ordering::Relaxed)),
            name: name.into(),
            source: source.into(),
            attributes,
            uniforms: Vec::new(),
        }
    }

    /// Declare a uniform the program reads.
    pub fn with_uniform(mut self, name: impl Into<String>, ty: UniformType) -> Self {
        self.uniforms.push(UniformDecl {
            name: name.into(),
            ty,
        });
        self
    }

    pub fn id(&self) -> ProgramId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn attributes(&self) -> &ProgramAttributes {
        &self.attributes
    }

    pub fn uniforms(&self) -> &[UniformDecl] {
        &self.uniforms
    }

    pub fn uniform(&self, name: &str) -> Option<&UniformDecl> {
        self.uniforms.iter().find(|u| u.name == name)
    }

    /// True if the program samples a texture.
    pub fn has_texture(&self) -> bool {
        self.uniforms.iter().any(|u| u.ty == UniformType::Texture)
    }

    /// Size in bytes of the packed uniform buffer.
    pub fn uniform_buffer_size(&self) -> usize {
        self.uniforms
            .iter()
            .map(|u| u.ty.slots() * super::uniform::UNIFORM_SLOT_SIZE)
            .sum()
    }

    /// A program that cannot place vertices is unusable.
    pub fn validate(&self) -> Result<()> {
        if self.attributes.position.is_none() {
            return Err(Error::MissingPositionAttribute {
                program: self.name.clone(),
            });
        }
        Ok(())
    }
}
