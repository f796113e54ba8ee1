//! GPU vertex format shared by every quad batch.

use wgpu::{VertexAttribute, VertexBufferLayout, VertexFormat, VertexStepMode};

use crate::effect::ProgramAttributes;

/// One corner of a quad as it is uploaded to the GPU.
///
/// The colour is stored as it will be blended: premultiplied by alpha if the owning
/// vertex data uses premultiplied alpha, straight otherwise.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub tex_coords: [f32; 2],
    /// RGBA, normalized to `0.0..=1.0` in the shader
    pub color: [u8; 4],
}

const POSITION_OFFSET: u64 = 0;
const TEX_COORDS_OFFSET: u64 = 8;
const COLOR_OFFSET: u64 = 16;

impl Vertex {
    /// Attributes for the slots a program declares. Undeclared inputs are skipped.
    pub fn attributes(slots: &ProgramAttributes) -> Vec<VertexAttribute> {
        let mut attributes = Vec::with_capacity(3);
        if let Some(location) = slots.position {
            attributes.push(VertexAttribute {
                offset: POSITION_OFFSET,
                shader_location: location,
                format: VertexFormat::Float32x2,
            });
        }
        if let Some(location) = slots.tex_coords {
            attributes.push(VertexAttribute {
                offset: TEX_COORDS_OFFSET,
                shader_location: location,
                format: VertexFormat::Float32x2,
            });
        }
        if let Some(location) = slots.color {
            attributes.push(VertexAttribute {
                offset: COLOR_OFFSET,
                shader_location: location,
                format: VertexFormat::Unorm8x4,
            });
        }
        attributes
    }

    pub fn desc(attributes: &[VertexAttribute]) -> VertexBufferLayout<'_> {
        VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as u64,
            step_mode: VertexStepMode::Vertex,
            attributes,
        }
    }
}

/// Index pattern of one quad: two triangles sharing the 1-2 diagonal.
///
/// Vertices are laid out top-left, top-right, bottom-left, bottom-right.
pub const QUAD_INDICES: [u16; 6] = [
    0, 1, 2, // top-left, top-right, bottom-left
    1, 3, 2, // top-right, bottom-right, bottom-left
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_matches_struct() {
        assert_eq!(std::mem::size_of::<Vertex>(), 20);
        let slots = ProgramAttributes {
            position: Some(0),
            color: Some(1),
            tex_coords: None,
        };
        let attributes = Vertex::attributes(&slots);
        assert_eq!(attributes.len(), 2);
        assert_eq!(attributes[1].offset, COLOR_OFFSET);
        assert_eq!(attributes[1].shader_location, 1);
        assert_eq!(Vertex::desc(&attributes).array_stride, 20);
    }
}
