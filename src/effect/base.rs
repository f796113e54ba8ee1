//! Standard effects used by batches without a custom effect.

use std::sync::{Arc, OnceLock};

use super::{Effect, Program, ProgramAttributes, UniformType, MAIN_TEXTURE, MVP_MATRIX, TINT_COLOR};

const COLORED_SHADER: &str = r#"
struct Uniforms {
    mvp_matrix: mat4x4<f32>,
    tint_color: vec4<f32>,
}

@group(0) @binding(0) var<uniform> uniforms: Uniforms;

struct VertexInput {
    @location(0) position: vec2<f32>,
    @location(1) color: vec4<f32>,
}

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec4<f32>,
}

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = uniforms.mvp_matrix * vec4<f32>(in.position, 0.0, 1.0);
    out.color = in.color * uniforms.tint_color;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return in.color;
}
"#;

const TEXTURED_SHADER: &str = r#"
struct Uniforms {
    mvp_matrix: mat4x4<f32>,
}

@group(0) @binding(0) var<uniform> uniforms: Uniforms;
@group(0) @binding(1) var main_texture: texture_2d<f32>;
@group(0) @binding(2) var main_sampler: sampler;

struct VertexInput {
    @location(0) position: vec2<f32>,
    @location(2) tex_coords: vec2<f32>,
}

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) tex_coords: vec2<f32>,
}

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = uniforms.mvp_matrix * vec4<f32>(in.position, 0.0, 1.0);
    out.tex_coords = in.tex_coords;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return textureSample(main_texture, main_sampler, in.tex_coords);
}
"#;

const TEXTURED_TINTED_SHADER: &str = r#"
struct Uniforms {
    mvp_matrix: mat4x4<f32>,
    tint_color: vec4<f32>,
}

@group(0) @binding(0) var<uniform> uniforms: Uniforms;
@group(0) @binding(1) var main_texture: texture_2d<f32>;
@group(0) @binding(2) var main_sampler: sampler;

struct VertexInput {
    @location(0) position: vec2<f32>,
    @location(1) color: vec4<f32>,
    @location(2) tex_coords: vec2<f32>,
}

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec4<f32>,
    @location(1) tex_coords: vec2<f32>,
}

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = uniforms.mvp_matrix * vec4<f32>(in.position, 0.0, 1.0);
    out.color = in.color * uniforms.tint_color;
    out.tex_coords = in.tex_coords;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return textureSample(main_texture, main_sampler, in.tex_coords) * in.color;
}
"#;

struct BaseEffects {
    colored: Arc<Effect>,
    textured: Arc<Effect>,
    textured_tinted: Arc<Effect>,
}

static BASE_EFFECTS: OnceLock<BaseEffects> = OnceLock::new();

fn build() -> BaseEffects {
    let colored = Program::new("base_colored", COLORED_SHADER, ProgramAttributes {
        position: Some(0),
        color: Some(1),
        tex_coords: None,
    })
    .with_uniform(MVP_MATRIX, UniformType::Mat4)
    .with_uniform(TINT_COLOR, UniformType::Vec4);

    let textured = Program::new("base_textured", TEXTURED_SHADER, ProgramAttributes {
        position: Some(0),
        color: None,
        tex_coords: Some(2),
    })
    .with_uniform(MVP_MATRIX, UniformType::Mat4)
    .with_uniform(MAIN_TEXTURE, UniformType::Texture);

    let textured_tinted = Program::new(
        "base_textured_tinted",
        TEXTURED_TINTED_SHADER,
        ProgramAttributes {
            position: Some(0),
            color: Some(1),
            tex_coords: Some(2),
        },
    )
    .with_uniform(MVP_MATRIX, UniformType::Mat4)
    .with_uniform(TINT_COLOR, UniformType::Vec4)
    .with_uniform(MAIN_TEXTURE, UniformType::Texture);

    BaseEffects {
        colored: Arc::new(Effect::new(Arc::new(colored))),
        textured: Arc::new(Effect::new(Arc::new(textured))),
        textured_tinted: Arc::new(Effect::new(Arc::new(textured_tinted))),
    }
}

/// The standard effect for a batch. Untextured batches always use vertex colours, so
/// `tinted` only matters for textured ones.
pub fn base_effect(textured: bool, tinted: bool) -> Arc<Effect> {
    let effects = BASE_EFFECTS.get_or_init(build);
    match (textured, tinted) {
        (false, _) => effects.colored.clone(),
        (true, false) => effects.textured.clone(),
        (true, true) => effects.textured_tinted.clone(),
    }
}
