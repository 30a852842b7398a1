//! Materials: which shader a draw uses and what it feeds it.
//!
//! A material does not own GPU state. It names its [`ShaderKind`], lists
//! the vertex attributes that shader reads, fills the per-draw
//! [`MaterialUniforms`] and optionally names a texture. Pipelines live in
//! the [`ShaderRegistry`](crate::ShaderRegistry), created the first time a
//! shader kind is drawn.

use glam::Mat4;

use crate::color::Color;
use crate::resources::TextureId;

/// The shader programs known to the renderer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShaderKind {
    /// Flat colour, positions only.
    Unlit,
    /// Diffuse lighting over a texture, falling back to vertex colour.
    LitTexture,
}

impl ShaderKind {
    pub fn label(self) -> &'static str {
        match self {
            ShaderKind::Unlit => "Unlit Shader",
            ShaderKind::LitTexture => "Lit Texture Shader",
        }
    }

    pub(crate) fn source(self) -> &'static str {
        match self {
            ShaderKind::Unlit => include_str!("shaders/unlit.wgsl"),
            ShaderKind::LitTexture => include_str!("shaders/lit_texture.wgsl"),
        }
    }

    /// Vertex attributes the shader reads, in slot order.
    pub fn attributes(self) -> &'static [VertexAttribute] {
        match self {
            ShaderKind::Unlit => &[VertexAttribute::Position],
            ShaderKind::LitTexture => &[
                VertexAttribute::Position,
                VertexAttribute::Normal,
                VertexAttribute::Uv,
                VertexAttribute::Color,
            ],
        }
    }

    /// Whether the pipeline layout has a texture bind group.
    pub fn samples_texture(self) -> bool {
        matches!(self, ShaderKind::LitTexture)
    }
}

/// A per-vertex input. Each attribute has its own buffer and slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VertexAttribute {
    Position,
    Normal,
    Uv,
    Color,
}

const POSITION: [wgpu::VertexAttribute; 1] = [wgpu::VertexAttribute {
    format: wgpu::VertexFormat::Float32x3,
    offset: 0,
    shader_location: 0,
}];
const NORMAL: [wgpu::VertexAttribute; 1] = [wgpu::VertexAttribute {
    format: wgpu::VertexFormat::Float32x3,
    offset: 0,
    shader_location: 1,
}];
const UV: [wgpu::VertexAttribute; 1] = [wgpu::VertexAttribute {
    format: wgpu::VertexFormat::Float32x2,
    offset: 0,
    shader_location: 2,
}];
const COLOR: [wgpu::VertexAttribute; 1] = [wgpu::VertexAttribute {
    format: wgpu::VertexFormat::Float32x4,
    offset: 0,
    shader_location: 3,
}];

impl VertexAttribute {
    /// Buffer slot and shader location.
    pub fn slot(self) -> u32 {
        match self {
            VertexAttribute::Position => 0,
            VertexAttribute::Normal => 1,
            VertexAttribute::Uv => 2,
            VertexAttribute::Color => 3,
        }
    }

    /// Number of floats per vertex.
    pub fn components(self) -> usize {
        match self {
            VertexAttribute::Position | VertexAttribute::Normal => 3,
            VertexAttribute::Uv => 2,
            VertexAttribute::Color => 4,
        }
    }

    pub fn layout(self) -> wgpu::VertexBufferLayout<'static> {
        let attributes: &'static [wgpu::VertexAttribute] = match self {
            VertexAttribute::Position => &POSITION,
            VertexAttribute::Normal => &NORMAL,
            VertexAttribute::Uv => &UV,
            VertexAttribute::Color => &COLOR,
        };
        wgpu::VertexBufferLayout {
            array_stride: (self.components() * std::mem::size_of::<f32>()) as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes,
        }
    }
}

/// Per-draw uniform block shared by every shader (group 0, binding 0).
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniforms {
    /// `view * model`.
    pub view_model: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    /// Inverse transpose of `view_model`, for view-space normals.
    pub normal_matrix: [[f32; 4]; 4],
    pub tint: [f32; 4],
}

impl MaterialUniforms {
    pub fn new(view_model: Mat4, projection: Mat4) -> Self {
        Self {
            view_model: view_model.to_cols_array_2d(),
            projection: projection.to_cols_array_2d(),
            normal_matrix: view_model.inverse().transpose().to_cols_array_2d(),
            tint: Color::WHITE.to_array(),
        }
    }
}

/// What a draw needs from its material.
pub trait Material {
    /// Shader program used to draw with this material.
    fn shader(&self) -> ShaderKind;

    /// Vertex attributes this material feeds its shader.
    fn declare_attributes(&self) -> &'static [VertexAttribute] {
        self.shader().attributes()
    }

    /// Writes material parameters into the per-draw uniforms. The matrices
    /// are already filled in.
    fn set_uniforms(&self, uniforms: &mut MaterialUniforms);

    /// Texture bound at group 1, if the shader samples one.
    fn bind_texture(&self) -> Option<TextureId> {
        None
    }
}

/// Solid colour, no lighting.
#[derive(Clone, Copy, Debug)]
pub struct UnlitMaterial {
    pub color: Color,
}

impl UnlitMaterial {
    pub fn new(color: Color) -> Self {
        Self { color }
    }
}

impl Material for UnlitMaterial {
    fn shader(&self) -> ShaderKind {
        ShaderKind::Unlit
    }

    fn set_uniforms(&self, uniforms: &mut MaterialUniforms) {
        uniforms.tint = self.color.to_array();
    }
}

/// Diffuse-lit texture. Black texels (and the default black texture used
/// when `texture` is `None`) show the lit vertex colour instead.
#[derive(Clone, Copy, Debug, Default)]
pub struct LitTextureMaterial {
    pub texture: Option<TextureId>,
}

impl LitTextureMaterial {
    pub fn new(texture: Option<TextureId>) -> Self {
        Self { texture }
    }
}

impl Material for LitTextureMaterial {
    fn shader(&self) -> ShaderKind {
        ShaderKind::LitTexture
    }

    fn set_uniforms(&self, uniforms: &mut MaterialUniforms) {
        uniforms.tint = Color::WHITE.to_array();
    }

    fn bind_texture(&self) -> Option<TextureId> {
        self.texture
    }
}
