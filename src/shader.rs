//! Lazily built render pipelines, one per shader kind and topology.

use std::collections::HashMap;

use log::{debug, error};

use crate::material::{MaterialUniforms, ShaderKind};
use crate::mesh::Topology;

pub(crate) const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Cache of compiled pipelines keyed by `(ShaderKind, Topology)`.
///
/// A pipeline is compiled the first time it is requested. Compilation runs
/// inside a validation error scope; a shader that fails to compile or link
/// is logged once and remembered as missing, and every later draw with it
/// is skipped.
pub struct ShaderRegistry {
    color_format: wgpu::TextureFormat,
    uniform_layout: wgpu::BindGroupLayout,
    texture_layout: wgpu::BindGroupLayout,
    pipelines: HashMap<(ShaderKind, Topology), Option<wgpu::RenderPipeline>>,
}

impl ShaderRegistry {
    pub fn new(device: &wgpu::Device, color_format: wgpu::TextureFormat) -> Self {
        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Material Uniform Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: wgpu::BufferSize::new(
                        std::mem::size_of::<MaterialUniforms>() as u64,
                    ),
                },
                count: None,
            }],
        });

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Material Texture Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        Self {
            color_format,
            uniform_layout,
            texture_layout,
            pipelines: HashMap::new(),
        }
    }

    pub fn uniform_layout(&self) -> &wgpu::BindGroupLayout {
        &self.uniform_layout
    }

    pub fn texture_layout(&self) -> &wgpu::BindGroupLayout {
        &self.texture_layout
    }

    /// Number of pipelines attempted so far, including failed ones.
    pub fn len(&self) -> usize {
        self.pipelines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pipelines.is_empty()
    }

    /// Compiles the pipeline on first use. `None` means it failed to build.
    pub fn pipeline(
        &mut self,
        device: &wgpu::Device,
        kind: ShaderKind,
        topology: Topology,
    ) -> Option<&wgpu::RenderPipeline> {
        if !self.pipelines.contains_key(&(kind, topology)) {
            let pipeline = self.compile(device, kind, topology);
            self.pipelines.insert((kind, topology), pipeline);
        }
        self.pipelines.get(&(kind, topology))?.as_ref()
    }

    /// Looks up an already compiled pipeline without compiling.
    pub fn cached(&self, kind: ShaderKind, topology: Topology) -> Option<&wgpu::RenderPipeline> {
        self.pipelines.get(&(kind, topology))?.as_ref()
    }

    fn compile(
        &self,
        device: &wgpu::Device,
        kind: ShaderKind,
        topology: Topology,
    ) -> Option<wgpu::RenderPipeline> {
        debug!("compiling {} for {:?}", kind.label(), topology);
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(kind.label()),
            source: wgpu::ShaderSource::Wgsl(kind.source().into()),
        });

        let mut bind_group_layouts = vec![&self.uniform_layout];
        if kind.samples_texture() {
            bind_group_layouts.push(&self.texture_layout);
        }
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(kind.label()),
            bind_group_layouts: &bind_group_layouts,
            push_constant_ranges: &[],
        });

        let buffers: Vec<wgpu::VertexBufferLayout<'static>> =
            kind.attributes().iter().map(|a| a.layout()).collect();

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(kind.label()),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &module,
                entry_point: Some("vs"),
                buffers: &buffers,
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &module,
                entry_point: Some("fs"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: self.color_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: topology.to_wgpu(),
                cull_mode: Some(wgpu::Face::Back),
                front_face: wgpu::FrontFace::Ccw,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        match pollster::block_on(device.pop_error_scope()) {
            Some(err) => {
                error!("{} failed to build: {err}", kind.label());
                None
            }
            None => Some(pipeline),
        }
    }
}
