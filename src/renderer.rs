//! Depth-tested forward pass over a frame's draw queue.
//!
//! [`SceneRenderer`] turns [`DrawCommand`]s into GPU draws. All per-draw
//! uniforms of a frame are packed into one buffer and addressed with dynamic
//! offsets, so a frame costs a single buffer write however many objects it
//! draws.
//!
//! # Bind groups
//!
//! - **Group 0**: [`MaterialUniforms`] (view-model, projection and normal
//!   matrices plus tint), dynamic offset per draw
//! - **Group 1**: texture and sampler, only for shaders that sample one.
//!   Built once per texture and rebuilt when an async load replaces it.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::hash::Hash;

use glam::Mat4;
use log::{debug, warn};

use crate::color::Color;
use crate::draw_queue::{DrawCommand, DrawQueue};
use crate::gpu::GpuContext;
use crate::material::{MaterialUniforms, ShaderKind};
use crate::mesh::{GpuMesh, Topology};
use crate::resources::{RenderResources, TextureId};
use crate::shader::{DEPTH_FORMAT, ShaderRegistry};
use crate::texture::Texture;

/// Rounds `size` up to a multiple of `alignment`.
pub(crate) fn align_to(size: u64, alignment: u64) -> u64 {
    size.div_ceil(alignment) * alignment
}

/// Which texture a draw samples.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum TextureSlot {
    /// The renderer's black fallback.
    Default,
    Store(TextureId),
}

/// Values built from a versioned resource, kept until the version changes.
struct GenerationCache<K, V> {
    entries: HashMap<K, (u64, V)>,
}

impl<K, V> Default for GenerationCache<K, V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash, V> GenerationCache<K, V> {
    /// The value for `key`, built if absent or if it was built for another
    /// generation.
    fn get_or_build(&mut self, key: K, generation: u64, build: impl FnOnce() -> V) -> &V {
        match self.entries.entry(key) {
            Entry::Occupied(mut entry) => {
                if entry.get().0 != generation {
                    entry.insert((generation, build()));
                }
                &entry.into_mut().1
            }
            Entry::Vacant(entry) => &entry.insert((generation, build())).1,
        }
    }

    fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key).map(|(_, value)| value)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// A draw that passed resource lookup and is ready to record.
struct PreparedDraw<'a> {
    mesh: &'a GpuMesh,
    shader: ShaderKind,
    topology: Topology,
    attribute_slots: Vec<u32>,
    uniform_offset: u32,
    texture: Option<TextureSlot>,
}

/// Draws the scene into the surface.
pub struct SceneRenderer {
    shaders: ShaderRegistry,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    uniform_stride: u64,
    uniform_capacity: usize,
    default_texture: Texture,
    texture_bind_groups: GenerationCache<TextureSlot, wgpu::BindGroup>,
    depth_view: wgpu::TextureView,
    depth_size: (u32, u32),
    clear_color: Color,
}

impl SceneRenderer {
    pub fn new(gpu: &GpuContext, clear_color: Color) -> Self {
        let shaders = ShaderRegistry::new(&gpu.device, gpu.config.format);
        let alignment = gpu.device.limits().min_uniform_buffer_offset_alignment as u64;
        let uniform_stride = align_to(std::mem::size_of::<MaterialUniforms>() as u64, alignment);
        let uniform_capacity = 64;
        let (uniform_buffer, uniform_bind_group) =
            Self::create_uniforms(gpu, &shaders, uniform_stride, uniform_capacity);

        // Lit materials without a texture sample black and fall back to
        // their vertex colour.
        let default_texture = Texture::from_rgba(gpu, &[0, 0, 0, 255], 1, 1, "Default Black Texture")
            .unwrap_or_else(|_| Texture::placeholder(gpu));

        Self {
            shaders,
            uniform_buffer,
            uniform_bind_group,
            uniform_stride,
            uniform_capacity,
            default_texture,
            texture_bind_groups: GenerationCache::default(),
            depth_view: Self::create_depth_view(gpu),
            depth_size: (gpu.width(), gpu.height()),
            clear_color,
        }
    }

    pub fn clear_color(&self) -> Color {
        self.clear_color
    }

    pub fn set_clear_color(&mut self, color: Color) {
        self.clear_color = color;
    }

    pub fn shaders(&self) -> &ShaderRegistry {
        &self.shaders
    }

    fn create_uniforms(
        gpu: &GpuContext,
        shaders: &ShaderRegistry,
        stride: u64,
        capacity: usize,
    ) -> (wgpu::Buffer, wgpu::BindGroup) {
        let buffer = gpu.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Material Uniforms"),
            size: stride * capacity as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Material Uniform Bind Group"),
            layout: shaders.uniform_layout(),
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(std::mem::size_of::<MaterialUniforms>() as u64),
                }),
            }],
        });

        (buffer, bind_group)
    }

    fn ensure_uniform_capacity(&mut self, gpu: &GpuContext, draws: usize) {
        if draws <= self.uniform_capacity {
            return;
        }
        let capacity = draws.next_power_of_two();
        let (buffer, bind_group) =
            Self::create_uniforms(gpu, &self.shaders, self.uniform_stride, capacity);
        self.uniform_buffer = buffer;
        self.uniform_bind_group = bind_group;
        self.uniform_capacity = capacity;
    }

    fn create_depth_view(gpu: &GpuContext) -> wgpu::TextureView {
        let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Depth Texture"),
            size: wgpu::Extent3d {
                width: gpu.width(),
                height: gpu.height(),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&wgpu::TextureViewDescriptor::default())
    }

    /// Recreates the depth buffer if the surface size changed.
    pub fn ensure_depth_size(&mut self, gpu: &GpuContext) {
        if self.depth_size != (gpu.width(), gpu.height()) {
            self.depth_view = Self::create_depth_view(gpu);
            self.depth_size = (gpu.width(), gpu.height());
        }
    }

    fn create_texture_bind_group(
        gpu: &GpuContext,
        layout: &wgpu::BindGroupLayout,
        texture: &Texture,
    ) -> wgpu::BindGroup {
        gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Material Texture Bind Group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&texture.sampler),
                },
            ],
        })
    }

    /// Resolves resources, fills uniforms and compiles any missing
    /// pipelines. Draws whose mesh, material or pipeline is unavailable are
    /// dropped here.
    fn prepare<'a>(
        &mut self,
        gpu: &GpuContext,
        resources: &'a RenderResources,
        commands: &[DrawCommand],
        view: Mat4,
        projection: Mat4,
    ) -> (Vec<PreparedDraw<'a>>, Vec<u8>) {
        let stride = self.uniform_stride as usize;
        let mut staging = vec![0u8; stride * commands.len()];
        let mut prepared = Vec::with_capacity(commands.len());

        for command in commands {
            let (Some(mesh), Some(material)) = (
                resources.mesh(command.mesh),
                resources.material(command.material),
            ) else {
                warn!("skipping draw with unknown mesh or material: {command:?}");
                continue;
            };

            let shader = material.shader();
            if self
                .shaders
                .pipeline(&gpu.device, shader, command.topology)
                .is_none()
            {
                continue;
            }

            let mut uniforms = MaterialUniforms::new(view * command.model, projection);
            material.set_uniforms(&mut uniforms);
            let offset = prepared.len() * stride;
            let bytes = bytemuck::bytes_of(&uniforms);
            staging[offset..offset + bytes.len()].copy_from_slice(bytes);

            let mut texture = None;
            if shader.samples_texture() {
                let stored = material.bind_texture().and_then(|id| {
                    let generation = resources.textures.generation(id)?;
                    Some((TextureSlot::Store(id), generation, resources.textures.get(id)?))
                });
                let (slot, generation, bound) =
                    stored.unwrap_or((TextureSlot::Default, 0, &self.default_texture));
                let layout = self.shaders.texture_layout();
                self.texture_bind_groups.get_or_build(slot, generation, || {
                    debug!("building texture bind group for {slot:?} (generation {generation})");
                    Self::create_texture_bind_group(gpu, layout, bound)
                });
                texture = Some(slot);
            }

            prepared.push(PreparedDraw {
                mesh,
                shader,
                topology: command.topology,
                attribute_slots: material.declare_attributes().iter().map(|a| a.slot()).collect(),
                uniform_offset: offset as u32,
                texture,
            });
        }

        staging.truncate(prepared.len() * stride);
        (prepared, staging)
    }

    /// Renders `draws` with the given camera matrices and presents the frame.
    pub fn render(
        &mut self,
        gpu: &GpuContext,
        resources: &RenderResources,
        draws: &DrawQueue,
        view: Mat4,
        projection: Mat4,
    ) -> Result<(), wgpu::SurfaceError> {
        self.ensure_depth_size(gpu);
        self.ensure_uniform_capacity(gpu, draws.len());

        let (prepared, staging) = self.prepare(gpu, resources, draws.as_slice(), view, projection);
        if !staging.is_empty() {
            gpu.queue.write_buffer(&self.uniform_buffer, 0, &staging);
        }

        let output = gpu.surface.get_current_texture()?;
        let screen_view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Scene Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &screen_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color.to_wgpu()),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            for draw in &prepared {
                let Some(pipeline) = self.shaders.cached(draw.shader, draw.topology) else {
                    continue;
                };
                render_pass.set_pipeline(pipeline);
                render_pass.set_bind_group(0, &self.uniform_bind_group, &[draw.uniform_offset]);
                let texture_bind_group = draw
                    .texture
                    .and_then(|slot| self.texture_bind_groups.get(&slot));
                if let Some(bind_group) = texture_bind_group {
                    render_pass.set_bind_group(1, bind_group, &[]);
                }
                for (index, &slot) in draw.attribute_slots.iter().enumerate() {
                    if let Some(buffer) = draw.mesh.attribute_buffer(slot) {
                        render_pass.set_vertex_buffer(index as u32, buffer.slice(..));
                    }
                }
                render_pass.set_index_buffer(draw.mesh.indices.slice(..), wgpu::IndexFormat::Uint32);
                render_pass.draw_indexed(0..draw.mesh.index_count, 0, 0..1);
            }
        }

        gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_stride_respects_offset_alignment() {
        let size = std::mem::size_of::<MaterialUniforms>() as u64;
        assert_eq!(align_to(size, 256), 256);
        assert_eq!(align_to(size, 16), size);
        assert_eq!(align_to(257, 256), 512);
        assert_eq!(align_to(0, 256), 0);
    }

    #[test]
    fn cached_values_are_rebuilt_only_for_a_new_generation() {
        let mut cache = GenerationCache::default();
        let mut builds = 0;
        let mut build = |label: &str| {
            builds += 1;
            format!("{label}{builds}")
        };

        let key = TextureSlot::Store(TextureId(3));
        assert_eq!(cache.get_or_build(key, 0, || build("a")), "a1");
        assert_eq!(cache.get_or_build(key, 0, || build("b")), "a1");
        assert_eq!(cache.get_or_build(key, 1, || build("c")), "c2");
        assert_eq!(cache.get(&key).map(String::as_str), Some("c2"));

        assert_eq!(cache.get_or_build(TextureSlot::Default, 0, || build("d")), "d3");
        assert_eq!(cache.len(), 2);
        assert_eq!(builds, 3);
    }
}
