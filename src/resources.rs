//! Typed handles and the store of GPU-side assets they point into.

use crate::error::MeshError;
use crate::gpu::GpuContext;
use crate::material::Material;
use crate::mesh::{GpuMesh, MeshData};
use crate::texture::TextureStore;

/// Handle to an uploaded mesh.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MeshId(pub(crate) usize);

/// Handle to a registered material.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MaterialId(pub(crate) usize);

/// Handle to a texture, valid as soon as it is returned.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureId(pub(crate) usize);

/// Meshes, materials and textures referenced by draw commands.
#[derive(Default)]
pub struct RenderResources {
    meshes: Vec<GpuMesh>,
    materials: Vec<Box<dyn Material>>,
    pub textures: TextureStore,
}

impl RenderResources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates and uploads `data`.
    pub fn add_mesh(&mut self, gpu: &GpuContext, data: &MeshData) -> Result<MeshId, MeshError> {
        let mesh = GpuMesh::upload(gpu, data)?;
        let id = MeshId(self.meshes.len());
        self.meshes.push(mesh);
        Ok(id)
    }

    pub fn add_material(&mut self, material: impl Material + 'static) -> MaterialId {
        let id = MaterialId(self.materials.len());
        self.materials.push(Box::new(material));
        id
    }

    pub fn mesh(&self, id: MeshId) -> Option<&GpuMesh> {
        self.meshes.get(id.0)
    }

    pub fn material(&self, id: MaterialId) -> Option<&dyn Material> {
        self.materials.get(id.0).map(|m| m.as_ref())
    }

    /// Replaces a material in place; draws pick up the change next frame.
    pub fn set_material(&mut self, id: MaterialId, material: impl Material + 'static) {
        if let Some(slot) = self.materials.get_mut(id.0) {
            *slot = Box::new(material);
        }
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    pub fn material_count(&self) -> usize {
        self.materials.len()
    }
}
