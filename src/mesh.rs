//! Mesh data records, built-in primitives and GPU upload.
//!
//! Geometry starts life as a [`MeshData`]: plain flat arrays of floats and
//! indices, the same shape a file loader or a procedural generator would
//! produce. [`GpuMesh::upload`] validates the record and copies each
//! attribute into its own vertex buffer.
//!
//! # Vertex Layout
//!
//! Every attribute lives in a separate buffer, bound at its own slot:
//!
//! | Attribute | Format    | Slot / Location | Default when absent |
//! |-----------|-----------|-----------------|---------------------|
//! | position  | Float32x3 | 0               | required            |
//! | normal    | Float32x3 | 1               | `(0, 0, 0)`         |
//! | uv        | Float32x2 | 2               | `(0, 0)`            |
//! | color     | Float32x4 | 3               | opaque white        |

use wgpu::util::DeviceExt;

use crate::color::Color;
use crate::error::MeshError;
use crate::gpu::GpuContext;

/// How indices are assembled into primitives.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Topology {
    #[default]
    TriangleList,
    LineList,
}

impl Topology {
    pub(crate) fn to_wgpu(self) -> wgpu::PrimitiveTopology {
        match self {
            Topology::TriangleList => wgpu::PrimitiveTopology::TriangleList,
            Topology::LineList => wgpu::PrimitiveTopology::LineList,
        }
    }
}

/// Geometry as flat arrays.
///
/// `vertices` holds three floats per vertex. The optional attributes are
/// either empty or hold exactly one entry per vertex: three floats per
/// normal, two per uv, four (RGBA) per color. Every index must be below the
/// vertex count.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<f32>,
    pub indices: Vec<u32>,
    pub normals: Vec<f32>,
    pub uvs: Vec<f32>,
    pub colors: Vec<f32>,
}

impl MeshData {
    pub fn new(vertices: Vec<f32>, indices: Vec<u32>) -> Self {
        Self {
            vertices,
            indices,
            ..Default::default()
        }
    }

    pub fn with_normals(mut self, normals: Vec<f32>) -> Self {
        self.normals = normals;
        self
    }

    pub fn with_uvs(mut self, uvs: Vec<f32>) -> Self {
        self.uvs = uvs;
        self
    }

    pub fn with_colors(mut self, colors: Vec<f32>) -> Self {
        self.colors = colors;
        self
    }

    /// Replaces the colors with `color` repeated for every vertex.
    pub fn with_uniform_color(mut self, color: Color) -> Self {
        self.colors = repeat_color(color, self.vertex_count());
        self
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / 3
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    /// Checks the array shapes and index bounds. A mesh needs at least one
    /// vertex and one index.
    pub fn validate(&self) -> Result<(), MeshError> {
        check_width("vertices", &self.vertices, 3)?;
        let vertex_count = self.vertex_count();
        if vertex_count == 0 || self.indices.is_empty() {
            return Err(MeshError::Empty {
                vertices: vertex_count,
                indices: self.indices.len(),
            });
        }

        for (attribute, data, width) in [
            ("normals", &self.normals, 3),
            ("uvs", &self.uvs, 2),
            ("colors", &self.colors, 4),
        ] {
            if data.is_empty() {
                continue;
            }
            check_width(attribute, data, width)?;
            if data.len() / width != vertex_count {
                return Err(MeshError::AttributeCount {
                    attribute,
                    expected: vertex_count,
                    found: data.len() / width,
                });
            }
        }

        if let Some((position, &index)) = self
            .indices
            .iter()
            .enumerate()
            .find(|&(_, &index)| index as usize >= vertex_count)
        {
            return Err(MeshError::IndexOutOfRange {
                position,
                index,
                vertex_count,
            });
        }

        Ok(())
    }

    /// Unit cube centred on the origin (half-extent 0.5), four vertices per
    /// face with per-face normals and uvs.
    pub fn cube(color: Color) -> Self {
        #[rustfmt::skip]
        let vertices = vec![
            // front
            -0.5, -0.5,  0.5,   0.5, -0.5,  0.5,   0.5,  0.5,  0.5,  -0.5,  0.5,  0.5,
            // back
            -0.5, -0.5, -0.5,  -0.5,  0.5, -0.5,   0.5,  0.5, -0.5,   0.5, -0.5, -0.5,
            // top
            -0.5,  0.5, -0.5,  -0.5,  0.5,  0.5,   0.5,  0.5,  0.5,   0.5,  0.5, -0.5,
            // bottom
            -0.5, -0.5, -0.5,   0.5, -0.5, -0.5,   0.5, -0.5,  0.5,  -0.5, -0.5,  0.5,
            // right
             0.5, -0.5, -0.5,   0.5,  0.5, -0.5,   0.5,  0.5,  0.5,   0.5, -0.5,  0.5,
            // left
            -0.5, -0.5, -0.5,  -0.5, -0.5,  0.5,  -0.5,  0.5,  0.5,  -0.5,  0.5, -0.5,
        ];

        let face_normals = [
            [0.0, 0.0, 1.0],
            [0.0, 0.0, -1.0],
            [0.0, 1.0, 0.0],
            [0.0, -1.0, 0.0],
            [1.0, 0.0, 0.0],
            [-1.0, 0.0, 0.0],
        ];

        let mut normals = Vec::with_capacity(72);
        let mut uvs = Vec::with_capacity(48);
        let mut indices = Vec::with_capacity(36);
        for (face, normal) in face_normals.iter().enumerate() {
            for _ in 0..4 {
                normals.extend_from_slice(normal);
            }
            uvs.extend_from_slice(&[0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0]);
            let base = face as u32 * 4;
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }

        Self::new(vertices, indices)
            .with_normals(normals)
            .with_uvs(uvs)
            .with_uniform_color(color)
    }

    /// Square in the XZ plane spanning -1..1, facing +Y.
    pub fn plane(color: Color) -> Self {
        #[rustfmt::skip]
        let vertices = vec![
            -1.0, 0.0, -1.0,
            -1.0, 0.0,  1.0,
             1.0, 0.0,  1.0,
             1.0, 0.0, -1.0,
        ];

        Self::new(vertices, vec![0, 1, 2, 0, 2, 3])
            .with_normals([0.0, 1.0, 0.0].repeat(4))
            .with_uvs(vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0, 0.0])
            .with_uniform_color(color)
    }

    /// The twelve edges of the unit cube as a line list, for
    /// [`Topology::LineList`].
    pub fn wire_cube() -> Self {
        #[rustfmt::skip]
        let vertices = vec![
            -0.5, -0.5, -0.5,   0.5, -0.5, -0.5,
            -0.5, -0.5, -0.5,  -0.5, -0.5,  0.5,
            -0.5, -0.5, -0.5,  -0.5,  0.5, -0.5,
             0.5,  0.5,  0.5,   0.5,  0.5, -0.5,
             0.5,  0.5,  0.5,   0.5, -0.5,  0.5,
             0.5,  0.5,  0.5,  -0.5,  0.5,  0.5,
            -0.5,  0.5,  0.5,  -0.5, -0.5,  0.5,
            -0.5,  0.5, -0.5,  -0.5,  0.5,  0.5,
            -0.5, -0.5,  0.5,   0.5, -0.5,  0.5,
             0.5,  0.5, -0.5,  -0.5,  0.5, -0.5,
             0.5, -0.5, -0.5,   0.5, -0.5,  0.5,
             0.5, -0.5, -0.5,   0.5,  0.5, -0.5,
        ];
        let indices = (0..24).collect();
        Self::new(vertices, indices)
    }
}

fn check_width(attribute: &'static str, data: &[f32], width: usize) -> Result<(), MeshError> {
    if data.len() % width != 0 {
        return Err(MeshError::Ragged {
            attribute,
            len: data.len(),
            width,
        });
    }
    Ok(())
}

fn repeat_color(color: Color, count: usize) -> Vec<f32> {
    color.to_array().repeat(count)
}

/// Geometry resident on the GPU, one vertex buffer per attribute.
pub struct GpuMesh {
    pub positions: wgpu::Buffer,
    pub normals: wgpu::Buffer,
    pub uvs: wgpu::Buffer,
    pub colors: wgpu::Buffer,
    pub indices: wgpu::Buffer,
    pub index_count: u32,
    pub vertex_count: u32,
}

impl GpuMesh {
    /// Validates `data` and uploads it. Missing attributes are filled with
    /// their defaults so every material can bind every slot.
    pub fn upload(gpu: &GpuContext, data: &MeshData) -> Result<Self, MeshError> {
        data.validate()?;
        let vertex_count = data.vertex_count();

        let normals = or_default(&data.normals, 0.0, vertex_count * 3);
        let uvs = or_default(&data.uvs, 0.0, vertex_count * 2);
        let colors = if data.colors.is_empty() {
            repeat_color(Color::WHITE, vertex_count)
        } else {
            data.colors.clone()
        };

        let vertex_buffer = |label: &str, contents: &[f32]| {
            gpu.device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(label),
                    contents: bytemuck::cast_slice(contents),
                    usage: wgpu::BufferUsages::VERTEX,
                })
        };

        Ok(Self {
            positions: vertex_buffer("Mesh Position Buffer", &data.vertices),
            normals: vertex_buffer("Mesh Normal Buffer", &normals),
            uvs: vertex_buffer("Mesh UV Buffer", &uvs),
            colors: vertex_buffer("Mesh Color Buffer", &colors),
            indices: gpu
                .device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Mesh Index Buffer"),
                    contents: bytemuck::cast_slice(&data.indices),
                    usage: wgpu::BufferUsages::INDEX,
                }),
            index_count: data.indices.len() as u32,
            vertex_count: vertex_count as u32,
        })
    }

    /// The buffer bound at `slot` (see the module docs for the slot table).
    pub(crate) fn attribute_buffer(&self, slot: u32) -> Option<&wgpu::Buffer> {
        match slot {
            0 => Some(&self.positions),
            1 => Some(&self.normals),
            2 => Some(&self.uvs),
            3 => Some(&self.colors),
            _ => None,
        }
    }
}

fn or_default(data: &[f32], value: f32, len: usize) -> Vec<f32> {
    if data.is_empty() {
        vec![value; len]
    } else {
        data.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn cube_is_valid_and_unit_sized() {
        let cube = MeshData::cube(Color::WHITE);
        cube.validate().unwrap();
        assert_eq!(cube.vertex_count(), 24);
        assert_eq!(cube.index_count(), 36);
        assert_eq!(cube.colors.len(), 24 * 4);
        for &c in &cube.vertices {
            assert_eq!(c.abs(), 0.5);
        }
    }

    #[test]
    fn cube_triangles_wind_toward_their_normals() {
        let cube = MeshData::cube(Color::WHITE);
        let position = |i: u32| Vec3::from_slice(&cube.vertices[i as usize * 3..]);
        for tri in cube.indices.chunks_exact(3) {
            let (a, b, c) = (position(tri[0]), position(tri[1]), position(tri[2]));
            let face_normal = (b - a).cross(c - a).normalize();
            let stored = Vec3::from_slice(&cube.normals[tri[0] as usize * 3..]);
            assert!(face_normal.abs_diff_eq(stored, 1e-6), "{tri:?}");
        }
    }

    #[test]
    fn plane_faces_up() {
        let plane = MeshData::plane(Color::rgb(1.0, 0.0, 0.0));
        plane.validate().unwrap();
        assert_eq!(plane.vertex_count(), 4);
        assert_eq!(&plane.colors[..4], &[1.0, 0.0, 0.0, 1.0]);
        for normal in plane.normals.chunks_exact(3) {
            assert_eq!(normal, &[0.0, 1.0, 0.0]);
        }
    }

    #[test]
    fn wire_cube_is_a_line_list_of_edges() {
        let wire = MeshData::wire_cube();
        wire.validate().unwrap();
        assert_eq!(wire.vertex_count(), 24);
        assert_eq!(wire.index_count() % 2, 0);
        for edge in wire.vertices.chunks_exact(6) {
            let a = Vec3::from_slice(&edge[..3]);
            let b = Vec3::from_slice(&edge[3..]);
            assert!(((a - b).length() - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn validate_rejects_out_of_range_index() {
        let data = MeshData::new(vec![0.0; 9], vec![0, 1, 3]);
        match data.validate() {
            Err(MeshError::IndexOutOfRange {
                position,
                index,
                vertex_count,
            }) => {
                assert_eq!((position, index, vertex_count), (2, 3, 3));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn validate_rejects_ragged_and_mismatched_attributes() {
        let ragged = MeshData::new(vec![0.0; 8], vec![]);
        assert!(matches!(
            ragged.validate(),
            Err(MeshError::Ragged { attribute: "vertices", .. })
        ));

        let short_uvs = MeshData::new(vec![0.0; 9], vec![0, 1, 2]).with_uvs(vec![0.0; 4]);
        assert!(matches!(
            short_uvs.validate(),
            Err(MeshError::AttributeCount {
                attribute: "uvs",
                expected: 3,
                found: 2
            })
        ));
    }

    #[test]
    fn validate_rejects_empty_geometry() {
        assert!(matches!(
            MeshData::default().validate(),
            Err(MeshError::Empty { vertices: 0, indices: 0 })
        ));

        let no_indices = MeshData::new(vec![0.0; 9], vec![]);
        assert!(matches!(
            no_indices.validate(),
            Err(MeshError::Empty { vertices: 3, indices: 0 })
        ));

        let with_colors = MeshData::default().with_uniform_color(Color::WHITE);
        assert!(with_colors.colors.is_empty());
        assert!(with_colors.validate().is_err());
    }
}
