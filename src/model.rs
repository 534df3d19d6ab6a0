use glam::{Vec2, Vec3};
use gltf::buffer;
use itertools::izip;

use crate::error::SceneError;
use crate::material_manager::{MaterialId, MaterialManager};

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub tex_coords: Vec2,
}

#[derive(Debug, Clone)]
pub struct ModelPrimitive {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub has_normals: bool,
    pub has_tex_coords: bool,
    pub material_id: Option<MaterialId>,
}

impl ModelPrimitive {
    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.indices
            .chunks_exact(3)
            .map(|triangle| [triangle[0], triangle[1], triangle[2]])
    }
}

#[derive(Debug, Clone)]
pub struct Model {
    pub name: String,
    pub primitives: Vec<ModelPrimitive>,
}

pub type Buffers<'a> = &'a [buffer::Data];

impl Model {
    pub fn from_gltf(
        material_manager: &MaterialManager,
        name: impl Into<String>,
        mesh: gltf::Mesh,
        buffers: Buffers,
    ) -> Result<Model, SceneError> {
        let mut model = Model {
            name: name.into(),
            primitives: Vec::new(),
        };

        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                return Err(SceneError::UnsupportedPrimitiveMode {
                    mesh: model.name,
                    mode: primitive.mode(),
                });
            }

            let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));

            let positions = reader
                .read_positions()
                .ok_or_else(|| SceneError::MissingPositions {
                    mesh: model.name.clone(),
                    primitive: primitive.index(),
                })?
                .map(Vec3::from)
                .collect::<Vec<_>>();

            let normals = reader
                .read_normals()
                .map(|normals| normals.map(Vec3::from).collect::<Vec<_>>());
            let tex_coords = reader
                .read_tex_coords(0)
                .map(|tex_coords| tex_coords.into_f32().map(Vec2::from).collect::<Vec<_>>());

            let attribute_mismatch = normals.as_ref().is_some_and(|n| n.len() != positions.len())
                || tex_coords
                    .as_ref()
                    .is_some_and(|t| t.len() != positions.len());
            if attribute_mismatch {
                return Err(SceneError::AttributeCountMismatch {
                    mesh: model.name,
                    primitive: primitive.index(),
                });
            }

            let has_normals = normals.is_some();
            let has_tex_coords = tex_coords.is_some();
            let vertex_count = positions.len();

            let vertices = izip!(
                positions,
                normals.unwrap_or_else(|| vec![Vec3::ZERO; vertex_count]),
                tex_coords.unwrap_or_else(|| vec![Vec2::ZERO; vertex_count])
            )
            .map(|(position, normal, tex_coords)| Vertex {
                position,
                normal,
                tex_coords,
            })
            .collect::<Vec<Vertex>>();

            let indices = match reader.read_indices() {
                Some(indices) => indices.into_u32().collect::<Vec<u32>>(),
                None => (0..vertex_count as u32).collect(),
            };

            let valid_indices = indices.len() % 3 == 0
                && indices.iter().all(|&index| (index as usize) < vertex_count);
            if !valid_indices {
                return Err(SceneError::InvalidIndices {
                    mesh: model.name,
                    primitive: primitive.index(),
                });
            }

            let material_id = primitive
                .material()
                .index()
                .and_then(|index| material_manager.get_gltf_material(index));

            model.primitives.push(ModelPrimitive {
                vertices,
                indices,
                has_normals,
                has_tex_coords,
                material_id,
            });
        }

        if model.primitives.is_empty() {
            log::warn!("Mesh without primitives: {}", model.name);
        }

        Ok(model)
    }
}
