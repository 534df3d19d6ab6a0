use std::collections::HashMap;
use std::path::Path;

use glam::{Vec3, Vec4};
use id_arena::{Arena, Id};

use crate::asset_pipeline::materials::{MaterialData, TextureSource};

pub type MaterialId = Id<MaterialData>;

pub struct MaterialManager {
    materials: Arena<MaterialData>,
    materials_by_gltf: HashMap<usize, MaterialId>,
}

impl MaterialManager {
    pub fn new() -> Self {
        Self {
            materials: Arena::new(),
            materials_by_gltf: HashMap::new(),
        }
    }

    pub fn add_material(&mut self, material_data: MaterialData) -> MaterialId {
        self.materials.alloc(material_data)
    }

    pub fn get(&self, id: MaterialId) -> Option<&MaterialData> {
        self.materials.get(id)
    }

    pub fn get_gltf_material(&self, material_index: usize) -> Option<MaterialId> {
        self.materials_by_gltf.get(&material_index).copied()
    }

    pub fn load_all_materials_from_gltf(
        &mut self,
        base_dir: &Path,
        document: &gltf::Document,
        images: &[gltf::image::Data],
    ) {
        for material in document.materials() {
            let Some(material_index) = material.index() else {
                continue;
            };

            if self.materials_by_gltf.contains_key(&material_index) {
                continue;
            }

            let name = material
                .name()
                .map(String::from)
                .unwrap_or_else(|| format!("Material.{:03}", material_index));

            let pbr = material.pbr_metallic_roughness();

            let material_data = MaterialData {
                name,
                base_color: Vec4::from_array(pbr.base_color_factor()),
                metallic: pbr.metallic_factor(),
                roughness: pbr.roughness_factor(),
                emissive: Vec3::from_array(material.emissive_factor()),
                base_color_texture: pbr
                    .base_color_texture()
                    .and_then(|info| TextureSource::from_gltf(base_dir, info.texture(), images)),
                normal_texture: material
                    .normal_texture()
                    .and_then(|normal| TextureSource::from_gltf(base_dir, normal.texture(), images)),
                emissive_texture: material
                    .emissive_texture()
                    .and_then(|info| TextureSource::from_gltf(base_dir, info.texture(), images)),
            };

            log::debug!("Loaded material {}", material_data.name);

            let id = self.add_material(material_data);
            self.materials_by_gltf.insert(material_index, id);
        }
    }

    pub fn materials(&self) -> impl Iterator<Item = &MaterialData> {
        self.materials.iter().map(|(_, material)| material)
    }
}
