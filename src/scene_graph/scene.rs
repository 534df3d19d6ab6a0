use glam::{Mat4, Vec3};
use id_arena::Arena;
use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::error::SceneError;
use crate::material_manager::MaterialManager;
use crate::model::{Buffers, Model};
use crate::scene_graph::object3d::{Object3D, ObjectId};
use crate::scene_graph::scene_model::{SceneModel, SceneModelId};
use crate::scene_graph::selection::Selection;
use crate::scene_graph::transform::Transform;

pub struct Scene {
    pub objects: Arena<Object3D>,
    pub models: Arena<SceneModel>,
    pub materials: MaterialManager,
    gltf_mesh_to_model: HashMap<usize, SceneModelId>,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            objects: Arena::new(),
            models: Arena::new(),
            materials: MaterialManager::new(),
            gltf_mesh_to_model: HashMap::new(),
        }
    }

    /// Imports a glTF file and spawns the requested scene, falling back to the
    /// document's default scene and then to the first one.
    pub fn load_gltf(path: &Path, scene_index: Option<usize>) -> Result<Self, SceneError> {
        let (document, buffers, images) =
            gltf::import(path).map_err(|source| SceneError::Import {
                path: path.to_path_buf(),
                source,
            })?;

        let gltf_scene = match scene_index {
            Some(index) => document
                .scenes()
                .nth(index)
                .ok_or(SceneError::SceneIndexOutOfRange {
                    index,
                    count: document.scenes().count(),
                })?,
            None => document
                .default_scene()
                .or_else(|| document.scenes().next())
                .ok_or(SceneError::NoScenes)?,
        };

        let base_dir = path.parent().unwrap_or_else(|| Path::new(""));

        let mut scene = Scene::new();
        scene
            .materials
            .load_all_materials_from_gltf(base_dir, &document, &images);
        let roots = scene.spawn_gltf_scene(&buffers, &gltf_scene)?;

        log::info!(
            "Loaded scene {} from {}: {} objects ({} scene-level), {} models, {} materials",
            gltf_scene.name().unwrap_or("<unnamed>"),
            path.display(),
            scene.objects.len(),
            roots.len(),
            scene.models.len(),
            scene.materials.materials().count(),
        );
        for (_, scene_model) in scene.models.iter().filter(|(_, m)| m.users > 1) {
            log::debug!(
                "Mesh {} is shared by {} objects",
                scene_model.model.name,
                scene_model.users
            );
        }

        Ok(scene)
    }

    pub fn add_object(&mut self, object: Object3D) -> ObjectId {
        self.objects.alloc(object)
    }

    pub fn get_object(&self, id: ObjectId) -> Option<&Object3D> {
        self.objects.get(id)
    }

    pub fn get_object_mut(&mut self, id: ObjectId) -> Option<&mut Object3D> {
        self.objects.get_mut(id)
    }

    #[allow(dead_code)]
    pub fn get_object_by_name(&self, name: &str) -> Option<ObjectId> {
        self.objects
            .iter()
            .find(|(_, object)| object.name == name)
            .map(|(id, _)| id)
    }

    pub fn add_model(&mut self, model: SceneModel) -> SceneModelId {
        self.models.alloc(model)
    }

    pub fn get_model(&self, id: SceneModelId) -> Option<&SceneModel> {
        self.models.get(id)
    }

    pub fn spawn_gltf_scene(
        &mut self,
        buffers: Buffers,
        scene: &gltf::Scene,
    ) -> Result<Vec<ObjectId>, SceneError> {
        let mut visited = HashSet::new();

        scene
            .nodes()
            .map(|node| self.spawn_gltf_node(buffers, &node, None, &mut visited))
            .collect()
    }

    fn spawn_gltf_node(
        &mut self,
        buffers: Buffers,
        node: &gltf::Node,
        parent: Option<ObjectId>,
        visited: &mut HashSet<usize>,
    ) -> Result<ObjectId, SceneError> {
        if !visited.insert(node.index()) {
            return Err(SceneError::NodeRevisited {
                index: node.index(),
            });
        }

        let node_name = node
            .name()
            .map(String::from)
            .unwrap_or_else(|| format!("Node.{:03}", node.index()));

        let mut object = Object3D::new(node_name.clone());
        object.transform = Transform::from_gltf(node.transform());

        if let Some(mesh) = node.mesh() {
            let mesh_index = mesh.index();

            let model_id = match self.gltf_mesh_to_model.get(&mesh_index).copied() {
                Some(model_id) => model_id,
                None => {
                    let mesh_name = mesh
                        .name()
                        .map(String::from)
                        .unwrap_or_else(|| format!("{} (Mesh)", node_name));

                    let model = Model::from_gltf(&self.materials, mesh_name, mesh, buffers)?;
                    let model_id = self.add_model(SceneModel::new(model));
                    self.gltf_mesh_to_model.insert(mesh_index, model_id);

                    model_id
                }
            };

            if let Some(scene_model) = self.models.get_mut(model_id) {
                scene_model.users += 1;
            }

            object.model_id = Some(model_id);
        }

        let object_id = self.add_object(object);

        if let Some(parent_id) = parent {
            self.set_object_parent(object_id, Some(parent_id));
        }

        for child in node.children() {
            self.spawn_gltf_node(buffers, &child, Some(object_id), visited)?;
        }

        Ok(object_id)
    }

    /// Sets the parent of an object and updates child relationships
    pub fn set_object_parent(&mut self, child_id: ObjectId, new_parent_id: Option<ObjectId>) {
        // Remove from old parent's children list
        if let Some(child) = self.objects.get(child_id) {
            if let Some(old_parent_id) = child.parent_id {
                if let Some(old_parent) = self.objects.get_mut(old_parent_id) {
                    old_parent.child_ids.retain(|&id| id != child_id);
                }
            }
        }

        // Set new parent and add to new parent's children list
        if let Some(child) = self.objects.get_mut(child_id) {
            child.parent_id = new_parent_id;

            if let Some(new_parent_id) = new_parent_id {
                if let Some(new_parent) = self.objects.get_mut(new_parent_id) {
                    new_parent.child_ids.push(child_id);
                }
            }
        }
    }

    pub fn set_object_translation(&mut self, object_id: ObjectId, translation: Vec3) {
        if let Some(object) = self.objects.get_mut(object_id) {
            object.transform.set_translation(translation);
        }
    }

    pub fn object_translation(&self, object_id: ObjectId) -> Option<Vec3> {
        self.objects
            .get(object_id)
            .map(|object| object.transform.translation())
    }

    /// Composes local matrices from the object up to its scene-level ancestor.
    pub fn world_matrix(&self, object_id: ObjectId) -> Mat4 {
        let mut matrix = Mat4::IDENTITY;
        let mut current = Some(object_id);

        // A parent chain longer than the arena can only come from a cycle.
        for _ in 0..=self.objects.len() {
            let Some(object) = current.and_then(|id| self.objects.get(id)) else {
                break;
            };

            matrix = object.transform.local_matrix() * matrix;
            current = object.parent_id;
        }

        matrix
    }

    /// Objects without a parent, in registration order.
    pub fn scene_level_objects(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.objects
            .iter()
            .filter(|(_, object)| object.is_scene_level())
            .map(|(id, _)| id)
    }

    pub fn deselect_all(&mut self) {
        for (_, object) in self.objects.iter_mut() {
            object.selected = false;
        }
    }

    /// Selects the object and its whole descendant closure.
    pub fn select_recursively(&mut self, object_id: ObjectId) {
        let mut visited = HashSet::new();
        self.select_recursively_inner(object_id, &mut visited);
    }

    fn select_recursively_inner(&mut self, object_id: ObjectId, visited: &mut HashSet<ObjectId>) {
        if !visited.insert(object_id) {
            return;
        }

        let Some(object) = self.objects.get_mut(object_id) else {
            return;
        };

        object.selected = true;

        for child_id in object.child_ids.clone() {
            self.select_recursively_inner(child_id, visited);
        }
    }

    pub fn selection(&self) -> Selection {
        self.objects
            .iter()
            .filter(|(_, object)| object.selected)
            .map(|(id, _)| id)
            .collect()
    }
}
