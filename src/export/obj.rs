use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::Context;
use glam::{Mat3, Vec3};
use itertools::Itertools;

use crate::export::mtl::write_mtl;
use crate::export::path_mode::TextureReferencer;
use crate::export::{statement_name, ExportOptions, Exporter};
use crate::material_manager::MaterialId;
use crate::math::bounds::AABB;
use crate::model::Model;
use crate::scene_graph::{ObjectId, Scene, Selection};

#[derive(Debug, Default)]
pub struct ObjExporter;

impl ObjExporter {
    pub fn new() -> Self {
        Self
    }
}

impl Exporter for ObjExporter {
    fn export_selection(
        &mut self,
        scene: &Scene,
        selection: &Selection,
        target: &Path,
        options: &ExportOptions,
    ) -> anyhow::Result<()> {
        let output_dir = target.parent().unwrap_or_else(|| Path::new(""));
        // Raw object name, spaces included, as Blender writes it. Strict OBJ
        // readers split such an `mtllib` line into several library names.
        let mtl_path = target.with_extension("mtl");
        let mtl_file_name = mtl_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .with_context(|| format!("Invalid export path {}", target.display()))?;

        let file = File::create(target)
            .with_context(|| format!("Failed to create {}", target.display()))?;
        let mut writer = BufWriter::new(file);
        let stats = write_obj(&mut writer, scene, selection, &mtl_file_name)?;
        writer
            .flush()
            .with_context(|| format!("Failed to write {}", target.display()))?;

        let materials = used_materials(scene, selection)
            .filter_map(|id| scene.materials.get(id))
            .collect::<Vec<_>>();
        let textures = TextureReferencer::new(options.path_mode, output_dir);

        let file = File::create(&mtl_path)
            .with_context(|| format!("Failed to create {}", mtl_path.display()))?;
        let mut writer = BufWriter::new(file);
        write_mtl(&mut writer, &materials, &textures)?;
        writer
            .flush()
            .with_context(|| format!("Failed to write {}", mtl_path.display()))?;

        log::debug!(
            "{}: {} objects, {} vertices, {} triangles, {} materials",
            target.display(),
            stats.objects,
            stats.vertices,
            stats.triangles,
            materials.len()
        );
        if let Some(bounds) = stats.bounds {
            log::debug!(
                "{}: bounds {} .. {} (center {})",
                target.display(),
                bounds.min,
                bounds.max,
                bounds.center()
            );
        }

        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct ObjStats {
    pub objects: usize,
    pub vertices: usize,
    pub triangles: usize,
    pub bounds: Option<AABB>,
}

/// Selected objects that carry geometry, in selection order.
fn selected_models<'a>(
    scene: &'a Scene,
    selection: &'a Selection,
) -> impl Iterator<Item = (ObjectId, &'a str, &'a Model)> + 'a {
    selection.iter().filter_map(move |id| {
        let object = scene.get_object(id)?;
        let scene_model = scene.get_model(object.model_id?)?;
        Some((id, object.name.as_str(), &scene_model.model))
    })
}

fn used_materials<'a>(
    scene: &'a Scene,
    selection: &'a Selection,
) -> impl Iterator<Item = MaterialId> + 'a {
    selected_models(scene, selection)
        .flat_map(|(_, _, model)| model.primitives.iter())
        .filter_map(|primitive| primitive.material_id)
        .unique()
}

pub fn write_obj<W: Write>(
    out: &mut W,
    scene: &Scene,
    selection: &Selection,
    mtl_file_name: &str,
) -> anyhow::Result<ObjStats> {
    let mut stats = ObjStats::default();
    let mut written_positions = Vec::new();
    // OBJ indices are 1-based and global to the file.
    let mut next_position = 1;
    let mut next_tex_coord = 1;
    let mut next_normal = 1;

    writeln!(out, "# scene-split OBJ File")?;
    writeln!(out, "mtllib {}", mtl_file_name)?;

    for (id, name, model) in selected_models(scene, selection) {
        let world = scene.world_matrix(id);
        let normal_matrix = Mat3::from_mat4(world).inverse().transpose();

        writeln!(out, "o {}", statement_name(name))?;
        stats.objects += 1;

        for primitive in &model.primitives {
            for vertex in &primitive.vertices {
                let position = world.transform_point3(vertex.position);
                writeln!(out, "v {:.6} {:.6} {:.6}", position.x, position.y, position.z)?;
                written_positions.push(position);
            }

            if primitive.has_tex_coords {
                for vertex in &primitive.vertices {
                    // glTF puts the UV origin top-left, OBJ bottom-left.
                    writeln!(
                        out,
                        "vt {:.6} {:.6}",
                        vertex.tex_coords.x,
                        1.0 - vertex.tex_coords.y
                    )?;
                }
            }

            if primitive.has_normals {
                for vertex in &primitive.vertices {
                    let normal = transform_normal(normal_matrix, vertex.normal);
                    writeln!(out, "vn {:.4} {:.4} {:.4}", normal.x, normal.y, normal.z)?;
                }
            }

            if let Some(material) = primitive
                .material_id
                .and_then(|material_id| scene.materials.get(material_id))
            {
                writeln!(out, "usemtl {}", statement_name(&material.name))?;
            }
            writeln!(out, "s off")?;

            for triangle in primitive.triangles() {
                let corners = triangle.map(|index| {
                    let position = next_position + index as usize;
                    let tex_coord = primitive
                        .has_tex_coords
                        .then(|| next_tex_coord + index as usize);
                    let normal = primitive.has_normals.then(|| next_normal + index as usize);

                    match (tex_coord, normal) {
                        (Some(vt), Some(vn)) => format!("{position}/{vt}/{vn}"),
                        (Some(vt), None) => format!("{position}/{vt}"),
                        (None, Some(vn)) => format!("{position}//{vn}"),
                        (None, None) => format!("{position}"),
                    }
                });

                writeln!(out, "f {}", corners.join(" "))?;
                stats.triangles += 1;
            }

            let vertex_count = primitive.vertices.len();
            next_position += vertex_count;
            if primitive.has_tex_coords {
                next_tex_coord += vertex_count;
            }
            if primitive.has_normals {
                next_normal += vertex_count;
            }
            stats.vertices += vertex_count;
        }
    }

    stats.bounds = AABB::from_points(written_positions);

    Ok(stats)
}

fn transform_normal(normal_matrix: Mat3, normal: Vec3) -> Vec3 {
    let transformed = normal_matrix * normal;

    if transformed.is_finite() {
        transformed.normalize_or_zero()
    } else {
        Vec3::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset_pipeline::materials::MaterialData;
    use crate::model::{ModelPrimitive, Vertex};
    use crate::scene_graph::scene_model::SceneModel;
    use crate::scene_graph::Object3D;
    use glam::{Quat, Vec2};

    fn triangle(material_id: Option<MaterialId>, normals: bool, tex_coords: bool) -> ModelPrimitive {
        let vertex = |x: f32, y: f32| Vertex {
            position: Vec3::new(x, y, 0.0),
            normal: Vec3::Z,
            tex_coords: Vec2::new(x, y),
        };

        ModelPrimitive {
            vertices: vec![vertex(0.0, 0.0), vertex(1.0, 0.0), vertex(0.0, 1.0)],
            indices: vec![0, 1, 2],
            has_normals: normals,
            has_tex_coords: tex_coords,
            material_id,
        }
    }

    fn object_with_primitive(
        scene: &mut Scene,
        name: &str,
        primitive: ModelPrimitive,
    ) -> ObjectId {
        let model_id = scene.add_model(SceneModel::new(Model {
            name: format!("{name} (Mesh)"),
            primitives: vec![primitive],
        }));
        let mut object = Object3D::new(name);
        object.model_id = Some(model_id);
        scene.add_object(object)
    }

    fn obj_text(scene: &mut Scene, roots: &[ObjectId]) -> (String, ObjStats) {
        scene.deselect_all();
        for &root in roots {
            scene.select_recursively(root);
        }

        let mut out = Vec::new();
        let stats = write_obj(&mut out, scene, &scene.selection(), "Test.mtl").unwrap();
        (String::from_utf8(out).unwrap(), stats)
    }

    #[test]
    fn writes_world_space_vertices_for_the_subtree() {
        let mut scene = Scene::new();
        let root = object_with_primitive(&mut scene, "Root", triangle(None, false, false));
        let child = object_with_primitive(&mut scene, "Child", triangle(None, false, false));
        scene.set_object_parent(child, Some(root));
        scene.set_object_translation(child, Vec3::new(0.0, 0.0, 2.0));

        let (obj, stats) = obj_text(&mut scene, &[root]);

        assert!(obj.starts_with("# scene-split OBJ File\nmtllib Test.mtl\n"));
        assert!(obj.contains("o Root\nv 0.000000 0.000000 0.000000\n"));
        assert!(obj.contains("o Child\nv 0.000000 0.000000 2.000000\n"));
        // The child's face indices continue after the root's three vertices.
        assert!(obj.contains("f 1 2 3\n"));
        assert!(obj.contains("f 4 5 6\n"));
        assert_eq!(stats.objects, 2);
        assert_eq!(stats.vertices, 6);
        assert_eq!(stats.triangles, 2);

        let bounds = stats.bounds.unwrap();
        assert_eq!(bounds.min, Vec3::ZERO);
        assert_eq!(bounds.max, Vec3::new(1.0, 1.0, 2.0));
    }

    #[test]
    fn face_format_follows_available_attributes() {
        let mut scene = Scene::new();
        let full = object_with_primitive(&mut scene, "Full", triangle(None, true, true));
        let uv_only = object_with_primitive(&mut scene, "UvOnly", triangle(None, false, true));
        let normals_only =
            object_with_primitive(&mut scene, "NormalsOnly", triangle(None, true, false));

        let (obj, _) = obj_text(&mut scene, &[full, uv_only, normals_only]);

        assert!(obj.contains("f 1/1/1 2/2/2 3/3/3\n"));
        assert!(obj.contains("f 4/4 5/5 6/6\n"));
        assert!(obj.contains("f 7//4 8//5 9//6\n"));
        // V is flipped to OBJ's bottom-left origin.
        assert!(obj.contains("vt 0.000000 0.000000\n"));
        assert!(obj.contains("vt 1.000000 1.000000\n"));
        assert!(obj.contains("vn 0.0000 0.0000 1.0000\n"));
    }

    #[test]
    fn normals_follow_object_rotation() {
        let mut scene = Scene::new();
        let root = object_with_primitive(&mut scene, "Root", triangle(None, true, false));
        scene
            .get_object_mut(root)
            .unwrap()
            .transform
            .set_rotation(Quat::from_rotation_x(-std::f32::consts::FRAC_PI_2));

        let (obj, _) = obj_text(&mut scene, &[root]);

        let normal = obj
            .lines()
            .find_map(|line| line.strip_prefix("vn "))
            .map(|line| {
                let components: Vec<f32> =
                    line.split(' ').map(|value| value.parse().unwrap()).collect();
                Vec3::from_slice(&components)
            })
            .unwrap();
        assert!(normal.abs_diff_eq(Vec3::Y, 1e-3), "{obj}");
    }

    #[test]
    fn unselected_objects_are_not_written() {
        let mut scene = Scene::new();
        let a = object_with_primitive(&mut scene, "A", triangle(None, false, false));
        object_with_primitive(&mut scene, "B", triangle(None, false, false));

        let (obj, stats) = obj_text(&mut scene, &[a]);

        assert!(obj.contains("o A\n"));
        assert!(!obj.contains("o B\n"));
        assert_eq!(stats.objects, 1);
    }

    #[test]
    fn export_selection_writes_obj_and_mtl() {
        let dir = tempfile::tempdir().unwrap();
        let mut scene = Scene::new();
        let wood = scene.materials.add_material(MaterialData::new("Wood"));
        let unused = scene.materials.add_material(MaterialData::new("Unused"));
        let root = object_with_primitive(&mut scene, "Crate", triangle(Some(wood), true, true));
        let lid = object_with_primitive(&mut scene, "Lid", triangle(Some(wood), true, true));
        scene.set_object_parent(lid, Some(root));
        let other = object_with_primitive(&mut scene, "Other", triangle(Some(unused), true, true));

        scene.select_recursively(root);
        let target = dir.path().join("Crate.obj");
        ObjExporter::new()
            .export_selection(&scene, &scene.selection(), &target, &ExportOptions::default())
            .unwrap();

        let obj = std::fs::read_to_string(&target).unwrap();
        let mtl = std::fs::read_to_string(dir.path().join("Crate.mtl")).unwrap();

        assert!(obj.contains("mtllib Crate.mtl\n"));
        assert_eq!(obj.matches("usemtl Wood\n").count(), 2);
        assert!(!obj.contains(&scene.get_object(other).unwrap().name));
        assert!(mtl.contains("# Material Count: 1\n"));
        assert_eq!(mtl.matches("newmtl ").count(), 1);
        assert!(mtl.contains("newmtl Wood\n"));
    }

    #[test]
    fn export_selection_writes_mtl_without_materials() {
        let dir = tempfile::tempdir().unwrap();
        let mut scene = Scene::new();
        let root = object_with_primitive(&mut scene, "Old Crate", triangle(None, false, false));
        scene.select_recursively(root);

        let target = dir.path().join("Old Crate.obj");
        ObjExporter::new()
            .export_selection(&scene, &scene.selection(), &target, &ExportOptions::default())
            .unwrap();

        let obj = std::fs::read_to_string(&target).unwrap();
        let mtl = std::fs::read_to_string(dir.path().join("Old Crate.mtl")).unwrap();

        assert!(obj.contains("mtllib Old Crate.mtl\n"));
        assert!(obj.contains("o Old_Crate\n"));
        assert!(!obj.contains("usemtl"));
        assert!(mtl.contains("# Material Count: 0\n"));
        assert!(!mtl.contains("newmtl"));
    }

    #[test]
    fn export_selection_fails_for_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut scene = Scene::new();
        let root = object_with_primitive(&mut scene, "Crate", triangle(None, false, false));
        scene.select_recursively(root);

        let result = ObjExporter::new().export_selection(
            &scene,
            &scene.selection(),
            &dir.path().join("missing").join("Crate.obj"),
            &ExportOptions::default(),
        );

        assert!(result.is_err());
    }
}
