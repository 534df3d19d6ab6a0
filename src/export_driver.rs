use std::collections::HashSet;
use std::ffi::OsString;
use std::path::PathBuf;

use anyhow::Context;
use glam::Vec3;

use crate::config::{Cli, ExportConfig};
use crate::export::{target_path, ExportOptions, Exporter};
use crate::scene_graph::{ObjectId, Scene};

#[derive(Debug, Default)]
pub struct ExportReport {
    pub exported: Vec<PathBuf>,
}

/// Resolves the configuration, loads the scene and exports every scene-level
/// object. The configuration is checked before the scene file is touched.
pub fn run(
    cli: &Cli,
    env: impl Fn(&str) -> Option<OsString>,
    exporter: &mut impl Exporter,
) -> anyhow::Result<ExportReport> {
    let config = ExportConfig::resolve(cli, env)?;

    let mut scene = Scene::load_gltf(&cli.scene_file, cli.scene)
        .with_context(|| format!("Failed to load {}", cli.scene_file.display()))?;

    export_scene_level_objects(&mut scene, exporter, &config)
}

/// For each scene-level object: select exactly its subtree, move it to the
/// origin and export the selection to `<output_dir>/<name>.obj`.
///
/// The first failure stops the batch; objects after it are not exported.
pub fn export_scene_level_objects(
    scene: &mut Scene,
    exporter: &mut impl Exporter,
    config: &ExportConfig,
) -> anyhow::Result<ExportReport> {
    let options = ExportOptions {
        path_mode: config.path_mode,
    };
    let mut report = ExportReport::default();
    let mut names = HashSet::new();

    // The structure never changes during the loop, only flags and positions.
    let object_ids: Vec<ObjectId> = scene.scene_level_objects().collect();

    for object_id in object_ids {
        let name = scene
            .get_object(object_id)
            .map(|object| object.name.clone())
            .unwrap_or_default();
        let target = target_path(&config.output_dir, &name)?;

        if !names.insert(name.clone()) {
            log::warn!(
                "Several scene-level objects are named {}, {} will be overwritten",
                name,
                target.display()
            );
        }

        scene.deselect_all();
        scene.select_recursively(object_id);

        let original_translation = scene.object_translation(object_id).unwrap_or(Vec3::ZERO);
        scene.set_object_translation(object_id, Vec3::ZERO);

        let selection = scene.selection();
        let result = exporter.export_selection(scene, &selection, &target, &options);

        if config.restore_positions {
            scene.set_object_translation(object_id, original_translation);
        }

        result.with_context(|| format!("Failed to export {}", name))?;

        log::info!(
            "Exported {} ({} objects) to {}",
            name,
            selection.len(),
            target.display()
        );
        report.exported.push(target);
    }

    Ok(report)
}
