//! Writing selected objects to disk.
//!
//! The [`Exporter`] trait is the seam between the export driver and the file
//! formats. [`ObjExporter`] writes Wavefront OBJ geometry with an MTL sidecar.

mod mtl;
mod obj;
mod path_mode;

use std::path::{Path, PathBuf};

use crate::error::ExportError;
use crate::scene_graph::{Scene, Selection};

pub use obj::ObjExporter;
pub use path_mode::PathMode;

#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    pub path_mode: PathMode,
}

pub trait Exporter {
    /// Writes the objects in `selection` to `target`, in world space.
    fn export_selection(
        &mut self,
        scene: &Scene,
        selection: &Selection,
        target: &Path,
        options: &ExportOptions,
    ) -> anyhow::Result<()>;
}

/// `<output_dir>/<object_name>.obj`, rejecting names that would escape the
/// directory or that no file system accepts.
pub fn target_path(output_dir: &Path, object_name: &str) -> Result<PathBuf, ExportError> {
    let invalid = object_name.is_empty()
        || object_name == "."
        || object_name == ".."
        || object_name.contains(['/', '\\', '\0']);

    if invalid {
        return Err(ExportError::InvalidObjectName(object_name.to_string()));
    }

    Ok(output_dir.join(format!("{object_name}.obj")))
}

/// OBJ and MTL statements are whitespace separated; Blender writes names the same way.
pub(crate) fn statement_name(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join("_")
}
