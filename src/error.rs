use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SceneError {
    #[error("failed to import glTF file {path}")]
    Import {
        path: PathBuf,
        #[source]
        source: gltf::Error,
    },

    #[error("glTF file contains no scenes")]
    NoScenes,

    #[error("scene index {index} out of range ({count} scenes)")]
    SceneIndexOutOfRange { index: usize, count: usize },

    #[error("node {index} is reachable more than once (shared node or cycle)")]
    NodeRevisited { index: usize },

    #[error("unsupported primitive mode {mode:?} in mesh {mesh}")]
    UnsupportedPrimitiveMode {
        mesh: String,
        mode: gltf::mesh::Mode,
    },

    #[error("primitive {primitive} of mesh {mesh} has no positions")]
    MissingPositions { mesh: String, primitive: usize },

    #[error("primitive {primitive} of mesh {mesh} has mismatched attribute counts")]
    AttributeCountMismatch { mesh: String, primitive: usize },

    #[error("primitive {primitive} of mesh {mesh} has invalid triangle indices")]
    InvalidIndices { mesh: String, primitive: usize },
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("object name {0:?} cannot be used as a file name")]
    InvalidObjectName(String),

    #[error("unsupported embedded image format {format:?} for texture {name}")]
    UnsupportedImageFormat {
        name: String,
        format: gltf::image::Format,
    },
}
