//! Small glTF documents written to scratch directories for tests.

use std::fs;
use std::path::{Path, PathBuf};

pub const TRIANGLES: u32 = 4;
pub const LINES: u32 = 1;

/// Variations on the document written by [`write_gltf_with`].
pub struct GltfFixture {
    pub primitive_mode: u32,
    /// When false the primitive carries only `NORMAL` and `TEXCOORD_0`.
    pub positions: bool,
    /// Also lists "Lid" as a child of the unnamed node.
    pub shared_child: bool,
    pub indices: [u16; 3],
}

impl Default for GltfFixture {
    fn default() -> Self {
        Self {
            primitive_mode: TRIANGLES,
            positions: true,
            shared_child: false,
            indices: [0, 1, 2],
        }
    }
}

pub fn write_gltf(dir: &Path, primitive_mode: u32) -> PathBuf {
    write_gltf_with(
        dir,
        &GltfFixture {
            primitive_mode,
            ..Default::default()
        },
    )
}

/// Writes `scene.gltf` with two scene-level nodes ("Crate" with child "Lid",
/// and an unnamed node) sharing one triangle mesh textured with
/// `textures/wood.png`. Returns the path of the `.gltf` file.
pub fn write_gltf_with(dir: &Path, fixture: &GltfFixture) -> PathBuf {
    fs::create_dir_all(dir.join("textures")).unwrap();

    let mut buffer = Vec::new();
    for value in [
        // positions
        0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, //
        // normals
        0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, //
        // texture coordinates
        0.0, 0.0, 1.0, 0.0, 0.0, 1.0,
    ] {
        buffer.extend_from_slice(&value.to_le_bytes());
    }
    for index in fixture.indices {
        buffer.extend_from_slice(&index.to_le_bytes());
    }
    fs::write(dir.join("triangle.bin"), &buffer).unwrap();

    image::RgbaImage::from_pixel(1, 1, image::Rgba([200, 150, 100, 255]))
        .save(dir.join("textures").join("wood.png"))
        .unwrap();

    let attributes = if fixture.positions {
        r#""POSITION": 0, "NORMAL": 1, "TEXCOORD_0": 2"#
    } else {
        r#""NORMAL": 1, "TEXCOORD_0": 2"#
    };
    let unnamed_children = if fixture.shared_child {
        r#", "children": [1]"#
    } else {
        ""
    };
    let primitive_mode = fixture.primitive_mode;

    let gltf = format!(
        r#"{{
  "asset": {{ "version": "2.0" }},
  "scene": 0,
  "scenes": [{{ "name": "Props", "nodes": [0, 2] }}],
  "nodes": [
    {{ "name": "Crate", "mesh": 0, "translation": [5.0, 3.0, -2.0], "children": [1] }},
    {{ "name": "Lid", "mesh": 0, "translation": [0.0, 1.0, 0.0] }},
    {{ "mesh": 0, "translation": [-4.0, 0.0, 0.0]{unnamed_children} }}
  ],
  "meshes": [{{
    "name": "Triangle",
    "primitives": [{{
      "attributes": {{ {attributes} }},
      "indices": 3,
      "material": 0,
      "mode": {primitive_mode}
    }}]
  }}],
  "materials": [{{
    "name": "Wood",
    "pbrMetallicRoughness": {{
      "baseColorFactor": [0.8, 0.5, 0.2, 1.0],
      "baseColorTexture": {{ "index": 0 }},
      "metallicFactor": 0.0,
      "roughnessFactor": 0.5
    }}
  }}],
  "textures": [{{ "source": 0 }}],
  "images": [{{ "uri": "textures/wood.png" }}],
  "buffers": [{{ "uri": "triangle.bin", "byteLength": {byte_length} }}],
  "bufferViews": [
    {{ "buffer": 0, "byteOffset": 0, "byteLength": 36 }},
    {{ "buffer": 0, "byteOffset": 36, "byteLength": 36 }},
    {{ "buffer": 0, "byteOffset": 72, "byteLength": 24 }},
    {{ "buffer": 0, "byteOffset": 96, "byteLength": 6 }}
  ],
  "accessors": [
    {{ "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
       "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0] }},
    {{ "bufferView": 1, "componentType": 5126, "count": 3, "type": "VEC3" }},
    {{ "bufferView": 2, "componentType": 5126, "count": 3, "type": "VEC2" }},
    {{ "bufferView": 3, "componentType": 5123, "count": 3, "type": "SCALAR" }}
  ]
}}"#,
        byte_length = buffer.len(),
    );

    let path = dir.join("scene.gltf");
    fs::write(&path, gltf).unwrap();
    path
}
