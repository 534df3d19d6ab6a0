use std::path::{Path, PathBuf};

use glam::{Vec3, Vec4};

#[derive(Debug, Clone)]
pub enum TextureSource {
    /// Image file referenced by URI, resolved against the glTF file's directory.
    File(PathBuf),
    /// Image stored in a buffer view or a data URI.
    Embedded {
        name: String,
        data: gltf::image::Data,
    },
}

impl TextureSource {
    pub fn from_gltf(
        base_dir: &Path,
        texture: gltf::Texture,
        images: &[gltf::image::Data],
    ) -> Option<TextureSource> {
        let image = texture.source();
        let name = image
            .name()
            .map(String::from)
            .unwrap_or_else(|| format!("Image.{:03}", image.index()));

        match image.source() {
            gltf::image::Source::Uri { uri, .. } if !uri.starts_with("data:") => {
                Some(TextureSource::File(base_dir.join(percent_decode(uri))))
            }
            _ => match images.get(image.index()) {
                Some(data) => Some(TextureSource::Embedded {
                    name,
                    data: data.clone(),
                }),
                None => {
                    log::warn!("Missing image data for embedded texture {}", name);
                    None
                }
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct MaterialData {
    pub name: String,
    pub base_color: Vec4,
    pub metallic: f32,
    pub roughness: f32,
    pub emissive: Vec3,
    pub base_color_texture: Option<TextureSource>,
    pub normal_texture: Option<TextureSource>,
    pub emissive_texture: Option<TextureSource>,
}

impl MaterialData {
    #[allow(dead_code)]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_color: Vec4::ONE,
            metallic: 0.0,
            roughness: 0.5,
            emissive: Vec3::ZERO,
            base_color_texture: None,
            normal_texture: None,
            emissive_texture: None,
        }
    }

    /// Texture slots paired with the MTL statement that references them.
    pub fn texture_slots(&self) -> impl Iterator<Item = (&'static str, &TextureSource)> {
        [
            ("map_Kd", self.base_color_texture.as_ref()),
            ("map_Bump", self.normal_texture.as_ref()),
            ("map_Ke", self.emissive_texture.as_ref()),
        ]
        .into_iter()
        .filter_map(|(statement, texture)| texture.map(|texture| (statement, texture)))
    }
}

// glTF URIs are percent-encoded; image file names with spaces are common.
fn percent_decode(uri: &str) -> String {
    let bytes = uri.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok();
            if let Some(byte) = hex.and_then(|hex| u8::from_str_radix(hex, 16).ok()) {
                decoded.push(byte);
                i += 3;
                continue;
            }
        }

        decoded.push(bytes[i]);
        i += 1;
    }

    String::from_utf8_lossy(&decoded).into_owned()
}
