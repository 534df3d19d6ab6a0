use std::fs;
use std::path::{Component, Path, PathBuf};

use anyhow::Context;

use crate::asset_pipeline::materials::TextureSource;
use crate::error::ExportError;

/// How texture files are referenced from MTL files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum PathMode {
    /// Absolute path of the texture file.
    Absolute,
    /// Path relative to the output directory.
    #[default]
    Relative,
    /// File name only.
    Strip,
    /// Copy textures next to the exported files and reference them by file name.
    Copy,
}

pub struct TextureReferencer<'a> {
    mode: PathMode,
    output_dir: &'a Path,
}

impl<'a> TextureReferencer<'a> {
    pub fn new(mode: PathMode, output_dir: &'a Path) -> Self {
        Self { mode, output_dir }
    }

    /// Returns the string to write after a `map_*` statement, copying the
    /// texture into the output directory first in [`PathMode::Copy`].
    pub fn reference(&self, texture: &TextureSource) -> anyhow::Result<Option<String>> {
        match texture {
            TextureSource::File(path) => self.reference_file(path).map(Some),
            TextureSource::Embedded { name, data } => {
                if self.mode != PathMode::Copy {
                    log::warn!(
                        "Embedded texture {} can only be referenced in copy mode, skipping",
                        name
                    );
                    return Ok(None);
                }

                let file_name = format!("{}.png", super::statement_name(name));
                write_png(&self.output_dir.join(&file_name), name, data)?;

                Ok(Some(file_name))
            }
        }
    }

    fn reference_file(&self, path: &Path) -> anyhow::Result<String> {
        let file_name = || {
            path.file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .with_context(|| format!("Texture path has no file name: {}", path.display()))
        };

        let reference = match self.mode {
            PathMode::Absolute => absolute(path)?.to_string_lossy().into_owned(),
            PathMode::Relative => {
                let relative = relative_path(&absolute(self.output_dir)?, &absolute(path)?);
                relative.to_string_lossy().into_owned()
            }
            PathMode::Strip => file_name()?,
            PathMode::Copy => {
                let file_name = file_name()?;
                let destination = self.output_dir.join(&file_name);

                if absolute(&destination)? != absolute(path)? {
                    fs::copy(path, &destination).with_context(|| {
                        format!(
                            "Failed to copy texture {} to {}",
                            path.display(),
                            destination.display()
                        )
                    })?;
                    log::debug!("Copied texture {} to {}", path.display(), destination.display());
                }

                file_name
            }
        };

        Ok(reference.replace('\\', "/"))
    }
}

fn write_png(path: &Path, name: &str, data: &gltf::image::Data) -> anyhow::Result<()> {
    use gltf::image::Format;
    use image::ExtendedColorType;

    let color_type = match data.format {
        Format::R8 => ExtendedColorType::L8,
        Format::R8G8 => ExtendedColorType::La8,
        Format::R8G8B8 => ExtendedColorType::Rgb8,
        Format::R8G8B8A8 => ExtendedColorType::Rgba8,
        format => {
            return Err(ExportError::UnsupportedImageFormat {
                name: name.to_string(),
                format,
            }
            .into())
        }
    };

    image::save_buffer_with_format(
        path,
        &data.pixels,
        data.width,
        data.height,
        color_type,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("Failed to write texture {}", path.display()))?;

    log::debug!("Wrote embedded texture {} to {}", name, path.display());

    Ok(())
}

fn absolute(path: &Path) -> anyhow::Result<PathBuf> {
    let path = std::path::absolute(path)
        .with_context(|| format!("Failed to resolve {}", path.display()))?;

    Ok(normalize(&path))
}

/// Lexically removes `.` and `..` components.
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push(component);
                }
            }
            other => normalized.push(other),
        }
    }

    normalized
}

/// Path from the directory `from` to `to`; both must be absolute and normalized.
fn relative_path(from: &Path, to: &Path) -> PathBuf {
    let from_components: Vec<_> = from.components().collect();
    let to_components: Vec<_> = to.components().collect();

    let common = from_components
        .iter()
        .zip(&to_components)
        .take_while(|(a, b)| a == b)
        .count();

    // Different roots (e.g. drive letters) have no relative path.
    if common == 0 {
        return to.to_path_buf();
    }

    let mut relative = PathBuf::new();
    for _ in common..from_components.len() {
        relative.push("..");
    }
    for component in &to_components[common..] {
        relative.push(component);
    }

    relative
}
