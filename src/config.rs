use std::ffi::OsString;
use std::path::PathBuf;

use clap::Parser;
use thiserror::Error;

use crate::export::PathMode;

pub const OUTPUT_ENV: &str = "OUTPUT";

#[derive(Debug, Parser)]
#[command(
    name = "scene-split",
    version,
    about = "Export every top-level object of a glTF scene as its own Wavefront OBJ file"
)]
pub struct Cli {
    /// glTF scene to split (.gltf or .glb)
    pub scene_file: PathBuf,

    /// Output directory; overrides the OUTPUT environment variable
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// How texture paths are written to the MTL files
    #[arg(long, value_enum, default_value_t = PathMode::Relative)]
    pub path_mode: PathMode,

    /// Index of the glTF scene to export (defaults to the file's default scene)
    #[arg(long, value_name = "INDEX")]
    pub scene: Option<usize>,

    /// Leave each object at the origin after exporting it instead of restoring its position
    #[arg(long)]
    pub keep_moved: bool,
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("no output directory: pass --output or set the OUTPUT environment variable")]
    MissingOutputDir,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportConfig {
    pub output_dir: PathBuf,
    pub path_mode: PathMode,
    pub restore_positions: bool,
}

impl ExportConfig {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            path_mode: PathMode::default(),
            restore_positions: true,
        }
    }

    /// Combines command line flags with the environment, looked up through
    /// `env` so tests don't depend on the process environment.
    pub fn resolve(
        cli: &Cli,
        env: impl Fn(&str) -> Option<OsString>,
    ) -> Result<Self, ConfigError> {
        let output_dir = cli
            .output
            .clone()
            .or_else(|| env(OUTPUT_ENV).map(PathBuf::from))
            .filter(|dir| !dir.as_os_str().is_empty())
            .ok_or(ConfigError::MissingOutputDir)?;

        Ok(Self {
            output_dir,
            path_mode: cli.path_mode,
            restore_positions: !cli.keep_moved,
        })
    }
}
