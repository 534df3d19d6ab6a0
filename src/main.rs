use anyhow::Result;
use clap::Parser;

mod asset_pipeline;
mod config;
mod error;
mod export;
mod export_driver;
mod material_manager;
mod math;
mod model;
mod scene_graph;
#[cfg(test)]
mod test_fixtures;

fn main() -> Result<()> {
    pretty_env_logger::formatted_builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let cli = config::Cli::parse();
    let mut exporter = export::ObjExporter::new();

    let report = export_driver::run(&cli, |key| std::env::var_os(key), &mut exporter)?;

    log::info!("Exported {} objects", report.exported.len());

    Ok(())
}
