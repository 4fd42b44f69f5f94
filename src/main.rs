use anyhow::Result;

mod animation;
mod asset_pipeline;
mod assets;
mod camera;
mod config;
mod engine;
mod material_manager;
mod model;
mod rendering;
mod scene_graph;
mod story;
mod window;

fn main() -> Result<()> {
    pretty_env_logger::init();

    pollster::block_on(window::run())?;

    Ok(())
}
