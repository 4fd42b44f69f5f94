pub mod config;
pub mod global_uniform;
pub mod imgui_renderer;
pub mod instance;
pub mod lights;
pub mod passes;
pub mod render_camera;
pub mod render_common;
pub mod render_material_manager;
pub mod render_model;
pub mod renderer;
pub mod shader_loader;
pub mod texture;
