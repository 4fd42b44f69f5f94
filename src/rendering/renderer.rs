use std::sync::Arc;

use anyhow::Context;
use id_arena::Arena;
use wgpu::CommandEncoderDescriptor;
use winit::{dpi::PhysicalSize, window::Window};

use crate::{
    asset_pipeline::materials::TextureData,
    rendering::{
        config::RenderConfig,
        global_uniform::GlobalUniformState,
        imgui_renderer::ImguiRenderer,
        instance::gather_instances,
        lights::LightsUniform,
        passes::{
            background_pass::{BackgroundPass, BackgroundPassTextureViews},
            mesh_pass::{MeshPass, MeshPassTextureViews},
            pass::Pass,
        },
        render_camera::RenderCamera,
        render_common::RenderCommon,
        render_material_manager::RenderMaterialManager,
        render_model::{render_model_instances, RenderModel},
        shader_loader::{PipelineCacheBuilder, ShaderLoader},
        texture::DepthTexture,
    },
    story::state::StoryState,
};

pub struct Renderer {
    pub window: Arc<Window>,
    pub size: PhysicalSize<u32>,

    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,

    common: Arc<RenderCommon>,
    depth_texture: DepthTexture,
    render_models: Arena<RenderModel>,
    materials: RenderMaterialManager,

    camera: RenderCamera,
    _lights_buffer: wgpu::Buffer,

    shader_loader: ShaderLoader,

    background_pass: BackgroundPass,
    mesh_pass: MeshPass,
    imgui_renderer: ImguiRenderer,
}

impl Renderer {
    pub async fn new(
        window: Arc<Window>,
        state: &mut StoryState,
        imgui: &mut imgui::Context,
        config: &RenderConfig,
    ) -> anyhow::Result<Renderer> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let surface = instance
            .create_surface(window.clone())
            .context("Failed to create surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("No suitable graphics adapter")?;

        log::info!("Using adapter {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                label: None,
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .context("Failed to create device")?;

        let camera = RenderCamera::new(&device, &state.camera, size);
        let lights_buffer = LightsUniform::default().create_buffer(&device);

        let common = RenderCommon::new(
            &device,
            &adapter,
            &surface,
            size,
            config,
            &camera.uniform_buffer,
            &lights_buffer,
        )?;
        let common = Arc::new(common);

        let depth_texture = {
            let surface_config = match common.output_surface_config.read() {
                Ok(surface_config) => surface_config,
                Err(poisoned) => poisoned.into_inner(),
            };
            DepthTexture::new(&device, &surface_config, "Depth Texture")
        };

        let materials = RenderMaterialManager::new(&device, &queue);

        let backdrop = state.backdrop.take().unwrap_or_else(|| {
            log::warn!("No backdrop image, clearing to black");
            TextureData::solid([0, 0, 0, 255])
        });

        let mut cache_builder = PipelineCacheBuilder::new();

        let background_pass = BackgroundPass::new(
            &device,
            &queue,
            common.clone(),
            &mut cache_builder,
            &backdrop,
            config.clear_color,
        )?;
        let mesh_pass = MeshPass::new(
            &device,
            common.clone(),
            materials.bind_group_layout(),
            &mut cache_builder,
        )?;

        let shader_loader =
            ShaderLoader::new(device.clone(), cache_builder, &state.config.shader_dir())?;

        let imgui_renderer = ImguiRenderer::new(&device, &queue, common.surface_format(), imgui);

        Ok(Self {
            window,
            size,
            surface,
            device,
            queue,
            common,
            depth_texture,
            render_models: Arena::new(),
            materials,
            camera,
            _lights_buffer: lights_buffer,
            shader_loader,
            background_pass,
            mesh_pass,
            imgui_renderer,
        })
    }

    /// Uploads materials and models that appeared in the story since the last call.
    pub fn upload_new_models(&mut self, state: &mut StoryState) {
        self.materials.load_new_materials(&state.materials);

        for (_id, scene_model) in state.scene.models.iter_mut() {
            if scene_model.render_model.is_some() {
                continue;
            }

            let render_model = RenderModel::from_model(&self.device, &scene_model.model);
            scene_model.render_model = Some(self.render_models.alloc(render_model));

            log::info!(
                "Uploaded model {} with {} primitives",
                scene_model.name(),
                scene_model.model.primitives.len()
            );
        }
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }

        self.size = new_size;

        let mut config = match self.common.output_surface_config.write() {
            Ok(config) => config,
            Err(poisoned) => poisoned.into_inner(),
        };
        config.width = new_size.width;
        config.height = new_size.height;

        self.surface.configure(&self.device, &config);
        self.depth_texture.resize(&self.device, &config);
        self.camera.update_resolution(new_size);
    }

    pub fn render(
        &mut self,
        state: &StoryState,
        imgui: &mut imgui::Context,
    ) -> Result<(), wgpu::SurfaceError> {
        self.shader_loader.load_pending_shaders();

        self.camera.update_camera(&state.camera);
        self.camera.update_uniform_buffer(&self.queue);
        self.common.global_uniform.update(
            &self.queue,
            GlobalUniformState::new(
                self.size,
                state.start_time.elapsed().as_secs_f32(),
                state.scroll_progress(),
            ),
        );

        gather_instances(&state.scene, &mut self.render_models);

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        let pipeline_cache = &self.shader_loader.cache;

        self.background_pass.render(
            &BackgroundPassTextureViews {
                color: view.clone(),
            },
            &mut encoder,
            pipeline_cache,
            |_| {},
        );

        self.mesh_pass.render(
            &MeshPassTextureViews {
                color: view.clone(),
                depth: self.depth_texture.view().clone(),
            },
            &mut encoder,
            pipeline_cache,
            |render_pass| {
                for (_id, render_model) in self.render_models.iter() {
                    if !render_model.instances.should_render() {
                        continue;
                    }

                    render_model_instances(render_pass, &self.queue, render_model, &self.materials);
                }
            },
        );

        self.imgui_renderer
            .render(&view, imgui, &self.device, &self.queue, &mut encoder);

        self.queue.submit([encoder.finish()]);
        output.present();

        Ok(())
    }
}
