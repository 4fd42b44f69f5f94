use std::sync::RwLock;

use wgpu::SurfaceConfiguration;
use winit::dpi::PhysicalSize;

use crate::rendering::{
    config::RenderConfig,
    global_uniform::{GlobalUniform, GlobalUniformState},
};

/// State shared by every pass. Pipeline factories hold on to it for shader reloads.
pub struct RenderCommon {
    pub output_surface_config: RwLock<SurfaceConfiguration>,
    pub global_uniform: GlobalUniform,
    /// Camera and lights, bound at group 0 of the mesh pass.
    pub frame_bind_group_layout: wgpu::BindGroupLayout,
    pub frame_bind_group: wgpu::BindGroup,
}

impl RenderCommon {
    pub fn new(
        device: &wgpu::Device,
        adapter: &wgpu::Adapter,
        surface: &wgpu::Surface,
        size: PhysicalSize<u32>,
        config: &RenderConfig,
        camera_uniform_buffer: &wgpu::Buffer,
        lights_uniform_buffer: &wgpu::Buffer,
    ) -> anyhow::Result<Self> {
        let surface_caps = surface.get_capabilities(adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or(surface_caps.formats.first())
            .copied()
            .ok_or_else(|| anyhow::anyhow!("Surface supports no texture formats"))?;

        let present_mode = if matches!(
            config.present_mode,
            wgpu::PresentMode::AutoVsync | wgpu::PresentMode::AutoNoVsync
        ) || surface_caps.present_modes.contains(&config.present_mode)
        {
            config.present_mode
        } else {
            log::warn!(
                "Present mode {:?} not supported, using {:?}",
                config.present_mode,
                surface_caps.present_modes[0]
            );
            surface_caps.present_modes[0]
        };

        let output_surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        surface.configure(device, &output_surface_config);

        let global_uniform = GlobalUniform::new(device, GlobalUniformState::new(size, 0.0, 0.0));

        let uniform_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };

        let frame_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Frame bind group layout"),
                entries: &[uniform_entry(0), uniform_entry(1)],
            });

        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Frame bind group"),
            layout: &frame_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: camera_uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: lights_uniform_buffer.as_entire_binding(),
                },
            ],
        });

        Ok(Self {
            output_surface_config: RwLock::new(output_surface_config),
            global_uniform,
            frame_bind_group_layout,
            frame_bind_group,
        })
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        match self.output_surface_config.read() {
            Ok(config) => config.format,
            Err(poisoned) => poisoned.into_inner().format,
        }
    }
}
