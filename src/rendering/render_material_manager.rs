use std::collections::HashMap;

use bytemuck::{Pod, Zeroable};
use glam::Vec4;
use wgpu::util::DeviceExt;

use crate::{
    asset_pipeline::materials::{PbrMaterialData, TextureData},
    material_manager::{MaterialId, MaterialManager},
    rendering::texture::Texture,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureType {
    BaseColor,
    Normal,
}

impl TextureType {
    fn format(self) -> wgpu::TextureFormat {
        match self {
            TextureType::BaseColor => wgpu::TextureFormat::Rgba8UnormSrgb,
            TextureType::Normal => wgpu::TextureFormat::Rgba8Unorm,
        }
    }

    fn placeholder(self) -> TextureData {
        match self {
            TextureType::BaseColor => TextureData::solid([255, 255, 255, 255]),
            TextureType::Normal => TextureData::solid([128, 128, 255, 255]),
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct MaterialUniform {
    pub base_color_factor: Vec4,
    pub metallic: f32,
    pub roughness: f32,
    pub normal_map_strength: f32,
    _padding: f32,
}

impl MaterialUniform {
    pub fn from_material(material: &PbrMaterialData) -> Self {
        Self {
            base_color_factor: material.base_color_factor,
            metallic: material.metallic,
            roughness: material.roughness,
            normal_map_strength: if material.normal.is_some() { 1.0 } else { 0.0 },
            _padding: 0.0,
        }
    }
}

struct RenderMaterial {
    _uniform_buffer: wgpu::Buffer,
    _textures: Vec<Texture>,
    bind_group: wgpu::BindGroup,
}

// Everything a material bind group is built from
struct MaterialResources {
    device: wgpu::Device,
    queue: wgpu::Queue,

    sampler: wgpu::Sampler,
    bind_group_layout: wgpu::BindGroupLayout,

    default_base_color: Texture,
    default_normal: Texture,
}

/// GPU side of the material manager: one bind group per material, created when the material
/// first shows up.
pub struct RenderMaterialManager {
    resources: MaterialResources,
    default_material: RenderMaterial,
    materials: HashMap<MaterialId, RenderMaterial>,
}

impl RenderMaterialManager {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Material sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let texture_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Material bind group layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                texture_entry(1),
                texture_entry(2),
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let resources = MaterialResources {
            device: device.clone(),
            queue: queue.clone(),
            sampler,
            bind_group_layout,
            default_base_color: create_default_texture(device, queue, TextureType::BaseColor),
            default_normal: create_default_texture(device, queue, TextureType::Normal),
        };

        let default_material = resources.create_material(&PbrMaterialData::new("Default"));

        Self {
            resources,
            default_material,
            materials: HashMap::new(),
        }
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.resources.bind_group_layout
    }

    pub fn bind_group(&self, material: Option<MaterialId>) -> &wgpu::BindGroup {
        material
            .and_then(|id| self.materials.get(&id))
            .map_or(&self.default_material.bind_group, |material| {
                &material.bind_group
            })
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    /// Uploads every material that is not on the GPU yet.
    pub fn load_new_materials(&mut self, material_manager: &MaterialManager) {
        for (id, material) in material_manager.materials() {
            if self.materials.contains_key(&id) {
                continue;
            }

            let render_material = self.resources.create_material(material);
            self.materials.insert(id, render_material);
            log::debug!("Uploaded material {}", material.name);
        }
    }
}

impl MaterialResources {
    fn create_material(&self, material: &PbrMaterialData) -> RenderMaterial {
        let uniform = MaterialUniform::from_material(material);
        let uniform_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("Material uniform ({})", material.name)),
                contents: bytemuck::cast_slice(&[uniform]),
                usage: wgpu::BufferUsages::UNIFORM,
            });

        let mut textures = Vec::new();
        let base_color_index = material.base_color.as_ref().map(|data| {
            textures.push(self.create_texture(&material.name, TextureType::BaseColor, data));
            textures.len() - 1
        });
        let normal_index = material.normal.as_ref().map(|data| {
            textures.push(self.create_texture(&material.name, TextureType::Normal, data));
            textures.len() - 1
        });

        let base_color_view = base_color_index
            .map_or(self.default_base_color.view(), |index| textures[index].view());
        let normal_view =
            normal_index.map_or(self.default_normal.view(), |index| textures[index].view());

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("Material bind group ({})", material.name)),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(base_color_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(normal_view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });

        RenderMaterial {
            _uniform_buffer: uniform_buffer,
            _textures: textures,
            bind_group,
        }
    }

    fn create_texture(&self, name: &str, texture_type: TextureType, data: &TextureData) -> Texture {
        let label = format!("{name} ({:?})", texture_type);
        Texture::from_data(&self.device, &self.queue, &label, data, texture_type.format())
    }
}

fn create_default_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    texture_type: TextureType,
) -> Texture {
    let label = format!("Default texture ({:?})", texture_type);
    Texture::from_data(
        device,
        queue,
        &label,
        &texture_type.placeholder(),
        texture_type.format(),
    )
}
