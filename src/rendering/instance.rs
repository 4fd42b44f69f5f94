use std::mem::size_of;

use glam::Mat4;
use id_arena::Arena;
use wgpu::BufferUsages;

use crate::{rendering::render_model::RenderModel, scene_graph::scene::Scene};

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Instance {
    pub model: Mat4,
    pub normal: Mat4,
}

impl Instance {
    pub fn new(model: Mat4, normal: Mat4) -> Self {
        Self { model, normal }
    }

    pub fn descriptor() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 8] = wgpu::vertex_attr_array![
            5 => Float32x4,
            6 => Float32x4,
            7 => Float32x4,
            8 => Float32x4,
            9 => Float32x4,
            10 => Float32x4,
            11 => Float32x4,
            12 => Float32x4,
        ];

        wgpu::VertexBufferLayout {
            array_stride: size_of::<Instance>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &ATTRIBUTES,
        }
    }
}

pub struct Instances {
    instances: Vec<Instance>,
}

impl Instances {
    pub fn new() -> Self {
        Self {
            instances: Vec::new(),
        }
    }

    pub fn add(&mut self, instance: Instance) {
        self.instances.push(instance);
    }

    pub fn clear(&mut self) {
        self.instances.clear();
    }

    pub fn write_to_buffer(&self, queue: &wgpu::Queue, instance_buffer: &InstanceBuffer) {
        let count = self.instances.len().min(InstanceBuffer::MAX_INSTANCES);
        queue.write_buffer(
            instance_buffer.buffer(),
            0,
            bytemuck::cast_slice(&self.instances[..count]),
        );
    }

    pub fn should_render(&self) -> bool {
        !self.instances.is_empty()
    }

    pub fn len(&self) -> usize {
        self.instances.len().min(InstanceBuffer::MAX_INSTANCES)
    }
}

impl Default for Instances {
    fn default() -> Self {
        Self::new()
    }
}

pub struct InstanceBuffer(wgpu::Buffer);

impl InstanceBuffer {
    pub const MAX_INSTANCES: usize = 64;

    pub fn new(device: &wgpu::Device, name: &str) -> Self {
        let label = format!("Instance buffer ({})", name);

        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&label),
            size: (size_of::<Instance>() * Self::MAX_INSTANCES) as u64,
            usage: BufferUsages::VERTEX | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self(buffer)
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.0
    }

    pub fn bind(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        render_pass.set_vertex_buffer(1, self.buffer().slice(..));
    }
}

/// Rebuilds every render model's instance list from the objects that draw it. Objects hidden
/// directly or through an ancestor are skipped.
pub fn gather_instances(scene: &Scene, render_models: &mut Arena<RenderModel>) {
    for (_, render_model) in render_models.iter_mut() {
        render_model.instances.clear();
    }

    for (object_id, object) in scene.objects.iter() {
        let Some(render_model_id) = object
            .model_id
            .and_then(|model_id| scene.models.get(model_id))
            .and_then(|scene_model| scene_model.render_model)
        else {
            continue;
        };

        if !scene.is_visible_in_hierarchy(object_id) {
            continue;
        }

        let Some(render_model) = render_models.get_mut(render_model_id) else {
            continue;
        };

        let world = *object.transform.get_world_matrix();
        let normal = *object.transform.get_inverse_transpose_world_matrix();
        render_model.instances.add(Instance::new(world, normal));
    }
}
