use winit::dpi::PhysicalSize;

use crate::camera::{Camera, CameraUniform};

/// Camera uniform and the buffer it lives in.
pub struct RenderCamera {
    uniform: CameraUniform,
    pub uniform_buffer: wgpu::Buffer,
    resolution: PhysicalSize<u32>,
}

impl RenderCamera {
    pub fn new(device: &wgpu::Device, camera: &Camera, resolution: PhysicalSize<u32>) -> Self {
        let mut uniform = CameraUniform::default();
        uniform.update(resolution, camera);
        let uniform_buffer = uniform.create_buffer(device);

        Self {
            uniform,
            uniform_buffer,
            resolution,
        }
    }

    pub fn update_resolution(&mut self, resolution: PhysicalSize<u32>) {
        self.resolution = resolution;
    }

    pub fn update_camera(&mut self, camera: &Camera) {
        self.uniform.update(self.resolution, camera);
    }

    pub fn update_uniform_buffer(&self, queue: &wgpu::Queue) {
        self.uniform.update_buffer(queue, &self.uniform_buffer);
    }
}
