use glam::{Vec3, Vec4};
use wgpu::util::DeviceExt;

/// The story's fixed light rig. Colours carry their intensity in `w`.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightsUniform {
    pub point_position: Vec4,
    pub point_color: Vec4,
    /// Direction the light travels in.
    pub directional_direction: Vec4,
    pub directional_color: Vec4,
    pub ambient_color: Vec4,
}

impl LightsUniform {
    pub fn create_buffer(&self, device: &wgpu::Device) -> wgpu::Buffer {
        device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Lights Uniform Buffer"),
            contents: bytemuck::cast_slice(&[*self]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        })
    }
}

impl Default for LightsUniform {
    fn default() -> Self {
        // Directional light shining from (-25, 0, 10) towards the origin
        let directional_direction = -Vec3::new(-25.0, 0.0, 10.0).normalize();

        Self {
            point_position: Vec4::new(5.0, 5.0, 5.0, 1.0),
            point_color: Vec4::new(1.0, 1.0, 1.0, 1.0),
            directional_direction: directional_direction.extend(0.0),
            directional_color: Vec4::new(1.0, 1.0, 1.0, 1.0),
            ambient_color: Vec4::new(1.0, 1.0, 1.0, 1.0),
        }
    }
}
