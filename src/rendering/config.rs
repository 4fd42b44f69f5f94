#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub clear_color: wgpu::Color,
    /// Used when the surface supports it, otherwise the surface's first mode.
    pub present_mode: wgpu::PresentMode,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            clear_color: wgpu::Color::BLACK,
            present_mode: wgpu::PresentMode::AutoVsync,
        }
    }
}
