use wgpu::RenderPass;

use crate::rendering::shader_loader::PipelineCache;

pub(crate) trait Pass {
    type TextureViews;

    /// Records the pass. Skips drawing while the pipeline has not compiled.
    fn render<'a, F>(
        &self,
        texture_views: &Self::TextureViews,
        encoder: &mut wgpu::CommandEncoder,
        pipeline_cache: &PipelineCache,
        render_callback: F,
    ) where
        F: FnOnce(&mut RenderPass) + 'a;
}
