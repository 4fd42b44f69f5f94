use std::borrow::Cow;

use wgpu::util::DeviceExt;

use crate::asset_pipeline::materials::TextureData;

pub struct Texture {
    _texture: wgpu::Texture,
    pub(crate) view: wgpu::TextureView,
}

impl Texture {
    pub fn from_wgpu_texture(texture: wgpu::Texture) -> Self {
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            _texture: texture,
            view,
        }
    }

    /// Uploads RGBA8 pixels, shrinking the image first if it exceeds the device limit.
    pub fn from_data(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        label: &str,
        data: &TextureData,
        format: wgpu::TextureFormat,
    ) -> Self {
        let data = fit_to_limit(data, device.limits().max_texture_dimension_2d);

        let texture = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width: data.width,
                    height: data.height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            &data.pixels,
        );

        Self::from_wgpu_texture(texture)
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }
}

pub fn fit_to_limit(data: &TextureData, max_dimension: u32) -> Cow<'_, TextureData> {
    let largest = data.width.max(data.height);
    if largest <= max_dimension {
        return Cow::Borrowed(data);
    }

    let Some(image) = image::RgbaImage::from_raw(data.width, data.height, data.pixels.clone())
    else {
        log::warn!(
            "Texture data does not match its {}x{} size",
            data.width,
            data.height
        );
        return Cow::Owned(TextureData::solid([255, 0, 255, 255]));
    };

    let scale = max_dimension as f32 / largest as f32;
    let width = ((data.width as f32 * scale) as u32).clamp(1, max_dimension);
    let height = ((data.height as f32 * scale) as u32).clamp(1, max_dimension);

    log::info!(
        "Shrinking {}x{} texture to {}x{}",
        data.width,
        data.height,
        width,
        height
    );

    let resized =
        image::imageops::resize(&image, width, height, image::imageops::FilterType::Triangle);

    Cow::Owned(TextureData {
        width,
        height,
        pixels: resized.into_raw(),
    })
}

pub struct DepthTexture {
    texture: Texture,
    label: String,
}

impl DepthTexture {
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    pub fn new(
        device: &wgpu::Device,
        config: &wgpu::SurfaceConfiguration,
        label: impl Into<String>,
    ) -> Self {
        let label: String = label.into();
        let texture = Self::create_wgpu_texture(device, config, &label);

        DepthTexture {
            texture: Texture::from_wgpu_texture(texture),
            label,
        }
    }

    fn create_wgpu_texture(
        device: &wgpu::Device,
        config: &wgpu::SurfaceConfiguration,
        label: &str,
    ) -> wgpu::Texture {
        let size = wgpu::Extent3d {
            width: config.width,
            height: config.height,
            depth_or_array_layers: 1,
        };

        device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        })
    }

    pub fn resize(&mut self, device: &wgpu::Device, config: &wgpu::SurfaceConfiguration) {
        self.texture =
            Texture::from_wgpu_texture(Self::create_wgpu_texture(device, config, &self.label));
    }

    pub fn view(&self) -> &wgpu::TextureView {
        self.texture.view()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_textures_are_borrowed() {
        let data = TextureData::solid([1, 2, 3, 4]);
        assert!(matches!(fit_to_limit(&data, 8192), Cow::Borrowed(_)));
    }

    #[test]
    fn large_textures_keep_their_aspect() {
        let data = TextureData {
            width: 400,
            height: 200,
            pixels: vec![128; 400 * 200 * 4],
        };

        let fitted = fit_to_limit(&data, 100);
        assert_eq!((fitted.width, fitted.height), (100, 50));
        assert_eq!(fitted.pixels.len(), 100 * 50 * 4);
    }
}
