use std::path::Path;

use anyhow::Context;

use crate::asset_pipeline::materials::TextureData;

pub fn load_texture(path: &Path) -> anyhow::Result<TextureData> {
    let image = image::open(path)
        .with_context(|| format!("Failed to load texture {}", path.display()))?
        .to_rgba8();

    Ok(TextureData {
        width: image.width(),
        height: image.height(),
        pixels: image.into_raw(),
    })
}

/// Loads a texture, logging and substituting `fallback` when the file is unusable.
pub fn load_texture_or(path: &Path, fallback: impl FnOnce() -> TextureData) -> TextureData {
    match load_texture(path) {
        Ok(texture) => {
            log::info!(
                "Loaded texture {} ({}x{})",
                path.display(),
                texture.width,
                texture.height
            );
            texture
        }
        Err(e) => {
            log::warn!("{:#}; using fallback", e);
            fallback()
        }
    }
}

/// Converts decoded glTF image data to RGBA8.
pub fn convert_gltf_image(data: gltf::image::Data) -> anyhow::Result<TextureData> {
    use gltf::image::Format;

    let pixels = match data.format {
        Format::R8G8B8A8 => data.pixels,
        Format::R8G8B8 => data
            .pixels
            .chunks_exact(3)
            .flat_map(|pixel| [pixel[0], pixel[1], pixel[2], 255])
            .collect(),
        Format::R8G8 => data
            .pixels
            .chunks_exact(2)
            .flat_map(|pixel| [pixel[0], pixel[0], pixel[0], pixel[1]])
            .collect(),
        Format::R8 => data
            .pixels
            .iter()
            .flat_map(|&value| [value, value, value, 255])
            .collect(),
        other => anyhow::bail!("Unsupported glTF image format: {:?}", other),
    };

    Ok(TextureData {
        width: data.width,
        height: data.height,
        pixels,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgb_gains_opaque_alpha() {
        let data = gltf::image::Data {
            pixels: vec![10, 20, 30, 40, 50, 60],
            format: gltf::image::Format::R8G8B8,
            width: 2,
            height: 1,
        };

        let texture = convert_gltf_image(data).unwrap();
        assert_eq!(texture.pixels, [10, 20, 30, 255, 40, 50, 60, 255]);
    }

    #[test]
    fn missing_file_uses_fallback() {
        let texture = load_texture_or(Path::new("does/not/exist.jpg"), || {
            TextureData::solid([0, 0, 0, 255])
        });

        assert_eq!(texture, TextureData::solid([0, 0, 0, 255]));
    }
}
