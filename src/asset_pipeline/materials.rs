use glam::Vec4;

/// Tightly packed RGBA8 pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureData {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl TextureData {
    pub fn solid(color: [u8; 4]) -> Self {
        Self {
            width: 1,
            height: 1,
            pixels: color.to_vec(),
        }
    }

    pub fn bytes_per_row(&self) -> u32 {
        self.width * 4
    }
}

#[derive(Debug, Clone)]
pub struct PbrMaterialData {
    pub name: String,
    pub base_color_factor: Vec4,
    pub metallic: f32,
    pub roughness: f32,
    pub base_color: Option<TextureData>,
    pub normal: Option<TextureData>,
}

impl PbrMaterialData {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_color_factor: Vec4::ONE,
            metallic: 0.0,
            roughness: 1.0,
            base_color: None,
            normal: None,
        }
    }

    pub fn with_base_color(mut self, texture: TextureData) -> Self {
        self.base_color = Some(texture);
        self
    }

    pub fn with_normal(mut self, texture: TextureData) -> Self {
        self.normal = Some(texture);
        self
    }
}

/// Replaces the surface parameters of every material in a model, keeping its textures.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialOverride {
    pub base_color_factor: Vec4,
    pub metallic: f32,
    pub roughness: f32,
}

impl MaterialOverride {
    pub fn from_hex(rgb: u32, metallic: f32, roughness: f32) -> Self {
        let channel = |shift: u32| srgb_to_linear(((rgb >> shift) & 0xff) as f32 / 255.0);

        Self {
            base_color_factor: Vec4::new(channel(16), channel(8), channel(0), 1.0),
            metallic,
            roughness,
        }
    }

    pub fn apply(&self, material: &mut PbrMaterialData) {
        material.base_color_factor = self.base_color_factor;
        material.metallic = self.metallic;
        material.roughness = self.roughness;
    }
}

fn srgb_to_linear(value: f32) -> f32 {
    if value <= 0.04045 {
        value / 12.92
    } else {
        ((value + 0.055) / 1.055).powf(2.4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_override_converts_to_linear() {
        let material_override = MaterialOverride::from_hex(0xffffff, 0.5, 0.2);
        assert!((material_override.base_color_factor - Vec4::ONE).length() < 1e-5);

        let stone = MaterialOverride::from_hex(0xaba196, 0.5, 0.2);
        let factor = stone.base_color_factor;
        assert!(factor.x > factor.y && factor.y > factor.z);
        assert!(factor.x < 171.0 / 255.0);
    }

    #[test]
    fn override_keeps_textures() {
        let mut material =
            PbrMaterialData::new("Stone").with_base_color(TextureData::solid([1, 2, 3, 4]));

        MaterialOverride::from_hex(0xaba196, 0.5, 0.2).apply(&mut material);

        assert_eq!(material.metallic, 0.5);
        assert_eq!(material.roughness, 0.2);
        assert!(material.base_color.is_some());
    }
}
