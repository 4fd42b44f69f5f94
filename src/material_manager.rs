use std::collections::HashMap;

use id_arena::{Arena, Id};

use crate::asset_pipeline::{
    images::convert_gltf_image,
    materials::{MaterialOverride, PbrMaterialData, TextureData},
};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GltfMaterialKey {
    pub file_name: String,
    pub material_index: usize,
}

pub struct MaterialManager {
    materials: Arena<PbrMaterialData>,
    materials_by_gltf: HashMap<GltfMaterialKey, MaterialId>,
    // Stands in for glTF's implicit default material in files loaded with an override
    default_by_file: HashMap<String, MaterialId>,
}

pub type MaterialId = Id<PbrMaterialData>;

impl MaterialManager {
    pub fn new() -> Self {
        Self {
            materials: Arena::new(),
            materials_by_gltf: HashMap::new(),
            default_by_file: HashMap::new(),
        }
    }

    pub fn add_material(&mut self, material_data: PbrMaterialData) -> MaterialId {
        self.materials.alloc(material_data)
    }

    pub fn get(&self, id: MaterialId) -> Option<&PbrMaterialData> {
        self.materials.get(id)
    }

    pub fn get_gltf_material(&self, file_name: &str, material_index: usize) -> Option<MaterialId> {
        let key = GltfMaterialKey {
            file_name: file_name.to_string(),
            material_index,
        };
        self.materials_by_gltf.get(&key).copied()
    }

    /// Material for a glTF primitive. Primitives without a material get the file's overridden
    /// default, or `None` for the renderer's default.
    pub fn resolve_gltf_material(
        &self,
        file_name: &str,
        material_index: Option<usize>,
    ) -> Option<MaterialId> {
        match material_index {
            Some(index) => self.get_gltf_material(file_name, index),
            None => self.default_by_file.get(file_name).copied(),
        }
    }

    pub fn load_all_materials_from_gltf(
        &mut self,
        file_name: &str,
        document: &gltf::Document,
        images: &[gltf::image::Data],
        material_override: Option<MaterialOverride>,
    ) {
        if let Some(material_override) = material_override {
            if !self.default_by_file.contains_key(file_name) {
                let mut material_data = PbrMaterialData::new(format!("{} default", file_name));
                material_override.apply(&mut material_data);
                let id = self.add_material(material_data);
                self.default_by_file.insert(file_name.to_string(), id);
            }
        }

        for material in document.materials() {
            let Some(material_index) = material.index() else {
                continue;
            };

            let key = GltfMaterialKey {
                file_name: file_name.to_string(),
                material_index,
            };

            if self.materials_by_gltf.contains_key(&key) {
                continue;
            }

            let material_name = material
                .name()
                .map(String::from)
                .unwrap_or_else(|| format!("{} #{}", file_name, material_index));

            let pbr = material.pbr_metallic_roughness();
            let mut material_data = PbrMaterialData::new(material_name.clone());
            material_data.base_color_factor = pbr.base_color_factor().into();
            material_data.metallic = pbr.metallic_factor();
            material_data.roughness = pbr.roughness_factor();

            material_data.base_color = pbr.base_color_texture().and_then(|info| {
                take_image(images, info.texture().source().index(), &material_name)
            });
            material_data.normal = material.normal_texture().and_then(|info| {
                take_image(images, info.texture().source().index(), &material_name)
            });

            if let Some(material_override) = material_override {
                material_override.apply(&mut material_data);
            }

            let id = self.add_material(material_data);
            self.materials_by_gltf.insert(key, id);
        }
    }

    pub fn materials(&self) -> impl Iterator<Item = (MaterialId, &PbrMaterialData)> {
        self.materials.iter()
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn draw_ui(&self, ui: &imgui::Ui) {
        ui.text(format!("Materials: {}", self.materials.len()));

        for (id, material) in self.materials.iter() {
            ui.text(format!(
                "{}: {} (metallic {:.2}, roughness {:.2})",
                id.index(),
                material.name,
                material.metallic,
                material.roughness
            ));
        }
    }
}

impl Default for MaterialManager {
    fn default() -> Self {
        Self::new()
    }
}

// Cloned rather than taken, one image can back several materials
fn take_image(
    images: &[gltf::image::Data],
    image_index: usize,
    material_name: &str,
) -> Option<TextureData> {
    let Some(image) = images.get(image_index) else {
        log::warn!(
            "Material {} references missing image {}",
            material_name,
            image_index
        );
        return None;
    };

    match convert_gltf_image(image.clone()) {
        Ok(texture) => Some(texture),
        Err(e) => {
            log::warn!("Material {}: {:#}", material_name, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn materials_are_listed_in_insertion_order() {
        let mut manager = MaterialManager::new();
        let earth = manager.add_material(PbrMaterialData::new("Earth"));
        let plates = manager.add_material(PbrMaterialData::new("Plates"));

        let names: Vec<_> = manager
            .materials()
            .map(|(_, material)| material.name.as_str())
            .collect();
        assert_eq!(names, ["Earth", "Plates"]);
        assert_eq!(manager.get(earth).map(|m| m.name.as_str()), Some("Earth"));
        assert_ne!(earth, plates);
    }

    #[test]
    fn unknown_gltf_material_is_none() {
        let manager = MaterialManager::new();
        assert!(manager.get_gltf_material("colombia.glb", 0).is_none());
    }

    fn empty_document() -> gltf::Document {
        gltf::Gltf::from_slice(br#"{"asset":{"version":"2.0"}}"#)
            .unwrap()
            .document
    }

    #[test]
    fn overridden_file_gets_recoloured_default() {
        let mut manager = MaterialManager::new();
        let recolour = MaterialOverride::from_hex(0xaba196, 0.5, 0.2);
        manager.load_all_materials_from_gltf(
            "Monserrate.glb",
            &empty_document(),
            &[],
            Some(recolour),
        );

        let id = manager.resolve_gltf_material("Monserrate.glb", None).unwrap();
        let material = manager.get(id).unwrap();
        assert_eq!(material.base_color_factor, recolour.base_color_factor);
        assert_eq!(material.metallic, 0.5);
        assert_eq!(material.roughness, 0.2);

        manager.load_all_materials_from_gltf(
            "Monserrate.glb",
            &empty_document(),
            &[],
            Some(recolour),
        );
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn file_without_override_keeps_renderer_default() {
        let mut manager = MaterialManager::new();
        manager.load_all_materials_from_gltf("colombia.glb", &empty_document(), &[], None);

        assert!(manager.resolve_gltf_material("colombia.glb", None).is_none());
        assert_eq!(manager.len(), 0);
    }
}
